use super::task::Task;
use std::collections::HashMap;

/// Progress of the tasks sharing one responsible person
#[derive(Debug, Clone, PartialEq)]
pub struct GroupProgress {
    pub responsible: String,
    /// Task IDs in list order
    pub task_ids: Vec<String>,
    pub completed_count: usize,
    pub total_count: usize,
}

impl GroupProgress {
    fn new(responsible: &str) -> Self {
        Self {
            responsible: responsible.to_string(),
            task_ids: Vec::new(),
            completed_count: 0,
            total_count: 0,
        }
    }

    /// 0.0 to 100.0; 0.0 for an empty group
    pub fn completion_percentage(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        self.completed_count as f64 / self.total_count as f64 * 100.0
    }

    pub fn is_group_completed(&self) -> bool {
        self.total_count > 0 && self.completed_count == self.total_count
    }
}

/// Tasks partitioned into unplanned and per-person groups
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Board {
    /// IDs of tasks nobody is responsible for
    pub unplanned: Vec<String>,
    /// Groups in order of first appearance
    pub groups: Vec<GroupProgress>,
}

impl Board {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut board = Board::default();
        let mut index_by_name: HashMap<&str, usize> = HashMap::new();

        for task in tasks {
            let Some(responsible) = task.responsible() else {
                board.unplanned.push(task.id.clone());
                continue;
            };

            let idx = *index_by_name.entry(responsible).or_insert_with(|| {
                board.groups.push(GroupProgress::new(responsible));
                board.groups.len() - 1
            });

            let group = &mut board.groups[idx];
            group.task_ids.push(task.id.clone());
            group.total_count += 1;
            if task.completed {
                group.completed_count += 1;
            }
        }

        board
    }

    pub fn group(&self, responsible: &str) -> Option<&GroupProgress> {
        self.groups.iter().find(|g| g.responsible == responsible)
    }

    pub fn is_group_completed(&self, responsible: &str) -> bool {
        self.group(responsible)
            .map(GroupProgress::is_group_completed)
            .unwrap_or(false)
    }

    /// True iff at least one group exists and every group is completed
    pub fn is_completed(&self) -> bool {
        !self.groups.is_empty() && self.groups.iter().all(GroupProgress::is_group_completed)
    }

    /// Names of groups that are complete here but were not in `previous`
    pub fn newly_completed_groups<'a>(&'a self, previous: &Board) -> Vec<&'a str> {
        self.groups
            .iter()
            .filter(|g| g.is_group_completed() && !previous.is_group_completed(&g.responsible))
            .map(|g| g.responsible.as_str())
            .collect()
    }
}
