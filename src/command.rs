use crate::domain::Task;
use crate::timer::pause_others_for;
use thiserror::Error;

/// Fields for a task being created
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewTask {
    pub title: String,
    pub emoji: Option<String>,
    pub color: Option<String>,
    pub assigned_members: Vec<String>,
    pub estimated_completion_time: Option<u32>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn into_task(self) -> Task {
        let mut task = Task::new(self.title.trim().to_string());
        task.emoji = self.emoji;
        task.color = self.color;
        task.estimated_completion_time = self.estimated_completion_time;
        task.assign_members(self.assigned_members);
        task
    }
}

/// Every way the task list can be mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    Add(NewTask),
    Rename { id: String, title: String },
    SetEmoji { id: String, emoji: Option<String> },
    SetColor { id: String, color: Option<String> },
    /// `None` removes the estimate
    SetEstimate { id: String, minutes: Option<u32> },
    AssignTo { id: String, name: String },
    AssignMembers { id: String, members: Vec<String> },
    Unassign { id: String },
    TimerStart { id: String },
    TimerPause { id: String },
    TimerResume { id: String },
    TimerReset { id: String },
    TimerStop { id: String },
    ToggleCompleted { id: String },
    SetCompleted { id: String, completed: bool },
    /// Advisory overdue flag, raised and cleared by the overdue monitor
    MarkOverdue { id: String, overdue: bool },
    Delete { id: String },
    /// Remove every task whose responsible person is `name`
    DeleteForResponsible { name: String },
}

impl TaskCommand {
    /// The task this command targets, if it targets exactly one
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Add(_) | Self::DeleteForResponsible { .. } => None,
            Self::Rename { id, .. }
            | Self::SetEmoji { id, .. }
            | Self::SetColor { id, .. }
            | Self::SetEstimate { id, .. }
            | Self::AssignTo { id, .. }
            | Self::AssignMembers { id, .. }
            | Self::Unassign { id }
            | Self::TimerStart { id }
            | Self::TimerPause { id }
            | Self::TimerResume { id }
            | Self::TimerReset { id }
            | Self::TimerStop { id }
            | Self::ToggleCompleted { id }
            | Self::SetCompleted { id, .. }
            | Self::MarkOverdue { id, .. }
            | Self::Delete { id } => Some(id),
        }
    }

    /// Whether applying this command should re-arm the overdue alert
    pub fn rearms_overdue(&self) -> bool {
        matches!(
            self,
            Self::TimerStart { .. }
                | Self::TimerReset { .. }
                | Self::TimerStop { .. }
                | Self::ToggleCompleted { .. }
                | Self::SetCompleted { .. }
        )
    }
}

/// Rejected command payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("estimate must be a positive number of minutes")]
    InvalidEstimate,
    #[error("assignee name cannot be empty")]
    EmptyAssignee,
    #[error("family member name cannot be empty")]
    EmptyMemberName,
}

fn validate_title(title: &str) -> Result<(), CommandError> {
    if title.trim().is_empty() {
        return Err(CommandError::EmptyTitle);
    }
    Ok(())
}

fn validate_estimate(minutes: Option<u32>) -> Result<(), CommandError> {
    if minutes == Some(0) {
        return Err(CommandError::InvalidEstimate);
    }
    Ok(())
}

fn validate_members(members: &[String]) -> Result<(), CommandError> {
    if members.iter().any(|m| m.trim().is_empty()) {
        return Err(CommandError::EmptyAssignee);
    }
    Ok(())
}

fn update<F>(tasks: &mut [Task], id: &str, f: F)
where
    F: FnOnce(&mut Task),
{
    if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
        f(task);
    }
}

/// Change an estimate or an assignment on `id` without breaking its timer.
///
/// An active timer that lost its estimate or owner is reset; a running one
/// that changed hands pauses the new owner's other running timers.
fn update_timed<F>(tasks: &mut [Task], id: &str, now_ms: i64, f: F)
where
    F: FnOnce(&mut Task),
{
    let Some(idx) = tasks.iter().position(|t| t.id == id) else {
        return;
    };

    let task = &mut tasks[idx];
    f(task);
    task.settle_timer();
    if !task.is_timer_running() {
        return;
    }
    let owner = task.responsible().map(str::to_string);
    if let Some(owner) = owner {
        pause_others_for(tasks, id, &owner, now_ms);
    }
}

/// Start or resume `id`, first pausing its owner's other running timers
fn run_exclusive<F>(tasks: &mut [Task], id: &str, now_ms: i64, transition: F)
where
    F: FnOnce(&mut Task, i64) -> bool,
{
    let Some(idx) = tasks.iter().position(|t| t.id == id) else {
        return;
    };

    let mut candidate = tasks[idx].clone();
    if !transition(&mut candidate, now_ms) {
        return;
    }

    if let Some(owner) = candidate.responsible().map(str::to_string) {
        pause_others_for(tasks, id, &owner, now_ms);
    }
    tasks[idx] = candidate;
}

/// Apply one command to `tasks` and return the new list.
///
/// Commands aimed at unknown IDs, or timer commands on tasks that cannot
/// take them, return an unchanged copy.
pub fn reduce(tasks: &[Task], command: TaskCommand, now_ms: i64) -> Result<Vec<Task>, CommandError> {
    let mut next = tasks.to_vec();

    match command {
        TaskCommand::Add(new_task) => {
            validate_title(&new_task.title)?;
            validate_estimate(new_task.estimated_completion_time)?;
            validate_members(&new_task.assigned_members)?;
            next.push(new_task.into_task());
        }
        TaskCommand::Rename { id, title } => {
            validate_title(&title)?;
            update(&mut next, &id, |t| t.title = title.trim().to_string());
        }
        TaskCommand::SetEmoji { id, emoji } => update(&mut next, &id, |t| t.emoji = emoji),
        TaskCommand::SetColor { id, color } => update(&mut next, &id, |t| t.color = color),
        TaskCommand::SetEstimate { id, minutes } => {
            validate_estimate(minutes)?;
            update_timed(&mut next, &id, now_ms, |t| t.estimated_completion_time = minutes);
        }
        TaskCommand::AssignTo { id, name } => {
            validate_members(std::slice::from_ref(&name))?;
            update_timed(&mut next, &id, now_ms, |t| t.assign_members(vec![name]));
        }
        TaskCommand::AssignMembers { id, members } => {
            validate_members(&members)?;
            update_timed(&mut next, &id, now_ms, |t| t.assign_members(members));
        }
        TaskCommand::Unassign { id } => update_timed(&mut next, &id, now_ms, Task::unassign),
        TaskCommand::TimerStart { id } => run_exclusive(&mut next, &id, now_ms, Task::start_timer),
        TaskCommand::TimerResume { id } => run_exclusive(&mut next, &id, now_ms, Task::resume_timer),
        TaskCommand::TimerPause { id } => update(&mut next, &id, |t| {
            t.pause_timer(now_ms);
        }),
        TaskCommand::TimerReset { id } => update(&mut next, &id, |t| {
            t.reset_timer();
        }),
        TaskCommand::TimerStop { id } => update(&mut next, &id, |t| {
            t.stop_timer();
        }),
        TaskCommand::ToggleCompleted { id } => update(&mut next, &id, |t| {
            t.toggle_completed(now_ms);
        }),
        TaskCommand::SetCompleted { id, completed } => update(&mut next, &id, |t| {
            t.set_completed(completed, now_ms);
        }),
        TaskCommand::MarkOverdue { id, overdue } => update(&mut next, &id, |t| {
            if t.is_timer_running() || !overdue {
                t.is_overdue = overdue;
            }
        }),
        TaskCommand::Delete { id } => next.retain(|t| t.id != id),
        TaskCommand::DeleteForResponsible { name } => {
            next.retain(|t| t.responsible() != Some(name.as_str()));
        }
    }

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimerPhase;
    use pretty_assertions::assert_eq;

    const T0: i64 = 1_700_000_000_000;

    fn timed_task(id: &str, minutes: u32, who: &str) -> Task {
        let mut task = Task::new(format!("Task {}", id));
        task.id = id.to_string();
        task.estimated_completion_time = Some(minutes);
        task.assigned_to = Some(who.to_string());
        task
    }

    fn start(id: &str) -> TaskCommand {
        TaskCommand::TimerStart { id: id.to_string() }
    }

    fn running_for<'a>(tasks: &'a [Task], who: &str) -> Vec<&'a str> {
        tasks
            .iter()
            .filter(|t| t.responsible() == Some(who) && t.is_timer_running())
            .map(|t| t.id.as_str())
            .collect()
    }

    #[test]
    fn test_add_assigns_fresh_id_and_trims() {
        let mut new_task = NewTask::titled("  Dishes ");
        new_task.assigned_members = vec!["Ana".to_string()];
        new_task.estimated_completion_time = Some(15);

        let tasks = reduce(&[], TaskCommand::Add(new_task), T0).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Dishes");
        assert_eq!(tasks[0].responsible(), Some("Ana"));
        assert!(!tasks[0].id.is_empty());
    }

    #[test]
    fn test_add_rejects_bad_payloads() {
        assert_eq!(
            reduce(&[], TaskCommand::Add(NewTask::titled("   ")), T0),
            Err(CommandError::EmptyTitle)
        );

        let mut zero = NewTask::titled("Dishes");
        zero.estimated_completion_time = Some(0);
        assert_eq!(reduce(&[], TaskCommand::Add(zero), T0), Err(CommandError::InvalidEstimate));

        let mut blank = NewTask::titled("Dishes");
        blank.assigned_members = vec![" ".to_string()];
        assert_eq!(reduce(&[], TaskCommand::Add(blank), T0), Err(CommandError::EmptyAssignee));
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let tasks = vec![timed_task("a", 10, "Ana")];
        let next = reduce(&tasks, start("missing"), T0).unwrap();
        assert_eq!(next, tasks);
    }

    #[test]
    fn test_start_pauses_same_person() {
        let tasks = vec![timed_task("a", 10, "Ana"), timed_task("b", 10, "Ana")];
        let tasks = reduce(&tasks, start("a"), T0).unwrap();
        let tasks = reduce(&tasks, start("b"), T0 + 7_000).unwrap();

        assert_eq!(tasks[0].timer_phase(), TimerPhase::Paused);
        assert_eq!(tasks[0].elapsed_time, 7_000);
        assert!(tasks[0].timer_start_time.is_none());
        assert_eq!(tasks[1].timer_phase(), TimerPhase::Running);
    }

    #[test]
    fn test_resume_pauses_same_person() {
        let tasks = vec![timed_task("a", 10, "Ana"), timed_task("b", 10, "Ana")];
        let tasks = reduce(&tasks, start("a"), T0).unwrap();
        let tasks = reduce(&tasks, start("b"), T0 + 1_000).unwrap();
        let tasks = reduce(&tasks, TaskCommand::TimerResume { id: "a".to_string() }, T0 + 3_000).unwrap();

        assert_eq!(running_for(&tasks, "Ana"), vec!["a"]);
        assert_eq!(tasks[1].elapsed_time, 2_000);
    }

    #[test]
    fn test_exclusivity_holds_across_sequences() {
        let mut tasks = vec![
            timed_task("a", 10, "Ana"),
            timed_task("b", 10, "Ana"),
            timed_task("c", 10, "Ana"),
            timed_task("d", 10, "Luis"),
        ];
        let ids = ["a", "b", "c", "d", "b", "a", "c"];
        for (step, id) in ids.iter().enumerate() {
            let now = T0 + step as i64 * 1_000;
            tasks = reduce(&tasks, start(id), now).unwrap();
            tasks = reduce(&tasks, TaskCommand::TimerResume { id: id.to_string() }, now).unwrap();
            assert!(running_for(&tasks, "Ana").len() <= 1);
            assert!(running_for(&tasks, "Luis").len() <= 1);
        }
        assert_eq!(running_for(&tasks, "Luis"), vec!["d"]);
    }

    #[test]
    fn test_reassigning_running_task_pauses_new_owner() {
        let tasks = vec![timed_task("a", 10, "Ana"), timed_task("b", 10, "Luis")];
        let tasks = reduce(&tasks, start("a"), T0).unwrap();
        let tasks = reduce(&tasks, start("b"), T0).unwrap();

        let assign = TaskCommand::AssignTo { id: "b".to_string(), name: "Ana".to_string() };
        let tasks = reduce(&tasks, assign, T0 + 4_000).unwrap();

        assert_eq!(running_for(&tasks, "Ana"), vec!["b"]);
        assert_eq!(tasks[0].timer_phase(), TimerPhase::Paused);
        assert_eq!(tasks[0].elapsed_time, 4_000);
    }

    #[test]
    fn test_clearing_estimate_resets_running_timer() {
        let tasks = vec![timed_task("a", 10, "Ana"), timed_task("b", 10, "Ana")];
        let tasks = reduce(&tasks, start("a"), T0).unwrap();

        let clear = TaskCommand::SetEstimate { id: "a".to_string(), minutes: None };
        let tasks = reduce(&tasks, clear, T0 + 2_000).unwrap();
        assert_eq!(tasks[0].timer_phase(), TimerPhase::NotStarted);

        let tasks = reduce(&tasks, start("b"), T0 + 3_000).unwrap();
        assert_eq!(running_for(&tasks, "Ana"), vec!["b"]);
    }

    #[test]
    fn test_unassigning_running_task_resets_timer() {
        let tasks = vec![timed_task("a", 10, "Ana")];
        let tasks = reduce(&tasks, start("a"), T0).unwrap();
        let tasks = reduce(&tasks, TaskCommand::Unassign { id: "a".to_string() }, T0 + 1_000).unwrap();

        assert_eq!(tasks[0].timer_phase(), TimerPhase::NotStarted);
        assert!(tasks.iter().all(|t| !t.is_timer_running()));
    }

    #[test]
    fn test_changing_estimate_keeps_running_timer() {
        let tasks = vec![timed_task("a", 10, "Ana")];
        let tasks = reduce(&tasks, start("a"), T0).unwrap();
        let raise = TaskCommand::SetEstimate { id: "a".to_string(), minutes: Some(20) };
        let tasks = reduce(&tasks, raise, T0 + 1_000).unwrap();
        assert_eq!(running_for(&tasks, "Ana"), vec!["a"]);
    }

    #[test]
    fn test_exclusivity_holds_across_mixed_commands() {
        let mut tasks = vec![
            timed_task("a", 10, "Ana"),
            timed_task("b", 10, "Ana"),
            timed_task("c", 10, "Luis"),
            timed_task("d", 10, "Luis"),
        ];
        let id = |s: &str| s.to_string();
        let steps = vec![
            start("a"),
            start("c"),
            TaskCommand::AssignTo { id: id("c"), name: id("Ana") },
            start("d"),
            TaskCommand::AssignMembers { id: id("d"), members: vec![id("Ana"), id("Luis")] },
            TaskCommand::SetEstimate { id: id("d"), minutes: None },
            TaskCommand::TimerResume { id: id("a") },
            TaskCommand::Unassign { id: id("a") },
            start("b"),
            TaskCommand::AssignTo { id: id("b"), name: id("Luis") },
            TaskCommand::SetEstimate { id: id("d"), minutes: Some(5) },
            start("d"),
            TaskCommand::AssignTo { id: id("d"), name: id("Luis") },
            TaskCommand::TimerResume { id: id("c") },
        ];

        for (step, command) in steps.into_iter().enumerate() {
            let now = T0 + step as i64 * 1_000;
            tasks = reduce(&tasks, command, now).unwrap();
            for who in ["Ana", "Luis"] {
                assert!(running_for(&tasks, who).len() <= 1, "step {} for {}", step, who);
            }
        }
    }

    #[test]
    fn test_failed_start_does_not_pause_others() {
        let mut untimed = timed_task("b", 10, "Ana");
        untimed.estimated_completion_time = None;
        let tasks = vec![timed_task("a", 10, "Ana"), untimed];
        let tasks = reduce(&tasks, start("a"), T0).unwrap();
        let tasks = reduce(&tasks, start("b"), T0 + 1_000).unwrap();
        assert_eq!(running_for(&tasks, "Ana"), vec!["a"]);
    }

    #[test]
    fn test_other_person_keeps_running() {
        let tasks = vec![timed_task("a", 10, "Ana"), timed_task("b", 10, "Luis")];
        let tasks = reduce(&tasks, start("a"), T0).unwrap();
        let tasks = reduce(&tasks, start("b"), T0 + 1_000).unwrap();
        assert!(tasks[0].is_timer_running());
        assert!(tasks[1].is_timer_running());
    }

    #[test]
    fn test_stop_matches_reset() {
        let tasks = vec![timed_task("a", 10, "Ana")];
        let tasks = reduce(&tasks, start("a"), T0).unwrap();
        let reset = reduce(&tasks, TaskCommand::TimerReset { id: "a".to_string() }, T0 + 1).unwrap();
        let stop = reduce(&tasks, TaskCommand::TimerStop { id: "a".to_string() }, T0 + 1).unwrap();
        assert_eq!(reset, stop);
        assert_eq!(reset[0].timer_phase(), TimerPhase::NotStarted);
    }

    #[test]
    fn test_mark_overdue_only_while_running() {
        let tasks = vec![timed_task("a", 1, "Ana")];
        let mark = TaskCommand::MarkOverdue { id: "a".to_string(), overdue: true };
        let idle = reduce(&tasks, mark.clone(), T0).unwrap();
        assert!(!idle[0].is_overdue);

        let running = reduce(&tasks, start("a"), T0).unwrap();
        let marked = reduce(&running, mark, T0 + 61_000).unwrap();
        assert!(marked[0].is_overdue);
    }

    #[test]
    fn test_delete_for_responsible() {
        let mut lawn = Task::new("Lawn".to_string());
        lawn.id = "lawn".to_string();
        let tasks = vec![timed_task("a", 10, "Ana"), timed_task("b", 10, "Luis"), lawn];
        let next = reduce(&tasks, TaskCommand::DeleteForResponsible { name: "Ana".to_string() }, T0).unwrap();
        let ids: Vec<&str> = next.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "lawn"]);
    }

    #[test]
    fn test_assign_and_unassign() {
        let tasks = vec![Task::new("Lawn".to_string())];
        let id = tasks[0].id.clone();
        let next = reduce(
            &tasks,
            TaskCommand::AssignMembers { id: id.clone(), members: vec!["Luis".to_string(), "Ana".to_string()] },
            T0,
        )
        .unwrap();
        assert_eq!(next[0].assigned_to.as_deref(), Some("Luis"));

        let next = reduce(&next, TaskCommand::Unassign { id }, T0).unwrap();
        assert!(next[0].is_unplanned());
    }

    #[test]
    fn test_command_task_id() {
        assert_eq!(start("a").task_id(), Some("a"));
        assert_eq!(TaskCommand::Add(NewTask::titled("x")).task_id(), None);
        assert!(start("a").rearms_overdue());
        assert!(!TaskCommand::TimerPause { id: "a".to_string() }.rearms_overdue());
    }
}
