use super::{LoadOutcome, PersistOutcome, StoreEvent, Toast};
use crate::clock::Clock;
use crate::command::{reduce, CommandError, NewTask, TaskCommand};
use crate::config::StoreConfig;
use crate::domain::{Board, CelebrationPolicy, Task};
use crate::notifications::AlertSink;
use crate::persistence::{load_list, save_list, KeyValueStore, TASKS_KEY};
use crate::timer::{remaining, OverdueMonitor, OverdueTransition, Remaining};
use std::collections::HashMap;
use std::sync::Arc;

/// Single source of truth for the task list
pub struct TaskStore {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    alerts: Arc<dyn AlertSink>,
    config: StoreConfig,
    tasks: Vec<Task>,
    selected_task_id: Option<String>,
    toast: Toast,
    is_loading: bool,
    last_board: Board,
    board_completed: bool,
    celebration_fired: bool,
    overdue: OverdueMonitor,
    events: Vec<StoreEvent>,
}

impl TaskStore {
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        alerts: Arc<dyn AlertSink>,
        config: StoreConfig,
    ) -> Self {
        Self {
            storage,
            clock,
            alerts,
            config,
            tasks: Vec::new(),
            selected_task_id: None,
            toast: Toast::default(),
            is_loading: true,
            last_board: Board::default(),
            board_completed: false,
            celebration_fired: false,
            overdue: OverdueMonitor::new(),
            events: Vec::new(),
        }
    }

    /// Hydrate from storage.
    ///
    /// Absent or unreadable data yields an empty list. Loading is not a
    /// mutation: no events fire and nothing is written.
    pub fn load_tasks(&mut self) -> LoadOutcome {
        self.is_loading = true;

        let outcome = match load_list::<Task>(self.storage.as_ref(), TASKS_KEY) {
            Ok(Some(tasks)) => {
                let count = tasks.len();
                self.tasks = tasks;
                LoadOutcome::Loaded(count)
            }
            Ok(None) => {
                self.tasks.clear();
                LoadOutcome::Empty
            }
            Err(e) => {
                tracing::error!(key = TASKS_KEY, error = %e, "failed to load tasks");
                self.tasks.clear();
                LoadOutcome::Failed(e.to_string())
            }
        };

        self.last_board = Board::from_tasks(&self.tasks);
        self.board_completed = self.last_board.is_completed();
        // A board that was already finished has had its celebration
        self.celebration_fired = self.board_completed;
        for task in self.tasks.iter().filter(|t| t.is_overdue && t.is_timer_running()) {
            self.overdue.mark_alerted(&task.id);
        }

        self.is_loading = false;
        tracing::debug!(count = self.tasks.len(), "tasks loaded");
        outcome
    }

    /// Replace the whole list and persist it.
    ///
    /// This is the only mutation primitive; every command ends here.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) -> PersistOutcome {
        self.tasks = tasks;
        self.overdue.retain_known(&self.tasks);
        self.refresh_projections();
        self.persist()
    }

    /// Run one command through the reducer and commit the result
    pub fn apply(&mut self, command: TaskCommand) -> Result<PersistOutcome, CommandError> {
        let now = self.clock.now_ms();
        let rearm_id = if command.rearms_overdue() {
            command.task_id().map(str::to_string)
        } else {
            None
        };

        let next = reduce(&self.tasks, command, now)?;
        if let Some(id) = rearm_id {
            // Only a command that actually moved the timer starts a new crossing
            let before = self.tasks.iter().find(|t| t.id == id);
            let after = next.iter().find(|t| t.id == id);
            if before != after {
                self.overdue.rearm(&id);
            }
        }
        if next == self.tasks {
            return Ok(PersistOutcome::Unchanged);
        }
        Ok(self.set_tasks(next))
    }

    /// Create a task and return its new ID
    pub fn add_task(&mut self, new_task: NewTask) -> Result<(String, PersistOutcome), CommandError> {
        let outcome = self.apply(TaskCommand::Add(new_task))?;
        let id = self.tasks.last().map(|t| t.id.clone()).unwrap_or_default();
        Ok((id, outcome))
    }

    /// Remove every task owned by one responsible person
    pub fn delete_tasks_for(&mut self, responsible: &str) -> Result<PersistOutcome, CommandError> {
        self.apply(TaskCommand::DeleteForResponsible {
            name: responsible.to_string(),
        })
    }

    /// Check running timers against the clock.
    ///
    /// The first negative crossing of a task raises its `is_overdue` flag,
    /// alerts once and queues [`StoreEvent::Overdue`].
    pub fn tick(&mut self) -> Option<PersistOutcome> {
        let now = self.clock.now_ms();
        let mut marks: HashMap<String, bool> = HashMap::new();

        for task in &self.tasks {
            match self.overdue.observe(task, now) {
                Some(OverdueTransition::Crossed) => {
                    tracing::info!(task_id = %task.id, title = %task.title, "timer overdue");
                    self.alerts.overdue(task);
                    self.events.push(StoreEvent::Overdue {
                        task_id: task.id.clone(),
                        title: task.title.clone(),
                    });
                    marks.insert(task.id.clone(), true);
                }
                Some(OverdueTransition::Recovered) => {
                    marks.insert(task.id.clone(), false);
                }
                None => {}
            }
        }

        if marks.is_empty() {
            return None;
        }

        let mut next = self.tasks.clone();
        for (id, overdue) in marks {
            match reduce(&next, TaskCommand::MarkOverdue { id, overdue }, now) {
                Ok(updated) => next = updated,
                Err(e) => tracing::warn!(error = %e, "failed to mark overdue"),
            }
        }
        if next == self.tasks {
            return None;
        }
        Some(self.set_tasks(next))
    }

    fn refresh_projections(&mut self) {
        let board = Board::from_tasks(&self.tasks);

        for responsible in board.newly_completed_groups(&self.last_board) {
            tracing::info!(responsible = %responsible, "group completed");
            self.events.push(StoreEvent::GroupCompleted {
                responsible: responsible.to_string(),
            });
        }

        let completed = board.is_completed();
        if completed && !self.board_completed {
            let may_fire = match self.config.celebration {
                CelebrationPolicy::Once => !self.celebration_fired,
                CelebrationPolicy::EveryTransition => true,
            };
            if may_fire {
                self.celebration_fired = true;
                self.alerts.celebrate();
                self.events.push(StoreEvent::BoardCompleted);
            }
        }

        self.board_completed = completed;
        self.last_board = board;
    }

    fn persist(&self) -> PersistOutcome {
        match save_list(self.storage.as_ref(), TASKS_KEY, &self.tasks) {
            Ok(()) => PersistOutcome::Saved,
            Err(e) => {
                tracing::error!(key = TASKS_KEY, error = %e, "failed to save tasks");
                PersistOutcome::Failed(e.to_string())
            }
        }
    }

    /// Allow a [`CelebrationPolicy::Once`] celebration to fire again
    pub fn rearm_celebration(&mut self) {
        self.celebration_fired = false;
    }

    /// Drain queued one-shot events
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Hand a task to the editing view; not validated
    pub fn set_selected_task(&mut self, task: &Task) {
        self.selected_task_id = Some(task.id.clone());
    }

    pub fn clear_selected_task(&mut self) {
        self.selected_task_id = None;
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.selected_task_id.as_deref().and_then(|id| self.task(id))
    }

    pub fn set_toast(&mut self, show: bool, message: impl Into<String>) {
        self.toast = Toast {
            visible: show,
            message: message.into(),
        };
    }

    pub fn toast(&self) -> &Toast {
        &self.toast
    }

    /// Remaining time of one task at the clock's now
    pub fn remaining(&self, id: &str) -> Option<Remaining> {
        let now = self.clock.now_ms();
        self.task(id).map(|task| remaining(task, now))
    }

    pub fn board(&self) -> Board {
        Board::from_tasks(&self.tasks)
    }

    pub fn is_board_completed(&self) -> bool {
        self.board_completed
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}
