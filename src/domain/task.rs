use super::enums::TimerPhase;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Milliseconds in one minute of estimate
pub const MS_PER_MINUTE: i64 = 60_000;

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// A chore ("activity") as persisted under the `tasks` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque unique ID
    pub id: String,
    /// Display title
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Legacy single responsible person
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Canonical assignment list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_members: Option<Vec<String>>,
    /// Estimate in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion_time: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub timer_started: bool,
    /// Start of the current running session (ms since epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub timer_paused: bool,
    /// Accumulated ms from closed sessions only
    #[serde(default, skip_serializing_if = "is_zero")]
    pub elapsed_time: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_overdue: bool,
    /// Final elapsed ms, set when completed with an active timer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_completion_time: Option<i64>,
}

impl Task {
    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            completed: false,
            color: None,
            emoji: None,
            assigned_to: None,
            assigned_members: None,
            estimated_completion_time: None,
            timer_started: false,
            timer_start_time: None,
            timer_paused: false,
            elapsed_time: 0,
            is_overdue: false,
            actual_completion_time: None,
        }
    }

    /// The single person that drives grouping and timer exclusivity.
    ///
    /// `assignedTo` wins when present; otherwise the first assigned member.
    pub fn responsible(&self) -> Option<&str> {
        if let Some(name) = self.assigned_to.as_deref().filter(|n| !n.is_empty()) {
            return Some(name);
        }
        self.assigned_members
            .as_ref()
            .and_then(|members| members.iter().find(|m| !m.is_empty()))
            .map(String::as_str)
    }

    /// Everyone assigned to this task
    pub fn assignees(&self) -> Vec<&str> {
        match &self.assigned_members {
            Some(members) if !members.is_empty() => {
                members.iter().map(String::as_str).filter(|m| !m.is_empty()).collect()
            }
            _ => self.responsible().into_iter().collect(),
        }
    }

    /// Check whether the task has no responsible person
    pub fn is_unplanned(&self) -> bool {
        self.responsible().is_none()
    }

    /// Replace the assignment list, keeping `assignedTo` in sync
    pub fn assign_members(&mut self, members: Vec<String>) {
        if members.is_empty() {
            self.unassign();
            return;
        }
        self.assigned_to = members.first().cloned();
        self.assigned_members = Some(members);
    }

    pub fn unassign(&mut self) {
        self.assigned_to = None;
        self.assigned_members = None;
    }

    /// Estimate in milliseconds
    pub fn estimated_ms(&self) -> Option<i64> {
        self.estimated_completion_time
            .map(|minutes| i64::from(minutes) * MS_PER_MINUTE)
    }

    pub fn timer_phase(&self) -> TimerPhase {
        if self.completed {
            TimerPhase::Completed
        } else if !self.timer_started {
            TimerPhase::NotStarted
        } else if self.timer_paused {
            TimerPhase::Paused
        } else {
            TimerPhase::Running
        }
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer_phase() == TimerPhase::Running
    }

    /// Timers need both an estimate and a responsible person
    pub fn has_timer_prerequisites(&self) -> bool {
        self.estimated_completion_time.is_some() && self.responsible().is_some()
    }

    /// Length of the current running session at `now_ms`
    pub fn session_elapsed(&self, now_ms: i64) -> i64 {
        match (self.timer_phase(), self.timer_start_time) {
            (TimerPhase::Running, Some(started)) => (now_ms - started).max(0),
            _ => 0,
        }
    }

    /// Closed sessions plus the running one
    pub fn total_elapsed(&self, now_ms: i64) -> i64 {
        self.elapsed_time + self.session_elapsed(now_ms)
    }

    /// Start the timer from scratch
    pub fn start_timer(&mut self, now_ms: i64) -> bool {
        if !self.has_timer_prerequisites() || self.timer_phase() != TimerPhase::NotStarted {
            return false;
        }
        self.timer_started = true;
        self.timer_start_time = Some(now_ms);
        self.timer_paused = false;
        self.elapsed_time = 0;
        self.is_overdue = false;
        true
    }

    /// Pause a running timer, folding the session into `elapsed_time`
    pub fn pause_timer(&mut self, now_ms: i64) -> bool {
        if !self.has_timer_prerequisites() {
            return false;
        }
        self.fold_session(now_ms)
    }

    /// Forced pause; does not look at the estimate or the assignment
    pub(crate) fn fold_session(&mut self, now_ms: i64) -> bool {
        if self.timer_phase() != TimerPhase::Running {
            return false;
        }
        self.elapsed_time += self.session_elapsed(now_ms);
        self.timer_start_time = None;
        self.timer_paused = true;
        true
    }

    /// Resume a paused timer
    pub fn resume_timer(&mut self, now_ms: i64) -> bool {
        if !self.has_timer_prerequisites() || self.timer_phase() != TimerPhase::Paused {
            return false;
        }
        self.timer_start_time = Some(now_ms);
        self.timer_paused = false;
        true
    }

    /// Return the timer to its initial state (not allowed once completed)
    pub fn reset_timer(&mut self) -> bool {
        if self.completed {
            return false;
        }
        let changed = self.timer_started
            || self.timer_paused
            || self.timer_start_time.is_some()
            || self.elapsed_time != 0
            || self.is_overdue;
        self.clear_timer();
        changed
    }

    /// Reset a running or paused timer that lost its estimate or its
    /// responsible person
    pub fn settle_timer(&mut self) -> bool {
        if self.timer_phase().is_active() && !self.has_timer_prerequisites() {
            return self.reset_timer();
        }
        false
    }

    /// Same resulting state as reset
    pub fn stop_timer(&mut self) -> bool {
        self.reset_timer()
    }

    fn clear_timer(&mut self) {
        self.timer_started = false;
        self.timer_start_time = None;
        self.timer_paused = false;
        self.elapsed_time = 0;
        self.is_overdue = false;
    }

    /// Mark completed or not completed.
    ///
    /// Completing with an active timer records `actual_completion_time` and
    /// clears the timer; un-completing only drops `actual_completion_time`.
    pub fn set_completed(&mut self, completed: bool, now_ms: i64) -> bool {
        if self.completed == completed {
            return false;
        }
        if completed {
            if self.timer_phase().is_active() {
                self.actual_completion_time = Some(self.total_elapsed(now_ms));
            }
            self.clear_timer();
            self.completed = true;
        } else {
            self.completed = false;
            self.actual_completion_time = None;
        }
        true
    }

    pub fn toggle_completed(&mut self, now_ms: i64) -> bool {
        let target = !self.completed;
        self.set_completed(target, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const T0: i64 = 1_700_000_000_000;

    fn timed_task(minutes: u32, who: &str) -> Task {
        let mut task = Task::new("Dishes".to_string());
        task.estimated_completion_time = Some(minutes);
        task.assigned_to = Some(who.to_string());
        task
    }

    #[test]
    fn test_task_new() {
        let task = Task::new("Dishes".to_string());
        assert_eq!(task.title, "Dishes");
        assert!(!task.completed);
        assert_eq!(task.timer_phase(), TimerPhase::NotStarted);
        assert!(task.is_unplanned());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Task::new("A".to_string());
        let b = Task::new("A".to_string());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_responsible_prefers_assigned_to() {
        let mut task = Task::new("Trash".to_string());
        task.assigned_members = Some(vec!["Luis".to_string(), "Ana".to_string()]);
        assert_eq!(task.responsible(), Some("Luis"));

        task.assigned_to = Some("Ana".to_string());
        assert_eq!(task.responsible(), Some("Ana"));

        task.assigned_to = Some(String::new());
        assert_eq!(task.responsible(), Some("Luis"));
    }

    #[test]
    fn test_assign_members_keeps_legacy_field() {
        let mut task = Task::new("Trash".to_string());
        task.assign_members(vec!["Ana".to_string(), "Luis".to_string()]);
        assert_eq!(task.assigned_to.as_deref(), Some("Ana"));
        assert_eq!(task.assignees(), vec!["Ana", "Luis"]);

        task.assign_members(Vec::new());
        assert!(task.is_unplanned());
        assert!(task.assigned_members.is_none());
    }

    #[test]
    fn test_start_requires_estimate_and_responsible() {
        let mut task = Task::new("Dishes".to_string());
        assert!(!task.start_timer(T0));

        task.estimated_completion_time = Some(10);
        assert!(!task.start_timer(T0));

        task.assigned_to = Some("Ana".to_string());
        assert!(task.start_timer(T0));
        assert_eq!(task.timer_phase(), TimerPhase::Running);
        assert_eq!(task.timer_start_time, Some(T0));
    }

    #[test]
    fn test_elapsed_accounting() {
        let mut task = timed_task(10, "Ana");
        task.start_timer(T0);
        task.pause_timer(T0 + 5_000);
        assert_eq!(task.elapsed_time, 5_000);
        assert!(task.timer_start_time.is_none());

        task.resume_timer(T0 + 8_000);
        task.pause_timer(T0 + 11_000);
        assert_eq!(task.elapsed_time, 8_000);
        assert_eq!(task.timer_phase(), TimerPhase::Paused);
    }

    #[test]
    fn test_pause_and_resume_only_from_matching_phase() {
        let mut task = timed_task(10, "Ana");
        assert!(!task.pause_timer(T0));
        assert!(!task.resume_timer(T0));

        task.start_timer(T0);
        assert!(!task.resume_timer(T0 + 1_000));
        assert!(!task.start_timer(T0 + 1_000));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut task = timed_task(10, "Ana");
        task.start_timer(T0);
        task.pause_timer(T0 + 3_000);

        assert!(task.reset_timer());
        let once = task.clone();
        assert!(!task.reset_timer());
        assert_eq!(task, once);
        assert_eq!(task.timer_phase(), TimerPhase::NotStarted);
        assert_eq!(task.elapsed_time, 0);
    }

    #[test]
    fn test_settle_timer_resets_when_estimate_is_gone() {
        let mut task = timed_task(10, "Ana");
        task.start_timer(T0);
        assert!(!task.settle_timer());

        task.estimated_completion_time = None;
        assert!(task.settle_timer());
        assert_eq!(task.timer_phase(), TimerPhase::NotStarted);
        assert_eq!(task.elapsed_time, 0);
    }

    #[test]
    fn test_settle_timer_resets_paused_unassigned_task() {
        let mut task = timed_task(10, "Ana");
        task.start_timer(T0);
        task.pause_timer(T0 + 2_000);
        task.unassign();
        assert!(task.settle_timer());
        assert_eq!(task.timer_phase(), TimerPhase::NotStarted);
    }

    #[test]
    fn test_fold_session_ignores_prerequisites() {
        let mut task = timed_task(10, "Ana");
        task.start_timer(T0);
        task.estimated_completion_time = None;

        assert!(!task.pause_timer(T0 + 4_000));
        assert!(task.fold_session(T0 + 4_000));
        assert_eq!(task.timer_phase(), TimerPhase::Paused);
        assert_eq!(task.elapsed_time, 4_000);
    }

    #[test]
    fn test_reset_disabled_after_completion() {
        let mut task = timed_task(10, "Ana");
        task.start_timer(T0);
        task.set_completed(true, T0 + 1_000);
        assert!(!task.reset_timer());
        assert!(!task.start_timer(T0 + 2_000));
    }

    #[test]
    fn test_completion_freezes_timer() {
        let mut task = timed_task(10, "Ana");
        task.start_timer(T0);
        task.set_completed(true, T0 + 120_000);

        assert_eq!(task.actual_completion_time, Some(120_000));
        assert!(!task.timer_started);
        assert!(task.timer_start_time.is_none());

        task.toggle_completed(T0 + 200_000);
        assert!(!task.completed);
        assert!(task.actual_completion_time.is_none());
        assert!(!task.timer_started);
    }

    #[test]
    fn test_completion_while_paused_uses_banked_time() {
        let mut task = timed_task(10, "Ana");
        task.start_timer(T0);
        task.pause_timer(T0 + 30_000);
        task.set_completed(true, T0 + 500_000);
        assert_eq!(task.actual_completion_time, Some(30_000));
    }

    #[test]
    fn test_completion_without_timer_leaves_actual_unset() {
        let mut task = timed_task(10, "Ana");
        task.set_completed(true, T0);
        assert!(task.completed);
        assert!(task.actual_completion_time.is_none());
    }

    #[test]
    fn test_json_uses_camel_case_and_omits_defaults() {
        let mut task = timed_task(15, "Juan");
        task.id = "1".to_string();
        task.start_timer(T0);
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["assignedTo"], "Juan");
        assert_eq!(json["estimatedCompletionTime"], 15);
        assert_eq!(json["timerStarted"], true);
        assert_eq!(json["timerStartTime"], T0);
        assert!(json.get("timerPaused").is_none());
        assert!(json.get("actualCompletionTime").is_none());
    }

    #[test]
    fn test_json_reads_minimal_legacy_record() {
        let task: Task =
            serde_json::from_str(r#"{"id":"4","title":"Cortar el cesped","completed":false}"#)
                .unwrap();
        assert_eq!(task.id, "4");
        assert!(task.is_unplanned());
        assert_eq!(task.timer_phase(), TimerPhase::NotStarted);
    }
}
