//! Countdown arithmetic and the bookkeeping that turns it into UI signals.
//!
//! The per-task transitions themselves live on [`Task`]; this module covers
//! what spans tasks (one running timer per responsible person) and what
//! spans time (refresh cadence, one-shot overdue alerts).

use crate::domain::{format_remaining, Task, TimerPhase};
use std::collections::HashSet;

/// Remaining time of a task's countdown at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    /// May be negative once overdue
    pub remaining_ms: i64,
    /// True while there is time left on a started timer
    pub active: bool,
}

impl Remaining {
    pub const IDLE: Remaining = Remaining {
        remaining_ms: 0,
        active: false,
    };

    pub fn is_overdue(&self) -> bool {
        self.remaining_ms < 0
    }

    pub fn formatted(&self) -> String {
        format_remaining(self.remaining_ms)
    }
}

/// Compute the remaining time of `task` at `now_ms`
pub fn remaining(task: &Task, now_ms: i64) -> Remaining {
    let Some(estimated_ms) = task.estimated_ms() else {
        return Remaining::IDLE;
    };
    if !task.timer_started {
        return Remaining::IDLE;
    }

    let remaining_ms = estimated_ms - task.total_elapsed(now_ms);
    Remaining {
        remaining_ms,
        active: remaining_ms > 0,
    }
}

/// Pause every running task owned by `responsible` except `keep_id`.
///
/// Returns how many timers were paused.
pub fn pause_others_for(tasks: &mut [Task], keep_id: &str, responsible: &str, now_ms: i64) -> usize {
    let mut paused = 0;
    for task in tasks.iter_mut() {
        if task.id != keep_id
            && task.responsible() == Some(responsible)
            && task.fold_session(now_ms)
        {
            paused += 1;
        }
    }
    paused
}

/// Timer fields that invalidate a cached countdown when they change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerFingerprint {
    completed: bool,
    timer_started: bool,
    timer_paused: bool,
    timer_start_time: Option<i64>,
    elapsed_time: i64,
    estimated_completion_time: Option<u32>,
}

impl TimerFingerprint {
    fn of(task: &Task) -> Self {
        Self {
            completed: task.completed,
            timer_started: task.timer_started,
            timer_paused: task.timer_paused,
            timer_start_time: task.timer_start_time,
            elapsed_time: task.elapsed_time,
            estimated_completion_time: task.estimated_completion_time,
        }
    }
}

/// Per-view countdown poller.
///
/// A running countdown yields at most once per coalescing window; a paused
/// or idle one yields once per timer-state change. Once cancelled it never
/// yields again.
#[derive(Debug, Clone)]
pub struct Countdown {
    task_id: String,
    coalesce_ms: i64,
    last_fingerprint: Option<TimerFingerprint>,
    last_update_ms: Option<i64>,
    current: Remaining,
    cancelled: bool,
}

impl Countdown {
    pub fn new(task_id: impl Into<String>, coalesce_ms: u64) -> Self {
        Self {
            task_id: task_id.into(),
            coalesce_ms: i64::try_from(coalesce_ms).unwrap_or(i64::MAX),
            last_fingerprint: None,
            last_update_ms: None,
            current: Remaining::IDLE,
            cancelled: false,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Recompute if due; `None` means the last value still stands
    pub fn poll(&mut self, task: &Task, now_ms: i64) -> Option<Remaining> {
        if self.cancelled || task.id != self.task_id {
            return None;
        }

        let fingerprint = TimerFingerprint::of(task);
        let changed = self.last_fingerprint != Some(fingerprint);
        let due = task.is_timer_running()
            && self
                .last_update_ms
                .map_or(true, |last| now_ms - last >= self.coalesce_ms);

        if !changed && !due {
            return None;
        }

        self.last_fingerprint = Some(fingerprint);
        self.last_update_ms = Some(now_ms);
        self.current = remaining(task, now_ms);
        Some(self.current)
    }

    /// Last computed value
    pub fn current(&self) -> Remaining {
        self.current
    }

    /// Whether the owner should keep a periodic poll alive for this task
    pub fn needs_polling(&self, task: &Task) -> bool {
        !self.cancelled && task.id == self.task_id && task.is_timer_running()
    }

    /// Stop the countdown for good (view torn down)
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// What the overdue monitor saw for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverdueTransition {
    /// Remaining time just went negative; alert once
    Crossed,
    /// Remaining time is non-negative again; the alert is re-armed
    Recovered,
}

/// Tracks which tasks have already fired their overdue alert
#[derive(Debug, Default, Clone)]
pub struct OverdueMonitor {
    alerted: HashSet<String>,
}

impl OverdueMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe `task` at `now_ms` and report a transition, if any
    pub fn observe(&mut self, task: &Task, now_ms: i64) -> Option<OverdueTransition> {
        match task.timer_phase() {
            TimerPhase::Running => {}
            // A paused timer keeps its alert state until it runs again
            TimerPhase::Paused => return None,
            TimerPhase::NotStarted | TimerPhase::Completed => {
                self.alerted.remove(&task.id);
                return None;
            }
        }

        if remaining(task, now_ms).is_overdue() {
            if self.alerted.insert(task.id.clone()) {
                return Some(OverdueTransition::Crossed);
            }
        } else if self.alerted.remove(&task.id) {
            return Some(OverdueTransition::Recovered);
        }
        None
    }

    /// Forget the alert for one task (timer reset or restarted)
    pub fn rearm(&mut self, task_id: &str) {
        self.alerted.remove(task_id);
    }

    /// Record an alert that already fired, e.g. in an earlier session
    pub fn mark_alerted(&mut self, task_id: &str) {
        self.alerted.insert(task_id.to_string());
    }

    pub fn is_alerted(&self, task_id: &str) -> bool {
        self.alerted.contains(task_id)
    }

    /// Drop state for tasks that no longer exist
    pub fn retain_known(&mut self, tasks: &[Task]) {
        self.alerted.retain(|id| tasks.iter().any(|t| &t.id == id));
    }
}
