use serde::{Deserialize, Serialize};

/// Timer phase of a task, derived from its stored timer fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    NotStarted,
    Running,
    Paused,
    Completed,
}

impl TimerPhase {
    /// Convert phase to its tag
    pub fn to_tag(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Check if the timer is holding a session (running or paused)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Whether the whole-board celebration may fire more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CelebrationPolicy {
    /// Fire once, then stay quiet until explicitly rearmed
    #[default]
    Once,
    /// Fire on every transition into the completed state
    EveryTransition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_phase_is_active() {
        assert!(TimerPhase::Running.is_active());
        assert!(TimerPhase::Paused.is_active());
        assert!(!TimerPhase::NotStarted.is_active());
        assert!(!TimerPhase::Completed.is_active());
    }

    #[test]
    fn test_celebration_policy_from_toml_value() {
        #[derive(Deserialize)]
        struct Wrapper {
            celebration: CelebrationPolicy,
        }
        let w: Wrapper = toml::from_str(r#"celebration = "every_transition""#).unwrap();
        assert_eq!(w.celebration, CelebrationPolicy::EveryTransition);
    }
}
