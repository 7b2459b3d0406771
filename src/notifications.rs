//! Local alert delivery for overdue timers and finished boards.
//! Currently only implements macOS notifications
use crate::domain::Task;

#[cfg(target_os = "macos")]
use std::process::Command;

/// Receives one-shot alerts from the task store
pub trait AlertSink: Send + Sync {
    /// A running timer just went past its estimate
    fn overdue(&self, task: &Task);
    /// Every group on the board is completed
    fn celebrate(&self);
}

/// Drops every alert
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAlert;

impl AlertSink for NoopAlert {
    fn overdue(&self, _task: &Task) {}
    fn celebrate(&self) {}
}

/// Desktop notifications, standing in for device vibration
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopAlert;

impl AlertSink for DesktopAlert {
    fn overdue(&self, task: &Task) {
        tracing::info!(task_id = %task.id, "overdue alert");
        notify("Chores - Overdue", &format!("⏰ {}", task.title));
    }

    fn celebrate(&self) {
        tracing::info!("board completed");
        notify("Chores - All done", "🎉 Every chore is finished");
    }
}

fn notify(title: &str, message: &str) {
    #[cfg(target_os = "macos")]
    {
        let script = format!(
            r#"display notification "{}" with title "{}""#,
            message.replace('"', "\\\""),
            title.replace('"', "\\\"")
        );

        let _ = Command::new("osascript").arg("-e").arg(&script).output();
    }

    #[cfg(not(target_os = "macos"))]
    {
        // No-op on other platforms
        let _ = (title, message);
    }
}
