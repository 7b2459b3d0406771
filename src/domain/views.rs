use super::board::GroupProgress;
use super::enums::TimerPhase;
use super::task::Task;

/// Format remaining milliseconds as a signed "MM:SS".
///
/// Seconds are rounded up from the absolute value, so -1ms is "-00:01".
pub fn format_remaining(remaining_ms: i64) -> String {
    let abs_ms = remaining_ms.unsigned_abs();
    let total_secs = abs_ms.div_ceil(1000);
    if total_secs == 0 {
        return "00:00".to_string();
    }
    let sign = if remaining_ms < 0 { "-" } else { "" };
    format!("{}{:02}:{:02}", sign, total_secs / 60, total_secs % 60)
}

/// Format a millisecond duration as "Xh Ym" (omits 0 values)
pub fn format_elapsed(ms: i64) -> String {
    let total_minutes = ms.max(0) / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours > 0 && minutes > 0 {
        format!("{}h {}m", hours, minutes)
    } else if hours > 0 {
        format!("{}h", hours)
    } else {
        format!("{}m", minutes)
    }
}

/// Get status badge text
pub fn status_badge(task: &Task) -> &'static str {
    match task.timer_phase() {
        TimerPhase::Running if task.is_overdue => "⏰ OVERDUE",
        TimerPhase::Running => "⏱ RUNNING",
        TimerPhase::Paused => "⏸ PAUSED",
        TimerPhase::NotStarted => "· TODO",
        TimerPhase::Completed => "✓ DONE",
    }
}

/// Fixed-width bar for a group's completion, e.g. "[#####-----]"
pub fn progress_bar(group: &GroupProgress, width: usize) -> String {
    let filled = if group.total_count == 0 {
        0
    } else {
        group.completed_count * width / group.total_count
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
