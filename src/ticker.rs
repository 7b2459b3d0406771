use std::time::Duration;

/// Poll interval in milliseconds while a countdown is running
pub const DEFAULT_REFRESH_MS: u64 = 1000;

/// Minimum gap between two recomputations of a running countdown.
/// Must stay below the refresh interval to keep a 1 Hz display.
pub const DEFAULT_COALESCE_MS: u64 = 950;

/// Get tick duration for a refresh interval in milliseconds
pub fn tick_duration(refresh_ms: u64) -> Duration {
    Duration::from_millis(refresh_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_duration() {
        assert_eq!(tick_duration(DEFAULT_REFRESH_MS), Duration::from_millis(1000));
    }
}
