use web_time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock time as a duration since the unix epoch.
pub fn current_epoch() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}
