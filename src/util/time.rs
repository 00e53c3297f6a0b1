use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time elapsed since the UNIX epoch, zero if the clock is before it
fn since_epoch() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}

/// Get a timestamp in seconds since the UNIX epoch
pub fn timestamp_secs() -> u64 {
    since_epoch().as_secs()
}

/// Millisecond timestamp, used to name exported files
pub fn timestamp_millis() -> u128 {
    since_epoch().as_millis()
}
