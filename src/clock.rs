//! Wall clock helpers shared by both stores.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Converts a millisecond timestamp to whole epoch seconds, rounding up.
pub fn ms_to_epoch_secs_ceil(ms: u64) -> u64 {
    ms.div_ceil(1000)
}
