// libmfc1k/src/utils/timeout.rs

//! Timing helpers for the card-wait and watch loops.

use std::time::Duration;

use crate::constants::{FORGET_TIME_MS, POLL_INTERVAL_MS};

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Default card-wait timeout and session staleness window.
pub fn default_forget_time() -> Duration {
    ms(FORGET_TIME_MS)
}

/// Default delay between two detection polls.
pub fn default_poll_interval() -> Duration {
    ms(POLL_INTERVAL_MS)
}
