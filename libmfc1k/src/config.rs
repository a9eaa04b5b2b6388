// libmfc1k/src/config.rs

//! Runtime settings of the command loop.

use std::time::Duration;

use crate::card::SectorKeys;
use crate::constants::{APP_NAME, APP_VERSION};
use crate::payload::{SegmentPolicy, Segmenter};
use crate::utils::{default_forget_time, default_poll_interval};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Settings of [`CommandLoop`](crate::command::CommandLoop).
pub struct AppConfig {
    /// Name answered to `*IDN?`
    pub app_name: String,
    /// Version answered to `*IDN?`
    pub app_version: String,
    /// How long READ/WRITE wait for a card, and how long a silent card stays tracked
    pub forget_time: Duration,
    /// Delay between two detection polls
    pub poll_interval: Duration,
    /// How WRITE payloads are cut into blocks
    pub segment_policy: SegmentPolicy,
    /// Print a block dump after a successful WRITE
    pub dump_after_write: bool,
    /// Keys and access bits written to the trailers
    pub keys: SectorKeys,
}

impl AppConfig {
    /// Same as `Default`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Card-wait timeout and staleness window.
    pub fn with_forget_time(mut self, forget_time: Duration) -> Self {
        self.forget_time = forget_time;
        self
    }

    /// Delay between detection polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Segmentation of WRITE payloads.
    pub fn with_segment_policy(mut self, policy: SegmentPolicy) -> Self {
        self.segment_policy = policy;
        self
    }

    /// Dump the card after each successful WRITE.
    pub fn with_dump_after_write(mut self, enabled: bool) -> Self {
        self.dump_after_write = enabled;
        self
    }

    /// Trailer keys and access bits.
    pub fn with_keys(mut self, keys: SectorKeys) -> Self {
        self.keys = keys;
        self
    }

    /// `*IDN?` answer, e.g. `RFID_PRI Pico, Version 1.0.0`.
    pub fn identity(&self) -> String {
        format!("{}, Version {}", self.app_name, self.app_version)
    }

    /// Segmenter for the configured policy.
    pub fn segmenter(&self) -> Segmenter {
        Segmenter::new(self.segment_policy)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            app_version: APP_VERSION.to_string(),
            forget_time: default_forget_time(),
            poll_interval: default_poll_interval(),
            segment_policy: SegmentPolicy::default(),
            dump_after_write: false,
            keys: SectorKeys::default(),
        }
    }
}
