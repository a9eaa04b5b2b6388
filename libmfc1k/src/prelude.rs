// libmfc1k/src/prelude.rs

//! Commonly used items in one import.

pub use crate::access::{AccessProfile, SectorTrailer, build_access_bits, build_trailer};
pub use crate::cancellation::CancellationToken;
pub use crate::card::{Card, LayoutPlan, SectorKeys, WriteReport};
pub use crate::clock::{Clock, SystemClock};
pub use crate::command::{ChannelLines, Command, CommandLoop, LineReader, LineSource};
pub use crate::config::AppConfig;
pub use crate::payload::{SegmentPolicy, Segmenter};
pub use crate::reader::{CardReader, MockCard, MockReader};
pub use crate::session::{SessionState, SessionTracker};
pub use crate::{
    BlockAddress, BlockData, Error, Key, KeyKind, RequestMode, Result, TagResponse, TagType, Uid,
};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, ms};
