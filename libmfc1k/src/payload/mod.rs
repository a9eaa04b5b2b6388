// libmfc1k/src/payload/mod.rs

//! Splitting operator text into 16-byte card blocks and joining it back.

pub mod segmenter;

pub use segmenter::{SegmentPolicy, Segmenter, reassemble, segment};
