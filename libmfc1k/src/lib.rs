// libmfc1k/src/lib.rs

//! libmfc1k
//!
//! MIFARE Classic 1K card sessions and sector encoding: access-bit and
//! trailer construction, payload segmentation, the card write layout, card
//! presence tracking and the line-command loop driving a reader.
#![warn(missing_docs)]

pub mod access;
pub mod cancellation;
pub mod card;
pub mod clock;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod payload;
pub mod prelude;
pub mod reader;
pub mod session;
pub mod test_support;
pub mod types;
pub mod utils;

// `crate::Error`, `crate::Result` and the card newtypes live at the root.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
