// libmfc1k/src/command/mod.rs

//! Line-oriented command protocol spoken with the host.
//!
//! Every response ends with a `Done` line so the host can detect the end of
//! the answer without timing assumptions.

pub mod app;
pub mod lines;
pub mod protocol;

pub use app::CommandLoop;
pub use lines::{ChannelLines, LineReader, LineSource};
pub use protocol::Command;
