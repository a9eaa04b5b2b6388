// libmfc1k/src/session/mod.rs

//! Card presence tracking across polls.

pub mod tracker;

pub use tracker::{Detection, SessionState, SessionTracker};
