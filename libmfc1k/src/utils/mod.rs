// libmfc1k/src/utils/mod.rs

//! Hex rendering and millisecond helpers shared by the dump output and the
//! polling loops.

pub mod hex;
pub mod timeout;

pub use hex::{bytes_to_hex, bytes_to_hex_spaced, le_number_hex};
pub use timeout::{default_forget_time, default_poll_interval, ms};
