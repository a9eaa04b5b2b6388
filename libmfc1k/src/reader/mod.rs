// libmfc1k/src/reader/mod.rs

//! Card reader abstraction, the in-memory mock and the MFRC522 driver.

pub mod mock;
pub mod traits;
#[cfg(feature = "rpi")]
pub mod mfrc522;

pub use mock::{MockCard, MockReader, ReaderCall, SIMULATED_UID};
pub use traits::{CardReader, DumpEntry};
#[cfg(feature = "rpi")]
pub use mfrc522::Mfrc522Reader;
