// libmfc1k/src/access/mod.rs

//! Sector access control: the MIFARE Classic access-bit layout and the
//! 16-byte sector trailer built around it.

pub mod bits;
pub mod trailer;

pub use bits::{AccessCondition, AccessProfile, build_access_bits};
pub use trailer::{SectorTrailer, build_trailer};
