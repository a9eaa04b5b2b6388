// libmfc1k/src/access/trailer.rs

//! Sector trailer (block 3) construction and parsing.

use crate::access::bits::{AccessProfile, build_access_bits};
use crate::constants::{BLOCK_SIZE, DEFAULT_GPB};
use crate::types::{BlockData, Key};
use crate::Result;

/// Concatenate `Key A | access bits (6..=8) | GPB | Key B` into one block.
///
/// Only the first three bytes of `access_bits` are used; byte 9 is always
/// taken from `gpb`.
pub fn build_trailer(key_a: &Key, access_bits: [u8; 4], gpb: u8, key_b: &Key) -> [u8; BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE];
    out[..6].copy_from_slice(key_a.as_bytes());
    out[6..9].copy_from_slice(&access_bits[..3]);
    out[9] = gpb;
    out[10..].copy_from_slice(key_b.as_bytes());
    out
}

/// Block 3 of a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorTrailer {
    /// Bytes 0..6
    pub key_a: Key,
    /// Bytes 6..=8
    pub access: AccessProfile,
    /// Byte 9
    pub gpb: u8,
    /// Bytes 10..16
    pub key_b: Key,
}

impl SectorTrailer {
    /// Trailer with the factory GPB.
    pub fn new(key_a: Key, access: AccessProfile, key_b: Key) -> Self {
        Self {
            key_a,
            access,
            gpb: DEFAULT_GPB,
            key_b,
        }
    }

    /// Replace the general purpose byte.
    pub fn with_gpb(mut self, gpb: u8) -> Self {
        self.gpb = gpb;
        self
    }

    /// Raw 16 bytes as written to the card.
    pub fn to_bytes(&self) -> [u8; BLOCK_SIZE] {
        build_trailer(
            &self.key_a,
            build_access_bits(self.access),
            self.gpb,
            &self.key_b,
        )
    }

    /// [`to_bytes`](Self::to_bytes) as a block.
    pub fn to_block(&self) -> BlockData {
        BlockData::from_bytes(self.to_bytes())
    }

    /// Parse a trailer read back from a card. Cards answer Key A as zeros,
    /// so the parsed Key A only reflects what the reader returned.
    pub fn parse(block: &BlockData) -> Result<Self> {
        let b = block.as_bytes();
        let mut key_a = [0u8; 6];
        let mut key_b = [0u8; 6];
        key_a.copy_from_slice(&b[..6]);
        key_b.copy_from_slice(&b[10..]);
        let access = AccessProfile::decode([b[6], b[7], b[8]])?;
        Ok(Self {
            key_a: Key::from_bytes(key_a),
            access,
            gpb: b[9],
            key_b: Key::from_bytes(key_b),
        })
    }
}
