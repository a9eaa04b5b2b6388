// libmfc1k/src/types.rs

//! Newtypes shared across the crate.

use crate::Error;
use crate::constants::{BLOCK_SIZE, BLOCKS_PER_SECTOR, SECTOR_COUNT, TRAILER_BLOCK};
use derive_more::Display;
use std::fmt;

/// Longest UID a triple-size ISO 14443-A tag can report
const MAX_UID_LEN: usize = 10;

/// Card UID - 4, 7 or 10 bytes, compared by value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Uid {
    bytes: [u8; MAX_UID_LEN],
    len: u8,
}

impl Uid {
    /// UID bytes in anti-collision order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// 4, 7 or 10.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Never true for a UID built through `TryFrom` or `From`.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Space separated lowercase hex.
    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex_spaced(self.as_bytes())
    }

    /// Card number printed by READ: the UID read as a little-endian integer
    pub fn card_number(&self) -> String {
        crate::utils::le_number_hex(self.as_bytes())
    }
}

impl TryFrom<&[u8]> for Uid {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes.len() {
            4 | 7 | 10 => {
                let mut arr = [0u8; MAX_UID_LEN];
                arr[..bytes.len()].copy_from_slice(bytes);
                Ok(Self {
                    bytes: arr,
                    len: bytes.len() as u8,
                })
            }
            n => Err(Error::InvalidUid(n)),
        }
    }
}

impl From<[u8; 4]> for Uid {
    fn from(single: [u8; 4]) -> Self {
        let mut bytes = [0u8; MAX_UID_LEN];
        bytes[..4].copy_from_slice(&single);
        Self { bytes, len: 4 }
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// MIFARE Classic sector key (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key([u8; 6]);

impl Key {
    /// Factory key
    pub const DEFAULT: Self = Self([0xFF; 6]);
    /// Key A of the MAD sector
    pub const FIRST_SECTOR: Self = Self([0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5]);
    /// Alternative Key A for data sectors
    pub const NEXT_SECTOR: Self = Self([0xD3, 0xF7, 0xD3, 0xF7, 0xD3, 0xF7]);

    /// Key from its six bytes.
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

/// Which key of a sector is presented during authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyKind {
    /// Key A (trailer bytes 0..6)
    A,
    /// Key B (trailer bytes 10..16)
    B,
}

impl KeyKind {
    /// PICC authentication command byte
    pub fn auth_command(&self) -> u8 {
        match self {
            KeyKind::A => 0x60,
            KeyKind::B => 0x61,
        }
    }
}

/// BlockData (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockData([u8; BLOCK_SIZE]);

impl BlockData {
    /// Block from 16 raw bytes.
    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self(bytes)
    }

    /// All-zero filler block
    pub const fn zeroed() -> Self {
        Self([0u8; BLOCK_SIZE])
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }

    /// True when every byte is zero.
    pub fn is_zeroed(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Space separated lowercase hex.
    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex_spaced(self.as_bytes())
    }

    /// Printable ASCII, anything else as `.`.
    pub fn to_ascii_safe(&self) -> String {
        self.0
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect()
    }
}

impl TryFrom<&[u8]> for BlockData {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; BLOCK_SIZE] = bytes.try_into().map_err(|_| Error::InvalidLength {
            expected: BLOCK_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

/// Sector/block coordinate on a 1K card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockAddress {
    sector: u8,
    block: u8,
}

impl BlockAddress {
    /// Checked address; sector below 16, block below 4.
    pub fn new(sector: u8, block: u8) -> crate::Result<Self> {
        if sector >= SECTOR_COUNT || block >= BLOCKS_PER_SECTOR {
            return Err(Error::InvalidAddress { sector, block });
        }
        Ok(Self { sector, block })
    }

    /// Address from an absolute block number (0..64)
    pub fn from_absolute(number: u8) -> crate::Result<Self> {
        Self::new(number / BLOCKS_PER_SECTOR, number % BLOCKS_PER_SECTOR)
    }

    /// Block 3 of `sector`.
    pub fn trailer(sector: u8) -> crate::Result<Self> {
        Self::new(sector, TRAILER_BLOCK)
    }

    /// Sector number
    pub fn sector(&self) -> u8 {
        self.sector
    }

    /// Block inside the sector
    pub fn block(&self) -> u8 {
        self.block
    }

    /// Block number as sent over the air (0..64)
    pub fn absolute(&self) -> u8 {
        self.sector * BLOCKS_PER_SECTOR + self.block
    }

    /// True for block 3
    pub fn is_trailer(&self) -> bool {
        self.block == TRAILER_BLOCK
    }
}

impl fmt::Display for BlockAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sector {} block {}", self.sector, self.block)
    }
}

/// Tag family derived from the ATQA answer to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[allow(missing_docs)]
pub enum TagType {
    #[display(fmt = "MIFARE Classic 1K")]
    Classic1K,
    #[display(fmt = "MIFARE Classic 4K")]
    Classic4K,
    #[display(fmt = "MIFARE Ultralight")]
    Ultralight,
    #[display(fmt = "unknown (ATQA {:#06x})", _0)]
    Unknown(u16),
}

impl TagType {
    /// Family for an ATQA read little-endian.
    pub fn from_atqa(atqa: u16) -> Self {
        match atqa {
            0x0004 => Self::Classic1K,
            0x0002 => Self::Classic4K,
            0x0044 => Self::Ultralight,
            other => Self::Unknown(other),
        }
    }
}

/// Outcome of a tag request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagResponse {
    /// A tag answered with this ATQA family
    Present(TagType),
    /// Nothing answered
    NoTag,
}

/// Short frame sent to ask the field for tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestMode {
    /// REQA: only tags in the IDLE state answer
    Idle,
    /// WUPA: halted tags answer as well
    #[default]
    WakeUp,
}

impl RequestMode {
    /// 7-bit short frame command byte
    pub fn command(&self) -> u8 {
        match self {
            RequestMode::Idle => 0x26,
            RequestMode::WakeUp => 0x52,
        }
    }
}
