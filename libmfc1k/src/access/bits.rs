// libmfc1k/src/access/bits.rs

//! MIFARE Classic access-bit encoding (trailer bytes 6..=8).

use crate::constants::DEFAULT_GPB;
use crate::{Error, Result};

/// Control bits (C1, C2, C3) governing one block of a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct AccessCondition {
    pub c1: bool,
    pub c2: bool,
    pub c3: bool,
}

impl AccessCondition {
    /// Condition from its three control bits.
    pub const fn new(c1: bool, c2: bool, c3: bool) -> Self {
        Self { c1, c2, c3 }
    }

    /// Condition as the 3-bit value `C1 C2 C3` used in the datasheet tables.
    pub fn as_bits(&self) -> u8 {
        ((self.c1 as u8) << 2) | ((self.c2 as u8) << 1) | self.c3 as u8
    }
}

/// Access conditions of a whole sector.
///
/// Each field holds one control bit per block in its low nibble: bit `n`
/// belongs to block `n`, bit 3 to the sector trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessProfile {
    c1: u8,
    c2: u8,
    c3: u8,
}

impl AccessProfile {
    /// Factory configuration: data blocks open to Key A/B, trailer `001`.
    /// Encodes to `FF 07 80`.
    pub const TRANSPORT: Self = Self {
        c1: 0b0000,
        c2: 0b0000,
        c3: 0b1000,
    };

    /// Profile from three control nibbles; bits above the low nibble are ignored.
    pub const fn new(c1: u8, c2: u8, c3: u8) -> Self {
        Self {
            c1: c1 & 0x0F,
            c2: c2 & 0x0F,
            c3: c3 & 0x0F,
        }
    }

    /// Profile from the conditions of blocks 0, 1, 2 and the trailer.
    pub fn from_conditions(conditions: [AccessCondition; 4]) -> Self {
        let mut profile = Self::new(0, 0, 0);
        for (block, cond) in conditions.iter().enumerate() {
            profile.c1 |= (cond.c1 as u8) << block;
            profile.c2 |= (cond.c2 as u8) << block;
            profile.c3 |= (cond.c3 as u8) << block;
        }
        profile
    }

    /// Condition for block `block` (0..=3); higher indices wrap into the nibble.
    pub fn condition(&self, block: u8) -> AccessCondition {
        let bit = block & 0x03;
        AccessCondition::new(
            (self.c1 >> bit) & 1 == 1,
            (self.c2 >> bit) & 1 == 1,
            (self.c3 >> bit) & 1 == 1,
        )
    }

    /// C1 nibble
    pub fn c1(&self) -> u8 {
        self.c1
    }

    /// C2 nibble
    pub fn c2(&self) -> u8 {
        self.c2
    }

    /// C3 nibble
    pub fn c3(&self) -> u8 {
        self.c3
    }

    /// Trailer bytes 6..=8.
    ///
    /// ```text
    /// byte 6: !C2 (b3..b0) | !C1 (b3..b0)
    /// byte 7:  C1 (b3..b0) | !C3 (b3..b0)
    /// byte 8:  C3 (b3..b0) |  C2 (b3..b0)
    /// ```
    pub fn encode(&self) -> [u8; 3] {
        let (c1, c2, c3) = (self.c1, self.c2, self.c3);
        [
            ((!c2 & 0x0F) << 4) | (!c1 & 0x0F),
            (c1 << 4) | (!c3 & 0x0F),
            (c3 << 4) | c2,
        ]
    }

    /// Inverse of [`encode`](Self::encode). Fails when an inverted nibble
    /// does not match its plain copy, which a card would treat as a locked sector.
    pub fn decode(bytes: [u8; 3]) -> Result<Self> {
        let [b6, b7, b8] = bytes;
        let c1 = b7 >> 4;
        let c2 = b8 & 0x0F;
        let c3 = b8 >> 4;

        let consistent = (!b6 & 0x0F) == c1 && (!b6 >> 4) == c2 && (!b7 & 0x0F) == c3;
        if !consistent {
            return Err(Error::InvalidAccessBits(bytes));
        }
        Ok(Self { c1, c2, c3 })
    }
}

impl Default for AccessProfile {
    fn default() -> Self {
        Self::TRANSPORT
    }
}

/// Access-bit region of a trailer (bytes 6..=9); the last byte carries the
/// factory general purpose byte.
pub fn build_access_bits(profile: AccessProfile) -> [u8; 4] {
    let [b6, b7, b8] = profile.encode();
    [b6, b7, b8, DEFAULT_GPB]
}
