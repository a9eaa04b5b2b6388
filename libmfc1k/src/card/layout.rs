// libmfc1k/src/card/layout.rs

//! Placement of payload blocks on the sector/block grid.
//!
//! Sector 0 carries the MAD: its trailer is written first and its blocks
//! 1 and 2 are always zero-filled. Sectors 1 to 15 follow in ascending
//! order, each as `trailer, block 0, block 1, block 2`. Payload blocks fill
//! the data blocks in order; the rest of the card gets zero filler.

use crate::access::{AccessProfile, SectorTrailer};
use crate::constants::{DEFAULT_GPB, MAD_SECTOR, MAX_BLOCKS, SECTOR_COUNT, TRAILER_BLOCK};
use crate::types::{BlockAddress, BlockData, Key, KeyKind};
use crate::{Error, Result};

/// Keys and access profiles applied while writing a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectorKeys {
    /// Key A stored in the MAD trailer
    pub mad_key_a: Key,
    /// Key A stored in every data-sector trailer
    pub data_key_a: Key,
    /// Key B stored in every trailer and presented for every write
    pub key_b: Key,
    /// Access conditions of the MAD sector
    pub mad_access: AccessProfile,
    /// Access conditions of sectors 1 to 15
    pub data_access: AccessProfile,
    /// General purpose byte (trailer byte 9)
    pub gpb: u8,
}

impl SectorKeys {
    /// Store `key` as Key A of the data sectors.
    pub fn with_data_key_a(mut self, key: Key) -> Self {
        self.data_key_a = key;
        self
    }

    /// Store `gpb` in every trailer.
    pub fn with_gpb(mut self, gpb: u8) -> Self {
        self.gpb = gpb;
        self
    }

    /// Trailer written to block 3 of sector 0.
    pub fn mad_trailer(&self) -> SectorTrailer {
        SectorTrailer::new(self.mad_key_a, self.mad_access, self.key_b).with_gpb(self.gpb)
    }

    /// Trailer written to block 3 of sectors 1 to 15.
    pub fn data_trailer(&self) -> SectorTrailer {
        SectorTrailer::new(self.data_key_a, self.data_access, self.key_b).with_gpb(self.gpb)
    }

    /// Key presented when authenticating block writes.
    pub fn auth(&self) -> (KeyKind, &Key) {
        (KeyKind::B, &self.key_b)
    }
}

impl Default for SectorKeys {
    fn default() -> Self {
        Self {
            mad_key_a: Key::FIRST_SECTOR,
            data_key_a: Key::FIRST_SECTOR,
            key_b: Key::DEFAULT,
            mad_access: AccessProfile::TRANSPORT,
            data_access: AccessProfile::TRANSPORT,
            gpb: DEFAULT_GPB,
        }
    }
}

/// Why a block is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    /// Sector 0 block 3
    MadTrailer,
    /// Sector 0 blocks 1 and 2
    Reserved,
    /// Block 3 of a data sector
    SectorTrailer,
    /// Index into the payload block sequence
    Payload(usize),
    /// Zeroed data block past the payload
    Filler,
}

/// One block write of a [`LayoutPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedWrite {
    /// Target block
    pub address: BlockAddress,
    /// Content to store
    pub data: BlockData,
    /// What the block holds
    pub role: BlockRole,
}

/// Ordered list of block writes for one card. The MAD trailer is always first.
#[derive(Debug, Clone)]
pub struct LayoutPlan {
    writes: Vec<PlannedWrite>,
}

impl LayoutPlan {
    /// Lay out `blocks` on the card. Fails before anything is planned when
    /// more than [`MAX_BLOCKS`] payload blocks are given.
    pub fn build(blocks: &[BlockData], keys: &SectorKeys) -> Result<Self> {
        if blocks.len() > MAX_BLOCKS {
            return Err(Error::PayloadTooLarge {
                blocks: blocks.len(),
                max: MAX_BLOCKS,
            });
        }

        let mut writes = Vec::with_capacity(3 + (SECTOR_COUNT as usize - 1) * 4);

        writes.push(PlannedWrite {
            address: BlockAddress::trailer(MAD_SECTOR)?,
            data: keys.mad_trailer().to_block(),
            role: BlockRole::MadTrailer,
        });
        for block in 1..TRAILER_BLOCK {
            writes.push(PlannedWrite {
                address: BlockAddress::new(MAD_SECTOR, block)?,
                data: BlockData::zeroed(),
                role: BlockRole::Reserved,
            });
        }

        let data_trailer = keys.data_trailer().to_block();
        let mut payload = blocks.iter().enumerate();
        for sector in (MAD_SECTOR + 1)..SECTOR_COUNT {
            writes.push(PlannedWrite {
                address: BlockAddress::trailer(sector)?,
                data: data_trailer,
                role: BlockRole::SectorTrailer,
            });
            for block in 0..TRAILER_BLOCK {
                let (data, role) = match payload.next() {
                    Some((index, data)) => (*data, BlockRole::Payload(index)),
                    None => (BlockData::zeroed(), BlockRole::Filler),
                };
                writes.push(PlannedWrite {
                    address: BlockAddress::new(sector, block)?,
                    data,
                    role,
                });
            }
        }

        Ok(Self { writes })
    }

    /// Writes in execution order.
    pub fn writes(&self) -> &[PlannedWrite] {
        &self.writes
    }

    /// Number of planned writes (63 for a 1K card).
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True when nothing is planned.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Address a payload block ends up at.
    pub fn payload_address(&self, index: usize) -> Option<BlockAddress> {
        self.writes
            .iter()
            .find(|w| w.role == BlockRole::Payload(index))
            .map(|w| w.address)
    }
}
