// libmfc1k/src/card/mod.rs

//! Card facade, write layout and card-level read/write sequences.

use crate::payload::{SegmentPolicy, Segmenter};
use crate::reader::{CardReader, DumpEntry};
use crate::session::Detection;
use crate::types::{BlockData, TagType, Uid};
use crate::Result;

pub mod layout;
pub mod operations;

pub use layout::{BlockRole, LayoutPlan, PlannedWrite, SectorKeys};
pub use operations::{BlockFailure, SectorProgress, WriteReport};

/// A selected MIFARE Classic card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    uid: Uid,
    tag_type: TagType,
}

impl Card {
    /// Card selected with `uid`.
    pub fn new(uid: Uid, tag_type: TagType) -> Self {
        Self { uid, tag_type }
    }

    /// UID returned by anti-collision
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    /// Family reported in the ATQA
    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    /// Segment and write a text payload.
    pub fn write_payload<R, F>(
        &self,
        reader: &mut R,
        text: &str,
        segmenter: &Segmenter,
        keys: &SectorKeys,
        on_sector: F,
    ) -> Result<WriteReport>
    where
        R: CardReader + ?Sized,
        F: FnMut(&SectorProgress),
    {
        operations::write_payload(reader, &self.uid, text, segmenter, keys, on_sector)
    }

    /// Write already segmented blocks.
    pub fn write_blocks<R: CardReader + ?Sized>(
        &self,
        reader: &mut R,
        blocks: &[BlockData],
        keys: &SectorKeys,
    ) -> Result<WriteReport> {
        operations::write_card(reader, &self.uid, blocks, keys)
    }

    /// Read all 64 blocks. See [`operations::dump_card`].
    pub fn dump<R: CardReader + ?Sized>(
        &self,
        reader: &mut R,
        keys: &SectorKeys,
    ) -> Result<Vec<DumpEntry>> {
        operations::dump_card(reader, &self.uid, keys)
    }

    /// Dump the card and recover its payload text.
    pub fn read_payload<R: CardReader + ?Sized>(
        &self,
        reader: &mut R,
        keys: &SectorKeys,
        policy: SegmentPolicy,
    ) -> Result<String> {
        let entries = self.dump(reader, keys)?;
        Ok(operations::payload_from_dump(&entries, policy))
    }
}

impl From<Detection> for Card {
    fn from(d: Detection) -> Self {
        Self::new(d.uid, d.tag_type)
    }
}
