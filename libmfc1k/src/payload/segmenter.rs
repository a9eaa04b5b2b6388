// libmfc1k/src/payload/segmenter.rs

//! Payload segmentation policies.

use crate::constants::{BLOCK_SIZE, DEFAULT_DELIMITER, MAX_BLOCKS, PAD_BYTE};
use crate::types::BlockData;
use crate::{Error, Result};

/// How a payload is cut into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SegmentPolicy {
    /// One block per field separated by the given character.
    Delimiter(char),
    /// Consecutive 16-byte windows of the raw UTF-8 bytes.
    FixedStride,
}

impl Default for SegmentPolicy {
    fn default() -> Self {
        SegmentPolicy::Delimiter(DEFAULT_DELIMITER)
    }
}

/// Payload segmenter with a configurable block budget.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    policy: SegmentPolicy,
    max_blocks: usize,
}

impl Segmenter {
    /// Segmenter allowing [`MAX_BLOCKS`] blocks.
    pub fn new(policy: SegmentPolicy) -> Self {
        Self {
            policy,
            max_blocks: MAX_BLOCKS,
        }
    }

    /// Override the block budget.
    pub fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = max_blocks;
        self
    }

    /// Policy in use.
    pub fn policy(&self) -> SegmentPolicy {
        self.policy
    }

    /// Split `text` into space-padded blocks.
    ///
    /// Nothing is produced when the block count exceeds the budget or, in
    /// delimiter mode, when a field does not fit into one block.
    pub fn segment(&self, text: &str) -> Result<Vec<BlockData>> {
        match self.policy {
            SegmentPolicy::Delimiter(delimiter) => self.segment_fields(text, delimiter),
            SegmentPolicy::FixedStride => self.segment_stride(text),
        }
    }

    fn segment_fields(&self, text: &str, delimiter: char) -> Result<Vec<BlockData>> {
        let fields: Vec<&str> = text.split(delimiter).collect();
        self.check_count(fields.len())?;

        fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let bytes = field.as_bytes();
                if bytes.len() > BLOCK_SIZE {
                    return Err(Error::FieldTooLong {
                        index,
                        len: bytes.len(),
                        max: BLOCK_SIZE,
                    });
                }
                Ok(padded(bytes))
            })
            .collect()
    }

    fn segment_stride(&self, text: &str) -> Result<Vec<BlockData>> {
        let bytes = text.as_bytes();
        self.check_count(bytes.len().div_ceil(BLOCK_SIZE))?;
        Ok(bytes.chunks(BLOCK_SIZE).map(padded).collect())
    }

    fn check_count(&self, blocks: usize) -> Result<()> {
        if blocks > self.max_blocks {
            log::warn!(
                "payload needs {} blocks, budget is {}",
                blocks,
                self.max_blocks
            );
            return Err(Error::PayloadTooLarge {
                blocks,
                max: self.max_blocks,
            });
        }
        Ok(())
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmentPolicy::default())
    }
}

fn padded(chunk: &[u8]) -> BlockData {
    let mut block = [PAD_BYTE; BLOCK_SIZE];
    block[..chunk.len()].copy_from_slice(chunk);
    BlockData::from_bytes(block)
}

/// Segment with the default budget of [`MAX_BLOCKS`].
pub fn segment(text: &str, policy: SegmentPolicy) -> Result<Vec<BlockData>> {
    Segmenter::new(policy).segment(text)
}

/// Rebuild the text carried by payload blocks, dropping the space padding.
///
/// Invalid UTF-8 (for example a character split by a stride boundary whose
/// other half was lost) is replaced rather than rejected.
pub fn reassemble(blocks: &[BlockData], policy: SegmentPolicy) -> String {
    match policy {
        SegmentPolicy::Delimiter(delimiter) => {
            let fields: Vec<String> = blocks
                .iter()
                .map(|b| String::from_utf8_lossy(trim_padding(b.as_bytes())).into_owned())
                .collect();
            fields.join(delimiter.to_string().as_str())
        }
        SegmentPolicy::FixedStride => {
            let mut bytes: Vec<u8> = blocks.iter().flat_map(|b| *b.as_bytes()).collect();
            let kept = trim_padding(&bytes).len();
            bytes.truncate(kept);
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }
}

fn trim_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != PAD_BYTE)
        .map_or(0, |i| i + 1);
    &bytes[..end]
}
