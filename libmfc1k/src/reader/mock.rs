// libmfc1k/src/reader/mock.rs

//! In-memory reader and card.

use std::collections::HashSet;

use crate::access::{AccessProfile, SectorTrailer};
use crate::constants::{BLOCK_SIZE, TOTAL_BLOCKS};
use crate::reader::traits::CardReader;
use crate::types::{BlockAddress, BlockData, Key, KeyKind, RequestMode, TagResponse, TagType, Uid};
use crate::{Error, Result};

/// UID of the card behind `mfc1k --simulate`.
pub const SIMULATED_UID: [u8; 4] = [0x04, 0xA2, 0x2B, 0x19];

/// One reader interaction, recorded in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderCall {
    /// `init`
    Init,
    /// `request_tag`
    Request,
    /// `select_tag`
    Select,
    /// `authenticate_and_read` of a block
    Read(BlockAddress),
    /// `authenticate_and_write` of a block, failed or not
    Write(BlockAddress, BlockData),
    /// `halt`
    Halt,
}

/// In-memory MIFARE Classic 1K card.
#[derive(Debug, Clone)]
pub struct MockCard {
    /// UID answered on select
    pub uid: Uid,
    /// Family reported by the request
    pub tag_type: TagType,
    /// All 64 blocks, trailers included
    pub blocks: Vec<BlockData>,
    /// Set by HLTA. A halted card only answers a wake-up request.
    pub halted: bool,
}

impl MockCard {
    /// Factory-fresh card: manufacturer block carries the UID, every
    /// trailer holds the transport configuration with default keys.
    pub fn new(uid: Uid) -> Self {
        let mut blocks = vec![BlockData::zeroed(); TOTAL_BLOCKS as usize];

        let mut manufacturer = [0u8; BLOCK_SIZE];
        manufacturer[..uid.len()].copy_from_slice(uid.as_bytes());
        manufacturer[uid.len()] = uid.as_bytes().iter().fold(0u8, |acc, b| acc ^ b);
        blocks[0] = BlockData::from_bytes(manufacturer);

        let factory = SectorTrailer::new(Key::DEFAULT, AccessProfile::TRANSPORT, Key::DEFAULT);
        for trailer in (3..TOTAL_BLOCKS as usize).step_by(4) {
            blocks[trailer] = factory.to_block();
        }

        Self {
            uid,
            tag_type: TagType::Classic1K,
            blocks,
            halted: false,
        }
    }

    /// Fresh card with [`SIMULATED_UID`].
    pub fn simulated() -> Self {
        Self::new(Uid::from(SIMULATED_UID))
    }

    /// Stored content of `address`.
    pub fn block(&self, address: BlockAddress) -> BlockData {
        self.blocks[address.absolute() as usize]
    }

    fn trailer_key(&self, sector: u8, kind: KeyKind) -> Key {
        let trailer = self.blocks[(sector * 4 + 3) as usize];
        let b = trailer.as_bytes();
        let mut key = [0u8; 6];
        match kind {
            KeyKind::A => key.copy_from_slice(&b[..6]),
            KeyKind::B => key.copy_from_slice(&b[10..]),
        }
        Key::from_bytes(key)
    }
}

/// Mock reader for unit tests and the simulated backend of the binary.
/// It records every call and lets tests inject detection and block failures.
#[derive(Debug, Default)]
pub struct MockReader {
    /// Card in the field, if any
    pub card: Option<MockCard>,
    /// Every call made so far
    pub calls: Vec<ReaderCall>,
    /// Request frame the reader sends
    pub request_mode: RequestMode,
    /// Number of upcoming requests that report no tag even with a card present
    pub absent_polls: usize,
    /// Number of upcoming requests that fail with a reader error
    pub request_failures: usize,
    /// Blocks whose writes fail
    pub failing_writes: HashSet<BlockAddress>,
    /// Blocks whose reads fail
    pub failing_reads: HashSet<BlockAddress>,
}

impl MockReader {
    /// Reader with an empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader with `card` already in the field.
    pub fn with_card(card: MockCard) -> Self {
        Self {
            card: Some(card),
            ..Self::default()
        }
    }

    /// Send `mode` on every request.
    pub fn with_request_mode(mut self, mode: RequestMode) -> Self {
        self.request_mode = mode;
        self
    }

    /// Bring `card` into the field. Entering the field resets a halted card.
    pub fn insert_card(&mut self, mut card: MockCard) {
        card.halted = false;
        self.card = Some(card);
    }

    /// Take the card out of the field.
    pub fn remove_card(&mut self) -> Option<MockCard> {
        self.card.take()
    }

    /// Report no tag for the next `n` requests.
    pub fn set_absent_polls(&mut self, n: usize) {
        self.absent_polls = n;
    }

    /// Fail the next `n` requests.
    pub fn set_request_failures(&mut self, n: usize) {
        self.request_failures = n;
    }

    /// Fail every write to `address`.
    pub fn fail_write_at(&mut self, address: BlockAddress) {
        self.failing_writes.insert(address);
    }

    /// Fail every read of `address`.
    pub fn fail_read_at(&mut self, address: BlockAddress) {
        self.failing_reads.insert(address);
    }

    /// Number of requests sent so far.
    pub fn request_count(&self) -> usize {
        self.calls.iter().filter(|c| **c == ReaderCall::Request).count()
    }

    /// Successful and failed write attempts, in order.
    pub fn writes(&self) -> Vec<(BlockAddress, BlockData)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ReaderCall::Write(a, d) => Some((*a, *d)),
                _ => None,
            })
            .collect()
    }

    /// Number of write attempts.
    pub fn write_count(&self) -> usize {
        self.writes().len()
    }

    /// Raw stored content of a block, bypassing authentication.
    pub fn stored(&self, address: BlockAddress) -> Option<BlockData> {
        self.card.as_ref().map(|c| c.block(address))
    }

    fn authenticate(&self, uid: &Uid, address: BlockAddress, kind: KeyKind, key: &Key) -> Result<&MockCard> {
        let card = match &self.card {
            Some(card) if card.uid == *uid && !card.halted => card,
            _ => return Err(Error::NoTagDetected),
        };
        if card.trailer_key(address.sector(), kind) != *key {
            return Err(Error::AuthenticationFailed {
                sector: address.sector(),
                block: address.block(),
            });
        }
        Ok(card)
    }
}

impl CardReader for MockReader {
    fn init(&mut self) -> Result<()> {
        self.calls.push(ReaderCall::Init);
        Ok(())
    }

    fn request_tag(&mut self) -> Result<TagResponse> {
        self.calls.push(ReaderCall::Request);
        if self.request_failures > 0 {
            self.request_failures -= 1;
            return Err(Error::Reader("simulated request failure".into()));
        }
        if self.absent_polls > 0 {
            self.absent_polls -= 1;
            return Ok(TagResponse::NoTag);
        }
        let mode = self.request_mode;
        Ok(match self.card.as_mut() {
            Some(card) if card.halted && mode == RequestMode::Idle => TagResponse::NoTag,
            Some(card) => {
                card.halted = false;
                TagResponse::Present(card.tag_type)
            }
            None => TagResponse::NoTag,
        })
    }

    fn select_tag(&mut self) -> Result<Uid> {
        self.calls.push(ReaderCall::Select);
        self.card
            .as_ref()
            .map(|c| c.uid)
            .ok_or(Error::NoTagDetected)
    }

    fn authenticate_and_read(
        &mut self,
        uid: &Uid,
        address: BlockAddress,
        kind: KeyKind,
        key: &Key,
    ) -> Result<BlockData> {
        self.calls.push(ReaderCall::Read(address));
        if self.failing_reads.contains(&address) {
            return Err(Error::Reader(format!("simulated read failure at {}", address)));
        }
        let card = self.authenticate(uid, address, kind, key)?;
        let mut data = card.block(address);
        if address.is_trailer() {
            // Key A is never readable
            let mut bytes = *data.as_bytes();
            bytes[..6].fill(0);
            data = BlockData::from_bytes(bytes);
        }
        Ok(data)
    }

    fn authenticate_and_write(
        &mut self,
        uid: &Uid,
        address: BlockAddress,
        kind: KeyKind,
        key: &Key,
        data: &BlockData,
    ) -> Result<()> {
        self.calls.push(ReaderCall::Write(address, *data));
        if self.failing_writes.contains(&address) {
            return Err(Error::Reader(format!("simulated write failure at {}", address)));
        }
        if address.absolute() == 0 {
            return Err(Error::Reader("manufacturer block is read-only".into()));
        }
        self.authenticate(uid, address, kind, key)?;
        if let Some(card) = self.card.as_mut() {
            card.blocks[address.absolute() as usize] = *data;
        }
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        self.calls.push(ReaderCall::Halt);
        if let Some(card) = self.card.as_mut() {
            card.halted = true;
        }
        Ok(())
    }
}
