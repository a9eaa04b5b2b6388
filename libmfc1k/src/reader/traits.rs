// libmfc1k/src/reader/traits.rs

//! The seam between card logic and transceiver hardware.

use crate::types::{BlockAddress, BlockData, Key, KeyKind, TagResponse, Uid};
use crate::Result;

/// One block of a dump together with the outcome of reading it.
pub type DumpEntry = (BlockAddress, Result<BlockData>);

/// Reader trait abstracts the RFID transceiver away from the card logic.
///
/// Implementations own the device exclusively; callers never share a reader
/// between two in-flight card operations.
pub trait CardReader {
    /// Reset the transceiver
    fn init(&mut self) -> Result<()>;

    /// Ask for a tag in the field. Readers send WUPA by default so a tag
    /// halted by the previous command answers again.
    fn request_tag(&mut self) -> Result<TagResponse>;

    /// Run anti-collision and select the tag answering the last request
    fn select_tag(&mut self) -> Result<Uid>;

    /// Authenticate the block's sector with `key` and read the block
    fn authenticate_and_read(
        &mut self,
        uid: &Uid,
        address: BlockAddress,
        kind: KeyKind,
        key: &Key,
    ) -> Result<BlockData>;

    /// Authenticate the block's sector with `key` and write `data` to the block
    fn authenticate_and_write(
        &mut self,
        uid: &Uid,
        address: BlockAddress,
        kind: KeyKind,
        key: &Key,
        data: &BlockData,
    ) -> Result<()>;

    /// Leave the tag unauthenticated and halted. Default is a no-op for
    /// readers that keep no session state.
    fn halt(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read absolute blocks `start..end`, one entry per block. A failed block
    /// does not stop the dump; its error is kept in the entry.
    fn dump_blocks(
        &mut self,
        uid: &Uid,
        start: u8,
        end: u8,
        kind: KeyKind,
        key: &Key,
    ) -> Result<Vec<DumpEntry>> {
        let mut entries = Vec::with_capacity(end.saturating_sub(start) as usize);
        for number in start..end {
            let address = BlockAddress::from_absolute(number)?;
            let result = self.authenticate_and_read(uid, address, kind, key);
            entries.push((address, result));
        }
        Ok(entries)
    }
}
