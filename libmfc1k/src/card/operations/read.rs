// libmfc1k/src/card/operations/read.rs

//! Block dumps and payload recovery.

use crate::card::layout::SectorKeys;
use crate::constants::{MAD_SECTOR, SECTOR_COUNT, TOTAL_BLOCKS, TRAILER_BLOCK};
use crate::payload::{SegmentPolicy, reassemble};
use crate::reader::{CardReader, DumpEntry};
use crate::types::{BlockAddress, BlockData, Uid};
use crate::Result;

/// Read every block of the card with the write key. Unreadable blocks are
/// kept in the dump with their error.
pub fn dump_card<R: CardReader + ?Sized>(
    reader: &mut R,
    uid: &Uid,
    keys: &SectorKeys,
) -> Result<Vec<DumpEntry>> {
    let (kind, key) = keys.auth();
    let entries = reader.dump_blocks(uid, 0, TOTAL_BLOCKS, kind, key)?;
    let failed = entries.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        log::warn!("{} of {} blocks unreadable on card {}", failed, entries.len(), uid);
    }
    Ok(entries)
}

/// `S01 B2 [00 11 ...] |ascii|` or `S01 B2 <error>`.
pub fn format_dump_line(entry: &DumpEntry) -> String {
    let (address, result) = entry;
    match result {
        Ok(data) => format!(
            "S{:02} B{} [{}] |{}|",
            address.sector(),
            address.block(),
            data.to_hex(),
            data.to_ascii_safe()
        ),
        Err(err) => format!("S{:02} B{} <{}>", address.sector(), address.block(), err),
    }
}

/// Recover the text written by a card write from a dump.
///
/// Data blocks of sectors 1 to 15 are taken in write order up to the first
/// zero-filled or unreadable block.
pub fn payload_from_dump(entries: &[DumpEntry], policy: SegmentPolicy) -> String {
    let blocks: Vec<BlockData> = data_addresses()
        .map_while(|address| {
            entries
                .iter()
                .find(|(a, _)| *a == address)
                .and_then(|(_, r)| r.as_ref().ok())
                .filter(|data| !data.is_zeroed())
                .copied()
        })
        .collect();
    reassemble(&blocks, policy)
}

fn data_addresses() -> impl Iterator<Item = BlockAddress> {
    ((MAD_SECTOR + 1)..SECTOR_COUNT).flat_map(|sector| {
        (0..TRAILER_BLOCK).filter_map(move |block| BlockAddress::new(sector, block).ok())
    })
}
