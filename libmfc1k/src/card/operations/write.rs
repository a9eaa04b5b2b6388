// libmfc1k/src/card/operations/write.rs

//! Executing a [`LayoutPlan`]: the MAD trailer gates the write, data
//! blocks are best-effort.

use crate::card::layout::{BlockRole, LayoutPlan, PlannedWrite, SectorKeys};
use crate::payload::Segmenter;
use crate::reader::CardReader;
use crate::types::{BlockAddress, BlockData, Uid};
use crate::{Error, Result};

/// A block whose write failed without stopping the card write.
#[derive(Debug)]
pub struct BlockFailure {
    /// Block that was not written
    pub address: BlockAddress,
    /// What it should have held
    pub role: BlockRole,
    /// Cause, usually [`Error::DataBlockWriteFailed`]
    pub error: Error,
}

/// Progress of one sector, reported once its last block was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorProgress {
    /// Sector number, 0 to 15
    pub sector: u8,
    /// Writes tried in this sector
    pub attempted: usize,
    /// Writes that failed in this sector
    pub failed: usize,
}

/// Outcome of a card write that got past the MAD sector.
#[derive(Debug)]
pub struct WriteReport {
    /// Card written
    pub uid: Uid,
    /// Writes tried, MAD included
    pub attempted: usize,
    /// Writes acknowledged
    pub written: usize,
    /// Failed data-block writes, in write order
    pub failures: Vec<BlockFailure>,
}

impl WriteReport {
    /// True when every planned block was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Sectors with at least one failed block, ascending.
    pub fn failed_sectors(&self) -> Vec<u8> {
        let mut sectors: Vec<u8> = self.failures.iter().map(|f| f.address.sector()).collect();
        sectors.dedup();
        sectors
    }
}

/// Write payload blocks across the card.
///
/// The MAD trailer goes first; if it cannot be written nothing else is
/// attempted and `MadWriteFailed` is returned. Every later block is
/// best-effort: failures are logged and collected in the report.
pub fn write_card<R: CardReader + ?Sized>(
    reader: &mut R,
    uid: &Uid,
    blocks: &[BlockData],
    keys: &SectorKeys,
) -> Result<WriteReport> {
    write_card_with_progress(reader, uid, blocks, keys, |_| {})
}

/// Same as [`write_card`], calling `on_sector` after each sector, 0 to 15.
pub fn write_card_with_progress<R, F>(
    reader: &mut R,
    uid: &Uid,
    blocks: &[BlockData],
    keys: &SectorKeys,
    on_sector: F,
) -> Result<WriteReport>
where
    R: CardReader + ?Sized,
    F: FnMut(&SectorProgress),
{
    let plan = LayoutPlan::build(blocks, keys)?;
    execute_plan(reader, uid, &plan, keys, on_sector)
}

/// Segment `text` and write it. Segmentation errors are returned before
/// the reader is touched.
pub fn write_payload<R, F>(
    reader: &mut R,
    uid: &Uid,
    text: &str,
    segmenter: &Segmenter,
    keys: &SectorKeys,
    on_sector: F,
) -> Result<WriteReport>
where
    R: CardReader + ?Sized,
    F: FnMut(&SectorProgress),
{
    let blocks = segmenter.segment(text)?;
    write_card_with_progress(reader, uid, &blocks, keys, on_sector)
}

fn execute_plan<R, F>(
    reader: &mut R,
    uid: &Uid,
    plan: &LayoutPlan,
    keys: &SectorKeys,
    mut on_sector: F,
) -> Result<WriteReport>
where
    R: CardReader + ?Sized,
    F: FnMut(&SectorProgress),
{
    let (kind, key) = keys.auth();
    let mut writes = plan.writes().iter();

    let mut report = WriteReport {
        uid: *uid,
        attempted: 0,
        written: 0,
        failures: Vec::new(),
    };

    if let Some(mad) = writes.next() {
        report.attempted += 1;
        if let Err(err) = reader.authenticate_and_write(uid, mad.address, kind, key, &mad.data) {
            log::error!("MAD trailer write on card {} failed: {}", uid, err);
            return Err(Error::MadWriteFailed {
                source: Box::new(err),
            });
        }
        report.written += 1;
    }

    let mut progress = SectorProgress {
        sector: 0,
        attempted: 1,
        failed: 0,
    };

    for planned in writes {
        let sector = planned.address.sector();
        if sector != progress.sector {
            on_sector(&progress);
            progress = SectorProgress {
                sector,
                attempted: 0,
                failed: 0,
            };
        }

        report.attempted += 1;
        progress.attempted += 1;
        match write_block(reader, uid, planned, keys) {
            Ok(()) => report.written += 1,
            Err(failure) => {
                progress.failed += 1;
                report.failures.push(failure);
            }
        }
    }
    on_sector(&progress);

    log::info!(
        "card {}: {}/{} blocks written",
        uid,
        report.written,
        report.attempted
    );
    Ok(report)
}

fn write_block<R: CardReader + ?Sized>(
    reader: &mut R,
    uid: &Uid,
    planned: &PlannedWrite,
    keys: &SectorKeys,
) -> std::result::Result<(), BlockFailure> {
    let (kind, key) = keys.auth();
    reader
        .authenticate_and_write(uid, planned.address, kind, key, &planned.data)
        .map_err(|err| {
            log::warn!("write of {} ({:?}) failed: {}", planned.address, planned.role, err);
            BlockFailure {
                address: planned.address,
                role: planned.role,
                error: Error::DataBlockWriteFailed {
                    sector: planned.address.sector(),
                    block: planned.address.block(),
                    reason: err.to_string(),
                },
            }
        })
}
