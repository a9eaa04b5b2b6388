// libmfc1k/src/card/operations/mod.rs

//! Card-level sequences run against a [`CardReader`](crate::reader::CardReader).

pub mod read;
pub mod write;

// Re-export the card-level entry points so callers can use
// `crate::card::operations::write_card(...)` directly.
pub use read::{dump_card, format_dump_line, payload_from_dump};
pub use write::{
    BlockFailure, SectorProgress, WriteReport, write_card, write_card_with_progress, write_payload,
};
