// libmfc1k/src/constants.rs
//! Card geometry, protocol timing and identification constants

/// Size of one MIFARE Classic block in bytes
pub const BLOCK_SIZE: usize = 16;

/// Maximum number of payload blocks accepted by a single write
pub const MAX_BLOCKS: usize = 16;

/// Number of sectors on a MIFARE Classic 1K card
pub const SECTOR_COUNT: u8 = 16;

/// Blocks per sector (three data blocks followed by the trailer)
pub const BLOCKS_PER_SECTOR: u8 = 4;

/// Index of the sector trailer inside a sector
pub const TRAILER_BLOCK: u8 = 3;

/// Total addressable blocks on the card
pub const TOTAL_BLOCKS: u8 = SECTOR_COUNT * BLOCKS_PER_SECTOR;

/// Sector holding the MIFARE Application Directory
pub const MAD_SECTOR: u8 = 0;

/// Card-wait timeout and session staleness window, in milliseconds
pub const FORGET_TIME_MS: u64 = 5000;

/// Delay between two detection polls, in milliseconds
pub const POLL_INTERVAL_MS: u64 = 50;

/// Field separator used by the delimiter segmentation policy
pub const DEFAULT_DELIMITER: char = '#';

/// Fill byte used to right-pad payload blocks
pub const PAD_BYTE: u8 = b' ';

/// General purpose byte of a factory-fresh trailer
pub const DEFAULT_GPB: u8 = 0x69;

/// Application name reported by `*IDN?`
pub const APP_NAME: &str = "RFID_PRI Pico";

/// Application version reported by `*IDN?`
pub const APP_VERSION: &str = "1.0.0";

/// Sentinel line closing every command response
pub const DONE_MARKER: &str = "Done";
