// libmfc1k/src/error.rs

//! Crate error type.

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    #[error("no tag detected")]
    NoTagDetected,

    #[error("payload too large: {blocks} blocks, at most {max} allowed")]
    PayloadTooLarge { blocks: usize, max: usize },

    #[error("payload field {index} is {len} bytes, at most {max} allowed")]
    FieldTooLong { index: usize, len: usize, max: usize },

    #[error("writing MAD sector failed: {source}")]
    MadWriteFailed {
        #[source]
        source: Box<Error>,
    },

    #[error("write of sector {sector} block {block} failed: {reason}")]
    DataBlockWriteFailed { sector: u8, block: u8, reason: String },

    #[error("authentication failed for sector {sector} block {block}")]
    AuthenticationFailed { sector: u8, block: u8 },

    #[error("reader error: {0}")]
    Reader(String),

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid block address: sector {sector} block {block}")]
    InvalidAddress { sector: u8, block: u8 },

    #[error("invalid access bits: {0:02x?}")]
    InvalidAccessBits([u8; 3]),

    #[error("invalid uid length: {0} bytes")]
    InvalidUid(usize),

    #[error("operation timed out")]
    Timeout,

    #[error("interrupted by operator")]
    Interrupted,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "rpi")]
    #[error("spi error: {0}")]
    Spi(#[from] rppal::spi::Error),

    #[cfg(feature = "rpi")]
    #[error("gpio error: {0}")]
    Gpio(#[from] rppal::gpio::Error),
}

/// Crate result alias
pub type Result<T> = std::result::Result<T, Error>;
