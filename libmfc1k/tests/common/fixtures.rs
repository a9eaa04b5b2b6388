// libmfc1k/tests/common/fixtures.rs

use libmfc1k::reader::{MockCard, MockReader, ReaderCall};
use libmfc1k::types::{BlockAddress, BlockData, Uid};

pub fn sample_uid_bytes() -> [u8; 4] {
    [0x04, 0xA2, 0x2B, 0x19]
}

pub fn sample_uid() -> Uid {
    Uid::from(sample_uid_bytes())
}

pub fn double_size_uid() -> Uid {
    Uid::try_from(&[0x04u8, 0x6F, 0x21, 0x8A, 0x5C, 0x3E, 0x80][..]).unwrap()
}

pub fn fresh_reader() -> MockReader {
    MockReader::with_card(MockCard::new(sample_uid()))
}

pub fn addr(sector: u8, block: u8) -> BlockAddress {
    BlockAddress::new(sector, block).unwrap()
}

pub fn text_block(text: &str) -> BlockData {
    let mut bytes = [b' '; 16];
    bytes[..text.len()].copy_from_slice(text.as_bytes());
    BlockData::from_bytes(bytes)
}

/// Write calls in the order the reader saw them.
pub fn write_addresses(reader: &MockReader) -> Vec<BlockAddress> {
    reader
        .calls
        .iter()
        .filter_map(|c| match c {
            ReaderCall::Write(a, _) => Some(*a),
            _ => None,
        })
        .collect()
}
