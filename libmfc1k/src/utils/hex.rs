// libmfc1k/src/utils/hex.rs

//! Hex rendering of UIDs and block dumps.

/// Lowercase hex, no separators: `[0xde, 0xad]` -> `dead`
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Lowercase hex, one space between bytes: `[0xde, 0xad]` -> `de ad`
pub fn bytes_to_hex_spaced(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bytes read as one little-endian integer, upper-cased prefix included.
/// `[0x04, 0xa2, 0x2b, 0x19]` -> `0X192BA204`
pub fn le_number_hex(bytes: &[u8]) -> String {
    let value = bytes
        .iter()
        .rev()
        .fold(0u128, |acc, &b| (acc << 8) | b as u128);
    format!("0X{:X}", value)
}
