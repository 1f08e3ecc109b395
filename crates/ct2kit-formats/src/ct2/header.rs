//! Block header and address records
//!
//! Every DATA chunk starts with an 8-byte block header. Block 0 follows it
//! with a 4-byte address record.

use binrw::{BinRead, BinWrite};

/// Size of the block header in bytes
pub const BLOCK_HEADER_SIZE: usize = 8;

/// Size of the address record in bytes
pub const ADDRESS_RECORD_SIZE: usize = 4;

/// Maximum number of name characters stored in a block header
pub const NAME_LEN: usize = 6;

/// Byte used for unused name slots (a space with the high bit set)
pub const NAME_PAD: u8 = 0xA0;

/// Per-block header record
///
/// Layout:
/// ```text
/// offset 0x00: [u8; 6] name         (each char OR 0x80, padded with 0xA0)
/// offset 0x06: u8      block_count  (data blocks in the binary, mod 256)
/// offset 0x07: u8      block_index  (0 = header block, 1.. = data blocks)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct BlockHeader {
    /// Name bytes with the high bit set
    pub name: [u8; NAME_LEN],
    /// Number of data blocks of the binary
    pub block_count: u8,
    /// Index of this block
    pub block_index: u8,
}

impl BlockHeader {
    /// Build a header for `name`
    ///
    /// Names longer than six characters are truncated. Non-ASCII characters
    /// are stored as `?`.
    pub fn new(name: &str, block_count: u8, block_index: u8) -> Self {
        let mut encoded = [NAME_PAD; NAME_LEN];
        for (slot, ch) in encoded.iter_mut().zip(name.chars()) {
            *slot = ascii_or_placeholder(ch) | 0x80;
        }
        Self {
            name: encoded,
            block_count,
            block_index,
        }
    }

    /// Recover the plain name
    ///
    /// Strips the high bit from every byte and drops trailing padding.
    pub fn decoded_name(&self) -> String {
        let plain: String = self
            .name
            .iter()
            .map(|&b| b & 0x7F)
            .take_while(|&b| b != 0)
            .map(char::from)
            .collect();
        plain.trim_end_matches(' ').to_string()
    }

    /// Whether this is a header (address) block
    pub const fn is_header_block(&self) -> bool {
        self.block_index == 0
    }

    /// Serialize to the 8-byte on-tape form
    pub fn to_bytes(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut out = [0u8; BLOCK_HEADER_SIZE];
        out[..NAME_LEN].copy_from_slice(&self.name);
        out[6] = self.block_count;
        out[7] = self.block_index;
        out
    }
}

/// Normalize a name character to what a block header can store
pub(crate) fn ascii_or_placeholder(ch: char) -> u8 {
    if ch.is_ascii() { ch as u8 } else { b'?' }
}

/// Load address range carried by block 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct AddressRecord {
    /// First address the binary is loaded at
    pub initial_addr: u16,
    /// Last address (inclusive)
    pub end_addr: u16,
}

impl AddressRecord {
    /// Serialize to the 4-byte little-endian form
    pub fn to_bytes(&self) -> [u8; ADDRESS_RECORD_SIZE] {
        let [a0, a1] = self.initial_addr.to_le_bytes();
        let [b0, b1] = self.end_addr.to_le_bytes();
        [a0, a1, b0, b1]
    }

    /// Number of bytes covered by the range, `None` if `end < initial`
    pub fn size(&self) -> Option<usize> {
        self.end_addr
            .checked_sub(self.initial_addr)
            .map(|span| usize::from(span) + 1)
    }
}
