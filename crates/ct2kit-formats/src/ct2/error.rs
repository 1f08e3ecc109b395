//! CT2 error types

use thiserror::Error;

/// CT2-specific error type
#[derive(Debug, Error)]
pub enum Ct2Error {
    /// Buffer does not start with the `CTK2` magic
    #[error("invalid CT2 magic: expected [43 54 4B 32], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// A header or declared chunk length runs past the end of the buffer
    #[error("truncated container at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedContainer {
        /// Offset where the read started
        offset: usize,
        /// Bytes the read needed
        needed: usize,
        /// Bytes left in the buffer
        available: usize,
    },

    /// DATA chunk too short to hold a block header and checksum
    #[error("malformed DATA chunk at offset {offset}: length {length}")]
    MalformedChunk {
        /// Offset of the chunk header
        offset: usize,
        /// Declared chunk length
        length: u16,
    },

    /// Unrecognized chunk tag while the reader rejects unknown chunks
    #[error("unknown chunk tag {tag:02X?} at offset {offset}")]
    UnknownChunk {
        /// Tag bytes
        tag: [u8; 2],
        /// Offset of the chunk header
        offset: usize,
    },

    /// Stored block checksum does not match the computed one
    #[error("checksum mismatch in block {block_index}: computed 0x{expected:02X}, stored 0x{actual:02X}")]
    ChecksumMismatch {
        /// Block index from the block header
        block_index: u8,
        /// Checksum computed over header and payload
        expected: u8,
        /// Checksum byte stored in the chunk
        actual: u8,
    },

    /// Data block found before any header block
    #[error("data block at offset {offset} does not belong to any binary")]
    OrphanBlock {
        /// Offset of the chunk header
        offset: usize,
    },

    /// Data blocks carry more bytes than the binary's address range
    #[error("block at offset {offset} overflows binary {name:?} of {size} bytes")]
    BlockOverflow {
        /// Binary name
        name: String,
        /// Declared binary size
        size: usize,
        /// Offset of the chunk header
        offset: usize,
    },

    /// End address lies below the initial address
    #[error("invalid address range: 0x{initial:04X}..=0x{end:04X}")]
    InvalidAddressRange {
        /// Initial load address
        initial: u16,
        /// End address
        end: u16,
    },

    /// Binary without any payload bytes
    #[error("binary has no data")]
    EmptyBinary,

    /// Payload does not fit in the 16-bit address space from its load address
    #[error("{size} bytes starting at 0x{initial_addr:04X} exceed the 16-bit address space")]
    AddressOverflow {
        /// Initial load address
        initial_addr: u16,
        /// Payload size
        size: usize,
    },

    /// Buffer of the given size could not be reserved
    #[error("failed to allocate {0} bytes")]
    AllocationFailure(usize),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for CT2 operations
pub type Ct2Result<T> = Result<T, Ct2Error>;
