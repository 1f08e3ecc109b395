//! CT2 cassette image format
//!
//! CT2 stores TK2000 programs the way they travel over tape: as a sequence
//! of tone markers and checksummed blocks.
//!
//! # Format Structure
//!
//! ```text
//! CT2 file:
//! ├── Magic "CTK2" (4 bytes)
//! └── Chunks (repeated until end of file)
//!     ├── tag (2 bytes): "CA" leader, "CB" sync marker, "DA" data
//!     ├── length (u16 LE)
//!     └── body (length bytes)
//!
//! DATA chunk body:
//! ├── Block header (8 bytes)
//! │   ├── name (6 bytes, each char | 0x80, padded with 0xA0)
//! │   ├── block_count (u8)
//! │   └── block_index (u8, 0 = header block)
//! ├── Payload
//! │   ├── block 0: initial_addr (u16 LE), end_addr (u16 LE)
//! │   └── block N: up to 256 program bytes
//! └── Checksum (u8, 0xFF XOR every header and payload byte)
//! ```
//!
//! # Usage
//!
//! ## Parsing
//!
//! ```rust,no_run
//! use ct2kit_formats::ct2::ContainerFile;
//!
//! let data = std::fs::read("game.ct2")?;
//! let file = ContainerFile::parse(&data)?;
//!
//! for binary in &file {
//!     println!(
//!         "{} 0x{:04X}-0x{:04X} ({} bytes)",
//!         binary.name(),
//!         binary.initial_addr(),
//!         binary.end_addr(),
//!         binary.size()
//!     );
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Building
//!
//! ```rust
//! use ct2kit_formats::ct2::{Binary, required_buffer_size};
//!
//! let binary = Binary::new("TEST", 0x2000, vec![0x01, 0x02, 0x03, 0x04])?;
//! let data = binary.to_container()?;
//! assert_eq!(data.len(), required_buffer_size(4));
//! assert_eq!(&data[..4], b"CTK2");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod binary;
mod builder;
mod checksum;
mod chunk;
/// CT2 error types
pub mod error;
mod header;
mod parser;

pub use binary::{BLOCK_SIZE, Binary, ContainerFile, block_count_for};
pub use builder::{Ct2Builder, required_buffer_size, required_container_size};
pub use checksum::{CHECKSUM_SEED, Checksum, checksum};
pub use chunk::{
    CHUNK_HEADER_SIZE, Chunk, ChunkHeader, ChunkKind, ChunkScanner, HEADER_BLOCK_LENGTH,
    MAGIC, MIN_DATA_LENGTH, TAG_DATA, TAG_LEADER, TAG_SYNC, chunk_payload_length,
    encode_data_block,
};
pub use error::{Ct2Error, Ct2Result};
pub use header::{
    ADDRESS_RECORD_SIZE, AddressRecord, BLOCK_HEADER_SIZE, BlockHeader, NAME_LEN, NAME_PAD,
};
pub use parser::{Ct2Reader, UnknownChunkPolicy};
