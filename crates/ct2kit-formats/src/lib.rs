//! Parser and builder for the CT2 cassette image container
//!
#![allow(clippy::cast_possible_truncation)] // Block indices and counts are stored in u8 fields
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // TK2000-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! CT2 is the cassette image format used by TK2000 emulators and tape tools.
//! A CT2 file holds one or more named binaries, each split into a header
//! block carrying the load address range and up to 255 data blocks of 256
//! bytes. Every block is wrapped in a tagged, length-prefixed chunk and
//! protected by an XOR checksum.
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: Both parsing and building supported
//! - **Explicit Layout**: Every record is encoded field by field in little-endian
//! - **Bounded Reads**: Malformed length fields fail instead of reading past the buffer
//! - **Round-Trip Guarantee**: parse(build(binary)) == binary

#![warn(missing_docs)]

/// CT2 container format (chunks, block headers, reader and writer)
///
/// See the [`ct2`] module for the byte layout and usage examples.
pub mod ct2;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

/// Common format trait implemented by the container types
pub trait TapeFormat: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>>;

    /// Build to bytes
    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>>;

    /// Verify round-trip correctness
    fn verify_round_trip(data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        let parsed = Self::parse(data)?;
        let rebuilt = parsed.build()?;
        if data != rebuilt.as_slice() {
            return Err("Round-trip verification failed".into());
        }
        Ok(())
    }
}
