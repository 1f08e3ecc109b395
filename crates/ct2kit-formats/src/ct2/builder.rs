//! CT2 container builder
//!
//! Writes the magic once, then for every binary a header block followed by
//! its data blocks. Each block is a zero-length `CB` sync marker chunk plus a
//! `DA` chunk holding the framed block.

use binrw::io::{Cursor, Write};
use tracing::debug;

use super::binary::{BLOCK_SIZE, Binary};
use super::chunk::{
    CHUNK_HEADER_SIZE, ChunkHeader, MAGIC, TAG_DATA, TAG_SYNC, chunk_payload_length,
    encode_data_block, write_chunk_header,
};
use super::error::{Ct2Error, Ct2Result};
use super::header::{ADDRESS_RECORD_SIZE, BLOCK_HEADER_SIZE, BlockHeader};

/// Bytes a block adds to the container besides its payload:
/// sync marker chunk + DATA chunk header + block header + checksum
const BLOCK_OVERHEAD: usize = CHUNK_HEADER_SIZE + CHUNK_HEADER_SIZE + BLOCK_HEADER_SIZE + 1;

/// Bytes one binary occupies in a container, magic excluded
fn binary_size(payload_size: usize) -> usize {
    let full_blocks = payload_size / BLOCK_SIZE;
    let remainder = payload_size % BLOCK_SIZE;

    let mut size = BLOCK_OVERHEAD + ADDRESS_RECORD_SIZE;
    size += full_blocks * (BLOCK_OVERHEAD + BLOCK_SIZE);
    if remainder > 0 {
        size += BLOCK_OVERHEAD + remainder;
    }
    size
}

/// Exact size of a single-binary container for a payload of `payload_size` bytes
pub fn required_buffer_size(payload_size: usize) -> usize {
    MAGIC.len() + binary_size(payload_size)
}

/// Exact size of a container holding binaries with the given payload sizes
pub fn required_container_size(payload_sizes: impl IntoIterator<Item = usize>) -> usize {
    MAGIC.len() + payload_sizes.into_iter().map(binary_size).sum::<usize>()
}

/// Builder for CT2 containers
#[derive(Debug, Clone, Default)]
pub struct Ct2Builder {
    binaries: Vec<Binary>,
}

impl Ct2Builder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binary
    pub fn add_binary(mut self, binary: Binary) -> Self {
        self.binaries.push(binary);
        self
    }

    /// Exact size of the container `build` will produce
    pub fn required_size(&self) -> usize {
        required_container_size(self.binaries.iter().map(Binary::size))
    }

    /// Build the container bytes
    ///
    /// The output buffer is reserved up front with its exact final size.
    pub fn build(&self) -> Ct2Result<Vec<u8>> {
        let total = self.required_size();
        let mut out = Vec::new();
        out.try_reserve_exact(total)
            .map_err(|_| Ct2Error::AllocationFailure(total))?;

        let mut cursor = Cursor::new(out);
        cursor.write_all(&MAGIC)?;
        for binary in &self.binaries {
            write_binary(&mut cursor, binary)?;
        }

        let out = cursor.into_inner();
        debug_assert_eq!(out.len(), total);
        Ok(out)
    }
}

fn write_binary(cursor: &mut Cursor<Vec<u8>>, binary: &Binary) -> Ct2Result<()> {
    debug!(
        name = binary.name(),
        initial_addr = binary.initial_addr(),
        end_addr = binary.end_addr(),
        blocks = binary.block_count(),
        "writing binary"
    );

    let mut header = binary.block_header(0);
    write_block(cursor, &header, &binary.address_record().to_bytes())?;

    for (index, payload) in (1usize..).zip(binary.blocks()) {
        header.block_index = (index & 0xFF) as u8;
        write_block(cursor, &header, payload)?;
    }
    Ok(())
}

fn write_block(cursor: &mut Cursor<Vec<u8>>, header: &BlockHeader, payload: &[u8]) -> Ct2Result<()> {
    write_chunk_header(cursor, ChunkHeader::marker(TAG_SYNC))?;
    // At most 8 + 256 + 1 bytes, always fits the u16 length field
    let length = chunk_payload_length(payload) as u16;
    write_chunk_header(cursor, ChunkHeader::new(TAG_DATA, length))?;
    cursor.write_all(&encode_data_block(header, payload))?;
    Ok(())
}
