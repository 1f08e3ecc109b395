//! CT2 container reader
//!
//! Walks the chunks of a container and reassembles its binaries. A header
//! block (index 0) opens a new binary sized from its address range; the data
//! blocks that follow are copied into it in order.

use binrw::BinRead;
use binrw::io::Cursor;
use tracing::{debug, warn};

use super::binary::{Binary, ContainerFile, block_count_for};
use super::checksum::checksum;
use super::chunk::{Chunk, ChunkKind, ChunkScanner, MIN_DATA_LENGTH};
use super::error::{Ct2Error, Ct2Result};
use super::header::{ADDRESS_RECORD_SIZE, AddressRecord, BLOCK_HEADER_SIZE, BlockHeader};

/// What the reader does with chunks whose tag it does not know
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownChunkPolicy {
    /// Skip over the chunk using its declared length
    #[default]
    Skip,
    /// Fail with [`Ct2Error::UnknownChunk`]
    Reject,
}

/// Configurable CT2 reader
#[derive(Debug, Clone, Copy)]
pub struct Ct2Reader {
    verify_checksums: bool,
    unknown_chunks: UnknownChunkPolicy,
}

/// Progress of the binary currently being filled
#[derive(Debug)]
struct OpenBinary {
    size: usize,
    written: usize,
    next_index: usize,
}

impl OpenBinary {
    const fn is_complete(&self) -> bool {
        self.written >= self.size
    }

    /// A block index of 0 continues the binary when the u8 index wrapped
    const fn expects_wrapped_index(&self) -> bool {
        !self.is_complete() && self.next_index % 256 == 0
    }
}

impl Ct2Reader {
    /// Reader that verifies checksums and skips unknown chunks
    pub fn new() -> Self {
        Self {
            verify_checksums: true,
            unknown_chunks: UnknownChunkPolicy::Skip,
        }
    }

    /// Enable or disable block checksum verification
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Set the policy for unknown chunk tags
    pub fn unknown_chunks(mut self, policy: UnknownChunkPolicy) -> Self {
        self.unknown_chunks = policy;
        self
    }

    /// Parse a container buffer
    pub fn read(&self, data: &[u8]) -> Ct2Result<ContainerFile> {
        let mut file = ContainerFile::new();
        let mut open: Option<OpenBinary> = None;

        for chunk in ChunkScanner::new(data)? {
            let chunk = chunk?;
            match chunk.kind() {
                ChunkKind::Leader | ChunkKind::Sync => {}
                ChunkKind::Unknown(tag) => match self.unknown_chunks {
                    UnknownChunkPolicy::Skip => {
                        warn!(
                            offset = chunk.offset,
                            tag = ?tag,
                            length = chunk.header.length,
                            "skipping unknown chunk"
                        );
                    }
                    UnknownChunkPolicy::Reject => {
                        return Err(Ct2Error::UnknownChunk {
                            tag,
                            offset: chunk.offset,
                        });
                    }
                },
                ChunkKind::Data => self.read_data_chunk(&chunk, &mut file, &mut open)?,
            }
        }

        if let (Some(state), Some(binary)) = (open.as_ref(), file.binaries().last()) {
            warn_if_short(binary, state);
        }
        debug!(binaries = file.len(), "parsed container");
        Ok(file)
    }

    fn read_data_chunk(
        &self,
        chunk: &Chunk<'_>,
        file: &mut ContainerFile,
        open: &mut Option<OpenBinary>,
    ) -> Ct2Result<()> {
        let length = chunk.body.len();
        if length < MIN_DATA_LENGTH {
            return Err(Ct2Error::MalformedChunk {
                offset: chunk.offset,
                length: chunk.header.length,
            });
        }

        let header = BlockHeader::read(&mut Cursor::new(&chunk.body[..BLOCK_HEADER_SIZE]))?;
        let (framed, stored) = chunk.body.split_at(length - 1);
        if self.verify_checksums {
            let computed = checksum(framed);
            if computed != stored[0] {
                return Err(Ct2Error::ChecksumMismatch {
                    block_index: header.block_index,
                    expected: computed,
                    actual: stored[0],
                });
            }
        }
        let payload = &framed[BLOCK_HEADER_SIZE..];

        let wrapped = header.is_header_block()
            && open.as_ref().is_some_and(OpenBinary::expects_wrapped_index);
        if header.is_header_block() && !wrapped {
            open_binary(chunk, &header, payload, file, open)
        } else {
            continue_binary(chunk, &header, payload, file, open)
        }
    }
}

impl Default for Ct2Reader {
    fn default() -> Self {
        Self::new()
    }
}

fn open_binary(
    chunk: &Chunk<'_>,
    header: &BlockHeader,
    payload: &[u8],
    file: &mut ContainerFile,
    open: &mut Option<OpenBinary>,
) -> Ct2Result<()> {
    if let (Some(state), Some(previous)) = (open.take(), file.binaries().last()) {
        warn_if_short(previous, &state);
    }

    if payload.len() != ADDRESS_RECORD_SIZE {
        return Err(Ct2Error::MalformedChunk {
            offset: chunk.offset,
            length: chunk.header.length,
        });
    }
    let address = AddressRecord::read(&mut Cursor::new(payload))?;
    let size = address.size().ok_or(Ct2Error::InvalidAddressRange {
        initial: address.initial_addr,
        end: address.end_addr,
    })?;

    let mut data = Vec::new();
    data.try_reserve_exact(size)
        .map_err(|_| Ct2Error::AllocationFailure(size))?;
    data.resize(size, 0);

    let name = header.decoded_name();
    let expected_blocks = block_count_for(size);
    if usize::from(header.block_count) != expected_blocks % 256 {
        warn!(
            name = %name,
            stored = header.block_count,
            expected = expected_blocks,
            "block count does not match address range"
        );
    }
    debug!(
        name = %name,
        initial_addr = address.initial_addr,
        end_addr = address.end_addr,
        blocks = expected_blocks,
        "reading binary"
    );

    file.push(Binary::from_parts(name, address, data));
    *open = Some(OpenBinary {
        size,
        written: 0,
        next_index: 1,
    });
    Ok(())
}

fn continue_binary(
    chunk: &Chunk<'_>,
    header: &BlockHeader,
    payload: &[u8],
    file: &mut ContainerFile,
    open: &mut Option<OpenBinary>,
) -> Ct2Result<()> {
    let (Some(state), Some(binary)) = (open.as_mut(), file.last_mut()) else {
        return Err(Ct2Error::OrphanBlock {
            offset: chunk.offset,
        });
    };

    if usize::from(header.block_index) != state.next_index % 256 {
        warn!(
            name = binary.name(),
            expected = state.next_index,
            found = header.block_index,
            "out-of-sequence block"
        );
    }

    let end = state.written + payload.len();
    if end > state.size {
        return Err(Ct2Error::BlockOverflow {
            name: binary.name().to_string(),
            size: state.size,
            offset: chunk.offset,
        });
    }
    binary.data_mut()[state.written..end].copy_from_slice(payload);
    state.written = end;
    state.next_index += 1;
    Ok(())
}

fn warn_if_short(binary: &Binary, state: &OpenBinary) {
    if !state.is_complete() {
        warn!(
            name = binary.name(),
            written = state.written,
            size = state.size,
            "binary ends before its address range is filled, rest left zeroed"
        );
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ct2::chunk::{MAGIC, encode_data_block};
    use crate::test_utils::{push_chunk, sample_binary};
    use pretty_assertions::assert_eq;

    fn header_block(name: &str, count: u8, initial: u16, end: u16) -> Vec<u8> {
        let address = AddressRecord {
            initial_addr: initial,
            end_addr: end,
        };
        encode_data_block(&BlockHeader::new(name, count, 0), &address.to_bytes())
    }

    #[test]
    fn test_round_trip_single() {
        let binary = Binary::new("TEST", 0x2000, vec![0x01, 0x02, 0x03, 0x04]).unwrap();
        let file = ContainerFile::parse(&binary.to_container().unwrap()).unwrap();
        assert_eq!(file.binaries(), &[binary]);
    }

    #[test]
    fn test_round_trip_multiple() {
        let original = ContainerFile::from(vec![
            sample_binary("ONE", 0x0800, 10),
            sample_binary("TWO", 0x1000, 256),
            sample_binary("THREE", 0x4000, 1025),
        ]);
        let parsed = ContainerFile::parse(&original.build().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_round_trip_full_address_space() {
        // 256 data blocks: the last one carries index 0 after wrapping
        let binary = sample_binary("BIG", 0, 65536);
        let parsed = ContainerFile::parse(&binary.to_container().unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.binaries()[0], binary);
    }

    #[test]
    fn test_wrapped_short_last_block() {
        // 255 full blocks plus a 4-byte block 256, shaped like a header block
        let binary = sample_binary("EDGE", 0, 255 * 256 + 4);
        let parsed = ContainerFile::parse(&binary.to_container().unwrap()).unwrap();
        assert_eq!(parsed.binaries(), &[binary]);
    }

    #[test]
    fn test_long_name_truncated_on_decode() {
        let binary = Binary::new("LONGNAME", 0x0300, vec![0xEA]).unwrap();
        let parsed = ContainerFile::parse(&binary.to_container().unwrap()).unwrap();
        assert_eq!(parsed.binaries()[0].name(), "LONGNA");
    }

    #[test]
    fn test_invalid_magic() {
        let result = ContainerFile::parse(b"CA\0\0CB\0\0");
        assert!(matches!(result, Err(Ct2Error::InvalidMagic(_))));
    }

    #[test]
    fn test_magic_only_is_empty() {
        let file = ContainerFile::parse(&MAGIC).unwrap();
        assert!(file.is_empty());
    }

    #[test]
    fn test_truncated_chunk() {
        let mut data = sample_binary("CUT", 0x2000, 100).to_container().unwrap();
        data.truncate(data.len() - 5);
        let result = ContainerFile::parse(&data);
        assert!(matches!(result, Err(Ct2Error::TruncatedContainer { .. })));
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut data = Binary::new("SUM", 0x2000, vec![1, 2, 3, 4])
            .unwrap()
            .to_container()
            .unwrap();
        // Corrupt the first payload byte of block 1
        data[41] ^= 0xFF;

        let result = ContainerFile::parse(&data);
        assert!(matches!(
            result,
            Err(Ct2Error::ChecksumMismatch { block_index: 1, .. })
        ));

        let lenient = Ct2Reader::new().verify_checksums(false).read(&data).unwrap();
        assert_eq!(lenient.binaries()[0].data(), &[0xFE, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_chunk_policies() {
        let mut data = MAGIC.to_vec();
        push_chunk(&mut data, b"CA", &[]);
        push_chunk(&mut data, b"ZZ", &[1, 2, 3]);
        push_chunk(&mut data, b"CB", &[]);
        push_chunk(&mut data, b"DA", &header_block("X", 1, 0x1000, 0x1001));
        push_chunk(
            &mut data,
            b"DA",
            &encode_data_block(&BlockHeader::new("X", 1, 1), &[7, 8]),
        );

        let file = Ct2Reader::new().read(&data).unwrap();
        assert_eq!(file.binaries()[0].data(), &[7, 8]);

        let result = Ct2Reader::new()
            .unknown_chunks(UnknownChunkPolicy::Reject)
            .read(&data);
        assert!(matches!(
            result,
            Err(Ct2Error::UnknownChunk { tag, offset: 8 }) if &tag == b"ZZ"
        ));
    }

    #[test]
    fn test_orphan_block() {
        let mut data = MAGIC.to_vec();
        push_chunk(
            &mut data,
            b"DA",
            &encode_data_block(&BlockHeader::new("X", 1, 1), &[1]),
        );
        assert!(matches!(
            ContainerFile::parse(&data),
            Err(Ct2Error::OrphanBlock { offset: 4 })
        ));
    }

    #[test]
    fn test_block_overflow() {
        let mut data = MAGIC.to_vec();
        push_chunk(&mut data, b"DA", &header_block("X", 1, 0x1000, 0x1001));
        push_chunk(
            &mut data,
            b"DA",
            &encode_data_block(&BlockHeader::new("X", 1, 1), &[1, 2, 3]),
        );
        assert!(matches!(
            ContainerFile::parse(&data),
            Err(Ct2Error::BlockOverflow { size: 2, .. })
        ));
    }

    #[test]
    fn test_inverted_address_range() {
        let mut data = MAGIC.to_vec();
        push_chunk(&mut data, b"DA", &header_block("X", 1, 0x2000, 0x1FFF));
        assert!(matches!(
            ContainerFile::parse(&data),
            Err(Ct2Error::InvalidAddressRange {
                initial: 0x2000,
                end: 0x1FFF
            })
        ));
    }

    #[test]
    fn test_data_chunk_too_short() {
        let mut data = MAGIC.to_vec();
        push_chunk(&mut data, b"DA", &[0xC1; 5]);
        assert!(matches!(
            ContainerFile::parse(&data),
            Err(Ct2Error::MalformedChunk { offset: 4, length: 5 })
        ));
    }

    #[test]
    fn test_short_binary_zero_filled() {
        let mut data = MAGIC.to_vec();
        push_chunk(&mut data, b"DA", &header_block("PART", 1, 0x1000, 0x1003));
        push_chunk(
            &mut data,
            b"DA",
            &encode_data_block(&BlockHeader::new("PART", 1, 1), &[9, 9]),
        );
        let file = ContainerFile::parse(&data).unwrap();
        assert_eq!(file.binaries()[0].data(), &[9, 9, 0, 0]);
    }

    #[test]
    fn test_header_block_without_sync_markers() {
        let mut data = MAGIC.to_vec();
        push_chunk(&mut data, b"DA", &header_block("RAW", 1, 0x0C00, 0x0C02));
        push_chunk(
            &mut data,
            b"DA",
            &encode_data_block(&BlockHeader::new("RAW", 1, 1), &[4, 5, 6]),
        );
        let file = ContainerFile::parse(&data).unwrap();
        let binary = &file.binaries()[0];
        assert_eq!(binary.name(), "RAW");
        assert_eq!(binary.initial_addr(), 0x0C00);
        assert_eq!(binary.data(), &[4, 5, 6]);
    }
}
