//! Chunk framing and block codec

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};

use super::checksum::checksum;
use super::error::{Ct2Error, Ct2Result};
use super::header::{ADDRESS_RECORD_SIZE, BLOCK_HEADER_SIZE, BlockHeader};

/// CT2 magic bytes at offset 0
pub const MAGIC: [u8; 4] = *b"CTK2";

/// Leader tone marker chunk
pub const TAG_LEADER: [u8; 2] = *b"CA";

/// Block sync marker chunk, precedes every DATA chunk written by this crate
pub const TAG_SYNC: [u8; 2] = *b"CB";

/// Data chunk carrying a framed block
pub const TAG_DATA: [u8; 2] = *b"DA";

/// Size of a chunk header in bytes
pub const CHUNK_HEADER_SIZE: usize = 4;

/// DATA chunk length of a header block: block header + address record + checksum
pub const HEADER_BLOCK_LENGTH: usize = BLOCK_HEADER_SIZE + ADDRESS_RECORD_SIZE + 1;

/// Smallest valid DATA chunk length: block header + checksum
pub const MIN_DATA_LENGTH: usize = BLOCK_HEADER_SIZE + 1;

/// Chunk header: 2-byte tag and little-endian length of what follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct ChunkHeader {
    /// Chunk tag
    pub tag: [u8; 2],
    /// Number of bytes following the header
    pub length: u16,
}

/// Kind of chunk, derived from its tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// `CA`: long leader tone
    Leader,
    /// `CB`: marker and sync tone before a block
    Sync,
    /// `DA`: framed data block
    Data,
    /// Any other tag
    Unknown([u8; 2]),
}

impl ChunkHeader {
    /// Create a chunk header
    pub const fn new(tag: [u8; 2], length: u16) -> Self {
        Self { tag, length }
    }

    /// Zero-length marker chunk
    pub const fn marker(tag: [u8; 2]) -> Self {
        Self::new(tag, 0)
    }

    /// Classify the chunk by tag
    pub fn kind(&self) -> ChunkKind {
        match self.tag {
            TAG_LEADER => ChunkKind::Leader,
            TAG_SYNC => ChunkKind::Sync,
            TAG_DATA => ChunkKind::Data,
            other => ChunkKind::Unknown(other),
        }
    }
}

/// A chunk located inside a container buffer
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Offset of the chunk header in the buffer
    pub offset: usize,
    /// Parsed chunk header
    pub header: ChunkHeader,
    /// The `header.length` bytes following the header
    pub body: &'a [u8],
}

impl Chunk<'_> {
    /// Kind of this chunk
    pub fn kind(&self) -> ChunkKind {
        self.header.kind()
    }

    /// Whether this is a DATA chunk shaped like a header block
    pub fn is_header_block(&self) -> bool {
        self.kind() == ChunkKind::Data
            && self.body.len() == HEADER_BLOCK_LENGTH
            && self.body[BLOCK_HEADER_SIZE - 1] == 0
    }
}

/// Forward-only scanner over the chunks of a container buffer
///
/// Checks the magic on construction and bounds-checks every chunk header and
/// declared length. After the first error the scanner yields nothing more.
#[derive(Debug, Clone)]
pub struct ChunkScanner<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> ChunkScanner<'a> {
    /// Start scanning after the magic
    pub fn new(data: &'a [u8]) -> Ct2Result<Self> {
        let magic = data.get(..MAGIC.len()).ok_or(Ct2Error::TruncatedContainer {
            offset: 0,
            needed: MAGIC.len(),
            available: data.len(),
        })?;
        if magic != MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            return Err(Ct2Error::InvalidMagic(found));
        }
        Ok(Self {
            data,
            pos: MAGIC.len(),
            failed: false,
        })
    }

    /// Current scan offset
    pub const fn position(&self) -> usize {
        self.pos
    }

    fn next_chunk(&mut self) -> Ct2Result<Chunk<'a>> {
        let offset = self.pos;
        let available = self.data.len() - offset;
        if available < CHUNK_HEADER_SIZE {
            return Err(Ct2Error::TruncatedContainer {
                offset,
                needed: CHUNK_HEADER_SIZE,
                available,
            });
        }

        let mut cursor = Cursor::new(&self.data[offset..offset + CHUNK_HEADER_SIZE]);
        let header = ChunkHeader::read(&mut cursor)?;

        let body_start = offset + CHUNK_HEADER_SIZE;
        let length = usize::from(header.length);
        if length > self.data.len() - body_start {
            return Err(Ct2Error::TruncatedContainer {
                offset,
                needed: CHUNK_HEADER_SIZE + length,
                available,
            });
        }

        self.pos = body_start + length;
        Ok(Chunk {
            offset,
            header,
            body: &self.data[body_start..self.pos],
        })
    }
}

impl<'a> Iterator for ChunkScanner<'a> {
    type Item = Ct2Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let result = self.next_chunk();
        self.failed = result.is_err();
        Some(result)
    }
}

/// Frame a block: header, payload, then the XOR checksum of both
pub fn encode_data_block(header: &BlockHeader, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(chunk_payload_length(payload));
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(payload);
    out.push(checksum(&out));
    out
}

/// DATA chunk length for a block carrying `payload`
pub fn chunk_payload_length(payload: &[u8]) -> usize {
    BLOCK_HEADER_SIZE + payload.len() + 1
}

/// Write a chunk header to a binrw writer
pub(crate) fn write_chunk_header<W: binrw::io::Write + binrw::io::Seek>(
    writer: &mut W,
    header: ChunkHeader,
) -> Ct2Result<()> {
    header.write(writer)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ct2::checksum::Checksum;
    use crate::test_utils::push_chunk;

    #[test]
    fn test_encode_data_block_layout() {
        let header = BlockHeader::new("TEST", 1, 1);
        let block = encode_data_block(&header, &[0x01, 0x02, 0x03, 0x04]);

        assert_eq!(block.len(), chunk_payload_length(&[0x01, 0x02, 0x03, 0x04]));
        assert_eq!(block.len(), 13);
        assert_eq!(&block[..8], &header.to_bytes());
        assert_eq!(&block[8..12], &[0x01, 0x02, 0x03, 0x04]);
        assert!(Checksum::verify(&block));
    }

    #[test]
    fn test_full_block_checksum_folds_to_zero() {
        let header = BlockHeader::new("GAME", 2, 1);
        let payload: Vec<u8> = (0..=255).collect();
        let block = encode_data_block(&header, &payload);
        assert_eq!(block.len(), 265);
        assert_eq!(block.iter().fold(0xFF, |acc, &b| acc ^ b), 0);
    }

    #[test]
    fn test_chunk_kinds() {
        assert_eq!(ChunkHeader::marker(TAG_LEADER).kind(), ChunkKind::Leader);
        assert_eq!(ChunkHeader::marker(TAG_SYNC).kind(), ChunkKind::Sync);
        assert_eq!(ChunkHeader::new(TAG_DATA, 9).kind(), ChunkKind::Data);
        assert_eq!(
            ChunkHeader::marker(*b"ZZ").kind(),
            ChunkKind::Unknown(*b"ZZ")
        );
    }

    #[test]
    fn test_scanner_walks_chunks() {
        let mut data = MAGIC.to_vec();
        push_chunk(&mut data, b"CA", &[]);
        push_chunk(&mut data, b"CB", &[]);
        push_chunk(&mut data, b"DA", &[1; 9]);
        push_chunk(&mut data, b"XY", &[7, 7]);
        let chunks: Vec<_> = ChunkScanner::new(&data)
            .unwrap()
            .collect::<Ct2Result<_>>()
            .unwrap();

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].offset, 4);
        assert_eq!(chunks[0].kind(), ChunkKind::Leader);
        assert_eq!(chunks[2].body.len(), 9);
        assert_eq!(chunks[3].kind(), ChunkKind::Unknown(*b"XY"));
        assert_eq!(chunks[3].body, &[7, 7]);
    }

    #[test]
    fn test_scanner_rejects_bad_magic() {
        let result = ChunkScanner::new(b"CA\0\0CB\0\0");
        assert!(matches!(result, Err(Ct2Error::InvalidMagic(m)) if &m == b"CA\0\0"));
    }

    #[test]
    fn test_scanner_short_buffer() {
        let result = ChunkScanner::new(b"CT");
        assert!(matches!(
            result,
            Err(Ct2Error::TruncatedContainer { needed: 4, available: 2, .. })
        ));
    }

    #[test]
    fn test_scanner_length_past_end() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(b"DA");
        data.extend_from_slice(&300u16.to_le_bytes());
        data.extend_from_slice(&[0; 10]);

        let mut scanner = ChunkScanner::new(&data).unwrap();
        let err = scanner.next().unwrap().unwrap_err();
        assert!(matches!(
            err,
            Ct2Error::TruncatedContainer {
                offset: 4,
                needed: 304,
                available: 14
            }
        ));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_scanner_partial_header() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(b"DA\x01");

        let mut scanner = ChunkScanner::new(&data).unwrap();
        assert!(matches!(
            scanner.next(),
            Some(Err(Ct2Error::TruncatedContainer { offset: 4, needed: 4, available: 3 }))
        ));
    }

    #[test]
    fn test_header_block_detection() {
        let header = BlockHeader::new("A", 1, 0);
        let block0 = encode_data_block(&header, &[0, 0x20, 0, 0x20]);
        let mut data = MAGIC.to_vec();
        push_chunk(&mut data, b"DA", &block0);
        let chunk = ChunkScanner::new(&data).unwrap().next().unwrap().unwrap();
        assert!(chunk.is_header_block());

        let block1 = encode_data_block(&BlockHeader::new("A", 1, 1), &[9; 4]);
        let mut data = MAGIC.to_vec();
        push_chunk(&mut data, b"DA", &block1);
        let chunk = ChunkScanner::new(&data).unwrap().next().unwrap().unwrap();
        assert!(!chunk.is_header_block());
    }
}
