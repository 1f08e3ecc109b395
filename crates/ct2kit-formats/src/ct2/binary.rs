//! Binary and container data model

use super::error::{Ct2Error, Ct2Result};
use super::header::{AddressRecord, BlockHeader, NAME_LEN, ascii_or_placeholder};

/// Payload bytes carried by one data block
pub const BLOCK_SIZE: usize = 256;

/// Number of data blocks needed for `size` bytes
pub const fn block_count_for(size: usize) -> usize {
    size.div_ceil(BLOCK_SIZE)
}

/// A named program loaded at a fixed address range
///
/// The payload always spans `initial_addr..=end_addr`, so `size()` equals
/// `data().len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    name: String,
    initial_addr: u16,
    end_addr: u16,
    data: Vec<u8>,
}

impl Binary {
    /// Create a binary loaded at `initial_addr`
    ///
    /// The name is normalized the way a block header stores it: truncated to
    /// six characters, non-ASCII characters replaced by `?`, trailing spaces
    /// dropped.
    pub fn new(name: &str, initial_addr: u16, data: Vec<u8>) -> Ct2Result<Self> {
        if data.is_empty() {
            return Err(Ct2Error::EmptyBinary);
        }
        let end = usize::from(initial_addr) + data.len() - 1;
        let end_addr = u16::try_from(end).map_err(|_| Ct2Error::AddressOverflow {
            initial_addr,
            size: data.len(),
        })?;

        Ok(Self {
            name: normalize_name(name),
            initial_addr,
            end_addr,
            data,
        })
    }

    /// Assemble a binary whose payload length already matches the range
    pub(crate) fn from_parts(name: String, address: AddressRecord, data: Vec<u8>) -> Self {
        debug_assert_eq!(address.size(), Some(data.len()));
        Self {
            name,
            initial_addr: address.initial_addr,
            end_addr: address.end_addr,
            data,
        }
    }

    /// Program name (at most six characters)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First load address
    pub const fn initial_addr(&self) -> u16 {
        self.initial_addr
    }

    /// Last load address (inclusive)
    pub const fn end_addr(&self) -> u16 {
        self.end_addr
    }

    /// Payload size, `end_addr - initial_addr + 1`
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of 256-byte data blocks
    pub fn block_count(&self) -> usize {
        block_count_for(self.size())
    }

    /// Payload bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the binary, returning its payload
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Address record stored in block 0
    pub const fn address_record(&self) -> AddressRecord {
        AddressRecord {
            initial_addr: self.initial_addr,
            end_addr: self.end_addr,
        }
    }

    /// Block header for block `block_index`
    ///
    /// The block count and index are stored modulo 256.
    pub fn block_header(&self, block_index: usize) -> BlockHeader {
        BlockHeader::new(
            &self.name,
            self.block_count() as u8,
            block_index as u8,
        )
    }

    /// Payload slices of the data blocks, in order
    pub fn blocks(&self) -> std::slice::Chunks<'_, u8> {
        self.data.chunks(BLOCK_SIZE)
    }

    /// Build a single-binary container
    pub fn to_container(&self) -> Ct2Result<Vec<u8>> {
        super::builder::Ct2Builder::new()
            .add_binary(self.clone())
            .build()
    }
}

fn normalize_name(name: &str) -> String {
    let truncated: String = name
        .chars()
        .take(NAME_LEN)
        .map(|ch| char::from(ascii_or_placeholder(ch)))
        .collect();
    truncated.trim_end_matches(' ').to_string()
}

/// Ordered collection of binaries, in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFile {
    binaries: Vec<Binary>,
}

impl ContainerFile {
    /// Create an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binary
    pub fn push(&mut self, binary: Binary) {
        self.binaries.push(binary);
    }

    /// All binaries, in order
    pub fn binaries(&self) -> &[Binary] {
        &self.binaries
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut Binary> {
        self.binaries.last_mut()
    }

    /// Number of binaries
    pub fn len(&self) -> usize {
        self.binaries.len()
    }

    /// Whether the container holds no binaries
    pub fn is_empty(&self) -> bool {
        self.binaries.is_empty()
    }

    /// Iterate over the binaries
    pub fn iter(&self) -> std::slice::Iter<'_, Binary> {
        self.binaries.iter()
    }

    /// First binary with the given name
    pub fn find(&self, name: &str) -> Option<&Binary> {
        self.binaries.iter().find(|b| b.name == name)
    }

    /// Exact byte size of the serialized container
    pub fn required_size(&self) -> usize {
        super::builder::required_container_size(self.binaries.iter().map(Binary::size))
    }

    /// Parse a container with default reader options
    pub fn parse(data: &[u8]) -> Ct2Result<Self> {
        super::parser::Ct2Reader::new().read(data)
    }

    /// Serialize all binaries into one container
    pub fn build(&self) -> Ct2Result<Vec<u8>> {
        self.binaries
            .iter()
            .cloned()
            .fold(super::builder::Ct2Builder::new(), super::builder::Ct2Builder::add_binary)
            .build()
    }
}

impl From<Vec<Binary>> for ContainerFile {
    fn from(binaries: Vec<Binary>) -> Self {
        Self { binaries }
    }
}

impl IntoIterator for ContainerFile {
    type Item = Binary;
    type IntoIter = std::vec::IntoIter<Binary>;

    fn into_iter(self) -> Self::IntoIter {
        self.binaries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ContainerFile {
    type Item = &'a Binary;
    type IntoIter = std::slice::Iter<'a, Binary>;

    fn into_iter(self) -> Self::IntoIter {
        self.binaries.iter()
    }
}

impl crate::TapeFormat for ContainerFile {
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(super::parser::Ct2Reader::new().read(data)?)
    }

    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        Ok(Self::build(self)?)
    }
}
