//! Test utilities shared by the container test modules

use crate::TapeFormat;
use crate::ct2::Binary;

/// Binary with a recognizable byte pattern
pub fn sample_binary(name: &str, initial_addr: u16, size: usize) -> Binary {
    let data = (0..size).map(|i| (i * 7 + 3) as u8).collect();
    Binary::new(name, initial_addr, data).expect("sample binary fits the address space")
}

/// Append a raw chunk (tag, little-endian length, body)
pub fn push_chunk(out: &mut Vec<u8>, tag: &[u8; 2], body: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(body.len() as u16).to_le_bytes());
    out.extend_from_slice(body);
}

/// Test round-trip with existing binary data
///
/// Verifies that binary data can be parsed, rebuilt, and reparsed
/// to produce equivalent results.
pub fn test_round_trip_with_data<T>(data: &[u8]) -> Result<(), Box<dyn std::error::Error>>
where
    T: TapeFormat + PartialEq + std::fmt::Debug,
{
    let parsed = T::parse(data)?;
    let rebuilt = parsed.build()?;
    let reparsed = T::parse(&rebuilt)?;

    if parsed != reparsed {
        return Err(format!(
            "Round-trip with data failed:\nParsed: {:?}\nReparsed: {:?}",
            parsed, reparsed
        )
        .into());
    }

    Ok(())
}
