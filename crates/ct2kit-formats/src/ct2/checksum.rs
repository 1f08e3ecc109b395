//! XOR block checksum

/// Value the checksum fold starts from
pub const CHECKSUM_SEED: u8 = 0xFF;

/// Running XOR checksum over block bytes
///
/// Folding the stored checksum byte into a checksum of the bytes it covers
/// yields zero, which is how [`Checksum::verify`] checks a framed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksum(u8);

impl Checksum {
    /// Start a new checksum at the seed value
    pub const fn new() -> Self {
        Self(CHECKSUM_SEED)
    }

    /// Fold more bytes into the checksum
    pub fn update(&mut self, data: &[u8]) {
        self.0 = data.iter().fold(self.0, |acc, &b| acc ^ b);
    }

    /// Current checksum value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Check a framed block whose last byte is its checksum
    pub fn verify(framed: &[u8]) -> bool {
        let mut cs = Self::new();
        cs.update(framed);
        cs.value() == 0
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the checksum of a byte slice
pub fn checksum(data: &[u8]) -> u8 {
    let mut cs = Checksum::new();
    cs.update(data);
    cs.value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_seed() {
        assert_eq!(checksum(&[]), CHECKSUM_SEED);
    }

    #[test]
    fn test_known_value() {
        // 0xFF ^ 0x01 ^ 0x02 ^ 0x03 ^ 0x04 = 0xFB
        assert_eq!(checksum(&[0x01, 0x02, 0x03, 0x04]), 0xFB);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let data: Vec<u8> = (0..=255).collect();
        let mut cs = Checksum::new();
        cs.update(&data[..100]);
        cs.update(&data[100..]);
        assert_eq!(cs.value(), checksum(&data));
    }

    #[test]
    fn test_verify_framed() {
        let mut framed = vec![0xC7, 0xC1, 0xCD, 0xC5, 0xA0, 0xA0, 0x01, 0x00];
        framed.push(checksum(&framed));
        assert!(Checksum::verify(&framed));

        framed[3] ^= 0x10;
        assert!(!Checksum::verify(&framed));
    }
}
