//! Tone configuration

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AudioError, AudioResult};

/// Shape of one tone cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    /// Two-level square wave
    Square,
    /// One sine period per cycle
    #[default]
    Sine,
}

/// Bits per PCM sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    /// Unsigned 8-bit, centred on 128
    #[default]
    Eight,
    /// Signed 16-bit, centred on 0
    Sixteen,
}

impl BitDepth {
    /// Bits per sample
    pub const fn bits(self) -> u16 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }

    /// Bytes per sample
    pub const fn bytes(self) -> usize {
        match self {
            Self::Eight => 1,
            Self::Sixteen => 2,
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = AudioError;

    fn try_from(bits: u16) -> AudioResult<Self> {
        match bits {
            8 => Ok(Self::Eight),
            16 => Ok(Self::Sixteen),
            other => Err(AudioError::UnsupportedBitDepth(other)),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Modulation settings shared by every tone of a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Cycle shape
    pub waveform: Waveform,
    /// Samples per second
    pub sample_rate: u32,
    /// Bits per sample
    pub bits: BitDepth,
    /// Amplitude scale in `[0, 1]`
    pub volume: f64,
    /// Invert the signal polarity
    pub invert: bool,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            sample_rate: 44_100,
            bits: BitDepth::Eight,
            volume: 1.0,
            invert: false,
        }
    }
}

impl ToneConfig {
    /// Create a validated configuration
    pub fn new(
        waveform: Waveform,
        sample_rate: u32,
        bits: BitDepth,
        volume: f64,
        invert: bool,
    ) -> AudioResult<Self> {
        let config = Self {
            waveform,
            sample_rate,
            bits,
            volume,
            invert,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the sample rate and volume
    ///
    /// Deserialized configurations bypass [`ToneConfig::new`], so encoders
    /// call this again on construction.
    pub fn validate(&self) -> AudioResult<()> {
        if self.sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate(self.sample_rate));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(AudioError::InvalidVolume(self.volume));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ToneConfig::default();
        assert_eq!(config.waveform, Waveform::Sine);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.bits, BitDepth::Eight);
        assert!((config.volume - 1.0).abs() < f64::EPSILON);
        assert!(!config.invert);
        config.validate().unwrap();
    }

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            ToneConfig::new(Waveform::Square, 0, BitDepth::Eight, 1.0, false),
            Err(AudioError::InvalidSampleRate(0))
        ));
        assert!(matches!(
            ToneConfig::new(Waveform::Square, 22_050, BitDepth::Eight, 1.5, false),
            Err(AudioError::InvalidVolume(_))
        ));
        assert!(matches!(
            ToneConfig::new(Waveform::Square, 22_050, BitDepth::Eight, f64::NAN, false),
            Err(AudioError::InvalidVolume(_))
        ));
        let config =
            ToneConfig::new(Waveform::Square, 22_050, BitDepth::Sixteen, 0.5, true).unwrap();
        assert_eq!(config.bits.bits(), 16);
    }

    #[test]
    fn test_bit_depth_conversion() {
        assert_eq!(BitDepth::try_from(8).unwrap(), BitDepth::Eight);
        assert_eq!(BitDepth::try_from(16).unwrap(), BitDepth::Sixteen);
        assert!(matches!(
            BitDepth::try_from(24),
            Err(AudioError::UnsupportedBitDepth(24))
        ));
        assert_eq!(BitDepth::Sixteen.to_string(), "16-bit");
    }

    #[test]
    fn test_serde_round_trip() {
        let config = ToneConfig {
            waveform: Waveform::Square,
            sample_rate: 48_000,
            bits: BitDepth::Sixteen,
            volume: 0.75,
            invert: true,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"waveform\":\"square\""));
        assert!(json.contains("\"bits\":16"));
        let back: ToneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_serde_partial_and_invalid() {
        let config: ToneConfig = serde_json::from_str(r#"{"sample_rate": 22050}"#).unwrap();
        assert_eq!(config.sample_rate, 22_050);
        assert_eq!(config.waveform, Waveform::Sine);

        assert!(serde_json::from_str::<ToneConfig>(r#"{"bits": 12}"#).is_err());
    }
}
