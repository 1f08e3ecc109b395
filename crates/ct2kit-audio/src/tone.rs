//! Tone and silence rendering
//!
//! A tone is a whole number of identical cycles. The cycle length in samples
//! is `sample_rate / frequency` with integer division, so every cycle of a
//! given frequency has exactly the same length and a rendered tone of `n`
//! cycles is exactly `n * cycle_len` samples long.

use std::f64::consts::TAU;

use crate::config::{BitDepth, ToneConfig, Waveform};
use crate::error::{AudioError, AudioResult};

/// Centre level of unsigned 8-bit PCM
const CENTER_U8: f64 = 128.0;

/// Peak amplitude of 8-bit PCM at full volume
const PEAK_U8: f64 = 127.0;

/// Peak amplitude of 16-bit PCM at full volume
const PEAK_I16: f64 = 32767.0;

/// Mono PCM samples of one bit depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pcm {
    /// Unsigned 8-bit samples, centred on 128
    U8(Vec<u8>),
    /// Signed 16-bit samples, centred on 0
    I16(Vec<i16>),
}

impl Pcm {
    /// Empty buffer of the given depth
    pub const fn new(bits: BitDepth) -> Self {
        match bits {
            BitDepth::Eight => Self::U8(Vec::new()),
            BitDepth::Sixteen => Self::I16(Vec::new()),
        }
    }

    /// Depth of the samples
    pub const fn bits(&self) -> BitDepth {
        match self {
            Self::U8(_) => BitDepth::Eight,
            Self::I16(_) => BitDepth::Sixteen,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        match self {
            Self::U8(samples) => samples.len(),
            Self::I16(samples) => samples.len(),
        }
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the samples in bytes
    pub fn byte_len(&self) -> usize {
        self.len() * self.bits().bytes()
    }

    /// 8-bit samples, if this is an 8-bit buffer
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            Self::U8(samples) => Some(samples),
            Self::I16(_) => None,
        }
    }

    /// 16-bit samples, if this is a 16-bit buffer
    pub fn as_i16(&self) -> Option<&[i16]> {
        match self {
            Self::I16(samples) => Some(samples),
            Self::U8(_) => None,
        }
    }

    /// Append samples of the same depth
    pub fn extend(&mut self, other: &Self) -> AudioResult<()> {
        match (self, other) {
            (Self::U8(dst), Self::U8(src)) => dst.extend_from_slice(src),
            (Self::I16(dst), Self::I16(src)) => dst.extend_from_slice(src),
            (dst, src) => {
                return Err(AudioError::FormatMismatch {
                    expected: dst.bits(),
                    actual: src.bits(),
                });
            }
        }
        Ok(())
    }

    /// Samples as they appear in a WAV `data` chunk
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Self::U8(samples) => samples.clone(),
            Self::I16(samples) => samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        }
    }

    fn repeat(cycle: Self, count: usize) -> Self {
        match cycle {
            Self::U8(samples) => Self::U8(samples.repeat(count)),
            Self::I16(samples) => Self::I16(samples.repeat(count)),
        }
    }
}

/// Renders tones and silences under a fixed configuration
#[derive(Debug, Clone, Copy)]
pub struct ToneEncoder {
    config: ToneConfig,
}

impl ToneEncoder {
    /// Create an encoder, validating the configuration
    pub fn new(config: ToneConfig) -> AudioResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub const fn config(&self) -> &ToneConfig {
        &self.config
    }

    /// Samples per cycle of `frequency`
    pub fn cycle_length(&self, frequency: u32) -> AudioResult<usize> {
        if frequency == 0 {
            return Err(AudioError::InvalidFrequency(frequency));
        }
        match self.config.sample_rate / frequency {
            0 => Err(AudioError::InvalidFrequency(frequency)),
            len => Ok(len as usize),
        }
    }

    /// Render `cycles` cycles of `frequency`
    ///
    /// `duty_cycle` is the fraction of each square cycle spent at the high
    /// level and is clamped to `[0, 1]`. Sine cycles ignore it.
    pub fn render_tone(&self, frequency: u32, cycles: u32, duty_cycle: f64) -> AudioResult<Pcm> {
        let cycle_len = self.cycle_length(frequency)?;
        let cycle = match self.config.waveform {
            Waveform::Square => self.square_cycle(cycle_len, duty_cycle),
            Waveform::Sine => self.sine_cycle(cycle_len),
        };
        Ok(Pcm::repeat(cycle, cycles as usize))
    }

    /// Render `duration_ms` milliseconds at the centre level
    pub fn render_silence(&self, duration_ms: u32) -> Pcm {
        let count = u64::from(self.config.sample_rate) * u64::from(duration_ms) / 1000;
        let count = count as usize;
        match self.config.bits {
            BitDepth::Eight => Pcm::U8(vec![CENTER_U8 as u8; count]),
            BitDepth::Sixteen => Pcm::I16(vec![0; count]),
        }
    }

    /// Peak offset from the centre, in whole sample steps
    fn amplitude(&self) -> f64 {
        let peak = match self.config.bits {
            BitDepth::Eight => PEAK_U8,
            BitDepth::Sixteen => PEAK_I16,
        };
        (peak * self.config.volume).trunc()
    }

    fn square_cycle(&self, cycle_len: usize, duty_cycle: f64) -> Pcm {
        let duty = if duty_cycle.is_nan() {
            0.0
        } else {
            duty_cycle.clamp(0.0, 1.0)
        };
        let high_len = ((cycle_len as f64 * duty).round() as usize).min(cycle_len);

        let mut amplitude = self.amplitude();
        if self.config.invert {
            amplitude = -amplitude;
        }
        let (high, low) = (amplitude, -amplitude);

        self.cycle_from(cycle_len, |i| if i < high_len { high } else { low })
    }

    fn sine_cycle(&self, cycle_len: usize) -> Pcm {
        let mut amplitude = self.amplitude();
        if self.config.invert {
            amplitude = -amplitude;
        }
        self.cycle_from(cycle_len, |i| {
            amplitude * (TAU * i as f64 / cycle_len as f64).sin()
        })
    }

    /// Build one cycle from signed offsets around the centre level
    fn cycle_from(&self, cycle_len: usize, offset: impl Fn(usize) -> f64) -> Pcm {
        match self.config.bits {
            BitDepth::Eight => Pcm::U8(
                (0..cycle_len)
                    .map(|i| (offset(i) + CENTER_U8) as u8)
                    .collect(),
            ),
            BitDepth::Sixteen => Pcm::I16((0..cycle_len).map(|i| offset(i) as i16).collect()),
        }
    }
}
