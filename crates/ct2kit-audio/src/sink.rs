//! Sample destinations

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::debug;

use crate::config::{BitDepth, ToneConfig};
use crate::error::{AudioError, AudioResult};
use crate::tone::Pcm;

/// Destination for rendered PCM
pub trait AudioSink {
    /// Depth the sink accepts
    fn format(&self) -> BitDepth;

    /// Append samples
    fn write_pcm(&mut self, pcm: &Pcm) -> AudioResult<()>;

    /// Flush and close; later writes fail with [`AudioError::SinkClosed`]
    fn finalize(&mut self) -> AudioResult<()>;

    /// Samples accepted so far
    fn samples_written(&self) -> usize;
}

fn check_format(expected: BitDepth, pcm: &Pcm) -> AudioResult<()> {
    if pcm.bits() == expected {
        Ok(())
    } else {
        Err(AudioError::FormatMismatch {
            expected,
            actual: pcm.bits(),
        })
    }
}

/// Collects samples in memory
#[derive(Debug, Clone)]
pub struct MemorySink {
    pcm: Pcm,
    closed: bool,
}

impl MemorySink {
    /// Empty sink of the given depth
    pub const fn new(bits: BitDepth) -> Self {
        Self {
            pcm: Pcm::new(bits),
            closed: false,
        }
    }

    /// Samples collected so far
    pub const fn pcm(&self) -> &Pcm {
        &self.pcm
    }

    /// Consume the sink, returning its samples
    pub fn into_pcm(self) -> Pcm {
        self.pcm
    }
}

impl AudioSink for MemorySink {
    fn format(&self) -> BitDepth {
        self.pcm.bits()
    }

    fn write_pcm(&mut self, pcm: &Pcm) -> AudioResult<()> {
        if self.closed {
            return Err(AudioError::SinkClosed);
        }
        self.pcm.extend(pcm)
    }

    fn finalize(&mut self) -> AudioResult<()> {
        self.closed = true;
        Ok(())
    }

    fn samples_written(&self) -> usize {
        self.pcm.len()
    }
}

/// Mono PCM WAV writer
///
/// Header lengths are rewritten when the sink is finalized.
pub struct WavSink<W: Write + Seek> {
    writer: Option<WavWriter<W>>,
    bits: BitDepth,
    samples: usize,
}

impl<W: Write + Seek> WavSink<W> {
    /// Start a WAV stream on `inner`
    pub fn new(inner: W, sample_rate: u32, bits: BitDepth) -> AudioResult<Self> {
        let writer = WavWriter::new(inner, wav_spec(sample_rate, bits))?;
        Ok(Self {
            writer: Some(writer),
            bits,
            samples: 0,
        })
    }

    /// Start a WAV stream with the rate and depth of `config`
    pub fn with_config(inner: W, config: &ToneConfig) -> AudioResult<Self> {
        Self::new(inner, config.sample_rate, config.bits)
    }
}

impl WavSink<BufWriter<File>> {
    /// Create a WAV file at `path`
    pub fn create(path: impl AsRef<Path>, config: &ToneConfig) -> AudioResult<Self> {
        let writer = WavWriter::create(path, wav_spec(config.sample_rate, config.bits))?;
        Ok(Self {
            writer: Some(writer),
            bits: config.bits,
            samples: 0,
        })
    }
}

fn wav_spec(sample_rate: u32, bits: BitDepth) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: bits.bits(),
        sample_format: SampleFormat::Int,
    }
}

impl<W: Write + Seek> AudioSink for WavSink<W> {
    fn format(&self) -> BitDepth {
        self.bits
    }

    fn write_pcm(&mut self, pcm: &Pcm) -> AudioResult<()> {
        let writer = self.writer.as_mut().ok_or(AudioError::SinkClosed)?;
        check_format(self.bits, pcm)?;
        match pcm {
            // hound takes signed 8-bit samples and stores them offset by 128
            Pcm::U8(samples) => {
                for &sample in samples {
                    writer.write_sample((i16::from(sample) - 128) as i8)?;
                }
            }
            Pcm::I16(samples) => {
                for &sample in samples {
                    writer.write_sample(sample)?;
                }
            }
        }
        self.samples += pcm.len();
        Ok(())
    }

    fn finalize(&mut self) -> AudioResult<()> {
        if let Some(writer) = self.writer.take() {
            debug!(samples = self.samples, bits = self.bits.bits(), "finalizing WAV");
            writer.finalize()?;
        }
        Ok(())
    }

    fn samples_written(&self) -> usize {
        self.samples
    }
}

impl<W: Write + Seek> std::fmt::Debug for WavSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavSink")
            .field("open", &self.writer.is_some())
            .field("bits", &self.bits)
            .field("samples", &self.samples)
            .finish()
    }
}
