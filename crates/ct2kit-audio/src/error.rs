//! Audio error types

use std::fmt;

use ct2kit_formats::ct2::Ct2Error;
use thiserror::Error;

use crate::config::BitDepth;

/// Errors raised while rendering tones or writing samples
#[derive(Debug, Error)]
pub enum AudioError {
    /// Frequency is zero or too high for the sample rate
    #[error("invalid tone frequency {0} Hz")]
    InvalidFrequency(u32),

    /// Volume outside `[0, 1]`
    #[error("invalid volume {0}, expected a value in [0, 1]")]
    InvalidVolume(f64),

    /// Zero sample rate
    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(u32),

    /// Bits per sample other than 8 or 16
    #[error("unsupported bit depth {0}, expected 8 or 16")]
    UnsupportedBitDepth(u16),

    /// Samples of one depth written where another was expected
    #[error("sample format mismatch: expected {expected}, got {actual}")]
    FormatMismatch {
        /// Depth of the destination
        expected: BitDepth,
        /// Depth of the samples
        actual: BitDepth,
    },

    /// WAV encoder failure
    #[error("WAV write failed: {0}")]
    WriteFailure(#[from] hound::Error),

    /// Sink already finalized
    #[error("audio sink already finalized")]
    SinkClosed,

    /// Container decoding failure
    #[error("container error: {0}")]
    Container(#[from] Ct2Error),

    /// One or more tape steps failed; every step was still attempted
    #[error("{} tape step(s) failed: {}", .0.len(), StepList(.0))]
    Steps(Vec<StepFailure>),
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Segment of the tape signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapeStep {
    /// Silence before the first tone
    LeadingSilence,
    /// Long leader tone
    Leader,
    /// Marker and sync tone before a block
    Sync {
        /// Block index the marker precedes
        block_index: usize,
    },
    /// Modulated block bytes
    Block {
        /// Block index (0 is the header block)
        block_index: usize,
    },
    /// Closing low-frequency tone
    Trailer,
    /// Silence after the trailer
    TrailingSilence,
    /// Chunk of a container being replayed
    Chunk {
        /// Offset of the chunk header
        offset: usize,
    },
    /// Sink finalization
    Finalize,
}

impl fmt::Display for TapeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeadingSilence => f.write_str("leading silence"),
            Self::Leader => f.write_str("leader"),
            Self::Sync { block_index } => write!(f, "sync before block {block_index}"),
            Self::Block { block_index } => write!(f, "block {block_index}"),
            Self::Trailer => f.write_str("trailer"),
            Self::TrailingSilence => f.write_str("trailing silence"),
            Self::Chunk { offset } => write!(f, "chunk at offset {offset}"),
            Self::Finalize => f.write_str("finalize"),
        }
    }
}

/// A failed tape step and its cause
#[derive(Debug)]
pub struct StepFailure {
    /// Step that failed
    pub step: TapeStep,
    /// Cause
    pub error: AudioError,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.error)
    }
}

struct StepList<'a>(&'a [StepFailure]);

impl fmt::Display for StepList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
