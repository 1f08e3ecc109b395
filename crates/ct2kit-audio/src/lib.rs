//! TK2000 cassette tone modulation for CT2 binaries
//!
#![allow(clippy::cast_possible_truncation)] // Sample values are clamped to their depth
#![allow(clippy::cast_precision_loss)] // Cycle lengths are far below 2^52
#![allow(clippy::cast_sign_loss)] // Offsets are shifted to the unsigned centre first
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // TK2000-specific terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
//! Turns the binaries of a CT2 container into the FSK signal a TK2000 reads
//! from tape: a leader tone, a marker and sync cycle before each block, and
//! every byte sent MSB first as single cycles of 2000 Hz (0) or 1000 Hz (1).
//! Samples go to an [`AudioSink`], either in memory or a mono PCM WAV file.
//!
//! ```no_run
//! use ct2kit_audio::{TapeEncoder, ToneConfig, WavSink};
//! use ct2kit_formats::ct2::ContainerFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = ContainerFile::parse(&std::fs::read("game.ct2")?)?;
//! let config = ToneConfig::default();
//!
//! let mut encoder = TapeEncoder::new(config, WavSink::create("game.wav", &config)?)?;
//! encoder.encode_file(&file)?;
//! encoder.finish()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod sink;
pub mod tape;
pub mod tone;

pub use config::{BitDepth, ToneConfig, Waveform};
pub use error::{AudioError, AudioResult, StepFailure, TapeStep};
pub use sink::{AudioSink, MemorySink, WavSink};
pub use tape::{TapeEncoder, encode_binary_to_pcm};
pub use tone::{Pcm, ToneEncoder};
