//! TK2000 tape signal
//!
//! A binary is played as:
//!
//! ```text
//! silence (100 ms)
//! leader   1000 Hz x 1000 cycles
//! for each block (header block first):
//!     marker  720 Hz x 30 cycles
//!     sync    one bit-0 cycle
//!     bytes   MSB first, bit 0 = one 2000 Hz cycle, bit 1 = one 1000 Hz cycle
//! trailer  100 Hz x 2 cycles
//! silence (200 ms)
//! ```
//!
//! Each segment is a [`TapeStep`]. All steps are attempted even after a
//! failure; the failures are returned together as [`AudioError::Steps`].

use ct2kit_formats::ct2::{
    BLOCK_HEADER_SIZE, Binary, ChunkKind, ChunkScanner, ContainerFile, block_count_for,
    encode_data_block,
};
use tracing::{debug, warn};

use crate::config::ToneConfig;
use crate::error::{AudioError, AudioResult, StepFailure, TapeStep};
use crate::sink::{AudioSink, MemorySink};
use crate::tone::{Pcm, ToneEncoder};

/// Frequency of a 0 bit
pub const BIT0_FREQUENCY: u32 = 2000;

/// Frequency of a 1 bit
pub const BIT1_FREQUENCY: u32 = 1000;

/// Leader tone frequency
pub const LEADER_FREQUENCY: u32 = BIT1_FREQUENCY;

/// Leader tone length in cycles
pub const LEADER_CYCLES: u32 = 1000;

/// Block marker frequency
pub const MARKER_FREQUENCY: u32 = 720;

/// Block marker length in cycles
pub const MARKER_CYCLES: u32 = 30;

/// Trailer frequency
pub const TRAILER_FREQUENCY: u32 = 100;

/// Trailer length in cycles
pub const TRAILER_CYCLES: u32 = 2;

/// Silence before the leader
pub const LEADING_SILENCE_MS: u32 = 100;

/// Silence after the trailer
pub const TRAILING_SILENCE_MS: u32 = 200;

/// Duty cycle of every tone
pub const DUTY_CYCLE: f64 = 0.5;

/// One pre-rendered cycle per bit value
#[derive(Debug, Clone)]
struct BitCells {
    zero: Pcm,
    one: Pcm,
}

impl BitCells {
    fn new(tone: &ToneEncoder) -> AudioResult<Self> {
        Ok(Self {
            zero: tone.render_tone(BIT0_FREQUENCY, 1, DUTY_CYCLE)?,
            one: tone.render_tone(BIT1_FREQUENCY, 1, DUTY_CYCLE)?,
        })
    }

    fn modulate(&self, bytes: &[u8]) -> AudioResult<Pcm> {
        let mut pcm = Pcm::new(self.zero.bits());
        for byte in bytes {
            for bit in (0..8).rev() {
                let cell = if (byte >> bit) & 1 == 1 {
                    &self.one
                } else {
                    &self.zero
                };
                pcm.extend(cell)?;
            }
        }
        Ok(pcm)
    }
}

/// Tape encoding session writing to a sink
#[derive(Debug)]
pub struct TapeEncoder<S: AudioSink> {
    tone: ToneEncoder,
    cells: BitCells,
    sink: S,
    failures: Vec<StepFailure>,
}

impl<S: AudioSink> TapeEncoder<S> {
    /// Open a session
    ///
    /// Fails when the configuration is invalid, when the sample rate is too
    /// low to carry a 0 bit, or when the sink expects another bit depth.
    pub fn new(config: ToneConfig, sink: S) -> AudioResult<Self> {
        let tone = ToneEncoder::new(config)?;
        if sink.format() != config.bits {
            return Err(AudioError::FormatMismatch {
                expected: sink.format(),
                actual: config.bits,
            });
        }
        let cells = BitCells::new(&tone)?;
        Ok(Self {
            tone,
            cells,
            sink,
            failures: Vec::new(),
        })
    }

    /// Sink being written
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Play one binary
    pub fn encode_binary(&mut self, binary: &Binary) -> AudioResult<()> {
        self.play_binary(binary);
        self.take_failures()
    }

    /// Play every binary of a container, in order
    pub fn encode_file(&mut self, file: &ContainerFile) -> AudioResult<()> {
        for binary in file {
            self.play_binary(binary);
        }
        self.take_failures()
    }

    /// Play a raw CT2 buffer chunk by chunk
    ///
    /// `CA` chunks become leaders, `CB` chunks marker and sync tones, and
    /// `DA` chunk bodies are modulated as stored. A header block with no
    /// leader since the previous binary gets one inserted. An invalid magic
    /// fails before anything is written.
    pub fn encode_container(&mut self, data: &[u8]) -> AudioResult<()> {
        let mut scanner = ChunkScanner::new(data)?;
        self.silence(TapeStep::LeadingSilence, LEADING_SILENCE_MS);

        let mut leader_played = false;
        // Progress through the current binary. Block 256 of a full binary
        // carries index 0 again and must not open a new one.
        let mut pending_blocks = 0usize;
        let mut next_index = 0usize;
        loop {
            let offset = scanner.position();
            let Some(item) = scanner.next() else {
                break;
            };
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(error) => {
                    self.record(TapeStep::Chunk { offset }, AudioError::Container(error));
                    break;
                }
            };

            match chunk.kind() {
                ChunkKind::Leader => {
                    self.leader();
                    leader_played = true;
                }
                ChunkKind::Sync => {
                    // The leader goes before the marker of the header block
                    let next = scanner.clone().next().and_then(Result::ok);
                    let block_index = next.as_ref().map_or(0, |c| block_index_of(c.body));
                    let wrapped = pending_blocks > 0 && next_index % 256 == 0;
                    let opens_binary = !wrapped && next.is_some_and(|c| c.is_header_block());
                    if opens_binary && !leader_played {
                        self.leader();
                        leader_played = true;
                    }
                    self.sync(block_index);
                }
                ChunkKind::Data => {
                    let wrapped = pending_blocks > 0 && next_index % 256 == 0;
                    if !wrapped && chunk.is_header_block() {
                        if !leader_played {
                            self.leader();
                        }
                        leader_played = false;
                        pending_blocks = announced_blocks(chunk.body);
                        next_index = 1;
                    } else {
                        pending_blocks = pending_blocks.saturating_sub(1);
                        next_index += 1;
                    }
                    self.block(block_index_of(chunk.body), chunk.body);
                }
                ChunkKind::Unknown(tag) => {
                    warn!(?tag, offset, "skipping unknown chunk");
                }
            }
        }

        self.closing();
        self.take_failures()
    }

    /// Finalize the sink and hand it back
    pub fn finish(mut self) -> AudioResult<S> {
        if let Err(error) = self.sink.finalize() {
            return Err(AudioError::Steps(vec![StepFailure {
                step: TapeStep::Finalize,
                error,
            }]));
        }
        Ok(self.sink)
    }

    fn play_binary(&mut self, binary: &Binary) {
        debug!(
            name = binary.name(),
            initial_addr = binary.initial_addr(),
            blocks = binary.block_count(),
            "encoding binary"
        );

        self.silence(TapeStep::LeadingSilence, LEADING_SILENCE_MS);
        self.leader();

        let address = binary.address_record().to_bytes();
        self.sync(0);
        self.block(0, &encode_data_block(&binary.block_header(0), &address));

        for (index, payload) in (1usize..).zip(binary.blocks()) {
            self.sync(index);
            self.block(index, &encode_data_block(&binary.block_header(index), payload));
        }

        self.closing();
    }

    fn leader(&mut self) {
        let pcm = self
            .tone
            .render_tone(LEADER_FREQUENCY, LEADER_CYCLES, DUTY_CYCLE);
        self.emit(TapeStep::Leader, pcm);
    }

    fn sync(&mut self, block_index: usize) {
        let pcm = self
            .tone
            .render_tone(MARKER_FREQUENCY, MARKER_CYCLES, DUTY_CYCLE)
            .and_then(|mut pcm| {
                pcm.extend(&self.cells.zero)?;
                Ok(pcm)
            });
        self.emit(TapeStep::Sync { block_index }, pcm);
    }

    fn block(&mut self, block_index: usize, frame: &[u8]) {
        let pcm = self.cells.modulate(frame);
        self.emit(TapeStep::Block { block_index }, pcm);
    }

    fn closing(&mut self) {
        let pcm = self
            .tone
            .render_tone(TRAILER_FREQUENCY, TRAILER_CYCLES, DUTY_CYCLE);
        self.emit(TapeStep::Trailer, pcm);
        self.silence(TapeStep::TrailingSilence, TRAILING_SILENCE_MS);
    }

    fn silence(&mut self, step: TapeStep, duration_ms: u32) {
        let pcm = self.tone.render_silence(duration_ms);
        self.emit(step, Ok(pcm));
    }

    fn emit(&mut self, step: TapeStep, rendered: AudioResult<Pcm>) {
        if let Err(error) = rendered.and_then(|pcm| self.sink.write_pcm(&pcm)) {
            self.record(step, error);
        }
    }

    fn record(&mut self, step: TapeStep, error: AudioError) {
        warn!(%step, %error, "tape step failed");
        self.failures.push(StepFailure { step, error });
    }

    fn take_failures(&mut self) -> AudioResult<()> {
        let failures = std::mem::take(&mut self.failures);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(AudioError::Steps(failures))
        }
    }
}

fn block_index_of(body: &[u8]) -> usize {
    body.get(BLOCK_HEADER_SIZE - 1).map_or(0, |&index| usize::from(index))
}

/// Data blocks implied by the address record of a header block body
fn announced_blocks(body: &[u8]) -> usize {
    let word = |at: usize| {
        body.get(at..at + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
    };
    match (word(BLOCK_HEADER_SIZE), word(BLOCK_HEADER_SIZE + 2)) {
        (Some(initial), Some(end)) if end >= initial => {
            block_count_for(usize::from(end - initial) + 1)
        }
        _ => 0,
    }
}

/// Render one binary to an in-memory buffer
pub fn encode_binary_to_pcm(config: ToneConfig, binary: &Binary) -> AudioResult<Pcm> {
    let mut encoder = TapeEncoder::new(config, MemorySink::new(config.bits))?;
    encoder.encode_binary(binary)?;
    Ok(encoder.finish()?.into_pcm())
}
