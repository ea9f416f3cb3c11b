//! Tracker audio engine for the chirp fantasy console.
//!
//! Four channels play 64 instrument slots out of VM sound memory through
//! an eight-waveform oscillator bank, sequenced by a 120 Hz tick and a
//! pattern-based music scheduler. Synthesis runs at 22050 Hz mono and
//! never touches the heap.

#![cfg_attr(not(feature = "std"), no_std)]

mod channel;
mod config;
mod effects;
pub mod frequency;
mod mixer;
pub mod oscillator;
mod output;
pub mod scheduler;
mod snapshot;

pub use channel::{Channel, ChannelState};
pub use config::{EngineConfig, MAX_VOLUME};
pub use effects::{progress, resolve, Resolved, VIBRATO_DEPTH, VIBRATO_RATE};
pub use frequency::{note_to_freq, FRAME_RATE, NATIVE_SAMPLE_RATE, SAMPLES_PER_TICK};
pub use mixer::{distort, AudioEngine, MUSIC_BUS_GAIN, OUTPUT_GAIN};
pub use output::{AudioSink, FrameAccumulator, StagingBuffer, MAX_BLOCK_SAMPLES};
pub use scheduler::MusicState;
pub use snapshot::AudioStateSnapshot;
