//! Sound memory model for the chirp audio engine.
//!
//! The console's VM owns two fixed-layout byte regions: instrument RAM
//! (64 slots of 68 bytes) and pattern RAM (64 patterns of 4 bytes). This
//! crate decodes and encodes them bit-exactly. The playback engine only
//! ever reads memory through these types.

#![cfg_attr(not(feature = "std"), no_std)]

mod effects;
mod instrument;
mod memory;
mod pattern;

pub use effects::Effect;
pub use instrument::{Instrument, Row, Voice, Waveform};
pub use memory::{
    SoundMemory, SoundRam, INSTRUMENT_RAM_SIZE, INSTRUMENT_SIZE, NUM_CHANNELS, NUM_INSTRUMENTS,
    NUM_PATTERNS, NUM_ROWS, PATTERN_RAM_SIZE, PATTERN_SIZE, SOUND_RAM_SIZE,
};
pub use pattern::{PatternEntry, PatternSlot};
