//! Instrument and pattern RAM.

use crate::instrument::{Instrument, Row};
use crate::pattern::PatternEntry;

pub const NUM_CHANNELS: usize = 4;
pub const NUM_INSTRUMENTS: usize = 64;
pub const NUM_PATTERNS: usize = 64;
pub const NUM_ROWS: usize = 32;

/// Bytes per instrument slot.
pub const INSTRUMENT_SIZE: usize = 68;
/// Bytes per pattern (one per channel).
pub const PATTERN_SIZE: usize = NUM_CHANNELS;

pub const INSTRUMENT_RAM_SIZE: usize = NUM_INSTRUMENTS * INSTRUMENT_SIZE;
pub const PATTERN_RAM_SIZE: usize = NUM_PATTERNS * PATTERN_SIZE;
pub const SOUND_RAM_SIZE: usize = INSTRUMENT_RAM_SIZE + PATTERN_RAM_SIZE;

/// Borrowed view of the VM's sound memory.
///
/// The engine never owns these bytes; the VM hands a view in on every
/// generate call so it stays free to poke memory between frames.
#[derive(Clone, Copy, Debug)]
pub struct SoundMemory<'a> {
    pub instruments: &'a [u8; INSTRUMENT_RAM_SIZE],
    pub patterns: &'a [u8; PATTERN_RAM_SIZE],
}

impl<'a> SoundMemory<'a> {
    pub const fn new(
        instruments: &'a [u8; INSTRUMENT_RAM_SIZE],
        patterns: &'a [u8; PATTERN_RAM_SIZE],
    ) -> Self {
        Self {
            instruments,
            patterns,
        }
    }

    /// Instrument slot `index`. Indices wrap modulo 64.
    pub fn instrument(&self, index: usize) -> Instrument<'a> {
        let start = (index % NUM_INSTRUMENTS) * INSTRUMENT_SIZE;
        let ram: &'a [u8; INSTRUMENT_RAM_SIZE] = self.instruments;
        let bytes: &'a [u8; INSTRUMENT_SIZE] = ram[start..start + INSTRUMENT_SIZE]
            .try_into()
            .unwrap_or(&ZERO_INSTRUMENT);
        Instrument::new(bytes)
    }

    /// Pattern `index`. Indices wrap modulo 64.
    pub fn pattern(&self, index: usize) -> PatternEntry {
        let start = (index % NUM_PATTERNS) * PATTERN_SIZE;
        let mut bytes = [0u8; PATTERN_SIZE];
        bytes.copy_from_slice(&self.patterns[start..start + PATTERN_SIZE]);
        PatternEntry::from_bytes(bytes)
    }
}

static ZERO_INSTRUMENT: [u8; INSTRUMENT_SIZE] = [0; INSTRUMENT_SIZE];

/// Owned sound memory, for hosts and tooling that do not embed the engine
/// in a larger VM address space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundRam {
    pub instruments: [u8; INSTRUMENT_RAM_SIZE],
    pub patterns: [u8; PATTERN_RAM_SIZE],
}

impl Default for SoundRam {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundRam {
    /// Zeroed memory: every instrument silent, every pattern pointing at
    /// instrument 0.
    pub const fn new() -> Self {
        Self {
            instruments: [0; INSTRUMENT_RAM_SIZE],
            patterns: [0; PATTERN_RAM_SIZE],
        }
    }

    pub fn view(&self) -> SoundMemory<'_> {
        SoundMemory::new(&self.instruments, &self.patterns)
    }

    /// Write note row `row` of instrument `sfx`.
    pub fn set_row(&mut self, sfx: usize, row: usize, value: Row) {
        let offset = (sfx % NUM_INSTRUMENTS) * INSTRUMENT_SIZE + (row % NUM_ROWS) * 2;
        self.instruments[offset..offset + 2].copy_from_slice(&value.encode());
    }

    /// Write the speed and loop bytes of instrument `sfx`.
    pub fn set_header(&mut self, sfx: usize, speed: u8, loop_start: u8, loop_end: u8) {
        let base = (sfx % NUM_INSTRUMENTS) * INSTRUMENT_SIZE;
        self.instruments[base + 65] = speed;
        self.instruments[base + 66] = loop_start;
        self.instruments[base + 67] = loop_end;
    }

    pub fn set_pattern(&mut self, index: usize, entry: PatternEntry) {
        let offset = (index % NUM_PATTERNS) * PATTERN_SIZE;
        self.patterns[offset..offset + PATTERN_SIZE].copy_from_slice(&entry.to_bytes());
    }

    /// Copy the memory out as one contiguous image: instruments, then
    /// patterns.
    pub fn to_bytes(&self) -> [u8; SOUND_RAM_SIZE] {
        let mut out = [0u8; SOUND_RAM_SIZE];
        out[..INSTRUMENT_RAM_SIZE].copy_from_slice(&self.instruments);
        out[INSTRUMENT_RAM_SIZE..].copy_from_slice(&self.patterns);
        out
    }

    /// Build memory from a contiguous image laid out as `to_bytes` writes it.
    pub fn from_bytes(bytes: &[u8; SOUND_RAM_SIZE]) -> Self {
        let mut ram = Self::new();
        ram.instruments
            .copy_from_slice(&bytes[..INSTRUMENT_RAM_SIZE]);
        ram.patterns.copy_from_slice(&bytes[INSTRUMENT_RAM_SIZE..]);
        ram
    }
}
