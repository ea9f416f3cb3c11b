//! Instrument slots and note rows.
//!
//! An instrument slot is 68 bytes:
//!
//! | Bytes | Field |
//! |---|---|
//! | 0–63 | 32 note rows × 2 bytes |
//! | 64 | reserved |
//! | 65 | speed (ticks per row) |
//! | 66 | loop start row |
//! | 67 | loop end row (exclusive) |

use crate::effects::Effect;
use crate::memory::{INSTRUMENT_SIZE, NUM_ROWS};

const SPEED_OFFSET: usize = 65;
const LOOP_START_OFFSET: usize = 66;
const LOOP_END_OFFSET: usize = 67;

/// Built-in oscillator shapes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    #[default]
    Triangle,
    /// Saw with an 87.5% rise and a sharp fall
    TiltedSaw,
    Saw,
    /// 50% duty
    Square,
    /// 25% duty
    Pulse,
    /// Triangle plus a half-amplitude triangle an octave up
    Organ,
    Noise,
    Phaser,
}

impl Waveform {
    pub const fn code(self) -> u8 {
        match self {
            Waveform::Triangle => 0,
            Waveform::TiltedSaw => 1,
            Waveform::Saw => 2,
            Waveform::Square => 3,
            Waveform::Pulse => 4,
            Waveform::Organ => 5,
            Waveform::Noise => 6,
            Waveform::Phaser => 7,
        }
    }
}

/// What a row sounds with: a built-in waveform, or another instrument
/// slot resampled at the note's pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Voice {
    Builtin(Waveform),
    /// Child instrument slot (0–7)
    Custom(u8),
}

impl Default for Voice {
    fn default() -> Self {
        Voice::Builtin(Waveform::Triangle)
    }
}

impl Voice {
    /// Map a waveform code to a voice. Codes 0–7 are built-ins, 8–15 select
    /// custom instrument `code - 8`.
    ///
    /// Row decoding only ever passes 3 bits here, so the custom arm is not
    /// reachable from instrument memory as laid out today.
    pub const fn from_code(code: u8) -> Self {
        match code & 0x0F {
            0 => Voice::Builtin(Waveform::Triangle),
            1 => Voice::Builtin(Waveform::TiltedSaw),
            2 => Voice::Builtin(Waveform::Saw),
            3 => Voice::Builtin(Waveform::Square),
            4 => Voice::Builtin(Waveform::Pulse),
            5 => Voice::Builtin(Waveform::Organ),
            6 => Voice::Builtin(Waveform::Noise),
            7 => Voice::Builtin(Waveform::Phaser),
            n => Voice::Custom(n - 8),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Voice::Builtin(w) => w.code(),
            Voice::Custom(slot) => 8 + (slot & 0x07),
        }
    }
}

/// One decoded note row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Row {
    /// Semitone index above C2 (0–63)
    pub pitch: u8,
    pub voice: Voice,
    /// 0 = silent, 7 = full
    pub volume: u8,
    pub effect: Effect,
}

impl Row {
    pub const fn new(pitch: u8, voice: Voice, volume: u8, effect: Effect) -> Self {
        Self {
            pitch,
            voice,
            volume,
            effect,
        }
    }

    /// Decode a row from its two bytes.
    pub const fn decode(bytes: [u8; 2]) -> Self {
        let [b0, b1] = bytes;
        let effect = (b1 & 0x03) | (((b0 >> 6) & 0x01) << 2);
        Self {
            pitch: b0 & 0x3F,
            voice: Voice::from_code((b1 >> 5) & 0x07),
            volume: (b1 >> 2) & 0x07,
            effect: Effect::from_code(effect),
        }
    }

    /// Encode a row into its two bytes.
    ///
    /// The waveform field is 3 bits wide; a custom voice is truncated to it.
    pub const fn encode(&self) -> [u8; 2] {
        let effect = self.effect.code();
        let b0 = (self.pitch & 0x3F) | (((effect >> 2) & 0x01) << 6);
        let b1 = (effect & 0x03) | ((self.volume & 0x07) << 2) | ((self.voice.code() & 0x07) << 5);
        [b0, b1]
    }

    /// True if this row produces no sound.
    pub const fn is_silent(&self) -> bool {
        self.volume == 0
    }
}

/// Read-only view of one 68-byte instrument slot.
#[derive(Clone, Copy, Debug)]
pub struct Instrument<'a> {
    bytes: &'a [u8; INSTRUMENT_SIZE],
}

impl<'a> Instrument<'a> {
    pub const fn new(bytes: &'a [u8; INSTRUMENT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Decode note row `index`. Indices wrap modulo 32.
    pub fn row(&self, index: usize) -> Row {
        let i = (index % NUM_ROWS) * 2;
        Row::decode([self.bytes[i], self.bytes[i + 1]])
    }

    /// Ticks per row, floored to 1.
    pub fn speed(&self) -> u16 {
        (self.bytes[SPEED_OFFSET] as u16).max(1)
    }

    pub fn loop_start(&self) -> u8 {
        self.bytes[LOOP_START_OFFSET]
    }

    pub fn loop_end(&self) -> u8 {
        self.bytes[LOOP_END_OFFSET]
    }

    /// A loop region is active only when it spans at least one row.
    pub fn has_loop(&self) -> bool {
        self.loop_end() > self.loop_start()
    }

    pub fn bytes(&self) -> &'a [u8; INSTRUMENT_SIZE] {
        self.bytes
    }
}
