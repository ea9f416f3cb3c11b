//! Music patterns.
//!
//! A pattern is 4 bytes, one per channel:
//! - bits 0–5: instrument index (0–63)
//! - bit 6: empty override (channel is silent for this pattern)
//! - bit 7: per-channel flag. Channel 0 marks a loop start, channel 1 loops
//!   back, channel 2 stops playback. Channel 3's flag is unused.

use crate::memory::NUM_CHANNELS;

const INSTRUMENT_MASK: u8 = 0x3F;
const EMPTY_BIT: u8 = 0x40;
const FLAG_BIT: u8 = 0x80;

/// One channel's byte of a pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatternSlot(pub u8);

impl PatternSlot {
    /// Silent for this pattern.
    pub const EMPTY: Self = Self(EMPTY_BIT);

    pub const fn instrument(index: u8) -> Self {
        Self(index & INSTRUMENT_MASK)
    }

    pub const fn with_flag(self) -> Self {
        Self(self.0 | FLAG_BIT)
    }

    /// The instrument this channel plays, or `None` when silent.
    ///
    /// Read as a 7-bit index, any value of 64 or more is silence, which is
    /// exactly the empty bit being set.
    pub const fn sfx(self) -> Option<u8> {
        let index = self.0 & (INSTRUMENT_MASK | EMPTY_BIT);
        if index > INSTRUMENT_MASK {
            None
        } else {
            Some(index)
        }
    }

    pub const fn flag(self) -> bool {
        self.0 & FLAG_BIT != 0
    }
}

/// A decoded 4-byte pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatternEntry {
    pub slots: [PatternSlot; NUM_CHANNELS],
}

impl PatternEntry {
    pub const fn new(slots: [PatternSlot; NUM_CHANNELS]) -> Self {
        Self { slots }
    }

    pub const fn from_bytes(bytes: [u8; NUM_CHANNELS]) -> Self {
        Self {
            slots: [
                PatternSlot(bytes[0]),
                PatternSlot(bytes[1]),
                PatternSlot(bytes[2]),
                PatternSlot(bytes[3]),
            ],
        }
    }

    pub const fn to_bytes(&self) -> [u8; NUM_CHANNELS] {
        [
            self.slots[0].0,
            self.slots[1].0,
            self.slots[2].0,
            self.slots[3].0,
        ]
    }

    /// Playback returns here when a later pattern loops back.
    pub const fn loop_start(&self) -> bool {
        self.slots[0].flag()
    }

    /// Jump back to the last loop start after this pattern.
    pub const fn loop_back(&self) -> bool {
        self.slots[1].flag()
    }

    /// Stop playback after this pattern.
    pub const fn stop(&self) -> bool {
        self.slots[2].flag()
    }
}
