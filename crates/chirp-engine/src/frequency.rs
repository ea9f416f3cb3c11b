//! Pitch-to-frequency conversion and engine timing constants.
//!
//! Pitches are semitone indices above C2 on the 12-TET scale. They stay
//! fractional through slides, vibrato and drops, so the conversion works
//! on `f32` rather than integer notes.

/// Output rate of the engine. Rate conversion is the host's job.
pub const NATIVE_SAMPLE_RATE: u32 = 22050;

/// Samples per synthesis tick (~120.49 ticks per second).
pub const SAMPLES_PER_TICK: u32 = 183;

/// Rate at which the VM calls `update`.
pub const FRAME_RATE: u32 = 60;

/// Frequency of note 0 (C2), in Hz.
pub const C2_FREQUENCY: f32 = 65.406;

/// Convert a (possibly fractional) note to Hz: `65.406 × 2^(note/12)`.
pub fn note_to_freq(note: f32) -> f32 {
    C2_FREQUENCY * libm::exp2f(note / 12.0)
}

/// Phase advance per output sample for a frequency in Hz.
pub fn freq_to_increment(freq: f32) -> f32 {
    freq / NATIVE_SAMPLE_RATE as f32
}
