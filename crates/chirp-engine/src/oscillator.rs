//! Oscillator bank.
//!
//! Every tonal waveform is a pure function of a phase `t` in `[0, 1)`
//! returning roughly `[-1, 1]`. Noise is the exception: it comes from a
//! 15-bit LFSR that the channel clocks once per oscillator period.

use chirp_ir::Waveform;

/// LFSR seed used for a freshly constructed (idle) channel.
pub const LFSR_IDLE_SEED: u16 = 0x7FFF;
/// LFSR seed loaded on every trigger.
pub const LFSR_TRIGGER_SEED: u16 = 0x5205;

/// Phaser sweep rate, in Hz.
pub const PHASER_RATE: f32 = 2.0;

const TILT_RISE: f32 = 0.875;

pub fn triangle(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t - 1.0
    } else {
        3.0 - 4.0 * t
    }
}

pub fn tilted_saw(t: f32) -> f32 {
    if t < TILT_RISE {
        2.0 * t / TILT_RISE - 1.0
    } else {
        2.0 * (1.0 - t) / (1.0 - TILT_RISE) - 1.0
    }
}

pub fn saw(t: f32) -> f32 {
    2.0 * t - 1.0
}

pub fn square(t: f32) -> f32 {
    if t < 0.5 {
        1.0
    } else {
        -1.0
    }
}

pub fn pulse(t: f32) -> f32 {
    if t < 0.25 {
        1.0
    } else {
        -1.0
    }
}

pub fn organ(t: f32) -> f32 {
    triangle(t) + 0.5 * triangle(wrap(2.0 * t))
}

/// Two triangles whose phase offset follows a slow triangle LFO at `lfo`.
pub fn phaser(t: f32, lfo: f32) -> f32 {
    let offset = 0.5 + 0.5 * triangle(lfo);
    0.5 * (triangle(t) + triangle(wrap(t + offset)))
}

/// Wrap a phase into `[0, 1)`.
pub fn wrap(t: f32) -> f32 {
    t - libm::floorf(t)
}

/// Evaluate a tonal waveform. Noise is not a function of phase and
/// evaluates to the `noise` sample the caller has latched.
pub fn evaluate(waveform: Waveform, t: f32, lfo: f32, noise: f32) -> f32 {
    match waveform {
        Waveform::Triangle => triangle(t),
        Waveform::TiltedSaw => tilted_saw(t),
        Waveform::Saw => saw(t),
        Waveform::Square => square(t),
        Waveform::Pulse => pulse(t),
        Waveform::Organ => organ(t),
        Waveform::Noise => noise,
        Waveform::Phaser => phaser(t, lfo),
    }
}

/// Step a 15-bit Galois LFSR: the tap (bit0 ^ bit1) is shifted into bit 14.
pub fn lfsr_step(lfsr: u16) -> u16 {
    let tap = (lfsr ^ (lfsr >> 1)) & 1;
    ((lfsr >> 1) | (tap << 14)) & 0x7FFF
}

/// The ±1 sample an LFSR state latches.
pub fn lfsr_output(lfsr: u16) -> f32 {
    if lfsr & 1 != 0 {
        1.0
    } else {
        -1.0
    }
}
