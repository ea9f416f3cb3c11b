//! Per-sample effect processing.
//!
//! Effects reinterpret a channel's pitch and volume from the elapsed
//! fraction of the current note, `progress = 1 - tick_counter / speed`.
//! Progress moves in whole-tick steps; the vibrato phase is the only state
//! advanced per sample.

use core::f32::consts::TAU;

use chirp_ir::Effect;

use crate::channel::ChannelState;
use crate::frequency::NATIVE_SAMPLE_RATE;

/// Vibrato rate, in Hz.
pub const VIBRATO_RATE: f32 = 15.0;
/// Vibrato depth, in semitones.
pub const VIBRATO_DEPTH: f32 = 0.25;

/// Pitch (in fractional semitones) and volume (0–7) to synthesize with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved {
    pub pitch: f32,
    pub volume: f32,
}

/// Elapsed fraction of the current note, in `[0, 1)`.
pub fn progress(state: &ChannelState) -> f32 {
    let speed = state.speed.max(1) as f32;
    1.0 - state.tick_counter as f32 / speed
}

/// Resolve the pitch and volume of `state` under `effect` for the next
/// output sample.
pub fn resolve(state: &mut ChannelState, effect: Effect) -> Resolved {
    let p = progress(state);
    let mut pitch = state.current_pitch_val;
    let mut volume = state.current_vol;

    match effect {
        Effect::None => {}
        Effect::Slide => {
            pitch = state.slide_start_pitch + (state.current_pitch_val - state.slide_start_pitch) * p;
        }
        Effect::Vibrato => {
            pitch += libm::sinf(state.vib_phase) * VIBRATO_DEPTH;
            state.vib_phase += TAU * VIBRATO_RATE / NATIVE_SAMPLE_RATE as f32;
            if state.vib_phase >= TAU {
                state.vib_phase -= TAU;
            }
        }
        Effect::Drop => pitch = state.slide_start_pitch * (1.0 - p),
        Effect::FadeIn => volume *= p,
        Effect::FadeOut => volume *= 1.0 - p,
        Effect::Reserved6 | Effect::Reserved7 => {}
    }

    Resolved { pitch, volume }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: f32, from: f32, speed: u16, tick_counter: u16) -> ChannelState {
        ChannelState {
            current_pitch_val: pitch,
            slide_start_pitch: from,
            current_vol: 6.0,
            speed,
            tick_counter,
            ..ChannelState::new()
        }
    }

    #[test]
    fn progress_starts_at_zero_after_a_row() {
        assert_eq!(progress(&note(0.0, 0.0, 4, 4)), 0.0);
        assert_eq!(progress(&note(0.0, 0.0, 4, 1)), 0.75);
    }

    #[test]
    fn none_and_reserved_leave_note_untouched() {
        for effect in [Effect::None, Effect::Reserved6, Effect::Reserved7] {
            let mut state = note(30.0, 20.0, 4, 2);
            let r = resolve(&mut state, effect);
            assert_eq!(r, Resolved { pitch: 30.0, volume: 6.0 });
        }
    }

    #[test]
    fn slide_is_linear_between_origin_and_target() {
        let mut state = note(36.0, 24.0, 2, 1);
        let r = resolve(&mut state, Effect::Slide);
        assert!((r.pitch - 30.0).abs() < 1e-3);
    }

    #[test]
    fn drop_decays_towards_zero() {
        let mut state = note(24.0, 24.0, 4, 1);
        let r = resolve(&mut state, Effect::Drop);
        assert!((r.pitch - 6.0).abs() < 1e-4);
    }

    #[test]
    fn fades_scale_volume_by_progress() {
        let mut state = note(24.0, 24.0, 4, 3);
        assert!((resolve(&mut state, Effect::FadeIn).volume - 1.5).abs() < 1e-5);
        assert!((resolve(&mut state, Effect::FadeOut).volume - 4.5).abs() < 1e-5);
    }

    #[test]
    fn vibrato_wobbles_within_a_quarter_semitone() {
        let mut state = note(24.0, 24.0, 4, 4);
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for _ in 0..NATIVE_SAMPLE_RATE {
            let r = resolve(&mut state, Effect::Vibrato);
            lo = lo.min(r.pitch);
            hi = hi.max(r.pitch);
            assert!(state.vib_phase >= 0.0 && state.vib_phase < TAU);
        }
        assert!(hi <= 24.25 + 1e-4 && lo >= 23.75 - 1e-4);
        assert!(hi - lo > 0.49);
    }
}
