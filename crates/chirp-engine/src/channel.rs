//! Channel state for tracker playback.
//!
//! A channel is Idle (`sfx_id == None`) or Active. While Active it walks
//! the 32 rows of one instrument slot, one row every `speed` ticks, and
//! synthesizes the row recorded in `last_note_idx`. A row whose voice is a
//! custom instrument hands synthesis to the embedded `child` state, which
//! replays another slot at a rate derived from the parent's pitch.

use chirp_ir::{Effect, Instrument, Row, SoundMemory, Voice, Waveform, NUM_ROWS};

use crate::effects::{self, Resolved};
use crate::frequency::{freq_to_increment, note_to_freq, C2_FREQUENCY, NATIVE_SAMPLE_RATE, SAMPLES_PER_TICK};
use crate::oscillator::{
    self, lfsr_output, lfsr_step, wrap, LFSR_IDLE_SEED, LFSR_TRIGGER_SEED, PHASER_RATE,
};

/// Synthesis and sequencing state shared by channels and their child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelState {
    /// Instrument slot being played, `None` when idle
    pub sfx_id: Option<u8>,
    /// Oscillator phase in `[0, 1)`
    pub phi: f32,
    /// Phaser LFO phase in `[0, 1)`
    pub lfo_phi: f32,
    /// 15-bit noise shift register
    pub lfsr: u16,
    /// Noise output latched at the last phase wrap
    pub noise_sample: f32,

    // Effect processing
    /// Volume of the current row (0–7)
    pub current_vol: f32,
    /// Pitch of the current row, or slide target
    pub current_pitch_val: f32,
    /// Slide origin; also the drop start pitch
    pub slide_start_pitch: f32,
    /// Vibrato phase in `[0, 2π)`
    pub vib_phase: f32,

    // Sequencing
    /// Next row to decode
    pub row: u8,
    /// Row currently being rendered
    pub last_note_idx: u8,
    /// Fractional row position; only the child advances by it
    pub row_phase: f32,
    /// Ticks left before the next row
    pub tick_counter: u16,
    /// Ticks per row (≥ 1)
    pub speed: u16,
    pub loop_start: u8,
    pub loop_end: u8,
    pub loop_active: bool,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelState {
    /// Create an idle state.
    pub const fn new() -> Self {
        Self {
            sfx_id: None,
            phi: 0.0,
            lfo_phi: 0.0,
            lfsr: LFSR_IDLE_SEED,
            noise_sample: 1.0,
            current_vol: 0.0,
            current_pitch_val: 0.0,
            slide_start_pitch: 0.0,
            vib_phase: 0.0,
            row: 0,
            last_note_idx: 0,
            row_phase: 0.0,
            tick_counter: 0,
            speed: 1,
            loop_start: 0,
            loop_end: 0,
            loop_active: false,
        }
    }

    /// Fresh playback state for instrument `sfx`, starting at `row`.
    fn triggered(sfx: u8, row: u8) -> Self {
        Self {
            sfx_id: Some(sfx),
            lfsr: LFSR_TRIGGER_SEED,
            noise_sample: lfsr_output(LFSR_TRIGGER_SEED),
            row,
            last_note_idx: row,
            ..Self::new()
        }
    }

    pub fn is_active(&self) -> bool {
        self.sfx_id.is_some()
    }

    /// Produce one oscillator sample at `freq` Hz and advance the phase.
    /// Noise clocks its LFSR once per wrap of the phase.
    pub fn oscillate(&mut self, waveform: Waveform, freq: f32) -> f32 {
        let out = oscillator::evaluate(waveform, self.phi, self.lfo_phi, self.noise_sample);

        let next = self.phi + freq_to_increment(freq);
        if next >= 1.0 {
            self.phi = wrap(next);
            if waveform == Waveform::Noise {
                self.lfsr = lfsr_step(self.lfsr);
                self.noise_sample = lfsr_output(self.lfsr);
            }
        } else {
            self.phi = next;
        }

        if waveform == Waveform::Phaser {
            self.lfo_phi = wrap(self.lfo_phi + PHASER_RATE / NATIVE_SAMPLE_RATE as f32);
        }

        out
    }
}

/// One of the four playback channels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Channel {
    pub state: ChannelState,
    /// Resampled instrument state, used while a row selects a custom voice
    pub child: ChannelState,
    /// Started by the music sequencer rather than a direct trigger
    pub is_music: bool,
    /// Effect of the row being rendered
    pub effect: Effect,
}

impl Channel {
    pub const fn new() -> Self {
        Self {
            state: ChannelState::new(),
            child: ChannelState::new(),
            is_music: false,
            effect: Effect::None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Start instrument `sfx` at `row`. The first row is decoded on the
    /// next tick.
    pub fn trigger(&mut self, instrument: Instrument<'_>, sfx: u8, row: u8) {
        self.state = ChannelState {
            speed: instrument.speed(),
            loop_start: instrument.loop_start(),
            loop_end: instrument.loop_end(),
            loop_active: instrument.has_loop(),
            tick_counter: 1,
            ..ChannelState::triggered(sfx, row.min(NUM_ROWS as u8 - 1))
        };
        self.child = ChannelState::new();
        self.effect = Effect::None;
    }

    /// Return to Idle. Synthesis state is kept for inspection.
    pub fn stop(&mut self) {
        self.state.sfx_id = None;
        self.child.sfx_id = None;
        self.is_music = false;
    }

    /// Advance the row scheduler by one tick.
    pub fn tick(&mut self, mem: &SoundMemory<'_>) {
        let Some(sfx) = self.state.sfx_id else {
            return;
        };

        self.state.tick_counter = self.state.tick_counter.saturating_sub(1);
        if self.state.tick_counter > 0 {
            return;
        }

        if self.state.row as usize >= NUM_ROWS {
            self.stop();
            return;
        }

        self.state.tick_counter = self.state.speed;
        let row = mem.instrument(sfx as usize).row(self.state.row as usize);
        self.apply_row(row);
        self.state.last_note_idx = self.state.row;

        self.state.row += 1;
        let loop_end = self.state.loop_end.min(NUM_ROWS as u8);
        if self.state.loop_active && self.state.row >= loop_end {
            self.state.row = self.state.loop_start;
        }
    }

    /// Load pitch, volume and effect from a freshly decoded row.
    fn apply_row(&mut self, row: Row) {
        let pitch = row.pitch as f32;
        self.effect = row.effect;
        self.state.current_vol = row.volume as f32;

        if row.volume > 0 && row.effect == Effect::Slide {
            self.state.slide_start_pitch = self.state.current_pitch_val;
        } else {
            self.state.slide_start_pitch = pitch;
        }
        self.state.current_pitch_val = pitch;

        match row.voice {
            Voice::Custom(slot) => self.enter_custom(slot),
            Voice::Builtin(_) => self.child.sfx_id = None,
        }
    }

    /// Start the child on `slot` unless it is already playing it.
    fn enter_custom(&mut self, slot: u8) {
        if self.child.sfx_id != Some(slot) {
            self.child = ChannelState::triggered(slot, 0);
        }
    }

    /// Pitch and volume of the next sample after effects.
    pub fn resolve(&mut self) -> Resolved {
        effects::resolve(&mut self.state, self.effect)
    }

    /// Render one sample, scaled by the row volume but not by any bus.
    pub fn render(&mut self, mem: &SoundMemory<'_>) -> f32 {
        let Some(sfx) = self.state.sfx_id else {
            return 0.0;
        };

        let voice = mem
            .instrument(sfx as usize)
            .row(self.state.last_note_idx as usize)
            .voice;
        let Resolved { pitch, volume } = self.resolve();
        let freq = note_to_freq(pitch);

        let sample = match voice {
            Voice::Builtin(waveform) => self.state.oscillate(waveform, freq),
            Voice::Custom(slot) => self.render_child(mem, slot, freq),
        };

        sample * volume / 7.0
    }

    /// Replay instrument `slot` through the child, resampled so that one
    /// child row lasts one tick at C2 and shortens as the parent rises.
    pub(crate) fn render_child(&mut self, mem: &SoundMemory<'_>, slot: u8, parent_freq: f32) -> f32 {
        self.enter_custom(slot);

        let ratio = parent_freq / C2_FREQUENCY;
        let child = &mut self.child;
        let row = mem.instrument(slot as usize).row(child.row as usize);
        child.last_note_idx = child.row;
        child.current_pitch_val = row.pitch as f32;
        child.current_vol = row.volume as f32;

        let sample = match row.voice {
            Voice::Builtin(waveform) => {
                let freq = note_to_freq(row.pitch as f32) * ratio;
                child.oscillate(waveform, freq) * row.volume as f32 / 7.0
            }
            // Custom voices do not nest
            Voice::Custom(_) => 0.0,
        };

        child.row_phase += ratio / SAMPLES_PER_TICK as f32;
        if child.row_phase >= 1.0 {
            let rows = libm::floorf(child.row_phase);
            child.row_phase -= rows;
            child.row = ((child.row as u32 + rows as u32) % NUM_ROWS as u32) as u8;
        }

        sample
    }
}
