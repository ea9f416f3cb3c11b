//! Main audio engine.

use arrayvec::ArrayVec;
use chirp_ir::{SoundMemory, NUM_CHANNELS, NUM_INSTRUMENTS, NUM_ROWS};
use log::{debug, trace};

use crate::channel::Channel;
use crate::config::{EngineConfig, MAX_VOLUME};
use crate::frequency::SAMPLES_PER_TICK;
use crate::output::{AudioSink, FrameAccumulator, MAX_BLOCK_SAMPLES};
use crate::scheduler::{self, MusicState};
use crate::snapshot::AudioStateSnapshot;

/// Attenuation applied to the music bus on top of the music volume.
pub const MUSIC_BUS_GAIN: f32 = 0.6;
/// Headroom applied to the summed channels before conversion.
pub const OUTPUT_GAIN: f32 = 0.5;

const DISTORTION_DIVISOR: i32 = 0x1000;
const DISTORTION_STEP: i32 = 0x1249;

/// Bit-crush a mix value: quantize its 16-bit form to steps of 0x1000 and
/// rescale each step to 0x1249.
pub fn distort(x: f32) -> f32 {
    let s = (x * 32767.0) as i32;
    ((s / DISTORTION_DIVISOR) * DISTORTION_STEP) as f32 / 32767.0
}

fn to_pcm(x: f32) -> i16 {
    (x.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// The four-channel tracker engine.
///
/// The engine never owns sound memory. Every call that synthesizes or
/// triggers borrows a [`SoundMemory`] view, so edits made by the VM
/// between frames are heard immediately.
#[derive(Clone, Debug)]
pub struct AudioEngine {
    channels: [Channel; NUM_CHANNELS],
    music: MusicState,
    /// Samples since the last tick, in `[0, 183)`
    tick_phase: u32,
    frames: FrameAccumulator,
    config: EngineConfig,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            channels: [Channel::new(); NUM_CHANNELS],
            music: MusicState::new(),
            tick_phase: 0,
            frames: FrameAccumulator::new(),
            config: config.clamped(),
        }
    }

    /// Fill `out` with mono samples at the native rate.
    ///
    /// A tick fires before the first sample whenever the tick phase is
    /// zero. While muted, or with both volumes at zero, `out` is zeroed and
    /// no state advances.
    pub fn generate(&mut self, mem: &SoundMemory<'_>, out: &mut [i16]) {
        if self.config.is_silenced() {
            out.fill(0);
            return;
        }

        for sample in out.iter_mut() {
            if self.tick_phase == 0 {
                scheduler::run_tick(&mut self.music, &mut self.channels, mem);
            }
            self.tick_phase = (self.tick_phase + 1) % SAMPLES_PER_TICK;
            *sample = self.mix_sample(mem);
        }
    }

    /// Sum every active channel through its bus into one output sample.
    fn mix_sample(&mut self, mem: &SoundMemory<'_>) -> i16 {
        let music_gain = MUSIC_BUS_GAIN * self.config.volume_music as f32 / MAX_VOLUME as f32;
        let sfx_gain = self.config.volume_sfx as f32 / MAX_VOLUME as f32;

        let mut mix = 0.0;
        for ch in self.channels.iter_mut().filter(|ch| ch.is_active()) {
            let gain = if ch.is_music { music_gain } else { sfx_gain };
            mix += ch.render(mem) * gain;
        }

        if self.config.distortion {
            mix = distort(mix);
        }
        to_pcm(mix * OUTPUT_GAIN)
    }

    /// Per-frame entry point: synthesize the samples owed for one 60 Hz
    /// frame and hand them to `sink`. Returns the number of samples
    /// produced.
    pub fn update<S: AudioSink + ?Sized>(&mut self, mem: &SoundMemory<'_>, sink: &mut S) -> usize {
        self.update_frames(mem, sink, 1)
    }

    /// Like [`update`](Self::update) for a host that fell behind by
    /// `frames` frames. Output per call is capped at
    /// [`MAX_BLOCK_SAMPLES`]; the excess is produced on later calls.
    pub fn update_frames<S: AudioSink + ?Sized>(
        &mut self,
        mem: &SoundMemory<'_>,
        sink: &mut S,
        frames: u32,
    ) -> usize {
        let count = self.frames.advance(frames);
        if count == 0 {
            return 0;
        }

        let mut block: ArrayVec<i16, MAX_BLOCK_SAMPLES> = ArrayVec::new();
        block.extend(core::iter::repeat(0).take(count));

        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.generate(mem, &mut block));
        #[cfg(not(feature = "alloc_check"))]
        self.generate(mem, &mut block);

        sink.submit(&block);
        count
    }

    /// Start instrument `sfx` at `row`.
    ///
    /// A valid `channel` is taken unconditionally. Otherwise the first idle
    /// channel is used, then the first channel not owned by music, then
    /// channel 3. Returns the channel used, or `None` if `sfx` is out of
    /// range.
    pub fn play_sfx(
        &mut self,
        mem: &SoundMemory<'_>,
        sfx: u8,
        channel: Option<usize>,
        row: u8,
    ) -> Option<usize> {
        if sfx as usize >= NUM_INSTRUMENTS {
            debug!("ignoring play_sfx for out-of-range instrument {}", sfx);
            return None;
        }

        let index = self.select_channel(channel);
        let row = row.min(NUM_ROWS as u8 - 1);

        trace!("sfx {} on channel {} from row {}", sfx, index, row);
        let ch = &mut self.channels[index];
        ch.trigger(mem.instrument(sfx as usize), sfx, row);
        ch.is_music = false;
        Some(index)
    }

    fn select_channel(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|&ch| ch < NUM_CHANNELS)
            .or_else(|| self.channels.iter().position(|ch| !ch.is_active()))
            .or_else(|| self.channels.iter().position(|ch| !ch.is_music))
            .unwrap_or(NUM_CHANNELS - 1)
    }

    /// Silence every channel playing `sfx`.
    pub fn stop_sfx(&mut self, sfx: u8) {
        for ch in self.channels.iter_mut().filter(|ch| ch.state.sfx_id == Some(sfx)) {
            ch.stop();
        }
    }

    /// Silence one channel.
    pub fn stop_channel(&mut self, channel: usize) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.stop();
        }
    }

    /// Silence everything, music included.
    pub fn stop_all(&mut self) {
        self.music.stop(&mut self.channels);
        for ch in self.channels.iter_mut() {
            ch.stop();
        }
    }

    /// Start music at `pattern` on the channels selected by `mask`.
    pub fn play_music(&mut self, pattern: u8, mask: u8) {
        debug!("music from pattern {} with mask {:#06b}", pattern, mask & 0x0F);
        self.music.stop(&mut self.channels);
        self.music.start(pattern, mask);
    }

    pub fn stop_music(&mut self) {
        debug!("music stopped");
        self.music.stop(&mut self.channels);
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn channels(&self) -> &[Channel; NUM_CHANNELS] {
        &self.channels
    }

    pub fn music(&self) -> &MusicState {
        &self.music
    }

    pub fn is_music_playing(&self) -> bool {
        self.music.music_playing
    }

    /// Instrument playing on `channel`, if any.
    pub fn channel_sfx(&self, channel: usize) -> Option<u8> {
        self.channels.get(channel).and_then(|ch| ch.state.sfx_id)
    }

    /// Row currently sounding on `channel`, if it is active.
    pub fn channel_row(&self, channel: usize) -> Option<u8> {
        self.channels
            .get(channel)
            .filter(|ch| ch.is_active())
            .map(|ch| ch.state.last_note_idx)
    }

    pub fn tick_phase(&self) -> u32 {
        self.tick_phase
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config.clamped();
    }

    /// Set both bus volumes, each clamped to 0..=10.
    pub fn set_volumes(&mut self, music: u8, sfx: u8) {
        self.config.volume_music = music.min(MAX_VOLUME);
        self.config.volume_sfx = sfx.min(MAX_VOLUME);
    }

    pub fn set_distortion(&mut self, enabled: bool) {
        self.config.distortion = enabled;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.config.muted = muted;
    }

    /// Capture all playback state. Settings are not included.
    pub fn state(&self) -> AudioStateSnapshot {
        AudioStateSnapshot {
            channels: self.channels,
            music: self.music,
            tick_phase: self.tick_phase,
            frames: self.frames,
        }
    }

    /// Restore playback state captured by [`state`](Self::state).
    pub fn set_state(&mut self, snapshot: &AudioStateSnapshot) {
        self.channels = snapshot.channels;
        self.music = snapshot.music;
        self.tick_phase = snapshot.tick_phase % SAMPLES_PER_TICK;
        self.frames = snapshot.frames;
        debug!("audio state restored at tick phase {}", self.tick_phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirp_ir::{Effect, Row, SoundRam, Voice, Waveform};

    fn square_ram(sfx: usize, volume: u8) -> SoundRam {
        let mut ram = SoundRam::new();
        for i in 0..NUM_ROWS {
            ram.set_row(sfx, i, Row::new(24, Voice::Builtin(Waveform::Square), volume, Effect::None));
        }
        ram.set_header(sfx, 4, 0, 0);
        ram
    }

    #[test]
    fn idle_engine_emits_silence() {
        let ram = SoundRam::new();
        let mut engine = AudioEngine::new();
        let mut out = [1i16; 256];
        engine.generate(&ram.view(), &mut out);
        assert!(out.iter().all(|&s| s == 0));
        assert_eq!(engine.tick_phase(), 256 % SAMPLES_PER_TICK);
    }

    #[test]
    fn first_sample_of_square_is_scaled_through_sfx_bus() {
        let ram = square_ram(0, 7);
        let mut engine = AudioEngine::new();
        engine.play_sfx(&ram.view(), 0, Some(0), 0);
        let mut out = [0i16; 1];
        engine.generate(&ram.view(), &mut out);
        // 1.0 × 7/7 × sfx 10/10 × 0.5
        assert_eq!(out[0], (0.5f32 * 32767.0) as i16);
    }

    #[test]
    fn music_bus_is_attenuated() {
        let mut ram = square_ram(0, 7);
        ram.set_pattern(0, chirp_ir::PatternEntry::from_bytes([0x00, 0x40, 0x40, 0x40]));
        let mut engine = AudioEngine::new();
        engine.play_music(0, 0x0F);

        // The music timer expires on the first tick
        let mut out = [0i16; 1];
        engine.generate(&ram.view(), &mut out);
        assert_eq!(out[0], (0.5f32 * 0.6 * 32767.0) as i16);
        assert!(engine.channel(0).is_some_and(|ch| ch.is_music));
    }

    #[test]
    fn mute_gate_freezes_state() {
        let ram = square_ram(2, 5);
        let mut engine = AudioEngine::new();
        engine.play_sfx(&ram.view(), 2, None, 0);
        engine.set_muted(true);
        let before = engine.state();
        let mut out = [7i16; 500];
        engine.generate(&ram.view(), &mut out);
        assert!(out.iter().all(|&s| s == 0));
        assert_eq!(engine.state(), before);

        engine.set_muted(false);
        engine.set_volumes(0, 0);
        engine.generate(&ram.view(), &mut out);
        assert_eq!(engine.state(), before);
    }

    #[test]
    fn play_sfx_picks_first_idle_channel() {
        let ram = square_ram(1, 5);
        let mem = ram.view();
        let mut engine = AudioEngine::new();
        assert_eq!(engine.play_sfx(&mem, 1, None, 0), Some(0));
        assert_eq!(engine.play_sfx(&mem, 1, None, 0), Some(1));
        assert_eq!(engine.play_sfx(&mem, 1, Some(3), 0), Some(3));
        assert_eq!(engine.play_sfx(&mem, 1, None, 0), Some(2));
        // All busy with SFX: the first non-music channel
        assert_eq!(engine.play_sfx(&mem, 1, None, 0), Some(0));
        // Out-of-range channel falls back the same way
        assert_eq!(engine.play_sfx(&mem, 1, Some(9), 0), Some(0));
    }

    #[test]
    fn play_sfx_avoids_music_channels() {
        let mut ram = square_ram(1, 5);
        ram.set_pattern(0, chirp_ir::PatternEntry::from_bytes([0x01, 0x01, 0x01, 0x40]));
        let mem = ram.view();
        let mut engine = AudioEngine::new();
        engine.play_music(0, 0b0111);
        let mut out = [0i16; 1];
        engine.generate(&mem, &mut out);
        engine.play_sfx(&mem, 1, Some(3), 0);

        // Channels 0-2 play music, 3 plays an SFX
        assert_eq!(engine.play_sfx(&mem, 1, None, 0), Some(3));
        engine.channels[3].is_music = true;
        // Everything owned by music: channel 3 is the last resort
        assert_eq!(engine.play_sfx(&mem, 1, None, 0), Some(3));
    }

    #[test]
    fn play_sfx_out_of_range_is_ignored() {
        let ram = SoundRam::new();
        let mut engine = AudioEngine::new();
        assert_eq!(engine.play_sfx(&ram.view(), 64, None, 0), None);
        assert!(engine.channels().iter().all(|ch| !ch.is_active()));
    }

    #[test]
    fn play_sfx_starts_at_requested_row() {
        let ram = square_ram(1, 5);
        let mut engine = AudioEngine::new();
        engine.play_sfx(&ram.view(), 1, Some(0), 10);
        let mut out = [0i16; 1];
        engine.generate(&ram.view(), &mut out);
        assert_eq!(engine.channel_row(0), Some(10));
    }

    #[test]
    fn stop_sfx_only_stops_matching_channels() {
        let mut ram = square_ram(1, 5);
        ram.set_header(2, 1, 0, 0);
        let mem = ram.view();
        let mut engine = AudioEngine::new();
        engine.play_sfx(&mem, 1, Some(0), 0);
        engine.play_sfx(&mem, 2, Some(1), 0);
        engine.play_sfx(&mem, 1, Some(2), 0);
        engine.stop_sfx(1);
        assert_eq!(engine.channel_sfx(0), None);
        assert_eq!(engine.channel_sfx(1), Some(2));
        assert_eq!(engine.channel_sfx(2), None);

        engine.stop_channel(1);
        assert_eq!(engine.channel_sfx(1), None);
        engine.play_sfx(&mem, 2, Some(1), 0);

        engine.stop_all();
        assert!(engine.channels().iter().all(|ch| !ch.is_active()));
    }

    #[test]
    fn volumes_are_clamped() {
        let mut engine = AudioEngine::new();
        engine.set_volumes(42, 3);
        assert_eq!(engine.config().volume_music, 10);
        assert_eq!(engine.config().volume_sfx, 3);
    }

    #[test]
    fn update_submits_frame_sized_blocks() {
        let ram = square_ram(0, 5);
        let mut engine = AudioEngine::new();
        engine.play_sfx(&ram.view(), 0, None, 0);

        let mut total = 0usize;
        let mut calls = 0usize;
        let mut sink = |block: &[i16]| {
            total += block.len();
            calls += 1;
        };
        for _ in 0..60 {
            engine.update(&ram.view(), &mut sink);
        }
        assert_eq!(calls, 60);
        assert_eq!(total, 22050);
    }

    #[test]
    fn update_frames_caps_block_size() {
        let ram = SoundRam::new();
        let mut engine = AudioEngine::new();
        let mut len = 0;
        let mut sink = |block: &[i16]| len += block.len();
        assert_eq!(engine.update_frames(&ram.view(), &mut sink, 30), MAX_BLOCK_SAMPLES);
        assert_eq!(len, MAX_BLOCK_SAMPLES);
    }

    #[test]
    fn distortion_quantizes_to_coarse_steps() {
        assert_eq!(distort(0.0), 0.0);
        // Below one step collapses to zero
        assert_eq!(distort(0.1), 0.0);
        let one_step = 0x1000 as f32 / 32767.0 + 1e-4;
        assert!((distort(one_step) - 0x1249 as f32 / 32767.0).abs() < 1e-6);
        assert!(distort(-one_step) < 0.0);
    }

    #[test]
    fn full_scale_clips() {
        assert_eq!(to_pcm(3.0), 32767);
        assert_eq!(to_pcm(-3.0), -32767);
    }

    #[test]
    fn state_round_trips() {
        let ram = square_ram(0, 5);
        let mem = ram.view();
        let mut engine = AudioEngine::new();
        engine.play_sfx(&mem, 0, None, 0);
        let mut out = [0i16; 1000];
        engine.generate(&mem, &mut out);
        let snap = engine.state();

        let mut a = [0i16; 500];
        engine.generate(&mem, &mut a);

        let mut restored = AudioEngine::new();
        restored.set_state(&snap);
        let mut b = [0i16; 500];
        restored.generate(&mem, &mut b);
        assert_eq!(a, b);
    }
}
