//! Headless controller for the chirp audio engine.
//!
//! Provides one API for loading sound carts, triggering sounds, offline
//! rendering, live playback and save states that every host can share.

use chirp_audio::{AudioOutput, CpalOutput};
use chirp_engine::AudioEngine;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

// Re-export common types so callers don't need chirp-ir/chirp-engine directly.
pub use chirp_audio::AudioError;
pub use chirp_engine::{AudioStateSnapshot, EngineConfig, FRAME_RATE, NATIVE_SAMPLE_RATE};
pub use chirp_formats::FormatError;
pub use chirp_ir::SoundRam;

#[derive(thiserror::Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Headless controller: owns sound RAM and an engine, and manages live
/// playback.
///
/// Live playback runs on a copy of the engine. Changes made through the
/// controller while playing are heard on the next [`play`](Self::play);
/// [`stop`](Self::stop) brings the played state back.
pub struct Controller {
    ram: SoundRam,
    engine: AudioEngine,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    samples_played: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<AudioEngine>>,
}

impl Controller {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            ram: SoundRam::new(),
            engine: AudioEngine::with_config(config),
            playback: None,
        }
    }

    // --- Sound memory ---

    pub fn ram(&self) -> &SoundRam {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut SoundRam {
        &mut self.ram
    }

    /// Replace sound memory with a cart image and silence the engine.
    pub fn load_cart(&mut self, data: &[u8]) -> Result<(), ControllerError> {
        self.stop();
        self.ram = chirp_formats::load_cart(data)?;
        self.engine.stop_all();
        Ok(())
    }

    pub fn save_cart(&self) -> Result<Vec<u8>, ControllerError> {
        Ok(chirp_formats::save_cart(&self.ram)?)
    }

    // --- Engine control ---

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AudioEngine {
        &mut self.engine
    }

    pub fn play_sfx(&mut self, sfx: u8, channel: Option<usize>, row: u8) -> Option<usize> {
        self.engine.play_sfx(&self.ram.view(), sfx, channel, row)
    }

    pub fn play_music(&mut self, pattern: u8, mask: u8) {
        self.engine.play_music(pattern, mask);
    }

    pub fn stop_all(&mut self) {
        self.engine.stop_all();
    }

    /// Whether any channel or the music sequencer still has work to do.
    pub fn is_sounding(&self) -> bool {
        self.engine.is_music_playing() || self.engine.channels().iter().any(|ch| ch.is_active())
    }

    // --- Save states ---

    pub fn save_state(&self) -> Result<Vec<u8>, ControllerError> {
        Ok(chirp_formats::encode_state(&self.engine.state())?)
    }

    pub fn load_state(&mut self, data: &[u8]) -> Result<(), ControllerError> {
        let snapshot = chirp_formats::decode_state(data)?;
        self.stop();
        self.engine.set_state(&snapshot);
        Ok(())
    }

    // --- Offline rendering ---

    /// Run the engine for `seconds` of 60 Hz frames and collect its output.
    pub fn render_samples(&mut self, seconds: f32) -> Vec<i16> {
        let frames = (seconds.max(0.0) * FRAME_RATE as f32).round() as usize;
        let mut out = Vec::with_capacity(frames * (NATIVE_SAMPLE_RATE / FRAME_RATE + 1) as usize);
        let mem = self.ram.view();
        for _ in 0..frames {
            self.engine
                .update(&mem, &mut |block: &[i16]| out.extend_from_slice(block));
        }
        out
    }

    pub fn render_to_wav(&mut self, seconds: f32) -> Result<Vec<u8>, ControllerError> {
        let samples = self.render_samples(seconds);
        Ok(chirp_formats::samples_to_wav(&samples, NATIVE_SAMPLE_RATE)?)
    }

    // --- Real-time playback ---

    /// Start playing the current engine state on the default audio device.
    pub fn play(&mut self) {
        self.stop();

        let ram = self.ram.clone();
        let engine = self.engine.clone();
        let stop_signal = Arc::new(AtomicBool::new(false));
        let samples_played = Arc::new(AtomicU64::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stop = stop_signal.clone();
        let played = samples_played.clone();
        let done = finished.clone();

        let thread = std::thread::spawn(move || audio_thread(ram, engine, stop, played, done));

        self.playback = Some(PlaybackHandle {
            stop_signal,
            samples_played,
            finished,
            thread: Some(thread),
        });
    }

    /// Stop live playback and adopt the engine state it reached.
    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                match handle.join() {
                    Ok(engine) => self.engine = engine,
                    Err(_) => warn!("audio thread panicked"),
                }
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Relaxed))
    }

    /// Native-rate samples handed to the device since `play`.
    pub fn samples_played(&self) -> u64 {
        self.playback
            .as_ref()
            .map_or(0, |p| p.samples_played.load(Ordering::Relaxed))
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn audio_thread(
    ram: SoundRam,
    mut engine: AudioEngine,
    stop_signal: Arc<AtomicBool>,
    samples_played: Arc<AtomicU64>,
    finished: Arc<AtomicBool>,
) -> AudioEngine {
    let (mut output, consumer) = match CpalOutput::new() {
        Ok(pair) => pair,
        Err(e) => {
            warn!("audio output unavailable: {}", e);
            finished.store(true, Ordering::Relaxed);
            return engine;
        }
    };

    if let Err(e) = output.build_stream(consumer) {
        warn!("audio stream failed: {}", e);
        finished.store(true, Ordering::Relaxed);
        return engine;
    }
    let _ = output.start();
    debug!("live playback at device rate {}", output.sample_rate());

    let mem = ram.view();
    let is_sounding =
        |e: &AudioEngine| e.is_music_playing() || e.channels().iter().any(|ch| ch.is_active());

    // The ring buffer blocks `write_spin`, which paces this loop at the
    // device's consumption rate.
    while is_sounding(&engine) && !stop_signal.load(Ordering::Relaxed) {
        let n = engine.update(&mem, &mut |block: &[i16]| output.write_spin(block));
        samples_played.fetch_add(n as u64, Ordering::Relaxed);
    }

    if !stop_signal.load(Ordering::Relaxed) {
        // Let the tail drain before the stream is dropped
        output.write_spin(&[0; NATIVE_SAMPLE_RATE as usize / 10]);
    }

    finished.store(true, Ordering::Relaxed);
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirp_ir::{Effect, PatternEntry, PatternSlot, Row, Voice, Waveform};

    fn tone_ram() -> SoundRam {
        let mut ram = SoundRam::new();
        for row in 0..32 {
            ram.set_row(3, row, Row::new(24, Voice::Builtin(Waveform::Saw), 7, Effect::None));
        }
        ram.set_header(3, 1, 0, 0);
        ram
    }

    #[test]
    fn one_second_render_is_native_rate() {
        let mut ctrl = Controller::new();
        *ctrl.ram_mut() = tone_ram();
        ctrl.play_sfx(3, None, 0);
        let samples = ctrl.render_samples(1.0);
        assert_eq!(samples.len(), NATIVE_SAMPLE_RATE as usize);
        assert!(samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn sfx_finishes_after_32_rows() {
        let mut ctrl = Controller::new();
        *ctrl.ram_mut() = tone_ram();
        ctrl.play_sfx(3, None, 0);
        assert!(ctrl.is_sounding());
        // 32 ticks at ~120 Hz is well under half a second
        ctrl.render_samples(0.5);
        assert!(!ctrl.is_sounding());
    }

    #[test]
    fn wav_render_has_header_and_all_samples() {
        let mut ctrl = Controller::new();
        let wav = ctrl.render_to_wav(0.5).unwrap();
        assert_eq!(&wav[..4], b"RIFF");
        assert_eq!(wav.len(), 44 + 2 * (NATIVE_SAMPLE_RATE as usize / 2));
    }

    #[test]
    fn load_cart_replaces_memory_and_silences() {
        let mut ctrl = Controller::new();
        *ctrl.ram_mut() = tone_ram();
        ctrl.play_sfx(3, None, 0);

        let mut other = SoundRam::new();
        other.set_pattern(0, PatternEntry::new([PatternSlot::EMPTY; 4]));
        let bytes = chirp_formats::save_cart(&other).unwrap();
        ctrl.load_cart(&bytes).unwrap();
        assert_eq!(ctrl.ram(), &other);
        assert!(!ctrl.is_sounding());
    }

    #[test]
    fn bad_cart_reports_format_error() {
        let mut ctrl = Controller::new();
        let err = ctrl.load_cart(b"definitely not a cart").unwrap_err();
        assert!(matches!(err, ControllerError::Format(FormatError::InvalidHeader)));
    }

    #[test]
    fn state_round_trip_through_bytes() {
        let mut ctrl = Controller::new();
        *ctrl.ram_mut() = tone_ram();
        ctrl.play_sfx(3, Some(2), 5);
        ctrl.render_samples(0.05);
        let state = ctrl.save_state().unwrap();
        let expected = ctrl.render_samples(0.1);

        let mut other = Controller::new();
        *other.ram_mut() = tone_ram();
        other.load_state(&state).unwrap();
        assert_eq!(other.render_samples(0.1), expected);
    }
}
