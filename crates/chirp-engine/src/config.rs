//! User-facing engine settings.

/// Volume, distortion and mute settings applied by the mixer.
///
/// Volumes run 0 to 10. The music bus is additionally attenuated by a
/// fixed 0.6 so that SFX cut through a full mix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub volume_music: u8,
    pub volume_sfx: u8,
    pub distortion: bool,
    pub muted: bool,
}

/// Highest accepted bus volume.
pub const MAX_VOLUME: u8 = 10;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            volume_music: MAX_VOLUME,
            volume_sfx: MAX_VOLUME,
            distortion: false,
            muted: false,
        }
    }
}

impl EngineConfig {
    /// Copy of `self` with both volumes clamped into range.
    pub fn clamped(self) -> Self {
        Self {
            volume_music: self.volume_music.min(MAX_VOLUME),
            volume_sfx: self.volume_sfx.min(MAX_VOLUME),
            ..self
        }
    }

    /// Whether the mixer should emit silence without advancing.
    pub fn is_silenced(&self) -> bool {
        self.muted || (self.volume_music == 0 && self.volume_sfx == 0)
    }
}
