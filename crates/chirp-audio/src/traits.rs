//! Audio output trait and error types.

/// Error type for audio operations.
#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("no audio device available")]
    NoDevice,
}

/// A sink for native-rate mono engine output.
pub trait AudioOutput {
    /// Rate the device plays at.
    fn sample_rate(&self) -> u32;

    /// Queue samples without blocking. Returns how many were accepted; the
    /// rest are dropped.
    fn write(&mut self, samples: &[i16]) -> usize;

    /// Start playback.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Stop playback.
    fn stop(&mut self) -> Result<(), AudioError>;
}
