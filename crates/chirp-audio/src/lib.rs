//! Audio output backends for the chirp audio engine.

mod cpal_backend;
mod resample;
mod traits;

pub use cpal_backend::CpalOutput;
pub use resample::LinearResampler;
pub use traits::{AudioError, AudioOutput};
