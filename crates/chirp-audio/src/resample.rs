//! Streaming rate conversion from the engine's native rate to the device.

/// Linear-interpolating resampler over a pull-based mono source.
///
/// The source is asked for a new sample every time the read position
/// crosses a whole native sample. An exhausted source reads as silence.
#[derive(Clone, Debug)]
pub struct LinearResampler {
    /// Native samples advanced per output sample
    step: f32,
    frac: f32,
    prev: f32,
    next: f32,
}

impl LinearResampler {
    pub fn new(source_rate: u32, output_rate: u32) -> Self {
        Self {
            step: source_rate as f32 / output_rate.max(1) as f32,
            frac: 0.0,
            prev: 0.0,
            next: 0.0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Produce one output sample in `[-1, 1)`, pulling from `source` as
    /// needed.
    pub fn next_sample(&mut self, mut source: impl FnMut() -> Option<i16>) -> f32 {
        let out = self.prev + (self.next - self.prev) * self.frac;

        self.frac += self.step;
        while self.frac >= 1.0 {
            self.frac -= 1.0;
            self.prev = self.next;
            self.next = source().map_or(0.0, |s| s as f32 / 32768.0);
        }

        out
    }
}
