//! Host-facing output plumbing: frame pacing and sample sinks.

use heapless::Deque;

use crate::frequency::{FRAME_RATE, NATIVE_SAMPLE_RATE};

/// Largest block `update` will synthesize in one call.
pub const MAX_BLOCK_SAMPLES: usize = 2048;

/// Receives finished mono i16 blocks from the engine.
pub trait AudioSink {
    fn submit(&mut self, samples: &[i16]);
}

impl<F: FnMut(&[i16])> AudioSink for F {
    fn submit(&mut self, samples: &[i16]) {
        self(samples)
    }
}

/// Converts 60 Hz frames into whole sample counts.
///
/// The remainder is kept in units of 1/60 sample, so 60 frames always
/// produce exactly 22050 samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameAccumulator {
    pub remainder: u32,
}

impl FrameAccumulator {
    pub const fn new() -> Self {
        Self { remainder: 0 }
    }

    /// Account for `frames` elapsed frames and return how many samples are
    /// due now. At most [`MAX_BLOCK_SAMPLES`] are released per call; the
    /// rest stays owed for later calls.
    pub fn advance(&mut self, frames: u32) -> usize {
        self.remainder = self
            .remainder
            .saturating_add(frames.saturating_mul(NATIVE_SAMPLE_RATE));
        let due = (self.remainder / FRAME_RATE).min(MAX_BLOCK_SAMPLES as u32);
        self.remainder -= due * FRAME_RATE;
        due as usize
    }
}

/// Fixed-capacity sample FIFO between the engine and an audio callback.
/// When full, the oldest samples are dropped.
#[derive(Debug, Default)]
pub struct StagingBuffer<const N: usize> {
    queue: Deque<i16, N>,
    dropped: u64,
}

impl<const N: usize> StagingBuffer<N> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Samples discarded because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn pop(&mut self) -> Option<i16> {
        self.queue.pop_front()
    }

    /// Fill `out` from the front of the buffer, returning how many samples
    /// were written. The rest of `out` is left untouched.
    pub fn drain_into(&mut self, out: &mut [i16]) -> usize {
        let mut n = 0;
        for slot in out.iter_mut() {
            match self.queue.pop_front() {
                Some(s) => *slot = s,
                None => break,
            }
            n += 1;
        }
        n
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl<const N: usize> AudioSink for StagingBuffer<N> {
    fn submit(&mut self, samples: &[i16]) {
        for &s in samples {
            if self.queue.is_full() {
                self.queue.pop_front();
                self.dropped += 1;
            }
            // Cannot fail: a slot was freed above
            let _ = self.queue.push_back(s);
        }
    }
}
