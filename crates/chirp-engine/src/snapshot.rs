//! Complete playback state for save states and rewind.

use chirp_ir::NUM_CHANNELS;

use crate::channel::Channel;
use crate::output::FrameAccumulator;
use crate::scheduler::MusicState;

/// Everything needed to resume playback bit-exactly, given the same sound
/// memory. Mixer settings are not part of it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioStateSnapshot {
    pub channels: [Channel; NUM_CHANNELS],
    pub music: MusicState,
    pub tick_phase: u32,
    pub frames: FrameAccumulator,
}
