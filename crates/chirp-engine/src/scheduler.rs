//! Tick scheduling.
//!
//! Two countdown schedulers share each synthesis tick: the music
//! sequencer, which dispatches one pattern every `32 × music_speed` ticks,
//! and the per-channel row scheduler in [`Channel::tick`]. Music runs
//! first so that a freshly dispatched pattern decodes its first rows in
//! the same tick.

use chirp_ir::{PatternEntry, SoundMemory, NUM_CHANNELS, NUM_PATTERNS, NUM_ROWS};
use log::debug;

use crate::channel::Channel;

/// Music sequencer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MusicState {
    /// Pattern dispatched at the next timer expiry; `None` ends playback
    pub music_pattern: Option<u8>,
    /// Pattern currently sounding
    pub current_pattern: Option<u8>,
    /// Ticks until the next dispatch
    pub music_tick_timer: u32,
    /// Slowest-common speed of the current pattern's instruments
    pub music_speed: u16,
    /// Where a loop-back flag returns to
    pub music_loop_start: u8,
    /// Channels music may use, one bit per channel
    pub music_mask: u8,
    pub music_playing: bool,
}

impl Default for MusicState {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicState {
    pub const fn new() -> Self {
        Self {
            music_pattern: None,
            current_pattern: None,
            music_tick_timer: 0,
            music_speed: 1,
            music_loop_start: 0,
            music_mask: 0x0F,
            music_playing: false,
        }
    }

    /// Queue `pattern` for dispatch on the next tick.
    pub fn start(&mut self, pattern: u8, mask: u8) {
        *self = Self {
            music_pattern: Some(pattern % NUM_PATTERNS as u8),
            music_tick_timer: 1,
            music_mask: mask & 0x0F,
            music_playing: true,
            ..Self::new()
        };
    }

    /// Stop the sequencer and silence every channel it owns.
    pub fn stop(&mut self, channels: &mut [Channel; NUM_CHANNELS]) {
        self.music_playing = false;
        self.music_pattern = None;
        self.current_pattern = None;
        for ch in channels.iter_mut().filter(|ch| ch.is_music) {
            ch.stop();
        }
    }

    /// Advance the music timer by one tick, dispatching a pattern at zero.
    pub fn tick(&mut self, channels: &mut [Channel; NUM_CHANNELS], mem: &SoundMemory<'_>) {
        if !self.music_playing {
            return;
        }

        self.music_tick_timer = self.music_tick_timer.saturating_sub(1);
        if self.music_tick_timer > 0 {
            return;
        }

        match self.music_pattern {
            Some(pattern) => self.dispatch(pattern, channels, mem),
            None => {
                debug!("music finished");
                self.music_playing = false;
                self.current_pattern = None;
            }
        }
    }

    /// Trigger the channels of `pattern` and pick the pattern after it.
    fn dispatch(&mut self, pattern: u8, channels: &mut [Channel; NUM_CHANNELS], mem: &SoundMemory<'_>) {
        let entry = mem.pattern(pattern as usize);
        let mut speed: Option<u16> = None;

        for (i, (ch, slot)) in channels.iter_mut().zip(entry.slots).enumerate() {
            if self.music_mask & (1 << i) == 0 {
                continue;
            }
            match slot.sfx() {
                Some(sfx) => {
                    let instrument = mem.instrument(sfx as usize);
                    ch.trigger(instrument, sfx, 0);
                    ch.is_music = true;
                    let s = instrument.speed();
                    speed = Some(speed.map_or(s, |cur| cur.min(s)));
                }
                None if ch.is_music => ch.stop(),
                None => {}
            }
        }

        self.music_speed = speed.unwrap_or(1);
        self.music_tick_timer = NUM_ROWS as u32 * self.music_speed as u32;
        self.current_pattern = Some(pattern);
        self.music_pattern = self.next_pattern(pattern, &entry);

        debug!(
            "music pattern {} dispatched, speed {}, next {:?}",
            pattern, self.music_speed, self.music_pattern
        );
    }

    /// Apply the pattern's meta flags. Stop wins over loop-back.
    fn next_pattern(&mut self, pattern: u8, entry: &PatternEntry) -> Option<u8> {
        if entry.loop_start() {
            self.music_loop_start = pattern;
        }

        if entry.stop() {
            None
        } else if entry.loop_back() {
            Some(self.music_loop_start)
        } else if (pattern as usize) + 1 < NUM_PATTERNS {
            Some(pattern + 1)
        } else {
            None
        }
    }
}

/// Run one synthesis tick: music first, then every channel's row
/// scheduler.
pub fn run_tick(
    music: &mut MusicState,
    channels: &mut [Channel; NUM_CHANNELS],
    mem: &SoundMemory<'_>,
) {
    music.tick(channels, mem);
    for ch in channels.iter_mut() {
        ch.tick(mem);
    }
}
