//! Allocation-free render path tests.
//!
//! These tests verify that `AudioEngine::generate()` and `update()` do not
//! allocate. They render busy carts for several seconds to catch
//! allocations triggered by music dispatch, effects or loop edges.
//!
//! Just run `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use chirp_engine::{AudioEngine, StagingBuffer, NATIVE_SAMPLE_RATE};
use chirp_ir::{Effect, PatternEntry, PatternSlot, Row, SoundRam, Voice, Waveform, NUM_ROWS};

fn cart() -> SoundRam {
    let mut ram = SoundRam::new();
    for row in 0..NUM_ROWS {
        let effect = Effect::from_code(row as u8);
        ram.set_row(1, row, Row::new(20 + row as u8, Voice::Builtin(Waveform::TiltedSaw), 5, effect));
        ram.set_row(2, row, Row::new(8, Voice::Builtin(Waveform::Noise), 7, Effect::Drop));
        ram.set_row(3, row, Row::new(30, Voice::Builtin(Waveform::Organ), 6, Effect::Vibrato));
    }
    ram.set_header(1, 2, 0, 32);
    ram.set_header(2, 1, 0, 0);
    ram.set_header(3, 4, 2, 10);
    ram.set_pattern(0, PatternEntry::new([
        PatternSlot::instrument(1).with_flag(),
        PatternSlot::instrument(2),
        PatternSlot::EMPTY,
        PatternSlot::EMPTY,
    ]));
    ram.set_pattern(1, PatternEntry::new([
        PatternSlot::instrument(2),
        PatternSlot::instrument(1).with_flag(),
        PatternSlot::EMPTY,
        PatternSlot::EMPTY,
    ]));
    ram
}

fn busy_engine(ram: &SoundRam) -> AudioEngine {
    let mut engine = AudioEngine::new();
    engine.play_music(0, 0b0011);
    engine.play_sfx(&ram.view(), 3, Some(2), 0);
    engine.play_sfx(&ram.view(), 2, Some(3), 0);
    engine
}

#[test]
fn generate_alloc_free() {
    let ram = cart();
    let mem = ram.view();
    let mut engine = busy_engine(&ram);
    let mut block = [0i16; 512];

    assert_no_alloc(|| {
        for _ in 0..(NATIVE_SAMPLE_RATE as usize * 5 / block.len()) {
            engine.generate(&mem, &mut block);
        }
    });
    assert!(engine.is_music_playing());
}

#[test]
fn update_alloc_free() {
    let ram = cart();
    let mem = ram.view();
    let mut engine = busy_engine(&ram);
    let mut total = 0usize;

    assert_no_alloc(|| {
        for _ in 0..300 {
            engine.update(&mem, &mut |block: &[i16]| total += block.len());
        }
    });
    assert_eq!(total, NATIVE_SAMPLE_RATE as usize * 5);
}

#[test]
fn staging_buffer_alloc_free() {
    let ram = cart();
    let mem = ram.view();
    let mut engine = busy_engine(&ram);
    let mut staging: StagingBuffer<4096> = StagingBuffer::new();
    let mut device = [0i16; 256];

    assert_no_alloc(|| {
        for _ in 0..120 {
            engine.update(&mem, &mut staging);
            while staging.drain_into(&mut device) == device.len() {}
        }
    });
    assert_eq!(staging.dropped(), 0);
}
