//! Save-state encoding for [`AudioStateSnapshot`].
//!
//! Layout: magic `CHRPSTAT`, a version byte, then the four channels, the
//! music sequencer, the tick phase and the frame accumulator, every field
//! in declaration order. `Option<u8>` is stored as an `i8` with -1 for
//! `None`; `bool` as a byte.

use binrw::io::Cursor;
use binrw::{binrw, BinRead, BinWrite};
use chirp_engine::{AudioStateSnapshot, Channel, ChannelState, FrameAccumulator, MusicState};
use chirp_ir::{Effect, NUM_CHANNELS};

use crate::FormatError;

pub const STATE_MAGIC: &[u8; 8] = b"CHRPSTAT";
pub const STATE_VERSION: u8 = 1;

#[binrw]
#[brw(little, magic = b"CHRPSTAT")]
struct StateHeader {
    version: u8,
}

fn read_opt(v: i8) -> Option<u8> {
    u8::try_from(v).ok()
}

fn write_opt(v: &Option<u8>) -> i8 {
    v.map_or(-1, |x| x as i8)
}

#[binrw]
#[brw(little)]
struct ChannelStateRecord {
    #[br(map = |v: i8| read_opt(v))]
    #[bw(map = |v: &Option<u8>| write_opt(v))]
    sfx_id: Option<u8>,
    phi: f32,
    lfo_phi: f32,
    lfsr: u16,
    noise_sample: f32,
    current_vol: f32,
    current_pitch_val: f32,
    slide_start_pitch: f32,
    vib_phase: f32,
    row: u8,
    last_note_idx: u8,
    row_phase: f32,
    tick_counter: u16,
    speed: u16,
    loop_start: u8,
    loop_end: u8,
    #[br(map = |b: u8| b != 0)]
    #[bw(map = |b: &bool| u8::from(*b))]
    loop_active: bool,
}

#[binrw]
#[brw(little)]
struct ChannelRecord {
    state: ChannelStateRecord,
    child: ChannelStateRecord,
    #[br(map = |b: u8| b != 0)]
    #[bw(map = |b: &bool| u8::from(*b))]
    is_music: bool,
    #[br(map = |c: u8| Effect::from_code(c))]
    #[bw(map = |e: &Effect| e.code())]
    effect: Effect,
}

#[binrw]
#[brw(little)]
struct MusicRecord {
    #[br(map = |v: i8| read_opt(v))]
    #[bw(map = |v: &Option<u8>| write_opt(v))]
    music_pattern: Option<u8>,
    #[br(map = |v: i8| read_opt(v))]
    #[bw(map = |v: &Option<u8>| write_opt(v))]
    current_pattern: Option<u8>,
    music_tick_timer: u32,
    music_speed: u16,
    music_loop_start: u8,
    music_mask: u8,
    #[br(map = |b: u8| b != 0)]
    #[bw(map = |b: &bool| u8::from(*b))]
    music_playing: bool,
}

#[binrw]
#[brw(little)]
struct StateRecord {
    channels: [ChannelRecord; NUM_CHANNELS],
    music: MusicRecord,
    tick_phase: u32,
    frame_remainder: u32,
}

impl From<&ChannelState> for ChannelStateRecord {
    fn from(s: &ChannelState) -> Self {
        Self {
            sfx_id: s.sfx_id,
            phi: s.phi,
            lfo_phi: s.lfo_phi,
            lfsr: s.lfsr,
            noise_sample: s.noise_sample,
            current_vol: s.current_vol,
            current_pitch_val: s.current_pitch_val,
            slide_start_pitch: s.slide_start_pitch,
            vib_phase: s.vib_phase,
            row: s.row,
            last_note_idx: s.last_note_idx,
            row_phase: s.row_phase,
            tick_counter: s.tick_counter,
            speed: s.speed,
            loop_start: s.loop_start,
            loop_end: s.loop_end,
            loop_active: s.loop_active,
        }
    }
}

impl From<ChannelStateRecord> for ChannelState {
    fn from(r: ChannelStateRecord) -> Self {
        Self {
            sfx_id: r.sfx_id,
            phi: r.phi,
            lfo_phi: r.lfo_phi,
            lfsr: r.lfsr,
            noise_sample: r.noise_sample,
            current_vol: r.current_vol,
            current_pitch_val: r.current_pitch_val,
            slide_start_pitch: r.slide_start_pitch,
            vib_phase: r.vib_phase,
            row: r.row,
            last_note_idx: r.last_note_idx,
            row_phase: r.row_phase,
            tick_counter: r.tick_counter,
            speed: r.speed.max(1),
            loop_start: r.loop_start,
            loop_end: r.loop_end,
            loop_active: r.loop_active,
        }
    }
}

impl From<&Channel> for ChannelRecord {
    fn from(ch: &Channel) -> Self {
        Self {
            state: (&ch.state).into(),
            child: (&ch.child).into(),
            is_music: ch.is_music,
            effect: ch.effect,
        }
    }
}

impl From<ChannelRecord> for Channel {
    fn from(r: ChannelRecord) -> Self {
        Self {
            state: r.state.into(),
            child: r.child.into(),
            is_music: r.is_music,
            effect: r.effect,
        }
    }
}

impl From<&MusicState> for MusicRecord {
    fn from(m: &MusicState) -> Self {
        Self {
            music_pattern: m.music_pattern,
            current_pattern: m.current_pattern,
            music_tick_timer: m.music_tick_timer,
            music_speed: m.music_speed,
            music_loop_start: m.music_loop_start,
            music_mask: m.music_mask,
            music_playing: m.music_playing,
        }
    }
}

impl From<MusicRecord> for MusicState {
    fn from(r: MusicRecord) -> Self {
        Self {
            music_pattern: r.music_pattern,
            current_pattern: r.current_pattern,
            music_tick_timer: r.music_tick_timer,
            music_speed: r.music_speed.max(1),
            music_loop_start: r.music_loop_start,
            music_mask: r.music_mask & 0x0F,
            music_playing: r.music_playing,
        }
    }
}

/// Serialize a snapshot to its binary save-state form.
pub fn encode_state(snapshot: &AudioStateSnapshot) -> Result<Vec<u8>, FormatError> {
    let record = StateRecord {
        channels: snapshot.channels.each_ref().map(ChannelRecord::from),
        music: (&snapshot.music).into(),
        tick_phase: snapshot.tick_phase,
        frame_remainder: snapshot.frames.remainder,
    };

    let mut buf = Cursor::new(Vec::new());
    StateHeader { version: STATE_VERSION }.write(&mut buf)?;
    record.write(&mut buf)?;
    Ok(buf.into_inner())
}

/// Parse a binary save state.
pub fn decode_state(data: &[u8]) -> Result<AudioStateSnapshot, FormatError> {
    let mut cursor = Cursor::new(data);
    let header = StateHeader::read(&mut cursor)?;
    if header.version != STATE_VERSION {
        return Err(FormatError::UnsupportedVersion(header.version));
    }

    let record = StateRecord::read(&mut cursor)?;
    Ok(AudioStateSnapshot {
        channels: record.channels.map(Channel::from),
        music: record.music.into(),
        tick_phase: record.tick_phase,
        frames: FrameAccumulator {
            remainder: record.frame_remainder,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_snapshot() -> AudioStateSnapshot {
        let mut snap = AudioStateSnapshot::default();
        snap.channels[1].state = ChannelState {
            sfx_id: Some(12),
            phi: 0.25,
            lfsr: 0x1A2B,
            current_pitch_val: 30.5,
            row: 7,
            speed: 3,
            loop_active: true,
            ..ChannelState::new()
        };
        snap.channels[1].child.sfx_id = Some(40);
        snap.channels[1].is_music = true;
        snap.channels[1].effect = Effect::FadeOut;
        snap.music = MusicState {
            music_pattern: Some(9),
            current_pattern: Some(8),
            music_tick_timer: 77,
            music_speed: 2,
            music_loop_start: 4,
            music_mask: 0b1010,
            music_playing: true,
        };
        snap.tick_phase = 101;
        snap.frames.remainder = 30;
        snap
    }

    #[test]
    fn encoded_state_has_header() {
        let bytes = encode_state(&busy_snapshot()).unwrap();
        assert_eq!(&bytes[..8], STATE_MAGIC);
        assert_eq!(bytes[8], STATE_VERSION);
    }

    #[test]
    fn state_decodes_to_identical_snapshot() {
        let snap = busy_snapshot();
        let decoded = decode_state(&encode_state(&snap).unwrap()).unwrap();
        assert_eq!(decoded, snap);
    }

    #[test]
    fn none_is_stored_as_minus_one() {
        let bytes = encode_state(&AudioStateSnapshot::default()).unwrap();
        // First field after the header is channel 0's sfx_id
        assert_eq!(bytes[9] as i8, -1);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = encode_state(&busy_snapshot()).unwrap();
        bytes[8] = 2;
        assert!(matches!(decode_state(&bytes), Err(FormatError::UnsupportedVersion(2))));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        assert!(matches!(decode_state(b"NOTSTATE\x01"), Err(FormatError::InvalidHeader)));
    }

    #[test]
    fn truncated_state_is_eof() {
        let bytes = encode_state(&busy_snapshot()).unwrap();
        assert!(matches!(decode_state(&bytes[..40]), Err(FormatError::UnexpectedEof)));
    }
}
