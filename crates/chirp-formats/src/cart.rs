//! Sound-cart images: instrument RAM followed by pattern RAM.

use binrw::io::Cursor;
use binrw::{binrw, BinRead, BinWrite};
use chirp_ir::{SoundRam, INSTRUMENT_RAM_SIZE, PATTERN_RAM_SIZE, SOUND_RAM_SIZE};
use log::debug;

use crate::FormatError;

pub const CART_MAGIC: &[u8; 8] = b"CHRPCART";

/// Size of a cart image including its magic.
pub const CART_SIZE: usize = CART_MAGIC.len() + SOUND_RAM_SIZE;

#[binrw]
#[brw(little, magic = b"CHRPCART")]
struct CartImage {
    instruments: [u8; INSTRUMENT_RAM_SIZE],
    patterns: [u8; PATTERN_RAM_SIZE],
}

/// Load a cart image. A bare 4608-byte RAM dump without the magic is
/// accepted too. Bytes past the end of the image are ignored.
pub fn load_cart(data: &[u8]) -> Result<SoundRam, FormatError> {
    if data.len() == SOUND_RAM_SIZE && !data.starts_with(CART_MAGIC) {
        debug!("loading headerless sound RAM dump");
        let mut ram = SoundRam::new();
        ram.instruments.copy_from_slice(&data[..INSTRUMENT_RAM_SIZE]);
        ram.patterns.copy_from_slice(&data[INSTRUMENT_RAM_SIZE..]);
        return Ok(ram);
    }

    let image = CartImage::read(&mut Cursor::new(data))?;
    Ok(SoundRam {
        instruments: image.instruments,
        patterns: image.patterns,
    })
}

/// Write `ram` as a cart image, magic included.
pub fn save_cart(ram: &SoundRam) -> Result<Vec<u8>, FormatError> {
    let image = CartImage {
        instruments: ram.instruments,
        patterns: ram.patterns,
    };
    let mut buf = Cursor::new(Vec::with_capacity(CART_SIZE));
    image.write(&mut buf)?;
    Ok(buf.into_inner())
}
