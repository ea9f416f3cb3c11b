//! Binary formats for the chirp audio engine.
//!
//! Sound-cart images and save states are little-endian `binrw` records.
//! WAV output is written by hand as 16-bit mono PCM.

mod cart;
mod state;
mod wav_format;

pub use cart::{load_cart, save_cart, CART_MAGIC, CART_SIZE};
pub use state::{decode_state, encode_state, STATE_MAGIC, STATE_VERSION};
pub use wav_format::{samples_to_wav, write_wav};

/// Error type for format parsing.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// Invalid file header or magic bytes
    #[error("invalid header")]
    InvalidHeader,
    /// Record written by a newer or unknown format revision
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    /// Input ended before the record was complete
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Any other decode or encode failure
    #[error("binary codec error: {0}")]
    Binrw(binrw::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<binrw::Error> for FormatError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Backtrace(bt) => FormatError::from(*bt.error),
            binrw::Error::BadMagic { .. } => FormatError::InvalidHeader,
            err if err.is_eof() => FormatError::UnexpectedEof,
            err => FormatError::Binrw(err),
        }
    }
}
