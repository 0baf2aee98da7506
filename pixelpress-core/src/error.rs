//! Error kinds surfaced by the compression pipeline.

use thiserror::Error;

/// All errors the core can return. Every error kind is fatal to the
/// current encode/decode call: there is no partial-result recovery.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input shape: {detail}")]
    InvalidInputShape { detail: String },

    #[error("unsupported configuration: {detail}")]
    UnsupportedConfiguration { detail: String },

    #[error("arithmetic model exhaustion: zero-probability symbol encountered")]
    ArithmeticModelExhaustion,

    #[error("truncated bitstream: reached end of input before completing a frame")]
    TruncatedBitstream,

    #[error("framing length mismatch: expected {expected} bits, consumed {actual}")]
    FramingLengthMismatch { expected: u64, actual: u64 },

    #[error("external codec failure ({codec}): {message}")]
    ExternalCodecFailure { codec: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
