//! Opaque external codec shims (DEFLATE via `flate2`, Zstd via `zstd`).
//!
//! Each shim takes a byte slice, hands it to the corresponding crate's
//! encoder/decoder, and packs the resulting opaque bytes MSB-first into
//! a [`BitBuffer`] so external-codec output composes with the rest of
//! the bit-level framing without disturbing alignment.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::bits::BitBuffer;
use crate::error::{Error, Result};

/// DEFLATE-compress `data` at the default compression level.
pub fn deflate_encode(data: &[u8]) -> Result<BitBuffer> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::ExternalCodecFailure { codec: "deflate", message: e.to_string() })?;
    let compressed = encoder
        .finish()
        .map_err(|e| Error::ExternalCodecFailure { codec: "deflate", message: e.to_string() })?;

    let mut bits = BitBuffer::new();
    bits.append_bytes(&compressed);
    Ok(bits)
}

/// Inverse of [`deflate_encode`]: `bits` must contain a whole number of
/// bytes (the DEFLATE stream itself is self-delimiting).
pub fn deflate_decode(bits: &BitBuffer) -> Result<Vec<u8>> {
    let bytes = bitbuffer_to_bytes(bits)?;
    let mut decoder = DeflateDecoder::new(&bytes[..]);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::ExternalCodecFailure { codec: "deflate", message: e.to_string() })?;
    Ok(out)
}

/// Zstd-compress `data` at the crate's default level.
pub fn zstd_encode(data: &[u8]) -> Result<BitBuffer> {
    let compressed = zstd::encode_all(data, 0)
        .map_err(|e| Error::ExternalCodecFailure { codec: "zstd", message: e.to_string() })?;

    let mut bits = BitBuffer::new();
    bits.append_bytes(&compressed);
    Ok(bits)
}

/// Inverse of [`zstd_encode`].
pub fn zstd_decode(bits: &BitBuffer) -> Result<Vec<u8>> {
    let bytes = bitbuffer_to_bytes(bits)?;
    zstd::decode_all(&bytes[..])
        .map_err(|e| Error::ExternalCodecFailure { codec: "zstd", message: e.to_string() })
}

fn bitbuffer_to_bytes(bits: &BitBuffer) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(Error::UnsupportedConfiguration {
            detail: "external codec payload must be byte-aligned".to_string(),
        });
    }
    let mut cursor = bits.cursor();
    let mut out = Vec::with_capacity((bits.len() / 8) as usize);
    for _ in 0..(bits.len() / 8) {
        out.push(cursor.read_uint(8)? as u8);
    }
    Ok(out)
}
