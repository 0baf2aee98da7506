//! Per-channel and whole-image pipeline drivers (spec §4.7).
//!
//! A [`PipelineDriver`] ties the filtering stage to one of four entropy
//! back-ends and frames the result the way `libflo_audio::lossless::Encoder`
//! composes a builder-configured encoder around `Writer`: construction
//! validates nothing expensive, `encode_image`/`decode_image` do the
//! actual work and must be called with matching configuration on both
//! sides (the driver does not carry its own config inside the
//! bitstream, only width/height/channel-count).

use crate::arithmetic::{ArithmeticDecoder, ArithmeticEncoder};
use crate::bits::BitBuffer;
use crate::elias;
use crate::error::{Error, Result};
use crate::external;
use crate::filters::{choose_filter, unapply_filter, FilterType, Heuristic};
use crate::image::Image;
use crate::lz_arithmetic;
use crate::models::FreqModel;

/// Entropy back-end plugged in at pipeline step 2/3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackEnd {
    /// Adaptive order-K arithmetic coding over the stream's derived alphabet.
    Arithmetic(usize),
    /// LZ77 parse, sequences and literals each arithmetic-coded (§4.5).
    LzArithmetic,
    Deflate,
    Zstd,
}

fn bit_length(n: u64) -> u32 {
    (64 - n.leading_zeros()).max(1)
}

/// Encode `values` as an Elias-delta-prefixed alphabet descriptor
/// followed by an order-K arithmetic-coded payload. The alphabet is
/// derived from `values` itself (a single pre-pass) rather than assumed,
/// per the design note that residual streams aren't assumed to span
/// [0,255].
fn encode_order_k_segment(values: &[u32], order: usize) -> Result<BitBuffer> {
    let mut alphabet = values.to_vec();
    alphabet.sort_unstable();
    alphabet.dedup();

    let mut alphabet_bits = BitBuffer::new();
    for &symbol in &alphabet {
        elias::encode_uint(&mut alphabet_bits, symbol as u64 + 1)?;
    }

    let mut model = FreqModel::new_order_k(alphabet, order);
    let mut encoder = ArithmeticEncoder::new();
    for &symbol in values {
        encoder.encode_symbol(&mut model, symbol)?;
    }
    let payload_bits = encoder.finish();

    let mut out = BitBuffer::new();
    out.append_uint(alphabet_bits.len(), 64);
    out.append_buffer(&alphabet_bits);
    out.append_buffer(&payload_bits);
    Ok(out)
}

/// Inverse of [`encode_order_k_segment`]. `bits` must be exactly this
/// segment's own bounded buffer (the arithmetic payload runs to the end
/// of it) and `count` must equal the number of values originally encoded.
fn decode_order_k_segment(bits: &BitBuffer, count: usize, order: usize) -> Result<Vec<u32>> {
    let mut cursor = bits.cursor();
    let alphabet_bit_len = cursor.read_uint(64)?;
    let alphabet_start = cursor.position();
    let mut alphabet = Vec::new();
    while cursor.position() - alphabet_start < alphabet_bit_len {
        let v = elias::decode_uint(&mut cursor)?;
        alphabet.push((v - 1) as u32);
    }
    if cursor.position() - alphabet_start != alphabet_bit_len {
        return Err(Error::FramingLengthMismatch {
            expected: alphabet_bit_len,
            actual: cursor.position() - alphabet_start,
        });
    }

    let payload_start = cursor.position();
    let payload = bits.slice(payload_start, bits.len() - payload_start)?;

    let mut model = FreqModel::new_order_k(alphabet, order);
    let mut decoder = ArithmeticDecoder::new(&payload);
    (0..count).map(|_| decoder.decode_symbol(&mut model)).collect()
}

const FILTER_TYPE_ALPHABET: [u32; 5] = [0, 1, 2, 3, 4];

/// Filter-type stream alphabet is the fixed set `{0,1,2,3,4}`, known to
/// both sides without transmission, unlike the residual stream's
/// derived alphabet.
fn encode_filter_type_stream(filter_codes: &[u8]) -> BitBuffer {
    let mut model = FreqModel::new_order_k(FILTER_TYPE_ALPHABET.to_vec(), 1);
    let mut encoder = ArithmeticEncoder::new();
    for &code in filter_codes {
        encoder
            .encode_symbol(&mut model, code as u32)
            .expect("filter code is always in {0,1,2,3,4}");
    }
    encoder.finish()
}

fn decode_filter_type_stream(bits: &BitBuffer, count: usize) -> Result<Vec<u8>> {
    let mut model = FreqModel::new_order_k(FILTER_TYPE_ALPHABET.to_vec(), 1);
    let mut decoder = ArithmeticDecoder::new(bits);
    (0..count)
        .map(|_| decoder.decode_symbol(&mut model).map(|s| s as u8))
        .collect()
}

/// Per-channel, per-image-dimension compression driver. Encode and
/// decode calls must share the same configuration; none of it is
/// carried inside the bitstream except width, height, and channel count.
#[derive(Debug, Clone, Copy)]
pub struct PipelineDriver {
    width: u32,
    height: u32,
    prepend_filter_type: bool,
    heuristic: Heuristic,
    back_end: BackEnd,
}

impl PipelineDriver {
    pub fn new(width: u32, height: u32) -> Self {
        PipelineDriver {
            width,
            height,
            prepend_filter_type: false,
            heuristic: Heuristic::AbsoluteSum,
            back_end: BackEnd::Arithmetic(0),
        }
    }

    pub fn with_prepend_filter_type(mut self, prepend_filter_type: bool) -> Self {
        self.prepend_filter_type = prepend_filter_type;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_back_end(mut self, back_end: BackEnd) -> Self {
        self.back_end = back_end;
        self
    }

    fn encode_residual_stream(&self, bytes: &[u8]) -> Result<BitBuffer> {
        log::debug!("encode_residual_stream: dispatching {} bytes to {:?}", bytes.len(), self.back_end);
        match self.back_end {
            BackEnd::Arithmetic(order) => {
                let values: Vec<u32> = bytes.iter().map(|&b| b as u32).collect();
                encode_order_k_segment(&values, order)
            }
            BackEnd::LzArithmetic => lz_arithmetic::encode(bytes),
            BackEnd::Deflate => external::deflate_encode(bytes),
            BackEnd::Zstd => external::zstd_encode(bytes),
        }
    }

    fn decode_residual_stream(&self, bits: &BitBuffer, count: usize) -> Result<Vec<u8>> {
        log::debug!("decode_residual_stream: dispatching {count} expected bytes to {:?}", self.back_end);
        let decoded = match self.back_end {
            BackEnd::Arithmetic(order) => decode_order_k_segment(bits, count, order)?
                .into_iter()
                .map(|v| v as u8)
                .collect(),
            BackEnd::LzArithmetic => lz_arithmetic::decode(bits)?,
            BackEnd::Deflate => external::deflate_decode(bits)?,
            BackEnd::Zstd => external::zstd_decode(bits)?,
        };

        if decoded.len() != count {
            return Err(Error::FramingLengthMismatch {
                expected: count as u64,
                actual: decoded.len() as u64,
            });
        }
        Ok(decoded)
    }

    /// Filter every scanline of `channel` (length `width * height`), then
    /// entropy-code the result per steps 2/3 of §4.7.
    fn encode_channel(&self, channel: &[u8]) -> Result<BitBuffer> {
        let w = self.width as usize;
        let h = self.height as usize;
        let zero_row = vec![0u8; w];

        let mut filter_codes = Vec::with_capacity(h);
        let mut residual_stream = Vec::with_capacity(w * h);
        for r in 0..h {
            let curr = &channel[r * w..(r + 1) * w];
            let prev = if r == 0 { &zero_row[..] } else { &channel[(r - 1) * w..r * w] };
            let (filter, residual) = choose_filter(self.heuristic, curr, prev);
            filter_codes.push(filter.code());
            residual_stream.extend_from_slice(&residual);
        }
        log::debug!("encode_channel: filtered {h} scanlines of width {w}");

        let mut payload = BitBuffer::new();

        if self.prepend_filter_type {
            let filter_bits = encode_filter_type_stream(&filter_codes);
            payload.append_uint(filter_bits.len(), 32);
            payload.append_buffer(&filter_bits);

            let residual_bits = self.encode_residual_stream(&residual_stream)?;
            payload.append_buffer(&residual_bits);
        } else {
            let mut flat = Vec::with_capacity(h * (w + 1));
            for r in 0..h {
                flat.push(filter_codes[r]);
                flat.extend_from_slice(&residual_stream[r * w..(r + 1) * w]);
            }
            let flat_bits = self.encode_residual_stream(&flat)?;
            payload.append_buffer(&flat_bits);
        }

        Ok(payload)
    }

    /// Inverse of [`Self::encode_channel`]. `bits` must be exactly this
    /// channel's own bounded buffer.
    fn decode_channel(&self, bits: &BitBuffer) -> Result<Vec<u8>> {
        let w = self.width as usize;
        let h = self.height as usize;
        log::debug!("decode_channel: reconstructing {h} scanlines of width {w}");

        let (filter_codes, residual_bytes) = if self.prepend_filter_type {
            let mut cursor = bits.cursor();
            let filter_bit_len = cursor.read_uint(32)?;
            let filter_start = cursor.position();
            let filter_segment = bits.slice(filter_start, filter_bit_len)?;
            cursor.skip(filter_bit_len)?;
            let filter_codes = decode_filter_type_stream(&filter_segment, h)?;

            let residual_start = cursor.position();
            let residual_segment = bits.slice(residual_start, bits.len() - residual_start)?;
            let residual_bytes = self.decode_residual_stream(&residual_segment, w * h)?;
            (filter_codes, residual_bytes)
        } else {
            let flat_bytes = self.decode_residual_stream(bits, h * (w + 1))?;
            let mut filter_codes = Vec::with_capacity(h);
            let mut residual_bytes = Vec::with_capacity(w * h);
            for r in 0..h {
                filter_codes.push(flat_bytes[r * (w + 1)]);
                residual_bytes.extend_from_slice(&flat_bytes[r * (w + 1) + 1..r * (w + 1) + 1 + w]);
            }
            (filter_codes, residual_bytes)
        };

        let mut channel = vec![0u8; w * h];
        let mut prev = vec![0u8; w];
        for r in 0..h {
            let filter = FilterType::try_from(filter_codes[r])?;
            let residual = &residual_bytes[r * w..(r + 1) * w];
            let curr = unapply_filter(filter, residual, &prev);
            channel[r * w..(r + 1) * w].copy_from_slice(&curr);
            prev = curr;
        }

        Ok(channel)
    }

    /// Encode a whole image: big-endian, non-byte-aligned header
    /// (`len_w`/width/`len_h`/height/channel-count) followed by each
    /// channel's individually length-prefixed payload.
    pub fn encode_image(&self, image: &Image) -> Result<BitBuffer> {
        if image.width() != self.width || image.height() != self.height {
            return Err(Error::InvalidInputShape {
                detail: format!(
                    "driver configured for {}x{}, image is {}x{}",
                    self.width,
                    self.height,
                    image.width(),
                    image.height()
                ),
            });
        }

        log::debug!(
            "encode_image: assembling {}x{} frame, {} channels",
            self.width,
            self.height,
            image.channel_count()
        );

        let mut out = BitBuffer::new();
        let len_w = bit_length(self.width as u64);
        out.append_uint(len_w as u64, 32);
        out.append_uint(self.width as u64, len_w);
        let len_h = bit_length(self.height as u64);
        out.append_uint(len_h as u64, 32);
        out.append_uint(self.height as u64, len_h);
        out.append_uint(image.channel_count() as u64, 8);

        for c in 0..image.channel_count() {
            let channel_bits = self.encode_channel(image.channel(c))?;
            out.append_uint(channel_bits.len(), 32);
            out.append_buffer(&channel_bits);
        }

        log::debug!("encode_image: assembled frame is {} bits", out.len());

        Ok(out)
    }

    /// Inverse of [`Self::encode_image`].
    pub fn decode_image(&self, bits: &BitBuffer) -> Result<Image> {
        let mut cursor = bits.cursor();
        let len_w = cursor.read_uint(32)? as u32;
        let width = cursor.read_uint(len_w)? as u32;
        let len_h = cursor.read_uint(32)? as u32;
        let height = cursor.read_uint(len_h)? as u32;
        let channel_count = cursor.read_uint(8)? as usize;

        if width != self.width || height != self.height {
            return Err(Error::InvalidInputShape {
                detail: format!(
                    "driver configured for {}x{}, bitstream header declares {}x{}",
                    self.width, self.height, width, height
                ),
            });
        }

        log::debug!("decode_image: parsed header, {width}x{height}, {channel_count} channels");

        let mut channels = Vec::with_capacity(channel_count);
        for _ in 0..channel_count {
            let channel_bit_len = cursor.read_uint(32)?;
            let start = cursor.position();
            let segment = bits.slice(start, channel_bit_len)?;
            cursor.skip(channel_bit_len)?;
            channels.push(self.decode_channel(&segment)?);
        }

        Image::new(width, height, channels)
    }
}
