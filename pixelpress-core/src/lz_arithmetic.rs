//! LZ77 + arithmetic composite encoder (spec §4.5).
//!
//! A byte block is LZ77-parsed, the sequence tuples are flattened into
//! one integer stream and arithmetic-coded over their derived alphabet,
//! and the literal buffer is arithmetic-coded separately with an
//! order-1 model. Each piece is framed with an explicit bit-length
//! prefix so a decoder can isolate it before entropy-decoding.
//!
//! The flattened stream can contain negative values (a sentinel
//! sequence's `match_length - MIN_MATCH` and `match_offset - 1` both go
//! negative once `match_length == match_offset == 0`), so every value
//! is zigzag-mapped to a non-negative integer before it is used as a
//! model/alphabet symbol — the same zigzag trick the rice coder uses to
//! carry signed residuals over an unsigned code.

use crate::arithmetic::{ArithmeticDecoder, ArithmeticEncoder};
use crate::bits::BitBuffer;
use crate::elias;
use crate::error::{Error, Result};
use crate::lz77::{Lz77Parser, Lz77Sequence};
use crate::models::FreqModel;

fn zigzag_encode(v: i64) -> u32 {
    ((v << 1) ^ (v >> 63)) as u32
}

fn zigzag_decode(v: u32) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

/// Encode `data` as an LZ77 + arithmetic bitstream.
pub fn encode(data: &[u8]) -> Result<BitBuffer> {
    let parser = Lz77Parser::new();
    let (sequences, literals) = parser.parse(data);
    let min_match = parser.min_match() as i64;
    let n = sequences.len();

    let mut combined: Vec<i64> = Vec::with_capacity(1 + 3 * n);
    combined.push(min_match);
    combined.extend(sequences.iter().map(|s| s.literal_count as i64));
    combined.extend(sequences.iter().map(|s| s.match_length as i64 - min_match));
    combined.extend(sequences.iter().map(|s| s.match_offset as i64 - 1));

    let zigzagged: Vec<u32> = combined.iter().map(|&v| zigzag_encode(v)).collect();

    let mut alphabet = zigzagged.clone();
    alphabet.sort_unstable();
    alphabet.dedup();

    let mut alphabet_bits = BitBuffer::new();
    for &symbol in &alphabet {
        elias::encode_uint(&mut alphabet_bits, symbol as u64 + 1)?;
    }

    let mut seq_model = FreqModel::new_order_k(alphabet, 0);
    let mut seq_encoder = ArithmeticEncoder::new();
    for &symbol in &zigzagged {
        seq_encoder.encode_symbol(&mut seq_model, symbol)?;
    }
    let sequence_bits = seq_encoder.finish();

    let mut out = BitBuffer::new();
    out.append_uint(n as u64, 32);
    out.append_uint(alphabet_bits.len(), 64);
    out.append_buffer(&alphabet_bits);
    out.append_uint(sequence_bits.len(), 32);
    out.append_buffer(&sequence_bits);

    if literals.is_empty() {
        out.append_uint(0, 32);
    } else {
        let literal_alphabet: Vec<u32> = (0..=255).collect();
        let mut literal_model = FreqModel::new_order_k(literal_alphabet, 1);
        let mut literal_encoder = ArithmeticEncoder::new();
        for &byte in &literals {
            literal_encoder.encode_symbol(&mut literal_model, byte as u32)?;
        }
        let literal_bits = literal_encoder.finish();
        out.append_uint(literal_bits.len(), 32);
        out.append_buffer(&literal_bits);
    }

    Ok(out)
}

/// Decode an LZ77 + arithmetic bitstream produced by [`encode`].
pub fn decode(bits: &BitBuffer) -> Result<Vec<u8>> {
    let mut cursor = bits.cursor();

    let n = cursor.read_uint(32)? as usize;

    let alphabet_bit_len = cursor.read_uint(64)?;
    let alphabet_start = cursor.position();
    let mut alphabet: Vec<u32> = Vec::new();
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

    let sequence_bit_len = cursor.read_uint(32)?;
    let sequence_start = cursor.position();
    let sequence_segment = bits.slice(sequence_start, sequence_bit_len)?;
    cursor.skip(sequence_bit_len)?;

    let expected_len = 1 + 3 * n;
    let mut seq_model = FreqModel::new_order_k(alphabet, 0);
    let mut seq_decoder = ArithmeticDecoder::new(&sequence_segment);
    let mut combined = Vec::with_capacity(expected_len);
    for _ in 0..expected_len {
        let symbol = seq_decoder.decode_symbol(&mut seq_model)?;
        combined.push(zigzag_decode(symbol));
    }

    let min_match = combined[0];
    let literal_counts = &combined[1..1 + n];
    let match_lengths = &combined[1 + n..1 + 2 * n];
    let match_offsets = &combined[1 + 2 * n..1 + 3 * n];

    let sequences: Vec<Lz77Sequence> = (0..n)
        .map(|i| Lz77Sequence {
            literal_count: literal_counts[i] as u32,
            match_length: (match_lengths[i] + min_match) as u32,
            match_offset: (match_offsets[i] + 1) as u32,
        })
        .collect();

    let literal_bit_len = cursor.read_uint(32)?;
    let total_literal_count: usize = sequences.iter().map(|s| s.literal_count as usize).sum();

    let literals = if literal_bit_len == 0 {
        Vec::new()
    } else {
        let literal_start = cursor.position();
        let literal_segment = bits.slice(literal_start, literal_bit_len)?;
        cursor.skip(literal_bit_len)?;

        let literal_alphabet: Vec<u32> = (0..=255).collect();
        let mut literal_model = FreqModel::new_order_k(literal_alphabet, 1);
        let mut literal_decoder = ArithmeticDecoder::new(&literal_segment);
        (0..total_literal_count)
            .map(|_| literal_decoder.decode_symbol(&mut literal_model).map(|s| s as u8))
            .collect::<Result<Vec<u8>>>()?
    };

    Lz77Parser::execute_parse(&literals, &sequences)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(data: &[u8]) {
        let bits = encode(data).unwrap();
        let decoded = decode(&bits).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn round_trips_repeated_run() {
        round_trip(b"AAAAAAAAAA");
    }

    #[test]
    fn round_trips_empty_input() {
        round_trip(b"");
    }

    #[test]
    fn empty_literal_buffer_is_exactly_32_zero_bits() {
        let bits = encode(b"AAAAAAAAAAAAAAAAAAAAAAAA").unwrap();
        let mut cursor = bits.cursor();
        let n = cursor.read_uint(32).unwrap() as usize;
        let alphabet_bit_len = cursor.read_uint(64).unwrap();
        cursor.skip(alphabet_bit_len).unwrap();
        let sequence_bit_len = cursor.read_uint(32).unwrap();
        cursor.skip(sequence_bit_len).unwrap();
        let literal_bit_len = cursor.read_uint(32).unwrap();

        if literal_bit_len == 0 {
            assert_eq!(cursor.position(), bits.len());
        }
        let _ = n;
    }

    #[test]
    fn round_trips_mixed_text() {
        round_trip(b"the quick brown fox jumps over the lazy dog, the quick brown fox");
    }

    #[test]
    fn round_trips_binary_with_repeats() {
        let mut data = Vec::new();
        for i in 0..64u8 {
            data.push(i % 7);
        }
        data.extend_from_slice(&data.clone());
        round_trip(&data);
    }
}
