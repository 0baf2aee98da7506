//! Elias-delta universal code for positive integers.
//!
//! For n >= 1, let k = floor(log2 n) + 1 (the bit length of n) and
//! m = floor(log2 k) + 1 (the bit length of k). The code emits
//! `m - 1` zero bits, then the `m`-bit binary representation of `k`,
//! then the low `k - 1` bits of `n`. Each integer is self-delimited, so
//! a sequence of them can be decoded back-to-back with no separators.

use crate::bits::{BitBuffer, BitCursor};
use crate::error::{Error, Result};

fn bit_length(n: u64) -> u32 {
    u64::BITS - n.leading_zeros()
}

/// Append the Elias-delta code for `n` (n >= 1) to `bits`.
pub fn encode_uint(bits: &mut BitBuffer, n: u64) -> Result<()> {
    if n == 0 {
        return Err(Error::UnsupportedConfiguration {
            detail: "Elias-delta coding requires n >= 1".to_string(),
        });
    }

    let k = bit_length(n);
    let m = bit_length(k as u64);

    for _ in 0..(m - 1) {
        bits.append_bit(false);
    }
    bits.append_uint(k as u64, m);
    if k > 1 {
        bits.append_uint(n, k - 1);
    }

    Ok(())
}

/// Append the Elias-delta codes for every element of `values` in order.
pub fn encode_uint_seq(bits: &mut BitBuffer, values: &[u64]) -> Result<()> {
    for &v in values {
        encode_uint(bits, v)?;
    }
    Ok(())
}

/// Decode a single Elias-delta coded integer from `cursor`.
pub fn decode_uint(cursor: &mut BitCursor<'_>) -> Result<u64> {
    let mut zeros = 0u32;
    while !cursor.read_bit()? {
        zeros += 1;
        if zeros >= 64 {
            return Err(Error::TruncatedBitstream);
        }
    }

    let m = zeros + 1;
    let mut k: u64 = 1;
    for _ in 0..(m - 1) {
        k = (k << 1) | cursor.read_bit()? as u64;
    }

    let mut n: u64 = 1;
    for _ in 0..(k - 1) {
        n = (n << 1) | cursor.read_bit()? as u64;
    }

    Ok(n)
}

/// Decode exactly `count` Elias-delta coded integers from `cursor`.
pub fn decode_uint_seq(cursor: &mut BitCursor<'_>, count: usize) -> Result<Vec<u64>> {
    (0..count).map(|_| decode_uint(cursor)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_small_values() {
        for n in 1..=1000u64 {
            let mut bits = BitBuffer::new();
            encode_uint(&mut bits, n).unwrap();
            let mut cursor = bits.cursor();
            assert_eq!(decode_uint(&mut cursor).unwrap(), n);
            assert_eq!(cursor.position(), bits.len());
        }
    }

    #[test]
    fn round_trips_large_values() {
        for n in [u32::MAX as u64, 1 << 40, u64::MAX / 2] {
            let mut bits = BitBuffer::new();
            encode_uint(&mut bits, n).unwrap();
            let mut cursor = bits.cursor();
            assert_eq!(decode_uint(&mut cursor).unwrap(), n);
        }
    }

    #[test]
    fn zero_is_rejected() {
        let mut bits = BitBuffer::new();
        assert!(encode_uint(&mut bits, 0).is_err());
    }

    #[test]
    fn sequence_round_trips_back_to_back() {
        let values: Vec<u64> = vec![1, 2, 3, 4, 10, 100, 1000, 7, 1];
        let mut bits = BitBuffer::new();
        encode_uint_seq(&mut bits, &values).unwrap();
        let mut cursor = bits.cursor();
        let decoded = decode_uint_seq(&mut cursor, values.len()).unwrap();
        assert_eq!(decoded, values);
    }
}
