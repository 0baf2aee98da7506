//! Integer range coder (P=32 bit precision) driven by a [`FreqModel`].
//!
//! Classic Witten-Neal-Cleary scaling: emit a bit (plus any pending
//! opposite bits) whenever the top bit of `low` and `high` agree, and
//! track near-convergence (`low` in the second quarter, `high` in the
//! third) as pending bits rather than emitting immediately.

use crate::bits::BitBuffer;
use crate::error::{Error, Result};
use crate::models::FreqModel;

const PRECISION: u32 = 32;
const TOP: u64 = 1 << PRECISION;
const MASK: u64 = TOP - 1;
const HALF: u64 = TOP / 2;
const QUARTER: u64 = TOP / 4;
const THREE_QUARTER: u64 = 3 * QUARTER;

/// Cap on a model's `max_total` so `range * total` never overflows the
/// u64 intermediate used for `(range * hi) / total`.
pub const MAX_SAFE_TOTAL: u64 = 1 << (PRECISION - 2);

/// Range-coder half of the arithmetic coder; owns the bit buffer it
/// writes into and the model driving its probabilities.
pub struct ArithmeticEncoder {
    low: u64,
    high: u64,
    pending: u64,
    bits: BitBuffer,
}

impl ArithmeticEncoder {
    pub fn new() -> Self {
        ArithmeticEncoder { low: 0, high: MASK, pending: 0, bits: BitBuffer::new() }
    }

    fn emit(&mut self, bit: bool) {
        self.bits.append_bit(bit);
        for _ in 0..self.pending {
            self.bits.append_bit(!bit);
        }
        self.pending = 0;
    }

    /// Encode one symbol under `model`'s current context, then advance
    /// the model.
    pub fn encode_symbol(&mut self, model: &mut FreqModel, symbol: u32) -> Result<()> {
        let (lo, hi, total) = model.cumulative_range(symbol)?;
        if total == 0 || hi == lo {
            return Err(Error::ArithmeticModelExhaustion);
        }

        let range = self.high - self.low + 1;
        self.high = self.low + (range * hi) / total - 1;
        self.low += (range * lo) / total;

        loop {
            if self.high < HALF {
                self.emit(false);
            } else if self.low >= HALF {
                self.emit(true);
                self.low -= HALF;
                self.high -= HALF;
            } else if self.low >= QUARTER && self.high < THREE_QUARTER {
                self.pending += 1;
                self.low -= QUARTER;
                self.high -= QUARTER;
            } else {
                break;
            }
            self.low *= 2;
            self.high = self.high * 2 + 1;
        }

        model.update(symbol)
    }

    /// Flush the final bits needed so the decoder's interval lands
    /// uniquely inside `[low, high)`, and return the finished bitstream.
    pub fn finish(mut self) -> BitBuffer {
        self.pending += 1;
        if self.low < QUARTER {
            self.emit(false);
        } else {
            self.emit(true);
        }
        self.bits
    }
}

impl Default for ArithmeticEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Range-coder decoder: mirrors [`ArithmeticEncoder`], reading bits from
/// a cursor into a `code` register.
pub struct ArithmeticDecoder<'a> {
    low: u64,
    high: u64,
    code: u64,
    cursor: crate::bits::BitCursor<'a>,
}

impl<'a> ArithmeticDecoder<'a> {
    pub fn new(bits: &'a BitBuffer) -> Self {
        let mut cursor = bits.cursor();
        let mut code = 0u64;
        for _ in 0..PRECISION {
            let bit = cursor.read_bit().unwrap_or(false);
            code = (code << 1) | bit as u64;
        }
        ArithmeticDecoder { low: 0, high: MASK, code, cursor }
    }

    fn next_bit(&mut self) -> bool {
        self.cursor.read_bit().unwrap_or(false)
    }

    /// Decode the next symbol under `model`'s current context, then
    /// advance the model.
    pub fn decode_symbol(&mut self, model: &mut FreqModel) -> Result<u32> {
        let total = model.total();
        if total == 0 {
            return Err(Error::ArithmeticModelExhaustion);
        }

        let range = self.high - self.low + 1;
        let scaled = ((self.code - self.low + 1) * total - 1) / range;
        let (symbol, lo, hi, total) = model.symbol_for_target(scaled)?;

        self.high = self.low + (range * hi) / total - 1;
        self.low += (range * lo) / total;

        loop {
            if self.high < HALF {
                // no-op, bit is implicitly 0
            } else if self.low >= HALF {
                self.low -= HALF;
                self.high -= HALF;
                self.code -= HALF;
            } else if self.low >= QUARTER && self.high < THREE_QUARTER {
                self.low -= QUARTER;
                self.high -= QUARTER;
                self.code -= QUARTER;
            } else {
                break;
            }
            self.low *= 2;
            self.high = self.high * 2 + 1;
            let bit = self.next_bit();
            self.code = (self.code * 2) + bit as u64;
        }

        model.update(symbol)?;
        Ok(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(symbols: &[u32], alphabet: Vec<u32>, order: usize) {
        let mut enc_model = FreqModel::new_order_k(alphabet.clone(), order);
        let mut encoder = ArithmeticEncoder::new();
        for &s in symbols {
            encoder.encode_symbol(&mut enc_model, s).unwrap();
        }
        let bits = encoder.finish();

        let mut dec_model = FreqModel::new_order_k(alphabet, order);
        let mut decoder = ArithmeticDecoder::new(&bits);
        let mut decoded = Vec::with_capacity(symbols.len());
        for _ in 0..symbols.len() {
            decoded.push(decoder.decode_symbol(&mut dec_model).unwrap());
        }
        assert_eq!(decoded, symbols);
    }

    #[test]
    fn round_trips_order_0_over_byte_alphabet() {
        let alphabet: Vec<u32> = (0..256).collect();
        let symbols: Vec<u32> = b"the quick brown fox jumps over the lazy dog 0123456789"
            .iter()
            .map(|&b| b as u32)
            .collect();
        round_trip(&symbols, alphabet, 0);
    }

    #[test]
    fn round_trips_orders_1_through_4() {
        let alphabet: Vec<u32> = vec![0, 1, 2, 3, 4];
        let symbols: Vec<u32> = vec![0, 1, 2, 3, 4, 4, 3, 2, 1, 0, 0, 0, 2, 4, 1, 3];
        for order in 0..=4 {
            round_trip(&symbols, alphabet.clone(), order);
        }
    }

    #[test]
    fn round_trips_single_symbol_alphabet() {
        round_trip(&[0, 0, 0, 0], vec![0], 0);
    }

    #[test]
    fn round_trips_empty_symbol_sequence() {
        round_trip(&[], vec![0, 1], 0);
    }

    #[test]
    fn unknown_symbol_is_arithmetic_model_exhaustion() {
        let mut model = FreqModel::new_order_k(vec![0, 1], 0);
        let mut encoder = ArithmeticEncoder::new();
        assert!(matches!(
            encoder.encode_symbol(&mut model, 7),
            Err(Error::ArithmeticModelExhaustion)
        ));
    }
}
