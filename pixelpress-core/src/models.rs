//! Adaptive frequency models driving the arithmetic coder.
//!
//! An order-K model conditions its symbol distribution on the K most
//! recently observed symbols. Context tables are allocated lazily
//! (sparse storage, per-context `Vec<u32>`), so the model's memory scales
//! with the number of *distinct* contexts actually seen rather than with
//! `|A|^K`.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::error::{Error, Result};

type Context = SmallVec<[u32; 4]>;

/// A conditional frequency table of order K over a fixed alphabet.
///
/// Every (context, symbol) count starts at 1, so every alphabet symbol
/// has nonzero probability in every context from the start. Counts in a
/// context are halved (rounding up, keeping every count >= 1) whenever
/// their sum would otherwise exceed `max_total`.
#[derive(Debug, Clone)]
pub struct FreqModel {
    alphabet: Vec<u32>,
    symbol_index: HashMap<u32, usize>,
    order: usize,
    max_total: u64,
    initial_counts: Vec<u32>,
    tables: HashMap<Context, Vec<u32>>,
    context: Context,
}

/// Coder-imposed cap on a context's total count; chosen so that
/// `range * max_total` fits comfortably inside the arithmetic coder's
/// P=32 bit range without overflowing a u64 intermediate.
pub const DEFAULT_MAX_TOTAL: u64 = 1 << 14;

impl FreqModel {
    fn new_with_initial(alphabet: Vec<u32>, order: usize, initial_counts: Vec<u32>) -> Self {
        let symbol_index = alphabet
            .iter()
            .enumerate()
            .map(|(i, &s)| (s, i))
            .collect();

        FreqModel {
            alphabet,
            symbol_index,
            order,
            max_total: DEFAULT_MAX_TOTAL,
            initial_counts,
            tables: HashMap::new(),
            context: Context::new(),
        }
    }

    /// An adaptive order-K model; every (context, symbol) count starts
    /// at 1.
    pub fn new_order_k(alphabet: Vec<u32>, order: usize) -> Self {
        let initial = vec![1u32; alphabet.len()];
        Self::new_with_initial(alphabet, order, initial)
    }

    /// An order-0, "IID" model seeded from an empirical count snapshot
    /// rather than all-ones. Still self-adapts like any other model if
    /// used during streaming encoding.
    pub fn new_iid(alphabet: Vec<u32>, initial_counts: Vec<u32>) -> Result<Self> {
        if initial_counts.len() != alphabet.len() {
            return Err(Error::UnsupportedConfiguration {
                detail: format!(
                    "IID model alphabet has {} symbols but {} initial counts were given",
                    alphabet.len(),
                    initial_counts.len()
                ),
            });
        }
        if initial_counts.iter().any(|&c| c == 0) {
            return Err(Error::UnsupportedConfiguration {
                detail: "IID model initial counts must all be >= 1".to_string(),
            });
        }
        Ok(Self::new_with_initial(alphabet, 0, initial_counts))
    }

    pub fn with_max_total(mut self, max_total: u64) -> Self {
        self.max_total = max_total;
        self
    }

    pub fn alphabet(&self) -> &[u32] {
        &self.alphabet
    }

    fn table_for_current_context(&self) -> Vec<u32> {
        self.tables
            .get(&self.context)
            .cloned()
            .unwrap_or_else(|| self.initial_counts.clone())
    }

    fn symbol_position(&self, symbol: u32) -> Result<usize> {
        self.symbol_index
            .get(&symbol)
            .copied()
            .ok_or(Error::ArithmeticModelExhaustion)
    }

    /// Cumulative range `(lo, hi, total)` for `symbol` under the current
    /// context, in alphabet order.
    pub fn cumulative_range(&self, symbol: u32) -> Result<(u64, u64, u64)> {
        let pos = self.symbol_position(symbol)?;
        let counts = self.table_for_current_context();

        let lo: u64 = counts[..pos].iter().map(|&c| c as u64).sum();
        let hi = lo + counts[pos] as u64;
        let total: u64 = counts.iter().map(|&c| c as u64).sum();

        if counts[pos] == 0 {
            return Err(Error::ArithmeticModelExhaustion);
        }

        Ok((lo, hi, total))
    }

    /// Total count across the whole alphabet under the current context.
    pub fn total(&self) -> u64 {
        self.table_for_current_context()
            .iter()
            .map(|&c| c as u64)
            .sum()
    }

    /// Find the alphabet symbol whose cumulative range contains
    /// `target` (0 <= target < total), returning `(symbol, lo, hi, total)`.
    pub fn symbol_for_target(&self, target: u64) -> Result<(u32, u64, u64, u64)> {
        let counts = self.table_for_current_context();
        let total: u64 = counts.iter().map(|&c| c as u64).sum();

        let mut lo = 0u64;
        for (pos, &count) in counts.iter().enumerate() {
            let hi = lo + count as u64;
            if target < hi {
                return Ok((self.alphabet[pos], lo, hi, total));
            }
            lo = hi;
        }

        Err(Error::ArithmeticModelExhaustion)
    }

    /// Record an observation of `symbol` in the current context, then
    /// advance the context window.
    pub fn update(&mut self, symbol: u32) -> Result<()> {
        let pos = self.symbol_position(symbol)?;
        let mut counts = self.table_for_current_context();

        counts[pos] += 1;
        let total: u64 = counts.iter().map(|&c| c as u64).sum();
        if total > self.max_total {
            for c in counts.iter_mut() {
                *c = c.div_ceil(2).max(1);
            }
        }

        self.tables.insert(self.context.clone(), counts);

        if self.order > 0 {
            if self.context.len() == self.order {
                self.context.remove(0);
            }
            self.context.push(symbol);
        }

        Ok(())
    }
}
