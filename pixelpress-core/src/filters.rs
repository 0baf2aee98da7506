//! PNG-style reversible byte-wise scanline predictors.
//!
//! Five predictors act on a current scanline given the previous one (all
//! zeros at the top edge). All arithmetic is modulo 256. The Paeth
//! tie-break order (left, then upper, then upper-left) is part of the
//! wire contract and must never be reordered.

/// One of the five reversible predictors, numbered to match the wire
/// format's filter-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FilterType {
    type Error = crate::error::Error;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            other => Err(crate::error::Error::UnsupportedConfiguration {
                detail: format!("unknown filter type code {other}"),
            }),
        }
    }
}

/// Paeth predictor with the exact tie-break order required for decoder
/// compatibility: left wins ties with upper, upper wins ties with
/// upper-left.
fn paeth_predictor(left: i32, upper: i32, upper_left: i32) -> u8 {
    let p = left + upper - upper_left;
    let p_left = (p - left).abs();
    let p_upper = (p - upper).abs();
    let p_upper_left = (p - upper_left).abs();

    if p_left <= p_upper && p_left <= p_upper_left {
        left as u8
    } else if p_upper <= p_upper_left {
        upper as u8
    } else {
        upper_left as u8
    }
}

/// Apply `filter` to `curr` given the previous scanline `prev` (all
/// zeros at the top edge), producing a residual of the same length.
pub fn apply_filter(filter: FilterType, curr: &[u8], prev: &[u8]) -> Vec<u8> {
    let width = curr.len();
    let mut residual = vec![0u8; width];

    match filter {
        FilterType::None => residual.copy_from_slice(curr),
        FilterType::Sub => {
            for i in 0..width {
                let left = if i == 0 { 0 } else { curr[i - 1] };
                residual[i] = curr[i].wrapping_sub(left);
            }
        }
        FilterType::Up => {
            for i in 0..width {
                residual[i] = curr[i].wrapping_sub(prev[i]);
            }
        }
        FilterType::Average => {
            for i in 0..width {
                let left = if i == 0 { 0 } else { curr[i - 1] } as u32;
                let up = prev[i] as u32;
                let avg = (left + up) / 2;
                residual[i] = curr[i].wrapping_sub(avg as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..width {
                let left = if i == 0 { 0 } else { curr[i - 1] as i32 };
                let up = prev[i] as i32;
                let upper_left = if i == 0 { 0 } else { prev[i - 1] as i32 };
                residual[i] = curr[i].wrapping_sub(paeth_predictor(left, up, upper_left));
            }
        }
    }

    residual
}

/// Invert `apply_filter`: reconstruct the original scanline given its
/// residual, the previous (already-reconstructed, or original) scanline,
/// and the filter type used to produce it.
pub fn unapply_filter(filter: FilterType, residual: &[u8], prev: &[u8]) -> Vec<u8> {
    let width = residual.len();
    let mut curr = vec![0u8; width];

    match filter {
        FilterType::None => curr.copy_from_slice(residual),
        FilterType::Sub => {
            for i in 0..width {
                let left = if i == 0 { 0 } else { curr[i - 1] };
                curr[i] = residual[i].wrapping_add(left);
            }
        }
        FilterType::Up => {
            for i in 0..width {
                curr[i] = residual[i].wrapping_add(prev[i]);
            }
        }
        FilterType::Average => {
            for i in 0..width {
                let left = if i == 0 { 0 } else { curr[i - 1] } as u32;
                let up = prev[i] as u32;
                let avg = (left + up) / 2;
                curr[i] = residual[i].wrapping_add(avg as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..width {
                let left = if i == 0 { 0 } else { curr[i - 1] as i32 };
                let up = prev[i] as i32;
                let upper_left = if i == 0 { 0 } else { prev[i - 1] as i32 };
                curr[i] = residual[i].wrapping_add(paeth_predictor(left, up, upper_left));
            }
        }
    }

    curr
}

/// Selection heuristic used by [`choose_filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// Sum of residual bytes interpreted as unsigned.
    AbsoluteSum,
    /// Sum of |residual| with residuals interpreted as signed deltas in
    /// [-128, 127].
    SignedDiffSum,
}

fn score(heuristic: Heuristic, residual: &[u8]) -> u64 {
    match heuristic {
        Heuristic::AbsoluteSum => residual.iter().map(|&b| b as u64).sum(),
        Heuristic::SignedDiffSum => residual
            .iter()
            .map(|&b| (b as i8) as i64)
            .map(|v| v.unsigned_abs())
            .sum(),
    }
}

/// Evaluate all five filters on `curr` against `prev` and return the one
/// scoring lowest under `heuristic`, along with its residual. Candidates
/// are evaluated in filter-code order {0,1,2,3,4}; ties favor the lower
/// code. Short-circuits as soon as a zero-score candidate is found.
pub fn choose_filter(heuristic: Heuristic, curr: &[u8], prev: &[u8]) -> (FilterType, Vec<u8>) {
    let mut best_filter = FilterType::None;
    let mut best_residual = apply_filter(FilterType::None, curr, prev);
    let mut best_score = score(heuristic, &best_residual);

    if best_score != 0 {
        for &filter in &FilterType::ALL[1..] {
            let residual = apply_filter(filter, curr, prev);
            let candidate_score = score(heuristic, &residual);
            if candidate_score < best_score {
                best_score = candidate_score;
                best_filter = filter;
                best_residual = residual;
            }
            if best_score == 0 {
                break;
            }
        }
    }

    log::trace!("choose_filter: picked {best_filter:?} (score {best_score}) for a {}-byte scanline", curr.len());

    (best_filter, best_residual)
}
