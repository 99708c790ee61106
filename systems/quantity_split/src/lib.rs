#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Splits a license total into three distinct quantities.
//!
//! The split is built directly instead of by rejection sampling. For a
//! strictly increasing triple `a < b < c` summing to `total` with
//! `c - a <= max_gap`, the smallest value satisfies `1 <= a <= (total - 3) / 3`
//! and the middle value is bounded by
//! `max(a + 1, total - 2a - max_gap) <= b <= (total - a - 1) / 2`.
//! The lower bound of that window falls by two per step of `a` while the upper
//! bound falls by at most one, so the admissible `a` form one contiguous range
//! ending at `(total - 3) / 3`. Its start is found by binary search; `a` is then
//! drawn uniformly from the range and `b` uniformly inside its window. No
//! retries happen, so an empty range is reported as [`ConstraintUnsatisfiable`]
//! right away.

use rand::Rng;
use samgen_core::{ConfigurationError, ConstraintUnsatisfiable, GenerationError};

/// Gap bound applied when the caller does not configure one.
pub const DEFAULT_MAX_GAP: u32 = 5;

/// Returns three strictly increasing positive quantities summing to `total`.
///
/// Fails with [`ConfigurationError::TotalTooSmall`] when `total < 3` and with
/// [`ConstraintUnsatisfiable`] when no triple fits inside `max_gap`.
pub fn generate_distinct_numbers_with_constraints<R: Rng + ?Sized>(
    total: u32,
    max_gap: u32,
    rng: &mut R,
) -> Result<(u32, u32, u32), GenerationError> {
    if total < 3 {
        return Err(ConfigurationError::TotalTooSmall { total }.into());
    }

    let largest_smallest = (total - 3) / 3;
    let Some(least_smallest) = least_smallest(total, max_gap, largest_smallest) else {
        return Err(ConstraintUnsatisfiable { total, max_gap }.into());
    };

    let smallest = rng.gen_range(least_smallest..=largest_smallest);
    let (lo, hi) = middle_window(total, max_gap, smallest);
    let middle = rng.gen_range(lo..=hi);
    let largest = total - smallest - middle;
    Ok((smallest, middle, largest))
}

/// Inclusive bounds for the middle value; empty when `lo > hi`.
fn middle_bounds(total: u32, max_gap: u32, smallest: u32) -> (i64, i64) {
    let total = i64::from(total);
    let a = i64::from(smallest);
    let lo = (a + 1).max(total - 2 * a - i64::from(max_gap));
    let hi = (total - a - 1) / 2;
    (lo, hi)
}

fn middle_window(total: u32, max_gap: u32, smallest: u32) -> (u32, u32) {
    let (lo, hi) = middle_bounds(total, max_gap, smallest);
    // Both bounds lie in (smallest, total) for an admissible smallest value.
    (lo as u32, hi as u32)
}

fn admissible(total: u32, max_gap: u32, smallest: u32) -> bool {
    let (lo, hi) = middle_bounds(total, max_gap, smallest);
    lo <= hi
}

/// First admissible smallest value in `1..=largest`, if any.
fn least_smallest(total: u32, max_gap: u32, largest: u32) -> Option<u32> {
    if largest == 0 || !admissible(total, max_gap, largest) {
        return None;
    }
    let (mut lo, mut hi) = (1, largest);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if admissible(total, max_gap, mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Some(lo)
}
