//! Canonicalization of CF1 parameters.
//!
//! Swapping two adjacent phases with rates `r_j > r_{j+1}` leaves the
//! absorption-time law unchanged if the initial mass is rebalanced:
//! with `w = r_{j+1} / r_j`, phase `j` gains `(1 - w) * alpha_{j+1}` and
//! phase `j + 1` keeps `w * alpha_{j+1}`. An insertion sort built from such
//! swaps restores non-decreasing rates.

use super::{check_len, validate_rates};
use crate::error::Result;
use tracing::debug;

/// Sort `rate` into non-decreasing order, rebalancing `alpha` so the
/// represented distribution is unchanged. Returns the number of swaps.
///
/// Already-canonical input is left untouched.
pub fn cf1_sort(alpha: &mut [f64], rate: &mut [f64]) -> Result<usize> {
    validate_rates(rate)?;
    check_len("alpha", rate.len(), alpha.len())?;

    let n = rate.len();
    let mut swaps = 0;
    for i in 0..n - 1 {
        if rate[i] > rate[i + 1] {
            for j in (0..=i).rev() {
                if rate[j] <= rate[j + 1] {
                    break;
                }
                cf1_swap(j, alpha, rate);
                swaps += 1;
            }
        }
    }
    if swaps > 0 {
        debug!(phases = n, swaps, "canonicalized CF1 parameters");
    }
    Ok(swaps)
}

/// Exchange phases `j` and `j + 1`; requires `rate[j] > rate[j + 1]`.
fn cf1_swap(j: usize, alpha: &mut [f64], rate: &mut [f64]) {
    let w = rate[j + 1] / rate[j];
    alpha[j] += (1.0 - w) * alpha[j + 1];
    alpha[j + 1] *= w;
    rate.swap(j, j + 1);
}
