//! Truncated Poisson weights for uniformization.
//!
//! Uniformization writes `exp(Qt)` as a Poisson(`qv * t`) mixture of powers of
//! a stochastic matrix. Two primitives make that mixture finite:
//!
//! - [`rightbound`] picks the smallest index `right` whose Poisson tail mass
//!   beyond `right` is at most `eps`.
//! - [`pmf`] fills a buffer with Poisson probabilities over `[left, right]`
//!   and reports the mass it captured.
//!
//! Both work outward from the mode with ratio recurrences, seeding the mode
//! in log space, so means in the thousands neither overflow nor underflow.

use super::stable::log_factorial;

/// Terms smaller than this fraction of the accumulated mass are dropped when
/// summing the far tails in [`rightbound`].
const TAIL_CUTOFF: f64 = 1e-20;

/// Dropped terms also stay this far below the requested tolerance.
const EPS_MARGIN: f64 = 1e-6;

/// Log of the Poisson(`mean`) probability mass at `k`.
///
/// Returns NAN for a negative or NaN mean.
pub fn poisson_log_pmf(k: u64, mean: f64) -> f64 {
    if mean.is_nan() || mean < 0.0 {
        return f64::NAN;
    }
    if mean == 0.0 {
        return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
    }
    if mean.is_infinite() {
        return f64::NEG_INFINITY;
    }
    -mean + (k as f64) * mean.ln() - log_factorial(k)
}

/// Smallest truncation index `right` with `P(N > right) <= eps` for
/// `N ~ Poisson(mean)`.
///
/// Non-decreasing in `mean`, non-increasing in `eps`, and `0` for `mean == 0`.
///
/// # Returns
/// `None` if `mean` is negative or non-finite, or `eps` lies outside `(0, 1)`.
pub fn rightbound(mean: f64, eps: f64) -> Option<usize> {
    if !mean.is_finite() || mean < 0.0 {
        return None;
    }
    if !(eps > 0.0 && eps < 1.0) {
        return None;
    }
    if mean == 0.0 {
        return Some(0);
    }

    let mode = mean.floor() as usize;
    let p_mode = poisson_log_pmf(mode as u64, mean).exp();
    let cutoff = TAIL_CUTOFF.min(eps * EPS_MARGIN);

    // Mass on [0, mode], walking down from the mode.
    let mut lower = p_mode;
    let mut p = p_mode;
    let mut k = mode;
    while k > 0 {
        p *= k as f64 / mean;
        k -= 1;
        lower += p;
        if p < lower * cutoff {
            break;
        }
    }

    // Terms strictly above the mode, kept so every tail can be summed from
    // its far end inward.
    let mut above = Vec::new();
    let mut running = lower;
    let mut p = p_mode;
    let mut k = mode;
    loop {
        k += 1;
        p *= mean / k as f64;
        above.push(p);
        running += p;
        if p < running * cutoff {
            break;
        }
    }
    let upper: f64 = above.iter().rev().sum();

    // Normalizing by the summed mass cancels the rounding in the log-space seed.
    let total = lower + upper;

    // Widen the tail one term at a time from the far end; it never shrinks.
    let mut right = mode + above.len();
    let mut tail = 0.0;
    for (j, &p) in above.iter().enumerate().rev() {
        let widened = tail + p;
        if widened / total > eps {
            return Some(right);
        }
        tail = widened;
        right = mode + j;
    }

    // Large tolerance: the window may end below the mode.
    let mut p = p_mode;
    while right > 0 {
        let widened = tail + p;
        if widened / total > eps {
            break;
        }
        tail = widened;
        p *= right as f64 / mean;
        right -= 1;
    }
    Some(right)
}

/// Fill `weights[0..=right-left]` with Poisson(`mean`) probabilities at indices
/// `left..=right` and return the total mass captured.
///
/// The mode (clamped into the window) is seeded in log space and the rest of
/// the window follows from `p_{k+1} = p_k * mean / (k + 1)` in both directions.
/// Each side is summed from its far end inward so small terms are added first.
///
/// # Returns
/// The captured mass, or NAN if `mean` is negative or non-finite, the window
/// is empty, or `weights` is shorter than the window.
pub fn pmf(mean: f64, left: usize, right: usize, weights: &mut [f64]) -> f64 {
    if !mean.is_finite() || mean < 0.0 || right < left {
        return f64::NAN;
    }
    let width = right - left + 1;
    if weights.len() < width {
        return f64::NAN;
    }
    let buf = &mut weights[..width];

    if mean == 0.0 {
        buf.fill(0.0);
        if left == 0 {
            buf[0] = 1.0;
            return 1.0;
        }
        return 0.0;
    }

    let mode = (mean.floor() as usize).clamp(left, right);
    let m = mode - left;
    buf[m] = poisson_log_pmf(mode as u64, mean).exp();
    for i in (0..m).rev() {
        buf[i] = buf[i + 1] * (left + i + 1) as f64 / mean;
    }
    for i in m + 1..width {
        buf[i] = buf[i - 1] * mean / (left + i) as f64;
    }

    let below: f64 = buf[..m].iter().sum();
    let above: f64 = buf[m..].iter().rev().sum();
    below + above
}
