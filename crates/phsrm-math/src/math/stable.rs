//! Log-factorials for the Poisson and EM kernels.

use std::f64::consts::PI;

/// Below this, `n!` is formed as a product; 19! still rounds by less than
/// one ulp.
const EXACT_BELOW: u64 = 20;

/// log(n!) for a non-negative count.
///
/// Stirling's series past the exact range, truncated after the `n^-7` term.
pub fn log_factorial(n: u64) -> f64 {
    if n < EXACT_BELOW {
        return (2..=n).map(|k| k as f64).product::<f64>().ln();
    }
    let x = n as f64;
    let z = x.recip();
    let z2 = z * z;
    let series = z * (1.0 / 12.0 - z2 * (1.0 / 360.0 - z2 * (1.0 / 1260.0 - z2 / 1680.0)));
    x * x.ln() - x + 0.5 * (2.0 * PI * x).ln() + series
}
