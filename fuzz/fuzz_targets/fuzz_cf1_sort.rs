//! Fuzz target for CF1 canonicalization.
//!
//! Arbitrary (possibly invalid) phase vectors must either be rejected or come
//! back sorted with non-negative initial mass.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use phsrm_core::cf1_sort;

#[derive(Debug, Arbitrary)]
struct Input {
    alpha: Vec<f64>,
    rate: Vec<f64>,
}

fuzz_target!(|input: Input| {
    let Input {
        mut alpha,
        mut rate,
    } = input;
    if rate.len() > 64 {
        return;
    }
    let nonneg = alpha.iter().all(|&a| a >= 0.0);
    if let Ok(_swaps) = cf1_sort(&mut alpha, &mut rate) {
        assert!(rate.windows(2).all(|w| w[0] <= w[1]));
        if nonneg {
            assert!(alpha.iter().all(|&a| a >= 0.0 || a.is_nan()));
        }
    }
});
