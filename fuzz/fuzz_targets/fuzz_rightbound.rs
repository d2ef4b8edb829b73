//! Fuzz target for the Poisson truncation bound.
//!
//! Any accepted `(mean, eps)` pair must yield a window that can be filled.

#![no_main]

use libfuzzer_sys::fuzz_target;
use phsrm_math::{pmf, rightbound};

fuzz_target!(|input: (f64, f64)| {
    let (mean, eps) = input;
    if mean > 1.0e5 {
        return;
    }
    if let Some(right) = rightbound(mean, eps) {
        let mut buf = vec![0.0; right + 1];
        let captured = pmf(mean, 0, right, &mut buf);
        assert!(captured.is_finite());
    }
});
