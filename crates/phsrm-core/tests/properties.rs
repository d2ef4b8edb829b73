//! Property-based tests for CF1 distribution evaluation and canonicalization.

use phsrm_core::{cdf_at, cf1_sort, pdf_at, Cf1Params, EngineConfig};
use proptest::prelude::*;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

/// Random CF1 parameters with 1..=5 phases, rates in [0.1, 10], possibly
/// out of canonical order.
fn arb_params() -> impl Strategy<Value = Cf1Params> {
    (1usize..=5)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(0.01..1.0f64, n),
                prop::collection::vec(0.1..10.0f64, n),
            )
        })
        .prop_map(|(weights, rate)| {
            let total: f64 = weights.iter().sum();
            let alpha = weights.iter().map(|w| w / total).collect();
            Cf1Params { alpha, rate }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Lower and upper tails are complements.
    #[test]
    fn cdf_complement(params in arb_params(), t in 0.0..5.0f64) {
        let config = EngineConfig::default();
        let lower = cdf_at(&[t], &params, &config, true, false).unwrap()[0];
        let upper = cdf_at(&[t], &params, &config, false, false).unwrap()[0];
        prop_assert!(approx_eq(lower + upper, 1.0, 1e-12));
    }

    /// Densities are never negative.
    #[test]
    fn pdf_non_negative(params in arb_params(), times in prop::collection::vec(0.0..10.0f64, 1..20)) {
        let config = EngineConfig::default();
        let pdf = pdf_at(&times, &params, &config, false).unwrap();
        prop_assert_eq!(pdf.len(), times.len());
        for v in pdf {
            prop_assert!(v >= 0.0 && v.is_finite(), "pdf value {}", v);
        }
    }

    /// The distribution function never decreases with time.
    #[test]
    fn cdf_monotone(params in arb_params(), mut times in prop::collection::vec(0.0..10.0f64, 2..20)) {
        times.sort_by(f64::total_cmp);
        let config = EngineConfig::default();
        let cdf = cdf_at(&times, &params, &config, true, false).unwrap();
        for w in cdf.windows(2) {
            prop_assert!(w[1] >= w[0] - 1e-12, "{} then {}", w[0], w[1]);
        }
    }

    /// Sorting twice changes nothing and keeps the mean.
    #[test]
    fn sort_idempotent_and_mean_preserving(params in arb_params()) {
        let mut sorted = params.clone();
        sorted.canonicalize().unwrap();
        prop_assert!(sorted.is_canonical());
        prop_assert!(approx_eq(sorted.mean(), params.mean(), 1e-10));
        prop_assert!(sorted.alpha.iter().all(|&a| a >= 0.0));

        let mut again = sorted.clone();
        let swaps = cf1_sort(&mut again.alpha, &mut again.rate).unwrap();
        prop_assert_eq!(swaps, 0);
        prop_assert_eq!(again, sorted);
    }

    /// Sorting keeps the whole distribution, not only the mean.
    #[test]
    fn sort_preserves_cdf(params in arb_params(), t in 0.0..5.0f64) {
        let config = EngineConfig::default();
        let mut sorted = params.clone();
        sorted.canonicalize().unwrap();
        let before = cdf_at(&[t], &params, &config, false, false).unwrap()[0];
        let after = cdf_at(&[t], &sorted, &config, false, false).unwrap()[0];
        prop_assert!(approx_eq(before, after, 1e-6), "{} vs {}", before, after);
    }
}
