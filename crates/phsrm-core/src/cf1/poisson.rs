//! Reusable truncated Poisson weight buffer.

use crate::config::EngineConfig;
use crate::error::{Cf1Error, Result};
use phsrm_math::{pmf, rightbound};
use tracing::{trace, warn};

/// Poisson(`mean`) probabilities on `[0, right + extra]` for one
/// `(qv, t, eps)` triple.
///
/// `right` is the truncation index chosen for `eps`; `extra` trailing slots
/// hold the weights the convolution needs one index past `right`. The buffer
/// is refilled for every evaluation and never reused across time points.
#[derive(Debug, Clone, Default)]
pub struct PoissonWeights {
    mean: f64,
    right: usize,
    total: f64,
    values: Vec<f64>,
}

impl PoissonWeights {
    /// Empty buffer; call [`PoissonWeights::prepare`] before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the window and weights for `mean = qv * t`.
    pub fn prepare(&mut self, mean: f64, config: &EngineConfig, extra: usize) -> Result<()> {
        if !mean.is_finite() || mean < 0.0 {
            return Err(Cf1Error::NonFinite {
                context: "poisson mean",
                index: 0,
            });
        }
        let overflow = Cf1Error::TruncationOverflow {
            mean,
            eps: config.eps,
            ceiling: config.max_right,
        };
        // The window always reaches the mode, so a mean past the ceiling
        // cannot fit.
        if mean > config.max_right as f64 {
            return Err(overflow);
        }
        let right = rightbound(mean, config.eps)
            .ok_or(Cf1Error::InvalidTolerance { eps: config.eps })?;
        if right > config.max_right {
            return Err(overflow);
        }

        let len = right + extra + 1;
        self.values.clear();
        self.values.resize(len, 0.0);
        let captured = pmf(mean, 0, right + extra, &mut self.values);
        if !captured.is_finite() {
            return Err(Cf1Error::NonFinite {
                context: "poisson weights",
                index: right,
            });
        }
        let total: f64 = self.values[..=right].iter().sum();
        if !(total > 0.0) {
            return Err(Cf1Error::NonFinite {
                context: "poisson weights",
                index: 0,
            });
        }
        if total < 1.0 - config.eps - 1e-9 {
            warn!(mean, right, total, eps = config.eps, "truncated Poisson weight below 1 - eps");
        }
        trace!(mean, right, total, "poisson window");

        self.mean = mean;
        self.right = right;
        self.total = total;
        Ok(())
    }

    /// Poisson mean the buffer was prepared for.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Truncation index.
    pub fn right(&self) -> usize {
        self.right
    }

    /// Captured mass on `[0, right]`.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Weights on `[0, right + extra]`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Fail unless the buffer covers `[0, right + extra]`.
    pub(crate) fn ensure_window(&self, extra: usize) -> Result<()> {
        let expected = self.right + 1 + extra;
        if self.values.len() < expected {
            return Err(Cf1Error::LengthMismatch {
                what: "poisson weights",
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepares_window_and_extra_slot() {
        let config = EngineConfig::default();
        let mut weights = PoissonWeights::new();
        weights.prepare(2.02, &config, 1).unwrap();
        assert_eq!(weights.right(), rightbound(2.02, 1e-8).unwrap());
        assert_eq!(weights.values().len(), weights.right() + 2);
        assert!(weights.total() >= 1.0 - 1e-8);
        assert!(weights.values()[weights.right() + 1] > 0.0);
        assert_eq!(weights.mean(), 2.02);
    }

    #[test]
    fn zero_mean_is_identity_window() {
        let mut weights = PoissonWeights::new();
        weights.prepare(0.0, &EngineConfig::default(), 0).unwrap();
        assert_eq!(weights.right(), 0);
        assert_eq!(weights.values(), &[1.0]);
        assert_eq!(weights.total(), 1.0);
    }

    #[test]
    fn refill_shrinks_buffer() {
        let config = EngineConfig::default();
        let mut weights = PoissonWeights::new();
        weights.prepare(100.0, &config, 0).unwrap();
        let long = weights.values().len();
        weights.prepare(1.0, &config, 0).unwrap();
        assert!(weights.values().len() < long);
    }

    #[test]
    fn ceiling_is_enforced() {
        let config = EngineConfig::default().with_max_right(50);
        let mut weights = PoissonWeights::new();
        let err = weights.prepare(45.0, &config, 0).unwrap_err();
        assert!(matches!(err, Cf1Error::TruncationOverflow { ceiling: 50, .. }));
        let err = weights.prepare(1e6, &config, 0).unwrap_err();
        assert!(matches!(err, Cf1Error::TruncationOverflow { .. }));
    }

    #[test]
    fn rejects_non_finite_mean() {
        let mut weights = PoissonWeights::new();
        let err = weights
            .prepare(f64::NAN, &EngineConfig::default(), 0)
            .unwrap_err();
        assert!(matches!(err, Cf1Error::NonFinite { .. }));
    }
}
