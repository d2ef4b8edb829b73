//! Canonical form 1 (CF1) phase-type chains.
//!
//! A CF1 chain has `n` transient phases visited in order. Phase `i` is left
//! at rate `rate[i]`, moving to phase `i + 1` or, from the last phase, into
//! absorption. The initial phase is drawn from `alpha`. In canonical form the
//! rates are non-decreasing, which makes the representation unique.
//!
//! Submodules, leaf-first:
//! - [`uniformize`]: generator → stochastic one-step operator plus `qv`
//! - [`poisson`]: truncated Poisson weights for one `(qv, t, eps)` triple
//! - [`mexp`]: `exp(Qt)` applied to a vector
//! - [`conv`]: the convolution integral behind the EM statistics
//! - [`canonical`]: rate sorting with distribution-preserving mass moves
//! - [`dist`]: density, distribution and sojourn evaluation
//! - [`sample`]: random variates

pub mod canonical;
pub mod conv;
pub mod dist;
pub mod mexp;
pub mod poisson;
pub mod sample;
pub mod uniformize;

use crate::error::{Cf1Error, Result};
use serde::{Deserialize, Serialize};

/// Tolerance on `sum(alpha) == 1`.
pub const ALPHA_SUM_TOLERANCE: f64 = 1e-6;

/// Initial distribution and phase rates of a CF1 chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cf1Params {
    /// Initial-phase probabilities (non-negative, summing to 1).
    pub alpha: Vec<f64>,
    /// Exit rate of each phase (positive).
    pub rate: Vec<f64>,
}

impl Cf1Params {
    /// Create validated parameters.
    pub fn new(alpha: Vec<f64>, rate: Vec<f64>) -> Result<Self> {
        let params = Self { alpha, rate };
        params.validate()?;
        Ok(params)
    }

    /// Number of phases.
    pub fn phases(&self) -> usize {
        self.rate.len()
    }

    /// Validate shapes, probabilities and rates.
    pub fn validate(&self) -> Result<()> {
        validate_rates(&self.rate)?;
        validate_alpha(&self.alpha, self.rate.len())
    }

    /// Mean time to absorption: `sum_i alpha_i * sum_{j >= i} 1 / rate_j`.
    pub fn mean(&self) -> f64 {
        let mut remaining = 0.0;
        let mut mean = 0.0;
        for (a, r) in self.alpha.iter().zip(&self.rate).rev() {
            remaining += 1.0 / r;
            mean += a * remaining;
        }
        mean
    }

    /// Whether rates are non-decreasing.
    pub fn is_canonical(&self) -> bool {
        self.rate.windows(2).all(|w| w[0] <= w[1])
    }

    /// Restore canonical ordering in place; returns the number of swaps.
    pub fn canonicalize(&mut self) -> Result<usize> {
        canonical::cf1_sort(&mut self.alpha, &mut self.rate)
    }

    /// Exit vector: zero except `rate[n - 1]` in the last slot.
    pub fn exit_vector(&self) -> Vec<f64> {
        let n = self.rate.len();
        let mut xi = vec![0.0; n];
        if n > 0 {
            xi[n - 1] = self.rate[n - 1];
        }
        xi
    }
}

/// Every rate must be positive and finite, and there must be at least one.
pub fn validate_rates(rate: &[f64]) -> Result<()> {
    if rate.is_empty() {
        return Err(Cf1Error::EmptyInput("rate"));
    }
    for (phase, &value) in rate.iter().enumerate() {
        if !(value > 0.0 && value.is_finite()) {
            return Err(Cf1Error::InvalidRate { phase, value });
        }
    }
    Ok(())
}

/// `alpha` must have `phases` entries in [0, 1] summing to 1.
pub fn validate_alpha(alpha: &[f64], phases: usize) -> Result<()> {
    if alpha.len() != phases {
        return Err(Cf1Error::LengthMismatch {
            what: "alpha",
            expected: phases,
            actual: alpha.len(),
        });
    }
    for (phase, &value) in alpha.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(Cf1Error::InvalidProbability { phase, value });
        }
    }
    let sum: f64 = alpha.iter().sum();
    if (sum - 1.0).abs() > ALPHA_SUM_TOLERANCE {
        return Err(Cf1Error::UnnormalizedAlpha { sum });
    }
    Ok(())
}

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Cf1Error::LengthMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
