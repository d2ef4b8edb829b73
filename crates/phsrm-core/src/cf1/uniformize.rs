//! Uniformization of a CF1 generator.
//!
//! With `qv >= max(rate)`, `P = I + Q / qv` is substochastic: phase `i` stays
//! put with probability `1 - rate[i] / qv` and advances (or, from the last
//! phase, is absorbed) with probability `rate[i] / qv`. Only those jump
//! probabilities are stored; `P` is bidiagonal so one step costs O(n).

use super::validate_rates;
use crate::error::{Cf1Error, Result};

/// Which side of the one-step operator a vector sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Column vector: `y = P x`.
    Forward,
    /// Row vector: `y = x P`.
    Transpose,
}

impl Direction {
    /// The other side.
    pub fn reverse(self) -> Self {
        match self {
            Direction::Forward => Direction::Transpose,
            Direction::Transpose => Direction::Forward,
        }
    }
}

/// Uniformize `rates` in place, replacing each rate by its jump probability
/// `rate / qv`, and return `qv = ufactor * max(rate)`.
pub fn unif_in_place(rates: &mut [f64], ufactor: f64) -> Result<f64> {
    if !(ufactor > 1.0 && ufactor.is_finite()) {
        return Err(Cf1Error::InvalidUniformization { ufactor });
    }
    validate_rates(rates)?;
    let max = rates.iter().cloned().fold(0.0, f64::max);
    let qv = ufactor * max;
    for r in rates.iter_mut() {
        *r /= qv;
    }
    Ok(qv)
}

/// Uniformized one-step operator of a CF1 chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniformized {
    qv: f64,
    jump: Vec<f64>,
}

impl Uniformized {
    /// Uniformize the chain with exit rates `rate`.
    pub fn new(rate: &[f64], ufactor: f64) -> Result<Self> {
        let mut jump = rate.to_vec();
        let qv = unif_in_place(&mut jump, ufactor)?;
        Ok(Self { qv, jump })
    }

    /// Uniformization rate.
    pub fn qv(&self) -> f64 {
        self.qv
    }

    /// Number of phases.
    pub fn phases(&self) -> usize {
        self.jump.len()
    }

    /// Per-phase jump probabilities `rate / qv`.
    pub fn jump(&self) -> &[f64] {
        &self.jump
    }

    /// Apply one step of `P`: `y = P x` (forward) or `y = x P` (transpose).
    ///
    /// `x` and `y` must both hold `phases()` entries.
    pub fn step(&self, direction: Direction, x: &[f64], y: &mut [f64]) {
        let n = self.jump.len();
        debug_assert!(x.len() >= n && y.len() >= n);
        let p = &self.jump;
        match direction {
            Direction::Forward => {
                for i in 0..n - 1 {
                    y[i] = (1.0 - p[i]) * x[i] + p[i] * x[i + 1];
                }
                y[n - 1] = (1.0 - p[n - 1]) * x[n - 1];
            }
            Direction::Transpose => {
                y[0] = (1.0 - p[0]) * x[0];
                for i in 1..n {
                    y[i] = (1.0 - p[i]) * x[i] + p[i - 1] * x[i - 1];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qv_scales_max_rate() {
        let mut rates = vec![1.0, 2.0];
        let qv = unif_in_place(&mut rates, 1.01).unwrap();
        assert!((qv - 2.02).abs() < 1e-15);
        assert!((rates[0] - 1.0 / 2.02).abs() < 1e-15);
        assert!((rates[1] - 2.0 / 2.02).abs() < 1e-15);
    }

    #[test]
    fn rejects_bad_factor_and_rates() {
        let mut rates = vec![1.0];
        assert!(matches!(
            unif_in_place(&mut rates, 1.0),
            Err(Cf1Error::InvalidUniformization { .. })
        ));
        let mut rates = vec![1.0, -3.0];
        assert_eq!(
            unif_in_place(&mut rates, 1.01),
            Err(Cf1Error::InvalidRate { phase: 1, value: -3.0 })
        );
    }

    #[test]
    fn transpose_step_conserves_mass_until_absorption() {
        let chain = Uniformized::new(&[1.0, 2.0, 4.0], 2.0).unwrap();
        let x = [0.2, 0.3, 0.5];
        let mut y = [0.0; 3];
        chain.step(Direction::Transpose, &x, &mut y);
        let lost = x[2] * chain.jump()[2];
        let total: f64 = y.iter().sum();
        assert!((total - (1.0 - lost)).abs() < 1e-15);
    }

    #[test]
    fn forward_and_transpose_are_adjoint() {
        let chain = Uniformized::new(&[0.5, 1.5, 3.0], 1.1).unwrap();
        let u = [0.1, 0.7, 0.2];
        let v = [1.0, -2.0, 0.5];
        let mut pu = [0.0; 3];
        let mut vp = [0.0; 3];
        chain.step(Direction::Forward, &u, &mut pu);
        chain.step(Direction::Transpose, &v, &mut vp);
        let lhs: f64 = v.iter().zip(&pu).map(|(a, b)| a * b).sum();
        let rhs: f64 = vp.iter().zip(&u).map(|(a, b)| a * b).sum();
        assert!((lhs - rhs).abs() < 1e-15);
        assert_eq!(Direction::Forward.reverse(), Direction::Transpose);
    }

    #[test]
    fn single_phase_step() {
        let chain = Uniformized::new(&[3.0], 1.5).unwrap();
        let mut y = [0.0];
        chain.step(Direction::Forward, &[1.0], &mut y);
        assert!((y[0] - (1.0 - 1.0 / 1.5)).abs() < 1e-15);
    }
}
