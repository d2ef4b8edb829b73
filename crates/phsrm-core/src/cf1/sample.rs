//! Random variates from a CF1 distribution.

use super::Cf1Params;
use crate::error::{Cf1Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Binomial, Distribution, Exp};

/// Draw `n` independent absorption times.
///
/// Start phases are assigned by splitting the `n` draws binomially across
/// phases in order: phase `l` takes a `Binomial(left, alpha_l / remaining)`
/// share of the draws not yet placed, where `remaining` is the initial mass of
/// phases `l..`. The last phase takes whatever is left. Each draw then
/// accumulates one exponential holding time per phase from its start phase to
/// absorption. The result is shuffled so position carries no information
/// about the start phase.
pub fn sample<R: Rng + ?Sized>(n: usize, params: &Cf1Params, rng: &mut R) -> Result<Vec<f64>> {
    params.validate()?;
    let phases = params.phases();
    let mut out = vec![0.0; n];
    let mut started = 0usize;
    let mut remaining = 1.0;

    for (l, (&alpha, &rate)) in params.alpha.iter().zip(&params.rate).enumerate() {
        let p = if l == phases - 1 || remaining <= 0.0 {
            1.0
        } else {
            (alpha / remaining).clamp(0.0, 1.0)
        };
        remaining -= alpha;

        let left = (n - started) as u64;
        let binomial = Binomial::new(left, p)
            .map_err(|_| Cf1Error::InvalidProbability { phase: l, value: p })?;
        started += binomial.sample(rng) as usize;

        let holding = Exp::new(rate).map_err(|_| Cf1Error::InvalidRate { phase: l, value: rate })?;
        for x in &mut out[..started] {
            *x += holding.sample(rng);
        }
    }

    out.shuffle(rng);
    Ok(out)
}
