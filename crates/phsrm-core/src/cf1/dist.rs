//! Density, distribution and sojourn evaluation of CF1 chains.
//!
//! Batches of time points are evaluated by carrying the phase vector
//! `alpha exp(Q s)` from one point to the next, so each step only pays for the
//! increment. The `*_increments` functions take those increments directly;
//! `pdf_at` / `cdf_at` take absolute times in any order.

use super::conv::mexp_conv;
use super::mexp::{mexpv_in_place, Workspace};
use super::poisson::PoissonWeights;
use super::uniformize::{Direction, Uniformized};
use super::{check_len, Cf1Params};
use crate::config::EngineConfig;
use crate::error::{Cf1Error, Result};

/// Fail with `InvalidTime` at the first negative or non-finite entry.
fn validate_times(times: &[f64]) -> Result<()> {
    for (index, &value) in times.iter().enumerate() {
        if !(value >= 0.0 && value.is_finite()) {
            return Err(Cf1Error::InvalidTime { index, value });
        }
    }
    Ok(())
}

/// Walk the carried phase vector across `dx`, handing `f` the vector after
/// each increment.
fn carry(
    params: &Cf1Params,
    dx: &[f64],
    config: &EngineConfig,
    mut f: impl FnMut(&[f64]) -> f64,
) -> Result<Vec<f64>> {
    params.validate()?;
    config.validate()?;
    validate_times(dx)?;

    let chain = Uniformized::new(&params.rate, config.ufactor)?;
    let mut ws = Workspace::new(chain.phases());
    let mut weights = PoissonWeights::new();
    let mut x = params.alpha.clone();
    let mut out = Vec::with_capacity(dx.len());
    for &t in dx {
        weights.prepare(chain.qv() * t, config, 0)?;
        mexpv_in_place(&chain, Direction::Transpose, &weights, &mut x, &mut ws)?;
        out.push(f(&x));
    }
    Ok(out)
}

/// Density at the cumulative times `dx[0], dx[0] + dx[1], ...`.
pub fn pdf_increments(
    params: &Cf1Params,
    dx: &[f64],
    config: &EngineConfig,
    log: bool,
) -> Result<Vec<f64>> {
    let n = params.phases();
    let exit = params.rate.last().copied().unwrap_or(0.0);
    carry(params, dx, config, |x| {
        let density = exit * x[n - 1];
        if log {
            density.ln()
        } else {
            density
        }
    })
}

/// Survival (`lower = false`) or distribution function (`lower = true`) at
/// the cumulative times of `dx`, optionally on the log scale.
pub fn cdf_increments(
    params: &Cf1Params,
    dx: &[f64],
    config: &EngineConfig,
    lower: bool,
    log: bool,
) -> Result<Vec<f64>> {
    carry(params, dx, config, |x| {
        let survival = x.iter().sum::<f64>().clamp(0.0, 1.0);
        match (lower, log) {
            (false, false) => survival,
            (true, false) => 1.0 - survival,
            (false, true) => survival.ln(),
            (true, true) => (-survival).ln_1p(),
        }
    })
}

/// Increments of `times` in ascending order, with the permutation that sorts
/// them.
fn sorted_increments(times: &[f64]) -> Result<(Vec<usize>, Vec<f64>)> {
    validate_times(times)?;
    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by(|&a, &b| times[a].total_cmp(&times[b]));
    let mut prev = 0.0;
    let dx = order
        .iter()
        .map(|&i| {
            let d = times[i] - prev;
            prev = times[i];
            d
        })
        .collect();
    Ok((order, dx))
}

fn unsort(order: &[usize], sorted: Vec<f64>) -> Vec<f64> {
    let mut out = vec![0.0; sorted.len()];
    for (&i, v) in order.iter().zip(sorted) {
        out[i] = v;
    }
    out
}

/// Density at absolute `times`, returned in the caller's order.
pub fn pdf_at(
    times: &[f64],
    params: &Cf1Params,
    config: &EngineConfig,
    log: bool,
) -> Result<Vec<f64>> {
    let (order, dx) = sorted_increments(times)?;
    let values = pdf_increments(params, &dx, config, log)?;
    Ok(unsort(&order, values))
}

/// Survival or distribution function at absolute `times`, returned in the
/// caller's order. See [`cdf_increments`] for the flags.
pub fn cdf_at(
    times: &[f64],
    params: &Cf1Params,
    config: &EngineConfig,
    lower: bool,
    log: bool,
) -> Result<Vec<f64>> {
    let (order, dx) = sorted_increments(times)?;
    let values = cdf_increments(params, &dx, config, lower, log)?;
    Ok(unsort(&order, values))
}

/// Sojourn and transition integrals over `[0, t]` for row vector `f` and
/// column vector `b`.
///
/// Returns `2n` values: `int (f e^{Qs})_i (e^{Q(t-s)} b)_i ds` for each
/// phase, then the phase `i -> i + 1` cross terms (the last slot is zero).
pub fn sojourn(
    params: &Cf1Params,
    f: &[f64],
    b: &[f64],
    t: f64,
    config: &EngineConfig,
) -> Result<Vec<f64>> {
    params.validate()?;
    config.validate()?;
    let n = params.phases();
    check_len("f", n, f.len())?;
    check_len("b", n, b.len())?;
    validate_times(&[t])?;

    let chain = Uniformized::new(&params.rate, config.ufactor)?;
    let mut weights = PoissonWeights::new();
    weights.prepare(chain.qv() * t, config, 1)?;
    let mut ws = Workspace::new(n);
    let mut carried = vec![0.0; n];
    let mut cross = vec![0.0; 2 * n];
    mexp_conv(
        &chain,
        Direction::Transpose,
        &weights,
        f,
        b,
        &mut carried,
        &mut cross,
        &mut ws,
    )?;
    Ok(cross)
}
