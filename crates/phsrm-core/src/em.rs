//! One EM iteration for CF1 software reliability growth models.
//!
//! The fault-detection process is a non-homogeneous Poisson process whose
//! mean value function is `omega * F(t)`, with `F` a CF1 distribution. Data
//! arrive as consecutive intervals of length `time[k]` with `fault[k]` faults
//! detected inside the interval and, when `kind[k] == 1`, one more fault
//! detected exactly at its right end.
//!
//! The E-step runs one forward sweep (phase probabilities at every interval
//! boundary) and one backward sweep (expected future contributions), then
//! gathers sojourn and transition expectations through the convolution
//! evaluator. The M-step is closed form. The loop, convergence checks and
//! restarts belong to the caller.

use crate::cf1::canonical::cf1_sort;
use crate::cf1::conv::mexp_conv;
use crate::cf1::mexp::{mexpv, Workspace};
use crate::cf1::poisson::PoissonWeights;
use crate::cf1::uniformize::{Direction, Uniformized};
use crate::cf1::Cf1Params;
use crate::config::EngineConfig;
use crate::error::{ensure_finite, Cf1Error, Result};
use phsrm_math::log_factorial;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Grouped or exact fault-detection data as three aligned sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultData {
    time: Vec<f64>,
    fault: Vec<u64>,
    kind: Vec<u8>,
}

impl FaultData {
    /// Validated records: interval lengths, fault counts, and end-point flags.
    pub fn new(time: Vec<f64>, fault: Vec<u64>, kind: Vec<u8>) -> Result<Self> {
        let data = Self { time, fault, kind };
        data.validate()?;
        Ok(data)
    }

    /// Grouped counts over consecutive unit intervals.
    pub fn from_counts(fault: Vec<u64>) -> Result<Self> {
        let len = fault.len();
        Self::new(vec![1.0; len], fault, vec![0; len])
    }

    /// Exact detection times (any order); each becomes a type-1 record.
    pub fn from_failure_times(times: &[f64]) -> Result<Self> {
        for (index, &value) in times.iter().enumerate() {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(Cf1Error::InvalidTime { index, value });
            }
        }
        let mut sorted = times.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mut prev = 0.0;
        let time = sorted
            .iter()
            .map(|&t| {
                let dx = t - prev;
                prev = t;
                dx
            })
            .collect();
        Self::new(time, vec![0; times.len()], vec![1; times.len()])
    }

    /// Check shapes and domains.
    pub fn validate(&self) -> Result<()> {
        if self.time.is_empty() {
            return Err(Cf1Error::EmptyInput("fault data"));
        }
        let len = self.time.len();
        if self.fault.len() != len {
            return Err(Cf1Error::LengthMismatch {
                what: "fault",
                expected: len,
                actual: self.fault.len(),
            });
        }
        if self.kind.len() != len {
            return Err(Cf1Error::LengthMismatch {
                what: "kind",
                expected: len,
                actual: self.kind.len(),
            });
        }
        for (index, &value) in self.time.iter().enumerate() {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(Cf1Error::InvalidTime { index, value });
            }
        }
        for (index, &value) in self.kind.iter().enumerate() {
            if value > 1 {
                return Err(Cf1Error::InvalidFaultType { index, value });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn fault(&self) -> &[u64] {
        &self.fault
    }

    pub fn kind(&self) -> &[u8] {
        &self.kind
    }

    /// Faults detected inside intervals plus those detected at end points.
    pub fn total_faults(&self) -> u64 {
        self.fault.iter().sum::<u64>() + self.kind.iter().map(|&k| u64::from(k)).sum::<u64>()
    }

    /// Length of the observation window.
    pub fn total_time(&self) -> f64 {
        self.time.iter().sum()
    }
}

/// Model parameters carried between EM iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmIterate {
    /// Expected total number of faults.
    pub omega: f64,
    pub alpha: Vec<f64>,
    pub rate: Vec<f64>,
}

impl EmIterate {
    pub fn new(omega: f64, alpha: Vec<f64>, rate: Vec<f64>) -> Result<Self> {
        let iterate = Self { omega, alpha, rate };
        iterate.validate()?;
        Ok(iterate)
    }

    /// Combine a fault total with CF1 parameters.
    pub fn from_params(omega: f64, params: Cf1Params) -> Result<Self> {
        Self::new(omega, params.alpha, params.rate)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.omega > 0.0 && self.omega.is_finite()) {
            return Err(Cf1Error::InvalidOmega { value: self.omega });
        }
        crate::cf1::validate_rates(&self.rate)?;
        crate::cf1::validate_alpha(&self.alpha, self.rate.len())
    }

    /// The CF1 part of the iterate.
    pub fn params(&self) -> Cf1Params {
        Cf1Params {
            alpha: self.alpha.clone(),
            rate: self.rate.clone(),
        }
    }

    fn minus(&self, other: &EmIterate) -> EmIterate {
        EmIterate {
            omega: self.omega - other.omega,
            alpha: difference(&self.alpha, &other.alpha),
            rate: difference(&self.rate, &other.rate),
        }
    }
}

fn difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Outcome of [`em_step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmStepResult {
    /// Updated parameters in canonical order.
    pub params: EmIterate,
    /// Componentwise `params - previous`.
    pub pdiff: EmIterate,
    /// Log-likelihood of the data under the previous parameters.
    pub llf: f64,
    /// Expected total fault count after the update (`params.omega`).
    pub total: f64,
}

/// One EM iteration: updated `(omega, alpha, rate)` and the log-likelihood
/// of `data` under the *input* parameters.
///
/// The updated rates are not re-sorted; see [`em_step`].
pub fn cf1_emstep(
    iterate: &EmIterate,
    data: &FaultData,
    config: &EngineConfig,
) -> Result<(EmIterate, f64)> {
    iterate.validate()?;
    data.validate()?;
    config.validate()?;

    let n = iterate.rate.len();
    let records = data.len();
    let omega = iterate.omega;
    let alpha = &iterate.alpha;
    let rate = &iterate.rate;
    let exit = rate[n - 1];

    let chain = Uniformized::new(rate, config.ufactor)?;
    let qv = chain.qv();
    let mut ws = Workspace::new(n);
    let mut weights = PoissonWeights::new();

    // Forward sweep: vf[k] = alpha exp(Q s_k).
    let mut vf = vec![vec![0.0; n]; records + 1];
    vf[0].copy_from_slice(alpha);
    let mut coef = vec![0.0; records];
    let mut dens = vec![0.0; records];
    let mut llf = 0.0;
    let mut detected = 0.0;
    for k in 0..records {
        weights.prepare(qv * data.time[k], config, 0)?;
        let (head, tail) = vf.split_at_mut(k + 1);
        mexpv(&chain, Direction::Transpose, &weights, &head[k], &mut tail[0], &mut ws)?;

        let x = data.fault[k];
        if x > 0 {
            let before: f64 = head[k].iter().sum();
            let after: f64 = tail[0].iter().sum();
            let mass = before - after;
            if !(mass > 0.0) {
                return Err(Cf1Error::ZeroProbability { index: k, value: mass });
            }
            let x = x as f64;
            llf += x * (omega * mass).ln() - log_factorial(data.fault[k]);
            coef[k] = x / mass;
            detected += x;
        }
        if data.kind[k] == 1 {
            let density = exit * tail[0][n - 1];
            if !(density > 0.0) {
                return Err(Cf1Error::ZeroProbability { index: k, value: density });
            }
            llf += (omega * density).ln();
            dens[k] = 1.0 / density;
            detected += 1.0;
        }
    }
    let initial: f64 = alpha.iter().sum();
    let survival: f64 = vf[records].iter().sum();
    llf -= omega * (initial - survival);
    let new_omega = detected + omega * survival;

    // Backward sweep: beta[m] = E[future contribution | phase at s_m], with
    // convolution statistics of each interval gathered on the way.
    let mut beta = vec![0.0; n];
    let mut beta_next = vec![0.0; n];
    let mut carried = vec![0.0; n];
    let mut cross = vec![0.0; 2 * n];
    let mut conv_sum = vec![0.0; 2 * n];
    for m in (0..=records).rev() {
        let c_next = if m == records { omega } else { coef[m] };
        let c_prev = if m == 0 { 0.0 } else { coef[m - 1] };
        let d = if m == 0 { 0.0 } else { dens[m - 1] };

        if m < records {
            weights.prepare(qv * data.time[m], config, 1)?;
            mexp_conv(
                &chain,
                Direction::Transpose,
                &weights,
                &vf[m],
                &beta_next,
                &mut carried,
                &mut cross,
                &mut ws,
            )?;
            for (s, c) in conv_sum.iter_mut().zip(&cross) {
                *s += c;
            }
            mexpv(&chain, Direction::Forward, &weights, &beta_next, &mut beta, &mut ws)?;
        } else {
            beta.fill(0.0);
        }
        for b in beta.iter_mut() {
            *b += c_next - c_prev;
        }
        beta[n - 1] += d * exit;
        std::mem::swap(&mut beta, &mut beta_next);
    }
    let beta0 = beta_next;

    // Expected number of starts in each phase.
    let eb: Vec<f64> = alpha.iter().zip(&beta0).map(|(a, b)| a * b).collect();
    let eb_total: f64 = eb.iter().sum();
    if !(eb_total > 0.0 && eb_total.is_finite()) {
        return Err(Cf1Error::NonFinite {
            context: "expected initial counts",
            index: 0,
        });
    }

    // Occupancy from the survival terms: z = acc (-Q)^{-1}.
    let mut acc: Vec<f64> = vf[records].iter().map(|v| omega * v).collect();
    for k in 0..records {
        if coef[k] != 0.0 {
            for i in 0..n {
                acc[i] += coef[k] * (vf[k][i] - vf[k + 1][i]);
            }
        }
    }
    let mut z = vec![0.0; n];
    for i in 0..n {
        let inflow = if i == 0 { 0.0 } else { z[i - 1] * rate[i - 1] };
        z[i] = (acc[i] + inflow) / rate[i];
    }

    let end_points: f64 = data.kind.iter().map(|&k| f64::from(k)).sum();
    let mut new_rate = vec![0.0; n];
    for i in 0..n {
        let sojourn = z[i] + conv_sum[i];
        if !(sojourn > 0.0) {
            return Err(Cf1Error::DegenerateSojourn {
                phase: i,
                value: sojourn,
            });
        }
        let exits = if i < n - 1 {
            rate[i] * (z[i] + conv_sum[n + i])
        } else {
            rate[i] * z[i] + end_points
        };
        new_rate[i] = exits / sojourn;
    }
    ensure_finite(&new_rate, "updated rates")?;

    let new_alpha = eb.iter().map(|&e| e.max(0.0) / eb_total).collect();
    Ok((
        EmIterate {
            omega: new_omega,
            alpha: new_alpha,
            rate: new_rate,
        },
        llf,
    ))
}

/// [`cf1_emstep`] followed by canonicalization of the updated parameters.
pub fn em_step(iterate: &EmIterate, data: &FaultData, config: &EngineConfig) -> Result<EmStepResult> {
    let (mut next, llf) = cf1_emstep(iterate, data, config)?;
    let swaps = cf1_sort(&mut next.alpha, &mut next.rate)?;
    debug!(
        llf,
        omega = next.omega,
        phases = next.rate.len(),
        swaps,
        "EM step"
    );
    let pdiff = next.minus(iterate);
    let total = next.omega;
    Ok(EmStepResult {
        params: next,
        pdiff,
        llf,
        total,
    })
}
