//! Matrix-exponential-vector products by uniformization.
//!
//! `exp(Qt) x = sum_k w_k P^k x` with `w_k` the Poisson(`qv * t`) weights.
//! The sum is truncated at `right` and rescaled by the captured weight.

use super::check_len;
use super::poisson::PoissonWeights;
use super::uniformize::{Direction, Uniformized};
use crate::error::{ensure_finite, Result};

/// Caller-owned scratch space for [`mexpv`] and [`mexp_conv`](super::conv::mexp_conv).
///
/// Buffers grow on demand and are reused across calls; nothing inside the
/// engine allocates per term.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub(crate) cur: Vec<f64>,
    pub(crate) next: Vec<f64>,
    pub(crate) table: Vec<f64>,
}

impl Workspace {
    /// Workspace sized for an `n`-phase chain.
    pub fn new(n: usize) -> Self {
        let mut ws = Self::default();
        ws.ensure(n);
        ws
    }

    /// Size the running vectors for `n` phases.
    pub fn ensure(&mut self, n: usize) {
        self.cur.resize(n, 0.0);
        self.next.resize(n, 0.0);
    }

    /// Grow the convolution table to at least `rows * n` entries.
    pub fn ensure_table(&mut self, rows: usize, n: usize) {
        let len = rows * n;
        if self.table.len() < len {
            self.table.resize(len, 0.0);
        }
    }
}

/// `output = exp(Qt) input` (forward) or `input exp(Qt)` (transpose), with
/// `t = weights.mean() / chain.qv()`.
///
/// Always starts from `input`; nothing carries over from a previous call.
pub fn mexpv(
    chain: &Uniformized,
    direction: Direction,
    weights: &PoissonWeights,
    input: &[f64],
    output: &mut [f64],
    ws: &mut Workspace,
) -> Result<()> {
    let n = chain.phases();
    check_len("input", n, input.len())?;
    check_len("output", n, output.len())?;
    weights.ensure_window(0)?;
    ws.ensure(n);
    ws.cur.copy_from_slice(input);
    accumulate(chain, direction, weights, ws, output);
    ensure_finite(output, "mexpv")
}

/// [`mexpv`] overwriting `x` with the result.
///
/// Used to carry a phase vector across increasing time points: each call
/// advances `x` by the interval the weights were prepared for.
pub fn mexpv_in_place(
    chain: &Uniformized,
    direction: Direction,
    weights: &PoissonWeights,
    x: &mut [f64],
    ws: &mut Workspace,
) -> Result<()> {
    let n = chain.phases();
    check_len("vector", n, x.len())?;
    weights.ensure_window(0)?;
    ws.ensure(n);
    ws.cur.copy_from_slice(x);
    accumulate(chain, direction, weights, ws, x);
    ensure_finite(x, "mexpv")
}

/// Sum `w_k P^k cur` into `out`; `ws.cur` holds the starting vector and the
/// weights cover `[0, right]`.
fn accumulate(
    chain: &Uniformized,
    direction: Direction,
    weights: &PoissonWeights,
    ws: &mut Workspace,
    out: &mut [f64],
) {
    let w = weights.values();
    let right = weights.right();

    for (o, c) in out.iter_mut().zip(&ws.cur) {
        *o = w[0] * c;
    }
    for &wk in &w[1..=right] {
        chain.step(direction, &ws.cur, &mut ws.next);
        std::mem::swap(&mut ws.cur, &mut ws.next);
        for (o, c) in out.iter_mut().zip(&ws.cur) {
            *o += wk * c;
        }
    }

    let total = weights.total();
    for o in out.iter_mut() {
        *o /= total;
    }
}
