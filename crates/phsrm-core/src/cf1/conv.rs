//! Convolution integrals of the uniformized chain.
//!
//! For a row vector `a` and column vector `b` over `[0, t]`:
//!
//! ```text
//! H[i]     = int_0^t (a e^{Qs})_i (e^{Q(t-s)} b)_i     ds
//! H[n + i] = int_0^t (a e^{Qs})_i (e^{Q(t-s)} b)_{i+1} ds   (i < n - 1)
//! ```
//!
//! Uniformization turns the integral into
//! `(1/qv) sum_l w_{l+1} sum_{k=0}^{l} (a P^k) (x) (P^{l-k} b)`.
//! Grouping by `k`, the inner sums over `l` satisfy
//! `B_k = w_{k+1} b + P B_{k+1}`, so one backward pass fills a table of `B_k`
//! and one forward pass over `a P^k` finishes the job in O(right * n).

use super::check_len;
use super::mexp::Workspace;
use super::poisson::PoissonWeights;
use super::uniformize::{Direction, Uniformized};
use crate::error::{ensure_finite, Result};

/// Evaluate `output_a = a exp(Qt)` together with the `2n` convolution
/// statistics of `a` and `b` over `[0, t]`.
///
/// `direction` is the side `input_a` sits on: `Transpose` for a row vector
/// (the usual forward-probability case), `Forward` when `input_a` is a column
/// vector and `input_b` the row vector. The weights must have been prepared
/// with one extra slot past `right`.
#[allow(clippy::too_many_arguments)]
pub fn mexp_conv(
    chain: &Uniformized,
    direction: Direction,
    weights: &PoissonWeights,
    input_a: &[f64],
    input_b: &[f64],
    output_a: &mut [f64],
    cross: &mut [f64],
    ws: &mut Workspace,
) -> Result<()> {
    let n = chain.phases();
    check_len("input_a", n, input_a.len())?;
    check_len("input_b", n, input_b.len())?;
    check_len("output_a", n, output_a.len())?;
    check_len("cross", 2 * n, cross.len())?;

    weights.ensure_window(1)?;
    let right = weights.right();
    let w = weights.values();

    ws.ensure(n);
    ws.ensure_table(right + 1, n);

    // Backward table: row l holds sum_{m >= l} w_{m+1} P^{m-l} b.
    let back = direction.reverse();
    {
        let last = &mut ws.table[right * n..(right + 1) * n];
        for (slot, bv) in last.iter_mut().zip(input_b) {
            *slot = w[right + 1] * bv;
        }
    }
    for l in (0..right).rev() {
        let (head, tail) = ws.table.split_at_mut((l + 1) * n);
        let row = &mut head[l * n..];
        chain.step(back, &tail[..n], row);
        for (slot, bv) in row.iter_mut().zip(input_b) {
            *slot += w[l + 1] * bv;
        }
    }

    output_a.fill(0.0);
    cross.fill(0.0);
    ws.cur.copy_from_slice(input_a);
    for l in 0..=right {
        let table = &ws.table[l * n..(l + 1) * n];
        let cur = &ws.cur;
        for (o, c) in output_a.iter_mut().zip(cur) {
            *o += w[l] * c;
        }
        // The row-vector side supplies phase i, the column side i and i + 1.
        let (row, col) = match direction {
            Direction::Transpose => (&cur[..], table),
            Direction::Forward => (table, &cur[..]),
        };
        for i in 0..n {
            cross[i] += row[i] * col[i];
        }
        for i in 0..n - 1 {
            cross[n + i] += row[i] * col[i + 1];
        }
        if l < right {
            chain.step(direction, &ws.cur, &mut ws.next);
            std::mem::swap(&mut ws.cur, &mut ws.next);
        }
    }

    let total = weights.total();
    for o in output_a.iter_mut() {
        *o /= total;
    }
    let scale = chain.qv() * total;
    for c in cross.iter_mut() {
        *c /= scale;
    }

    ensure_finite(output_a, "mexp_conv output")?;
    ensure_finite(cross, "mexp_conv cross")
}
