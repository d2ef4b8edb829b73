//! Numerical primitives for phase-type reliability models.

pub mod math;

pub use math::poisson::{pmf, poisson_log_pmf, rightbound};
pub use math::stable::*;
