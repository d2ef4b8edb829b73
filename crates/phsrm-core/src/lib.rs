//! Phase-type software reliability core.
//!
//! This library provides the numerical engine behind CF1 (canonical form 1)
//! phase-type software reliability growth models:
//! - Uniformization of the CF1 generator and matrix-exponential products
//! - Convolution integrals for EM sufficient statistics
//! - Canonicalization, density/distribution evaluation and sampling
//! - A single EM iteration over grouped or exact fault data
//! - Engine configuration and logging setup
//!
//! Fitting loops, model selection and data ingestion live with the caller.

pub mod cf1;
pub mod config;
pub mod em;
pub mod error;
pub mod logging;

pub use cf1::canonical::cf1_sort;
pub use cf1::conv::mexp_conv;
pub use cf1::dist::{cdf_at, cdf_increments, pdf_at, pdf_increments, sojourn};
pub use cf1::mexp::{mexpv, mexpv_in_place, Workspace};
pub use cf1::poisson::PoissonWeights;
pub use cf1::sample::sample;
pub use cf1::uniformize::{unif_in_place, Direction, Uniformized};
pub use cf1::Cf1Params;
pub use config::EngineConfig;
pub use em::{cf1_emstep, em_step, EmIterate, EmStepResult, FaultData};
pub use error::{Cf1Error, ErrorKind, Result};
