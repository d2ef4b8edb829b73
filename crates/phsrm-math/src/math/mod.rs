//! Core math modules.

pub mod poisson;
pub mod stable;
