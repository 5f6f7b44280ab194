//! Factor algebra for exact junction-tree inference on discrete Bayesian networks.
//!
//! A [`Factor`] is a dense row-major table over discrete variables. Evidence clamps
//! variables to single states, and the algebra (multiplication by a factor over a
//! subset of the variables, summation into one, marginalization) only visits the
//! table entries consistent with the evidence. Every operation has a log-domain
//! counterpart for long inference chains.

pub mod errors;

pub mod tables {
    pub mod address_calc;
    pub mod cut;
    pub mod math_utils;
}

pub mod factors {
    pub mod alignment;
    pub mod factor;
    pub mod options;
}

pub use errors::{FactorError, Result};
pub use factors::{alignment::Alignment, factor::Factor, options::FactorOptions};
pub use tables::{address_calc::VariableId, cut::Cut};
