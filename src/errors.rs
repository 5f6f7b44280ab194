//! Error types for factor construction, evidence and algebra.

use thiserror::Error;

use crate::tables::address_calc::VariableId;

/// Precondition violations detected by factor operations.
///
/// Every fallible operation checks its inputs before touching any state, so a
/// factor is left unchanged when one of these is returned.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactorError {
    /// A selection or query names a variable that is not a dimension of the factor.
    #[error("variable {0} is not a dimension of this factor")]
    UnknownVariable(VariableId),

    /// Two layouts that must agree do not (alignment, identifier count, buffer length).
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An evidence clamp outside `[0, size)`.
    #[error("value {value} is out of range for variable {variable} with {size} states")]
    InvalidSelectionValue {
        variable: VariableId,
        value: usize,
        size: usize,
    },

    /// The same variable is bound to more than one dimension.
    #[error("variable {0} is bound to more than one dimension")]
    DuplicateVariable(VariableId),

    /// A dimension was declared with zero states.
    #[error("dimension {dimension} has no states")]
    EmptyDimension { dimension: usize },

    /// A value buffer is shorter than the table it has to hold.
    #[error("value buffer holds {actual} entries but the table needs {expected}")]
    ValueCount { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, FactorError>;
