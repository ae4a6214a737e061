//! Defines the `Error` type for the potential library, along with the numeric tolerances shared
//! by the factor operations.

use crate::scope::VariableId;

use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, FactorError>;

/// `Factor::normalize_full` leaves a table untouched when its total mass is below this value
pub const NORMALIZATION_EPSILON: f64 = 1e-12;

/// Allowed deviation from 1 of each child block of a conditional probability distribution
pub const CPD_TOLERANCE: f64 = 1e-3;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum FactorError {

    /// The domain is unsorted, contains duplicates, or does not agree with the cardinality
    /// vector or the table size
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// An operation referenced a variable that is absent from the relevant domain
    #[error("variable {0} is not in the domain")]
    VariableNotFound(VariableId),

    /// Two domains (or a domain and an assignment) could not be lined up
    #[error("domain mismatch: {0}")]
    DomainMismatch(String),

    /// An assignment used a state outside of the variable's cardinality
    #[error("state {state} is out of range for variable {variable} with cardinality {cardinality}")]
    InvalidState {
        variable: VariableId,
        state: usize,
        cardinality: usize
    },

    /// A table entry was negative or not finite
    #[error("invalid table value {0}, entries must be finite and non-negative")]
    InvalidValue(f64),

    /// The operation requires a factor with a non-empty domain
    #[error("operation requires a non-empty domain")]
    EmptyDomain,

    /// Exactly what it sounds like
    #[error("encountered division by zero")]
    DivideByZero,

    /// Represents an attempt to build a CPD with an incompatible `Initialization`
    #[error("invalid initialization: {0}")]
    InvalidInitialization(String)

}
