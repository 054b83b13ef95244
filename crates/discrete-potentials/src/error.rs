//! Error types for potential operations.

use thiserror::Error;

/// Errors that can occur in potential operations.
///
/// Out-of-range coordinates handed to the addressing primitives are not
/// represented here: they are programmer errors and panic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PotentialError {
    /// Operand is not a dense table over finite-discrete variables
    #[error("Unsupported operation: {operation} can only manage dense tables over finite-state variables, found {found}")]
    UnsupportedType { operation: String, found: String },

    /// Normalizing a block (or table) whose values sum to zero
    #[error("Null vector: {0}")]
    NullVector(String),

    /// Value table does not match the variables' state counts
    #[error("Dimension mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch { expected: Vec<usize>, got: Vec<usize> },

    /// The same variable appears twice in a table
    #[error("Duplicate variable: {0}")]
    DuplicateVariable(String),

    /// Variable not found in a potential
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// State index beyond a variable's state count
    #[error("State {state} out of range for variable {variable} with {num_states} states")]
    StateOutOfRange {
        variable: String,
        state: usize,
        num_states: usize,
    },

    /// Two variable lists were expected to hold the same variables
    #[error("Variable mismatch: {0}")]
    VariableMismatch(String),

    /// Kept and eliminated variables overlap
    #[error("Invalid partition: {0}")]
    InvalidPartition(String),

    /// A state order is not a permutation of the variable's states
    #[error("Invalid state order: {0}")]
    InvalidStateOrder(String),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PotentialError {
    pub(crate) fn unsupported(operation: &str, found: impl Into<String>) -> Self {
        Self::UnsupportedType {
            operation: operation.to_string(),
            found: found.into(),
        }
    }
}

/// Result type for potential operations.
pub type Result<T> = std::result::Result<T, PotentialError>;
