//! Shared error types.

use thiserror::Error;

/// Errors raised by the shared entity layer. All variants are contract
/// violations (class 2): they abort the episode and are never caught inside
/// the kernel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedTypesError {
    /// A parameter record failed validation.
    #[error("invalid parameters: {reason}")]
    InvalidParams {
        /// What was wrong
        reason: String,
    },

    /// Two lattices that must agree in shape did not.
    #[error("lattice shape mismatch: {expected_rows}x{expected_cols} vs {got_rows}x{got_cols}")]
    ShapeMismatch {
        /// Expected row count
        expected_rows: usize,
        /// Expected column count
        expected_cols: usize,
        /// Actual row count
        got_rows: usize,
        /// Actual column count
        got_cols: usize,
    },

    /// A proposer returned zero proposals, violating its contract.
    #[error("empty proposal set: the proposer must emit at least the Stay action")]
    EmptyProposalSet,

    /// A receipt carried an unexpected schema identifier.
    #[error("schema mismatch: expected {expected}, got {got}")]
    SchemaMismatch {
        /// Expected schema id
        expected: String,
        /// Schema id found on the wire
        got: String,
    },
}

/// Result type for shared-type operations.
pub type SharedTypesResult<T> = Result<T, SharedTypesError>;
