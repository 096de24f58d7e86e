//! Error types for Q18 arithmetic.

use thiserror::Error;

/// Q18 arithmetic errors. All variants are contract violations that abort
/// the current episode; they are never recorded inside a receipt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixedPointError {
    /// Result does not fit the signed 64-bit Q18 domain.
    #[error("Q18 overflow in {op}({a}, {b})")]
    Overflow {
        /// Operation name (`"q_add"`, `"q_mul"`, ...)
        op: &'static str,
        /// Left operand
        a: i64,
        /// Right operand
        b: i64,
    },

    /// Division by zero.
    #[error("Q18 division by zero: {a} / 0")]
    DivisionByZero {
        /// Dividend
        a: i64,
    },

    /// Square root of a negative value.
    #[error("Q18 square root of negative value: {a}")]
    NegativeSqrt {
        /// Offending operand
        a: i64,
    },
}

/// Result type for Q18 operations.
pub type FixedPointResult<T> = Result<T, FixedPointError>;
