//! Error types for the micro-step engine.

use coh_01_fixed_point::FixedPointError;
use coh_02_canonical::CanonicalError;
use shared_types::{KktResidual, SharedTypesError};
use thiserror::Error;

/// Micro-step engine errors. Every variant is a contract violation: the
/// episode aborts and the chain tip stays at the last successful receipt.
#[derive(Debug, Error)]
pub enum MicroStepError {
    /// Q18 arithmetic failed (overflow, division by zero).
    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),

    /// A hashed structure could not be canonicalized.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    /// Shape or parameter validation failed.
    #[error(transparent)]
    Shared(#[from] SharedTypesError),

    /// A lattice-wide accumulation left the 64-bit domain.
    #[error("integer overflow in {what}")]
    Overflow {
        /// Which accumulation overflowed
        what: &'static str,
    },

    /// The post-step state carried a non-zero feasibility residual. The
    /// projection guarantees this never fires; firing means corrupted state.
    #[error("KKT feasibility residual non-zero after projection: {kkt:?}")]
    KktFeasibilityNonzero {
        /// The offending residuals
        kkt: KktResidual,
    },
}

/// Result type for micro-step operations.
pub type MicroStepResult<T> = Result<T, MicroStepError>;
