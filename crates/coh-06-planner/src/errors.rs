//! Error types for the planner.

use coh_01_fixed_point::FixedPointError;
use coh_02_canonical::CanonicalError;
use coh_03_microstep::MicroStepError;
use shared_crypto::CryptoError;
use shared_types::SharedTypesError;
use thiserror::Error;

/// Planner-side contract violations.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Q18 arithmetic failed while pricing or scoring.
    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),

    /// A plan could not be canonicalized for hashing.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    /// Rollout evaluation failed inside the engine preview.
    #[error(transparent)]
    MicroStep(#[from] MicroStepError),

    /// Plan-set commitment construction failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Entity-level validation failed.
    #[error(transparent)]
    Shared(#[from] SharedTypesError),

    /// Planner configuration is unusable.
    #[error("invalid planner config: {reason}")]
    InvalidConfig {
        /// What was wrong
        reason: String,
    },
}

/// Result type for planner operations.
pub type PlannerResult<T> = Result<T, PlannerError>;
