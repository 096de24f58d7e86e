//! Runtime error types.

use coh_03_microstep::MicroStepError;
use coh_05_proposer::ProposerError;
use coh_06_planner::PlannerError;
use coh_08_retention::RetentionReject;
use shared_types::SharedTypesError;
use thiserror::Error;

/// Episode-fatal errors. The chain tip stays at the last published receipt.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The engine hit a contract violation.
    #[error(transparent)]
    MicroStep(#[from] MicroStepError),

    /// A record digest could not be canonicalized.
    #[error(transparent)]
    Canonical(#[from] coh_02_canonical::CanonicalError),

    /// The proposer hit a contract violation.
    #[error(transparent)]
    Proposer(#[from] ProposerError),

    /// The planner hit a contract violation.
    #[error(transparent)]
    Planner(#[from] PlannerError),

    /// Slab emission was refused.
    #[error("slab emission refused: {0}")]
    Slab(#[from] RetentionReject),

    /// Entity-level validation failed.
    #[error(transparent)]
    Shared(#[from] SharedTypesError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
