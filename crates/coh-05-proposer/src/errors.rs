//! Error types for the proposer seam.

use coh_01_fixed_point::FixedPointError;
use coh_02_canonical::CanonicalError;
use coh_03_microstep::MicroStepError;
use shared_crypto::CryptoError;
use shared_types::SharedTypesError;
use thiserror::Error;

/// Proposer-side contract violations.
#[derive(Debug, Error)]
pub enum ProposerError {
    /// Q18 arithmetic failed while scoring.
    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),

    /// A proposal could not be canonicalized for hashing.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    /// Candidate evaluation failed inside the engine preview.
    #[error(transparent)]
    MicroStep(#[from] MicroStepError),

    /// Commitment construction failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Entity-level validation failed.
    #[error(transparent)]
    Shared(#[from] SharedTypesError),

    /// The chosen index does not address a proposal in the set.
    #[error("chosen index {index} out of range: set has {len} proposals")]
    ChosenIndexOutOfRange {
        /// The offending index
        index: u32,
        /// Set size
        len: usize,
    },
}

/// Result type for proposer operations.
pub type ProposerResult<T> = Result<T, ProposerError>;
