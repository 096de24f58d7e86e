//! Error types for skill options.

use coh_03_microstep::MicroStepError;
use coh_05_proposer::ProposerError;
use shared_types::SharedTypesError;
use thiserror::Error;

/// Option-layer contract violations.
#[derive(Debug, Error)]
pub enum OptionError {
    /// No option registered under this id.
    #[error("unknown option: {id}")]
    UnknownOption {
        /// Requested option id
        id: String,
    },

    /// The initiation predicate refused the current state.
    #[error("option {id} not initiable in the current state")]
    NotInitiable {
        /// Refusing option id
        id: String,
    },

    /// An internal step failed in the engine.
    #[error(transparent)]
    MicroStep(#[from] MicroStepError),

    /// Internal proposal construction failed.
    #[error(transparent)]
    Proposer(#[from] ProposerError),

    /// Entity-level validation failed.
    #[error(transparent)]
    Shared(#[from] SharedTypesError),
}

/// Result type for option operations.
pub type OptionResult<T> = Result<T, OptionError>;
