//! Replay error types.

use coh_02_canonical::CanonicalError;
use kernel_runtime::RuntimeError;
use shared_types::SharedTypesError;
use thiserror::Error;

/// Verification failures. `Divergence` is the falsification verdict; the
/// rest are contract violations of the verifier's own inputs.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Recomputation produced a different value for a receipt field.
    #[error("replay divergence at step {step}, field {field}: expected {expected_hex}, got {actual_hex}")]
    Divergence {
        /// Tick index of the first mismatch.
        step: usize,
        /// Name of the first divergent field.
        field: String,
        /// Canonical bytes the record carries, hex-prefixed.
        expected_hex: String,
        /// Canonical bytes the replay produced, hex-prefixed.
        actual_hex: String,
    },

    /// A receipt's `chain_prev` does not link to its predecessor.
    #[error("broken chain linkage at receipt {index}")]
    BrokenChain {
        /// Index of the unlinked receipt.
        index: usize,
    },

    /// The replayed episode could not run at all.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A receipt could not be canonicalized for comparison.
    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    /// Schema validation failed.
    #[error(transparent)]
    Shared(#[from] SharedTypesError),
}

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;
