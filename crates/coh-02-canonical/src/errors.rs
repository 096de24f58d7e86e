//! Error types for canonical serialization.

use thiserror::Error;

/// Canonicalization errors. Both variants are contract violations.
#[derive(Debug, Error)]
pub enum CanonicalError {
    /// A float reached a canonical path. The path is a JSON pointer into the
    /// offending structure (e.g. `/kkt/stationarity_theta_q`).
    #[error("float in canonical path {path}: quantize to Q18 before hashing")]
    FloatInCanonical {
        /// JSON pointer to the offending value
        path: String,
    },

    /// The value could not be serialized at all.
    #[error("canonical serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for canonicalization.
pub type CanonicalResult<T> = Result<T, CanonicalError>;
