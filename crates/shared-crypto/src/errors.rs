//! Error types for the crypto primitives.

use thiserror::Error;

/// Crypto primitive errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A digest string did not start with `sha256:`.
    #[error("bad digest prefix: {got}")]
    BadDigestPrefix {
        /// The offending string (truncated by the caller if sensitive)
        got: String,
    },

    /// A digest string decoded to the wrong byte length.
    #[error("bad digest length: {len} bytes, expected 32")]
    BadDigestLength {
        /// Decoded length
        len: usize,
    },

    /// An inclusion proof was requested from an empty tree.
    #[error("cannot prove inclusion in an empty tree")]
    EmptyTree,

    /// An inclusion proof was requested for an out-of-range leaf.
    #[error("leaf index {index} out of range: tree has {leaf_count} leaves")]
    LeafIndexOutOfRange {
        /// Requested leaf index
        index: usize,
        /// Number of leaves in the tree
        leaf_count: usize,
    },
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
