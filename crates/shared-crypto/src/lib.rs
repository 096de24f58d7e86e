//! # Shared Crypto - Hashing, Chain Linkage, Merkle Proofs, Deterministic PRNG
//!
//! **Status:** Production-Ready
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Content digests, `sha256:` text form |
//! | `chain` | SHA-256, domain-separated | Receipt chain linkage |
//! | `merkle` | SHA-256, 0x00/0x01 domains | Proposal-set and slab commitments |
//! | `prng` | ChaCha20 | Deterministic exploration and drift |
//!
//! ## Domain Separation
//!
//! Every preimage class carries a fixed prefix so no two protocols can
//! collide on the same bytes:
//!
//! | Preimage | Prefix |
//! |----------|--------|
//! | Chain hash | `COH_CHAIN_V1\n` |
//! | PRNG seed | `COH_SEED_V1\n` |
//! | PRNG nonce | `COH_NONCE_V1\n` |
//! | Merkle leaf | `0x00` |
//! | Merkle interior | `0x01` |
//!
//! No randomness in this crate touches the OS: the ChaCha20 stream is fully
//! determined by `(parent_chain_hash, episode_seed, step_index)`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod errors;
pub mod hashing;
pub mod merkle;
pub mod prng;

// Re-exports
pub use chain::{chain_next, CHAIN_DOMAIN, GENESIS};
pub use errors::CryptoError;
pub use hashing::{decode_prefixed, sha256, sha256_concat, sha256_prefixed, Hash};
pub use merkle::{verify_directed_path, DirectedPath, MerkleTree, PathStep, Side};
pub use prng::{derive_seed, derive_stream, seed_commit, DeterministicRng};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
