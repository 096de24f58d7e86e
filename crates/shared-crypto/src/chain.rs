//! Domain-separated receipt chain linkage.
//!
//! A chain hash folds the canonical receipt core into the running chain:
//! `chain_next = SHA256(DOMAIN || chain_prev || JCS(receipt_core))`. Any
//! prefix of an episode is then uniquely identified by one 32-byte value.

use crate::hashing::{sha256_concat, Hash};

/// Domain prefix for every chain-hash preimage.
pub const CHAIN_DOMAIN: &[u8] = b"COH_CHAIN_V1\n";

/// The genesis chain value: 32 zero bytes.
pub const GENESIS: Hash = [0u8; 32];

/// Fold a canonical receipt core into the chain.
pub fn chain_next(chain_prev: &Hash, core_jcs: &[u8]) -> Hash {
    sha256_concat(&[CHAIN_DOMAIN, chain_prev, core_jcs])
}
