//! Deterministic ChaCha20 stream for exploration and drift.
//!
//! All randomness in the kernel is a pure function of
//! `(parent_chain_hash, episode_seed, step_index)`. The 32-byte ChaCha20
//! key is derived under `COH_SEED_V1\n`; the stream number under
//! `COH_NONCE_V1\n`. Replay re-derives the identical stream from the
//! receipts alone.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

use crate::hashing::{sha256_concat, Hash};

/// Domain prefix for PRNG seed derivation.
pub const SEED_DOMAIN: &[u8] = b"COH_SEED_V1\n";

/// Domain prefix for PRNG nonce/stream derivation.
pub const NONCE_DOMAIN: &[u8] = b"COH_NONCE_V1\n";

/// Derive the 32-byte ChaCha20 key for one step.
pub fn derive_seed(parent_chain: &Hash, episode_seed: u64, step_index: u64) -> [u8; 32] {
    sha256_concat(&[
        SEED_DOMAIN,
        parent_chain,
        &episode_seed.to_le_bytes(),
        &step_index.to_le_bytes(),
    ])
}

/// Derive the stream number from a seed: first 8 LE bytes of the
/// nonce-domain hash.
pub fn derive_stream(seed: &[u8; 32]) -> u64 {
    let h = sha256_concat(&[NONCE_DOMAIN, seed]);
    u64::from_le_bytes(h[..8].try_into().expect("8 bytes"))
}

/// The episode-constant seed commitment published in every receipt.
pub fn seed_commit(episode_seed: u64) -> Hash {
    sha256_concat(&[SEED_DOMAIN, &episode_seed.to_le_bytes()])
}

/// Deterministic ChaCha20 randomness for one step of one episode.
pub struct DeterministicRng {
    inner: ChaCha20Rng,
}

impl DeterministicRng {
    /// Derive the stream for `step_index` of the episode rooted at
    /// `parent_chain`.
    pub fn for_step(parent_chain: &Hash, episode_seed: u64, step_index: u64) -> Self {
        let seed = derive_seed(parent_chain, episode_seed, step_index);
        let stream = derive_stream(&seed);
        let mut inner = ChaCha20Rng::from_seed(seed);
        inner.set_stream(stream);
        Self { inner }
    }

    /// Next 64 bits of the keystream.
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform draw from `[lo, hi]` (inclusive). Modulo reduction: the bias
    /// over a 64-bit stream is below 2^-32 for every span the kernel uses,
    /// and the draw stays a pure keystream function.
    pub fn next_in(&mut self, lo: i64, hi: i64) -> i64 {
        debug_assert!(lo <= hi);
        let span = (hi as i128 - lo as i128 + 1) as u128;
        let draw = (self.next_u64() as u128) % span;
        (lo as i128 + draw as i128) as i64
    }

    /// Pick an index in `[0, len)`.
    pub fn pick_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::GENESIS;

    #[test]
    fn test_same_inputs_same_stream() {
        let mut a = DeterministicRng::for_step(&GENESIS, 42, 7);
        let mut b = DeterministicRng::for_step(&GENESIS, 42, 7);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_seed_changes_stream() {
        let mut a = DeterministicRng::for_step(&GENESIS, 1, 0);
        let mut b = DeterministicRng::for_step(&GENESIS, 2, 0);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_step_index_changes_stream() {
        let mut a = DeterministicRng::for_step(&GENESIS, 1, 0);
        let mut b = DeterministicRng::for_step(&GENESIS, 1, 1);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_parent_chain_changes_stream() {
        let other = crate::hashing::sha256(b"tip");
        let mut a = DeterministicRng::for_step(&GENESIS, 1, 0);
        let mut b = DeterministicRng::for_step(&other, 1, 0);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_next_in_bounds() {
        let mut rng = DeterministicRng::for_step(&GENESIS, 9, 3);
        for _ in 0..256 {
            let v = rng.next_in(-3, 3);
            assert!((-3..=3).contains(&v));
        }
    }

    #[test]
    fn test_seed_commit_constant() {
        assert_eq!(seed_commit(42), seed_commit(42));
        assert_ne!(seed_commit(42), seed_commit(43));
    }

    #[test]
    fn test_seed_and_nonce_domains_disjoint() {
        let seed = derive_seed(&GENESIS, 0, 0);
        // The stream derivation must not equal a truncation of the seed.
        assert_ne!(derive_stream(&seed).to_le_bytes(), seed[..8]);
    }
}
