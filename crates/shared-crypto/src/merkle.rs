//! Balanced Merkle tree with directed inclusion proofs.
//!
//! Leaves and interior nodes are hashed under distinct one-byte domains
//! (`0x00` / `0x01`) so an interior node can never be replayed as a leaf
//! (second-preimage separation). An odd node at any level is promoted
//! unchanged to the next level; it is never paired with a copy of itself,
//! so directed paths never contain a self-sibling.

use serde::{Deserialize, Serialize};

use crate::errors::{CryptoError, CryptoResult};
use crate::hashing::{sha256_concat, Hash};

/// Domain byte prepended to leaf preimages.
pub const LEAF_DOMAIN: u8 = 0x00;

/// Domain byte prepended to interior-node preimages.
pub const NODE_DOMAIN: u8 = 0x01;

/// Which side of the pair the *sibling* occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Sibling is the left child; the proven node is on the right.
    L,
    /// Sibling is the right child; the proven node is on the left.
    R,
}

/// One step of a directed inclusion proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    /// Side the sibling occupies at this level.
    pub side: Side,
    /// The sibling's node hash.
    #[serde(with = "crate::hashing::serde_prefixed")]
    pub sibling: Hash,
}

/// A directed inclusion proof, leaf level first.
pub type DirectedPath = Vec<PathStep>;

/// Hash a raw leaf under the leaf domain.
pub fn leaf_hash(leaf: &Hash) -> Hash {
    sha256_concat(&[&[LEAF_DOMAIN], leaf])
}

/// Hash two children under the interior-node domain.
pub fn node_hash(left: &Hash, right: &Hash) -> Hash {
    sha256_concat(&[&[NODE_DOMAIN], left, right])
}

/// A balanced Merkle tree over pre-hashed content leaves.
///
/// Callers pass `sha256(JCS(item))` per item; the tree applies the leaf
/// domain itself.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// levels[0] is the domain-hashed leaf level; the last level is the root.
    levels: Vec<Vec<Hash>>,
}

impl MerkleTree {
    /// Build a tree from content leaves. An empty slice yields the empty
    /// tree whose root is all zeroes.
    pub fn from_leaves(leaves: &[Hash]) -> Self {
        if leaves.is_empty() {
            return Self { levels: Vec::new() };
        }
        let mut levels: Vec<Vec<Hash>> = vec![leaves.iter().map(leaf_hash).collect()];
        while levels.last().map(Vec::len).unwrap_or(0) > 1 {
            let prev = levels.last().expect("non-empty by construction");
            let mut next = Vec::with_capacity(prev.len().div_ceil(2));
            for pair in prev.chunks(2) {
                match pair {
                    [left, right] => next.push(node_hash(left, right)),
                    // Odd node: promoted unchanged.
                    [single] => next.push(*single),
                    _ => unreachable!("chunks(2) yields 1- or 2-element slices"),
                }
            }
            levels.push(next);
        }
        Self { levels }
    }

    /// Number of content leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(Vec::len).unwrap_or(0)
    }

    /// The root hash; all zeroes for the empty tree.
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    /// Produce a directed inclusion proof for the leaf at `index`.
    pub fn prove(&self, index: usize) -> CryptoResult<DirectedPath> {
        let leaf_count = self.leaf_count();
        if leaf_count == 0 {
            return Err(CryptoError::EmptyTree);
        }
        if index >= leaf_count {
            return Err(CryptoError::LeafIndexOutOfRange { index, leaf_count });
        }
        let mut path = Vec::new();
        let mut pos = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_pos = pos ^ 1;
            if sibling_pos < level.len() {
                path.push(PathStep {
                    side: if sibling_pos < pos { Side::L } else { Side::R },
                    sibling: level[sibling_pos],
                });
            }
            // Odd promoted node contributes no step at this level.
            pos /= 2;
        }
        Ok(path)
    }
}

/// Verify a directed inclusion proof against a root.
///
/// `leaf` is the content leaf (`sha256(JCS(item))`), not the domain-hashed
/// form; the leaf domain is applied here so a forged interior node cannot
/// stand in for a leaf.
pub fn verify_directed_path(leaf: &Hash, path: &DirectedPath, root: &Hash) -> bool {
    let mut current = leaf_hash(leaf);
    for step in path {
        current = match step.side {
            Side::L => node_hash(&step.sibling, &current),
            Side::R => node_hash(&current, &step.sibling),
        };
    }
    current == *root
}
