//! Proposal-set Merkle commitment.

use coh_02_canonical::canonical_sha256;
use shared_crypto::{DirectedPath, MerkleTree};
use shared_types::{Digest, Proposal, ProposalSet};

use crate::errors::{ProposerError, ProposerResult};

/// The three commitments a step receipt carries for its proposal set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProposalSetCommitment {
    /// Merkle root over the ordered proposal leaves.
    pub root: Digest,
    /// Index of the governor's choice.
    pub chosen_index: u32,
    /// Canonical hash of the chosen proposal.
    pub chosen_hash: Digest,
}

/// Canonical content leaf of one proposal.
pub fn proposal_leaf(proposal: &Proposal) -> ProposerResult<Digest> {
    Ok(Digest(canonical_sha256(proposal)?))
}

/// Commit to a proposal set and the governor's chosen index.
pub fn commit(set: &ProposalSet, chosen_index: u32) -> ProposerResult<ProposalSetCommitment> {
    let chosen = set
        .get(chosen_index as usize)
        .ok_or(ProposerError::ChosenIndexOutOfRange { index: chosen_index, len: set.len() })?;
    let leaves = leaves_of(set)?;
    let tree = MerkleTree::from_leaves(&leaves);
    Ok(ProposalSetCommitment {
        root: Digest(tree.root()),
        chosen_index,
        chosen_hash: proposal_leaf(chosen)?,
    })
}

/// Directed inclusion proof for the chosen proposal, for external auditors.
pub fn chosen_proof(set: &ProposalSet, chosen_index: u32) -> ProposerResult<DirectedPath> {
    if set.get(chosen_index as usize).is_none() {
        return Err(ProposerError::ChosenIndexOutOfRange { index: chosen_index, len: set.len() });
    }
    let leaves = leaves_of(set)?;
    let tree = MerkleTree::from_leaves(&leaves);
    Ok(tree.prove(chosen_index as usize)?)
}

fn leaves_of(set: &ProposalSet) -> ProposerResult<Vec<shared_types::Hash>> {
    set.proposals()
        .iter()
        .map(|p| Ok(proposal_leaf(p)?.0))
        .collect()
}
