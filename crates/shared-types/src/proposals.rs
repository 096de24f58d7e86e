//! Proposals: ranked candidate actions for one tick.

use serde::{Deserialize, Serialize};

use crate::entities::MicroAction;
use crate::errors::{SharedTypesError, SharedTypesResult};
use crate::receipts::Digest;
use crate::Q18;

/// One candidate action with its deterministic identity and score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Deterministic content id: hash of action, score and position.
    pub id: Digest,
    /// The candidate action.
    pub action: MicroAction,
    /// Task score (Q18); the governor maximizes this among survivors.
    pub score_q: Q18,
    /// Opaque taint tag. The kernel does not interpret it beyond the
    /// governor's untrusted-taint filter.
    pub taint: Option<String>,
    /// Free-form proposer metadata (integer-only; floats fail the
    /// canonical guard at hashing time).
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The ordered, non-empty sequence of proposals emitted for one tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSet {
    proposals: Vec<Proposal>,
}

impl ProposalSet {
    /// Build a set; the proposer contract requires at least one proposal
    /// (the Stay action if nothing else).
    pub fn new(proposals: Vec<Proposal>) -> SharedTypesResult<Self> {
        if proposals.is_empty() {
            return Err(SharedTypesError::EmptyProposalSet);
        }
        Ok(Self { proposals })
    }

    /// All proposals, in emission order.
    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Number of proposals.
    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    /// Always false by construction; retained for the idiomatic pair.
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Proposal at `index`.
    pub fn get(&self, index: usize) -> Option<&Proposal> {
        self.proposals.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stay_proposal(score_q: Q18) -> Proposal {
        Proposal {
            id: Digest::ZERO,
            action: MicroAction::stay(2, 2),
            score_q,
            taint: None,
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(
            ProposalSet::new(vec![]),
            Err(SharedTypesError::EmptyProposalSet)
        ));
    }

    #[test]
    fn test_order_preserved() {
        let set = ProposalSet::new(vec![stay_proposal(3), stay_proposal(1), stay_proposal(2)])
            .unwrap();
        let scores: Vec<_> = set.proposals().iter().map(|p| p.score_q).collect();
        assert_eq!(scores, vec![3, 1, 2]);
    }
}
