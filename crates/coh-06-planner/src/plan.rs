//! Plans and the plan-set commitment.

use coh_02_canonical::canonical_sha256;
use serde::{Deserialize, Serialize};
use shared_crypto::MerkleTree;
use shared_types::{Digest, MicroAction, Q18};

use crate::errors::{PlannerError, PlannerResult};

/// One candidate plan: an action sequence and its rollout score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Actions in execution order; length is the horizon.
    pub actions: Vec<MicroAction>,
    /// Rollout score (Q18); higher is better.
    pub score_q: Q18,
}

impl Plan {
    /// The plan's first action, or Stay for an empty plan.
    pub fn first_action(&self, rows: usize, cols: usize) -> MicroAction {
        self.actions
            .first()
            .cloned()
            .unwrap_or_else(|| MicroAction::stay(rows, cols))
    }
}

/// The commitments a step receipt carries when the planner ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanSetCommitment {
    /// Merkle root over the ordered plan leaves.
    pub planset_root: Digest,
    /// Index of the chosen plan.
    pub chosen_plan_index: u32,
    /// Canonical hash of the chosen plan.
    pub chosen_plan_hash: Digest,
}

/// Canonical content leaf of one plan.
pub fn plan_leaf(plan: &Plan) -> PlannerResult<Digest> {
    Ok(Digest(canonical_sha256(plan)?))
}

/// Commit to a plan set and the chosen index.
pub fn commit_plans(plans: &[Plan], chosen_index: u32) -> PlannerResult<PlanSetCommitment> {
    let chosen = plans.get(chosen_index as usize).ok_or_else(|| PlannerError::InvalidConfig {
        reason: format!("chosen plan index {chosen_index} out of range ({} plans)", plans.len()),
    })?;
    let leaves: Vec<_> = plans
        .iter()
        .map(|p| plan_leaf(p).map(|d| d.0))
        .collect::<PlannerResult<_>>()?;
    let tree = MerkleTree::from_leaves(&leaves);
    Ok(PlanSetCommitment {
        planset_root: Digest(tree.root()),
        chosen_plan_index: chosen_index,
        chosen_plan_hash: plan_leaf(chosen)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_of(nudge: i64, score_q: Q18) -> Plan {
        let mut action = MicroAction::stay(2, 2);
        action.dtheta.set(0, 0, nudge);
        Plan { actions: vec![action], score_q }
    }

    #[test]
    fn test_commitment_deterministic() {
        let plans = vec![plan_of(1, 5), plan_of(-1, 9)];
        assert_eq!(commit_plans(&plans, 1).unwrap(), commit_plans(&plans, 1).unwrap());
    }

    #[test]
    fn test_chosen_hash_matches_leaf() {
        let plans = vec![plan_of(1, 5), plan_of(-1, 9)];
        let c = commit_plans(&plans, 0).unwrap();
        assert_eq!(c.chosen_plan_hash, plan_leaf(&plans[0]).unwrap());
    }

    #[test]
    fn test_first_action_of_empty_plan_is_stay() {
        let p = Plan { actions: vec![], score_q: 0 };
        assert!(p.first_action(2, 2).is_stay());
    }
}
