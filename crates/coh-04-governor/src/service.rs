//! The governor engine: evaluate, filter, choose.

use coh_03_microstep::{preview_candidate, v_q, MicroStepResult};
use shared_types::{CogState, KernelParams, MicroAction, ProposalSet, RejectCode};
use tracing::{debug, info};

use crate::config::GovernorConfig;
use crate::filters::{
    absorption_filter, admissibility_filter, lyapunov_filter, safety_filter, select_by_score,
    taint_filter, Candidate,
};
pub use crate::filters::Elimination;
use crate::ports::SafetyOracle;

/// Outcome of one governor pass.
#[derive(Clone, Debug)]
pub struct GovernorVerdict {
    /// Index of the chosen proposal; `None` when nothing survived.
    pub chosen_index: Option<u32>,
    /// The action to execute: the winner, or synthetic Stay.
    pub action: MicroAction,
    /// Set when nothing survived: `REJECT_NO_SAFE_ACTION`.
    pub reject_code: Option<RejectCode>,
    /// Per-stage elimination records, in filter order.
    pub eliminations: Vec<Elimination>,
}

/// The lexicographic filter pipeline.
pub struct Governor {
    config: GovernorConfig,
}

impl Governor {
    /// Build a governor with the given policy.
    pub fn new(config: GovernorConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline over one proposal set.
    pub fn select(
        &self,
        set: &ProposalSet,
        state: &CogState,
        params: &KernelParams,
        oracle: &dyn SafetyOracle,
    ) -> MicroStepResult<GovernorVerdict> {
        let v_prev = v_q(state, params)?;
        let mask = oracle.hazard_mask(state);

        // Evaluate every proposal once; the stages then only look at flags.
        let mut candidates = Vec::with_capacity(set.len());
        for (index, proposal) in set.proposals().iter().enumerate() {
            let shape_ok = proposal.action.require_shape_of(state).is_ok();
            let (feasible, dv_q) = if shape_ok {
                let (candidate, _) = preview_candidate(state, &proposal.action, params)?;
                if candidate.in_feasible_set(params) {
                    let v_next = v_q(&candidate, params)?;
                    (true, v_next.saturating_sub(v_prev))
                } else {
                    (false, 0)
                }
            } else {
                (false, 0)
            };
            candidates.push(Candidate { index: index as u32, proposal, shape_ok, feasible, dv_q });
        }

        let mut eliminations = Vec::new();
        let (candidates, mut removed) = safety_filter(candidates, &mask);
        eliminations.append(&mut removed);
        let (candidates, mut removed) = taint_filter(candidates, &self.config);
        eliminations.append(&mut removed);
        let (candidates, mut removed) = admissibility_filter(candidates);
        eliminations.append(&mut removed);
        let (candidates, mut removed) = lyapunov_filter(candidates, params.absorb_on_b0);
        eliminations.append(&mut removed);
        let (candidates, mut removed) = absorption_filter(candidates, state.b);
        eliminations.append(&mut removed);

        for e in &eliminations {
            debug!(index = e.index, code = ?e.code, "proposal eliminated");
        }

        match select_by_score(&candidates) {
            Some(winner) => {
                info!(
                    chosen = winner.index,
                    score_q = winner.proposal.score_q,
                    survivors = candidates.len(),
                    "governor verdict"
                );
                Ok(GovernorVerdict {
                    chosen_index: Some(winner.index),
                    action: winner.proposal.action.clone(),
                    reject_code: None,
                    eliminations,
                })
            }
            None => {
                info!(eliminated = eliminations.len(), "no safe action; yielding Stay");
                Ok(GovernorVerdict {
                    chosen_index: None,
                    action: MicroAction::stay(state.rho.rows(), state.rho.cols()),
                    reject_code: Some(RejectCode::NoSafeAction),
                    eliminations,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coh_01_fixed_point::ONE_Q18;
    use shared_types::{Digest, HazardMask, Lattice, Proposal};

    use crate::ports::NoHazards;

    struct CenterHazard;

    impl SafetyOracle for CenterHazard {
        fn hazard_mask(&self, state: &CogState) -> HazardMask {
            let mut mask = HazardMask::clear(state.rho.rows(), state.rho.cols());
            mask.block(1, 1);
            mask
        }
    }

    fn spiked_state(b: i64) -> CogState {
        let mut s = CogState::new(
            Lattice::zeros(3, 3),
            Lattice::zeros(3, 3),
            Lattice::zeros(3, 3),
            b,
        )
        .unwrap();
        s.theta.set(1, 1, 4);
        s
    }

    fn proposal(id_byte: u8, action: MicroAction, score_q: i64) -> Proposal {
        Proposal {
            id: Digest([id_byte; 32]),
            action,
            score_q,
            taint: None,
            metadata: serde_json::Map::new(),
        }
    }

    fn relax() -> MicroAction {
        let mut a = MicroAction::stay(3, 3);
        a.dtheta.set(1, 1, -1);
        a
    }

    fn worsen() -> MicroAction {
        let mut a = MicroAction::stay(3, 3);
        a.dtheta.set(1, 1, 1);
        a
    }

    fn deposit_center() -> MicroAction {
        let mut a = MicroAction::stay(3, 3);
        a.drho.set(1, 1, 1);
        a
    }

    #[test]
    fn test_best_survivor_wins() {
        let params = KernelParams::default();
        let state = spiked_state(10 * ONE_Q18);
        let set = ProposalSet::new(vec![
            proposal(1, relax(), 5 * ONE_Q18),
            proposal(2, worsen(), 9 * ONE_Q18),
            proposal(3, MicroAction::stay(3, 3), ONE_Q18),
        ])
        .unwrap();
        let verdict = Governor::new(GovernorConfig::default())
            .select(&set, &state, &params, &NoHazards)
            .unwrap();
        // The worsening proposal scores highest but falls to the Lyapunov
        // filter; the relax proposal wins among survivors.
        assert_eq!(verdict.chosen_index, Some(0));
        assert!(verdict
            .eliminations
            .iter()
            .any(|e| e.index == 1 && e.code == RejectCode::LyapunovIncrease));
    }

    #[test]
    fn test_hazard_dominates_score() {
        // Zero barrier weight so the deposit would otherwise be acceptable.
        let params = KernelParams { w_budget_barrier_q: 0, ..KernelParams::default() };
        let state = spiked_state(10 * ONE_Q18);
        let set = ProposalSet::new(vec![
            proposal(1, deposit_center(), 100 * ONE_Q18),
            proposal(2, MicroAction::stay(3, 3), ONE_Q18),
        ])
        .unwrap();
        let verdict = Governor::new(GovernorConfig::default())
            .select(&set, &state, &params, &CenterHazard)
            .unwrap();
        assert_eq!(verdict.chosen_index, Some(1));
        assert_eq!(verdict.eliminations[0].code, RejectCode::Hazard);
    }

    #[test]
    fn test_no_safe_action_yields_stay() {
        let params = KernelParams::default();
        let state = spiked_state(10 * ONE_Q18);
        let set = ProposalSet::new(vec![proposal(1, worsen(), ONE_Q18)]).unwrap();
        let verdict = Governor::new(GovernorConfig::default())
            .select(&set, &state, &params, &NoHazards)
            .unwrap();
        assert_eq!(verdict.chosen_index, None);
        assert_eq!(verdict.reject_code, Some(RejectCode::NoSafeAction));
        assert!(verdict.action.is_stay());
    }

    #[test]
    fn test_wrong_shape_out_of_bounds() {
        let params = KernelParams::default();
        let state = spiked_state(10 * ONE_Q18);
        let set = ProposalSet::new(vec![
            proposal(1, MicroAction::stay(2, 2), 100 * ONE_Q18),
            proposal(2, relax(), ONE_Q18),
        ])
        .unwrap();
        let verdict = Governor::new(GovernorConfig::default())
            .select(&set, &state, &params, &NoHazards)
            .unwrap();
        assert_eq!(verdict.chosen_index, Some(1));
        assert_eq!(verdict.eliminations[0].code, RejectCode::OutOfBounds);
    }
}
