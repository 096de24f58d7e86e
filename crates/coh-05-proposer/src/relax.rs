//! Reference proposer: phase relaxation.
//!
//! A kernel-native policy used by the test suites and as the fallback when
//! no task-specific proposer is wired: it finds the phase cell with the
//! largest discrete-Laplacian magnitude and proposes unit nudges at that
//! cell, scored by the coherence loss itself (`V_task = V`). Task layers
//! supply their own policies through the same port.

use coh_02_canonical::canonical_sha256;
use coh_03_microstep::{preview_candidate, v_q};
use shared_crypto::DeterministicRng;
use shared_types::{CogState, Digest, KernelParams, MicroAction, Proposal, ProposalSet};
use tracing::trace;

use crate::config::ExplorationConfig;
use crate::errors::ProposerResult;
use crate::exploration::{alpha_q, exploration_bonus_q, score_q, VisitTable};
use crate::identity::proposal_id;
use crate::ports::Proposer;

/// Phase-relaxation proposer with count-based exploration.
#[derive(Debug, Default)]
pub struct RelaxProposer {
    config: ExplorationConfig,
    visits: VisitTable,
}

impl RelaxProposer {
    /// Build with the given exploration schedule.
    pub fn new(config: ExplorationConfig) -> Self {
        Self { config, visits: VisitTable::new() }
    }

    /// The phase cell with the largest Laplacian magnitude, row-major
    /// tie-break.
    fn hottest_cell(state: &CogState) -> (usize, usize) {
        let theta = &state.theta;
        let (rows, cols) = (theta.rows(), theta.cols());
        let mut best = (0usize, 0usize);
        let mut best_mag: i128 = -1;
        for i in 0..rows {
            for j in 0..cols {
                let here = theta.get(i, j) as i128;
                let mut acc: i128 = 0;
                let mut neighbors: i128 = 0;
                if i > 0 {
                    acc += theta.get(i - 1, j) as i128;
                    neighbors += 1;
                }
                if i + 1 < rows {
                    acc += theta.get(i + 1, j) as i128;
                    neighbors += 1;
                }
                if j > 0 {
                    acc += theta.get(i, j - 1) as i128;
                    neighbors += 1;
                }
                if j + 1 < cols {
                    acc += theta.get(i, j + 1) as i128;
                    neighbors += 1;
                }
                let mag = (acc - neighbors * here).abs();
                if mag > best_mag {
                    best_mag = mag;
                    best = (i, j);
                }
            }
        }
        best
    }
}

impl<Obs> Proposer<Obs> for RelaxProposer {
    fn propose(
        &mut self,
        state: &CogState,
        _obs: &Obs,
        params: &KernelParams,
        _rng: &mut DeterministicRng,
    ) -> ProposerResult<ProposalSet> {
        self.visits.record(Digest(canonical_sha256(state)?));

        let (i, j) = Self::hottest_cell(state);
        let (rows, cols) = (state.theta.rows(), state.theta.cols());

        let mut actions = Vec::with_capacity(3);
        for nudge in [-1i64, 1] {
            let mut action = MicroAction::stay(rows, cols);
            action.dtheta.set(i, j, nudge);
            actions.push(action);
        }
        actions.push(MicroAction::stay(rows, cols));

        let alpha = alpha_q(state.b, &self.config)?;
        let mut proposals = Vec::with_capacity(actions.len());
        for (index, action) in actions.into_iter().enumerate() {
            let (candidate, _) = preview_candidate(state, &action, params)?;
            let v_task_q = v_q(&candidate, params)?;
            let bonus = exploration_bonus_q(
                self.visits.visits(&Digest(canonical_sha256(&candidate)?)),
            )?;
            let score = score_q(v_task_q, alpha, bonus)?;
            trace!(index, score_q = score, "relax proposal");
            proposals.push(Proposal {
                id: proposal_id(&action, score, index as u32)?,
                action,
                score_q: score,
                taint: None,
                metadata: serde_json::Map::new(),
            });
        }

        Ok(ProposalSet::new(proposals)?)
    }
}
