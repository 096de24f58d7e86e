//! Visit counting and the exploration score law.

use std::collections::HashMap;

use coh_01_fixed_point::{from_int, q_div, q_mul, q_sqrt, q_sub, Round, ONE_Q18};
use shared_types::{Digest, Q18};

use crate::config::ExplorationConfig;
use crate::errors::ProposerResult;

/// Exploration weight as a function of remaining budget: linear decay from
/// `alpha_max_q` at `b = 0`, floored at `alpha_min_q`. Monotone
/// non-increasing in `b`.
pub fn alpha_q(b: Q18, config: &ExplorationConfig) -> ProposerResult<Q18> {
    let decay = q_mul(config.alpha_slope_q, b.max(0), Round::Down)?;
    Ok((config.alpha_max_q - decay).max(config.alpha_min_q))
}

/// `bonus_q(n) = 1 / sqrt(n + 1)` in Q18, floor sqrt, DOWN division.
pub fn exploration_bonus_q(visits: u64) -> ProposerResult<Q18> {
    let n_plus_one = from_int((visits + 1).min(i64::MAX as u64) as i64)?;
    let root = q_sqrt(n_plus_one)?;
    Ok(q_div(ONE_Q18, root, Round::Down)?)
}

/// The full score law: `-V_task + alpha * bonus`.
pub fn score_q(v_task_q: Q18, alpha: Q18, bonus: Q18) -> ProposerResult<Q18> {
    let weighted = q_mul(alpha, bonus, Round::Down)?;
    Ok(q_sub(weighted, v_task_q)?)
}

/// Visit counts keyed by state digest. Owned by the episode handle and
/// replayed alongside it; never shared across episodes.
#[derive(Clone, Debug, Default)]
pub struct VisitTable {
    visits: HashMap<Digest, u64>,
}

impl VisitTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visits recorded for a state.
    pub fn visits(&self, state_digest: &Digest) -> u64 {
        self.visits.get(state_digest).copied().unwrap_or(0)
    }

    /// Record one visit; returns the new count.
    pub fn record(&mut self, state_digest: Digest) -> u64 {
        let count = self.visits.entry(state_digest).or_insert(0);
        *count += 1;
        *count
    }
}
