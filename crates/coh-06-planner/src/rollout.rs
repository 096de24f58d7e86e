//! Deterministic plan rollout under the engine's own dynamics.

use coh_03_microstep::{preview_candidate, v_q};
use shared_types::{CogState, KernelParams, MicroAction, Q18};

use crate::errors::PlannerResult;

/// Score a candidate action sequence: the negated sum of the Lyapunov value
/// along the previewed trajectory, so descending trajectories score high.
///
/// A step whose projected candidate leaves K poisons the whole plan with a
/// sentinel score no admissible plan can reach; it will never be chosen.
pub fn score_rollout(
    state: &CogState,
    actions: &[MicroAction],
    params: &KernelParams,
) -> PlannerResult<Q18> {
    let mut current = state.clone();
    let mut total: i128 = 0;
    for action in actions {
        let (candidate, _) = preview_candidate(&current, action, params)?;
        if !candidate.in_feasible_set(params) {
            return Ok(INADMISSIBLE_SCORE);
        }
        total += v_q(&candidate, params)? as i128;
        current = candidate;
    }
    let negated = -total;
    Ok(negated.clamp(INADMISSIBLE_SCORE as i128 + 1, i64::MAX as i128) as Q18)
}

/// Sentinel below any admissible rollout score.
pub const INADMISSIBLE_SCORE: Q18 = i64::MIN / 2;
