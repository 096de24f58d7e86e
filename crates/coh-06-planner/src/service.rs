//! Plan generation, degradation, and selection.

use shared_crypto::DeterministicRng;
use shared_types::{CogState, KernelParams, MicroAction, Q18};
use tracing::debug;

use crate::adapt::adaptive_params;
use crate::config::PlannerConfig;
use crate::errors::PlannerResult;
use crate::plan::{commit_plans, plan_leaf, Plan, PlanSetCommitment};
use crate::rollout::score_rollout;

/// What one planning pass produced.
#[derive(Clone, Debug)]
pub struct PlanOutcome {
    /// The chosen plan's first action; Stay when planning was disabled.
    pub first_action: MicroAction,
    /// Plan-set commitments for the receipt; `None` when no plan set was
    /// generated.
    pub commitment: Option<PlanSetCommitment>,
    /// Work charged for planning (Q18).
    pub planning_cost_q: Q18,
    /// Budget remaining after the charge (Q18).
    pub budget_after_q: Q18,
    /// The budget forced smaller `(m, H)` than the adaptive sizing asked.
    pub degraded: bool,
    /// Plans generated.
    pub m: u32,
    /// Horizon used.
    pub h: u32,
}

impl PlanOutcome {
    fn stay(state: &CogState, degraded: bool) -> Self {
        Self {
            first_action: MicroAction::stay(state.rho.rows(), state.rho.cols()),
            commitment: None,
            planning_cost_q: 0,
            budget_after_q: state.b,
            degraded,
            m: 0,
            h: 0,
        }
    }
}

/// Generate, score, and select a plan under the current budget.
///
/// The caller debits `planning_cost_q` from the episode budget before the
/// engine step; the replay verifier re-runs this function and re-derives
/// the identical charge.
pub fn plan_and_select(
    state: &CogState,
    params: &KernelParams,
    config: &PlannerConfig,
    rng: &mut DeterministicRng,
) -> PlannerResult<PlanOutcome> {
    config.validate()?;

    let (mut m, mut h) = adaptive_params(state.b, config)?;
    if m == 0 || h == 0 {
        debug!("planning disabled at zero budget");
        return Ok(PlanOutcome::stay(state, true));
    }

    // Degrade until the budget can pay, shrinking horizon before breadth.
    let mut degraded = false;
    let cost = loop {
        let w = config.compute_planning_cost(m, h)?;
        if w <= state.b {
            break w;
        }
        degraded = true;
        if h > 1 {
            h -= 1;
        } else if m > 1 {
            m -= 1;
        } else {
            debug!(budget_q = state.b, "budget below minimum plan cost; yielding Stay");
            return Ok(PlanOutcome::stay(state, true));
        }
    };

    let plans = generate_plans(state, params, m, h, rng)?;

    // Max score; ties break toward the smallest plan leaf digest, then the
    // smallest index, mirroring the governor's determinism rule.
    let mut chosen: u32 = 0;
    let mut best_key = selection_key(&plans[0])?;
    for (index, plan) in plans.iter().enumerate().skip(1) {
        let key = selection_key(plan)?;
        if better(&key, &best_key) {
            best_key = key;
            chosen = index as u32;
        }
    }

    let commitment = commit_plans(&plans, chosen)?;
    let first_action =
        plans[chosen as usize].first_action(state.rho.rows(), state.rho.cols());
    let budget_after = state.b - cost;

    debug!(m, h, chosen, cost_q = cost, degraded, "plan selected");

    Ok(PlanOutcome {
        first_action,
        commitment: Some(commitment),
        planning_cost_q: cost,
        budget_after_q: budget_after,
        degraded,
        m,
        h,
    })
}

type SelectionKey = (Q18, shared_types::Digest);

fn selection_key(plan: &Plan) -> PlannerResult<SelectionKey> {
    Ok((plan.score_q, plan_leaf(plan)?))
}

fn better(candidate: &SelectionKey, incumbent: &SelectionKey) -> bool {
    candidate.0 > incumbent.0 || (candidate.0 == incumbent.0 && candidate.1 < incumbent.1)
}

fn generate_plans(
    state: &CogState,
    params: &KernelParams,
    m: u32,
    h: u32,
    rng: &mut DeterministicRng,
) -> PlannerResult<Vec<Plan>> {
    let (rows, cols) = (state.theta.rows(), state.theta.cols());
    let mut plans = Vec::with_capacity(m as usize);

    // Plan 0 is the all-Stay baseline so a safe fallback is always scored.
    let baseline: Vec<MicroAction> = (0..h).map(|_| MicroAction::stay(rows, cols)).collect();
    plans.push(Plan { actions: baseline, score_q: 0 });

    for _ in 1..m {
        let mut actions = Vec::with_capacity(h as usize);
        for _ in 0..h {
            let cell = rng.pick_index(rows * cols);
            let nudge = rng.next_in(-1, 1);
            let mut action = MicroAction::stay(rows, cols);
            action.dtheta.set(cell / cols, cell % cols, nudge);
            actions.push(action);
        }
        plans.push(Plan { actions, score_q: 0 });
    }

    for plan in &mut plans {
        plan.score_q = score_rollout(state, &plan.actions, params)?;
    }
    Ok(plans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coh_01_fixed_point::ONE_Q18;
    use shared_crypto::GENESIS;
    use shared_types::Lattice;

    fn state(b: Q18) -> CogState {
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

    fn rng() -> DeterministicRng {
        DeterministicRng::for_step(&GENESIS, 11, 0)
    }

    #[test]
    fn test_zero_budget_is_free_stay() {
        let out = plan_and_select(
            &state(0),
            &KernelParams::default(),
            &PlannerConfig::for_testing(),
            &mut rng(),
        )
        .unwrap();
        assert!(out.first_action.is_stay());
        assert_eq!(out.planning_cost_q, 0);
        assert_eq!(out.budget_after_q, 0);
        assert!(out.commitment.is_none());
    }

    #[test]
    fn test_cost_deducted_exactly() {
        let b = 10 * ONE_Q18;
        let config = PlannerConfig::for_testing();
        let out =
            plan_and_select(&state(b), &KernelParams::default(), &config, &mut rng()).unwrap();
        let expected = config.compute_planning_cost(out.m, out.h).unwrap();
        assert_eq!(out.planning_cost_q, expected);
        assert_eq!(out.budget_after_q, b - expected);
        assert!(out.budget_after_q >= 0);
    }

    #[test]
    fn test_commitment_present_when_planning_ran() {
        let out = plan_and_select(
            &state(10 * ONE_Q18),
            &KernelParams::default(),
            &PlannerConfig::for_testing(),
            &mut rng(),
        )
        .unwrap();
        let c = out.commitment.expect("plan set committed");
        assert!((c.chosen_plan_index as usize) < out.m as usize);
    }

    #[test]
    fn test_degrades_under_expensive_kappa() {
        let config = PlannerConfig {
            kappa_plan_q: 100 * ONE_Q18,
            ..PlannerConfig::for_testing()
        };
        let out = plan_and_select(
            &state(ONE_Q18 / 2),
            &KernelParams::default(),
            &config,
            &mut rng(),
        )
        .unwrap();
        assert!(out.degraded);
        assert!(out.budget_after_q >= 0);
    }

    #[test]
    fn test_deterministic_given_rng_inputs() {
        let params = KernelParams::default();
        let config = PlannerConfig::for_testing();
        let s = state(10 * ONE_Q18);
        let a = plan_and_select(&s, &params, &config, &mut rng()).unwrap();
        let b = plan_and_select(&s, &params, &config, &mut rng()).unwrap();
        assert_eq!(a.commitment, b.commitment);
        assert_eq!(a.first_action, b.first_action);
        assert_eq!(a.planning_cost_q, b.planning_cost_q);
    }
}
