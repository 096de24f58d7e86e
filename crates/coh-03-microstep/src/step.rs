//! The micro-step: one tick, one receipt.

use coh_02_canonical::{canonical_bytes, canonical_sha256};
use shared_crypto::chain_next;
use shared_types::{
    CogState, Decision, Digest, KernelParams, MicroAction, OptionPhase, Projected, RejectCode,
    StepReceipt, WorkUnits, SCHEMA_STEP_V1,
};
use tracing::debug;

use crate::diffusion::diffuse_cost;
use crate::errors::{MicroStepError, MicroStepResult};
use crate::kkt::kkt_residual;
use crate::lyapunov::{dv_q, v_q};
use crate::projection::project;
use crate::work::work_units;

/// Per-tick context: the commitments and tags the engine embeds into the
/// receipt but does not compute itself.
#[derive(Clone, Debug)]
pub struct StepCtx {
    /// Merkle root over the tick's proposal set.
    pub proposalset_root: Digest,
    /// Index of the governor's choice.
    pub chosen_proposal_index: u32,
    /// Canonical hash of the chosen proposal.
    pub chosen_proposal_hash: Digest,
    /// Plan-set root, when the planner ran this tick.
    pub planset_root: Option<Digest>,
    /// Chosen plan index, when the planner ran.
    pub chosen_plan_index: Option<u32>,
    /// Chosen plan hash, when the planner ran.
    pub chosen_plan_hash: Option<Digest>,
    /// Option phase tag, when this tick is internal to a skill option.
    pub option_phase: Option<OptionPhase>,
    /// Unfolding option id, when applicable.
    pub option_id: Option<String>,
    /// Episode-constant seed commitment.
    pub seed_commit: Digest,
    /// Governor-imposed rejection: the engine emits a rejected receipt with
    /// this code instead of evaluating the action.
    pub forced_reject: Option<RejectCode>,
}

impl StepCtx {
    /// Context with proposal commitments only.
    pub fn new(
        proposalset_root: Digest,
        chosen_proposal_index: u32,
        chosen_proposal_hash: Digest,
        seed_commit: Digest,
    ) -> Self {
        Self {
            proposalset_root,
            chosen_proposal_index,
            chosen_proposal_hash,
            planset_root: None,
            chosen_plan_index: None,
            chosen_plan_hash: None,
            option_phase: None,
            option_id: None,
            seed_commit,
            forced_reject: None,
        }
    }

    /// Attach planner commitments.
    pub fn with_plan(mut self, root: Digest, index: u32, hash: Digest) -> Self {
        self.planset_root = Some(root);
        self.chosen_plan_index = Some(index);
        self.chosen_plan_hash = Some(hash);
        self
    }

    /// Tag this tick as internal to a skill option.
    pub fn with_option(mut self, phase: OptionPhase, id: impl Into<String>) -> Self {
        self.option_phase = Some(phase);
        self.option_id = Some(id.into());
        self
    }

    /// Impose a governor rejection on this tick.
    pub fn with_forced_reject(mut self, code: RejectCode) -> Self {
        self.forced_reject = Some(code);
        self
    }
}

/// Execute one micro-step.
///
/// Returns the committed state and the emitted receipt. On rejection the
/// state is unchanged except that `t` advances, which is what makes
/// rejected ticks auditable: the chain grows by exactly one receipt per
/// tick regardless of outcome.
pub fn gmi_step(
    state: &CogState,
    action: &MicroAction,
    ctx: &StepCtx,
    params: &KernelParams,
    chain_prev: Digest,
) -> MicroStepResult<(CogState, StepReceipt)> {
    action.require_shape_of(state)?;

    let v_prev = v_q(state, params)?;
    let state_hash_prev = Digest(canonical_sha256(state)?);
    let action_hash = Digest(canonical_sha256(action)?);

    if let Some(code) = ctx.forced_reject {
        let next = advance_time_only(state);
        return emit(
            Outcome::rejected(code, v_prev, state.b),
            state,
            next,
            ctx,
            params,
            chain_prev,
            state_hash_prev,
            action_hash,
        );
    }

    // 1-2. Propose s+ and project onto K.
    let work = work_units(action, params)?;
    let (candidate, projected) = preview_candidate(state, action, params)?;

    // Infeasibility surviving projection means corrupted parameters.
    if !candidate.in_feasible_set(params) {
        let next = advance_time_only(state);
        return emit(
            Outcome::rejected(RejectCode::Infeasible, v_prev, state.b),
            state,
            next,
            ctx,
            params,
            chain_prev,
            state_hash_prev,
            action_hash,
        );
    }

    // 3-4. Lyapunov descent and the absorption gate.
    let v_next = v_q(&candidate, params)?;
    let dv = dv_q(v_prev, v_next)?;

    if dv > 0 {
        let code = if state.b == 0 && params.absorb_on_b0 {
            RejectCode::AbsorbB0DvPos
        } else {
            RejectCode::LyapunovIncrease
        };
        let next = advance_time_only(state);
        return emit(
            Outcome::rejected(code, v_prev, state.b),
            state,
            next,
            ctx,
            params,
            chain_prev,
            state_hash_prev,
            action_hash,
        );
    }

    // 5-6. Commit and emit.
    let outcome = Outcome {
        decision: Decision::Accepted,
        reject_code: None,
        v_prev,
        v_next,
        dv,
        b_prev: state.b,
        work,
        projected,
    };
    emit(outcome, state, candidate, ctx, params, chain_prev, state_hash_prev, action_hash)
}

struct Outcome {
    decision: Decision,
    reject_code: Option<RejectCode>,
    v_prev: i64,
    v_next: i64,
    dv: i64,
    b_prev: i64,
    work: WorkUnits,
    projected: Projected,
}

impl Outcome {
    /// Rejected ticks report no Lyapunov or budget change: the state did
    /// not move.
    fn rejected(code: RejectCode, v_prev: i64, b_prev: i64) -> Self {
        Self {
            decision: Decision::Rejected,
            reject_code: Some(code),
            v_prev,
            v_next: v_prev,
            dv: 0,
            b_prev,
            work: WorkUnits::ZERO,
            projected: Projected::default(),
        }
    }
}

/// Preview the projected candidate state for an action without emitting a
/// receipt: increments, diffusion, work debit, projection. The governor's
/// admissibility and Lyapunov filters evaluate proposals through this.
pub fn preview_candidate(
    state: &CogState,
    action: &MicroAction,
    params: &KernelParams,
) -> MicroStepResult<(CogState, Projected)> {
    action.require_shape_of(state)?;
    let work = work_units(action, params)?;
    let total_work = work.total_q()?;
    let mut proposed = state.clone();
    apply_increments(&mut proposed, action)?;
    proposed.c = diffuse_cost(&state.c, params)?;
    proposed.b = coh_01_fixed_point::q_sub(state.b, total_work)?;
    proposed.t = state.t + 1;
    Ok(project(proposed, params))
}

fn advance_time_only(state: &CogState) -> CogState {
    let mut next = state.clone();
    next.t += 1;
    next
}

fn apply_increments(state: &mut CogState, action: &MicroAction) -> MicroStepResult<()> {
    for i in 0..state.rho.rows() {
        for j in 0..state.rho.cols() {
            let rho = state
                .rho
                .get(i, j)
                .checked_add(action.drho.get(i, j))
                .ok_or(MicroStepError::Overflow { what: "rho increment" })?;
            state.rho.set(i, j, rho);
            let theta = state
                .theta
                .get(i, j)
                .checked_add(action.dtheta.get(i, j))
                .ok_or(MicroStepError::Overflow { what: "theta increment" })?;
            state.theta.set(i, j, theta);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn emit(
    outcome: Outcome,
    prev: &CogState,
    next: CogState,
    ctx: &StepCtx,
    params: &KernelParams,
    chain_prev: Digest,
    state_hash_prev: Digest,
    action_hash: Digest,
) -> MicroStepResult<(CogState, StepReceipt)> {
    // 7. KKT gate on the committed state.
    let kkt = kkt_residual(&next, params)?;
    if !kkt.is_feasible() {
        return Err(MicroStepError::KktFeasibilityNonzero { kkt });
    }

    let state_hash_next = Digest(canonical_sha256(&next)?);
    let db = coh_01_fixed_point::q_sub(next.b, outcome.b_prev)?;

    let mut receipt = StepReceipt {
        schema_id: SCHEMA_STEP_V1.to_string(),
        step_index: prev.t,
        chain_prev,
        chain_next: Digest::ZERO,
        state_hash_prev,
        state_hash_next,
        action_hash,
        proposalset_root: ctx.proposalset_root,
        chosen_proposal_index: ctx.chosen_proposal_index,
        chosen_proposal_hash: ctx.chosen_proposal_hash,
        planset_root: ctx.planset_root,
        chosen_plan_index: ctx.chosen_plan_index,
        chosen_plan_hash: ctx.chosen_plan_hash,
        option_phase: ctx.option_phase,
        option_id: ctx.option_id.clone(),
        v_prev_q: outcome.v_prev,
        v_next_q: outcome.v_next,
        dv_q: outcome.dv,
        b_prev_q: outcome.b_prev,
        b_next_q: next.b,
        db_q: db,
        decision: outcome.decision,
        reject_code: outcome.reject_code,
        kkt,
        work: outcome.work,
        projected: outcome.projected,
        seed_commit: ctx.seed_commit,
    };

    let core_jcs = canonical_bytes(&receipt.core())?;
    receipt.chain_next = Digest(chain_next(chain_prev.as_bytes(), &core_jcs));

    debug!(
        step = receipt.step_index,
        decision = ?receipt.decision,
        reject = ?receipt.reject_code,
        dv_q = receipt.dv_q,
        b_next_q = receipt.b_next_q,
        "micro-step"
    );

    Ok((next, receipt))
}
