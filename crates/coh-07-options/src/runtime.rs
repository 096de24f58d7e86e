//! Unfolding an option into governed primitive steps.

use coh_03_microstep::{gmi_step, StepCtx};
use coh_04_governor::{Governor, SafetyOracle};
use coh_05_proposer::{commit, proposal_id};
use shared_crypto::DeterministicRng;
use shared_types::{
    CogState, Digest, KernelParams, MicroAction, OptionEndReason, OptionPhase, Proposal,
    ProposalSet, RejectCode, StepReceipt,
};
use tracing::{debug, info};

use crate::errors::{OptionError, OptionResult};
use crate::skill::SkillOption;

/// The receipts and outcome of one option unfolding.
#[derive(Debug)]
pub struct OptionExecution {
    /// One receipt per internal tick, phase-tagged in order.
    pub receipts: Vec<StepReceipt>,
    /// State after the final internal tick.
    pub final_state: CogState,
    /// Chain tip after the final internal tick.
    pub chain_tip: Digest,
    /// Why the option stopped.
    pub end_reason: OptionEndReason,
    /// Internal ticks executed.
    pub steps_taken: u32,
}

/// Unfold `option` from `state`, emitting one governed receipt per internal
/// step. The first tick is tagged `START`, the final one `END`.
///
/// A governor or engine rejection of any internal step aborts the option:
/// the rejecting tick is the `END` receipt and carries
/// `OPTION_ABORTED_BY_GOVERNOR`.
#[allow(clippy::too_many_arguments)]
pub fn unfold(
    option: &SkillOption,
    state: &CogState,
    params: &KernelParams,
    governor: &Governor,
    oracle: &dyn SafetyOracle,
    episode_seed: u64,
    seed_commit: Digest,
    chain_tip: Digest,
) -> OptionResult<OptionExecution> {
    if !option.behavior.can_initiate(state, params) {
        return Err(OptionError::NotInitiable { id: option.id.clone() });
    }

    info!(option = %option.id, max_steps = option.max_steps, "option start");

    let mut current = state.clone();
    let mut tip = chain_tip;
    let mut receipts = Vec::new();
    let mut steps_taken: u32 = 0;

    loop {
        let mut rng = DeterministicRng::for_step(tip.as_bytes(), episode_seed, current.t);

        // Decide this tick's phase before acting so the receipt tag is
        // committed up front.
        let cap_next = steps_taken + 1 >= option.max_steps;
        let predicate_fired = option
            .behavior
            .should_terminate(&current, steps_taken, params, &mut rng);
        let terminating = cap_next || predicate_fired;
        let phase = if steps_taken == 0 {
            OptionPhase::Start
        } else if terminating {
            OptionPhase::End
        } else {
            OptionPhase::Step
        };

        let action = option.behavior.internal_policy(&current, params);
        let (next, receipt, aborted) = governed_tick(
            &current, action, phase, option, params, governor, oracle, seed_commit, tip,
        )?;

        tip = receipt.chain_next;
        receipts.push(receipt);
        current = next;
        steps_taken += 1;

        if aborted {
            debug!(option = %option.id, steps_taken, "option aborted by governor");
            return Ok(OptionExecution {
                receipts,
                final_state: current,
                chain_tip: tip,
                end_reason: OptionEndReason::AbortedByGovernor,
                steps_taken,
            });
        }

        if terminating {
            let end_reason = if predicate_fired {
                OptionEndReason::Terminated
            } else {
                OptionEndReason::MaxSteps
            };
            debug!(option = %option.id, steps_taken, reason = ?end_reason, "option end");
            return Ok(OptionExecution {
                receipts,
                final_state: current,
                chain_tip: tip,
                end_reason,
                steps_taken,
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn governed_tick(
    state: &CogState,
    action: MicroAction,
    phase: OptionPhase,
    option: &SkillOption,
    params: &KernelParams,
    governor: &Governor,
    oracle: &dyn SafetyOracle,
    seed_commit: Digest,
    chain_tip: Digest,
) -> OptionResult<(CogState, StepReceipt, bool)> {
    let policy_action = action.clone();
    let proposal = Proposal {
        id: proposal_id(&action, 0, 0)?,
        action,
        score_q: 0,
        taint: None,
        metadata: serde_json::Map::new(),
    };
    let set = ProposalSet::new(vec![proposal])?;

    let verdict = governor.select(&set, state, params, oracle)?;
    let commitment = commit(&set, 0)?;

    let mut ctx = StepCtx::new(commitment.root, 0, commitment.chosen_hash, seed_commit)
        .with_option(phase, option.id.clone());

    let governor_rejected = verdict.chosen_index.is_none();
    if governor_rejected {
        ctx = ctx.with_forced_reject(RejectCode::OptionAbortedByGovernor);
    }
    let action_to_run = if governor_rejected { verdict.action } else { policy_action };

    let (next, receipt) = gmi_step(state, &action_to_run, &ctx, params, chain_tip)?;
    let aborted = governor_rejected || (!receipt.is_accepted() && phase != OptionPhase::End);
    Ok((next, receipt, aborted))
}
