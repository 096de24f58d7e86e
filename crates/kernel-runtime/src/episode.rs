//! The episode handle: one tick, one receipt, strictly sequential.

use coh_02_canonical::canonical_sha256;
use coh_03_microstep::{gmi_step, StepCtx};
use coh_04_governor::{Governor, SafetyOracle};
use coh_05_proposer::{commit, proposal_id, Proposer};
use coh_06_planner::{plan_and_select, PlanSetCommitment, PlannerConfig};
use coh_08_retention::{build_slab_receipt, RetentionPolicy};
use serde::{Deserialize, Serialize};
use shared_crypto::{prng, DeterministicRng, GENESIS};
use shared_types::{
    CogState, Digest, HazardMask, KernelParams, MicroAction, Proposal, ProposalSet, Q18,
    SlabReceipt, StepReceipt,
};
use tracing::{info, warn};

use crate::errors::RuntimeResult;
use crate::ports::Environment;

/// Episode tunables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpisodeConfig {
    /// Hard cap on ticks.
    pub max_steps: u64,
    /// Apply environment drift every N ticks (0 = never).
    pub drift_every: u64,
    /// Emit a slab every N receipts (0 = no slabs).
    pub slab_size: u32,
    /// Drive action selection through the bounded MPC planner instead of
    /// the proposer.
    pub use_planner: bool,
    /// Planner tunables, when enabled.
    pub planner: PlannerConfig,
    /// Retention policy slabs are committed under.
    pub retention: RetentionPolicy,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_steps: 64,
            drift_every: 0,
            slab_size: 16,
            use_planner: false,
            planner: PlannerConfig::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

impl EpisodeConfig {
    /// Small sizes for tests.
    pub fn for_testing() -> Self {
        Self { max_steps: 16, slab_size: 4, planner: PlannerConfig::for_testing(), ..Self::default() }
    }
}

/// What one tick produced.
pub struct TickOutcome {
    /// The published receipt.
    pub receipt: StepReceipt,
    /// Task reward collected this tick (zero on rejected ticks).
    pub reward_q: Q18,
    /// The environment declared the episode complete.
    pub terminal: bool,
}

/// Everything a third party needs (with the parameters and seed) to replay
/// and audit the episode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Canonical digest of the parameter record.
    pub params_digest: Digest,
    /// Episode seed (transport-level; the hashed form is `seed_commit`).
    pub seed: u64,
    /// Episode-constant seed commitment.
    pub seed_commit: Digest,
    /// Chain genesis value.
    pub chain_genesis: Digest,
    /// Every step receipt, in order.
    pub receipts: Vec<StepReceipt>,
    /// Every slab receipt, in order.
    pub slabs: Vec<SlabReceipt>,
    /// Canonical digest of the final cognitive state.
    pub final_state_digest: Digest,
    /// Total task reward collected (Q18).
    pub total_reward_q: Q18,
}

/// A paused episode's complete resumable state. Produced between ticks;
/// there is no in-tick checkpoint.
#[derive(Clone, Debug)]
pub struct EpisodeCheckpoint<S> {
    /// Cognitive state at the pause point.
    pub cog: CogState,
    /// Environment state at the pause point.
    pub env_state: S,
    /// Chain tip after the last published receipt.
    pub chain_tip: Digest,
    /// Slab-chain tip.
    pub slab_tip: Digest,
    /// Receipts published so far.
    pub receipts: Vec<StepReceipt>,
    /// Slabs emitted so far.
    pub slabs: Vec<SlabReceipt>,
    /// Reward accumulated so far (Q18).
    pub total_reward_q: Q18,
    /// The environment had already declared termination.
    pub terminal: bool,
}

/// An episode in flight. Exclusively owns its mutable state; the parameter
/// record is shared and read-only.
pub struct Episode<E: Environment, P: Proposer<E::Obs>> {
    env: E,
    proposer: P,
    governor: Governor,
    params: KernelParams,
    config: EpisodeConfig,
    seed: u64,
    seed_commit: Digest,
    cog: CogState,
    env_state: E::State,
    obs: E::Obs,
    chain_tip: Digest,
    slab_tip: Digest,
    receipts: Vec<StepReceipt>,
    slabs: Vec<SlabReceipt>,
    ledger: crate::ledger::JcsLedger,
    total_reward_q: Q18,
    terminal: bool,
}

struct FixedMask(HazardMask);

impl SafetyOracle for FixedMask {
    fn hazard_mask(&self, _state: &CogState) -> HazardMask {
        self.0.clone()
    }
}

impl<E: Environment, P: Proposer<E::Obs>> Episode<E, P> {
    /// Initialize an episode. `cog0` is the initial cognitive state; the
    /// environment resets from the same seed.
    pub fn new(
        env: E,
        proposer: P,
        governor: Governor,
        params: KernelParams,
        config: EpisodeConfig,
        cog0: CogState,
        seed: u64,
    ) -> RuntimeResult<Self> {
        params.validate()?;
        let (env_state, obs) = env.reset(seed);
        let seed_commit = Digest(prng::seed_commit(seed));
        info!(seed, max_steps = config.max_steps, "episode start");
        Ok(Self {
            env,
            proposer,
            governor,
            params,
            config,
            seed,
            seed_commit,
            cog: cog0,
            env_state,
            obs,
            chain_tip: Digest(GENESIS),
            slab_tip: Digest::ZERO,
            receipts: Vec::new(),
            slabs: Vec::new(),
            ledger: crate::ledger::JcsLedger::new(),
            total_reward_q: 0,
            terminal: false,
        })
    }

    /// Snapshot the episode between ticks. Dropping the handle after taking
    /// a checkpoint is equivalent to pausing.
    pub fn checkpoint(&self) -> EpisodeCheckpoint<E::State> {
        EpisodeCheckpoint {
            cog: self.cog.clone(),
            env_state: self.env_state.clone(),
            chain_tip: self.chain_tip,
            slab_tip: self.slab_tip,
            receipts: self.receipts.clone(),
            slabs: self.slabs.clone(),
            total_reward_q: self.total_reward_q,
            terminal: self.terminal,
        }
    }

    /// Resume from a checkpoint: load the chain tip and continue.
    ///
    /// The proposer is an external collaborator and travels with the host;
    /// a stateless proposer (or one the host restored alongside) continues
    /// bit-identically.
    pub fn resume(
        env: E,
        proposer: P,
        governor: Governor,
        params: KernelParams,
        config: EpisodeConfig,
        seed: u64,
        checkpoint: EpisodeCheckpoint<E::State>,
    ) -> RuntimeResult<Self> {
        params.validate()?;
        let obs = env.observe(&checkpoint.env_state);
        let seed_commit = Digest(prng::seed_commit(seed));
        let mut ledger = crate::ledger::JcsLedger::new();
        for receipt in &checkpoint.receipts {
            ledger.append(receipt)?;
        }
        info!(seed, resumed_at = checkpoint.cog.t, "episode resumed");
        Ok(Self {
            env,
            proposer,
            governor,
            params,
            config,
            seed,
            seed_commit,
            cog: checkpoint.cog,
            env_state: checkpoint.env_state,
            obs,
            chain_tip: checkpoint.chain_tip,
            slab_tip: checkpoint.slab_tip,
            receipts: checkpoint.receipts,
            slabs: checkpoint.slabs,
            ledger,
            total_reward_q: checkpoint.total_reward_q,
            terminal: checkpoint.terminal,
        })
    }

    /// The canonical-blob persistence surface, in publication order.
    pub fn ledger(&self) -> &crate::ledger::JcsLedger {
        &self.ledger
    }

    /// Current chain tip.
    pub fn chain_tip(&self) -> Digest {
        self.chain_tip
    }

    /// Current cognitive state.
    pub fn state(&self) -> &CogState {
        &self.cog
    }

    /// Receipts published so far.
    pub fn receipts(&self) -> &[StepReceipt] {
        &self.receipts
    }

    /// Execute one tick: drift, propose (or plan), govern, step, publish.
    pub fn tick(&mut self) -> RuntimeResult<TickOutcome> {
        let step_index = self.cog.t;

        if self.config.drift_every > 0 && step_index > 0 && step_index % self.config.drift_every == 0
        {
            self.env_state = self.env.drift(&self.env_state, step_index);
            self.obs = self.env.observe(&self.env_state);
        }

        let mut rng = DeterministicRng::for_step(self.chain_tip.as_bytes(), self.seed, step_index);

        // Planner path debits its work before the engine step; the receipt's
        // b_prev then reflects the post-planning budget, and replay
        // re-derives the same debit.
        let mut plan_commitment: Option<PlanSetCommitment> = None;
        let mut cog_for_step = self.cog.clone();
        let set = if self.config.use_planner {
            let outcome =
                plan_and_select(&self.cog, &self.params, &self.config.planner, &mut rng)?;
            cog_for_step.b = outcome.budget_after_q;
            plan_commitment = outcome.commitment;
            planned_set(outcome.first_action, &cog_for_step)?
        } else {
            self.proposer.propose(&self.cog, &self.obs, &self.params, &mut rng)?
        };

        let mask = self.env.hazard_mask(&self.env_state);
        let verdict = self.governor.select(&set, &cog_for_step, &self.params, &FixedMask(mask))?;
        // On REJECT_NO_SAFE_ACTION the commitments still pin the proposal
        // set (nominal index 0); the decision field tells the auditor that
        // nothing in it was applied.
        let chosen_index = verdict.chosen_index.unwrap_or(0);
        let commitment = commit(&set, chosen_index)?;

        let mut ctx =
            StepCtx::new(commitment.root, chosen_index, commitment.chosen_hash, self.seed_commit);
        if let Some(pc) = plan_commitment {
            ctx = ctx.with_plan(pc.planset_root, pc.chosen_plan_index, pc.chosen_plan_hash);
        }
        if let Some(code) = verdict.reject_code {
            ctx = ctx.with_forced_reject(code);
        }

        let (next_cog, receipt) =
            gmi_step(&cog_for_step, &verdict.action, &ctx, &self.params, self.chain_tip)?;

        let mut reward_q: Q18 = 0;
        if receipt.is_accepted() {
            let transition = self.env.step(&self.env_state, &verdict.action);
            if transition.hazard_hit {
                warn!(step = step_index, "accepted action hit a hazard; safety filter breached");
            }
            self.env_state = transition.state;
            self.obs = transition.obs;
            reward_q = transition.reward_q;
            self.terminal = transition.terminal;
        }

        self.cog = next_cog;
        self.chain_tip = receipt.chain_next;
        self.ledger.append(&receipt)?;
        self.receipts.push(receipt.clone());
        self.total_reward_q = self.total_reward_q.saturating_add(reward_q);

        self.maybe_emit_slab()?;

        Ok(TickOutcome { receipt, reward_q, terminal: self.terminal })
    }

    /// Drive the episode to termination or the step cap, then freeze the
    /// record.
    pub fn run(&mut self) -> RuntimeResult<EpisodeRecord> {
        while !self.terminal && self.cog.t < self.config.max_steps {
            self.tick()?;
        }
        info!(
            steps = self.receipts.len(),
            slabs = self.slabs.len(),
            reward_q = self.total_reward_q,
            "episode complete"
        );
        self.record()
    }

    /// Freeze the auditable episode record.
    pub fn record(&self) -> RuntimeResult<EpisodeRecord> {
        Ok(EpisodeRecord {
            params_digest: Digest(canonical_sha256(&self.params)?),
            seed: self.seed,
            seed_commit: self.seed_commit,
            chain_genesis: Digest(GENESIS),
            receipts: self.receipts.clone(),
            slabs: self.slabs.clone(),
            final_state_digest: Digest(canonical_sha256(&self.cog)?),
            total_reward_q: self.total_reward_q,
        })
    }

    fn maybe_emit_slab(&mut self) -> RuntimeResult<()> {
        let size = self.config.slab_size as usize;
        if size == 0 || self.receipts.len() % size != 0 {
            return Ok(());
        }
        let window = &self.receipts[self.receipts.len() - size..];
        let slab = build_slab_receipt(
            window,
            self.slabs.len() as u64,
            &self.config.retention.policy_id(),
            self.slab_tip,
        )?;
        info!(slab_index = slab.slab_index, root = %slab.receipts_root, "slab emitted");
        self.slab_tip = slab.chain_next;
        self.slabs.push(slab);
        Ok(())
    }
}

/// The planner's chosen action wrapped as a governed proposal set, with
/// Stay as the fallback candidate.
fn planned_set(first_action: MicroAction, cog: &CogState) -> RuntimeResult<ProposalSet> {
    let stay = MicroAction::stay(cog.rho.rows(), cog.rho.cols());
    let mut proposals = Vec::with_capacity(2);
    for (index, (action, score_q)) in [(first_action, 1i64), (stay, 0i64)].into_iter().enumerate() {
        proposals.push(Proposal {
            id: proposal_id(&action, score_q, index as u32)?,
            action,
            score_q,
            taint: None,
            metadata: serde_json::Map::new(),
        });
    }
    Ok(ProposalSet::new(proposals)?)
}
