//! Receipt structures: the auditable record of every tick.
//!
//! A receipt is emitted on every tick whether or not an action was accepted.
//! The canonical subset (`StepReceiptCore`) feeds the chain hash; transport
//! metadata travels in the sibling [`ReceiptEnvelope`] and never enters any
//! preimage.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared_crypto::{decode_prefixed, sha256_prefixed, CryptoError};

use crate::errors::{SharedTypesError, SharedTypesResult};
use crate::{Hash, Q18};

/// Schema identifier for step receipts.
pub const SCHEMA_STEP_V1: &str = "coh.step.v1";

/// Schema identifier for slab receipts.
pub const SCHEMA_SLAB_V1: &str = "coh.slab.v1";

/// Verify a wire schema id against the expected one.
pub fn check_schema(got: &str, expected: &str) -> SharedTypesResult<()> {
    if got == expected {
        Ok(())
    } else {
        Err(SharedTypesError::SchemaMismatch {
            expected: expected.to_string(),
            got: got.to_string(),
        })
    }
}

/// A content digest whose wire form is `sha256:` + lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(pub crate::Hash);

impl Digest {
    /// The genesis / absent digest: 32 zero bytes.
    pub const ZERO: Digest = Digest([0u8; 32]);

    /// Raw bytes.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// Parse the `sha256:`-prefixed text form.
    pub fn from_prefixed(s: &str) -> Result<Self, CryptoError> {
        decode_prefixed(s).map(Digest)
    }
}

impl From<Hash> for Digest {
    fn from(hash: Hash) -> Self {
        Digest(hash)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&sha256_prefixed(&self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&sha256_prefixed(&self.0))
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_prefixed(&s).map_err(serde::de::Error::custom)
    }
}

/// Outcome of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The chosen action was applied.
    #[serde(rename = "ACCEPTED")]
    Accepted,
    /// No action was applied; only `t` advanced.
    #[serde(rename = "REJECTED")]
    Rejected,
}

/// Step-level rejection codes. Rejections are data carried in the receipt,
/// never errors: the episode continues and the chain advances by one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectCode {
    /// Projected state fell outside K even after clamping.
    #[serde(rename = "REJECT_INFEASIBLE")]
    Infeasible,
    /// Absorption: at `b = 0` a Lyapunov-increasing action was proposed.
    #[serde(rename = "REJECT_ABSORB_B0_DV_POS")]
    AbsorbB0DvPos,
    /// The action would increase the Lyapunov functional.
    #[serde(rename = "REJECT_LYAPUNOV_INCREASE")]
    LyapunovIncrease,
    /// No proposal survived the governor's filters.
    #[serde(rename = "REJECT_NO_SAFE_ACTION")]
    NoSafeAction,
    /// The action would deposit density onto a hazard cell.
    #[serde(rename = "REJECT_HAZARD")]
    Hazard,
    /// The action's shape does not match the state's lattice domain.
    #[serde(rename = "REJECT_OUT_OF_BOUNDS")]
    OutOfBounds,
    /// The proposal carried an untrusted taint tag.
    #[serde(rename = "REJECT_TAINT_UNTRUSTED")]
    TaintUntrusted,
    /// A governor rejection terminated a running skill option.
    #[serde(rename = "OPTION_ABORTED_BY_GOVERNOR")]
    OptionAbortedByGovernor,
}

/// KKT-style residuals evaluated on the post-step state.
///
/// Feasibility residuals measure bound violation and must be zero after
/// every step (strong invariant). The stationarity residual is the
/// non-negative discrete-Laplacian norm of the phase lattice; it is a
/// diagnostic and never gates acceptance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KktResidual {
    /// Density bound violation magnitude (must be 0).
    pub feas_rho_q: i64,
    /// Cost-potential bound violation magnitude (must be 0).
    pub feas_c_q: i64,
    /// Budget bound violation magnitude (must be 0).
    pub feas_b_q: i64,
    /// Discrete-Laplacian norm of theta (diagnostic).
    pub stationarity_theta_q: i64,
}

impl KktResidual {
    /// True iff all feasibility residuals vanish.
    pub fn is_feasible(&self) -> bool {
        self.feas_rho_q == 0 && self.feas_c_q == 0 && self.feas_b_q == 0
    }
}

/// Decomposition of the work charged against the budget this tick. The
/// total explains `db_q` exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnits {
    /// Base per-tick cost (Q18).
    pub base_q: Q18,
    /// Cost proportional to touched lattice cells (Q18).
    pub lattice_q: Q18,
    /// Glyph surcharge (Q18).
    pub glyph_q: Q18,
}

impl WorkUnits {
    /// Zero work (rejected ticks, stay actions).
    pub const ZERO: WorkUnits = WorkUnits { base_q: 0, lattice_q: 0, glyph_q: 0 };

    /// Total charged work.
    pub fn total_q(&self) -> coh_01_fixed_point::FixedPointResult<Q18> {
        let partial = coh_01_fixed_point::q_add(self.base_q, self.lattice_q)?;
        coh_01_fixed_point::q_add(partial, self.glyph_q)
    }
}

/// Per-field projection flags: which components the admissibility
/// projection actually clamped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projected {
    /// Density was clamped into `[0, rho_max]`.
    pub rho: bool,
    /// Cost potential was clamped to `>= 0`.
    pub c: bool,
    /// Budget was clamped to `>= 0`.
    pub b: bool,
}

impl Projected {
    /// True if any component was clamped.
    pub fn any(&self) -> bool {
        self.rho || self.c || self.b
    }
}

/// Phase tag on receipts emitted while a skill option is unfolding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionPhase {
    /// First internal step of the option.
    #[serde(rename = "START")]
    Start,
    /// Interior internal step.
    #[serde(rename = "STEP")]
    Step,
    /// Final internal step.
    #[serde(rename = "END")]
    End,
}

/// Why an option stopped unfolding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionEndReason {
    /// The termination predicate fired.
    #[serde(rename = "TERMINATED")]
    Terminated,
    /// The per-option step cap was reached.
    #[serde(rename = "MAX_STEPS")]
    MaxSteps,
    /// The governor rejected an internal step.
    #[serde(rename = "OPTION_ABORTED_BY_GOVERNOR")]
    AbortedByGovernor,
}

/// The receipt emitted once per tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReceipt {
    /// Schema identifier; always [`SCHEMA_STEP_V1`].
    pub schema_id: String,
    /// Logical step index of this tick.
    pub step_index: u64,
    /// Parent chain hash.
    pub chain_prev: Digest,
    /// This receipt's chain hash (over the canonical core).
    pub chain_next: Digest,
    /// Canonical hash of the pre-step state.
    pub state_hash_prev: Digest,
    /// Canonical hash of the post-step state.
    pub state_hash_next: Digest,
    /// Canonical hash of the applied (or rejected) action.
    pub action_hash: Digest,
    /// Merkle root over the tick's proposal set.
    pub proposalset_root: Digest,
    /// Index of the governor's choice within the proposal set.
    pub chosen_proposal_index: u32,
    /// Canonical hash of the chosen proposal.
    pub chosen_proposal_hash: Digest,
    /// Merkle root over the planner's plan set, when the planner ran.
    pub planset_root: Option<Digest>,
    /// Chosen plan index, when the planner ran.
    pub chosen_plan_index: Option<u32>,
    /// Canonical hash of the chosen plan, when the planner ran.
    pub chosen_plan_hash: Option<Digest>,
    /// Option phase tag, when this tick is internal to a skill option.
    pub option_phase: Option<OptionPhase>,
    /// Identifier of the unfolding option, when applicable.
    pub option_id: Option<String>,
    /// Lyapunov value before the step (Q18).
    pub v_prev_q: Q18,
    /// Lyapunov value after the step (Q18).
    pub v_next_q: Q18,
    /// `v_next_q - v_prev_q`; zero on rejected ticks.
    pub dv_q: Q18,
    /// Budget before the step (Q18).
    pub b_prev_q: Q18,
    /// Budget after the step (Q18).
    pub b_next_q: Q18,
    /// `b_next_q - b_prev_q`; explained by `work`.
    pub db_q: Q18,
    /// Accept/reject outcome.
    pub decision: Decision,
    /// Rejection code, when rejected.
    pub reject_code: Option<RejectCode>,
    /// KKT residuals on the post-step state.
    pub kkt: KktResidual,
    /// Work decomposition charged this tick.
    pub work: WorkUnits,
    /// Which state components the projection clamped.
    pub projected: Projected,
    /// Episode-constant commitment to the seed preimage.
    pub seed_commit: Digest,
}

impl StepReceipt {
    /// The canonical subset that feeds the chain hash: every field except
    /// `chain_next` itself.
    pub fn core(&self) -> StepReceiptCore<'_> {
        StepReceiptCore {
            schema_id: &self.schema_id,
            step_index: self.step_index,
            chain_prev: self.chain_prev,
            state_hash_prev: self.state_hash_prev,
            state_hash_next: self.state_hash_next,
            action_hash: self.action_hash,
            proposalset_root: self.proposalset_root,
            chosen_proposal_index: self.chosen_proposal_index,
            chosen_proposal_hash: self.chosen_proposal_hash,
            planset_root: self.planset_root,
            chosen_plan_index: self.chosen_plan_index,
            chosen_plan_hash: self.chosen_plan_hash,
            option_phase: self.option_phase,
            option_id: self.option_id.as_deref(),
            v_prev_q: self.v_prev_q,
            v_next_q: self.v_next_q,
            dv_q: self.dv_q,
            b_prev_q: self.b_prev_q,
            b_next_q: self.b_next_q,
            db_q: self.db_q,
            decision: self.decision,
            reject_code: self.reject_code,
            kkt: self.kkt,
            work: self.work,
            projected: self.projected,
            seed_commit: self.seed_commit,
        }
    }

    /// True iff this tick applied its action.
    pub fn is_accepted(&self) -> bool {
        self.decision == Decision::Accepted
    }
}

/// Borrowed canonical core of a [`StepReceipt`]. Field set must track the
/// receipt exactly, minus `chain_next`.
#[derive(Serialize)]
pub struct StepReceiptCore<'a> {
    /// See [`StepReceipt::schema_id`].
    pub schema_id: &'a str,
    /// See [`StepReceipt::step_index`].
    pub step_index: u64,
    /// See [`StepReceipt::chain_prev`].
    pub chain_prev: Digest,
    /// See [`StepReceipt::state_hash_prev`].
    pub state_hash_prev: Digest,
    /// See [`StepReceipt::state_hash_next`].
    pub state_hash_next: Digest,
    /// See [`StepReceipt::action_hash`].
    pub action_hash: Digest,
    /// See [`StepReceipt::proposalset_root`].
    pub proposalset_root: Digest,
    /// See [`StepReceipt::chosen_proposal_index`].
    pub chosen_proposal_index: u32,
    /// See [`StepReceipt::chosen_proposal_hash`].
    pub chosen_proposal_hash: Digest,
    /// See [`StepReceipt::planset_root`].
    pub planset_root: Option<Digest>,
    /// See [`StepReceipt::chosen_plan_index`].
    pub chosen_plan_index: Option<u32>,
    /// See [`StepReceipt::chosen_plan_hash`].
    pub chosen_plan_hash: Option<Digest>,
    /// See [`StepReceipt::option_phase`].
    pub option_phase: Option<OptionPhase>,
    /// See [`StepReceipt::option_id`].
    pub option_id: Option<&'a str>,
    /// See [`StepReceipt::v_prev_q`].
    pub v_prev_q: Q18,
    /// See [`StepReceipt::v_next_q`].
    pub v_next_q: Q18,
    /// See [`StepReceipt::dv_q`].
    pub dv_q: Q18,
    /// See [`StepReceipt::b_prev_q`].
    pub b_prev_q: Q18,
    /// See [`StepReceipt::b_next_q`].
    pub b_next_q: Q18,
    /// See [`StepReceipt::db_q`].
    pub db_q: Q18,
    /// See [`StepReceipt::decision`].
    pub decision: Decision,
    /// See [`StepReceipt::reject_code`].
    pub reject_code: Option<RejectCode>,
    /// See [`StepReceipt::kkt`].
    pub kkt: KktResidual,
    /// See [`StepReceipt::work`].
    pub work: WorkUnits,
    /// See [`StepReceipt::projected`].
    pub projected: Projected,
    /// See [`StepReceipt::seed_commit`].
    pub seed_commit: Digest,
}

/// Transport wrapper around a receipt. Nothing in here enters a hash:
/// mutating the envelope must not change `chain_next`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEnvelope {
    /// The immutable receipt.
    pub receipt: StepReceipt,
    /// Wall-clock emission time, for operators only.
    pub emitted_at_unix: u64,
    /// Optional signer identity label.
    pub signer: Option<String>,
    /// Optional human-facing label.
    pub label: Option<String>,
}

/// A batch receipt committing to a window of step receipts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabReceipt {
    /// Schema identifier; always [`SCHEMA_SLAB_V1`].
    pub schema_id: String,
    /// Slab sequence number within the episode.
    pub slab_index: u64,
    /// First block height covered by this slab.
    pub window_start: u64,
    /// Last block height covered by this slab.
    pub window_end: u64,
    /// Merkle root over the canonical leaves of the step receipts.
    pub receipts_root: Digest,
    /// Number of step receipts committed.
    pub receipt_count: u32,
    /// `policy_id` of the governing retention policy.
    pub retention_policy_id: String,
    /// Parent slab chain hash.
    pub chain_prev: Digest,
    /// This slab's chain hash.
    pub chain_next: Digest,
}

impl SlabReceipt {
    /// Canonical subset feeding the slab chain hash.
    pub fn core(&self) -> SlabReceiptCore<'_> {
        SlabReceiptCore {
            schema_id: &self.schema_id,
            slab_index: self.slab_index,
            window_start: self.window_start,
            window_end: self.window_end,
            receipts_root: self.receipts_root,
            receipt_count: self.receipt_count,
            retention_policy_id: &self.retention_policy_id,
            chain_prev: self.chain_prev,
        }
    }
}

/// Borrowed canonical core of a [`SlabReceipt`].
#[derive(Serialize)]
pub struct SlabReceiptCore<'a> {
    /// See [`SlabReceipt::schema_id`].
    pub schema_id: &'a str,
    /// See [`SlabReceipt::slab_index`].
    pub slab_index: u64,
    /// See [`SlabReceipt::window_start`].
    pub window_start: u64,
    /// See [`SlabReceipt::window_end`].
    pub window_end: u64,
    /// See [`SlabReceipt::receipts_root`].
    pub receipts_root: Digest,
    /// See [`SlabReceipt::receipt_count`].
    pub receipt_count: u32,
    /// See [`SlabReceipt::retention_policy_id`].
    pub retention_policy_id: &'a str,
    /// See [`SlabReceipt::chain_prev`].
    pub chain_prev: Digest,
}

/// Chain-continuity check over a receipt slice:
/// `receipts[i].chain_prev == receipts[i-1].chain_next` for all `i > 0`.
pub fn chain_is_continuous(receipts: &[StepReceipt]) -> bool {
    receipts
        .windows(2)
        .all(|pair| pair[1].chain_prev == pair[0].chain_next)
}
