//! Fraud proofs: falsifying one receipt inside a committed slab.

use coh_02_canonical::{canonical_sha256, CanonicalError};
use serde::{Deserialize, Serialize};
use shared_crypto::{verify_directed_path, DirectedPath};
use shared_types::{Decision, Digest, StepReceipt, Q18, SCHEMA_STEP_V1};
use tracing::warn;

use crate::errors::{RetentionReject, RetentionResult};

/// The violation a fraud proof alleges, with the claimed value it refutes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Violation {
    /// The slab understated the maximum Lyapunov value reached.
    #[serde(rename = "V_MAX_UNDERREPORTED")]
    VMaxUnderreported {
        /// The slab-level claim being refuted (Q18).
        claimed_v_max_q: Q18,
    },
    /// The slab understated the maximum work charged in one tick.
    #[serde(rename = "M_MAX_UNDERREPORTED")]
    MMaxUnderreported {
        /// The slab-level claim being refuted (Q18).
        claimed_m_max_q: Q18,
    },
    /// The slab understated the ending budget.
    #[serde(rename = "BUDGET_UNDERREPORTED")]
    BudgetUnderreported {
        /// The slab-level claim being refuted (Q18).
        claimed_b_end_q: Q18,
    },
    /// The receipt's own fields contradict its decision.
    #[serde(rename = "INVALID_STATE_TRANSITION")]
    InvalidStateTransition,
    /// The receipt is malformed (wrong schema or infeasible residuals).
    #[serde(rename = "INVALID_RECEIPT")]
    InvalidReceipt,
}

/// A fraud proof: names the slab, pins one micro-receipt into its root via
/// a directed Merkle path, and alleges a violation that receipt exhibits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudProof {
    /// Chain hash of the disputed slab.
    pub slab_chain_hash: Digest,
    /// Index of the disputed receipt within the slab.
    pub micro_receipt_index: u32,
    /// The disputed receipt, verbatim.
    pub micro_receipt: StepReceipt,
    /// The alleged violation.
    pub violation: Violation,
    /// Directed inclusion path from the receipt leaf to the slab root.
    pub directed_path: DirectedPath,
    /// The root the prover claims the path reaches.
    pub claimed_root: Digest,
}

impl FraudProof {
    /// Content id of this proof.
    pub fn proof_id(&self) -> Result<Digest, CanonicalError> {
        Ok(Digest(canonical_sha256(self)?))
    }
}

/// Verify a fraud proof against the slab's advertised root.
///
/// 1. Recompute the receipt's canonical leaf and walk the directed path;
///    a root mismatch is `INVALID_MERKLE_PROOF`.
/// 2. Check that the receipt actually exhibits the alleged violation;
///    a hollow claim is `INVALID_VIOLATION`.
pub fn verify_fraud_proof(proof: &FraudProof, slab_root: &Digest) -> RetentionResult<()> {
    let leaf = canonical_sha256(&proof.micro_receipt).map_err(|e| {
        RetentionReject::InvalidViolation { reason: format!("receipt not canonicalizable: {e}") }
    })?;

    if proof.claimed_root != *slab_root
        || !verify_directed_path(&leaf, &proof.directed_path, slab_root.as_bytes())
    {
        warn!(slab = %proof.slab_chain_hash, index = proof.micro_receipt_index, "fraud proof failed Merkle check");
        return Err(RetentionReject::InvalidMerkleProof);
    }

    check_violation(&proof.violation, &proof.micro_receipt)
}

fn check_violation(violation: &Violation, receipt: &StepReceipt) -> RetentionResult<()> {
    match violation {
        Violation::VMaxUnderreported { claimed_v_max_q } => {
            if receipt.v_next_q > *claimed_v_max_q {
                Ok(())
            } else {
                Err(RetentionReject::InvalidViolation {
                    reason: format!(
                        "V max not underreported: {} <= {claimed_v_max_q}",
                        receipt.v_next_q
                    ),
                })
            }
        }
        Violation::MMaxUnderreported { claimed_m_max_q } => {
            let actual = receipt.work.total_q().map_err(|e| {
                RetentionReject::InvalidViolation { reason: format!("work overflow: {e}") }
            })?;
            if actual > *claimed_m_max_q {
                Ok(())
            } else {
                Err(RetentionReject::InvalidViolation {
                    reason: format!("work max not underreported: {actual} <= {claimed_m_max_q}"),
                })
            }
        }
        Violation::BudgetUnderreported { claimed_b_end_q } => {
            if receipt.b_next_q > *claimed_b_end_q {
                Ok(())
            } else {
                Err(RetentionReject::InvalidViolation {
                    reason: format!(
                        "budget not underreported: {} <= {claimed_b_end_q}",
                        receipt.b_next_q
                    ),
                })
            }
        }
        Violation::InvalidStateTransition => {
            let accepted_but_ascending =
                receipt.decision == Decision::Accepted && receipt.dv_q > 0;
            let rejected_but_moved = receipt.decision == Decision::Rejected
                && (receipt.dv_q != 0 || receipt.db_q != 0);
            if accepted_but_ascending || rejected_but_moved {
                Ok(())
            } else {
                Err(RetentionReject::InvalidViolation {
                    reason: "receipt's decision is consistent with its deltas".into(),
                })
            }
        }
        Violation::InvalidReceipt => {
            if receipt.schema_id != SCHEMA_STEP_V1 || !receipt.kkt.is_feasible() {
                Ok(())
            } else {
                Err(RetentionReject::InvalidViolation {
                    reason: "receipt is well-formed".into(),
                })
            }
        }
    }
}
