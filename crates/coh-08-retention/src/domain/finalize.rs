//! Finalize receipts: the deletion-authorization gate.

use coh_02_canonical::{canonical_sha256, CanonicalError};
use serde::{Deserialize, Serialize};
use shared_types::{Digest, Q18};

use crate::domain::policy::RetentionPolicy;
use crate::errors::{RetentionReject, RetentionResult};

/// A claim that a slab's retention obligations have run out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeReceipt {
    /// The slab being finalized.
    pub slab_chain_hash: Digest,
    /// The claimed challenge-window close height.
    pub window_end_height: u64,
    /// The claimed finalize height (`window_end + retention_period`).
    pub finalize_height: u64,
    /// The policy the claim is made under.
    pub retention_policy_id: String,
}

impl FinalizeReceipt {
    /// Content id of this receipt.
    pub fn receipt_id(&self) -> Result<Digest, CanonicalError> {
        Ok(Digest(canonical_sha256(self)?))
    }
}

/// Verify a finalize claim.
///
/// Checks, in order: the claimed window end matches the slab's, the
/// claimed finalize height matches the policy derivation, the current
/// height has reached it, the dispute registry is clean, and the
/// authorization budget floor is met.
pub fn verify_finalize(
    receipt: &FinalizeReceipt,
    slab_window_end: u64,
    policy: &RetentionPolicy,
    current_height: u64,
    is_disputed: bool,
    presented_budget_q: Q18,
) -> RetentionResult<()> {
    if receipt.retention_policy_id != policy.policy_id() {
        return Err(RetentionReject::UnknownPolicy {
            policy_id: receipt.retention_policy_id.clone(),
        });
    }

    if receipt.window_end_height != slab_window_end {
        return Err(RetentionReject::WindowMismatch {
            claimed: receipt.window_end_height,
            derived: slab_window_end,
        });
    }

    let derived_finalize = policy.finalize_height(slab_window_end);
    if receipt.finalize_height != derived_finalize {
        return Err(RetentionReject::WindowMismatch {
            claimed: receipt.finalize_height,
            derived: derived_finalize,
        });
    }

    if current_height < derived_finalize {
        return Err(RetentionReject::PrematureFinalize {
            height: current_height,
            finalize_height: derived_finalize,
        });
    }

    if policy.deletion_authorization.no_disputes && is_disputed {
        return Err(RetentionReject::Disputed { slab: receipt.slab_chain_hash.to_string() });
    }

    if presented_budget_q < policy.deletion_authorization.min_budget_q {
        return Err(RetentionReject::BudgetInsufficient {
            budget_q: presented_budget_q,
            min_q: policy.deletion_authorization.min_budget_q,
        });
    }

    Ok(())
}
