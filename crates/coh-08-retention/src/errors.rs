//! Retention rejection codes.
//!
//! These are class-3 outcomes: recorded against the slab FSM and returned
//! to the host as data. They never abort the kernel process.

use thiserror::Error;

/// Why a retention-layer ingest was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetentionReject {
    /// A second fraud proof arrived for an already-disputed slab.
    #[error("REJECT_ALREADY_DISPUTED: slab {slab} already has a registered dispute")]
    AlreadyDisputed {
        /// Disputed slab chain hash (prefixed form)
        slab: String,
    },

    /// A finalize receipt named the wrong window or finalize height.
    #[error("REJECT_WINDOW_MISMATCH: claimed {claimed}, derived {derived}")]
    WindowMismatch {
        /// Height claimed by the receipt
        claimed: u64,
        /// Height derived from the slab and policy
        derived: u64,
    },

    /// Finalize attempted before the retention period elapsed.
    #[error("REJECT_PREMATURE_FINALIZE: height {height} < finalize height {finalize_height}")]
    PrematureFinalize {
        /// Current block height
        height: u64,
        /// Earliest admissible finalize height
        finalize_height: u64,
    },

    /// Finalize attempted on a disputed slab. Terminal: the slab never
    /// finalizes.
    #[error("REJECT_DISPUTED: slab {slab} is disputed")]
    Disputed {
        /// Disputed slab chain hash (prefixed form)
        slab: String,
    },

    /// The deletion-authorization budget floor was not met.
    #[error("REJECT_BUDGET_INSUFFICIENT: budget {budget_q} < required {min_q}")]
    BudgetInsufficient {
        /// Offered budget (Q18)
        budget_q: i64,
        /// Policy floor (Q18)
        min_q: i64,
    },

    /// The directed Merkle path did not reproduce the slab's root.
    #[error("INVALID_MERKLE_PROOF: leaf not in tree")]
    InvalidMerkleProof,

    /// The claimed violation is not exhibited by the disputed receipt.
    #[error("INVALID_VIOLATION: {reason}")]
    InvalidViolation {
        /// Why the claim failed
        reason: String,
    },

    /// The named slab is not registered.
    #[error("unknown slab: {slab}")]
    UnknownSlab {
        /// Requested slab chain hash (prefixed form)
        slab: String,
    },

    /// A receipt referenced a policy other than the service's.
    #[error("unknown retention policy: {policy_id}")]
    UnknownPolicy {
        /// Referenced policy id
        policy_id: String,
    },

    /// Deletion attempted without authorization.
    #[error("deletion not authorized for slab {slab}")]
    DeletionNotAuthorized {
        /// Slab chain hash (prefixed form)
        slab: String,
    },
}

/// Result type for retention operations.
pub type RetentionResult<T> = Result<T, RetentionReject>;
