//! The slab lifecycle FSM.

use serde::{Deserialize, Serialize};
use shared_types::Digest;
use tracing::info;

use crate::errors::{RetentionReject, RetentionResult};

/// Slab lifecycle states, in lifecycle order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlabState {
    /// Registered, waiting for its window to open.
    #[default]
    Pending,
    /// Within the retention window; fraud proofs are admissible.
    Active,
    /// A fraud proof verified. Terminal for deletion.
    Disputed,
    /// Retention period elapsed with a clean registry.
    Finalizable,
    /// A finalize receipt verified; deletion authorized.
    Finalized,
    /// Gone.
    Deleted,
}

/// Dispute bookkeeping on a slab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisputeInfo {
    /// Content id of the accepted fraud proof.
    pub fraud_proof_id: Digest,
    /// Height at which the dispute registered.
    pub height: u64,
}

/// Verifier-side state for one slab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabRecord {
    /// The slab's chain hash (its identity).
    pub slab_chain_hash: Digest,
    /// Merkle root over the slab's step receipts.
    pub receipts_root: Digest,
    /// Slab sequence number.
    pub slab_index: u64,
    /// First covered height.
    pub window_start: u64,
    /// Last covered height; the challenge window closes here.
    pub window_end: u64,
    /// Height at which the slab was accepted.
    pub accept_height: u64,
    /// Current FSM state.
    pub state: SlabState,
    /// Dispute details, once disputed.
    pub dispute: Option<DisputeInfo>,
    /// Height at which finalization occurred.
    pub finalize_height: Option<u64>,
    /// Deletion has been authorized by a verified finalize receipt.
    pub deletion_authorized: bool,
}

impl SlabRecord {
    /// Register a slab at `accept_height`; it activates once the current
    /// height reaches its window start.
    pub fn register(
        slab_chain_hash: Digest,
        receipts_root: Digest,
        slab_index: u64,
        window_start: u64,
        window_end: u64,
        accept_height: u64,
    ) -> Self {
        let state = if accept_height >= window_start {
            SlabState::Active
        } else {
            SlabState::Pending
        };
        Self {
            slab_chain_hash,
            receipts_root,
            slab_index,
            window_start,
            window_end,
            accept_height,
            state,
            dispute: None,
            finalize_height: None,
            deletion_authorized: false,
        }
    }

    /// Advance Pending to Active once the window opens. Idempotent.
    pub fn on_height(&mut self, current_height: u64) {
        if self.state == SlabState::Pending && current_height >= self.window_start {
            self.state = SlabState::Active;
        }
    }

    /// Record a verified dispute.
    ///
    /// Idempotency: replaying a dispute against an already-later state is a
    /// no-op; a second dispute against a Disputed slab is
    /// `REJECT_ALREADY_DISPUTED`.
    pub fn mark_disputed(&mut self, info: DisputeInfo) -> RetentionResult<()> {
        match self.state {
            SlabState::Disputed => Err(RetentionReject::AlreadyDisputed {
                slab: self.slab_chain_hash.to_string(),
            }),
            SlabState::Finalized | SlabState::Deleted => Ok(()),
            _ => {
                info!(slab = %self.slab_chain_hash, height = info.height, "slab disputed");
                self.state = SlabState::Disputed;
                self.dispute = Some(info);
                Ok(())
            }
        }
    }

    /// Advance Active to Finalizable once the retention period elapses with
    /// a clean dispute record. Returns whether the slab is now finalizable.
    pub fn check_finalizable(&mut self, current_height: u64, retention_period_blocks: u64) -> bool {
        match self.state {
            SlabState::Finalizable => true,
            SlabState::Active
                if current_height >= self.window_end + retention_period_blocks =>
            {
                self.state = SlabState::Finalizable;
                true
            }
            _ => false,
        }
    }

    /// Record a verified finalize receipt, authorizing deletion.
    ///
    /// Finalize on a Disputed slab fails `REJECT_DISPUTED` no matter how
    /// late it arrives; finalize on a Finalized slab is a no-op.
    pub fn finalize(&mut self, at_height: u64) -> RetentionResult<()> {
        match self.state {
            SlabState::Disputed => Err(RetentionReject::Disputed {
                slab: self.slab_chain_hash.to_string(),
            }),
            SlabState::Finalized | SlabState::Deleted => Ok(()),
            _ => {
                info!(slab = %self.slab_chain_hash, at_height, "slab finalized");
                self.state = SlabState::Finalized;
                self.finalize_height = Some(at_height);
                self.deletion_authorized = true;
                Ok(())
            }
        }
    }

    /// Delete the slab's data. Requires a finalized, authorized record.
    pub fn delete(&mut self) -> RetentionResult<()> {
        match self.state {
            SlabState::Deleted => Ok(()),
            SlabState::Finalized if self.deletion_authorized => {
                info!(slab = %self.slab_chain_hash, "slab deleted");
                self.state = SlabState::Deleted;
                Ok(())
            }
            _ => Err(RetentionReject::DeletionNotAuthorized {
                slab: self.slab_chain_hash.to_string(),
            }),
        }
    }

    /// The slab's data may be dropped.
    pub fn can_delete(&self) -> bool {
        self.state == SlabState::Finalized && self.deletion_authorized
    }
}
