//! The retention service: receipt ingest driving the slab FSM.

use coh_02_canonical::canonical_sha256;
use shared_crypto::{chain_next, MerkleTree};
use shared_types::{Digest, SlabReceipt, StepReceipt, Q18, SCHEMA_SLAB_V1};
use tracing::{info, warn};

use crate::domain::finalize::{verify_finalize, FinalizeReceipt};
use crate::domain::fraud::{verify_fraud_proof, FraudProof};
use crate::domain::policy::RetentionPolicy;
use crate::domain::slab::{DisputeInfo, SlabRecord};
use crate::errors::{RetentionReject, RetentionResult};
use crate::registry::{DisputeRegistry, FinalizedRegistry, SlabStore};

/// Build a slab receipt over a window of consecutive step receipts.
///
/// The receipts root is a Merkle root over the canonical leaves of the
/// step receipts, in order; the slab chain links through the same
/// domain-separated chain-hash function as step receipts.
pub fn build_slab_receipt(
    receipts: &[StepReceipt],
    slab_index: u64,
    retention_policy_id: &str,
    chain_prev: Digest,
) -> RetentionResult<SlabReceipt> {
    let leaves: Vec<_> = receipts
        .iter()
        .map(|r| {
            canonical_sha256(r).map_err(|e| RetentionReject::InvalidViolation {
                reason: format!("receipt not canonicalizable: {e}"),
            })
        })
        .collect::<RetentionResult<_>>()?;
    let tree = MerkleTree::from_leaves(&leaves);

    let window_start = receipts.first().map(|r| r.step_index).unwrap_or(0);
    let window_end = receipts.last().map(|r| r.step_index).unwrap_or(0);

    let mut slab = SlabReceipt {
        schema_id: SCHEMA_SLAB_V1.to_string(),
        slab_index,
        window_start,
        window_end,
        receipts_root: Digest(tree.root()),
        receipt_count: receipts.len() as u32,
        retention_policy_id: retention_policy_id.to_string(),
        chain_prev,
        chain_next: Digest::ZERO,
    };
    let core_jcs = coh_02_canonical::canonical_bytes(&slab.core()).map_err(|e| {
        RetentionReject::InvalidViolation { reason: format!("slab core not canonicalizable: {e}") }
    })?;
    slab.chain_next = Digest(chain_next(slab.chain_prev.as_bytes(), &core_jcs));
    Ok(slab)
}

/// Ingest surface for slab, fraud-proof, and finalize receipts.
///
/// The service owns nothing global: the stores arrive from the host and
/// the host serializes writers.
pub struct RetentionService<'a> {
    policy: RetentionPolicy,
    slabs: &'a SlabStore,
    disputes: &'a DisputeRegistry,
    finalized: &'a FinalizedRegistry,
}

impl<'a> RetentionService<'a> {
    /// Wire the service to its stores.
    pub fn new(
        policy: RetentionPolicy,
        slabs: &'a SlabStore,
        disputes: &'a DisputeRegistry,
        finalized: &'a FinalizedRegistry,
    ) -> RetentionResult<Self> {
        policy.validate()?;
        Ok(Self { policy, slabs, disputes, finalized })
    }

    /// The governing policy.
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Ingest a slab receipt, registering its lifecycle record.
    pub fn ingest_slab(&self, slab: &SlabReceipt, current_height: u64) -> RetentionResult<()> {
        if slab.retention_policy_id != self.policy.policy_id() {
            return Err(RetentionReject::UnknownPolicy {
                policy_id: slab.retention_policy_id.clone(),
            });
        }
        let window_end = self.policy.window_end(current_height);
        let record = SlabRecord::register(
            slab.chain_next,
            slab.receipts_root,
            slab.slab_index,
            current_height,
            window_end,
            current_height,
        );
        info!(slab = %slab.chain_next, window_end, "slab registered");
        self.slabs.insert(record);
        Ok(())
    }

    /// Ingest a fraud proof: verify the directed path and the violation,
    /// then mark the slab disputed.
    pub fn ingest_fraud_proof(
        &self,
        proof: &FraudProof,
        current_height: u64,
    ) -> RetentionResult<()> {
        let record = self
            .slabs
            .get(&proof.slab_chain_hash)
            .ok_or_else(|| RetentionReject::UnknownSlab {
                slab: proof.slab_chain_hash.to_string(),
            })?;

        if self.disputes.is_disputed(&proof.slab_chain_hash) {
            return Err(RetentionReject::AlreadyDisputed {
                slab: proof.slab_chain_hash.to_string(),
            });
        }

        verify_fraud_proof(proof, &record.receipts_root)?;

        let info = DisputeInfo {
            fraud_proof_id: proof.proof_id().map_err(|e| RetentionReject::InvalidViolation {
                reason: format!("proof not canonicalizable: {e}"),
            })?,
            height: current_height,
        };
        self.slabs
            .with_mut(&proof.slab_chain_hash, |r| r.mark_disputed(info.clone()))
            .ok_or_else(|| RetentionReject::UnknownSlab {
                slab: proof.slab_chain_hash.to_string(),
            })??;
        self.disputes.register(proof.slab_chain_hash, info);
        warn!(slab = %proof.slab_chain_hash, "dispute registered");
        Ok(())
    }

    /// Ingest a finalize receipt: verify the claim and authorize deletion.
    pub fn ingest_finalize(
        &self,
        receipt: &FinalizeReceipt,
        current_height: u64,
        presented_budget_q: Q18,
    ) -> RetentionResult<()> {
        let record = self
            .slabs
            .get(&receipt.slab_chain_hash)
            .ok_or_else(|| RetentionReject::UnknownSlab {
                slab: receipt.slab_chain_hash.to_string(),
            })?;

        verify_finalize(
            receipt,
            record.window_end,
            &self.policy,
            current_height,
            self.disputes.is_disputed(&receipt.slab_chain_hash),
            presented_budget_q,
        )?;

        self.slabs
            .with_mut(&receipt.slab_chain_hash, |r| {
                r.check_finalizable(current_height, self.policy.retention_period_blocks);
                r.finalize(current_height)
            })
            .ok_or_else(|| RetentionReject::UnknownSlab {
                slab: receipt.slab_chain_hash.to_string(),
            })??;
        self.finalized.register(receipt.slab_chain_hash, receipt.clone());
        Ok(())
    }

    /// Delete a finalized slab's data.
    pub fn delete_slab(&self, slab: &Digest) -> RetentionResult<()> {
        self.slabs
            .with_mut(slab, |r| r.delete())
            .ok_or_else(|| RetentionReject::UnknownSlab { slab: slab.to_string() })?
    }

    /// Height tick: advance Pending windows and clean retention expiries.
    pub fn on_height(&self, current_height: u64) {
        let retention = self.policy.retention_period_blocks;
        for record in self.slabs.all() {
            self.slabs.with_mut(&record.slab_chain_hash, |r| {
                r.on_height(current_height);
                r.check_finalizable(current_height, retention);
            });
        }
    }
}
