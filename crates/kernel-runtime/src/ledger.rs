//! The produced persistence surface: an append-only sequence of canonical
//! receipt blobs.
//!
//! The kernel persists nothing itself; it hands the host byte-exact JCS
//! blobs in publication order. A slab is produced by grouping consecutive
//! blobs and Merkle-committing their hashes, which is exactly what the
//! episode's slab emission does over the same window.

use coh_02_canonical::canonical_bytes;
use shared_types::StepReceipt;

use crate::errors::RuntimeResult;

/// Append-only receipt log in canonical-bytes form.
#[derive(Clone, Debug, Default)]
pub struct JcsLedger {
    blobs: Vec<Vec<u8>>,
}

impl JcsLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a receipt's canonical bytes. Blobs are never mutated or
    /// removed; deletion happens at slab granularity under the retention
    /// FSM, not here.
    pub fn append(&mut self, receipt: &StepReceipt) -> RuntimeResult<()> {
        self.blobs.push(canonical_bytes(receipt)?);
        Ok(())
    }

    /// Number of blobs appended.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Blob at `index`, byte-exact as published.
    pub fn blob(&self, index: usize) -> Option<&[u8]> {
        self.blobs.get(index).map(Vec::as_slice)
    }

    /// Iterate blobs in publication order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.blobs.iter().map(Vec::as_slice)
    }

    /// Parse a blob back into its typed receipt.
    pub fn parse(&self, index: usize) -> Option<StepReceipt> {
        self.blob(index)
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{
        Decision, Digest, KktResidual, Projected, WorkUnits, SCHEMA_STEP_V1,
    };

    fn receipt(step_index: u64) -> StepReceipt {
        StepReceipt {
            schema_id: SCHEMA_STEP_V1.to_string(),
            step_index,
            chain_prev: Digest::ZERO,
            chain_next: Digest([1u8; 32]),
            state_hash_prev: Digest([2u8; 32]),
            state_hash_next: Digest([3u8; 32]),
            action_hash: Digest([4u8; 32]),
            proposalset_root: Digest([5u8; 32]),
            chosen_proposal_index: 0,
            chosen_proposal_hash: Digest([6u8; 32]),
            planset_root: None,
            chosen_plan_index: None,
            chosen_plan_hash: None,
            option_phase: None,
            option_id: None,
            v_prev_q: 0,
            v_next_q: 0,
            dv_q: 0,
            b_prev_q: 0,
            b_next_q: 0,
            db_q: 0,
            decision: Decision::Accepted,
            reject_code: None,
            kkt: KktResidual { feas_rho_q: 0, feas_c_q: 0, feas_b_q: 0, stationarity_theta_q: 0 },
            work: WorkUnits::ZERO,
            projected: Projected::default(),
            seed_commit: Digest([7u8; 32]),
        }
    }

    #[test]
    fn test_append_preserves_order_and_bytes() {
        let mut ledger = JcsLedger::new();
        ledger.append(&receipt(0)).unwrap();
        ledger.append(&receipt(1)).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_ne!(ledger.blob(0), ledger.blob(1));
        // Blob bytes are the canonical form.
        assert_eq!(
            ledger.blob(0).unwrap(),
            canonical_bytes(&receipt(0)).unwrap().as_slice()
        );
    }

    #[test]
    fn test_parse_round_trips() {
        let mut ledger = JcsLedger::new();
        let original = receipt(7);
        ledger.append(&original).unwrap();
        assert_eq!(ledger.parse(0).unwrap(), original);
        assert!(ledger.parse(1).is_none());
    }
}
