//! Structural receipt checks: linkage and chain-hash recomputation.

use coh_02_canonical::canonical_bytes;
use shared_crypto::chain_next;
use shared_types::{check_schema, Digest, StepReceipt, SCHEMA_STEP_V1};

use crate::errors::{ReplayError, ReplayResult};

/// Verify a receipt slice without recomputing any state: schema ids,
/// `chain_prev` linkage from `genesis`, and every `chain_next` against the
/// domain-separated hash of the canonical core.
///
/// Detects any tamper of a `receipt_core` field; it cannot detect a
/// consistently re-hashed forgery, which is what [`crate::replay_episode`]
/// exists for.
pub fn check_receipt_chain(receipts: &[StepReceipt], genesis: Digest) -> ReplayResult<()> {
    let mut expected_prev = genesis;
    for (index, receipt) in receipts.iter().enumerate() {
        check_schema(&receipt.schema_id, SCHEMA_STEP_V1)?;

        if receipt.chain_prev != expected_prev {
            return Err(ReplayError::BrokenChain { index });
        }

        let core_jcs = canonical_bytes(&receipt.core())?;
        let recomputed = Digest(chain_next(receipt.chain_prev.as_bytes(), &core_jcs));
        if recomputed != receipt.chain_next {
            return Err(ReplayError::Divergence {
                step: index,
                field: "chain_next".to_string(),
                expected_hex: format!("0x{}", hex::encode(receipt.chain_next.as_bytes())),
                actual_hex: format!("0x{}", hex::encode(recomputed.as_bytes())),
            });
        }
        expected_prev = receipt.chain_next;
    }
    Ok(())
}
