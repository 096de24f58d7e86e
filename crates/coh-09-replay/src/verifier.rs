//! Full-recompute replay.

use coh_02_canonical::canonical_bytes;
use coh_04_governor::Governor;
use coh_05_proposer::Proposer;
use kernel_runtime::{Environment, Episode, EpisodeConfig, EpisodeRecord};
use shared_types::{CogState, KernelParams, StepReceipt};
use tracing::{info, warn};

use crate::errors::{ReplayError, ReplayResult};

/// Re-run an episode from its inputs and compare against the record.
///
/// The caller reconstructs the environment, proposer, and governor exactly
/// as the original host wired them; everything else is re-derived from
/// `(params, cog0, seed)`. Any field mismatch fails with the first
/// divergent field named and both byte strings hex-prefixed.
#[allow(clippy::too_many_arguments)]
pub fn replay_episode<E: Environment, P: Proposer<E::Obs>>(
    env: E,
    proposer: P,
    governor: Governor,
    params: KernelParams,
    config: EpisodeConfig,
    cog0: CogState,
    seed: u64,
    expected: &EpisodeRecord,
) -> ReplayResult<()> {
    let mut episode = Episode::new(env, proposer, governor, params, config, cog0, seed)?;

    for (step, want) in expected.receipts.iter().enumerate() {
        let outcome = episode.tick()?;
        if outcome.receipt != *want {
            warn!(step, "replay diverged");
            return Err(first_divergence(step, want, &outcome.receipt)?);
        }
    }

    let record = episode.record()?;

    if record.slabs.len() != expected.slabs.len() {
        return Err(ReplayError::Divergence {
            step: expected.receipts.len(),
            field: "slab_count".to_string(),
            expected_hex: hex_of(&expected.slabs.len())?,
            actual_hex: hex_of(&record.slabs.len())?,
        });
    }
    for (index, (want, got)) in expected.slabs.iter().zip(record.slabs.iter()).enumerate() {
        if want != got {
            return Err(first_named_divergence(index, "slab", want, got)?);
        }
    }

    if record.final_state_digest != expected.final_state_digest {
        return Err(ReplayError::Divergence {
            step: expected.receipts.len(),
            field: "final_state_digest".to_string(),
            expected_hex: hex_of(&expected.final_state_digest)?,
            actual_hex: hex_of(&record.final_state_digest)?,
        });
    }

    if record.seed_commit != expected.seed_commit {
        return Err(ReplayError::Divergence {
            step: 0,
            field: "seed_commit".to_string(),
            expected_hex: hex_of(&expected.seed_commit)?,
            actual_hex: hex_of(&record.seed_commit)?,
        });
    }

    info!(receipts = expected.receipts.len(), "replay verified");
    Ok(())
}

/// Name the first receipt field whose canonical bytes differ.
fn first_divergence(
    step: usize,
    want: &StepReceipt,
    got: &StepReceipt,
) -> ReplayResult<ReplayError> {
    first_named_divergence(step, "receipt", want, got)
}

fn first_named_divergence<T: serde::Serialize>(
    step: usize,
    scope: &str,
    want: &T,
    got: &T,
) -> ReplayResult<ReplayError> {
    let want_value = serde_json::to_value(want).map_err(coh_02_canonical::CanonicalError::from)?;
    let got_value = serde_json::to_value(got).map_err(coh_02_canonical::CanonicalError::from)?;

    if let (serde_json::Value::Object(want_map), serde_json::Value::Object(got_map)) =
        (&want_value, &got_value)
    {
        let mut keys: Vec<&String> = want_map.keys().collect();
        keys.sort();
        for key in keys {
            let w = want_map.get(key);
            let g = got_map.get(key);
            if w != g {
                return Ok(ReplayError::Divergence {
                    step,
                    field: key.clone(),
                    expected_hex: hex_of(&w)?,
                    actual_hex: hex_of(&g)?,
                });
            }
        }
    }

    // Structures differ but no single field does (should not happen for
    // records of the same schema); report the whole scope.
    Ok(ReplayError::Divergence {
        step,
        field: scope.to_string(),
        expected_hex: hex_of(&want_value)?,
        actual_hex: hex_of(&got_value)?,
    })
}

fn hex_of<T: serde::Serialize>(value: &T) -> ReplayResult<String> {
    Ok(format!("0x{}", hex::encode(canonical_bytes(value)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{
        Decision, Digest, KktResidual, Projected, WorkUnits, SCHEMA_STEP_V1,
    };

    fn receipt(b_next_q: i64) -> StepReceipt {
        StepReceipt {
            schema_id: SCHEMA_STEP_V1.to_string(),
            step_index: 0,
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
            b_prev_q: 10,
            b_next_q,
            db_q: b_next_q - 10,
            decision: Decision::Accepted,
            reject_code: None,
            kkt: KktResidual { feas_rho_q: 0, feas_c_q: 0, feas_b_q: 0, stationarity_theta_q: 0 },
            work: WorkUnits::ZERO,
            projected: Projected::default(),
            seed_commit: Digest([7u8; 32]),
        }
    }

    #[test]
    fn test_divergence_names_first_field() {
        let want = receipt(9);
        let got = receipt(8);
        let err = first_divergence(3, &want, &got).unwrap();
        match err {
            ReplayError::Divergence { step, field, expected_hex, actual_hex } => {
                assert_eq!(step, 3);
                // b_next_q sorts before db_q among the differing fields.
                assert_eq!(field, "b_next_q");
                assert!(expected_hex.starts_with("0x"));
                assert_ne!(expected_hex, actual_hex);
            }
            other => panic!("expected divergence, got {other}"),
        }
    }

    #[test]
    fn test_identical_receipts_fall_through_to_scope() {
        let want = receipt(9);
        let err = first_divergence(0, &want, &want.clone()).unwrap();
        match err {
            ReplayError::Divergence { field, .. } => assert_eq!(field, "receipt"),
            other => panic!("unexpected {other}"),
        }
    }
}
