//! End-to-end determinism, replay, and tamper detection.

#[cfg(test)]
mod tests {
    use coh_01_fixed_point::ONE_Q18;
    use coh_04_governor::{Governor, GovernorConfig};
    use coh_05_proposer::ExplorationConfig;
    use coh_09_replay::{check_receipt_chain, replay_episode, ReplayError};
    use kernel_runtime::adapters::lattice_grid::{GridProposer, LatticeGrid};
    use kernel_runtime::{Episode, EpisodeConfig, EpisodeRecord};
    use shared_crypto::GENESIS;
    use shared_types::{Digest, ReceiptEnvelope};

    use crate::init_tracing;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn run_episode(seed: u64, max_steps: u64) -> EpisodeRecord {
        let grid = LatticeGrid::simple();
        let params = grid.params();
        let cog0 = grid.initial_cog_state(64 * ONE_Q18);
        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        let mut episode = Episode::new(
            grid,
            proposer,
            Governor::new(GovernorConfig::default()),
            params,
            EpisodeConfig {
                max_steps,
                slab_size: 4,
                drift_every: 5,
                ..EpisodeConfig::for_testing()
            },
            cog0,
            seed,
        )
        .unwrap();
        episode.run().unwrap()
    }

    // =========================================================================
    // SCENARIO 6: determinism across runs and divergence across seeds
    // =========================================================================

    #[test]
    fn test_identical_runs_are_byte_identical() {
        init_tracing();
        let a = run_episode(42, 10);
        let b = run_episode(42, 10);
        assert_eq!(a.receipts, b.receipts);
        assert_eq!(a.slabs, b.slabs);
        assert_eq!(a.final_state_digest, b.final_state_digest);
        for (ra, rb) in a.receipts.iter().zip(b.receipts.iter()) {
            assert_eq!(ra.chain_next, rb.chain_next);
        }
    }

    #[test]
    fn test_seed_change_diverges_at_first_step() {
        init_tracing();
        let a = run_episode(1, 6);
        let b = run_episode(2, 6);
        // The seed commitment sits in every receipt core, so the chains
        // split from the very first tick.
        assert_ne!(a.receipts[0].chain_next, b.receipts[0].chain_next);
    }

    // =========================================================================
    // Full replay (spec property: replay(receipts) == receipts)
    // =========================================================================

    #[test]
    fn test_replay_reproduces_episode_bytewise() {
        init_tracing();
        let record = run_episode(42, 12);

        let grid = LatticeGrid::simple();
        let params = grid.params();
        let cog0 = grid.initial_cog_state(64 * ONE_Q18);
        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        replay_episode(
            grid,
            proposer,
            Governor::new(GovernorConfig::default()),
            params,
            EpisodeConfig {
                max_steps: 12,
                slab_size: 4,
                drift_every: 5,
                ..EpisodeConfig::for_testing()
            },
            cog0,
            42,
            &record,
        )
        .unwrap();
    }

    #[test]
    fn test_replay_detects_forged_field() {
        init_tracing();
        let mut record = run_episode(42, 8);
        record.receipts[3].b_next_q += 1;

        let grid = LatticeGrid::simple();
        let params = grid.params();
        let cog0 = grid.initial_cog_state(64 * ONE_Q18);
        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        let err = replay_episode(
            grid,
            proposer,
            Governor::new(GovernorConfig::default()),
            params,
            EpisodeConfig {
                max_steps: 8,
                slab_size: 4,
                drift_every: 5,
                ..EpisodeConfig::for_testing()
            },
            cog0,
            42,
            &record,
        )
        .unwrap_err();

        match err {
            ReplayError::Divergence { step, field, .. } => {
                assert_eq!(step, 3);
                assert_eq!(field, "b_next_q");
            }
            other => panic!("expected divergence, got {other}"),
        }
    }

    // =========================================================================
    // Tamper detection without recomputation
    // =========================================================================

    #[test]
    fn test_core_field_tamper_breaks_chain_hash() {
        init_tracing();
        let record = run_episode(9, 6);
        check_receipt_chain(&record.receipts, Digest(GENESIS)).unwrap();

        // Mutating any core field invalidates that receipt's chain hash.
        let mut forged = record.receipts.clone();
        forged[2].dv_q -= 1;
        let err = check_receipt_chain(&forged, Digest(GENESIS)).unwrap_err();
        match err {
            ReplayError::Divergence { step, field, .. } => {
                assert_eq!(step, 2);
                assert_eq!(field, "chain_next");
            }
            other => panic!("expected chain divergence, got {other}"),
        }

        // Splicing a receipt out breaks linkage.
        let mut spliced = record.receipts.clone();
        spliced.remove(1);
        assert!(matches!(
            check_receipt_chain(&spliced, Digest(GENESIS)),
            Err(ReplayError::BrokenChain { index: 1 })
        ));
    }

    #[test]
    fn test_envelope_metadata_does_not_affect_chain() {
        init_tracing();
        let record = run_episode(9, 4);
        let receipt = record.receipts[0].clone();

        let mut envelope = ReceiptEnvelope {
            receipt: receipt.clone(),
            emitted_at_unix: 1_700_000_000,
            signer: Some("operator-a".into()),
            label: None,
        };
        // Rewriting transport metadata leaves the receipt and chain intact.
        envelope.emitted_at_unix = 1_800_000_000;
        envelope.signer = Some("operator-b".into());
        envelope.label = Some("relabeled".into());

        assert_eq!(envelope.receipt, receipt);
        check_receipt_chain(&record.receipts, Digest(GENESIS)).unwrap();
    }

    // =========================================================================
    // Pause/resume: cancellation is cooperative and inter-tick
    // =========================================================================

    #[test]
    fn test_checkpoint_resume_is_bit_identical() {
        init_tracing();
        // Planner-driven so no proposer state needs restoring.
        let grid = LatticeGrid::corridor();
        let params = grid.params();
        let cog0 = grid.initial_cog_state(32 * ONE_Q18);
        let config = EpisodeConfig {
            max_steps: 10,
            slab_size: 5,
            drift_every: 3,
            use_planner: true,
            ..EpisodeConfig::for_testing()
        };

        // Straight-through run.
        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        let mut straight = Episode::new(
            grid.clone(),
            proposer,
            Governor::new(GovernorConfig::default()),
            params.clone(),
            config.clone(),
            cog0.clone(),
            13,
        )
        .unwrap();
        let full = straight.run().unwrap();

        // Paused run: five ticks, checkpoint, drop, resume, finish.
        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        let mut first_half = Episode::new(
            grid.clone(),
            proposer,
            Governor::new(GovernorConfig::default()),
            params.clone(),
            config.clone(),
            cog0,
            13,
        )
        .unwrap();
        for _ in 0..5 {
            first_half.tick().unwrap();
        }
        let checkpoint = first_half.checkpoint();
        drop(first_half);

        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        let mut resumed = Episode::resume(
            grid,
            proposer,
            Governor::new(GovernorConfig::default()),
            params,
            config,
            13,
            checkpoint,
        )
        .unwrap();
        let rejoined = resumed.run().unwrap();

        assert_eq!(full.receipts, rejoined.receipts);
        assert_eq!(full.slabs, rejoined.slabs);
        assert_eq!(full.final_state_digest, rejoined.final_state_digest);
    }

    // =========================================================================
    // The ledger is the byte-exact persistence surface
    // =========================================================================

    #[test]
    fn test_ledger_blobs_match_canonical_receipts() {
        init_tracing();
        let grid = LatticeGrid::simple();
        let params = grid.params();
        let cog0 = grid.initial_cog_state(32 * ONE_Q18);
        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        let mut episode = Episode::new(
            grid,
            proposer,
            Governor::new(GovernorConfig::default()),
            params,
            EpisodeConfig { max_steps: 6, slab_size: 0, ..EpisodeConfig::for_testing() },
            cog0,
            21,
        )
        .unwrap();
        let record = episode.run().unwrap();

        let ledger = episode.ledger();
        assert_eq!(ledger.len(), record.receipts.len());
        for (i, receipt) in record.receipts.iter().enumerate() {
            let expected = coh_02_canonical::canonical_bytes(receipt).unwrap();
            assert_eq!(ledger.blob(i).unwrap(), expected.as_slice());
            assert_eq!(ledger.parse(i).unwrap(), *receipt);
        }
    }

    // =========================================================================
    // Planner-driven episodes replay too
    // =========================================================================

    #[test]
    fn test_planner_episode_replays() {
        init_tracing();
        let grid = LatticeGrid::simple();
        let params = grid.params();
        let cog0 = grid.initial_cog_state(16 * ONE_Q18);
        let config = EpisodeConfig {
            max_steps: 6,
            slab_size: 0,
            use_planner: true,
            ..EpisodeConfig::for_testing()
        };
        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        let mut episode = Episode::new(
            grid.clone(),
            proposer,
            Governor::new(GovernorConfig::default()),
            params.clone(),
            config.clone(),
            cog0.clone(),
            5,
        )
        .unwrap();
        let record = episode.run().unwrap();

        // Planner commitments are present on every tick.
        for receipt in &record.receipts {
            assert!(receipt.planset_root.is_some());
            assert!(receipt.chosen_plan_hash.is_some());
        }

        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        replay_episode(
            grid,
            proposer,
            Governor::new(GovernorConfig::default()),
            params,
            config,
            cog0,
            5,
            &record,
        )
        .unwrap();
    }
}
