//! Consensus scenarios: slab commitment, fraud proofs, finalize gates.

#[cfg(test)]
mod tests {
    use coh_01_fixed_point::ONE_Q18;
    use coh_02_canonical::canonical_sha256;
    use coh_04_governor::{Governor, GovernorConfig};
    use coh_05_proposer::{ExplorationConfig, RelaxProposer};
    use coh_08_retention::{
        build_slab_receipt, DisputeRegistry, FinalizedRegistry, FinalizeReceipt, FraudProof,
        RetentionPolicy, RetentionReject, RetentionService, SlabStore, Violation,
    };
    use kernel_runtime::adapters::lattice_grid::{GridProposer, LatticeGrid};
    use kernel_runtime::{Episode, EpisodeConfig};
    use shared_crypto::MerkleTree;
    use shared_types::{Digest, SlabReceipt, StepReceipt};

    use crate::init_tracing;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn policy() -> RetentionPolicy {
        RetentionPolicy {
            retention_period_blocks: 100,
            dispute_window_blocks: 50,
            ..RetentionPolicy::default()
        }
    }

    /// Run a short grid episode and return the first three receipts with a
    /// slab committed over them.
    fn episode_slab() -> (SlabReceipt, Vec<StepReceipt>) {
        let grid = LatticeGrid::simple();
        let params = grid.params();
        let cog0 = grid.initial_cog_state(32 * ONE_Q18);
        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        let mut episode = Episode::new(
            grid,
            proposer,
            Governor::new(GovernorConfig::default()),
            params,
            EpisodeConfig { slab_size: 0, max_steps: 3, ..EpisodeConfig::for_testing() },
            cog0,
            42,
        )
        .unwrap();
        let record = episode.run().unwrap();
        assert_eq!(record.receipts.len(), 3);

        let slab =
            build_slab_receipt(&record.receipts, 0, &policy().policy_id(), Digest::ZERO).unwrap();
        (slab, record.receipts)
    }

    struct Stores {
        slabs: SlabStore,
        disputes: DisputeRegistry,
        finalized: FinalizedRegistry,
    }

    impl Stores {
        fn new() -> Self {
            Self {
                slabs: SlabStore::new(),
                disputes: DisputeRegistry::new(),
                finalized: FinalizedRegistry::new(),
            }
        }

        fn service(&self) -> RetentionService<'_> {
            RetentionService::new(policy(), &self.slabs, &self.disputes, &self.finalized)
                .unwrap()
        }
    }

    // =========================================================================
    // SCENARIO 3: Merkle fraud proof on a three-receipt slab
    // =========================================================================

    #[test]
    fn test_tampered_leaf_yields_invalid_merkle_proof() {
        init_tracing();
        let (slab, receipts) = episode_slab();
        let stores = Stores::new();
        let service = stores.service();
        service.ingest_slab(&slab, 1000).unwrap();

        let leaves: Vec<_> =
            receipts.iter().map(|r| canonical_sha256(r).unwrap()).collect();
        let tree = MerkleTree::from_leaves(&leaves);
        assert_eq!(Digest(tree.root()), slab.receipts_root);

        // Mutate leaf 1's b_next_q and resubmit with leaf 1's honest path.
        let mut tampered = receipts[1].clone();
        tampered.b_next_q += ONE_Q18;

        let proof = FraudProof {
            slab_chain_hash: slab.chain_next,
            micro_receipt_index: 1,
            micro_receipt: tampered,
            violation: Violation::BudgetUnderreported { claimed_b_end_q: 0 },
            directed_path: tree.prove(1).unwrap(),
            claimed_root: slab.receipts_root,
        };

        assert_eq!(
            service.ingest_fraud_proof(&proof, 1010).unwrap_err(),
            RetentionReject::InvalidMerkleProof
        );
        assert!(!stores.disputes.is_disputed(&slab.chain_next));
    }

    // =========================================================================
    // SCENARIO 4: finalize before retention elapses
    // =========================================================================

    #[test]
    fn test_premature_finalize_rejected() {
        init_tracing();
        let (slab, _) = episode_slab();
        let stores = Stores::new();
        let service = stores.service();

        // Accepted at height 1000: window_end = 1050, finalize = 1150.
        service.ingest_slab(&slab, 1000).unwrap();
        let record = stores.slabs.get(&slab.chain_next).unwrap();
        assert_eq!(record.window_end, 1050);

        let finalize = FinalizeReceipt {
            slab_chain_hash: slab.chain_next,
            window_end_height: record.window_end,
            finalize_height: policy().finalize_height(record.window_end),
            retention_policy_id: policy().policy_id(),
        };

        let err = service.ingest_finalize(&finalize, 1100, 0).unwrap_err();
        assert_eq!(
            err,
            RetentionReject::PrematureFinalize { height: 1100, finalize_height: 1150 }
        );

        // At maturity the same receipt verifies.
        service.ingest_finalize(&finalize, 1150, 0).unwrap();
        assert!(stores.finalized.is_finalized(&slab.chain_next));
    }

    // =========================================================================
    // SCENARIO 5: an accepted dispute blocks finalize forever
    // =========================================================================

    #[test]
    fn test_dispute_blocks_finalize_forever() {
        init_tracing();
        let (slab, receipts) = episode_slab();
        let stores = Stores::new();
        let service = stores.service();
        service.ingest_slab(&slab, 1000).unwrap();

        let leaves: Vec<_> =
            receipts.iter().map(|r| canonical_sha256(r).unwrap()).collect();
        let tree = MerkleTree::from_leaves(&leaves);

        // Receipt 0's actual ending budget refutes a zero claim.
        let proof = FraudProof {
            slab_chain_hash: slab.chain_next,
            micro_receipt_index: 0,
            micro_receipt: receipts[0].clone(),
            violation: Violation::BudgetUnderreported { claimed_b_end_q: 0 },
            directed_path: tree.prove(0).unwrap(),
            claimed_root: slab.receipts_root,
        };
        service.ingest_fraud_proof(&proof, 1500).unwrap();
        assert!(stores.disputes.is_disputed(&slab.chain_next));

        let record = stores.slabs.get(&slab.chain_next).unwrap();
        let finalize = FinalizeReceipt {
            slab_chain_hash: slab.chain_next,
            window_end_height: record.window_end,
            finalize_height: policy().finalize_height(record.window_end),
            retention_policy_id: policy().policy_id(),
        };

        // Attempted at height 2200, far past maturity: still refused.
        let err = service.ingest_finalize(&finalize, 2200, 0).unwrap_err();
        assert!(matches!(err, RetentionReject::Disputed { .. }));
        assert!(!stores.finalized.is_finalized(&slab.chain_next));
    }

    // =========================================================================
    // Slab chaining across windows
    // =========================================================================

    #[test]
    fn test_episode_emits_chained_slabs() {
        init_tracing();
        let grid = LatticeGrid::simple();
        let params = grid.params();
        let cog0 = grid.initial_cog_state(64 * ONE_Q18);
        let proposer = GridProposer::new(grid.clone(), ExplorationConfig::default());
        let mut episode = Episode::new(
            grid,
            proposer,
            Governor::new(GovernorConfig::default()),
            params,
            EpisodeConfig { slab_size: 4, max_steps: 12, ..EpisodeConfig::for_testing() },
            cog0,
            7,
        )
        .unwrap();
        let record = episode.run().unwrap();

        assert!(!record.slabs.is_empty());
        for (i, slab) in record.slabs.iter().enumerate() {
            assert_eq!(slab.slab_index, i as u64);
            assert_eq!(slab.receipt_count, 4);
            // Slab-level chain continuity.
            if i == 0 {
                assert_eq!(slab.chain_prev, Digest::ZERO);
            } else {
                assert_eq!(slab.chain_prev, record.slabs[i - 1].chain_next);
            }
            // Root recomputes from the committed window.
            let window = &record.receipts[i * 4..(i + 1) * 4];
            let leaves: Vec<_> =
                window.iter().map(|r| canonical_sha256(r).unwrap()).collect();
            assert_eq!(Digest(MerkleTree::from_leaves(&leaves).root()), slab.receipts_root);
        }
    }

    // =========================================================================
    // Relax proposer drives a non-grid episode (kernel-native task)
    // =========================================================================

    #[test]
    fn test_relax_episode_reaches_flat_phase() {
        init_tracing();
        let grid = LatticeGrid::simple();
        let mut cog0 = grid.initial_cog_state(64 * ONE_Q18);
        cog0.theta.set(3, 3, 5);
        let params = grid.params();
        let proposer = RelaxProposer::new(ExplorationConfig::disabled());
        let mut episode = Episode::new(
            grid,
            proposer,
            Governor::new(GovernorConfig::default()),
            params,
            EpisodeConfig { max_steps: 10, slab_size: 0, ..EpisodeConfig::for_testing() },
            cog0,
            3,
        )
        .unwrap();
        let record = episode.run().unwrap();

        // The spike relaxes tick by tick under the Lyapunov gate.
        let accepted = record.receipts.iter().filter(|r| r.is_accepted()).count();
        assert!(accepted >= 5, "expected sustained descent, got {accepted} accepts");
        assert!(episode.state().theta.get(3, 3) < 5);
    }
}
