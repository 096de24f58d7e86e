//! Engine-level scenarios: absorption, projection, determinism.

#[cfg(test)]
mod tests {
    use coh_01_fixed_point::ONE_Q18;
    use coh_03_microstep::{gmi_step, StepCtx};
    use shared_crypto::GENESIS;
    use shared_types::{
        CogState, Decision, Digest, KernelParams, Lattice, MicroAction, RejectCode,
    };

    use crate::init_tracing;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn spiked_state(b: i64) -> CogState {
        let mut s = CogState::new(
            Lattice::zeros(3, 3),
            Lattice::zeros(3, 3),
            Lattice::zeros(3, 3),
            b,
        )
        .unwrap();
        s.theta.set(1, 1, 4);
        s
    }

    fn raise_theta() -> MicroAction {
        let mut a = MicroAction::stay(3, 3);
        a.dtheta.set(1, 1, 1);
        a
    }

    fn ctx() -> StepCtx {
        StepCtx::new(Digest::ZERO, 0, Digest::ZERO, Digest::ZERO)
    }

    // =========================================================================
    // SCENARIO 1: zero-budget absorption
    // =========================================================================

    #[test]
    fn test_zero_budget_absorption_receipt_fields() {
        init_tracing();
        let params = KernelParams::default();
        let s0 = spiked_state(0);

        let (s1, receipt) =
            gmi_step(&s0, &raise_theta(), &ctx(), &params, Digest(GENESIS)).unwrap();

        assert_eq!(receipt.decision, Decision::Rejected);
        assert_eq!(receipt.reject_code, Some(RejectCode::AbsorbB0DvPos));
        assert_eq!(receipt.dv_q, 0);
        assert_eq!(receipt.b_next_q, 0);
        assert_eq!(receipt.db_q, 0);
        // Time still advanced: the absorbing tick is auditable.
        assert_eq!(s1.t, s0.t + 1);
        assert_eq!(s1.theta, s0.theta);
    }

    // =========================================================================
    // SCENARIO 2: projection clamp at rho_max
    // =========================================================================

    #[test]
    fn test_projection_clamp_at_rho_max() {
        init_tracing();
        // Barrier weight zeroed: the clamped deposit is Lyapunov-neutral.
        let params = KernelParams { w_budget_barrier_q: 0, ..KernelParams::default() };
        let mut s0 = CogState::new(
            Lattice::zeros(2, 2),
            Lattice::zeros(2, 2),
            Lattice::zeros(2, 2),
            10 * ONE_Q18,
        )
        .unwrap();
        s0.rho.set(0, 0, params.rho_max);

        let mut action = MicroAction::stay(2, 2);
        action.drho.set(0, 0, 1);

        let (s1, receipt) = gmi_step(&s0, &action, &ctx(), &params, Digest(GENESIS)).unwrap();

        assert_eq!(s1.rho.get(0, 0), params.rho_max);
        assert!(receipt.projected.rho);
        assert_eq!(receipt.decision, Decision::Accepted);
        assert!(receipt.dv_q <= 0);
        assert!(s1.in_feasible_set(&params));
    }

    // =========================================================================
    // Universal invariants over a trajectory
    // =========================================================================

    #[test]
    fn test_trajectory_invariants() {
        init_tracing();
        let params = KernelParams::default();
        let mut state = spiked_state(4 * ONE_Q18);
        let mut chain = Digest(GENESIS);

        for step in 0..12u64 {
            // Alternate descents and ascents so both paths get exercised.
            let action = if step % 3 == 2 {
                raise_theta()
            } else {
                let mut a = MicroAction::stay(3, 3);
                a.dtheta.set(1, 1, -1);
                a
            };
            let (next, receipt) = gmi_step(&state, &action, &ctx(), &params, chain).unwrap();

            // Admissibility after every tick.
            assert!(next.in_feasible_set(&params));
            // Budget monotonicity.
            assert!(next.b <= state.b);
            // Lyapunov non-increase on accepts, zero delta on rejects.
            match receipt.decision {
                Decision::Accepted => assert!(receipt.dv_q <= 0),
                Decision::Rejected => assert_eq!(receipt.dv_q, 0),
            }
            // Feasibility residuals are a hard invariant.
            assert!(receipt.kkt.is_feasible());
            // Chain linkage.
            assert_eq!(receipt.chain_prev, chain);

            chain = receipt.chain_next;
            state = next;
        }
    }

    // =========================================================================
    // Skill options stay inside the governed chain
    // =========================================================================

    #[test]
    fn test_option_unfolds_on_the_episode_chain() {
        init_tracing();
        use coh_04_governor::{Governor, GovernorConfig};
        use coh_07_options::{unfold, SkillRegistry};
        use shared_types::OptionPhase;

        struct NoHazards;
        impl coh_04_governor::SafetyOracle for NoHazards {
            fn hazard_mask(&self, state: &CogState) -> shared_types::HazardMask {
                shared_types::HazardMask::clear(state.rho.rows(), state.rho.cols())
            }
        }

        let params = KernelParams { w_budget_barrier_q: 0, ..KernelParams::default() };
        let s0 = spiked_state(10 * ONE_Q18);

        // One ordinary tick first, then the option continues from its tip.
        let mut a = MicroAction::stay(3, 3);
        a.dtheta.set(1, 1, -1);
        let (s1, first) = gmi_step(&s0, &a, &ctx(), &params, Digest(GENESIS)).unwrap();

        let registry = SkillRegistry::with_builtins();
        let relax = registry.get("relax-phase").unwrap();
        let exec = unfold(
            relax,
            &s1,
            &params,
            &Governor::new(GovernorConfig::default()),
            &NoHazards,
            42,
            first.seed_commit,
            first.chain_next,
        )
        .unwrap();

        // The option's receipts extend the episode chain without a seam.
        assert_eq!(exec.receipts[0].chain_prev, first.chain_next);
        assert!(shared_types::receipts::chain_is_continuous(&exec.receipts));
        assert_eq!(exec.receipts[0].option_phase, Some(OptionPhase::Start));
        assert_eq!(exec.receipts.last().unwrap().option_phase, Some(OptionPhase::End));
        // Every internal tick was governed: no accepted ascent anywhere.
        for receipt in &exec.receipts {
            if receipt.is_accepted() {
                assert!(receipt.dv_q <= 0);
            }
        }
    }

    // =========================================================================
    // Planning is metabolically priced
    // =========================================================================

    #[test]
    fn test_planning_cost_charged_and_absorbed() {
        init_tracing();
        use coh_06_planner::{adaptive_params, plan_and_select, PlannerConfig};
        use shared_crypto::DeterministicRng;

        let params = KernelParams::default();
        let config = PlannerConfig::for_testing();

        // Funded state: the exact formula cost is deducted.
        let funded = spiked_state(10 * ONE_Q18);
        let mut rng = DeterministicRng::for_step(&GENESIS, 11, 0);
        let outcome = plan_and_select(&funded, &params, &config, &mut rng).unwrap();
        let (m, h) = adaptive_params(funded.b, &config).unwrap();
        assert_eq!(outcome.planning_cost_q, config.compute_planning_cost(m, h).unwrap());
        assert_eq!(outcome.budget_after_q, funded.b - outcome.planning_cost_q);

        // Exhausted state: planning is disabled and free.
        let broke = spiked_state(0);
        let mut rng = DeterministicRng::for_step(&GENESIS, 11, 0);
        let outcome = plan_and_select(&broke, &params, &config, &mut rng).unwrap();
        assert!(outcome.first_action.is_stay());
        assert_eq!(outcome.planning_cost_q, 0);
        assert_eq!(outcome.budget_after_q, 0);
    }

    #[test]
    fn test_gmi_step_byte_determinism() {
        init_tracing();
        let params = KernelParams::default();
        let s0 = spiked_state(7 * ONE_Q18);
        let action = raise_theta();

        let a = gmi_step(&s0, &action, &ctx(), &params, Digest(GENESIS)).unwrap();
        let b = gmi_step(&s0, &action, &ctx(), &params, Digest(GENESIS)).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);

        let bytes_a = coh_02_canonical::canonical_bytes(&a.1).unwrap();
        let bytes_b = coh_02_canonical::canonical_bytes(&b.1).unwrap();
        assert_eq!(bytes_a, bytes_b, "receipts must be byte-identical");
    }
}
