//! The skill registry and the built-in skills.

use std::collections::HashMap;

use coh_01_fixed_point::ONE_Q18;
use shared_crypto::DeterministicRng;
use shared_types::{CogState, KernelParams, MicroAction};

use crate::skill::{bernoulli_q, SkillBehavior, SkillOption};

/// An explicit skill store owned by the host. Never a process singleton.
#[derive(Default)]
pub struct SkillRegistry {
    skills: HashMap<String, SkillOption>,
}

impl SkillRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the kernel-native skills.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(SkillOption::new("relax-phase", 16, Box::new(RelaxPhase)));
        registry.register(SkillOption::new("hold-station", 8, Box::new(HoldStation)));
        registry
    }

    /// Register a skill, replacing any previous one under the same id.
    pub fn register(&mut self, skill: SkillOption) {
        self.skills.insert(skill.id.clone(), skill);
    }

    /// Look up a skill.
    pub fn get(&self, id: &str) -> Option<&SkillOption> {
        self.skills.get(id)
    }

    /// Registered skill ids, sorted for deterministic iteration.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.skills.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Built-in: nudge the hottest phase cell toward its local mean until the
/// phase lattice is flat. Sheds gradient energy, so every internal step is
/// a Lyapunov descent candidate.
struct RelaxPhase;

impl RelaxPhase {
    fn hottest(state: &CogState) -> Option<(usize, usize, i64)> {
        let theta = &state.theta;
        let (rows, cols) = (theta.rows(), theta.cols());
        let mut best: Option<(usize, usize, i64)> = None;
        let mut best_mag: i128 = 0;
        for i in 0..rows {
            for j in 0..cols {
                let here = theta.get(i, j) as i128;
                let mut acc: i128 = 0;
                let mut neighbors: i128 = 0;
                if i > 0 {
                    acc += theta.get(i - 1, j) as i128;
                    neighbors += 1;
                }
                if i + 1 < rows {
                    acc += theta.get(i + 1, j) as i128;
                    neighbors += 1;
                }
                if j > 0 {
                    acc += theta.get(i, j - 1) as i128;
                    neighbors += 1;
                }
                if j + 1 < cols {
                    acc += theta.get(i, j + 1) as i128;
                    neighbors += 1;
                }
                let lap = acc - neighbors * here;
                if lap.abs() > best_mag {
                    best_mag = lap.abs();
                    best = Some((i, j, lap.signum() as i64));
                }
            }
        }
        best
    }
}

impl SkillBehavior for RelaxPhase {
    fn can_initiate(&self, state: &CogState, _params: &KernelParams) -> bool {
        Self::hottest(state).is_some()
    }

    fn should_terminate(
        &self,
        state: &CogState,
        steps_taken: u32,
        params: &KernelParams,
        _rng: &mut DeterministicRng,
    ) -> bool {
        // Hysteresis: never re-terminate before the threshold step count,
        // so a single nudge cannot chatter the option on and off.
        if (steps_taken as i64) < params.hysteresis_threshold {
            return false;
        }
        Self::hottest(state).is_none()
    }

    fn internal_policy(&self, state: &CogState, _params: &KernelParams) -> MicroAction {
        let (rows, cols) = (state.theta.rows(), state.theta.cols());
        let mut action = MicroAction::stay(rows, cols);
        if let Some((i, j, toward)) = Self::hottest(state) {
            action.dtheta.set(i, j, toward);
        }
        action
    }
}

/// Built-in: ride out budget fatigue by standing still. Initiable only
/// when the budget has fallen below the fatigue threshold; terminates once
/// the pressure is gone or, probabilistically, to re-sample the world.
struct HoldStation;

impl SkillBehavior for HoldStation {
    fn can_initiate(&self, state: &CogState, params: &KernelParams) -> bool {
        state.b < params.fatigue_threshold_q
    }

    fn should_terminate(
        &self,
        state: &CogState,
        steps_taken: u32,
        params: &KernelParams,
        rng: &mut DeterministicRng,
    ) -> bool {
        if steps_taken == 0 {
            return false;
        }
        if state.b >= params.fatigue_threshold_q {
            return true;
        }
        bernoulli_q(rng, ONE_Q18 / 8)
    }

    fn internal_policy(&self, state: &CogState, _params: &KernelParams) -> MicroAction {
        MicroAction::stay(state.rho.rows(), state.rho.cols())
    }
}
