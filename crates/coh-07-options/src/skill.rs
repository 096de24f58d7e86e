//! Skill definitions.

use shared_crypto::DeterministicRng;
use shared_types::{CogState, KernelParams, MicroAction, Q18};

/// Behavior of one skill: when it may start, when it stops, what it does.
///
/// Implementations must be deterministic over their inputs; the only
/// admissible randomness is the supplied [`DeterministicRng`] (used for
/// probabilistic termination).
pub trait SkillBehavior {
    /// Initiation predicate `I(s)`.
    fn can_initiate(&self, state: &CogState, params: &KernelParams) -> bool;

    /// Termination rule `beta(s)`: hard predicate, or a Q18 probability
    /// drawn through [`bernoulli_q`].
    fn should_terminate(
        &self,
        state: &CogState,
        steps_taken: u32,
        params: &KernelParams,
        rng: &mut DeterministicRng,
    ) -> bool;

    /// Internal policy `pi(s)`.
    fn internal_policy(&self, state: &CogState, params: &KernelParams) -> MicroAction;
}

/// A registered skill: identity, step cap, behavior.
pub struct SkillOption {
    /// Stable identifier; appears in every internal receipt.
    pub id: String,
    /// Hard cap on internal steps.
    pub max_steps: u32,
    /// The behavior.
    pub behavior: Box<dyn SkillBehavior + Send + Sync>,
}

impl SkillOption {
    /// Build a skill.
    pub fn new(
        id: impl Into<String>,
        max_steps: u32,
        behavior: Box<dyn SkillBehavior + Send + Sync>,
    ) -> Self {
        Self { id: id.into(), max_steps, behavior }
    }
}

/// Draw a Bernoulli outcome with Q18 probability `beta_q` from the
/// deterministic stream. `beta_q >= ONE` always fires, `<= 0` never.
pub fn bernoulli_q(rng: &mut DeterministicRng, beta_q: Q18) -> bool {
    use coh_01_fixed_point::ONE_Q18;
    if beta_q <= 0 {
        return false;
    }
    if beta_q >= ONE_Q18 {
        return true;
    }
    let threshold = (beta_q as u128) * (1u128 << 64) / (ONE_Q18 as u128);
    (rng.next_u64() as u128) < threshold
}
