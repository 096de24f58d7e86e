//! The environment port.

use shared_types::{HazardMask, MicroAction, Q18};

/// One environment transition.
pub struct EnvTransition<S, O> {
    /// Post-step environment state.
    pub state: S,
    /// Post-step observation.
    pub obs: O,
    /// Task reward for the step (Q18).
    pub reward_q: Q18,
    /// The action landed on a hazard (the governor should have prevented
    /// this; the flag is diagnostic).
    pub hazard_hit: bool,
    /// The episode's task is complete.
    pub terminal: bool,
}

/// A deterministic task environment.
///
/// All methods must be pure over their inputs: no wall-clock, no OS
/// randomness, no hidden mutation. `drift` must be idempotent for a fixed
/// `step_index`; the replay verifier calls everything again and expects
/// identical results.
pub trait Environment {
    /// Environment-private state.
    type State: Clone;
    /// Observation handed to the proposer.
    type Obs: Clone;

    /// Deterministic initial state and observation.
    fn reset(&self, seed: u64) -> (Self::State, Self::Obs);

    /// Apply an accepted action.
    fn step(&self, state: &Self::State, action: &MicroAction) -> EnvTransition<Self::State, Self::Obs>;

    /// Deterministic non-stationarity hook, applied between ticks.
    fn drift(&self, state: &Self::State, step_index: u64) -> Self::State;

    /// Read-only hazard bitmap for the governor's safety filter.
    fn hazard_mask(&self, state: &Self::State) -> HazardMask;

    /// Observation of a state (used to refresh after drift).
    fn observe(&self, state: &Self::State) -> Self::Obs;
}
