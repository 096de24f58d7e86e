//! Outbound ports: what the governor consumes from the environment.

use shared_types::{CogState, HazardMask};

/// Read-only safety information supplied by the task environment.
///
/// Implementations must be deterministic over the state: the replay
/// verifier calls them again and expects identical masks.
pub trait SafetyOracle {
    /// Hazard bitmap for the current state, in the state's lattice shape.
    fn hazard_mask(&self, state: &CogState) -> HazardMask;
}

/// An oracle that reports no hazards; for tests and hazard-free domains.
pub struct NoHazards;

impl SafetyOracle for NoHazards {
    fn hazard_mask(&self, state: &CogState) -> HazardMask {
        HazardMask::clear(state.rho.rows(), state.rho.cols())
    }
}
