//! Exploration configuration.

use coh_01_fixed_point::ONE_Q18;
use serde::{Deserialize, Serialize};
use shared_types::Q18;

/// Tunables for the exploration weight `alpha_q(b)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExplorationConfig {
    /// Weight at `b = 0` (Q18).
    pub alpha_max_q: Q18,
    /// Floor the weight never decays below (Q18).
    pub alpha_min_q: Q18,
    /// Linear decay per unit of remaining budget (Q18 per Q18).
    pub alpha_slope_q: Q18,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            alpha_max_q: ONE_Q18,
            alpha_min_q: ONE_Q18 / 16,
            alpha_slope_q: ONE_Q18 / 64,
        }
    }
}

impl ExplorationConfig {
    /// Exploration disabled entirely.
    pub fn disabled() -> Self {
        Self { alpha_max_q: 0, alpha_min_q: 0, alpha_slope_q: 0 }
    }
}
