//! Planner configuration and the planning-cost formula.

use coh_01_fixed_point::ONE_Q18;
use serde::{Deserialize, Serialize};
use shared_types::Q18;

use crate::errors::{PlannerError, PlannerResult};

/// Planner tunables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Cap on the number of candidate plans.
    pub m_max: u32,
    /// Cap on the rollout horizon.
    pub h_max: u32,
    /// Cost per plan-step explored (Q18).
    pub kappa_plan_q: Q18,
    /// Cost per plan gated (Q18).
    pub kappa_gate_q: Q18,
    /// Fixed cost of running the planner at all (Q18).
    pub kappa_exec_q: Q18,
    /// Budget per unit of `m` (Q18); must be positive.
    pub b_unit_q: Q18,
    /// Budget per unit of `H` (Q18); must be positive.
    pub h_unit_q: Q18,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            m_max: 8,
            h_max: 5,
            kappa_plan_q: ONE_Q18 / 64,
            kappa_gate_q: ONE_Q18 / 128,
            kappa_exec_q: ONE_Q18 / 256,
            b_unit_q: ONE_Q18,
            h_unit_q: 2 * ONE_Q18,
        }
    }
}

impl PlannerConfig {
    /// Small sizes for tests.
    pub fn for_testing() -> Self {
        Self { m_max: 3, h_max: 2, ..Self::default() }
    }

    /// Validate the record before use.
    pub fn validate(&self) -> PlannerResult<()> {
        if self.m_max == 0 || self.h_max == 0 {
            return Err(PlannerError::InvalidConfig {
                reason: format!("m_max and h_max must be positive, got ({}, {})", self.m_max, self.h_max),
            });
        }
        if self.b_unit_q <= 0 || self.h_unit_q <= 0 {
            return Err(PlannerError::InvalidConfig {
                reason: "b_unit_q and h_unit_q must be positive".into(),
            });
        }
        for (name, v) in [
            ("kappa_plan_q", self.kappa_plan_q),
            ("kappa_gate_q", self.kappa_gate_q),
            ("kappa_exec_q", self.kappa_exec_q),
        ] {
            if v < 0 {
                return Err(PlannerError::InvalidConfig {
                    reason: format!("{name} must be non-negative, got {v}"),
                });
            }
        }
        Ok(())
    }

    /// `W_plan = kappa_plan * m * H + kappa_gate * m + kappa_exec`.
    ///
    /// `m` and `H` are plain counts, so the Q18 products are exact.
    pub fn compute_planning_cost(&self, m: u32, h: u32) -> PlannerResult<Q18> {
        let steps = (m as i64).checked_mul(h as i64).ok_or_else(overflow)?;
        let plan_term = self.kappa_plan_q.checked_mul(steps).ok_or_else(overflow)?;
        let gate_term = self.kappa_gate_q.checked_mul(m as i64).ok_or_else(overflow)?;
        let total = plan_term
            .checked_add(gate_term)
            .and_then(|t| t.checked_add(self.kappa_exec_q))
            .ok_or_else(overflow)?;
        Ok(total)
    }
}

fn overflow() -> PlannerError {
    PlannerError::InvalidConfig { reason: "planning cost overflows Q18".into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_formula_exact() {
        let config = PlannerConfig {
            kappa_plan_q: 3,
            kappa_gate_q: 5,
            kappa_exec_q: 7,
            ..PlannerConfig::default()
        };
        // 3*4*2 + 5*4 + 7 = 51
        assert_eq!(config.compute_planning_cost(4, 2).unwrap(), 51);
    }

    #[test]
    fn test_cost_scales_with_m_h() {
        let config = PlannerConfig::default();
        let small = config.compute_planning_cost(2, 2).unwrap();
        let large = config.compute_planning_cost(8, 5).unwrap();
        assert!(large > small);
    }

    #[test]
    fn test_validate_rejects_zero_units() {
        let mut config = PlannerConfig::default();
        config.b_unit_q = 0;
        assert!(config.validate().is_err());
    }
}
