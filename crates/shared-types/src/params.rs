//! The immutable parameter record `P`.

use coh_01_fixed_point::ONE_Q18;
use serde::{Deserialize, Serialize};

use crate::errors::{SharedTypesError, SharedTypesResult};
use crate::Q18;

/// Immutable kernel parameters. Every field is part of every receipt's
/// preimage: changing any value changes every downstream hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelParams {
    /// Parameter-set version string.
    pub version: String,
    /// Upper bound on every density cell.
    pub rho_max: i64,
    /// Base per-tick work cost (Q18).
    pub alpha_tau: Q18,
    /// Per-touched-cell work cost (Q18).
    pub beta_c: Q18,
    /// Diffusion coefficient for the cost potential (Q18, in [0, 1]).
    pub d_c: Q18,
    /// Decay applied to the cost potential each tick (Q18, in [0, 1]).
    pub lambda_c: Q18,
    /// Lyapunov weight on the squared phase gradient (Q18).
    pub w_grad_theta_q: Q18,
    /// Lyapunov weight on the cost-potential mass (Q18).
    pub w_c_q: Q18,
    /// Lyapunov weight on the budget barrier (Q18).
    pub w_budget_barrier_q: Q18,
    /// Barrier reference level: `Phi(b) = max(b_max - b, 0)` (Q18).
    pub b_max_q: Q18,
    /// Absorption policy: at `b = 0` only non-worsening actions are admitted.
    pub absorb_on_b0: bool,
    /// Minimum lattice change before an option may re-terminate (cells).
    pub hysteresis_threshold: i64,
    /// Budget level under which hold-station refuses to terminate (Q18).
    pub fatigue_threshold_q: Q18,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            version: "coh-params-1.0.0".to_string(),
            rho_max: 8,
            alpha_tau: ONE_Q18 / 256,
            beta_c: ONE_Q18 / 1024,
            d_c: ONE_Q18 / 8,
            lambda_c: ONE_Q18 / 64,
            w_grad_theta_q: ONE_Q18,
            w_c_q: ONE_Q18,
            w_budget_barrier_q: ONE_Q18 / 16,
            b_max_q: 64 * ONE_Q18,
            absorb_on_b0: true,
            hysteresis_threshold: 1,
            fatigue_threshold_q: ONE_Q18,
        }
    }
}

impl KernelParams {
    /// Validate the record. Invalid parameters are a contract violation;
    /// nothing downstream runs with an unvalidated record.
    pub fn validate(&self) -> SharedTypesResult<()> {
        if self.version.is_empty() {
            return Err(SharedTypesError::InvalidParams {
                reason: "version must be non-empty".into(),
            });
        }
        if self.rho_max <= 0 {
            return Err(SharedTypesError::InvalidParams {
                reason: format!("rho_max must be positive, got {}", self.rho_max),
            });
        }
        for (name, value) in [
            ("alpha_tau", self.alpha_tau),
            ("beta_c", self.beta_c),
            ("w_grad_theta_q", self.w_grad_theta_q),
            ("w_c_q", self.w_c_q),
            ("w_budget_barrier_q", self.w_budget_barrier_q),
            ("b_max_q", self.b_max_q),
            ("fatigue_threshold_q", self.fatigue_threshold_q),
        ] {
            if value < 0 {
                return Err(SharedTypesError::InvalidParams {
                    reason: format!("{name} must be non-negative, got {value}"),
                });
            }
        }
        for (name, value) in [("d_c", self.d_c), ("lambda_c", self.lambda_c)] {
            if !(0..=ONE_Q18).contains(&value) {
                return Err(SharedTypesError::InvalidParams {
                    reason: format!("{name} must lie in [0, 1] Q18, got {value}"),
                });
            }
        }
        if self.hysteresis_threshold < 0 {
            return Err(SharedTypesError::InvalidParams {
                reason: format!(
                    "hysteresis_threshold must be non-negative, got {}",
                    self.hysteresis_threshold
                ),
            });
        }
        Ok(())
    }
}
