//! The Lyapunov functional `V(s; P)`.
//!
//! `V = w_grad_theta * sum(forward-difference dtheta)^2
//!    + w_c * sum(C)
//!    + w_budget * Phi(b)` with `Phi(b) = max(b_max - b, 0)`.
//!
//! Lattice sums run in `i128` and narrow back into the Q18 `i64` domain at
//! the end; an out-of-range total is a contract violation, never a wrap.

use shared_types::{CogState, KernelParams, Q18};

use crate::errors::{MicroStepError, MicroStepResult};

/// Evaluate the Lyapunov functional in Q18.
pub fn v_q(state: &CogState, params: &KernelParams) -> MicroStepResult<Q18> {
    let grad = grad_theta_sq_sum(state);
    let c_mass: i128 = state.c.cells().iter().map(|&v| v as i128).sum();
    let phi = barrier(state.b, params.b_max_q);

    // The lattice sums are plain integers, so weight products are already
    // Q18-scaled. Only the barrier term multiplies two Q18 values and needs
    // a rescale; both operands are non-negative, so the shift is exact floor.
    let grad_term = params.w_grad_theta_q as i128 * grad;
    let c_term = params.w_c_q as i128 * c_mass;
    let budget_term = (params.w_budget_barrier_q as i128 * phi as i128) >> 18;

    narrow(grad_term + c_term + budget_term, "lyapunov total")
}

/// `dV = V(next) - V(prev)`.
pub fn dv_q(prev_v: Q18, next_v: Q18) -> MicroStepResult<Q18> {
    Ok(coh_01_fixed_point::q_sub(next_v, prev_v)?)
}

/// Squared forward-difference gradient of theta, summed over the lattice.
fn grad_theta_sq_sum(state: &CogState) -> i128 {
    let theta = &state.theta;
    let (rows, cols) = (theta.rows(), theta.cols());
    let mut sum: i128 = 0;
    for i in 0..rows {
        for j in 0..cols {
            let here = theta.get(i, j) as i128;
            if j + 1 < cols {
                let d = theta.get(i, j + 1) as i128 - here;
                sum += d * d;
            }
            if i + 1 < rows {
                let d = theta.get(i + 1, j) as i128 - here;
                sum += d * d;
            }
        }
    }
    sum
}

/// Non-increasing integer budget barrier.
fn barrier(b: Q18, b_max_q: Q18) -> Q18 {
    (b_max_q - b).max(0)
}

fn narrow(wide: i128, what: &'static str) -> MicroStepResult<Q18> {
    if wide < i64::MIN as i128 || wide > i64::MAX as i128 {
        Err(MicroStepError::Overflow { what })
    } else {
        Ok(wide as i64)
    }
}
