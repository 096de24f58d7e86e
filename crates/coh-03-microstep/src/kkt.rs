//! KKT-style residuals on the post-step state.

use shared_types::{CogState, KernelParams, KktResidual};

use crate::errors::{MicroStepError, MicroStepResult};

/// Compute feasibility and stationarity residuals.
///
/// Feasibility residuals sum the magnitude of every bound violation; the
/// engine requires them to be zero after projection. Stationarity is the
/// absolute discrete-Laplacian norm of theta, a diagnostic only.
pub fn kkt_residual(state: &CogState, params: &KernelParams) -> MicroStepResult<KktResidual> {
    let mut feas_rho: i128 = 0;
    let mut feas_c: i128 = 0;
    for i in 0..state.rho.rows() {
        for j in 0..state.rho.cols() {
            let rho = state.rho.get(i, j) as i128;
            if rho < 0 {
                feas_rho += -rho;
            } else if rho > params.rho_max as i128 {
                feas_rho += rho - params.rho_max as i128;
            }
            let c = state.c.get(i, j) as i128;
            if c < 0 {
                feas_c += -c;
            }
        }
    }
    let feas_b: i128 = if state.b < 0 { -(state.b as i128) } else { 0 };

    Ok(KktResidual {
        feas_rho_q: narrow(feas_rho)?,
        feas_c_q: narrow(feas_c)?,
        feas_b_q: narrow(feas_b)?,
        stationarity_theta_q: narrow(laplacian_abs_norm(state))?,
    })
}

fn laplacian_abs_norm(state: &CogState) -> i128 {
    let theta = &state.theta;
    let (rows, cols) = (theta.rows(), theta.cols());
    let mut sum: i128 = 0;
    for i in 0..rows {
        for j in 0..cols {
            let here = theta.get(i, j) as i128;
            let mut acc: i128 = 0;
            let mut neighbors = 0i128;
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
            sum += (acc - neighbors * here).abs();
        }
    }
    sum
}

fn narrow(wide: i128) -> MicroStepResult<i64> {
    if wide > i64::MAX as i128 {
        Err(MicroStepError::Overflow { what: "kkt residual" })
    } else {
        Ok(wide as i64)
    }
}
