//! Integer discrete diffusion of the cost potential.
//!
//! `C'[i][j] = decay(C[i][j] + floor(D_C * lap(C)[i][j]))` with
//! `decay(x) = x - ceil(lambda_C * x)` for non-negative `x`. Gains round
//! DOWN and decay rounds UP, so the scheme never manufactures potential.
//! Negative intermediate cells are possible (strong outflow); the
//! admissibility projection clamps and records them.

use shared_types::{KernelParams, Lattice};

use crate::errors::{MicroStepError, MicroStepResult};

/// One diffusion-and-decay tick of the cost potential.
pub fn diffuse_cost(c: &Lattice, params: &KernelParams) -> MicroStepResult<Lattice> {
    let (rows, cols) = (c.rows(), c.cols());
    let mut out = Lattice::zeros(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            let lap = laplacian_at(c, i, j);
            let gain = mul_q_floor(params.d_c, lap);
            let mixed = c.get(i, j) as i128 + gain;
            let decayed = mixed - mul_q_ceil(params.lambda_c, mixed);
            out.set(i, j, narrow(decayed)?);
        }
    }
    Ok(out)
}

/// 5-point discrete Laplacian with reflecting boundaries.
fn laplacian_at(c: &Lattice, i: usize, j: usize) -> i128 {
    let (rows, cols) = (c.rows(), c.cols());
    let here = c.get(i, j) as i128;
    let mut acc: i128 = 0;
    let mut neighbors = 0i128;
    if i > 0 {
        acc += c.get(i - 1, j) as i128;
        neighbors += 1;
    }
    if i + 1 < rows {
        acc += c.get(i + 1, j) as i128;
        neighbors += 1;
    }
    if j > 0 {
        acc += c.get(i, j - 1) as i128;
        neighbors += 1;
    }
    if j + 1 < cols {
        acc += c.get(i, j + 1) as i128;
        neighbors += 1;
    }
    acc - neighbors * here
}

/// `floor(q * n / 2^18)` for a Q18 coefficient and a plain integer.
fn mul_q_floor(q: i64, n: i128) -> i128 {
    // Arithmetic shift is floor division for signed operands.
    (q as i128 * n) >> 18
}

/// `ceil(q * n / 2^18)`.
fn mul_q_ceil(q: i64, n: i128) -> i128 {
    let prod = q as i128 * n;
    let floored = prod >> 18;
    // The divisor is a positive power of two, so the masked low bits are
    // the non-negative remainder regardless of the product's sign; any
    // nonzero remainder means the floor undershot the ceiling.
    if prod & ((1 << 18) - 1) != 0 {
        floored + 1
    } else {
        floored
    }
}

fn narrow(wide: i128) -> MicroStepResult<i64> {
    if wide < i64::MIN as i128 || wide > i64::MAX as i128 {
        Err(MicroStepError::Overflow { what: "cost diffusion" })
    } else {
        Ok(wide as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coh_01_fixed_point::ONE_Q18;
    use shared_types::KernelParams;

    fn params(d_c: i64, lambda_c: i64) -> KernelParams {
        KernelParams { d_c, lambda_c, ..KernelParams::default() }
    }

    #[test]
    fn test_flat_lattice_is_fixed_point_without_decay() {
        let c = Lattice::from_rows(vec![vec![4, 4], vec![4, 4]]).unwrap();
        let out = diffuse_cost(&c, &params(ONE_Q18 / 4, 0)).unwrap();
        assert_eq!(out, c);
    }

    #[test]
    fn test_peak_spreads() {
        let mut c = Lattice::zeros(3, 3);
        c.set(1, 1, 64);
        let out = diffuse_cost(&c, &params(ONE_Q18 / 8, 0)).unwrap();
        // The peak loses potential, each 4-neighbor gains.
        assert!(out.get(1, 1) < 64);
        assert!(out.get(0, 1) > 0);
        assert!(out.get(1, 0) > 0);
        // Corners are not 4-neighbors of the peak.
        assert_eq!(out.get(0, 0), 0);
    }

    #[test]
    fn test_decay_shrinks_mass_and_rounds_up() {
        let c = Lattice::from_rows(vec![vec![100]]).unwrap();
        // lambda = 1/64: ceil(100/64) = 2 removed.
        let out = diffuse_cost(&c, &params(0, ONE_Q18 / 64)).unwrap();
        assert_eq!(out.get(0, 0), 98);
    }

    #[test]
    fn test_ceil_is_sign_aware() {
        // ceil(-0.5) = 0, not -1: a negative product with a remainder must
        // round toward zero, never away from it.
        assert_eq!(mul_q_ceil(ONE_Q18 / 2, -1), 0);
        assert_eq!(mul_q_ceil(ONE_Q18 / 2, 1), 1);
        // Exact multiples are untouched on both sides of zero.
        assert_eq!(mul_q_ceil(ONE_Q18, -3), -3);
        assert_eq!(mul_q_ceil(ONE_Q18, 3), 3);
        // ceil(-2.4) = -2.
        assert_eq!(mul_q_ceil(ONE_Q18 / 5, -12), -2);
        // And the floor side stays a true floor for negatives.
        assert_eq!(mul_q_floor(ONE_Q18 / 2, -1), -1);
    }

    #[test]
    fn test_decay_never_credits_a_negative_cell() {
        // A negative cell decaying toward zero must not overshoot past the
        // exact value: decayed = mixed - ceil(lambda * mixed) <= exact.
        let c = Lattice::from_rows(vec![vec![-100]]).unwrap();
        // lambda = 1/64: exact decay leaves -98.4375; ceil(-100/64) = -1,
        // so the scheme keeps -99, on the conservative side.
        let out = diffuse_cost(&c, &params(0, ONE_Q18 / 64)).unwrap();
        assert_eq!(out.get(0, 0), -99);
    }

    #[test]
    fn test_deterministic() {
        let mut c = Lattice::zeros(4, 4);
        c.set(2, 1, 37);
        c.set(0, 3, 11);
        let p = params(ONE_Q18 / 8, ONE_Q18 / 128);
        assert_eq!(diffuse_cost(&c, &p).unwrap(), diffuse_cost(&c, &p).unwrap());
    }
}
