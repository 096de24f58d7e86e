//! Projection onto the feasible set K.

use shared_types::{CogState, KernelParams, Projected};

/// Clamp a proposed state into K, recording which components moved.
///
/// K: `0 <= rho[i][j] <= rho_max`, `C[i][j] >= 0`, `b >= 0`.
pub fn project(mut state: CogState, params: &KernelParams) -> (CogState, Projected) {
    let mut flags = Projected::default();

    for i in 0..state.rho.rows() {
        for j in 0..state.rho.cols() {
            let v = state.rho.get(i, j);
            let clamped = v.clamp(0, params.rho_max);
            if clamped != v {
                state.rho.set(i, j, clamped);
                flags.rho = true;
            }

            let c = state.c.get(i, j);
            if c < 0 {
                state.c.set(i, j, 0);
                flags.c = true;
            }
        }
    }

    if state.b < 0 {
        state.b = 0;
        flags.b = true;
    }

    (state, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Lattice;

    fn state_with(rho00: i64, c11: i64, b: i64) -> CogState {
        let mut s = CogState::new(
            Lattice::zeros(2, 2),
            Lattice::zeros(2, 2),
            Lattice::zeros(2, 2),
            b,
        )
        .unwrap();
        s.rho.set(0, 0, rho00);
        s.c.set(1, 1, c11);
        s
    }

    #[test]
    fn test_in_k_untouched() {
        let params = KernelParams::default();
        let s = state_with(params.rho_max, 3, 10);
        let (out, flags) = project(s.clone(), &params);
        assert_eq!(out, s);
        assert!(!flags.any());
    }

    #[test]
    fn test_rho_clamped_both_ends() {
        let params = KernelParams::default();
        let (out, flags) = project(state_with(params.rho_max + 5, 0, 0), &params);
        assert_eq!(out.rho.get(0, 0), params.rho_max);
        assert!(flags.rho && !flags.c && !flags.b);

        let (out, flags) = project(state_with(-3, 0, 0), &params);
        assert_eq!(out.rho.get(0, 0), 0);
        assert!(flags.rho);
    }

    #[test]
    fn test_c_and_b_clamped() {
        let params = KernelParams::default();
        let (out, flags) = project(state_with(0, -7, -1), &params);
        assert_eq!(out.c.get(1, 1), 0);
        assert_eq!(out.b, 0);
        assert!(flags.c && flags.b);
        assert!(out.in_feasible_set(&params));
    }
}
