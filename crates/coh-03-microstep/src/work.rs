//! Work accounting: what a tick costs.

use shared_types::{KernelParams, MicroAction, Q18, WorkUnits};

use crate::errors::{MicroStepError, MicroStepResult};

/// Price an action: base tick cost, per-touched-cell cost, glyph surcharge.
///
/// Cell counts are plain integers, so the Q18 products are exact; the UP/
/// DOWN discipline only matters once fractional factors enter (planner
/// debits reuse [`coh_01_fixed_point::debit`]).
pub fn work_units(action: &MicroAction, params: &KernelParams) -> MicroStepResult<WorkUnits> {
    let touched = (action.drho.nonzero_cells() + action.dtheta.nonzero_cells()) as i64;
    let lattice_q = params
        .beta_c
        .checked_mul(touched)
        .ok_or(MicroStepError::Overflow { what: "lattice work" })?;
    let glyph_q: Q18 = if action.u_glyph.is_some() { params.alpha_tau } else { 0 };
    Ok(WorkUnits { base_q: params.alpha_tau, lattice_q, glyph_q })
}
