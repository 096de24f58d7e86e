//! # COH-03 Micro-Step - GMI Engine Subsystem
//!
//! **Subsystem ID:** 3
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! The deterministic state-transition core. One call to [`step::gmi_step`]
//! consumes a state and a candidate action and produces the next state plus
//! a chain-linked receipt, whether or not the action was accepted.
//!
//! ## Pipeline (fixed order)
//!
//! 1. Propose `s+`: apply increments, diffuse the cost potential, debit work
//! 2. Project onto the feasible set K, recording per-field clamp flags
//! 3. Compute `dV = V(s+) - V(s)` in Q18
//! 4. Accept/reject (infeasible, absorption at `b = 0`, Lyapunov increase)
//! 5. Commit (`t` advances on every tick, rejected or not)
//! 6. Emit the receipt and fold it into the chain
//! 7. Gate on KKT feasibility residuals (must be zero)
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Post-step state lies in K | `projection::project()` + `step.rs` feasibility gate |
//! | INVARIANT-2 | Budget is non-increasing | `work::charge()` (UP-rounded debits, clamp at zero) |
//! | INVARIANT-3 | Accepted steps have `dV <= 0` | `step.rs` accept gate |
//! | INVARIANT-4 | At `b = 0` only non-worsening actions | `step.rs` absorption gate |
//! | INVARIANT-5 | Rejected ticks advance `t` only | `step.rs` reject path |
//!
//! Rejections are data in the receipt. Errors out of this crate are
//! contract violations that abort the episode.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diffusion;
pub mod errors;
pub mod kkt;
pub mod lyapunov;
pub mod projection;
pub mod step;
pub mod work;

pub use errors::{MicroStepError, MicroStepResult};
pub use kkt::kkt_residual;
pub use lyapunov::v_q;
pub use step::{gmi_step, preview_candidate, StepCtx};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
