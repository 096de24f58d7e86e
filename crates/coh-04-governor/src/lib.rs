//! # COH-04 Governor - Lexicographic Filter Subsystem
//!
//! **Subsystem ID:** 4
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Turns a proposal set into at most one accepted action. Filters apply in
//! a fixed lexicographic order; the first surviving proposal with maximum
//! task score wins. Safety always dominates task performance.
//!
//! ## Filter Order
//!
//! | Stage | Eliminates | Code |
//! |-------|-----------|------|
//! | 1. Environment safety | hazard deposits, shape violations | `REJECT_HAZARD`, `REJECT_OUT_OF_BOUNDS` |
//! | 2. Taint | untrusted-tagged proposals | `REJECT_TAINT_UNTRUSTED` |
//! | 3. Admissibility | candidates outside K after projection | `REJECT_INFEASIBLE` |
//! | 4. Lyapunov | `dV > 0` candidates | `REJECT_LYAPUNOV_INCREASE` |
//! | 5. Absorption | at `b = 0`, `dV > 0` candidates | `REJECT_ABSORB_B0_DV_POS` |
//! | 6. Score | all but the max-score survivor | (selection, not rejection) |
//!
//! Score ties break toward the lexicographically smallest proposal digest,
//! so selection is deterministic under any permutation of equal scores.
//!
//! If nothing survives, the governor yields the synthetic Stay action with
//! `REJECT_NO_SAFE_ACTION`; the engine still emits a receipt for the tick.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod filters;
pub mod ports;
pub mod service;

pub use config::GovernorConfig;
pub use ports::SafetyOracle;
pub use service::{Elimination, Governor, GovernorVerdict};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
