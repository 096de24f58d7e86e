//! # COH-07 Options - Skill Subsystem
//!
//! **Subsystem ID:** 7
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! A skill option bundles an initiation predicate, a termination rule, an
//! internal policy, and a step cap. The runtime unfolds an option into
//! primitive micro-steps; every internal step still passes through the
//! governor and the engine, and every internal tick emits a receipt tagged
//! with its option phase (`START` / `STEP` / `END`).
//!
//! ## Abort Semantics
//!
//! A governor (or engine) rejection of an internal step terminates the
//! option immediately: the rejecting tick's receipt carries
//! `OPTION_ABORTED_BY_GOVERNOR` and closes the option's receipt span. The
//! option never outranks the safety pipeline.
//!
//! ## Registry
//!
//! [`registry::SkillRegistry`] is an explicit store passed by the host, not
//! a process singleton. Two kernel-native skills ship built in:
//! `relax-phase` and `hold-station`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod registry;
pub mod runtime;
pub mod skill;

pub use errors::{OptionError, OptionResult};
pub use registry::SkillRegistry;
pub use runtime::{unfold, OptionExecution};
pub use skill::{bernoulli_q, SkillBehavior, SkillOption};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
