//! # COH-09 Replay - Third-Party Verification Subsystem
//!
//! **Subsystem ID:** 9
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Given only the parameters, the initial state, the seed, and the
//! receipts, re-run the whole pipeline and assert byte equality of every
//! chain hash, state hash, commitment root, and numeric field. The first
//! mismatch fails with the divergent field's name and the two differing
//! byte strings, hex-prefixed.
//!
//! Two verification depths:
//!
//! - [`receipt_check::check_receipt_chain`] - structural: schema ids, chain
//!   linkage, and chain-hash recomputation over the canonical cores. Cheap;
//!   no engine, no environment. The retention layer runs this before
//!   slabbing.
//! - [`verifier::replay_episode`] - full recompute: reconstruct the
//!   environment and proposer, drive a fresh episode, compare every receipt
//!   bytewise. This is what makes every published receipt falsifiable.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod receipt_check;
pub mod verifier;

pub use errors::{ReplayError, ReplayResult};
pub use receipt_check::check_receipt_chain;
pub use verifier::replay_episode;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
