//! # Kernel Runtime - Episode Orchestration
//!
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Wires the seams together for one episode:
//!
//! ```text
//! env observation -> proposer -> ProposalSet -> governor -> action | Stay
//!                                                     |
//!                                                 gmi_step -> StepReceipt -> chain tip'
//! ```
//!
//! One tick produces exactly one receipt whether or not an action was
//! accepted. The episode handle exclusively owns its state, chain tip, RNG
//! stream, visit table, and receipt log; episodes share nothing mutable and
//! may be driven in parallel by the host.
//!
//! Cancellation is cooperative and inter-tick: dropping the handle after a
//! receipt publishes is equivalent to pausing, and a new handle can resume
//! from the chain tip. There is no in-tick suspension point.
//!
//! ## Slabs
//!
//! Every `slab_size` receipts the runtime emits a [`shared_types::SlabReceipt`]
//! committing the window under the episode's retention policy, chained on a
//! parallel slab-level chain.
//!
//! The [`adapters::lattice_grid`] module ships the reference deterministic
//! gridworld used by the test suites; it is one example environment, not a
//! contract.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod episode;
pub mod errors;
pub mod ledger;
pub mod ports;

pub use episode::{Episode, EpisodeCheckpoint, EpisodeConfig, EpisodeRecord, TickOutcome};
pub use errors::{RuntimeError, RuntimeResult};
pub use ledger::JcsLedger;
pub use ports::{EnvTransition, Environment};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
