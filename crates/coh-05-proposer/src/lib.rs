//! # COH-05 Proposer - Action Proposal Subsystem
//!
//! **Subsystem ID:** 5
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! The proposer seam: a pure function from `(state, observation, params,
//! rng)` to a ranked, Merkle-committed proposal set. The kernel prescribes
//! the scoring law and the commitment scheme, not the policy; any policy
//! satisfying the [`ports::Proposer`] contract plugs in.
//!
//! ## Scoring Law
//!
//! `score_q = -V_task_q + alpha_q(b) * bonus_q(N)` where
//! `bonus_q(N) = 1 / sqrt(N + 1)` over the visit count of the current
//! state, all in Q18. The square root is the floor integer square root and
//! the bonus division rounds DOWN, so exploration is always a lower bound
//! and can never outbid task loss on a rounding artifact.
//!
//! ## Commitments
//!
//! Each proposal hashes to `sha256(JCS(proposal))`; the ordered leaves form
//! a Merkle tree whose root, chosen index, and chosen-proposal hash travel
//! in every step receipt. A directed path for the chosen leaf lets an
//! auditor check membership without the full set.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commitment;
pub mod config;
pub mod errors;
pub mod exploration;
pub mod identity;
pub mod ports;
pub mod relax;

pub use commitment::{chosen_proof, commit, proposal_leaf, ProposalSetCommitment};
pub use config::ExplorationConfig;
pub use errors::{ProposerError, ProposerResult};
pub use exploration::{alpha_q, exploration_bonus_q, score_q, VisitTable};
pub use identity::proposal_id;
pub use ports::Proposer;
pub use relax::RelaxProposer;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
