//! # Shared Types Crate
//!
//! This crate contains all domain entities and receipt structures shared
//! across the Coherence-Chain subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every structure that enters a hash is
//!   defined here, as a record or sum type, never as an ad-hoc map.
//! - **Integer Purity**: no field of any hashed structure is a float; all
//!   fractional quantities are Q18 integers.
//! - **Value Semantics**: states and receipts are owned values. Published
//!   receipts are immutable; the episode mutates its state only through the
//!   micro-step engine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entities;
pub mod errors;
pub mod params;
pub mod proposals;
pub mod receipts;

pub use entities::{CogState, HazardMask, Lattice, MicroAction};
pub use errors::{SharedTypesError, SharedTypesResult};
pub use params::KernelParams;
pub use proposals::{Proposal, ProposalSet};
pub use receipts::{
    check_schema, Decision, Digest, KktResidual, OptionEndReason, OptionPhase, Projected,
    ReceiptEnvelope, RejectCode, SlabReceipt, StepReceipt, WorkUnits, SCHEMA_SLAB_V1,
    SCHEMA_STEP_V1,
};

/// A 32-byte SHA-256 hash.
pub type Hash = shared_crypto::Hash;

/// A Q18 fixed-point value.
pub type Q18 = coh_01_fixed_point::Q18;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
