//! # COH-08 Retention - Slab Lifecycle Subsystem
//!
//! **Subsystem ID:** 8
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Certified forgetting. Step receipts ship in slabs (contiguous windows
//! committed by one Merkle root); each slab walks a lifecycle FSM that ends
//! either in authorized deletion or in a terminal disputed state:
//!
//! ```text
//! Pending --(height >= window_start)--------------------------> Active
//! Active  --(valid FraudProof)--------------------------------> Disputed
//! Active  --(height >= window_end + retention, not disputed)--> Finalizable
//! Finalizable --(valid Finalize receipt)----------------------> Finalized
//! Finalized --(deletion authorized)---------------------------> Deleted
//! Disputed is terminal for deletion; it never reaches Finalized.
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Transitions are idempotent | `domain/slab.rs` transition methods |
//! | INVARIANT-2 | Finalize on Disputed fails | `SlabRecord::finalize()` |
//! | INVARIANT-3 | Fraud proofs verify against the committed root | `domain/fraud.rs::verify_fraud_proof()` |
//! | INVARIANT-4 | Deletion requires finalize-height, clean registry, budget | `domain/finalize.rs::verify_finalize()` |
//!
//! All rejections are returned as `Result<(), RetentionReject>` data; they
//! never abort the kernel process. The registries are explicit stores
//! passed by the host (single writer, concurrent readers), not process
//! singletons.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod errors;
pub mod registry;
pub mod service;

pub use domain::finalize::{verify_finalize, FinalizeReceipt};
pub use domain::fraud::{verify_fraud_proof, FraudProof, Violation};
pub use domain::policy::{DeletionAuthorization, RetentionPolicy, RETENTION_DOMAIN};
pub use domain::slab::{DisputeInfo, SlabRecord, SlabState};
pub use errors::{RetentionReject, RetentionResult};
pub use registry::{DisputeRegistry, FinalizedRegistry, SlabStore};
pub use service::{build_slab_receipt, RetentionService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
