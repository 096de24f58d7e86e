//! # Coherence-Chain Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/          # Cross-subsystem scenarios
//!     ├── engine_invariants.rs   # Absorption, projection, determinism
//!     ├── consensus_scenarios.rs # Slabs, fraud proofs, finalize gates
//!     └── replay_roundtrip.rs    # End-to-end episode + replay + tamper
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p coh-tests
//!
//! # By category
//! cargo test -p coh-tests integration::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;

/// Initialize tracing once for a test run; later calls are no-ops.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
