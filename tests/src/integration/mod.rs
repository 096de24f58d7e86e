//! Cross-subsystem integration scenarios.

pub mod consensus_scenarios;
pub mod engine_invariants;
pub mod replay_roundtrip;
