//! # COH-02 Canonical - RFC 8785 Serialization Subsystem
//!
//! **Subsystem ID:** 2
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Every object that enters a hash is serialized here, and only here.
//! Serialization is RFC 8785 (JCS): keys sorted by UTF-16 code unit, no
//! insignificant whitespace, minimal escapes. The canonical byte string of a
//! value is unique, so two parties hashing the same structure always agree.
//!
//! ## The No-Float Rule
//!
//! Floats are rejected, not formatted. Any JSON number that is not exactly
//! representable as `i64`/`u64` fails with
//! [`CanonicalError::FloatInCanonical`] naming the JSON-pointer path of the
//! offending value. Callers pre-quantize to Q18 integers; there is no lossy
//! fallback.
//!
//! Canonical bytes are produced from typed `serde` structures through
//! `serde_json::Value`, never from ad-hoc maps, so the guard sees the exact
//! value that will be hashed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canon;
pub mod errors;

pub use canon::{canonical_bytes, canonical_sha256, roundtrip, to_canonical_value};
pub use errors::{CanonicalError, CanonicalResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
