//! # COH-01 Fixed-Point - Q18 Arithmetic Subsystem
//!
//! **Subsystem ID:** 1
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Deterministic fixed-point arithmetic for every numeric path in the kernel.
//! A value `x` is represented by the signed 64-bit integer `round(x * 2^18)`.
//! No float ever enters a hashed or persisted object; callers quantize once
//! at the boundary and stay in Q18 from then on.
//!
//! ## Rounding Discipline
//!
//! | Operation | Rounding | Enforcement |
//! |-----------|----------|-------------|
//! | Budget debit | UP (never undercharge) | `ops::debit()` |
//! | Budget refund | DOWN (never overcredit) | `ops::refund()` |
//! | Exploration sqrt | floor | `ops::q_sqrt()` |
//!
//! Every multiply/divide takes an explicit [`Round`] argument; there is no
//! default rounding mode.
//!
//! ## Failure Modes
//!
//! Intermediate results are widened to `i128` and checked back into the
//! `i64` domain. Out-of-range results fail with
//! [`FixedPointError::Overflow`], division by zero with
//! [`FixedPointError::DivisionByZero`]. Both are contract violations: the
//! caller propagates them, never catches them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod ops;

pub use errors::{FixedPointError, FixedPointResult};
pub use ops::{
    clamp, debit, from_int, q_add, q_div, q_mul, q_sqrt, q_sub, refund, to_int_floor, Round,
};

/// A Q18 fixed-point value: the real number `q / 2^18` stored as `i64`.
pub type Q18 = i64;

/// Scaling factor: `2^18`.
pub const SCALE: i64 = 1 << 18;

/// The Q18 representation of one.
pub const ONE_Q18: Q18 = SCALE;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
