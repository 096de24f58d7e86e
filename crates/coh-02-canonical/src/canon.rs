//! Canonical byte production and the float guard.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::errors::{CanonicalError, CanonicalResult};

/// Convert a typed value into a guarded `serde_json::Value`.
///
/// Fails with [`CanonicalError::FloatInCanonical`] if any number in the
/// tree is not exactly an `i64` or `u64`.
pub fn to_canonical_value<T: Serialize>(value: &T) -> CanonicalResult<Value> {
    let v = serde_json::to_value(value)?;
    guard_no_floats(&v, String::new())?;
    Ok(v)
}

/// Produce the RFC 8785 canonical bytes of a typed value.
pub fn canonical_bytes<T: Serialize>(value: &T) -> CanonicalResult<Vec<u8>> {
    let v = to_canonical_value(value)?;
    Ok(serde_jcs::to_vec(&v)?)
}

/// SHA-256 over the canonical bytes of a typed value.
pub fn canonical_sha256<T: Serialize>(value: &T) -> CanonicalResult<[u8; 32]> {
    let bytes = canonical_bytes(value)?;
    let digest = Sha256::digest(&bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Ok(out)
}

/// Round-trip check: parse the canonical bytes and re-serialize.
///
/// For a canonical serializer this must be the identity on bytes; the
/// verifier uses it as a self-test before trusting foreign receipts.
pub fn roundtrip<T: Serialize>(value: &T) -> CanonicalResult<bool> {
    let first = canonical_bytes(value)?;
    let reparsed: Value = serde_json::from_slice(&first)?;
    let second = serde_jcs::to_vec(&reparsed)?;
    Ok(first == second)
}

fn guard_no_floats(value: &Value, path: String) -> CanonicalResult<()> {
    match value {
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Ok(())
            } else {
                Err(CanonicalError::FloatInCanonical { path })
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                guard_no_floats(item, format!("{path}/{i}"))?;
            }
            Ok(())
        }
        Value::Object(map) => {
            for (key, item) in map {
                guard_no_floats(item, format!("{path}/{key}"))?;
            }
            Ok(())
        }
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
    }
}
