//! SHA-256 digests and the `sha256:` text form.

use sha2::{Digest, Sha256};

use crate::errors::{CryptoError, CryptoResult};

/// SHA-256 hash output (256-bit).
pub type Hash = [u8; 32];

/// Text prefix for hex-encoded digests.
pub const DIGEST_PREFIX: &str = "sha256:";

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Hash multiple inputs as one concatenated preimage.
pub fn sha256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Encode a hash as `sha256:` + lowercase hex.
pub fn sha256_prefixed(hash: &Hash) -> String {
    format!("{DIGEST_PREFIX}{}", hex::encode(hash))
}

/// Decode a `sha256:`-prefixed digest string.
pub fn decode_prefixed(s: &str) -> CryptoResult<Hash> {
    let hex_part = s
        .strip_prefix(DIGEST_PREFIX)
        .ok_or_else(|| CryptoError::BadDigestPrefix { got: s.to_string() })?;
    let bytes = hex::decode(hex_part)
        .map_err(|_| CryptoError::BadDigestPrefix { got: s.to_string() })?;
    if bytes.len() != 32 {
        return Err(CryptoError::BadDigestLength { len: bytes.len() });
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Serde adapter serializing a [`Hash`] as its `sha256:` text form.
pub mod serde_prefixed {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{decode_prefixed, sha256_prefixed, Hash};

    /// Serialize as `sha256:<hex>`.
    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&sha256_prefixed(hash))
    }

    /// Deserialize from `sha256:<hex>`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_prefixed(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(sha256(b"test"), sha256(b"test"));
    }

    #[test]
    fn test_different_inputs() {
        assert_ne!(sha256(b"input1"), sha256(b"input2"));
    }

    #[test]
    fn test_concat_matches_oneshot() {
        assert_eq!(sha256_concat(&[b"hello ", b"world"]), sha256(b"hello world"));
    }

    #[test]
    fn test_prefixed_roundtrip() {
        let h = sha256(b"x");
        let text = sha256_prefixed(&h);
        assert!(text.starts_with("sha256:"));
        assert_eq!(text.len(), 7 + 64);
        assert_eq!(decode_prefixed(&text).unwrap(), h);
    }

    #[test]
    fn test_decode_rejects_bad_prefix() {
        let err = decode_prefixed("blake3:00").unwrap_err();
        assert!(matches!(err, CryptoError::BadDigestPrefix { .. }));
    }

    #[test]
    fn test_decode_rejects_short_digest() {
        let err = decode_prefixed("sha256:abcd").unwrap_err();
        assert_eq!(err, CryptoError::BadDigestLength { len: 2 });
    }
}
