//! The retention policy document.

use coh_02_canonical::canonical_bytes;
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256_concat, sha256_prefixed};
use shared_types::Q18;

use crate::errors::{RetentionReject, RetentionResult};

/// Domain prefix for policy-id preimages.
pub const RETENTION_DOMAIN: &[u8] = b"COH_RETENTION_V1\n";

/// Conditions for authorized deletion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionAuthorization {
    /// Minimum budget the finalizing party must present (Q18).
    pub min_budget_q: Q18,
    /// The dispute registry must be clean for the slab.
    pub no_disputes: bool,
    /// The window end must be re-derived and verified.
    pub window_end_verified: bool,
}

/// The canonical retention policy document. Its id is content-derived:
/// `policy_id = "sha256:" + SHA256(DOMAIN || JCS(policy))`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Policy version string.
    pub version: String,
    /// Blocks to retain a slab after its challenge window closes.
    pub retention_period_blocks: u64,
    /// Challenge window length in blocks.
    pub dispute_window_blocks: u64,
    /// Deletion gating.
    pub deletion_authorization: DeletionAuthorization,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            retention_period_blocks: 100,
            dispute_window_blocks: 50,
            deletion_authorization: DeletionAuthorization {
                min_budget_q: 0,
                no_disputes: true,
                window_end_verified: true,
            },
        }
    }
}

impl RetentionPolicy {
    /// Content-derived policy id over the domain-tagged canonical bytes.
    pub fn policy_id(&self) -> String {
        let jcs = canonical_bytes(self).expect("policy is float-free by construction");
        sha256_prefixed(&sha256_concat(&[RETENTION_DOMAIN, &jcs]))
    }

    /// Validate the document.
    pub fn validate(&self) -> RetentionResult<()> {
        if self.version.is_empty() {
            return Err(RetentionReject::InvalidViolation {
                reason: "policy version must be non-empty".into(),
            });
        }
        if self.deletion_authorization.min_budget_q < 0 {
            return Err(RetentionReject::InvalidViolation {
                reason: "min_budget_q must be non-negative".into(),
            });
        }
        Ok(())
    }

    /// Height at which a slab's challenge window closes.
    pub fn window_end(&self, accept_height: u64) -> u64 {
        accept_height + self.dispute_window_blocks
    }

    /// Earliest height at which a slab may finalize.
    pub fn finalize_height(&self, window_end: u64) -> u64 {
        window_end + self.retention_period_blocks
    }
}
