//! Governor configuration.

use serde::{Deserialize, Serialize};

/// Governor policy switches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Eliminate proposals whose taint tag is `"untrusted"`. The tag itself
    /// is opaque to the kernel; this is the only taint policy it applies.
    pub reject_untrusted_taint: bool,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self { reject_untrusted_taint: true }
    }
}

impl GovernorConfig {
    /// Permissive config for tests that exercise downstream filters.
    pub fn for_testing() -> Self {
        Self { reject_untrusted_taint: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rejects_untrusted() {
        assert!(GovernorConfig::default().reject_untrusted_taint);
        assert!(!GovernorConfig::for_testing().reject_untrusted_taint);
    }
}
