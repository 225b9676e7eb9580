//! Operator authorization for commit-mode exports.

use adcast_core::AdcastError;

use crate::config::ServiceConfig;
use crate::crypto::key_matches;

/// Decides whether a commit-mode export may run.
///
/// Commit mode needs both the real-ads switch and a matching operator token. The check
/// runs before any adapter is touched.
#[derive(Clone, Default)]
pub struct CommitGate {
    allow_real_ads: bool,
    key: Option<String>,
    key_sha256: Option<String>,
}

impl CommitGate {
    /// Build the gate from configuration.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            allow_real_ads: config.allow_real_ads,
            key: config.export_admin_key.clone(),
            key_sha256: config.export_admin_key_sha256.clone(),
        }
    }

    /// Whether any operator token is configured.
    #[must_use]
    pub fn has_key(&self) -> bool {
        self.key.is_some() || self.key_sha256.is_some()
    }

    /// Whether a commit could ever be authorized: real ads on and a token configured.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.allow_real_ads && self.has_key()
    }

    /// Check the presented operator token.
    ///
    /// # Errors
    ///
    /// Returns `AdcastError::Authorization` when real ads are disabled, no operator token
    /// is configured, or the presented token is missing or wrong.
    pub fn authorize(&self, presented: Option<&str>) -> Result<(), AdcastError> {
        if !self.allow_real_ads {
            return Err(AdcastError::Authorization(
                "Real ad creation is disabled on this server".into(),
            ));
        }
        if !self.has_key() {
            return Err(AdcastError::Authorization(
                "No export operator key is configured".into(),
            ));
        }

        let presented = presented.ok_or_else(|| {
            AdcastError::Authorization("Missing export operator key".into())
        })?;
        if key_matches(presented, self.key.as_deref(), self.key_sha256.as_deref()) {
            Ok(())
        } else {
            tracing::warn!("Rejected commit export with invalid operator key");
            Err(AdcastError::Authorization("Invalid export operator key".into()))
        }
    }
}

impl std::fmt::Debug for CommitGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitGate")
            .field("allow_real_ads", &self.allow_real_ads)
            .field("has_key", &self.has_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256_hex;

    fn gate(allow: bool, key: Option<&str>, sha: Option<&str>) -> CommitGate {
        CommitGate::from_config(&ServiceConfig {
            allow_real_ads: allow,
            export_admin_key: key.map(str::to_string),
            export_admin_key_sha256: sha.map(str::to_string),
            ..ServiceConfig::default()
        })
    }

    #[test]
    fn disabled_switch_rejects_even_valid_key() {
        let gate = gate(false, Some("k"), None);
        assert!(matches!(
            gate.authorize(Some("k")),
            Err(AdcastError::Authorization(_))
        ));
    }

    #[test]
    fn requires_configured_and_matching_key() {
        assert!(gate(true, None, None).authorize(Some("k")).is_err());
        assert!(gate(true, Some("k"), None).authorize(None).is_err());
        assert!(gate(true, Some("k"), None).authorize(Some("x")).is_err());
        assert!(gate(true, Some("k"), None).authorize(Some("k")).is_ok());
    }

    #[test]
    fn accepts_hashed_key() {
        let digest = sha256_hex("operator");
        let gate = gate(true, None, Some(&digest));
        assert!(gate.authorize(Some("operator")).is_ok());
        assert!(gate.authorize(Some(&digest)).is_err());
    }

    #[test]
    fn open_only_with_switch_and_key() {
        assert!(gate(true, Some("k"), None).is_open());
        assert!(!gate(true, None, None).is_open());
        assert!(!gate(false, Some("k"), None).is_open());
    }
}
