//! Core type definitions for confpoll
//!
//! These types identify configuration units and their content. They are
//! shared by every protocol version and form the correlation identity for
//! outstanding long-polls.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Generation counter assigned by the authority to each distinct config value.
///
/// Monotonically non-decreasing per key. `0` means "none yet" on the request
/// side (first fetch, or "any newer" when used as a wanted floor).
pub type Generation = i64;

/// MD5 content digest of a serialized configuration payload.
///
/// Used to detect byte-identical content across generation bumps: the
/// authority may advance the generation without changing the bytes, and that
/// must not be reported as changed content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Create a checksum from a 32-digit hex string
    ///
    /// Input is normalized to lowercase. Anything that is not exactly 32 hex
    /// digits is rejected.
    pub fn new(digest: impl Into<String>) -> Result<Self> {
        let digest = digest.into();
        if !is_well_formed_md5(&digest) {
            return Err(ConfigError::InvalidRequest(format!(
                "malformed checksum: {:?}",
                digest
            )));
        }
        Ok(Self(digest.to_ascii_lowercase()))
    }

    /// The "no known content" sentinel sent on the first fetch
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Check whether this is the empty sentinel
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the hex digest string (empty for the sentinel)
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Re-validate a checksum that crossed the network boundary
    ///
    /// Responses are decoded into `Checksum` by serde without going through
    /// `new`, so the validator calls this before accepting a reply.
    pub(crate) fn is_well_formed(&self) -> bool {
        self.0.is_empty() || is_well_formed_md5(&self.0)
    }
}

fn is_well_formed_md5(s: &str) -> bool {
    s.len() == 32 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a configuration unit
///
/// A key names a config definition (`def_name` within `def_namespace`) plus
/// the `config_id` of the consumer asking for it. Keys are immutable values
/// with structural equality, suitable as map keys for correlating
/// outstanding long-polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigKey {
    /// Name of the config definition
    pub def_name: String,
    /// Namespace the definition lives in
    pub def_namespace: String,
    /// Identity of the requesting consumer (may be empty)
    pub config_id: String,
    /// Digest of the definition schema, when the client knows it
    pub def_md5: Option<Checksum>,
}

impl ConfigKey {
    /// Create a new config key
    pub fn new(
        def_name: impl Into<String>,
        def_namespace: impl Into<String>,
        config_id: impl Into<String>,
    ) -> Self {
        Self {
            def_name: def_name.into(),
            def_namespace: def_namespace.into(),
            config_id: config_id.into(),
            def_md5: None,
        }
    }

    /// Attach the definition digest
    pub fn with_def_md5(mut self, md5: Checksum) -> Self {
        self.def_md5 = Some(md5);
        self
    }

    /// Check that the key names an actual definition
    ///
    /// `config_id` may be empty; name and namespace may not.
    pub fn validate(&self) -> Result<()> {
        if self.def_name.is_empty() {
            return Err(ConfigError::InvalidRequest(
                "config key has empty def name".to_string(),
            ));
        }
        if self.def_namespace.is_empty() {
            return Err(ConfigError::InvalidRequest(
                "config key has empty def namespace".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}:{}",
            self.def_namespace, self.def_name, self.config_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_normalizes_case() {
        let sum = Checksum::new("0123456789ABCDEF0123456789abcdef").unwrap();
        assert_eq!(sum.as_str(), "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn test_checksum_rejects_malformed() {
        assert!(Checksum::new("abc").is_err());
        assert!(Checksum::new("zz23456789abcdef0123456789abcdef").is_err());
        assert!(Checksum::new("0123456789abcdef0123456789abcdef00").is_err());
    }

    #[test]
    fn test_checksum_empty_sentinel() {
        let sum = Checksum::empty();
        assert!(sum.is_empty());
        assert!(sum.is_well_formed());
    }

    #[test]
    fn test_config_key_equality() {
        let a = ConfigKey::new("search", "vespa.config", "cluster/0");
        let b = ConfigKey::new("search", "vespa.config", "cluster/0");
        let c = ConfigKey::new("search", "vespa.config", "cluster/1");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_config_key_display() {
        let key = ConfigKey::new("search", "vespa.config", "cluster/0");
        assert_eq!(key.to_string(), "vespa.config.search:cluster/0");
    }

    #[test]
    fn test_config_key_validation() {
        assert!(ConfigKey::new("search", "ns", "").validate().is_ok());
        assert!(ConfigKey::new("", "ns", "id").validate().is_err());
        assert!(ConfigKey::new("search", "", "id").validate().is_err());
    }
}
