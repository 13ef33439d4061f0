//! Well-known URLs and canned registry/JWKS documents.
//!
//! A [`TrustFixture`] wires a [`MockFetcher`] with a trusted list that names
//! one `jku`, and a JWKS served at that `jku`.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::keys::TestKeyPair;
use crate::mock_fetcher::MockFetcher;

/// Root of the fictional host used by the fixtures.
pub const TEST_ROOT: &str = "https://test.example.org/";

/// Returns `TEST_ROOT` joined with `path`.
#[must_use]
pub fn test_url(path: &str) -> String {
    format!("{TEST_ROOT}{}", path.trim_start_matches('/'))
}

/// Builds a trusted-list document naming `jkus`.
#[must_use]
pub fn registry_json(jkus: &[&str]) -> Value {
    json!(jkus)
}

/// Builds a JWKS document containing the public halves of `keys`.
#[must_use]
pub fn jwk_set_json(keys: &[&TestKeyPair]) -> Value {
    json!({ "keys": keys.iter().map(|k| k.public_jwk()).collect::<Vec<_>>() })
}

/// A mock network with one trusted list and one key set.
///
/// # Examples
///
/// ```rust
/// use trusted_jws_test::TrustFixture;
///
/// let fixture = TrustFixture::new();
/// assert_eq!(fixture.registry_uri(), "https://test.example.org/trusted-list.json");
/// assert_eq!(fixture.trusted_jku(), "https://test.example.org/trusted");
/// ```
#[derive(Debug, Clone)]
pub struct TrustFixture {
    fetcher: Arc<MockFetcher>,
    registry_uri: String,
    trusted_jku: String,
    untrusted_jku: String,
}

impl TrustFixture {
    /// Mounts the default trusted list and serves [`TestKeyPair::shared`]
    /// at both the trusted and the untrusted `jku`.
    #[must_use]
    pub fn new() -> Self {
        let fixture = Self {
            fetcher: Arc::new(MockFetcher::new()),
            registry_uri: test_url("trusted-list.json"),
            trusted_jku: test_url("trusted"),
            untrusted_jku: test_url("untrusted"),
        };
        let jwks = jwk_set_json(&[TestKeyPair::shared()]);
        fixture
            .fetcher
            .respond_json(&fixture.registry_uri, &registry_json(&[&fixture.trusted_jku]))
            .respond_json(&fixture.trusted_jku, &jwks)
            .respond_json(&fixture.untrusted_jku, &jwks);
        fixture
    }

    /// Returns the scripted fetcher.
    #[must_use]
    pub fn fetcher(&self) -> Arc<MockFetcher> {
        Arc::clone(&self.fetcher)
    }

    /// Returns the trusted-list URI.
    #[must_use]
    pub fn registry_uri(&self) -> &str {
        &self.registry_uri
    }

    /// Returns the `jku` named by the trusted list.
    #[must_use]
    pub fn trusted_jku(&self) -> &str {
        &self.trusted_jku
    }

    /// Returns a `jku` that serves keys but is absent from the trusted list.
    #[must_use]
    pub fn untrusted_jku(&self) -> &str {
        &self.untrusted_jku
    }
}

impl Default for TrustFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        assert_eq!(test_url("/a.json"), "https://test.example.org/a.json");
        assert_eq!(test_url("a.json"), "https://test.example.org/a.json");
    }

    #[test]
    fn test_registry_json_is_array() {
        let doc = registry_json(&["https://a", "https://b"]);
        assert_eq!(doc, json!(["https://a", "https://b"]));
    }

    #[test]
    fn test_jwk_set_json_lists_keys() {
        let doc = jwk_set_json(&[TestKeyPair::shared()]);
        assert_eq!(doc["keys"].as_array().map(Vec::len), Some(1));
        assert_eq!(doc["keys"][0]["kid"], "test-key");
    }
}
