//! Key resolution: finding the public key an envelope should verify against.
//!
//! [`JwksKeyResolver`] consults key sources in a fixed order:
//!
//! 1. a trusted `jku`, fetched as a JWK set
//! 2. the `jwk` embedded in the header
//! 3. locally pinned keys
//! 4. an untrusted `jku`, only under [`UntrustedJkuPolicy::Follow`]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use trusted_jws_core::{DecodedEnvelope, Jwk, JwkSet, KeyMaterial, KeySource};
use trusted_jws_registry::{FetchError, HttpFetcher};

use crate::error::KeyResolutionError;
use crate::trust::TrustDecision;

const PINNED_LOCATION: &str = "pinned key set";

/// Finds the verification key for a decoded envelope.
#[async_trait]
pub trait KeyResolver: Send + Sync + std::fmt::Debug {
    /// Resolves the key for `envelope` given the trust `decision`.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyResolutionError`] if no permitted source yields a key.
    async fn resolve_key(
        &self,
        envelope: &DecodedEnvelope,
        decision: &TrustDecision,
        timeout: Duration,
    ) -> Result<KeyMaterial, KeyResolutionError>;
}

/// What to do with a `jku` that no registry lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntrustedJkuPolicy {
    /// Never dereference it.
    #[default]
    Reject,
    /// Fetch keys from it anyway. The result still reports `trusted == false`.
    Follow,
}

/// [`KeyResolver`] backed by JWK sets.
#[derive(Debug, Clone)]
pub struct JwksKeyResolver {
    fetcher: Arc<dyn HttpFetcher>,
    pinned: Option<JwkSet>,
    untrusted_jku: UntrustedJkuPolicy,
}

impl JwksKeyResolver {
    /// Creates a resolver that fetches key sets with `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            fetcher,
            pinned: None,
            untrusted_jku: UntrustedJkuPolicy::Reject,
        }
    }

    /// Adds locally trusted keys for envelopes without a trusted `jku`.
    #[must_use]
    pub fn with_pinned_keys(mut self, keys: JwkSet) -> Self {
        self.pinned = Some(keys);
        self
    }

    /// Sets how untrusted `jku` values are handled.
    #[must_use]
    pub const fn with_untrusted_jku_policy(mut self, policy: UntrustedJkuPolicy) -> Self {
        self.untrusted_jku = policy;
        self
    }

    /// Returns the untrusted `jku` policy.
    #[must_use]
    pub const fn untrusted_jku_policy(&self) -> UntrustedJkuPolicy {
        self.untrusted_jku
    }

    async fn fetch_key(
        &self,
        url: &str,
        kid: Option<&str>,
        timeout: Duration,
        source: KeySource,
    ) -> Result<KeyMaterial, KeyResolutionError> {
        let response = tokio::time::timeout(timeout, self.fetcher.get(url, timeout))
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout,
            })??
            .error_for_status(url)?;

        let set: JwkSet =
            serde_json::from_slice(&response.body).map_err(|e| KeyResolutionError::InvalidKeySet {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        tracing::info!(url, keys = set.keys.len(), %source, "Fetched key set");

        let jwk = select_key(&set, kid, url)?;
        Ok(KeyMaterial::new(jwk.clone(), source))
    }
}

#[async_trait]
impl KeyResolver for JwksKeyResolver {
    async fn resolve_key(
        &self,
        envelope: &DecodedEnvelope,
        decision: &TrustDecision,
        timeout: Duration,
    ) -> Result<KeyMaterial, KeyResolutionError> {
        let header = envelope.header();
        let kid = header.kid();

        if let TrustDecision::Trusted { jku, .. } = decision {
            return self
                .fetch_key(jku, kid, timeout, KeySource::TrustedJku(jku.clone()))
                .await;
        }

        if let Some(jwk) = &header.jwk {
            if let (Some(header_kid), Some(jwk_kid)) = (kid, jwk.common.key_id.as_deref()) {
                if header_kid != jwk_kid {
                    return Err(KeyResolutionError::EmbeddedKidMismatch {
                        header_kid: header_kid.to_string(),
                        jwk_kid: jwk_kid.to_string(),
                    });
                }
            }
            tracing::debug!(kid, "Using embedded jwk");
            return Ok(KeyMaterial::new(jwk.clone(), KeySource::Embedded));
        }

        if let Some(pinned) = &self.pinned {
            match select_key(pinned, kid, PINNED_LOCATION) {
                Ok(jwk) => {
                    tracing::debug!(kid, "Using pinned key");
                    return Ok(KeyMaterial::new(jwk.clone(), KeySource::Pinned));
                }
                Err(e) => tracing::debug!(error = %e, "No pinned key matched"),
            }
        }

        if let (UntrustedJkuPolicy::Follow, Some(jku)) = (self.untrusted_jku, header.jku()) {
            tracing::warn!(jku, "Fetching keys from a jku no registry lists");
            return self
                .fetch_key(jku, kid, timeout, KeySource::UntrustedJku(jku.to_string()))
                .await;
        }

        Err(KeyResolutionError::NoKeySource {
            kid: kid.map(str::to_owned),
        })
    }
}

/// Picks the key named by `kid`, or the only key when there is no `kid`.
fn select_key<'a>(
    set: &'a JwkSet,
    kid: Option<&str>,
    location: &str,
) -> Result<&'a Jwk, KeyResolutionError> {
    match kid {
        Some(kid) => set.find(kid).ok_or_else(|| KeyResolutionError::KeyNotFound {
            location: location.to_string(),
            kid: kid.to_string(),
        }),
        None => match set.keys.as_slice() {
            [only] => Ok(only),
            keys => Err(KeyResolutionError::AmbiguousKey {
                location: location.to_string(),
                count: keys.len(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trusted_jws_test::{jwk_set_json, MockFailure, MockFetcher, TestKeyPair, TokenBuilder};

    const TIMEOUT: Duration = Duration::from_millis(1000);
    const TRUSTED: &str = "https://x/trusted";
    const UNTRUSTED: &str = "https://x/untrusted";

    fn trusted() -> TrustDecision {
        TrustDecision::Trusted {
            jku: TRUSTED.to_string(),
            registry: "https://x/list.json".to_string(),
        }
    }

    fn decode(token: &str) -> DecodedEnvelope {
        DecodedEnvelope::parse(token).unwrap()
    }

    fn serving_keys() -> Arc<MockFetcher> {
        let fetcher = Arc::new(MockFetcher::new());
        let jwks = jwk_set_json(&[TestKeyPair::shared()]);
        fetcher.respond_json(TRUSTED, &jwks).respond_json(UNTRUSTED, &jwks);
        fetcher
    }

    #[tokio::test]
    async fn test_trusted_jku_is_fetched() {
        let fetcher = serving_keys();
        let resolver = JwksKeyResolver::new(fetcher.clone());
        let envelope = decode(&TokenBuilder::new(TestKeyPair::shared()).jku(TRUSTED).sign());

        let key = resolver.resolve_key(&envelope, &trusted(), TIMEOUT).await.unwrap();
        assert_eq!(key.source(), &KeySource::TrustedJku(TRUSTED.to_string()));
        assert_eq!(key.kid(), Some("test-key"));
        assert_eq!(fetcher.calls(TRUSTED), 1);
    }

    #[tokio::test]
    async fn test_trusted_jku_without_kid_uses_single_key() {
        let resolver = JwksKeyResolver::new(serving_keys());
        let envelope = decode(
            &TokenBuilder::new(TestKeyPair::shared())
                .jku(TRUSTED)
                .without_kid()
                .sign(),
        );

        let key = resolver.resolve_key(&envelope, &trusted(), TIMEOUT).await.unwrap();
        assert_eq!(key.kid(), Some("test-key"));
    }

    #[tokio::test]
    async fn test_trusted_jku_unknown_kid() {
        let resolver = JwksKeyResolver::new(serving_keys());
        let envelope = decode(
            &TokenBuilder::new(TestKeyPair::shared())
                .jku(TRUSTED)
                .kid("other")
                .sign(),
        );

        let err = resolver.resolve_key(&envelope, &trusted(), TIMEOUT).await.unwrap_err();
        assert!(matches!(err, KeyResolutionError::KeyNotFound { ref kid, .. } if kid == "other"));
    }

    #[tokio::test]
    async fn test_trusted_jku_fetch_failure() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.fail(TRUSTED, MockFailure::Timeout);
        let resolver = JwksKeyResolver::new(fetcher);
        let envelope = decode(&TokenBuilder::new(TestKeyPair::shared()).jku(TRUSTED).sign());

        let err = resolver.resolve_key(&envelope, &trusted(), TIMEOUT).await.unwrap_err();
        assert!(matches!(
            err,
            KeyResolutionError::Fetch {
                source: FetchError::Timeout { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_trusted_jku_not_a_key_set() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond(TRUSTED, 200, "[]");
        let resolver = JwksKeyResolver::new(fetcher);
        let envelope = decode(&TokenBuilder::new(TestKeyPair::shared()).jku(TRUSTED).sign());

        let err = resolver.resolve_key(&envelope, &trusted(), TIMEOUT).await.unwrap_err();
        assert!(matches!(err, KeyResolutionError::InvalidKeySet { .. }));
    }

    #[tokio::test]
    async fn test_untrusted_jku_is_not_fetched_by_default() {
        let fetcher = serving_keys();
        let resolver = JwksKeyResolver::new(fetcher.clone());
        let envelope = decode(&TokenBuilder::new(TestKeyPair::shared()).jku(UNTRUSTED).sign());

        let err = resolver
            .resolve_key(&envelope, &TrustDecision::Untrusted, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, KeyResolutionError::NoKeySource { .. }));
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_untrusted_jku_followed_when_allowed() {
        let fetcher = serving_keys();
        let resolver = JwksKeyResolver::new(fetcher.clone())
            .with_untrusted_jku_policy(UntrustedJkuPolicy::Follow);
        let envelope = decode(&TokenBuilder::new(TestKeyPair::shared()).jku(UNTRUSTED).sign());

        let key = resolver
            .resolve_key(&envelope, &TrustDecision::Untrusted, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(key.source(), &KeySource::UntrustedJku(UNTRUSTED.to_string()));
        assert_eq!(fetcher.calls(UNTRUSTED), 1);
    }

    #[tokio::test]
    async fn test_embedded_jwk_used_when_untrusted() {
        let fetcher = serving_keys();
        let resolver = JwksKeyResolver::new(fetcher.clone());
        let envelope = decode(
            &TokenBuilder::new(TestKeyPair::shared())
                .jku(UNTRUSTED)
                .embed_public_key()
                .sign(),
        );

        let key = resolver
            .resolve_key(&envelope, &TrustDecision::Untrusted, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(key.source(), &KeySource::Embedded);
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_embedded_jwk_ignored_when_trusted() {
        let resolver = JwksKeyResolver::new(serving_keys());
        let envelope = decode(
            &TokenBuilder::new(TestKeyPair::shared())
                .jku(TRUSTED)
                .embed_public_key()
                .sign(),
        );

        let key = resolver.resolve_key(&envelope, &trusted(), TIMEOUT).await.unwrap();
        assert!(matches!(key.source(), KeySource::TrustedJku(_)));
    }

    #[tokio::test]
    async fn test_embedded_jwk_kid_must_match_header() {
        let resolver = JwksKeyResolver::new(serving_keys());
        let envelope = decode(
            &TokenBuilder::new(TestKeyPair::shared())
                .embed_public_key()
                .kid("someone-else")
                .sign(),
        );

        let err = resolver
            .resolve_key(&envelope, &TrustDecision::Untrusted, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, KeyResolutionError::EmbeddedKidMismatch { .. }));
    }

    #[tokio::test]
    async fn test_pinned_key_by_kid() {
        let resolver =
            JwksKeyResolver::new(serving_keys()).with_pinned_keys(TestKeyPair::shared().jwk_set());
        let envelope = decode(&TokenBuilder::new(TestKeyPair::shared()).sign());

        let key = resolver
            .resolve_key(&envelope, &TrustDecision::Untrusted, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(key.source(), &KeySource::Pinned);
    }

    #[tokio::test]
    async fn test_pinned_miss_falls_through() {
        let resolver = JwksKeyResolver::new(serving_keys())
            .with_pinned_keys(TestKeyPair::shared().jwk_set())
            .with_untrusted_jku_policy(UntrustedJkuPolicy::Follow);
        let envelope = decode(
            &TokenBuilder::new(TestKeyPair::shared())
                .jku(UNTRUSTED)
                .sign(),
        );
        let key = resolver
            .resolve_key(&envelope, &TrustDecision::Untrusted, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(key.source(), &KeySource::Pinned);

        let envelope = decode(
            &TokenBuilder::new(TestKeyPair::shared())
                .jku(UNTRUSTED)
                .kid("unpinned")
                .sign(),
        );
        let err = resolver
            .resolve_key(&envelope, &TrustDecision::Untrusted, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KeyResolutionError::KeyNotFound { ref location, .. } if location == UNTRUSTED
        ));
    }

    #[test]
    fn test_select_key_ambiguous_without_kid() {
        let set = JwkSet {
            keys: vec![
                TestKeyPair::shared().public_jwk().clone(),
                TestKeyPair::impostor().public_jwk().clone(),
            ],
        };
        let err = select_key(&set, None, "set").unwrap_err();
        assert!(matches!(err, KeyResolutionError::AmbiguousKey { count: 2, .. }));
    }

    #[test]
    fn test_policy_serde() {
        let policy: UntrustedJkuPolicy = serde_json::from_str(r#""follow""#).unwrap();
        assert_eq!(policy, UntrustedJkuPolicy::Follow);
        assert_eq!(UntrustedJkuPolicy::default(), UntrustedJkuPolicy::Reject);
    }
}
