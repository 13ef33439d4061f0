//! The verification pipeline: decode, resolve registries, decide trust,
//! resolve the key, check the signature.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use trusted_jws_core::{JwsCodec, KeySource, SignatureCodec};
use trusted_jws_registry::{
    parse_registry_uri, FetcherConfig, HttpFetcher, RegistryAggregator, RegistryCache,
    RegistryError, ReqwestFetcher, DEFAULT_TRUSTED_LIST_URI,
};

use crate::error::VerifyError;
use crate::keys::{JwksKeyResolver, KeyResolver};
use crate::options::VerificationOptions;
use crate::trust::{TrustDecision, TrustResolver};

/// A verified payload and whether its signer is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// True if a registry lists the `jku` the key was fetched from.
    pub trusted: bool,
    /// The signed payload.
    pub payload: Vec<u8>,
    decision: TrustDecision,
    key_source: Option<KeySource>,
}

impl Verified {
    fn passthrough(input: &str) -> Self {
        Self {
            trusted: false,
            payload: input.as_bytes().to_vec(),
            decision: TrustDecision::Untrusted,
            key_source: None,
        }
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consumes the result, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Returns the payload as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid UTF-8.
    pub fn payload_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.payload)
    }

    /// Deserializes the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not JSON of the expected shape.
    pub fn payload_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.payload)
    }

    /// Returns the trust decision behind [`Verified::trusted`].
    #[must_use]
    pub const fn decision(&self) -> &TrustDecision {
        &self.decision
    }

    /// Returns where the verification key came from.
    ///
    /// `None` for headerless input passed through without verification.
    #[must_use]
    pub const fn key_source(&self) -> Option<&KeySource> {
        self.key_source.as_ref()
    }
}

/// Verifies compact JWS envelopes and reports whether the signer is trusted.
///
/// Cheap to clone; clones share the registry cache and fetcher.
///
/// # Examples
///
/// ```rust,no_run
/// use trusted_jws_verifier::{TrustedVerifier, VerificationOptions};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = TrustedVerifier::new()?;
/// let verified = verifier
///     .verify("eyJhbGciOi...", &VerificationOptions::default())
///     .await?;
///
/// if verified.trusted {
///     println!("trusted payload: {}", verified.payload_str()?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TrustedVerifier {
    default_registry: String,
    codec: Arc<dyn SignatureCodec>,
    aggregator: RegistryAggregator,
    key_resolver: Arc<dyn KeyResolver>,
}

impl TrustedVerifier {
    /// Creates a verifier with the default registry, codec and HTTP client,
    /// sharing the process-wide registry cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, RegistryError> {
        Self::builder().build()
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> TrustedVerifierBuilder {
        TrustedVerifierBuilder::default()
    }

    /// Returns the registry consulted before any per-call registries.
    #[must_use]
    pub fn default_registry(&self) -> &str {
        &self.default_registry
    }

    /// Returns the registry aggregator.
    #[must_use]
    pub const fn aggregator(&self) -> &RegistryAggregator {
        &self.aggregator
    }

    /// Verifies `envelope`.
    ///
    /// A valid signature from a signer no registry vouches for verifies with
    /// `trusted == false`. Input without a header segment is returned
    /// unverified as an untrusted payload unless
    /// [`VerificationOptions::strict_decoding`] is set.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Decode`] if the envelope is malformed
    /// - [`VerifyError::KeyResolution`] if no verification key is available
    /// - [`VerifyError::SignatureInvalid`] if the signature does not verify
    pub async fn verify(
        &self,
        envelope: &str,
        options: &VerificationOptions,
    ) -> Result<Verified, VerifyError> {
        let decoded = match self.codec.decode(envelope) {
            Ok(decoded) => decoded,
            Err(e) if e.is_missing_header() && !options.strict_decoding => {
                tracing::warn!(
                    len = envelope.len(),
                    "Input has no JWS header; returning it unverified as untrusted"
                );
                return Ok(Verified::passthrough(envelope));
            }
            Err(e) => return Err(e.into()),
        };

        let timeout = options.timeout();
        let uris = self.registry_uris(options);
        let registries = self
            .aggregator
            .resolve(&uris, timeout, options.cache_time())
            .await;

        let decision = TrustResolver::decide(Some(decoded.header()), &registries);
        let key = self
            .key_resolver
            .resolve_key(&decoded, &decision, timeout)
            .await?;

        match self.codec.verify(&decoded, &key) {
            Ok(true) => {
                tracing::debug!(
                    trusted = decision.is_trusted(),
                    source = %key.source(),
                    "Signature verified"
                );
                Ok(Verified {
                    trusted: decision.is_trusted(),
                    payload: decoded.into_payload(),
                    decision,
                    key_source: Some(key.source().clone()),
                })
            }
            Ok(false) => Err(VerifyError::SignatureInvalid { source: None }),
            Err(e) => Err(VerifyError::SignatureInvalid { source: Some(e) }),
        }
    }

    fn registry_uris(&self, options: &VerificationOptions) -> Vec<String> {
        std::iter::once(self.default_registry.clone())
            .chain(options.additional_registry_uris.iter().cloned())
            .collect()
    }
}

/// Builder for [`TrustedVerifier`].
#[derive(Debug, Default)]
pub struct TrustedVerifierBuilder {
    default_registry: Option<String>,
    codec: Option<Arc<dyn SignatureCodec>>,
    key_resolver: Option<Arc<dyn KeyResolver>>,
    fetcher: Option<Arc<dyn HttpFetcher>>,
    fetcher_config: Option<FetcherConfig>,
    cache: Option<Arc<RegistryCache>>,
    negative_ttl: Option<Duration>,
}

impl TrustedVerifierBuilder {
    /// Replaces the default registry URI.
    #[must_use]
    pub fn default_registry(mut self, uri: impl Into<String>) -> Self {
        self.default_registry = Some(uri.into());
        self
    }

    /// Sets the signature codec.
    #[must_use]
    pub fn codec(mut self, codec: Arc<dyn SignatureCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Sets the key resolver. Defaults to a [`JwksKeyResolver`] sharing the
    /// verifier's fetcher.
    #[must_use]
    pub fn key_resolver(mut self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.key_resolver = Some(resolver);
        self
    }

    /// Sets the HTTP fetcher used for registries and the default key resolver.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn HttpFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Configures the default `reqwest` fetcher. Ignored when a fetcher is set.
    #[must_use]
    pub fn fetcher_config(mut self, config: FetcherConfig) -> Self {
        self.fetcher_config = Some(config);
        self
    }

    /// Sets the registry cache. Defaults to [`RegistryCache::shared`].
    #[must_use]
    pub fn cache(mut self, cache: Arc<RegistryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Remembers failed registry fetches for `ttl`.
    #[must_use]
    pub const fn negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = Some(ttl);
        self
    }

    /// Builds the verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the default registry URI is not an `http(s)` URL
    /// or the default HTTP client cannot be built.
    pub fn build(self) -> Result<TrustedVerifier, RegistryError> {
        let default_registry = self
            .default_registry
            .unwrap_or_else(|| DEFAULT_TRUSTED_LIST_URI.to_string());
        parse_registry_uri(&default_registry)?;

        let fetcher: Arc<dyn HttpFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(ReqwestFetcher::new(
                self.fetcher_config.unwrap_or_default(),
            )?),
        };

        let mut aggregator = RegistryAggregator::new(
            Arc::clone(&fetcher),
            self.cache.unwrap_or_else(RegistryCache::shared),
        );
        if let Some(ttl) = self.negative_ttl {
            aggregator = aggregator.with_negative_ttl(ttl);
        }

        let key_resolver = self
            .key_resolver
            .unwrap_or_else(|| Arc::new(JwksKeyResolver::new(fetcher)));

        Ok(TrustedVerifier {
            default_registry,
            codec: self.codec.unwrap_or_else(|| Arc::new(JwsCodec::new())),
            aggregator,
            key_resolver,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trusted_jws_registry::ManualClock;
    use trusted_jws_test::{MockFetcher, TestKeyPair, TokenBuilder, TrustFixture};

    fn verifier(fixture: &TrustFixture) -> TrustedVerifier {
        TrustedVerifier::builder()
            .default_registry(fixture.registry_uri())
            .fetcher(fixture.fetcher())
            .cache(Arc::new(RegistryCache::with_clock(Arc::new(ManualClock::new()))))
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let verifier = TrustedVerifier::builder()
            .fetcher(Arc::new(MockFetcher::new()))
            .build()
            .unwrap();
        assert_eq!(verifier.default_registry(), DEFAULT_TRUSTED_LIST_URI);
    }

    #[test]
    fn test_invalid_default_registry_is_rejected() {
        let err = TrustedVerifier::builder()
            .default_registry("file:///etc/trusted.json")
            .fetcher(Arc::new(MockFetcher::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl { .. }));
    }

    #[test]
    fn test_registry_uris_default_first() {
        let fixture = TrustFixture::new();
        let verifier = verifier(&fixture);
        let options = VerificationOptions::new()
            .with_additional_registry("https://a")
            .with_additional_registry("https://b");

        assert_eq!(
            verifier.registry_uris(&options),
            vec![
                fixture.registry_uri().to_string(),
                "https://a".to_string(),
                "https://b".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_trusted_payload() {
        let fixture = TrustFixture::new();
        let token = TokenBuilder::new(TestKeyPair::shared())
            .jku(fixture.trusted_jku())
            .payload(br#"{"client_name":"test"}"#)
            .sign();

        let verified = verifier(&fixture)
            .verify(&token, &VerificationOptions::default())
            .await
            .unwrap();

        assert!(verified.trusted);
        assert_eq!(verified.decision().registry(), Some(fixture.registry_uri()));
        assert_eq!(
            verified.key_source(),
            Some(&KeySource::TrustedJku(fixture.trusted_jku().to_string()))
        );
        let json: serde_json::Value = verified.payload_json().unwrap();
        assert_eq!(json["client_name"], "test");
    }

    #[tokio::test]
    async fn test_headerless_input_passes_through() {
        let fixture = TrustFixture::new();
        let verifier = verifier(&fixture);

        let verified = verifier
            .verify("not an envelope", &VerificationOptions::default())
            .await
            .unwrap();
        assert!(!verified.trusted);
        assert_eq!(verified.payload_str().unwrap(), "not an envelope");
        assert!(verified.key_source().is_none());
        assert_eq!(fixture.fetcher().total_calls(), 0);
    }

    #[tokio::test]
    async fn test_headerless_input_rejected_when_strict() {
        let fixture = TrustFixture::new();
        let err = verifier(&fixture)
            .verify("", &VerificationOptions::new().with_strict_decoding(true))
            .await
            .unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn test_broken_envelope_with_header_is_decode_error() {
        let fixture = TrustFixture::new();
        let err = verifier(&fixture)
            .verify("eyJhbGciOiJSUzI1NiJ9.only-two", &VerificationOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_decode());
    }
}
