//! Builder for signed compact JWS test envelopes.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{Algorithm, EncodingKey};
use serde_json::Value;
use trusted_jws_core::JoseHeader;

use crate::keys::TestKeyPair;

/// Payload used by the fixtures unless overridden.
pub const DEFAULT_PAYLOAD: &[u8] = b"DEAD BEEF";

/// Fluent builder for signed envelopes.
///
/// # Examples
///
/// ```rust
/// use trusted_jws_test::{TestKeyPair, TokenBuilder};
///
/// let token = TokenBuilder::new(TestKeyPair::shared())
///     .jku("https://test.example.org/trusted")
///     .payload(b"hello")
///     .sign();
/// assert_eq!(token.split('.').count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct TokenBuilder<'a> {
    key: &'a TestKeyPair,
    header: JoseHeader,
    payload: Vec<u8>,
}

impl<'a> TokenBuilder<'a> {
    /// Starts an `RS256` envelope carrying the key's `kid`.
    #[must_use]
    pub fn new(key: &'a TestKeyPair) -> Self {
        Self {
            key,
            header: JoseHeader::new("RS256").with_kid(key.kid()),
            payload: DEFAULT_PAYLOAD.to_vec(),
        }
    }

    /// Sets the `jku` header.
    #[must_use]
    pub fn jku(mut self, jku: impl Into<String>) -> Self {
        self.header.jku = Some(jku.into());
        self
    }

    /// Overrides the `kid` header.
    #[must_use]
    pub fn kid(mut self, kid: impl Into<String>) -> Self {
        self.header.kid = Some(kid.into());
        self
    }

    /// Removes the `kid` header.
    #[must_use]
    pub fn without_kid(mut self) -> Self {
        self.header.kid = None;
        self
    }

    /// Embeds the signing key's public JWK in the header.
    #[must_use]
    pub fn embed_public_key(mut self) -> Self {
        self.header.jwk = Some(self.key.public_jwk().clone());
        self
    }

    /// Sets an arbitrary extra header member.
    #[must_use]
    pub fn header_member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.header.extra.insert(name.into(), value.into());
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn payload(mut self, payload: impl AsRef<[u8]>) -> Self {
        self.payload = payload.as_ref().to_vec();
        self
    }

    /// Signs with the RSA key using `RS256`.
    #[must_use]
    pub fn sign(self) -> String {
        let key = self.key.encoding_key();
        self.sign_with(&key, Algorithm::RS256)
    }

    /// Signs with an HMAC secret using `HS256`, as an attacker without the
    /// private key might.
    #[must_use]
    pub fn sign_hs256(mut self, secret: &[u8]) -> String {
        self.header.alg = "HS256".to_string();
        self.sign_with(&EncodingKey::from_secret(secret), Algorithm::HS256)
    }

    /// Produces the envelope with a corrupted signature.
    #[must_use]
    pub fn sign_tampered(self) -> String {
        let token = self.sign();
        let (input, signature) = token.rsplit_once('.').unwrap_or((token.as_str(), ""));
        let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap_or_default();
        if let Some(first) = bytes.first_mut() {
            *first ^= 0xff;
        }
        format!("{input}.{}", URL_SAFE_NO_PAD.encode(bytes))
    }

    fn sign_with(self, key: &EncodingKey, alg: Algorithm) -> String {
        let header = serde_json::to_vec(&self.header).expect("header serializes");
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(&self.payload)
        );
        let signature = jsonwebtoken::crypto::sign(signing_input.as_bytes(), key, alg)
            .expect("test key signs");
        format!("{signing_input}.{signature}")
    }
}
