//! RSA key pairs for signing test envelopes.
//!
//! Key generation is slow in debug builds, so most tests should use the
//! lazily generated [`TestKeyPair::shared`] and [`TestKeyPair::impostor`].

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::EncodingKey;
use once_cell::sync::Lazy;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::json;
use trusted_jws_core::{Jwk, JwkSet};

/// Key identifier used by the shared fixtures.
pub const TEST_KID: &str = "test-key";

static SHARED: Lazy<TestKeyPair> = Lazy::new(|| TestKeyPair::generate(TEST_KID));
static IMPOSTOR: Lazy<TestKeyPair> = Lazy::new(|| TestKeyPair::generate(TEST_KID));

/// An RSA key pair with its public half as a JWK.
///
/// # Examples
///
/// ```rust
/// use trusted_jws_test::TestKeyPair;
///
/// let key = TestKeyPair::shared();
/// assert_eq!(key.public_jwk().common.key_id.as_deref(), Some(key.kid()));
/// ```
#[derive(Debug)]
pub struct TestKeyPair {
    kid: String,
    private_pem: String,
    public_jwk: Jwk,
}

impl TestKeyPair {
    /// Generates a fresh 2048-bit key pair.
    ///
    /// # Panics
    ///
    /// Panics if key generation or encoding fails.
    #[must_use]
    pub fn generate(kid: impl Into<String>) -> Self {
        let kid = kid.into();
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).expect("failed to generate RSA key");
        let public = private.to_public_key();

        let private_pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .expect("failed to encode RSA key")
            .to_string();

        let public_jwk = serde_json::from_value(json!({
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": kid,
            "n": URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
        }))
        .expect("RSA public JWK is well-formed");

        Self {
            kid,
            private_pem,
            public_jwk,
        }
    }

    /// Returns the key pair shared by all tests in the process.
    #[must_use]
    pub fn shared() -> &'static Self {
        &SHARED
    }

    /// Returns a second shared key pair that reuses the [`TEST_KID`] of
    /// [`TestKeyPair::shared`] but has different key material.
    #[must_use]
    pub fn impostor() -> &'static Self {
        &IMPOSTOR
    }

    /// Returns the key identifier.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Returns the public key as a JWK.
    #[must_use]
    pub const fn public_jwk(&self) -> &Jwk {
        &self.public_jwk
    }

    /// Returns a JWK set containing only the public key.
    #[must_use]
    pub fn jwk_set(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.public_jwk.clone()],
        }
    }

    /// Returns the private key for signing.
    ///
    /// # Panics
    ///
    /// Panics if the stored PEM cannot be parsed.
    #[must_use]
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_rsa_pem(self.private_pem.as_bytes()).expect("stored PEM is valid")
    }
}
