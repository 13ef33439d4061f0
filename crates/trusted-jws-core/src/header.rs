//! JOSE protected header.

use jsonwebtoken::jwk::Jwk;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protected header of a compact JWS.
///
/// Only the members that take part in trust and key resolution are typed;
/// everything else is kept in [`JoseHeader::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoseHeader {
    /// Signature algorithm (e.g. `RS256`).
    pub alg: String,

    /// Identifier of the signing key within its key set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// URL of the JWK set the signer publishes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jku: Option<String>,

    /// Media type of the complete JWS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Public key embedded in the header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwk: Option<Jwk>,

    /// Remaining header members.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JoseHeader {
    /// Creates a header with only `alg` set.
    #[must_use]
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            kid: None,
            jku: None,
            typ: None,
            jwk: None,
            extra: Map::new(),
        }
    }

    /// Sets the key identifier.
    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Sets the JWK set URL.
    #[must_use]
    pub fn with_jku(mut self, jku: impl Into<String>) -> Self {
        self.jku = Some(jku.into());
        self
    }

    /// Embeds a public key.
    #[must_use]
    pub fn with_jwk(mut self, jwk: Jwk) -> Self {
        self.jwk = Some(jwk);
        self
    }

    /// Returns the `jku` claim, if any.
    #[must_use]
    pub fn jku(&self) -> Option<&str> {
        self.jku.as_deref()
    }

    /// Returns the `kid` claim, if any.
    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }
}
