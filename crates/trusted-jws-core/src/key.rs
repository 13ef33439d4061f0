//! Verification key material.

use jsonwebtoken::jwk::Jwk;

/// Where a verification key was obtained from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Fetched from a `jku` that a trusted registry lists.
    TrustedJku(String),
    /// Fetched from a `jku` that no registry lists.
    UntrustedJku(String),
    /// Embedded in the envelope header.
    Embedded,
    /// Taken from a locally configured key set.
    Pinned,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrustedJku(url) => write!(f, "trusted jku {url}"),
            Self::UntrustedJku(url) => write!(f, "untrusted jku {url}"),
            Self::Embedded => write!(f, "embedded jwk"),
            Self::Pinned => write!(f, "pinned key set"),
        }
    }
}

/// A public JWK together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMaterial {
    jwk: Jwk,
    source: KeySource,
}

impl KeyMaterial {
    /// Wraps a JWK obtained from `source`.
    #[must_use]
    pub const fn new(jwk: Jwk, source: KeySource) -> Self {
        Self { jwk, source }
    }

    /// Returns the JWK.
    #[must_use]
    pub const fn jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// Returns where the key came from.
    #[must_use]
    pub const fn source(&self) -> &KeySource {
        &self.source
    }

    /// Returns the key identifier, if the JWK has one.
    #[must_use]
    pub fn kid(&self) -> Option<&str> {
        self.jwk.common.key_id.as_deref()
    }
}
