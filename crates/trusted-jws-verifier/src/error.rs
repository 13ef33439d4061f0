//! Error types for verification.

use thiserror::Error;
use trusted_jws_core::{DecodeError, SignatureError};
use trusted_jws_registry::FetchError;

/// Why no verification key could be obtained for an envelope.
#[derive(Debug, Error)]
pub enum KeyResolutionError {
    /// Nothing the resolver is allowed to use names a key.
    #[error("no usable key source for envelope (kid: {kid:?})")]
    NoKeySource {
        /// Header `kid`, if any.
        kid: Option<String>,
    },

    /// The key set has no key with the requested `kid`.
    #[error("{location} has no key with kid {kid}")]
    KeyNotFound {
        /// Where the key set came from.
        location: String,
        /// Requested key identifier.
        kid: String,
    },

    /// The envelope names no `kid` and the key set does not hold exactly one key.
    #[error("{location} holds {count} keys and the envelope names no kid")]
    AmbiguousKey {
        /// Where the key set came from.
        location: String,
        /// Number of keys in the set.
        count: usize,
    },

    /// The embedded `jwk` disagrees with the header about the key identifier.
    #[error("embedded jwk kid {jwk_kid} does not match header kid {header_kid}")]
    EmbeddedKidMismatch {
        /// Header `kid`.
        header_kid: String,
        /// `kid` of the embedded key.
        jwk_kid: String,
    },

    /// The key set could not be fetched.
    #[error("failed to fetch key set: {source}")]
    Fetch {
        /// Underlying fetch error.
        #[from]
        source: FetchError,
    },

    /// The key set document is not a JWK set.
    #[error("invalid key set from {url}: {message}")]
    InvalidKeySet {
        /// Key set URL.
        url: String,
        /// Parse error message.
        message: String,
    },
}

/// Errors returned by [`TrustedVerifier::verify`](crate::TrustedVerifier::verify).
///
/// A valid signature from an untrusted signer is not an error; it verifies
/// with `trusted == false`.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The envelope could not be decoded.
    #[error("failed to decode envelope: {0}")]
    Decode(#[from] DecodeError),

    /// No verification key could be obtained.
    #[error("could not resolve verification key: {0}")]
    KeyResolution(#[from] KeyResolutionError),

    /// The signature does not verify against the resolved key.
    #[error("Invalid signature")]
    SignatureInvalid {
        /// Set when the signature could not be checked at all, for example
        /// because of a disallowed algorithm.
        #[source]
        source: Option<SignatureError>,
    },
}

impl VerifyError {
    /// Returns true if the envelope could not be decoded.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns true if no verification key could be obtained.
    #[must_use]
    pub const fn is_key_resolution(&self) -> bool {
        matches!(self, Self::KeyResolution(_))
    }

    /// Returns true if the signature failed verification.
    #[must_use]
    pub const fn is_signature_invalid(&self) -> bool {
        matches!(self, Self::SignatureInvalid { .. })
    }
}
