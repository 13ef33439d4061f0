//! Error types for envelope decoding and signature verification.

use thiserror::Error;

/// Segment of a compact JWS, used to report where decoding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// The protected header.
    Header,
    /// The payload.
    Payload,
    /// The signature.
    Signature,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header => write!(f, "header"),
            Self::Payload => write!(f, "payload"),
            Self::Signature => write!(f, "signature"),
        }
    }
}

/// Errors that can occur while decoding a signature envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input carries no header segment at all (empty or not dot-separated).
    #[error("envelope has no header")]
    MissingHeader,

    /// The envelope does not have the compact `header.payload.signature` shape.
    #[error("malformed envelope: {reason}")]
    Malformed {
        /// Reason the envelope was rejected.
        reason: String,
    },

    /// A segment is not valid unpadded base64url.
    #[error("invalid base64url in {segment} segment: {source}")]
    Base64 {
        /// Segment that failed to decode.
        segment: Segment,
        /// Underlying decode error.
        #[source]
        source: base64::DecodeError,
    },

    /// The header is not a JSON object with a string `alg`.
    #[error("invalid header JSON: {source}")]
    HeaderJson {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Returns true if the input had no header segment.
    #[must_use]
    pub const fn is_missing_header(&self) -> bool {
        matches!(self, Self::MissingHeader)
    }
}

/// Errors raised while checking a signature against key material.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The header algorithm is not accepted by the codec.
    #[error("algorithm '{alg}' is not accepted")]
    UnsupportedAlgorithm {
        /// Algorithm named in the header.
        alg: String,
    },

    /// The key cannot be used with the header algorithm.
    #[error("key does not match algorithm '{alg}': {reason}")]
    KeyMismatch {
        /// Algorithm named in the header.
        alg: String,
        /// Why the key was rejected.
        reason: String,
    },

    /// The JWK could not be turned into a verification key.
    #[error("invalid verification key: {source}")]
    InvalidKey {
        /// Underlying error.
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    /// The cryptographic primitive reported an error.
    #[error("signature check failed: {source}")]
    Crypto {
        /// Underlying error.
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}
