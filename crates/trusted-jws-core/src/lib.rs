//! # Trusted JWS Core
//!
//! Envelope-level building blocks for trusted JWS verification.
//!
//! This crate provides:
//!
//! - [`DecodedEnvelope`] - structural decoding of a compact JWS
//! - [`JoseHeader`] - the protected header (`alg`, `kid`, `jku`, `jwk`, ...)
//! - [`KeyMaterial`] - a public JWK and where it came from
//! - [`SignatureCodec`] - the decode/verify seam, with [`JwsCodec`] as the
//!   default implementation
//!
//! Trust decisions and network access live in `trusted-jws-registry` and
//! `trusted-jws-verifier`; nothing in this crate performs I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod envelope;
pub mod error;
pub mod header;
pub mod key;

#[cfg(test)]
mod proptest_tests;

pub use codec::{JwsCodec, SignatureCodec};
pub use envelope::DecodedEnvelope;
pub use error::{DecodeError, Segment, SignatureError};
pub use header::JoseHeader;
pub use key::{KeyMaterial, KeySource};

/// Re-exported JWK types used in [`KeyMaterial`] and [`JoseHeader`].
pub use jsonwebtoken::jwk::{Jwk, JwkSet};
/// Re-exported signature algorithm identifier.
pub use jsonwebtoken::Algorithm;
