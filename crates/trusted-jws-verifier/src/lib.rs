//! # Trusted JWS Verifier
//!
//! Verifies compact JWS envelopes and reports whether the signer is trusted.
//!
//! A signer is trusted when the envelope's `jku` (the URL of its JWK set)
//! appears in at least one trusted registry. Trust and validity are separate:
//! a valid signature from an unlisted signer verifies with `trusted == false`,
//! while an invalid signature is always an error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trusted_jws_verifier::{TrustedVerifier, VerificationOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let verifier = TrustedVerifier::new()?;
//!     let options = VerificationOptions::from_env()
//!         .with_additional_registry("https://example.org/registry.json");
//!
//!     let envelope = std::fs::read_to_string("registration.jws")?;
//!     let verified = verifier.verify(envelope.trim(), &options).await?;
//!     println!("trusted = {}", verified.trusted);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! envelope ─▶ SignatureCodec::decode
//!                 │
//!                 ▼
//!     RegistryAggregator::resolve ──▶ TrustResolver::decide
//!                                            │
//!                                            ▼
//!                                 KeyResolver::resolve_key
//!                                            │
//!                                            ▼
//!                                 SignatureCodec::verify ─▶ Verified
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod keys;
pub mod options;
pub mod pipeline;
pub mod trust;


pub use error::{KeyResolutionError, VerifyError};
pub use keys::{JwksKeyResolver, KeyResolver, UntrustedJkuPolicy};
pub use options::{VerificationOptions, DEFAULT_CACHE_TIME_SECS, DEFAULT_TIMEOUT_MS};
pub use pipeline::{TrustedVerifier, TrustedVerifierBuilder, Verified};
pub use trust::{TrustDecision, TrustResolver};
