//! # Trusted JWS Test
//!
//! Test tooling for the trusted-jws crates.
//!
//! This crate provides:
//!
//! - RSA key pairs with matching public JWKs ([`TestKeyPair`])
//! - A builder for signed, tampered and HMAC-signed envelopes ([`TokenBuilder`])
//! - A scripted [`HttpFetcher`](trusted_jws_registry::HttpFetcher) ([`MockFetcher`])
//! - Canned trusted lists and key sets ([`TrustFixture`])
//!
//! ## Example
//!
//! ```rust
//! use trusted_jws_test::{TestKeyPair, TokenBuilder, TrustFixture};
//!
//! let fixture = TrustFixture::new();
//! let token = TokenBuilder::new(TestKeyPair::shared())
//!     .jku(fixture.trusted_jku())
//!     .sign();
//! assert!(!token.is_empty());
//! ```

pub mod fixtures;
pub mod keys;
pub mod mock_fetcher;
pub mod token;

pub use fixtures::{jwk_set_json, registry_json, test_url, TrustFixture, TEST_ROOT};
pub use keys::{TestKeyPair, TEST_KID};
pub use mock_fetcher::{MockFailure, MockFetcher};
pub use token::{TokenBuilder, DEFAULT_PAYLOAD};
