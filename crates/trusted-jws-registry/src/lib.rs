//! # Trusted JWS Registry
//!
//! Fetching and caching of trusted registries: remote JSON lists of
//! key-location URLs (`jku` values) whose signers are considered trusted.
//!
//! ## Features
//!
//! - **Shared cache**: [`RegistryCache`] keeps the last membership list per
//!   registry URI, with an injectable [`Clock`] for freshness checks
//! - **Concurrent resolution**: [`RegistryAggregator`] resolves every
//!   configured registry at once and degrades failed fetches to warnings
//! - **Pluggable transport**: [`HttpFetcher`] with a `reqwest`-backed
//!   [`ReqwestFetcher`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use trusted_jws_registry::{
//!     FetcherConfig, RegistryAggregator, RegistryCache, ReqwestFetcher,
//!     DEFAULT_TRUSTED_LIST_URI,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = Arc::new(ReqwestFetcher::new(FetcherConfig::default())?);
//!     let aggregator = RegistryAggregator::new(fetcher, RegistryCache::shared());
//!
//!     let registries = aggregator
//!         .resolve(
//!             &[DEFAULT_TRUSTED_LIST_URI.to_string()],
//!             Duration::from_millis(1000),
//!             Duration::from_secs(3600),
//!         )
//!         .await;
//!
//!     for registry in &registries {
//!         println!("{}: available = {}", registry.uri(), registry.is_available());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 RegistryAggregator                   │
//! │  ┌──────────────────┐      ┌──────────────────────┐  │
//! │  │  RegistryCache   │      │     HttpFetcher      │  │
//! │  │  (uri → entry)   │      │  (ReqwestFetcher)    │  │
//! │  └──────────────────┘      └──────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌──────────────────────────────────────────────────────┐
//! │        Trusted registries (JSON arrays of jku)       │
//! └──────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod aggregator;
mod cache;
mod clock;
mod config;
mod error;
mod fetcher;

pub use aggregator::{parse_members, RegistryAggregator, RegistryFetchWarning, ResolvedRegistry};
pub use cache::{RegistryBody, RegistryCache, RegistryEntry};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{parse_registry_uri, FetcherConfig, TlsConfig, DEFAULT_TRUSTED_LIST_URI};
pub use error::{FetchError, RegistryError};
pub use fetcher::{HttpFetcher, HttpResponse, ReqwestFetcher};
