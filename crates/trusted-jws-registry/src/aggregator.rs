//! Resolution of the full registry set for one verification.
//!
//! Every configured URI is served from the cache when fresh and fetched
//! otherwise. Fetches run concurrently and independently: a registry that
//! times out or returns garbage is logged and reported as
//! [`ResolvedRegistry::Failed`], and the others are unaffected.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;

use crate::cache::{RegistryBody, RegistryCache, RegistryEntry};
use crate::error::FetchError;
use crate::fetcher::HttpFetcher;

/// A registry that could not be used for this verification.
#[derive(Debug)]
pub struct RegistryFetchWarning {
    /// Registry URI.
    pub uri: String,
    /// Why the registry is unavailable.
    pub error: FetchError,
}

impl std::fmt::Display for RegistryFetchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "registry {} unavailable: {}", self.uri, self.error)
    }
}

/// Outcome of resolving one registry URI.
#[derive(Debug)]
pub enum ResolvedRegistry {
    /// The registry's member list, from cache or freshly fetched.
    Available(Arc<RegistryEntry>),
    /// The registry contributes no trust this time.
    Failed(RegistryFetchWarning),
}

impl ResolvedRegistry {
    /// Returns the registry URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        match self {
            Self::Available(entry) => entry.uri(),
            Self::Failed(warning) => &warning.uri,
        }
    }

    /// Returns the entry if the registry is available.
    #[must_use]
    pub fn entry(&self) -> Option<&RegistryEntry> {
        match self {
            Self::Available(entry) => Some(entry),
            Self::Failed(_) => None,
        }
    }

    /// Returns true if the registry is available.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Resolves registry URIs through a shared [`RegistryCache`].
#[derive(Debug, Clone)]
pub struct RegistryAggregator {
    fetcher: Arc<dyn HttpFetcher>,
    cache: Arc<RegistryCache>,
    negative_ttl: Option<Duration>,
}

impl RegistryAggregator {
    /// Creates an aggregator that fetches with `fetcher` and caches in `cache`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn HttpFetcher>, cache: Arc<RegistryCache>) -> Self {
        Self {
            fetcher,
            cache,
            negative_ttl: None,
        }
    }

    /// Remembers failed fetches for `ttl` instead of retrying on every call.
    ///
    /// Off by default: a failing registry is refetched on each resolution.
    /// Failures recorded in a shared cache by another aggregator are ignored
    /// unless this one enables negative caching too.
    #[must_use]
    pub const fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = Some(ttl);
        self
    }

    /// Returns the cache backing this aggregator.
    #[must_use]
    pub const fn cache(&self) -> &Arc<RegistryCache> {
        &self.cache
    }

    /// Returns the fetcher used for registry requests.
    #[must_use]
    pub const fn fetcher(&self) -> &Arc<dyn HttpFetcher> {
        &self.fetcher
    }

    /// Resolves every URI, returning one result per input in input order.
    ///
    /// Cached entries younger than `cache_time` are reused; everything else
    /// is fetched concurrently with a per-request `timeout`. Never fails as a
    /// whole.
    pub async fn resolve(
        &self,
        uris: &[String],
        timeout: Duration,
        cache_time: Duration,
    ) -> Vec<ResolvedRegistry> {
        join_all(
            uris.iter()
                .map(|uri| self.resolve_one(uri, timeout, cache_time)),
        )
        .await
    }

    async fn resolve_one(
        &self,
        uri: &str,
        timeout: Duration,
        cache_time: Duration,
    ) -> ResolvedRegistry {
        if let Some(entry) = self.cache.get(uri, cache_time) {
            match entry.body() {
                RegistryBody::Members(_) => return ResolvedRegistry::Available(entry),
                RegistryBody::Unavailable { .. } if self.suppresses(&entry, cache_time) => {
                    return ResolvedRegistry::Failed(RegistryFetchWarning {
                        uri: uri.to_string(),
                        error: FetchError::Suppressed {
                            url: uri.to_string(),
                        },
                    });
                }
                RegistryBody::Unavailable { .. } => {}
            }
        }

        match self.fetch_members(uri, timeout).await {
            Ok(members) => {
                tracing::info!(uri, members = members.len(), "Fetched trusted registry");
                ResolvedRegistry::Available(self.cache.put(uri, members))
            }
            Err(error) => {
                tracing::warn!(
                    uri,
                    error = %error,
                    "Registry fetch failed; it contributes no trust"
                );
                if let Some(ttl) = self.negative_ttl {
                    self.cache.put_unavailable(uri, ttl);
                }
                ResolvedRegistry::Failed(RegistryFetchWarning {
                    uri: uri.to_string(),
                    error,
                })
            }
        }
    }

    /// An unavailable entry only counts for aggregators that opted into
    /// negative caching, and then for no longer than their own ttl.
    fn suppresses(&self, entry: &RegistryEntry, cache_time: Duration) -> bool {
        self.negative_ttl
            .is_some_and(|ttl| entry.is_fresh(self.cache.clock().now(), cache_time.min(ttl)))
    }

    async fn fetch_members(&self, uri: &str, timeout: Duration) -> Result<Vec<String>, FetchError> {
        let response = tokio::time::timeout(timeout, self.fetcher.get(uri, timeout))
            .await
            .map_err(|_| FetchError::Timeout {
                url: uri.to_string(),
                timeout,
            })??
            .error_for_status(uri)?;

        parse_members(uri, &response.body)
    }
}

/// Parses a registry body: a JSON array of key-location strings.
///
/// Non-string members are skipped.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the body is not a JSON array.
///
/// # Examples
///
/// ```
/// use trusted_jws_registry::parse_members;
///
/// let members = parse_members("https://x/list.json", br#"["https://x/trusted", 7]"#)?;
/// assert_eq!(members, vec!["https://x/trusted".to_string()]);
///
/// assert!(parse_members("https://x/list.json", br#"{"keys": []}"#).is_err());
/// # Ok::<(), trusted_jws_registry::FetchError>(())
/// ```
pub fn parse_members(uri: &str, body: &[u8]) -> Result<Vec<String>, FetchError> {
    let malformed = |message: String| FetchError::Malformed {
        url: uri.to_string(),
        message,
    };

    let value: Value = serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(malformed("expected a JSON array of strings".to_string()));
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(location) => Some(location),
            other => {
                tracing::debug!(uri, member = %other, "Skipping non-string registry member");
                None
            }
        })
        .collect())
}
