//! In-memory registry cache.
//!
//! Maps a registry URI to the membership list fetched from it last. Entries
//! are replaced whole, never merged, and an entry older than the caller's
//! `max_age` is reported as absent. Concurrent writers to the same URI race
//! and the last write wins; the lock is never held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::clock::{Clock, SystemClock};

static SHARED: Lazy<Arc<RegistryCache>> = Lazy::new(|| Arc::new(RegistryCache::new()));

/// Body of a cached registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryBody {
    /// Key-location URLs listed by the registry.
    Members(Vec<String>),

    /// The last fetch failed; kept only while negative caching applies.
    Unavailable {
        /// How long the failure is remembered.
        ttl: Duration,
    },
}

/// A registry as last fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    uri: String,
    fetched_at: DateTime<Utc>,
    body: RegistryBody,
}

impl RegistryEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(uri: impl Into<String>, fetched_at: DateTime<Utc>, body: RegistryBody) -> Self {
        Self {
            uri: uri.into(),
            fetched_at,
            body,
        }
    }

    /// Returns the registry URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns when the registry was fetched.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Returns the cached body.
    #[must_use]
    pub const fn body(&self) -> &RegistryBody {
        &self.body
    }

    /// Returns the member list, or `None` for an unavailable registry.
    #[must_use]
    pub fn members(&self) -> Option<&[String]> {
        match &self.body {
            RegistryBody::Members(members) => Some(members),
            RegistryBody::Unavailable { .. } => None,
        }
    }

    /// Returns true if the registry lists `location`.
    #[must_use]
    pub fn contains(&self, location: &str) -> bool {
        self.members()
            .is_some_and(|members| members.iter().any(|m| m == location))
    }

    /// Returns true if the entry is younger than `max_age` at `now`.
    ///
    /// An unavailable entry is never fresher than its own ttl.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        let max_age = match &self.body {
            RegistryBody::Members(_) => max_age,
            RegistryBody::Unavailable { ttl } => max_age.min(*ttl),
        };
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        now.signed_duration_since(self.fetched_at) < max_age
    }
}

/// Shared cache of fetched registries.
#[derive(Debug)]
pub struct RegistryCache {
    entries: RwLock<HashMap<String, Arc<RegistryEntry>>>,
    clock: Arc<dyn Clock>,
}

impl Default for RegistryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryCache {
    /// Creates an empty cache using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache using `clock` for timestamps and freshness.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use trusted_jws_registry::{ManualClock, RegistryCache};
    ///
    /// let clock = Arc::new(ManualClock::new());
    /// let cache = RegistryCache::with_clock(clock.clone());
    ///
    /// cache.put("https://x/list.json", vec!["https://x/trusted".to_string()]);
    /// assert!(cache.get("https://x/list.json", Duration::from_secs(60)).is_some());
    ///
    /// clock.advance(Duration::from_secs(60));
    /// assert!(cache.get("https://x/list.json", Duration::from_secs(60)).is_none());
    /// ```
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Returns the process-wide cache instance.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Returns the clock the cache stamps entries with.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Returns the entry for `uri` if it is younger than `max_age`.
    ///
    /// Stale entries are left in place; the caller decides whether to refetch.
    #[must_use]
    pub fn get(&self, uri: &str, max_age: Duration) -> Option<Arc<RegistryEntry>> {
        let entry = self.entries.read().get(uri).cloned()?;

        if entry.is_fresh(self.clock.now(), max_age) {
            tracing::debug!(uri, "Registry cache hit");
            Some(entry)
        } else {
            tracing::debug!(uri, fetched_at = %entry.fetched_at, "Registry cache entry expired");
            None
        }
    }

    /// Stores the member list fetched from `uri`, replacing any prior entry.
    pub fn put(&self, uri: &str, members: Vec<String>) -> Arc<RegistryEntry> {
        self.insert(uri, RegistryBody::Members(members))
    }

    /// Records that fetching `uri` failed, remembered for at most `ttl`.
    pub fn put_unavailable(&self, uri: &str, ttl: Duration) -> Arc<RegistryEntry> {
        self.insert(uri, RegistryBody::Unavailable { ttl })
    }

    /// Removes the entry for `uri`.
    pub fn invalidate(&self, uri: &str) {
        self.entries.write().remove(uri);
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
        tracing::info!("Registry cache cleared");
    }

    /// Returns the number of entries, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn insert(&self, uri: &str, body: RegistryBody) -> Arc<RegistryEntry> {
        let entry = Arc::new(RegistryEntry::new(uri, self.clock.now(), body));
        self.entries
            .write()
            .insert(uri.to_string(), Arc::clone(&entry));
        entry
    }
}
