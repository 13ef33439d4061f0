//! Per-call verification options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-fetch timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default registry cache lifetime in seconds.
pub const DEFAULT_CACHE_TIME_SECS: u64 = 3600;

/// Options for a single [`TrustedVerifier::verify`](crate::TrustedVerifier::verify) call.
///
/// Every field has a default, so partial documents deserialize.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use trusted_jws_verifier::VerificationOptions;
///
/// let options: VerificationOptions =
///     serde_json::from_str(r#"{"timeout_ms": 250}"#).unwrap();
/// assert_eq!(options.timeout(), Duration::from_millis(250));
/// assert_eq!(options.cache_time(), Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationOptions {
    /// Timeout for each registry or key-set fetch, in milliseconds.
    pub timeout_ms: u64,

    /// How long a fetched registry is reused, in seconds.
    pub cache_time_secs: u64,

    /// Registries consulted after the verifier's default registry.
    pub additional_registry_uris: Vec<String>,

    /// Reject input without a header segment instead of passing it through
    /// as an untrusted payload.
    pub strict_decoding: bool,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache_time_secs: DEFAULT_CACHE_TIME_SECS,
            additional_registry_uris: Vec::new(),
            strict_decoding: false,
        }
    }
}

impl VerificationOptions {
    /// Creates options with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads options from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `TRUSTED_JWS_TIMEOUT_MS` | Per-fetch timeout |
    /// | `TRUSTED_JWS_CACHE_TIME_SECS` | Registry cache lifetime |
    /// | `TRUSTED_JWS_ADDITIONAL_REGISTRIES` | Comma-separated registry URIs |
    /// | `TRUSTED_JWS_STRICT_DECODING` | `1` or `true` to reject headerless input |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`VerificationOptions::from_env`], reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            timeout_ms: lookup("TRUSTED_JWS_TIMEOUT_MS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.timeout_ms),
            cache_time_secs: lookup("TRUSTED_JWS_CACHE_TIME_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.cache_time_secs),
            additional_registry_uris: lookup("TRUSTED_JWS_ADDITIONAL_REGISTRIES")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|uri| !uri.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            strict_decoding: lookup("TRUSTED_JWS_STRICT_DECODING")
                .map(|v| v.trim() == "1" || v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.strict_decoding),
        }
    }

    /// Sets the per-fetch timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the registry cache lifetime.
    ///
    /// The lifetime is kept in whole seconds; a fractional part rounds up, so
    /// any non-zero duration keeps caching enabled.
    #[must_use]
    pub const fn with_cache_time(mut self, cache_time: Duration) -> Self {
        let secs = cache_time.as_secs();
        self.cache_time_secs = if cache_time.subsec_nanos() > 0 {
            secs.saturating_add(1)
        } else {
            secs
        };
        self
    }

    /// Adds a registry to consult after the default one.
    #[must_use]
    pub fn with_additional_registry(mut self, uri: impl Into<String>) -> Self {
        self.additional_registry_uris.push(uri.into());
        self
    }

    /// Sets whether headerless input is rejected.
    #[must_use]
    pub const fn with_strict_decoding(mut self, strict: bool) -> Self {
        self.strict_decoding = strict;
        self
    }

    /// Returns the per-fetch timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the registry cache lifetime.
    #[must_use]
    pub const fn cache_time(&self) -> Duration {
        Duration::from_secs(self.cache_time_secs)
    }
}
