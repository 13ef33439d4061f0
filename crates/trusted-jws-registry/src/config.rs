//! Configuration types for the registry fetcher.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::RegistryError;

/// Trusted list consulted on every verification unless overridden.
pub const DEFAULT_TRUSTED_LIST_URI: &str =
    "https://oada.github.io/oada-trusted-lists/client-registration.json";

/// Parses a registry or key-set URI, accepting only `http` and `https`.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidUrl`] if the URI does not parse or uses
/// another scheme.
///
/// # Examples
///
/// ```
/// use trusted_jws_registry::{parse_registry_uri, DEFAULT_TRUSTED_LIST_URI};
///
/// assert!(parse_registry_uri(DEFAULT_TRUSTED_LIST_URI).is_ok());
/// assert!(parse_registry_uri("file:///etc/passwd").is_err());
/// ```
pub fn parse_registry_uri(uri: &str) -> Result<Url, RegistryError> {
    let invalid = |message: String| RegistryError::InvalidUrl {
        url: uri.to_string(),
        message,
    };
    let parsed = Url::parse(uri).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(invalid(format!("unsupported scheme {scheme}"))),
    }
}

/// Configuration for [`crate::ReqwestFetcher`].
///
/// Per-request timeouts are passed with each fetch; this only covers the
/// settings of the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,

    /// Largest response body accepted, in bytes.
    pub max_body_bytes: u64,

    /// TLS configuration.
    pub tls: Option<TlsConfig>,

    /// User agent string.
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FetcherConfig {
    /// Creates a configuration with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use trusted_jws_registry::FetcherConfig;
    ///
    /// let config = FetcherConfig::new();
    /// assert_eq!(config.max_body_bytes, 512 * 1024);
    /// assert!(config.user_agent.starts_with("trusted-jws/"));
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            max_body_bytes: 512 * 1024,
            tls: None,
            user_agent: format!("trusted-jws/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the maximum accepted body size.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Sets the TLS configuration.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// TLS settings for registry and key-set fetches.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Additional CA certificate (PEM) to trust.
    pub ca_cert: Option<PathBuf>,

    /// Whether to skip certificate verification (NOT recommended for production).
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    /// Creates a TLS configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ca_cert: None,
            insecure_skip_verify: false,
        }
    }

    /// Sets the CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Enables insecure mode (skips certificate verification).
    ///
    /// # Warning
    ///
    /// This should only be used for testing. Never use in production.
    #[must_use]
    pub const fn insecure(mut self) -> Self {
        self.insecure_skip_verify = true;
        self
    }
}
