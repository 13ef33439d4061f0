//! Error types for registry operations.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a single HTTP fetch failed.
///
/// Transport failures ([`FetchError::Timeout`], [`FetchError::Network`]) are
/// kept apart from application-level failures (status, body). When raised
/// while resolving a registry, the error is logged as a warning and the
/// registry simply contributes no trust.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within its timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The request failed before a response was received.
    #[error("network error fetching {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body was not what was expected.
    #[error("malformed response from {url}: {message}")]
    Malformed {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The response body exceeded the configured limit.
    #[error("response from {url} exceeds {limit} bytes")]
    BodyTooLarge {
        /// Requested URL.
        url: String,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// A recent failure for this URL is still cached.
    #[error("{url} failed recently; not refetching until its negative cache entry expires")]
    Suppressed {
        /// Requested URL.
        url: String,
    },
}

impl FetchError {
    /// Returns the URL the failed request targeted.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Network { url, .. }
            | Self::Status { url, .. }
            | Self::Malformed { url, .. }
            | Self::BodyTooLarge { url, .. }
            | Self::Suppressed { url } => url,
        }
    }

    /// Returns true for transport-level failures (timeout or network).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network { .. })
    }

    /// Maps a `reqwest` error for `url`, keeping timeouts distinct.
    pub(crate) fn from_reqwest(url: &str, timeout: Duration, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Errors that can occur while setting up a registry fetcher.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {source}")]
    ClientBuild {
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// A certificate could not be loaded.
    #[error("Invalid certificate: {message}")]
    InvalidCertificate {
        /// Error message.
        message: String,
    },

    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    IoError {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid registry URL.
    #[error("Invalid registry URL '{url}': {message}")]
    InvalidUrl {
        /// URL string.
        url: String,
        /// Why the URL was rejected.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_timeout() {
        let err = FetchError::Timeout {
            url: "https://x/list.json".to_string(),
            timeout: Duration::from_millis(1000),
        };
        assert_eq!(
            err.to_string(),
            "request to https://x/list.json timed out after 1s"
        );
        assert!(err.is_transport());
    }

    #[test]
    fn test_error_display_status() {
        let err = FetchError::Status {
            url: "https://x/list.json".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "HTTP 503 from https://x/list.json");
        assert!(!err.is_transport());
        assert_eq!(err.url(), "https://x/list.json");
    }

    #[test]
    fn test_error_display_invalid_url() {
        let err = RegistryError::InvalidUrl {
            url: "not a url".to_string(),
            message: "relative URL without a base".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid registry URL 'not a url': relative URL without a base"
        );
    }
}
