//! HTTP fetching for registries and key sets.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::FetcherConfig;
use crate::error::{FetchError, RegistryError};

/// A response to a GET request, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Fails with [`FetchError::Status`] unless the status is 2xx.
    ///
    /// # Errors
    ///
    /// Returns an error carrying `url` and the status for non-2xx responses.
    pub fn error_for_status(self, url: &str) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Performs HTTP GET requests.
///
/// Implementations return `Ok` for every response that arrives, including
/// non-2xx ones, and `Err` only for transport failures.
#[async_trait]
pub trait HttpFetcher: Send + Sync + std::fmt::Debug {
    /// Fetches `url`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Timeout`] or [`FetchError::Network`] when no
    /// response is received, and [`FetchError::BodyTooLarge`] for oversized
    /// bodies.
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError>;
}

/// [`HttpFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http: reqwest::Client,
    max_body_bytes: u64,
}

impl ReqwestFetcher {
    /// Creates a fetcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use trusted_jws_registry::{FetcherConfig, ReqwestFetcher};
    ///
    /// let fetcher = ReqwestFetcher::new(FetcherConfig::default())?;
    /// # Ok::<(), trusted_jws_registry::RegistryError>(())
    /// ```
    pub fn new(config: FetcherConfig) -> Result<Self, RegistryError> {
        let http = Self::build_http_client(&config)?;
        Ok(Self {
            http,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Builds the HTTP client with proper configuration.
    fn build_http_client(config: &FetcherConfig) -> Result<reqwest::Client, RegistryError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent);

        if let Some(ref tls) = config.tls {
            if tls.insecure_skip_verify {
                tracing::warn!("TLS certificate verification disabled for registry fetches");
                builder = builder.danger_accept_invalid_certs(true);
            }

            if let Some(ref ca_cert) = tls.ca_cert {
                let cert_pem = std::fs::read(ca_cert).map_err(|e| RegistryError::IoError {
                    path: ca_cert.clone(),
                    source: e,
                })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| {
                    RegistryError::InvalidCertificate {
                        message: format!("{}: {e}", ca_cert.display()),
                    }
                })?;
                builder = builder.add_root_certificate(cert);
            }
        }

        builder
            .build()
            .map_err(|source| RegistryError::ClientBuild { source })
    }

    fn too_large(&self, url: &str) -> FetchError {
        FetchError::BodyTooLarge {
            url: url.to_string(),
            limit: self.max_body_bytes,
        }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let mut response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, timeout, &e))?;

        let status = response.status().as_u16();
        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_bytes)
        {
            return Err(self.too_large(url));
        }

        // Chunked responses carry no length up front.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url, timeout, &e))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponse::new(status, body))
    }
}
