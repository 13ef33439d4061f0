//! Scripted [`HttpFetcher`] for tests that should not touch the network.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use trusted_jws_registry::{FetchError, HttpFetcher, HttpResponse};

/// Transport failure a route can simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Report a timeout immediately.
    Timeout,
    /// Report a refused connection.
    Network,
}

#[derive(Debug, Clone)]
enum Route {
    Respond {
        response: HttpResponse,
        delay: Option<Duration>,
    },
    Fail(MockFailure),
}

/// An [`HttpFetcher`] that answers from a table of routes and counts calls.
///
/// Unknown URLs fail with [`FetchError::Network`]. Routes can be changed
/// between calls through a shared reference.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use serde_json::json;
/// use trusted_jws_registry::HttpFetcher;
/// use trusted_jws_test::MockFetcher;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let fetcher = MockFetcher::new();
/// fetcher.respond_json("https://x/list.json", &json!(["https://x/trusted"]));
///
/// let response = fetcher.get("https://x/list.json", Duration::from_secs(1)).await.unwrap();
/// assert_eq!(response.status, 200);
/// assert_eq!(fetcher.calls("https://x/list.json"), 1);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockFetcher {
    routes: RwLock<HashMap<String, Route>>,
    calls: RwLock<HashMap<String, usize>>,
}

impl MockFetcher {
    /// Creates a fetcher with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `url` with `status` and `body`.
    pub fn respond(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> &Self {
        self.route(
            url,
            Route::Respond {
                response: HttpResponse::new(status, body),
                delay: None,
            },
        )
    }

    /// Answers `url` with `200` and `body` serialized as JSON.
    pub fn respond_json(&self, url: &str, body: &Value) -> &Self {
        self.respond(url, 200, body.to_string())
    }

    /// Answers `url` with `200` and a JSON body after `delay`.
    pub fn respond_json_after(&self, url: &str, delay: Duration, body: &Value) -> &Self {
        self.route(
            url,
            Route::Respond {
                response: HttpResponse::new(200, body.to_string()),
                delay: Some(delay),
            },
        )
    }

    /// Makes requests to `url` fail with `failure`.
    pub fn fail(&self, url: &str, failure: MockFailure) -> &Self {
        self.route(url, Route::Fail(failure))
    }

    /// Returns how many times `url` was requested.
    #[must_use]
    pub fn calls(&self, url: &str) -> usize {
        self.calls.read().get(url).copied().unwrap_or(0)
    }

    /// Returns the total number of requests made.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.read().values().sum()
    }

    fn route(&self, url: &str, route: Route) -> &Self {
        self.routes.write().insert(url.to_string(), route);
        self
    }
}

#[async_trait]
impl HttpFetcher for MockFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError> {
        *self.calls.write().entry(url.to_string()).or_insert(0) += 1;
        let route = self.routes.read().get(url).cloned();

        match route {
            Some(Route::Respond { response, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(response)
            }
            Some(Route::Fail(MockFailure::Timeout)) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout,
            }),
            Some(Route::Fail(MockFailure::Network)) | None => Err(FetchError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}
