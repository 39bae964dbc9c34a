// # HTTP Fetcher Trait
//
// Defines the interface for downloading subscription payloads.
//
// ## Implementations
//
// - reqwest-based: `subsync-fetch-http` crate
//
// ## Usage
//
// ```rust,ignore
// use subsync_core::traits::{FetchRequest, HttpFetcher};
//
// let fetcher = /* HttpFetcher implementation */;
// let response = fetcher
//     .fetch(&FetchRequest::new("https://sub.example.com/link").with_user_agent("clash"))
//     .await?;
// if response.is_ok() {
//     println!("{}", response.body);
// }
// ```

use async_trait::async_trait;

/// A single GET request for a subscription payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Subscription link
    pub url: String,
    /// Custom `User-Agent` header value
    pub user_agent: Option<String>,
    /// Forwarding proxy for this request (e.g. "http://127.0.0.1:7890")
    pub proxy: Option<String>,
}

impl FetchRequest {
    /// Create a request with no user agent and no proxy
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: None,
            proxy: None,
        }
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the forwarding proxy
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body decoded as text
    pub body: String,
}

impl FetchResponse {
    /// Whether the status is exactly 200 OK
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Trait for HTTP transport implementations
///
/// Implementations perform exactly one request per call. Non-OK statuses are
/// *not* errors at this layer: they are returned as a [`FetchResponse`] and
/// the fetch task decides what to do with them. Only transport failures
/// (DNS, connect, proxy, body decoding) are returned as `Err`.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Perform a GET request
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, crate::Error>;

    /// Get the fetcher name (for logging/debugging)
    fn fetcher_name(&self) -> &'static str;
}
