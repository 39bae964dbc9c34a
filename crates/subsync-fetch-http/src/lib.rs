// # HTTP Subscription Fetcher
//
// This crate provides the reqwest-backed HttpFetcher used by subsync.
//
// ## Behavior
//
// - One GET per request, 30 second timeout
// - Custom `User-Agent` header when the subscription sets one
// - Optional forwarding proxy for all schemes (`reqwest::Proxy::all`)
// - Any status is returned to the caller; only transport failures are errors
//
// Clients are cached: one direct client, plus one per distinct proxy URL,
// so connection pools are reused across sync cycles.

use subsync_core::traits::{FetchRequest, FetchResponse, HttpFetcher};
use subsync_core::{Error, Result};

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::USER_AGENT;
use tokio::sync::Mutex;
use tracing::debug;

/// Default HTTP timeout for subscription requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest-based HttpFetcher
pub struct ReqwestFetcher {
    /// Client for requests without a forwarding proxy
    direct: reqwest::Client,

    /// Clients keyed by proxy URL
    proxied: Mutex<HashMap<String, reqwest::Client>>,

    /// Per-request timeout
    timeout: Duration,
}

impl ReqwestFetcher {
    /// Create a fetcher with the default 30 second timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a fetcher with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            direct: build_client(timeout, None)?,
            proxied: Mutex::new(HashMap::new()),
            timeout,
        })
    }

    /// Client for `proxy`, built on first use
    async fn client_for(&self, proxy: Option<&str>) -> Result<reqwest::Client> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };

        let mut clients = self.proxied.lock().await;
        if let Some(client) = clients.get(proxy) {
            return Ok(client.clone());
        }

        debug!("Building HTTP client for proxy {}", proxy);
        let client = build_client(self.timeout, Some(proxy))?;
        clients.insert(proxy.to_string(), client.clone());
        Ok(client)
    }
}

/// Build a client, optionally routing every scheme through `proxy`
///
/// The direct client ignores proxy environment variables: a request without
/// a forwarding proxy goes straight to the subscription host.
fn build_client(timeout: Duration, proxy: Option<&str>) -> Result<reqwest::Client> {
    let builder = reqwest::Client::builder().timeout(timeout);

    let builder = match proxy {
        Some(url) => {
            let proxy = reqwest::Proxy::all(url)
                .map_err(|e| Error::http(format!("Invalid proxy '{}': {}", url, e)))?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    builder
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait::async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let client = self.client_for(request.proxy.as_deref()).await?;

        let mut builder = client.get(&request.url);
        if let Some(user_agent) = request.user_agent.as_deref() {
            builder = builder.header(USER_AGENT, user_agent);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        debug!("GET {} -> {} ({} bytes)", request.url, status, body.len());

        Ok(FetchResponse { status, body })
    }

    fn fetcher_name(&self) -> &'static str {
        "reqwest"
    }
}
