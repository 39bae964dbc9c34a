//! Single-subscription fetch pipeline
//!
//! One run of [`SubscriptionFetcher::fetch`] covers one subscription:
//!
//! ```text
//! Subscription ──▶ HttpFetcher ──▶ ShareLinkParser ──▶ ForcedDnsResolver? ──▶ tag group
//! ```
//!
//! The pipeline never touches the server inventory: merging is the engine's
//! job, and only happens when the whole pipeline succeeded.

use crate::config::Subscription;
use crate::error::{Error, Result};
use crate::resolve::ForcedDnsResolver;
use crate::traits::{FetchRequest, HttpFetcher, Server, ShareLinkParser};
use std::sync::Arc;
use tracing::debug;

/// Result of a successful fetch pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The subscription is disabled; nothing was fetched
    Skipped,
    /// Servers ready to be merged, already tagged with the group label
    Fetched(Vec<Server>),
}

/// Fetches, parses, optionally resolves, and tags one subscription
#[derive(Clone)]
pub struct SubscriptionFetcher {
    /// HTTP transport
    http: Arc<dyn HttpFetcher>,

    /// Payload parser
    parser: Arc<dyn ShareLinkParser>,

    /// Present when forced resolution is enabled
    resolver: Option<ForcedDnsResolver>,
}

impl SubscriptionFetcher {
    /// Create a fetcher
    ///
    /// Pass `Some(resolver)` to enable forced resolution.
    pub fn new(
        http: Arc<dyn HttpFetcher>,
        parser: Arc<dyn ShareLinkParser>,
        resolver: Option<ForcedDnsResolver>,
    ) -> Self {
        Self {
            http,
            parser,
            resolver,
        }
    }

    /// Whether forced resolution runs on fetched servers
    pub fn forces_resolution(&self) -> bool {
        self.resolver.is_some()
    }

    /// Build the HTTP request for a subscription
    pub fn request_for(subscription: &Subscription, proxy: Option<&str>) -> FetchRequest {
        let mut request = FetchRequest::new(subscription.link.clone());

        if let Some(user_agent) = subscription.user_agent.as_deref()
            && !user_agent.is_empty()
        {
            request = request.with_user_agent(user_agent);
        }

        if let Some(proxy) = proxy
            && !proxy.is_empty()
        {
            request = request.with_proxy(proxy);
        }

        request
    }

    /// Run the pipeline for one subscription
    ///
    /// # Parameters
    ///
    /// - `subscription`: The subscription to fetch
    /// - `proxy`: Optional forwarding proxy for the HTTP request
    ///
    /// # Returns
    ///
    /// - `Ok(FetchOutcome::Skipped)`: Subscription disabled
    /// - `Ok(FetchOutcome::Fetched(servers))`: Servers tagged with the remark
    /// - `Err(Error::Http | Error::Fetch | Error::Parse)`: Pipeline failed
    pub async fn fetch(&self, subscription: &Subscription, proxy: Option<&str>) -> Result<FetchOutcome> {
        if !subscription.enable {
            debug!("Subscription {} is disabled, skipping", subscription.remark);
            return Ok(FetchOutcome::Skipped);
        }

        let request = Self::request_for(subscription, proxy);
        let response = self.http.fetch(&request).await?;

        if !response.is_ok() {
            return Err(Error::fetch(subscription.remark.clone(), response.status));
        }

        let mut servers = self.parser.parse(&response.body)?;
        debug!(
            "Parsed {} server(s) from {} with {} parser",
            servers.len(),
            subscription.remark,
            self.parser.parser_name()
        );

        if let Some(resolver) = &self.resolver {
            resolver.resolve(&mut servers).await;
        }

        for server in &mut servers {
            server.group = subscription.remark.clone();
        }

        Ok(FetchOutcome::Fetched(servers))
    }
}
