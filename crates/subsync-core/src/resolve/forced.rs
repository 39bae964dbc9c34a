//! Forced hostname resolution
//!
//! Rewrites server hostnames to IP addresses obtained through a
//! [`ResolverBackend`], so the client never asks the (possibly poisoned)
//! local DNS for them.
//!
//! ## Flow
//!
//! 1. Upstream proxy blank → one user-facing hint, nothing else
//! 2. Collect distinct hostnames ([`distinct_hostnames`])
//! 3. One backend call for the whole batch
//! 4. Rewrite every server whose hostname resolved to a non-blank IP
//!
//! Backend failures are soft: they are logged and the servers are left as
//! they were.

use super::batch::distinct_hostnames;
use crate::traits::{Notifier, ResolverBackend, Server, Severity};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hint shown when forced resolution is on but no upstream proxy is set
pub const MISSING_UPSTREAM_PROXY: &str =
    "Please set the upstream proxy used by the update subscription first.";

/// Rewrites server hostnames using a trusted resolver backend
#[derive(Clone)]
pub struct ForcedDnsResolver {
    /// Batched lookup transport
    backend: Arc<dyn ResolverBackend>,

    /// User-facing message sink (configuration hints)
    notifier: Arc<dyn Notifier>,

    /// Proxy the lookups are routed through
    upstream_proxy: Option<String>,
}

impl ForcedDnsResolver {
    /// Create a forced resolver
    ///
    /// A blank or missing `upstream_proxy` is accepted here and reported on
    /// each [`resolve`](Self::resolve) call instead.
    pub fn new(
        backend: Arc<dyn ResolverBackend>,
        notifier: Arc<dyn Notifier>,
        upstream_proxy: Option<String>,
    ) -> Self {
        Self {
            backend,
            notifier,
            upstream_proxy,
        }
    }

    /// The configured upstream proxy, if it is not blank
    pub fn upstream_proxy(&self) -> Option<&str> {
        self.upstream_proxy
            .as_deref()
            .map(str::trim)
            .filter(|proxy| !proxy.is_empty())
    }

    /// Resolve and rewrite hostnames in place
    ///
    /// # Returns
    ///
    /// The number of servers whose hostname was rewritten.
    pub async fn resolve(&self, servers: &mut [Server]) -> usize {
        let Some(proxy) = self.upstream_proxy() else {
            warn!("Forced resolution enabled without an upstream proxy, skipping");
            self.notifier.notify(MISSING_UPSTREAM_PROXY, Severity::Info);
            return 0;
        };

        let hostnames = distinct_hostnames(servers);
        if hostnames.is_empty() {
            return 0;
        }

        // Every distinct hostname gets a slot; unresolved ones stay blank.
        let mut resolved: HashMap<String, String> = hostnames
            .iter()
            .map(|hostname| (hostname.clone(), String::new()))
            .collect();

        match self.backend.resolve(proxy, &hostnames).await {
            Ok(answers) => {
                for (hostname, ip) in answers {
                    match resolved.get_mut(&hostname) {
                        Some(slot) => *slot = ip,
                        None => debug!("Ignoring unrequested answer for {}", hostname),
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Resolver backend {} failed, keeping original hostnames: {}",
                    self.backend.backend_name(),
                    e
                );
                return 0;
            }
        }

        let mut rewritten = 0;
        for server in servers.iter_mut() {
            if let Some(ip) = resolved.get(&server.hostname)
                && !ip.trim().is_empty()
            {
                server.hostname = ip.clone();
                rewritten += 1;
            }
        }

        debug!(
            "Forced resolution: {} of {} hostname(s) resolved, {} server(s) rewritten",
            resolved.values().filter(|ip| !ip.trim().is_empty()).count(),
            resolved.len(),
            rewritten
        );
        rewritten
    }
}
