// # Resolver Backend Trait
//
// Defines the interface for trusted, batched hostname resolution.
//
// ## Purpose
//
// Forced resolution rewrites server hostnames to IP addresses obtained
// through a path the local network cannot tamper with (DNS-over-HTTPS routed
// through an upstream proxy). The transport for that lookup is pluggable.
//
// ## Implementations
//
// - External process: `subsync-resolver-process` crate
//
// ## Usage
//
// ```rust,ignore
// use std::collections::BTreeSet;
// use subsync_core::ResolverBackend;
//
// let backend = /* ResolverBackend implementation */;
// let hostnames: BTreeSet<String> = ["example.com".to_string()].into();
// let answers = backend.resolve("socks5://127.0.0.1:1080", &hostnames).await?;
// ```

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};

/// Trait for batched A-record resolution
///
/// # Batching
///
/// One call covers the whole hostname set of a sync. Implementations must
/// not fan out into one round trip per hostname when the transport allows
/// batching.
///
/// # Partial Results
///
/// Per-hostname misses are not errors: a hostname that could not be
/// resolved is simply absent from the returned map. `Err` is reserved for
/// failures of the whole batch (transport unavailable, undecodable output).
/// Callers treat `Err` as "no answers".
///
/// # Cancellation
///
/// Dropping the returned future must release any resources held by the
/// lookup (child processes, sockets).
#[async_trait]
pub trait ResolverBackend: Send + Sync {
    /// Resolve a batch of hostnames through `upstream_proxy`
    ///
    /// # Parameters
    ///
    /// - `upstream_proxy`: Proxy address, already validated as non-blank
    /// - `hostnames`: Non-empty set of distinct hostnames
    ///
    /// # Returns
    ///
    /// - `Ok(HashMap)`: hostname → resolved IP, for resolved hostnames only
    /// - `Err(Error::Resolver)`: the batch as a whole failed
    async fn resolve(
        &self,
        upstream_proxy: &str,
        hostnames: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>, crate::Error>;

    /// Get the backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}
