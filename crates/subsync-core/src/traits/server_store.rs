// # Server Store Trait
//
// Defines the interface for the shared server inventory.
//
// ## Purpose
//
// The inventory holds every proxy server known to the client, across all
// subscription groups. Subscriptions never edit it record by record: a
// successful sync replaces the whole group in one atomic step, so readers
// see either the previous version of a group or the new one, never both
// and never neither.
//
// ## Implementations
//
// - In-memory: `MemoryServerStore`
// - File-based: `FileServerStore` (JSON, atomic rename)
//
// ## Usage
//
// ```rust,ignore
// use subsync_core::{Server, ServerStore};
//
// let store = /* ServerStore implementation */;
// let count = store.replace_group("Provider A", vec![Server::new("a.example.com", 443)]).await?;
// let servers = store.group("Provider A").await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A proxy server record
///
/// Only `hostname` and `group` are interpreted by the sync core. Every other
/// field produced by the share-link parser is carried through untouched,
/// including unknown keys (kept in `extra`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Server address; may be rewritten to an IP by forced resolution
    pub hostname: String,

    /// Subscription group label (the subscription's remark)
    #[serde(default)]
    pub group: String,

    /// Display name
    #[serde(default)]
    pub remark: String,

    /// Server port
    #[serde(default)]
    pub port: u16,

    /// Proxy protocol (e.g. "ss", "vmess", "trojan")
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Protocol-specific fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Server {
    /// Create a server with the given address and no group
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            group: String::new(),
            remark: String::new(),
            port,
            kind: String::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Set the display name
    pub fn with_remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = remark.into();
        self
    }

    /// Set the group label
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Set the proxy protocol
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// Trait for server inventory implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Atomicity
///
/// [`ServerStore::replace_group`] is the only mutation. It must hold a single
/// exclusive critical section across removing the group's old servers and
/// appending the new ones, so that:
/// - no reader observes the group with its old entries removed but the new
///   ones not yet added;
/// - two concurrent replaces (for the same or different groups) cannot
///   interleave their remove/append pairs.
///
/// Persistent implementations write through inside that same section.
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Replace every server of `group` with `servers`
    ///
    /// Servers of other groups are untouched. `servers` should already carry
    /// `group` as their group label.
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of servers now stored for the group
    /// - `Err(Error)`: Storage error (the inventory is left unchanged)
    async fn replace_group(&self, group: &str, servers: Vec<Server>)
    -> Result<usize, crate::Error>;

    /// Snapshot of the whole inventory, in insertion order
    async fn servers(&self) -> Result<Vec<Server>, crate::Error>;

    /// Snapshot of one group's servers
    async fn group(&self, group: &str) -> Result<Vec<Server>, crate::Error>;

    /// Distinct group labels present in the inventory
    async fn groups(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
