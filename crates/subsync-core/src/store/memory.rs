// # Memory Server Store
//
// In-memory implementation of ServerStore.
//
// ## Purpose
//
// Provides a simple, fast inventory that doesn't persist across restarts.
// Useful for testing and for embedders that persist the inventory
// themselves (e.g. as part of a settings file).
//
// ## Crash Behavior
//
// - The inventory is lost on restart/crash
// - The first sync after a restart repopulates every enabled group

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::server_store::{Server, ServerStore};

/// In-memory server inventory
///
/// Servers are kept in a single `Vec` behind a `RwLock`. A group replace
/// takes the write guard once for both the removal and the append.
///
/// # Example
///
/// ```rust,no_run
/// use subsync_core::store::MemoryServerStore;
/// use subsync_core::traits::{Server, ServerStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryServerStore::new();
///
///     store
///         .replace_group("Provider A", vec![Server::new("a.example.com", 443).with_group("Provider A")])
///         .await?;
///
///     assert_eq!(store.group("Provider A").await?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryServerStore {
    inner: Arc<RwLock<Vec<Server>>>,
}

impl MemoryServerStore {
    /// Create a new empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inventory pre-populated with `servers`
    pub fn with_servers(servers: Vec<Server>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(servers)),
        }
    }

    /// Get the number of servers in the inventory
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the inventory is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Remove `group` from `servers` and append `replacement`
///
/// Shared by the store implementations; callers hold the write guard.
pub(crate) fn replace_in_place(servers: &mut Vec<Server>, group: &str, replacement: Vec<Server>) -> usize {
    servers.retain(|server| server.group != group);
    let count = replacement.len();
    servers.extend(replacement);
    count
}

pub(crate) fn group_labels(servers: &[Server]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for server in servers {
        if !labels.contains(&server.group) {
            labels.push(server.group.clone());
        }
    }
    labels
}

#[async_trait]
impl ServerStore for MemoryServerStore {
    async fn replace_group(&self, group: &str, servers: Vec<Server>) -> Result<usize, Error> {
        let mut guard = self.inner.write().await;
        Ok(replace_in_place(&mut guard, group, servers))
    }

    async fn servers(&self) -> Result<Vec<Server>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn group(&self, group: &str) -> Result<Vec<Server>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.iter().filter(|s| s.group == group).cloned().collect())
    }

    async fn groups(&self) -> Result<Vec<String>, Error> {
        Ok(group_labels(&self.inner.read().await))
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing to persist
        Ok(())
    }
}
