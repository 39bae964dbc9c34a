// # File Server Store
//
// File-based implementation of ServerStore with crash recovery.
//
// ## Purpose
//
// Keeps the server inventory across daemon restarts, so a failing
// subscription keeps serving its last good servers after a restart.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good inventory
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "saved_at": "2025-01-09T12:00:00Z",
//   "servers": [
//     { "hostname": "1.2.3.4", "group": "Provider A", "remark": "HK 1", "port": 443, "type": "trojan" }
//   ]
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::memory::{group_labels, replace_in_place};
use crate::Error;
use crate::traits::server_store::{Server, ServerStore};

/// Inventory file format version
const INVENTORY_FILE_VERSION: &str = "1.0";

/// File-based server inventory with crash recovery
///
/// Every [`ServerStore::replace_group`] is written through to disk while the
/// write lock is held. If the write fails, the in-memory inventory is left
/// unchanged and the replace returns an error.
///
/// # Example
///
/// ```rust,no_run
/// use subsync_core::store::FileServerStore;
/// use subsync_core::traits::{Server, ServerStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileServerStore::new("/var/lib/subsync/servers.json").await?;
///
///     store
///         .replace_group("Provider A", vec![Server::new("a.example.com", 443).with_group("Provider A")])
///         .await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileServerStore {
    path: PathBuf,
    servers: Arc<RwLock<Vec<Server>>>,
}

/// Serializable inventory file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct InventoryFileFormat {
    version: String,
    saved_at: chrono::DateTime<chrono::Utc>,
    servers: Vec<Server>,
}

/// Why an inventory file could not be loaded
enum LoadFailure {
    /// The file exists but could not be read
    Unreadable(Error),
    /// The file was read but is not a valid inventory
    Corrupt(Error),
}

impl FileServerStore {
    /// Create or load a file server store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing inventory file
    /// 3. If corruption detected, try to load from backup
    /// 4. If both fail, start with an empty inventory
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create inventory directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let servers = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            servers: Arc::new(RwLock::new(servers)),
        })
    }

    /// Path of the inventory file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the inventory with automatic recovery
    async fn load_with_recovery(path: &Path) -> Result<Vec<Server>, Error> {
        let error = match Self::load(path).await {
            Ok(servers) => {
                tracing::debug!("Loaded inventory from file: {} servers", servers.len());
                return Ok(servers);
            }
            Err(LoadFailure::Unreadable(e)) => return Err(e),
            Err(LoadFailure::Corrupt(e)) => e,
        };

        tracing::warn!(
            "Inventory file appears corrupted: {}. Attempting recovery from backup.",
            error
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with an empty inventory.");
            return Ok(Vec::new());
        }

        match Self::load(&backup_path).await {
            Ok(servers) => {
                tracing::info!("Recovered inventory from backup: {} servers", servers.len());
                if let Err(e) = fs::copy(&backup_path, path).await {
                    tracing::error!("Failed to restore inventory file from backup: {}", e);
                }
                Ok(servers)
            }
            Err(LoadFailure::Unreadable(e)) | Err(LoadFailure::Corrupt(e)) => {
                tracing::error!("Backup also unusable: {}. Starting with an empty inventory.", e);
                Ok(Vec::new())
            }
        }
    }

    /// Load the inventory from a file
    async fn load(path: &Path) -> Result<Vec<Server>, LoadFailure> {
        if !path.exists() {
            tracing::debug!("Inventory file does not exist: {}", path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadFailure::Unreadable(Error::store(format!(
                "Failed to read inventory file {}: {}",
                path.display(),
                e
            )))
        })?;

        let file: InventoryFileFormat = serde_json::from_str(&content).map_err(|e| {
            LoadFailure::Corrupt(Error::store(format!(
                "Failed to parse inventory file {}: {}",
                path.display(),
                e
            )))
        })?;

        if file.version != INVENTORY_FILE_VERSION {
            tracing::warn!(
                "Inventory file version mismatch: expected {}, got {}. Attempting to load anyway.",
                INVENTORY_FILE_VERSION,
                file.version
            );
        }

        Ok(file.servers)
    }

    /// Write `servers` to the inventory file atomically
    async fn write(&self, servers: &[Server]) -> Result<(), Error> {
        let file = InventoryFileFormat {
            version: INVENTORY_FILE_VERSION.to_string(),
            saved_at: chrono::Utc::now(),
            servers: servers.to_vec(),
        };

        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::store(format!("Failed to serialize inventory: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            temp.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            temp.flush().await.map_err(|e| {
                Error::store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create inventory backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Inventory written to file: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl ServerStore for FileServerStore {
    async fn replace_group(&self, group: &str, servers: Vec<Server>) -> Result<usize, Error> {
        let mut guard = self.servers.write().await;

        let mut next = guard.clone();
        let count = replace_in_place(&mut next, group, servers);

        // Commit in memory only once the file is durable
        self.write(&next).await?;
        *guard = next;

        Ok(count)
    }

    async fn servers(&self) -> Result<Vec<Server>, Error> {
        Ok(self.servers.read().await.clone())
    }

    async fn group(&self, group: &str) -> Result<Vec<Server>, Error> {
        let guard = self.servers.read().await;
        Ok(guard.iter().filter(|s| s.group == group).cloned().collect())
    }

    async fn groups(&self) -> Result<Vec<String>, Error> {
        Ok(group_labels(&self.servers.read().await))
    }

    async fn flush(&self) -> Result<(), Error> {
        // Exclusive guard: writers share one temp file
        let guard = self.servers.write().await;
        self.write(&guard).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tagged(hostname: &str, group: &str) -> Server {
        Server::new(hostname, 443).with_group(group)
    }

    #[tokio::test]
    async fn test_file_store_persists_groups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers.json");

        let store = FileServerStore::new(&path).await.unwrap();
        assert!(store.servers().await.unwrap().is_empty());

        store
            .replace_group("A", vec![tagged("a1.test", "A"), tagged("a2.test", "A")])
            .await
            .unwrap();
        store.replace_group("B", vec![tagged("b1.test", "B")]).await.unwrap();

        assert!(path.exists());

        let reloaded = FileServerStore::new(&path).await.unwrap();
        assert_eq!(reloaded.group("A").await.unwrap().len(), 2);
        assert_eq!(reloaded.groups().await.unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers.json");

        let store = FileServerStore::new(&path).await.unwrap();
        store.replace_group("A", vec![tagged("first.test", "A")]).await.unwrap();
        // Second write moves the first version into the backup
        store.replace_group("A", vec![tagged("second.test", "A")]).await.unwrap();

        let backup_path = FileServerStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let recovered = FileServerStore::new(&path).await.unwrap();
        let servers = recovered.group("A").await.unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(
            servers[0].hostname, "first.test",
            "Backup should contain the previous inventory, not the latest"
        );
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join("servers.json");

        let store = FileServerStore::new(&path).await.unwrap();
        tokio_test::assert_ok!(store.flush().await);

        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_inventory_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers.json");

        let store = FileServerStore::new(&path).await.unwrap();
        store.replace_group("A", vec![tagged("kept.test", "A")]).await.unwrap();

        // Removing the directory makes the temp-file write fail
        drop(dir);

        assert!(store.replace_group("A", vec![tagged("lost.test", "A")]).await.is_err());
        assert_eq!(store.group("A").await.unwrap()[0].hostname, "kept.test");
    }
}
