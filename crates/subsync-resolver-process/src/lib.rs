// # External Process Resolver Backend
//
// This crate provides the ResolverBackend that performs forced resolution by
// running an external DNS-over-HTTPS helper (`http-tool`).
//
// ## Protocol
//
// - argv: `[upstream_proxy, url1,url2,...]`, one Google DoH URL per hostname;
//   hostnames that would break the URL or the list are skipped
// - stdin and stderr are discarded
// - stdout is empty (no answers) or codec text wrapping a JSON array of DoH
//   responses, see [`codec`] and [`answer`]
// - the exit status is not interpreted
//
// ## Failure Model
//
// A helper missing from PATH is only warned about at construction. Every
// failure (spawn error, timeout, undecodable output) surfaces as
// `Error::Resolver`. The caller treats that as "no answers": forced
// resolution never fails a subscription.
//
// ## Timeout
//
// None by default. With a timeout, the child is killed on expiry
// (`kill_on_drop`).

pub mod answer;
pub mod codec;

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use subsync_core::config::ResolverConfig;
use subsync_core::traits::ResolverBackend;
use subsync_core::{Error, Result};
use tokio::process::Command;
use tracing::{debug, warn};

/// Executable looked up on PATH when no path is configured
pub const DEFAULT_BINARY_NAME: &str = "http-tool";

/// DNS-over-HTTPS lookup URL for one hostname
pub fn lookup_url(hostname: &str) -> String {
    format!("https://dns.google/resolve?name={}&type=A", hostname)
}

/// Whether `hostname` can be placed in a lookup URL and the comma-joined argv
///
/// Names carrying separators (`,` `&` `?` `#` `=`), whitespace or other
/// punctuation would split or corrupt the query.
pub fn is_queryable(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// ResolverBackend that shells out to a DoH helper process
#[derive(Debug, Clone)]
pub struct ProcessResolverBackend {
    /// Helper executable
    binary_path: PathBuf,

    /// Upper bound on one invocation
    timeout: Option<Duration>,
}

impl ProcessResolverBackend {
    /// Create a backend for the executable at `binary_path`
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
            timeout: None,
        }
    }

    /// Bound each invocation; the child is killed when it runs over
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Locate `http-tool` on PATH
    pub fn from_path() -> Result<Self> {
        let binary_path = which::which(DEFAULT_BINARY_NAME).map_err(|e| {
            Error::config(format!(
                "Resolver executable '{}' not found on PATH: {}",
                DEFAULT_BINARY_NAME, e
            ))
        })?;
        Ok(Self::new(binary_path))
    }

    /// Build from configuration, falling back to PATH discovery
    ///
    /// A helper that cannot be found is not fatal: the backend keeps the bare
    /// executable name, every run then fails to start and forced resolution
    /// leaves hostnames unchanged.
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::from_config_or(config, Self::from_path)
    }

    fn from_config_or(config: &ResolverConfig, discover: impl FnOnce() -> Result<Self>) -> Self {
        let backend = match &config.path {
            Some(path) => Self::new(path),
            None => discover().unwrap_or_else(|e| {
                warn!("{}; hostnames will not be resolved", e);
                Self::new(DEFAULT_BINARY_NAME)
            }),
        };

        match config.timeout_secs {
            Some(secs) => backend.with_timeout(Duration::from_secs(secs)),
            None => backend,
        }
    }

    /// Helper executable path
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Run the helper once and capture its stdout
    async fn run(&self, upstream_proxy: &str, urls: &[String]) -> Result<String> {
        let mut command = Command::new(&self.binary_path);
        command
            .arg(upstream_proxy)
            .arg(urls.join(","))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            Error::resolver(format!(
                "Failed to start {}: {}",
                self.binary_path.display(),
                e
            ))
        })?;

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| Error::resolver(format!("Resolver timed out after {:?}", limit)))?,
            None => wait.await,
        }
        .map_err(|e| Error::resolver(format!("Failed to read resolver output: {}", e)))?;

        if !output.status.success() {
            debug!("Resolver exited with {}", output.status);
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::resolver(format!("Resolver output is not UTF-8: {}", e)))
    }
}

#[async_trait]
impl ResolverBackend for ProcessResolverBackend {
    async fn resolve(
        &self,
        upstream_proxy: &str,
        hostnames: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>> {
        let urls: Vec<String> = hostnames
            .iter()
            .filter(|h| {
                let usable = is_queryable(h);
                if !usable {
                    debug!("Skipping hostname '{}': not usable in a lookup URL", h);
                }
                usable
            })
            .map(|h| lookup_url(h))
            .collect();

        if urls.is_empty() {
            return Ok(HashMap::new());
        }

        debug!(
            "Resolving {} hostname(s) via {}",
            urls.len(),
            self.binary_path.display()
        );

        let stdout = self.run(upstream_proxy, &urls).await?;
        if stdout.trim().is_empty() {
            debug!("Resolver returned no output");
            return Ok(HashMap::new());
        }

        let json = codec::decode(&stdout)?;
        let mappings = answer::parse_answers(&json)?;
        debug!("Resolver answered {} of {} hostname(s)", mappings.len(), hostnames.len());

        Ok(mappings)
    }

    fn backend_name(&self) -> &'static str {
        "process"
    }
}
