//! Configuration types for the subscription sync system
//!
//! This module defines all configuration structures used throughout the crate.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "subscriptions": [
//!     { "enable": true, "link": "https://sub.example.com/a", "remark": "Provider A" },
//!     { "enable": true, "link": "https://sub.example.com/b", "remark": "Provider B", "user_agent": "clash" }
//!   ],
//!   "force_resolution": true,
//!   "upstream_proxy": "socks5://127.0.0.1:1080",
//!   "resolver": { "path": "/opt/subsync/http-tool", "timeout_secs": 30 },
//!   "engine": { "event_channel_capacity": 1000 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Main sync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Configured subscriptions
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,

    /// Rewrite server hostnames to IPs resolved through the upstream proxy
    #[serde(default)]
    pub force_resolution: bool,

    /// Upstream proxy used by forced resolution
    #[serde(default)]
    pub upstream_proxy: Option<String>,

    /// External resolver settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription
    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    /// Enable forced resolution through `upstream_proxy`
    pub fn with_forced_resolution(mut self, upstream_proxy: impl Into<String>) -> Self {
        self.force_resolution = true;
        self.upstream_proxy = Some(upstream_proxy.into());
        self
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(json)
            .map_err(|e| crate::Error::config(format!("Invalid configuration: {}", e)))
    }

    /// Load a configuration file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            crate::Error::config(format!(
                "Failed to read configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Validate the configuration
    ///
    /// Per-subscription problems (blank link, duplicate remark) only produce
    /// warnings: they are isolated to that subscription at sync time and must
    /// not prevent the others from syncing.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.engine.validate()?;
        self.resolver.validate()?;

        let mut seen = HashSet::new();
        for subscription in &self.subscriptions {
            if !seen.insert(subscription.remark.as_str()) {
                warn!(
                    "Duplicate subscription remark '{}': these subscriptions share one server group",
                    subscription.remark
                );
            }
            if subscription.enable && subscription.link.trim().is_empty() {
                warn!("Subscription '{}' is enabled but has no link", subscription.remark);
            }
        }

        Ok(())
    }
}

/// A remote source of proxy server definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Whether this subscription takes part in sync
    #[serde(default = "default_enable")]
    pub enable: bool,

    /// Subscription URL
    pub link: String,

    /// Group label: display name and merge key for the inventory
    pub remark: String,

    /// Custom `User-Agent` for the subscription request
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Subscription {
    /// Create an enabled subscription
    pub fn new(remark: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            enable: true,
            link: link.into(),
            remark: remark.into(),
            user_agent: None,
        }
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Enable or disable the subscription
    pub fn with_enabled(mut self, enable: bool) -> Self {
        self.enable = enable;
        self
    }
}

fn default_enable() -> bool {
    true
}

/// External resolver configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Path to the resolver executable (looked up on `PATH` when unset)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Upper bound on one resolver invocation, in seconds
    ///
    /// Unset means no timeout: the resolution step waits for the process to
    /// exit. Sibling subscriptions are unaffected either way.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ResolverConfig {
    /// Validate the resolver configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_secs == Some(0) {
            return Err(crate::Error::config(
                "Resolver timeout must be > 0 (omit it to disable the timeout)",
            ));
        }
        if let Some(path) = &self.path
            && path.as_os_str().is_empty()
        {
            return Err(crate::Error::config("Resolver path cannot be empty"));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the sync event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_event_channel_capacity() -> usize {
    1000
}
