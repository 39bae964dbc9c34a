// # subsyncd - Subscription Sync Daemon
//
// A thin integration layer: all sync logic lives in subsync-core.
//
// The subsyncd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Loading the subscription configuration file
// 3. Wiring the HTTP fetcher, parser, resolver backend, inventory, and notifier
// 4. Running the sync engine until done or signalled
//
// ## Configuration
//
// Daemon settings come from environment variables:
//
// - `SUBSYNC_CONFIG`: Path to the JSON subscription configuration (required)
// - `SUBSYNC_INVENTORY_TYPE`: Server inventory type (file, memory). Default: file
// - `SUBSYNC_INVENTORY_PATH`: Path to the inventory file (for file inventory)
// - `SUBSYNC_PROXY`: Forwarding proxy for subscription downloads (optional)
// - `SUBSYNC_INTERVAL_SECS`: Re-sync period in seconds (optional, 60-86400).
//   Without it the daemon runs a single cycle and exits.
// - `SUBSYNC_LOG_LEVEL`: trace, debug, info, warn, error. Default: info
//
// ## Example
//
// ```bash
// export SUBSYNC_CONFIG=/etc/subsync/config.json
// export SUBSYNC_INVENTORY_PATH=/var/lib/subsync/servers.json
// export SUBSYNC_INTERVAL_SECS=3600
//
// subsyncd
// ```

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use subsync_core::traits::{ResolverBackend, ServerStore};
use subsync_core::{
    FileServerStore, JsonServerParser, MemoryServerStore, SyncComponents, SyncConfig, SyncEngine,
    SyncEvent, TracingNotifier,
};
use subsync_fetch_http::ReqwestFetcher;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubsyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SubsyncExitCode> for ExitCode {
    fn from(code: SubsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
struct Config {
    config_path: PathBuf,
    inventory_type: String,
    inventory_path: Option<PathBuf>,
    proxy: Option<String>,
    interval_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let interval_secs = match env::var("SUBSYNC_INTERVAL_SECS") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .with_context(|| format!("SUBSYNC_INTERVAL_SECS is not a number: '{}'", raw))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            config_path: env::var("SUBSYNC_CONFIG")
                .context("SUBSYNC_CONFIG is required. Set it via: export SUBSYNC_CONFIG=/etc/subsync/config.json")?
                .into(),
            inventory_type: env::var("SUBSYNC_INVENTORY_TYPE").unwrap_or_else(|_| "file".to_string()),
            inventory_path: env::var("SUBSYNC_INVENTORY_PATH").ok().map(PathBuf::from),
            proxy: env::var("SUBSYNC_PROXY")
                .ok()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            interval_secs,
            log_level: env::var("SUBSYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("SUBSYNC_CONFIG cannot be empty");
        }

        if !self.config_path.is_file() {
            anyhow::bail!(
                "SUBSYNC_CONFIG does not point to a file: {}",
                self.config_path.display()
            );
        }

        match self.inventory_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "SUBSYNC_INVENTORY_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.inventory_type
            ),
        }

        if self.inventory_type == "file" {
            match &self.inventory_path {
                Some(path) if path.as_os_str().is_empty() => {
                    anyhow::bail!(
                        "SUBSYNC_INVENTORY_PATH cannot be empty when SUBSYNC_INVENTORY_TYPE=file"
                    );
                }
                Some(path) => {
                    if let Some(parent) = path.parent()
                        && !parent.as_os_str().is_empty()
                        && !parent.exists()
                    {
                        anyhow::bail!(
                            "SUBSYNC_INVENTORY_PATH parent directory does not exist: {}. \
                            Create it first: mkdir -p {}",
                            parent.display(),
                            parent.display()
                        );
                    }
                }
                None => anyhow::bail!(
                    "SUBSYNC_INVENTORY_PATH is required when SUBSYNC_INVENTORY_TYPE=file. \
                    Set it via: export SUBSYNC_INVENTORY_PATH=/var/lib/subsync/servers.json"
                ),
            }
        }

        if let Some(proxy) = &self.proxy
            && !proxy.contains("://")
        {
            anyhow::bail!(
                "SUBSYNC_PROXY must be a URL such as http://127.0.0.1:7890. Got: {}",
                proxy
            );
        }

        if let Some(interval) = self.interval_secs
            && !(60..=86400).contains(&interval)
        {
            anyhow::bail!(
                "SUBSYNC_INTERVAL_SECS must be between 60 and 86400 seconds. Got: {}",
                interval
            );
        }

        parse_log_level(&self.log_level)?;

        Ok(())
    }

    fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "SUBSYNC_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SubsyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SubsyncExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SubsyncExitCode::ConfigError.into();
    }

    info!("Starting subsyncd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SubsyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let (engine, events) = match build_engine(&config).await {
            Ok(parts) => parts,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return SubsyncExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(&config, engine, events).await {
            error!("Daemon error: {:#}", e);
            SubsyncExitCode::RuntimeError
        } else {
            SubsyncExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Load the subscription configuration and wire every collaborator
async fn build_engine(config: &Config) -> Result<(SyncEngine, mpsc::Receiver<SyncEvent>)> {
    let sync_config = SyncConfig::load(&config.config_path)
        .await
        .with_context(|| format!("Failed to load {}", config.config_path.display()))?;

    info!(
        "Configuration loaded: {} subscription(s), forced resolution {}",
        sync_config.subscriptions.len(),
        if sync_config.force_resolution { "on" } else { "off" }
    );

    let store: Arc<dyn ServerStore> = match config.inventory_path.as_deref() {
        Some(path) if config.inventory_type == "file" => {
            info!("Using file inventory at {}", path.display());
            Arc::new(FileServerStore::new(path).await?)
        }
        _ => {
            info!("Using in-memory inventory");
            Arc::new(MemoryServerStore::new())
        }
    };

    let resolver = if sync_config.force_resolution {
        Some(resolver_backend(&sync_config)?)
    } else {
        None
    };

    let components = SyncComponents {
        http: Arc::new(ReqwestFetcher::new()?),
        parser: Arc::new(JsonServerParser),
        resolver,
        store,
        notifier: Arc::new(TracingNotifier),
    };

    Ok(SyncEngine::new(components, sync_config)?)
}

#[cfg(feature = "process-resolver")]
fn resolver_backend(sync_config: &SyncConfig) -> Result<Arc<dyn ResolverBackend>> {
    let backend = subsync_resolver_process::ProcessResolverBackend::from_config(&sync_config.resolver);
    info!("Forced resolution via {}", backend.binary_path().display());
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "process-resolver"))]
fn resolver_backend(_sync_config: &SyncConfig) -> Result<Arc<dyn ResolverBackend>> {
    anyhow::bail!("force_resolution is enabled but subsyncd was built without the process-resolver feature")
}

/// Run the engine until it finishes or a shutdown signal arrives
async fn run_daemon(
    config: &Config,
    engine: SyncEngine,
    mut events: mpsc::Receiver<SyncEvent>,
) -> Result<()> {
    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SyncEvent::CycleFinished { updated, skipped, failed } => {
                    info!(updated, skipped, failed, "Sync cycle complete");
                }
                SyncEvent::Stopped { reason } => {
                    info!("Engine stopped: {}", reason);
                }
                other => debug!("Sync event: {:?}", other),
            }
        }
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let signal_listener = tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(signal) => {
                info!("Received shutdown signal: {}", signal);
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                // Keep the sender alive so the engine runs until killed
                warn!("Signal handling unavailable: {}", e);
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    match config.interval() {
        Some(period) => info!("Syncing every {:?} until shutdown", period),
        None => info!("Running a single sync cycle"),
    }

    let result = engine
        .run_with_shutdown(config.interval(), config.proxy.as_deref(), shutdown_rx)
        .await;

    signal_listener.abort();

    // Dropping the engine closes the event channel so the logger drains and exits
    drop(engine);
    if let Err(e) = event_logger.await {
        warn!("Event logger task failed: {}", e);
    }

    result.context("Sync engine failed")?;
    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
