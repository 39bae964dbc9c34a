//! Core sync engine
//!
//! The SyncEngine is responsible for:
//! - Fanning out one fetch task per configured subscription
//! - Isolating each task's failure from its siblings
//! - Merging each successful result into the inventory, group by group
//! - Reporting per-subscription results to the user
//!
//! ## Architecture
//!
//! ```text
//!                        ┌──────────────┐
//!                        │  SyncEngine  │
//!                        └──────────────┘
//!                               │ spawn one task per subscription
//!         ┌─────────────────────┼─────────────────────┐
//!         ▼                     ▼                     ▼
//! ┌───────────────┐     ┌───────────────┐     ┌───────────────┐
//! │ fetch task A  │     │ fetch task B  │     │ fetch task C  │
//! └───────────────┘     └───────────────┘     └───────────────┘
//!         │                     │                     │
//!         └──────── replace_group (atomic) ───────────┘
//!                               ▼
//!                        ┌──────────────┐
//!                        │ ServerStore  │
//!                        └──────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. Cycle started
//! 2. Each task fetches, parses, optionally resolves, and tags its servers
//! 3. On success, the task replaces its group in the ServerStore
//! 4. Each task reports success or failure to the Notifier
//! 5. Cycle finished once every task has completed

use crate::config::{Subscription, SyncConfig};
use crate::error::{Error, Result};
use crate::fetch::{FetchOutcome, SubscriptionFetcher};
use crate::resolve::ForcedDnsResolver;
use crate::traits::{HttpFetcher, Notifier, ResolverBackend, ServerStore, Severity, ShareLinkParser};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Sync cycle started
    CycleStarted {
        subscriptions: usize,
    },

    /// A subscription's group was replaced
    SubscriptionUpdated {
        group: String,
        count: usize,
    },

    /// A subscription was disabled
    SubscriptionSkipped {
        group: String,
    },

    /// A subscription's pipeline failed; its group was left untouched
    SubscriptionFailed {
        group: String,
        error: String,
    },

    /// Every task of the cycle completed
    CycleFinished {
        updated: usize,
        skipped: usize,
        failed: usize,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Result of one subscription's task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Group replaced with `count` servers
    Updated { group: String, count: usize },
    /// Subscription disabled
    Skipped { group: String },
    /// Pipeline failed; nothing was merged
    Failed { group: String, error: String },
}

impl SyncOutcome {
    /// Group label this outcome belongs to
    pub fn group(&self) -> &str {
        match self {
            SyncOutcome::Updated { group, .. }
            | SyncOutcome::Skipped { group }
            | SyncOutcome::Failed { group, .. } => group,
        }
    }
}

/// Per-subscription outcomes of one sync cycle, in configuration order
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// When the cycle started
    pub started_at: DateTime<Utc>,
    /// When the last task completed
    pub finished_at: DateTime<Utc>,
    /// One outcome per configured subscription
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    /// Number of groups replaced
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Updated { .. }))
    }

    /// Number of disabled subscriptions
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Skipped { .. }))
    }

    /// Number of failed subscriptions
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Failed { .. }))
    }

    /// Outcome for a group label
    pub fn outcome(&self, group: &str) -> Option<&SyncOutcome> {
        self.outcomes.iter().find(|o| o.group() == group)
    }

    fn count(&self, predicate: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

/// Collaborators the engine is wired to
pub struct SyncComponents {
    /// HTTP transport for subscription links
    pub http: Arc<dyn HttpFetcher>,
    /// Subscription payload parser
    pub parser: Arc<dyn ShareLinkParser>,
    /// Trusted resolver; required when forced resolution is enabled
    pub resolver: Option<Arc<dyn ResolverBackend>>,
    /// Shared server inventory
    pub store: Arc<dyn ServerStore>,
    /// User-facing message sink
    pub notifier: Arc<dyn Notifier>,
}

/// Core sync engine
///
/// The engine is cheap to clone: every clone shares the same collaborators,
/// which is how each spawned task gets its own handle.
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Run one cycle with [`SyncEngine::sync_all()`], or keep syncing on an
///    interval with [`SyncEngine::run_with_shutdown()`]
///
/// ## Concurrency
///
/// Subscriptions are independent tokio tasks. The only shared mutation is
/// [`ServerStore::replace_group`], which is atomic, so for every group the
/// inventory always holds exactly one cycle's output.
#[derive(Clone)]
pub struct SyncEngine {
    /// Per-subscription pipeline
    fetcher: SubscriptionFetcher,

    /// Shared inventory
    store: Arc<dyn ServerStore>,

    /// User-facing message sink
    notifier: Arc<dyn Notifier>,

    /// Configured subscriptions
    subscriptions: Arc<[Subscription]>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields sync events
    pub fn new(
        components: SyncComponents,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let resolver = if config.force_resolution {
            let backend = components.resolver.ok_or_else(|| {
                Error::config("Forced resolution is enabled but no resolver backend was provided")
            })?;
            Some(ForcedDnsResolver::new(
                backend,
                components.notifier.clone(),
                config.upstream_proxy.clone(),
            ))
        } else {
            None
        };

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            fetcher: SubscriptionFetcher::new(components.http, components.parser, resolver),
            store: components.store,
            notifier: components.notifier,
            subscriptions: config.subscriptions.into(),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Configured subscriptions
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Run one sync cycle over every configured subscription
    ///
    /// Tasks run concurrently. A failing (or panicking) task is reported and
    /// does not affect its siblings. Returns once every task has completed.
    ///
    /// # Parameters
    ///
    /// - `proxy`: Optional forwarding proxy for subscription requests
    pub async fn sync_all(&self, proxy: Option<&str>) -> SyncReport {
        let started_at = Utc::now();
        self.emit_event(SyncEvent::CycleStarted {
            subscriptions: self.subscriptions.len(),
        });
        info!("Syncing {} subscription(s)", self.subscriptions.len());

        let proxy: Option<Arc<str>> = proxy.filter(|p| !p.is_empty()).map(Arc::from);

        let handles: Vec<_> = self
            .subscriptions
            .iter()
            .cloned()
            .map(|subscription| {
                let engine = self.clone();
                let proxy = proxy.clone();
                tokio::spawn(async move {
                    engine
                        .sync_subscription(&subscription, proxy.as_deref())
                        .await
                })
            })
            .collect();

        let results = futures::future::join_all(handles).await;

        let outcomes: Vec<SyncOutcome> = results
            .into_iter()
            .zip(self.subscriptions.iter())
            .map(|(result, subscription)| match result {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    let error = format!("sync task aborted: {}", join_error);
                    self.report_failure(&subscription.remark, &error);
                    SyncOutcome::Failed {
                        group: subscription.remark.clone(),
                        error,
                    }
                }
            })
            .collect();

        let report = SyncReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        info!(
            "Sync cycle finished: {} updated, {} skipped, {} failed",
            report.updated(),
            report.skipped(),
            report.failed()
        );
        self.emit_event(SyncEvent::CycleFinished {
            updated: report.updated(),
            skipped: report.skipped(),
            failed: report.failed(),
        });

        report
    }

    /// Sync a single subscription and merge its servers
    ///
    /// Never returns an error: failures are reported to the Notifier and
    /// turned into [`SyncOutcome::Failed`].
    pub async fn sync_subscription(
        &self,
        subscription: &Subscription,
        proxy: Option<&str>,
    ) -> SyncOutcome {
        let group = subscription.remark.clone();

        match self.fetch_and_merge(subscription, proxy).await {
            Ok(Some(count)) => {
                info!("Updated {} server(s) from {}", count, group);
                self.notifier.notify(
                    &format!("Update {} server(s) from {}", count, group),
                    Severity::Info,
                );
                self.emit_event(SyncEvent::SubscriptionUpdated {
                    group: group.clone(),
                    count,
                });
                SyncOutcome::Updated { group, count }
            }
            Ok(None) => {
                self.emit_event(SyncEvent::SubscriptionSkipped {
                    group: group.clone(),
                });
                SyncOutcome::Skipped { group }
            }
            Err(e) => {
                let error = e.to_string();
                self.report_failure(&group, &error);
                SyncOutcome::Failed { group, error }
            }
        }
    }

    /// Fetch one subscription and, on success, replace its group
    async fn fetch_and_merge(
        &self,
        subscription: &Subscription,
        proxy: Option<&str>,
    ) -> Result<Option<usize>> {
        match self.fetcher.fetch(subscription, proxy).await? {
            FetchOutcome::Skipped => Ok(None),
            FetchOutcome::Fetched(servers) => {
                let count = self
                    .store
                    .replace_group(&subscription.remark, servers)
                    .await?;
                Ok(Some(count))
            }
        }
    }

    /// Tell the user a subscription failed and log the detail
    fn report_failure(&self, group: &str, error: &str) {
        warn!("Update servers failed from {}: {}", group, error);
        self.notifier.notify(
            &format!("Update servers failed from {}\n{}", group, error),
            Severity::Error,
        );
        self.emit_event(SyncEvent::SubscriptionFailed {
            group: group.to_string(),
            error: error.to_string(),
        });
    }

    /// Keep syncing until a shutdown signal arrives
    ///
    /// Runs a cycle immediately. With `interval` set, runs another cycle
    /// every `interval` until `shutdown_rx` fires; without it, returns after
    /// the first cycle. The inventory is flushed before returning.
    ///
    /// A cycle in progress is allowed to finish before shutdown is observed.
    pub async fn run_with_shutdown(
        &self,
        interval: Option<Duration>,
        proxy: Option<&str>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<()> {
        let reason = match interval {
            None => {
                self.sync_all(proxy).await;
                "Single cycle completed".to_string()
            }
            Some(period) => {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            self.sync_all(proxy).await;
                        }

                        _ = &mut shutdown_rx => {
                            info!("Shutdown signal received");
                            break "Shutdown signal".to_string();
                        }
                    }
                }
            }
        };

        self.emit_event(SyncEvent::Stopped { reason });

        if let Err(e) = self.store.flush().await {
            error!("Failed to flush server inventory: {}", e);
            return Err(e);
        }
        debug!("Inventory flushed, engine stopped");

        Ok(())
    }

    /// Emit a sync event
    fn emit_event(&self, event: SyncEvent) {
        // Never block a sync task on a slow consumer
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_outcomes() {
        let report = SyncReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: vec![
                SyncOutcome::Updated { group: "A".into(), count: 3 },
                SyncOutcome::Skipped { group: "B".into() },
                SyncOutcome::Failed { group: "C".into(), error: "boom".into() },
                SyncOutcome::Updated { group: "D".into(), count: 0 },
            ],
        };

        assert_eq!(report.updated(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.outcome("A"),
            Some(&SyncOutcome::Updated { group: "A".into(), count: 3 })
        );
        assert_eq!(report.outcome("missing"), None);
    }
}
