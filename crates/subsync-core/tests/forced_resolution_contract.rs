//! Architectural Contract Test: Forced Resolution
//!
//! This test verifies trusted hostname resolution inside the sync cycle.
//!
//! Constraints verified:
//! - Resolution runs after parsing and before the merge
//! - Each subscription resolves its own hostnames in one backend call
//! - The upstream proxy, not the fetch proxy, is handed to the backend
//! - A missing upstream proxy is a hint, never a failure
//! - Forced resolution without a backend is rejected at construction
//!
//! If this test fails, someone has added:
//! - Per-server lookups
//! - Resolver errors that escape into the subscription outcome

mod common;

use common::*;
use std::sync::Arc;
use subsync_core::error::Error;
use subsync_core::resolve::MISSING_UPSTREAM_PROXY;
use subsync_core::traits::{ServerStore, Severity};
use subsync_core::{Subscription, SyncConfig, SyncEngine, SyncOutcome};

const UPSTREAM: &str = "http://127.0.0.1:7890";

#[tokio::test]
async fn resolved_hostnames_are_merged() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .respond("https://a.test/sub", 200, "a1.example.com\na2.example.com\na1.example.com"),
    );
    let resolver = Arc::new(CountingResolver::new(&[("a1.example.com", "203.0.113.7")]));
    let store = memory_store();
    let notifier = Arc::new(RecordingNotifier::new());

    let config = SyncConfig::new()
        .with_subscription(Subscription::new("A", "https://a.test/sub"))
        .with_forced_resolution(UPSTREAM);

    let (engine, _events) = SyncEngine::new(
        components(fetcher, store.clone(), notifier, Some(resolver.clone())),
        config,
    )
    .expect("engine construction succeeds");

    let report = engine.sync_all(None).await;

    assert_eq!(
        report.outcome("A"),
        Some(&SyncOutcome::Updated { group: "A".into(), count: 3 })
    );
    assert_eq!(resolver.call_count(), 1, "one batched lookup per subscription");
    assert_eq!(
        hostnames(&store.group("A").await.unwrap()),
        vec!["203.0.113.7", "a2.example.com", "203.0.113.7"],
        "unresolved hostnames are kept as they were"
    );
}

#[tokio::test]
async fn upstream_proxy_is_separate_from_fetch_proxy() {
    let fetcher = Arc::new(ScriptedFetcher::new().respond("https://a.test/sub", 200, "a.example.com"));
    let resolver = Arc::new(CountingResolver::new(&[]));
    let notifier = Arc::new(RecordingNotifier::new());

    let config = SyncConfig::new()
        .with_subscription(Subscription::new("A", "https://a.test/sub"))
        .with_forced_resolution(UPSTREAM);

    let (engine, _events) = SyncEngine::new(
        components(fetcher.clone(), memory_store(), notifier, Some(resolver.clone())),
        config,
    )
    .expect("engine construction succeeds");

    engine.sync_all(Some("http://10.0.0.1:3128")).await;

    assert_eq!(fetcher.requests()[0].proxy.as_deref(), Some("http://10.0.0.1:3128"));
    assert_eq!(resolver.proxies(), vec![UPSTREAM.to_string()]);
}

#[tokio::test]
async fn blank_upstream_proxy_hints_once_per_subscription() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .respond("https://a.test/sub", 200, "a.example.com")
            .respond("https://b.test/sub", 200, "b.example.com"),
    );
    let resolver = Arc::new(CountingResolver::new(&[("a.example.com", "203.0.113.1")]));
    let store = memory_store();
    let notifier = Arc::new(RecordingNotifier::new());

    let config = SyncConfig::new()
        .with_subscription(Subscription::new("A", "https://a.test/sub"))
        .with_subscription(Subscription::new("B", "https://b.test/sub"))
        .with_forced_resolution("   ");

    let (engine, _events) = SyncEngine::new(
        components(fetcher, store.clone(), notifier.clone(), Some(resolver.clone())),
        config,
    )
    .expect("engine construction succeeds");

    let report = engine.sync_all(None).await;

    assert_eq!(report.updated(), 2, "a missing proxy never fails the subscription");
    assert_eq!(resolver.call_count(), 0, "backend is not consulted without a proxy");
    assert_eq!(
        hostnames(&store.group("A").await.unwrap()),
        vec!["a.example.com"]
    );

    let hints = notifier
        .with_severity(Severity::Info)
        .into_iter()
        .filter(|m| m == MISSING_UPSTREAM_PROXY)
        .count();
    assert_eq!(hints, 2);
    assert!(notifier.with_severity(Severity::Error).is_empty());
}

#[tokio::test]
async fn resolution_is_skipped_when_disabled() {
    let fetcher = Arc::new(ScriptedFetcher::new().respond("https://a.test/sub", 200, "a.example.com"));
    let resolver = Arc::new(CountingResolver::new(&[("a.example.com", "203.0.113.1")]));
    let store = memory_store();
    let notifier = Arc::new(RecordingNotifier::new());

    let mut config = SyncConfig::new().with_subscription(Subscription::new("A", "https://a.test/sub"));
    config.upstream_proxy = Some(UPSTREAM.to_string());

    let (engine, _events) = SyncEngine::new(
        components(fetcher, store.clone(), notifier, Some(resolver.clone())),
        config,
    )
    .expect("engine construction succeeds");

    engine.sync_all(None).await;

    assert_eq!(resolver.call_count(), 0);
    assert_eq!(hostnames(&store.group("A").await.unwrap()), vec!["a.example.com"]);
}

#[tokio::test]
async fn failed_fetch_never_reaches_the_resolver() {
    let fetcher = Arc::new(ScriptedFetcher::new().respond("https://a.test/sub", 404, ""));
    let resolver = Arc::new(CountingResolver::new(&[]));
    let notifier = Arc::new(RecordingNotifier::new());

    let config = SyncConfig::new()
        .with_subscription(Subscription::new("A", "https://a.test/sub"))
        .with_forced_resolution(UPSTREAM);

    let (engine, _events) = SyncEngine::new(
        components(fetcher, memory_store(), notifier, Some(resolver.clone())),
        config,
    )
    .expect("engine construction succeeds");

    let report = engine.sync_all(None).await;

    assert_eq!(report.failed(), 1);
    assert_eq!(resolver.call_count(), 0);
}

#[test]
fn forced_resolution_requires_a_backend() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let config = SyncConfig::new()
        .with_subscription(Subscription::new("A", "https://a.test/sub"))
        .with_forced_resolution(UPSTREAM);

    let result = SyncEngine::new(components(fetcher, memory_store(), notifier, None), config);

    assert!(matches!(result, Err(Error::Config(_))));
}
