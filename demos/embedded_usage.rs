//! Minimal embedding example for subsync-core
//!
//! This example demonstrates using subsync-core as a library in a custom
//! application. Subscriptions are served from memory, notifications are
//! consumed from a channel, and the engine lifecycle is fully managed by
//! the application.

use std::collections::HashMap;
use std::sync::Arc;
use subsync_core::traits::{FetchRequest, FetchResponse, HttpFetcher, Server, ServerStore};
use subsync_core::{
    ChannelNotifier, JsonServerParser, MemoryServerStore, Result, Subscription, SyncComponents,
    SyncConfig, SyncEngine,
};

/// Serves subscription payloads from memory
struct EmbeddedFetcher {
    payloads: HashMap<String, String>,
}

impl EmbeddedFetcher {
    fn new() -> Self {
        let mut payloads = HashMap::new();
        payloads.insert(
            "memory://office".to_string(),
            serde_json::json!([
                { "hostname": "hk-1.office.example", "port": 443, "remark": "HK 1", "type": "vmess" },
                { "hostname": "jp-1.office.example", "port": 443, "remark": "JP 1", "type": "trojan" }
            ])
            .to_string(),
        );
        payloads.insert(
            "memory://broken".to_string(),
            "this is not a server list".to_string(),
        );
        Self { payloads }
    }
}

#[async_trait::async_trait]
impl HttpFetcher for EmbeddedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        Ok(match self.payloads.get(&request.url) {
            Some(body) => FetchResponse {
                status: 200,
                body: body.clone(),
            },
            None => FetchResponse {
                status: 404,
                body: String::new(),
            },
        })
    }

    fn fetcher_name(&self) -> &'static str {
        "embedded"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Embedded subsync-core Example ===\n");

    // Existing inventory: one hand-added server and a stale office entry
    let store = Arc::new(MemoryServerStore::with_servers(vec![
        Server::new("manual.example", 8388).with_remark("Manual"),
        Server::new("stale.office.example", 443).with_group("Office"),
    ]));

    let (notifier, mut notifications) = ChannelNotifier::new(32);

    let config = SyncConfig::new()
        .with_subscription(Subscription::new("Office", "memory://office"))
        .with_subscription(Subscription::new("Broken", "memory://broken"))
        .with_subscription(Subscription::new("Missing", "memory://missing"))
        .with_subscription(Subscription::new("Paused", "memory://office").with_enabled(false));

    let components = SyncComponents {
        http: Arc::new(EmbeddedFetcher::new()),
        parser: Arc::new(JsonServerParser),
        resolver: None,
        store: store.clone(),
        notifier: Arc::new(notifier),
    };

    println!("1. Creating engine...");
    let (engine, mut event_rx) = SyncEngine::new(components, config)?;

    let event_listener = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("[Event] {:?}", event);
        }
    });

    println!("2. Running one sync cycle...\n");
    let report = engine.sync_all(None).await;

    println!(
        "\n3. Cycle finished: {} updated, {} skipped, {} failed",
        report.updated(),
        report.skipped(),
        report.failed()
    );

    println!("\n4. Notifications for the user:");
    drop(engine);
    while let Ok(notification) = notifications.try_recv() {
        println!("   [{:?}] {}", notification.severity, notification.message);
    }

    println!("\n5. Inventory:");
    for server in store.servers().await? {
        let group = if server.group.is_empty() { "-" } else { server.group.as_str() };
        println!("   {:<8} {}:{} ({})", group, server.hostname, server.port, server.remark);
    }

    let _ = event_listener.await;

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Every collaborator is supplied by the application");
    println!("- Failed subscriptions leave their groups untouched");
    println!("- Unrelated servers survive every sync");

    Ok(())
}
