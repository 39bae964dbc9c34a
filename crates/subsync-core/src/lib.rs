// # subsync-core
//
// Core library for synchronizing a proxy-server inventory from remote
// subscriptions.
//
// ## Architecture Overview
//
// - **HttpFetcher**: Trait for downloading subscription payloads
// - **ShareLinkParser**: Trait for turning payload text into servers
// - **ResolverBackend**: Trait for batched, trusted hostname resolution
// - **Notifier**: Trait for user-facing messages
// - **ServerStore**: Trait for the shared inventory (atomic group replace)
// - **ForcedDnsResolver**: Rewrites hostnames to trusted IPs
// - **SubscriptionFetcher**: One subscription's fetch pipeline
// - **SyncEngine**: Concurrent fan-out and group-scoped merge
//
// ## Design Principles
//
// 1. **Failure Isolation**: One subscription failing never affects another
// 2. **Atomic Merge**: A group is replaced wholesale or not at all
// 3. **Narrow Collaborators**: HTTP, parsing, notification, and storage sit behind traits
// 4. **Soft Resolution**: Resolver trouble degrades to "keep the hostname"
// 5. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod parser;
pub mod resolve;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, ResolverConfig, Subscription, SyncConfig};
pub use engine::{SyncComponents, SyncEngine, SyncEvent, SyncOutcome, SyncReport};
pub use error::{Error, Result};
pub use fetch::{FetchOutcome, SubscriptionFetcher};
pub use notify::{ChannelNotifier, Notification, TracingNotifier};
pub use parser::JsonServerParser;
pub use resolve::{ForcedDnsResolver, distinct_hostnames};
pub use store::{FileServerStore, MemoryServerStore};
pub use traits::{HttpFetcher, Notifier, ResolverBackend, Server, ServerStore, Severity, ShareLinkParser};
