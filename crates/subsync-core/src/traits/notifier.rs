// # Notifier Trait
//
// The user-facing message sink (tray tips, UI toasts, chat messages...).
// Diagnostics are not routed here: they go through `tracing`.

use serde::{Deserialize, Serialize};

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational (progress, success, configuration hints)
    Info,
    /// Something failed
    Error,
}

/// Trait for user-facing notification sinks
///
/// `notify` is synchronous and must not block: it is called from inside
/// sync tasks. Implementations that hand messages to another component
/// should use a bounded, non-blocking channel.
pub trait Notifier: Send + Sync {
    /// Deliver a message to the user
    fn notify(&self, message: &str, severity: Severity);
}
