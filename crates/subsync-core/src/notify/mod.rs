// # Notifier Implementations
//
// - `TracingNotifier`: writes user-facing messages to the log
// - `ChannelNotifier`: forwards them to a UI/front-end over a bounded channel

use crate::traits::{Notifier, Severity};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// A user-facing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Message text
    pub message: String,
    /// Message severity
    pub severity: Severity,
}

/// Notifier that logs messages through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!(target: "subsync::notify", "{}", message),
            Severity::Error => error!(target: "subsync::notify", "{}", message),
        }
    }
}

/// Notifier that forwards messages into a bounded channel
///
/// Sending never blocks a sync task: when the channel is full or the
/// receiver is gone, the message is dropped and a warning is logged.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let notification = Notification {
            message: message.to_string(),
            severity,
        };
        if let Err(e) = self.tx.try_send(notification) {
            warn!("Notification channel unavailable, dropping message: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new(4);

        notifier.notify("first", Severity::Info);
        notifier.notify("second", Severity::Error);

        assert_eq!(rx.recv().await.unwrap().message, "first");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.message, "second");
        assert_eq!(second.severity, Severity::Error);
    }

    #[tokio::test]
    async fn channel_notifier_drops_when_full() {
        let (notifier, mut rx) = ChannelNotifier::new(1);

        notifier.notify("kept", Severity::Info);
        notifier.notify("dropped", Severity::Info);

        assert_eq!(rx.recv().await.unwrap().message, "kept");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn channel_notifier_survives_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::new(1);
        drop(rx);
        notifier.notify("nobody listening", Severity::Error);
    }
}
