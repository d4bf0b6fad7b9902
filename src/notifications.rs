use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{info, instrument, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Failure,
}

/// A message the operator has to acknowledge.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

/// Fire-and-forget sender for operator notifications, shared by all screens.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Notifier, UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx }, rx)
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) {
        self.notify(Severity::Success, title.into(), message.into());
    }

    pub fn failure(&self, title: impl Into<String>, message: impl Into<String>) {
        self.notify(Severity::Failure, title.into(), message.into());
    }

    fn notify(&self, severity: Severity, title: String, message: String) {
        if self.tx.send(Notification { severity, title, message }).is_err() {
            trace!("No notification listener, dropping notification");
        }
    }
}

#[instrument(skip_all)]
pub async fn notification_listener(mut rx: UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        match notification.severity {
            Severity::Success => info!("✅ {}: {}", notification.title, notification.message),
            Severity::Failure => warn!("⚠️ {}: {}", notification.title, notification.message),
        }
    }
}
