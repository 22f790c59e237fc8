//! Notification bus — trait for emitting health notifications from any module.
//!
//! The monitor accepts an `Arc<dyn NotificationSink>` and routes
//! failure/unpublish notifications through it. Delivery is best-effort:
//! implementations may fail, but callers never let that abort state changes.

use crate::types::{Notification, NotificationKind};
use std::sync::{Arc, Mutex};

/// Trait for delivering notifications to external collaborators (user
/// notification systems, webhooks, message buses).
pub trait NotificationSink: Send + Sync {
    /// Whether anyone is listening for this kind of notification. Checked
    /// before payloads are constructed so unobserved events cost nothing.
    fn has_listeners(&self, kind: NotificationKind) -> bool;

    fn dispatch(&self, notification: Notification) -> anyhow::Result<()>;
}

/// No-op sink for tests and deployments without a notification system.
pub struct NoOpSink;

impl NotificationSink for NoOpSink {
    fn has_listeners(&self, _kind: NotificationKind) -> bool {
        false
    }

    fn dispatch(&self, _notification: Notification) -> anyhow::Result<()> {
        Ok(())
    }
}

/// In-memory sink that captures notifications for testing.
#[derive(Default)]
pub struct CaptureSink {
    notifications: Mutex<Vec<Notification>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }

    pub fn count(&self) -> usize {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .len()
    }

    pub fn count_kind(&self, kind: NotificationKind) -> usize {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .iter()
            .filter(|n| n.kind() == kind)
            .count()
    }

    pub fn clear(&self) {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .clear();
    }
}

impl NotificationSink for CaptureSink {
    fn has_listeners(&self, _kind: NotificationKind) -> bool {
        true
    }

    fn dispatch(&self, notification: Notification) -> anyhow::Result<()> {
        self.notifications
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Sink that fails every dispatch. Used to test that delivery failures
/// never roll back counter or unpublish state.
pub struct FailingSink;

impl NotificationSink for FailingSink {
    fn has_listeners(&self, _kind: NotificationKind) -> bool {
        true
    }

    fn dispatch(&self, _notification: Notification) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("sink unavailable"))
    }
}

/// Convenience: create a no-op bus for modules that don't need one.
pub fn noop_sink() -> Arc<dyn NotificationSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
