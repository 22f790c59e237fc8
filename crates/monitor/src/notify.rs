//! Best-effort notification emission. A broken sink is logged and ignored;
//! it must never abort a counter update or an unpublish transition.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use sentinel_core::event_bus::NotificationSink;
use sentinel_core::types::{Notification, NotificationBody, NotificationKind, UnpublishReason};

pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Tells listeners that a contact failed an event. No-op without
    /// listeners; the payload is never even built.
    pub fn notify_failure(&self, campaign_id: Uuid, event_id: Uuid, contact_id: &str) {
        if !self.sink.has_listeners(NotificationKind::EventFailed) {
            return;
        }
        self.dispatch(Notification::new(NotificationBody::EventFailed {
            campaign_id,
            event_id,
            contact_id: contact_id.to_string(),
        }));
    }

    /// Tells listeners that a campaign was auto-unpublished, with enough
    /// metadata for the UI to distinguish it from a manual unpublish.
    pub fn notify_unpublish(
        &self,
        campaign_id: Uuid,
        event_id: Uuid,
        failed_count: u64,
        enrolled_contacts: u64,
    ) {
        if !self.sink.has_listeners(NotificationKind::CampaignUnpublished) {
            return;
        }
        self.dispatch(Notification::new(NotificationBody::CampaignUnpublished {
            campaign_id,
            event_id,
            failed_count,
            enrolled_contacts,
            reason: UnpublishReason::RepeatedFailures,
        }));
    }

    fn dispatch(&self, notification: Notification) {
        let kind = notification.kind();
        if let Err(e) = self.sink.dispatch(notification) {
            warn!(kind = ?kind, error = %e, "Notification delivery failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sentinel_core::event_bus::{capture_sink, FailingSink, NoOpSink};
    use sentinel_core::types::NotificationBody;

    #[test]
    fn test_capture_receives_payload_metadata() {
        let sink = capture_sink();
        let dispatcher = NotificationDispatcher::new(sink.clone());

        let campaign_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        dispatcher.notify_unpublish(campaign_id, event_id, 40, 100);

        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 1);
        match &notifications[0].body {
            NotificationBody::CampaignUnpublished {
                campaign_id: c,
                failed_count,
                reason,
                ..
            } => {
                assert_eq!(*c, campaign_id);
                assert_eq!(*failed_count, 40);
                assert_eq!(*reason, UnpublishReason::RepeatedFailures);
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[test]
    fn test_no_listeners_no_dispatch() {
        let dispatcher = NotificationDispatcher::new(Arc::new(NoOpSink));
        // Nothing to assert beyond "does not panic": NoOpSink reports no
        // listeners, so both calls return before building payloads.
        dispatcher.notify_failure(Uuid::new_v4(), Uuid::new_v4(), "c-1");
        dispatcher.notify_unpublish(Uuid::new_v4(), Uuid::new_v4(), 1, 1);
    }

    #[test]
    fn test_failing_sink_is_swallowed() {
        let dispatcher = NotificationDispatcher::new(Arc::new(FailingSink));
        dispatcher.notify_failure(Uuid::new_v4(), Uuid::new_v4(), "c-1");
        dispatcher.notify_unpublish(Uuid::new_v4(), Uuid::new_v4(), 1, 1);
    }
}
