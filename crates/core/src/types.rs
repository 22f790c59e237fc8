use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A configured sequence of marketing actions/decisions applied to
/// enrolled contacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub is_published: bool,
    /// Number of contacts currently enrolled; maintained by the (external)
    /// enrollment pipeline, read here for threshold evaluation.
    pub enrolled_contacts: u64,
    /// Optimistic-lock version, bumped on every publish-state write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(name: impl Into<String>, enrolled_contacts: u64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_published: true,
            enrolled_contacts,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The kind of work a campaign event performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Action,
    Decision,
    Condition,
}

/// Which branch of a decision parent this event hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPath {
    Yes,
    No,
}

/// One node in a campaign's execution graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignEvent {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub kind: EventKind,
    /// Distinct-contact failure counter. Incremented at most once per
    /// contact failure streak; reset on campaign (re)publish.
    pub failed_count: u64,
    pub parent_id: Option<Uuid>,
    pub decision_path: Option<DecisionPath>,
}

impl CampaignEvent {
    pub fn new(campaign_id: Uuid, name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            name: name.into(),
            kind,
            failed_count: 0,
            parent_id: None,
            decision_path: None,
        }
    }
}

/// Per-(event, contact) failure streak state. `count` is the number of
/// consecutive failed executions; `counted` records whether the streak has
/// already been counted into the event's `failed_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureStreak {
    pub count: u32,
    pub counted: bool,
}

/// Why a campaign left the published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpublishReason {
    RepeatedFailures,
}

/// Discriminant for notification routing and listener lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    EventFailed,
    CampaignUnpublished,
}

/// Payload delivered to notification listeners.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NotificationBody {
    EventFailed {
        campaign_id: Uuid,
        event_id: Uuid,
        contact_id: String,
    },
    CampaignUnpublished {
        campaign_id: Uuid,
        event_id: Uuid,
        failed_count: u64,
        enrolled_contacts: u64,
        reason: UnpublishReason,
    },
}

impl NotificationBody {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationBody::EventFailed { .. } => NotificationKind::EventFailed,
            NotificationBody::CampaignUnpublished { .. } => NotificationKind::CampaignUnpublished,
        }
    }
}

/// A single notification as handed to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub body: NotificationBody,
    pub emitted_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(body: NotificationBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            body,
            emitted_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> NotificationKind {
        self.body.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_kind_matches_body() {
        let n = Notification::new(NotificationBody::EventFailed {
            campaign_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            contact_id: "c-1".to_string(),
        });
        assert_eq!(n.kind(), NotificationKind::EventFailed);

        let n = Notification::new(NotificationBody::CampaignUnpublished {
            campaign_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            failed_count: 35,
            enrolled_contacts: 100,
            reason: UnpublishReason::RepeatedFailures,
        });
        assert_eq!(n.kind(), NotificationKind::CampaignUnpublished);
    }

    #[test]
    fn test_unpublish_payload_serializes_reason() {
        let body = NotificationBody::CampaignUnpublished {
            campaign_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            failed_count: 40,
            enrolled_contacts: 100,
            reason: UnpublishReason::RepeatedFailures,
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["kind"], "campaign_unpublished");
        assert_eq!(json["reason"], "repeated_failures");
    }
}
