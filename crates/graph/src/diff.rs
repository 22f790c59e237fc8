//! Explicit changeset between the stored event graph and the one derived
//! from the canvas. Replaces implicit ORM change tracking: the application
//! computes the diff once, before persistence, and persists exactly it.

use sentinel_core::types::CampaignEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A single modified entry, before and after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Changed<T> {
    pub before: T,
    pub after: T,
}

/// Typed changeset: what to insert, delete, and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
    pub changed: Vec<Changed<T>>,
}

impl<T> Default for Diff<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }
}

impl<T> Diff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Computes the changeset between the stored events and the desired set,
/// keyed by event id. Counter state (`failed_count`) is runtime data, not
/// structure, so it is excluded from the change comparison.
pub fn diff_events(existing: &[CampaignEvent], desired: &[CampaignEvent]) -> Diff<CampaignEvent> {
    let existing_by_id: HashMap<Uuid, &CampaignEvent> =
        existing.iter().map(|e| (e.id, e)).collect();
    let desired_by_id: HashMap<Uuid, &CampaignEvent> = desired.iter().map(|e| (e.id, e)).collect();

    let mut diff = Diff::default();

    for event in desired {
        match existing_by_id.get(&event.id) {
            None => diff.added.push(event.clone()),
            Some(before) if structurally_changed(before, event) => diff.changed.push(Changed {
                before: (*before).clone(),
                after: event.clone(),
            }),
            Some(_) => {}
        }
    }

    for event in existing {
        if !desired_by_id.contains_key(&event.id) {
            diff.removed.push(event.clone());
        }
    }

    diff
}

fn structurally_changed(before: &CampaignEvent, after: &CampaignEvent) -> bool {
    before.name != after.name
        || before.kind != after.kind
        || before.parent_id != after.parent_id
        || before.decision_path != after.decision_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::types::{DecisionPath, EventKind};

    fn event(campaign_id: Uuid, name: &str) -> CampaignEvent {
        CampaignEvent::new(campaign_id, name, EventKind::Action)
    }

    #[test]
    fn test_empty_diff_for_identical_sets() {
        let campaign_id = Uuid::new_v4();
        let events = vec![event(campaign_id, "a"), event(campaign_id, "b")];
        assert!(diff_events(&events, &events).is_empty());
    }

    #[test]
    fn test_add_remove_change_classification() {
        let campaign_id = Uuid::new_v4();
        let kept = event(campaign_id, "kept");
        let dropped = event(campaign_id, "dropped");
        let renamed = event(campaign_id, "old-name");
        let added = event(campaign_id, "brand-new");

        let mut renamed_after = renamed.clone();
        renamed_after.name = "new-name".to_string();

        let existing = vec![kept.clone(), dropped.clone(), renamed];
        let desired = vec![kept, renamed_after, added.clone()];

        let diff = diff_events(&existing, &desired);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].id, added.id);
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].id, dropped.id);
        assert_eq!(diff.changed.len(), 1);
        assert_eq!(diff.changed[0].before.name, "old-name");
        assert_eq!(diff.changed[0].after.name, "new-name");
    }

    #[test]
    fn test_failed_count_is_not_a_structural_change() {
        let campaign_id = Uuid::new_v4();
        let before = event(campaign_id, "a");
        let mut after = before.clone();
        after.failed_count = 42;

        assert!(diff_events(&[before], &[after]).is_empty());
    }

    #[test]
    fn test_reparenting_is_a_change() {
        let campaign_id = Uuid::new_v4();
        let parent = event(campaign_id, "parent");
        let before = event(campaign_id, "child");
        let mut after = before.clone();
        after.parent_id = Some(parent.id);
        after.decision_path = Some(DecisionPath::Yes);

        let diff = diff_events(&[parent.clone(), before], &[parent, after]);
        assert_eq!(diff.changed.len(), 1);
    }
}
