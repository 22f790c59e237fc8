//! In-memory repository backed by DashMap for lock-free concurrent access.
//! Each conditional update runs while holding the single map-entry guard,
//! which gives the same atomicity a conditional UPDATE gives against SQL.

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use sentinel_core::types::{Campaign, CampaignEvent, FailureStreak};
use sentinel_core::{SentinelError, SentinelResult};

use crate::repository::CampaignRepository;

#[derive(Default)]
pub struct MemoryRepository {
    campaigns: DashMap<Uuid, Campaign>,
    events: DashMap<Uuid, CampaignEvent>,
    // Keyed by (event, contact): one streak per contact per event node.
    streaks: DashMap<(Uuid, String), FailureStreak>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CampaignRepository for MemoryRepository {
    fn insert_campaign(&self, campaign: Campaign) -> SentinelResult<()> {
        self.campaigns.insert(campaign.id, campaign);
        Ok(())
    }

    fn insert_event(&self, event: CampaignEvent) -> SentinelResult<()> {
        self.events.insert(event.id, event);
        Ok(())
    }

    fn campaign(&self, id: Uuid) -> SentinelResult<Campaign> {
        self.campaigns
            .get(&id)
            .map(|r| r.clone())
            .ok_or(SentinelError::CampaignNotFound(id))
    }

    fn event(&self, id: Uuid) -> SentinelResult<CampaignEvent> {
        self.events
            .get(&id)
            .map(|r| r.clone())
            .ok_or(SentinelError::EventNotFound(id))
    }

    fn campaign_events(&self, campaign_id: Uuid) -> SentinelResult<Vec<CampaignEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect())
    }

    fn failed_count(&self, event_id: Uuid) -> SentinelResult<u64> {
        self.events
            .get(&event_id)
            .map(|r| r.failed_count)
            .ok_or(SentinelError::EventNotFound(event_id))
    }

    fn increment_failed_count(&self, event_id: Uuid) -> SentinelResult<u64> {
        let mut entry = self
            .events
            .get_mut(&event_id)
            .ok_or(SentinelError::EventNotFound(event_id))?;
        entry.failed_count += 1;
        Ok(entry.failed_count)
    }

    fn decrement_failed_count(&self, event_id: Uuid) -> SentinelResult<u64> {
        let mut entry = self
            .events
            .get_mut(&event_id)
            .ok_or(SentinelError::EventNotFound(event_id))?;
        entry.failed_count = entry.failed_count.saturating_sub(1);
        Ok(entry.failed_count)
    }

    fn reset_failed_counts(&self, campaign_id: Uuid) -> SentinelResult<()> {
        for mut entry in self.events.iter_mut() {
            if entry.campaign_id == campaign_id {
                entry.failed_count = 0;
            }
        }
        // Stale streaks would otherwise suppress the first post-publish
        // increment for contacts that were already counted.
        self.streaks.retain(|(event_id, _), _| {
            self.events
                .get(event_id)
                .map(|e| e.campaign_id != campaign_id)
                .unwrap_or(true)
        });
        debug!(campaign_id = %campaign_id, "Reset failure counters");
        Ok(())
    }

    fn failure_streak(&self, event_id: Uuid, contact_id: &str) -> SentinelResult<FailureStreak> {
        Ok(self
            .streaks
            .get(&(event_id, contact_id.to_string()))
            .map(|r| *r.value())
            .unwrap_or_default())
    }

    fn record_failure(
        &self,
        event_id: Uuid,
        contact_id: &str,
        count_threshold: u32,
    ) -> SentinelResult<(FailureStreak, bool)> {
        let mut entry = self
            .streaks
            .entry((event_id, contact_id.to_string()))
            .or_default();
        entry.count = entry.count.saturating_add(1);
        let newly_counted = entry.count >= count_threshold && !entry.counted;
        if newly_counted {
            entry.counted = true;
        }
        Ok((*entry, newly_counted))
    }

    fn clear_streak(&self, event_id: Uuid, contact_id: &str) -> SentinelResult<FailureStreak> {
        Ok(self
            .streaks
            .remove(&(event_id, contact_id.to_string()))
            .map(|(_, streak)| streak)
            .unwrap_or_default())
    }

    fn enrolled_contact_count(&self, campaign_id: Uuid) -> SentinelResult<u64> {
        self.campaigns
            .get(&campaign_id)
            .map(|r| r.enrolled_contacts)
            .ok_or(SentinelError::CampaignNotFound(campaign_id))
    }

    fn try_unpublish(&self, campaign_id: Uuid, expected_version: u64) -> SentinelResult<bool> {
        let mut entry = self
            .campaigns
            .get_mut(&campaign_id)
            .ok_or(SentinelError::CampaignNotFound(campaign_id))?;
        if entry.version != expected_version || !entry.is_published {
            return Ok(false);
        }
        entry.is_published = false;
        entry.version += 1;
        entry.updated_at = Utc::now();
        debug!(campaign_id = %campaign_id, version = entry.version, "Campaign unpublished");
        Ok(true)
    }

    fn set_published(&self, campaign_id: Uuid, published: bool) -> SentinelResult<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&campaign_id)
            .ok_or(SentinelError::CampaignNotFound(campaign_id))?;
        entry.is_published = published;
        entry.version += 1;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}
