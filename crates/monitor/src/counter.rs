//! Distinct-contact failure counting. A campaign may push the same contact
//! through an event node thousands of times (scheduled retries), so raw
//! per-execution counting would wildly overstate impact. A contact counts
//! against an event only once its consecutive-failure streak reaches the
//! configured loop threshold, and is un-counted on its first success after.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use sentinel_core::SentinelResult;
use sentinel_store::CampaignRepository;

pub struct EventFailureCounter {
    repo: Arc<dyn CampaignRepository>,
    loops_to_fail: u32,
}

impl EventFailureCounter {
    pub fn new(repo: Arc<dyn CampaignRepository>, loops_to_fail: u32) -> Self {
        Self {
            repo,
            loops_to_fail,
        }
    }

    /// Records one failed execution attempt and returns the event's current
    /// failure count. The counter moves only when the contact's streak
    /// first reaches the loop threshold; repeat failures past that point
    /// are already counted and do not move it again. Crossing is decided
    /// inside the repository's conditional update, so concurrent failures
    /// for the same contact count at most once.
    pub fn increment_if_eligible(&self, event_id: Uuid, contact_id: &str) -> SentinelResult<u64> {
        let (streak, newly_counted) =
            self.repo.record_failure(event_id, contact_id, self.loops_to_fail)?;

        if !newly_counted {
            return self.repo.failed_count(event_id);
        }

        let count = self.repo.increment_failed_count(event_id)?;
        metrics::counter!("sentinel.failures_counted").increment(1);
        debug!(
            event_id = %event_id,
            contact_id = %contact_id,
            streak = streak.count,
            failed_count = count,
            "Contact counted as persistently failing"
        );
        Ok(count)
    }

    /// Records one successful execution and returns the event's current
    /// failure count. Decrements by exactly one, floor zero, when this
    /// contact was previously counted; always ends the failure streak.
    /// The atomic clear hands the counted flag to exactly one caller.
    pub fn decrement_if_recovered(&self, event_id: Uuid, contact_id: &str) -> SentinelResult<u64> {
        let streak = self.repo.clear_streak(event_id, contact_id)?;

        if !streak.counted {
            return self.repo.failed_count(event_id);
        }

        let count = self.repo.decrement_failed_count(event_id)?;
        metrics::counter!("sentinel.failures_recovered").increment(1);
        debug!(
            event_id = %event_id,
            contact_id = %contact_id,
            failed_count = count,
            "Contact recovered"
        );
        Ok(count)
    }

    /// Zeroes every event counter in the campaign. Invoked exactly on the
    /// unpublished-to-published transition.
    pub fn reset_for_campaign(&self, campaign_id: Uuid) -> SentinelResult<()> {
        self.repo.reset_failed_counts(campaign_id)
    }
}
