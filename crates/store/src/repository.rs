use sentinel_core::types::{Campaign, CampaignEvent, FailureStreak};
use sentinel_core::SentinelResult;
use uuid::Uuid;

/// Storage contract consumed by the health monitor.
///
/// Counter mutations must be atomic at event granularity and
/// `try_unpublish` must be a compare-and-swap on the campaign version;
/// concurrent workers coordinate only through these guarantees, never
/// through in-process locks.
pub trait CampaignRepository: Send + Sync {
    fn insert_campaign(&self, campaign: Campaign) -> SentinelResult<()>;

    fn insert_event(&self, event: CampaignEvent) -> SentinelResult<()>;

    fn campaign(&self, id: Uuid) -> SentinelResult<Campaign>;

    fn event(&self, id: Uuid) -> SentinelResult<CampaignEvent>;

    /// All events belonging to the campaign, in no particular order.
    fn campaign_events(&self, campaign_id: Uuid) -> SentinelResult<Vec<CampaignEvent>>;

    fn failed_count(&self, event_id: Uuid) -> SentinelResult<u64>;

    /// Atomically adds one to the event's failure counter and returns the
    /// new value.
    fn increment_failed_count(&self, event_id: Uuid) -> SentinelResult<u64>;

    /// Atomically subtracts one from the event's failure counter, floor
    /// zero, and returns the new value.
    fn decrement_failed_count(&self, event_id: Uuid) -> SentinelResult<u64>;

    /// Zeroes the failure counter of every event in the campaign.
    fn reset_failed_counts(&self, campaign_id: Uuid) -> SentinelResult<()>;

    /// Current streak state for the (event, contact) pair. A pair that was
    /// never recorded reads as the default (count 0, not counted).
    fn failure_streak(&self, event_id: Uuid, contact_id: &str) -> SentinelResult<FailureStreak>;

    /// Atomically extends the contact's failure streak by one and, when the
    /// count first reaches `count_threshold`, marks the streak counted.
    /// Returns the post-update state and whether this call crossed the
    /// threshold. The decision happens in one conditional update, so
    /// concurrent callers on the same pair cross at most once.
    fn record_failure(
        &self,
        event_id: Uuid,
        contact_id: &str,
        count_threshold: u32,
    ) -> SentinelResult<(FailureStreak, bool)>;

    /// Atomically removes the streak after a successful execution and
    /// returns the state it held, so exactly one of any concurrent callers
    /// observes a counted streak.
    fn clear_streak(&self, event_id: Uuid, contact_id: &str) -> SentinelResult<FailureStreak>;

    fn enrolled_contact_count(&self, campaign_id: Uuid) -> SentinelResult<u64>;

    /// Compare-and-swap unpublish: flips `is_published` to false and bumps
    /// the version only if the stored version equals `expected_version`.
    /// Returns false when the version moved (another caller won).
    fn try_unpublish(&self, campaign_id: Uuid, expected_version: u64) -> SentinelResult<bool>;

    /// Writes a new publish state directly, bumping the version. Used by
    /// the (external) publish pipeline and by tests; the monitor itself
    /// only unpublishes via the CAS path.
    fn set_published(&self, campaign_id: Uuid, published: bool) -> SentinelResult<Campaign>;
}
