//! Publish-state transitions. The only transition this module performs is
//! published -> unpublished; the way back is a deliberate user action
//! handled elsewhere.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use sentinel_core::types::Campaign;
use sentinel_core::{SentinelError, SentinelResult};
use sentinel_store::CampaignRepository;

pub struct CampaignLifecycleController {
    repo: Arc<dyn CampaignRepository>,
}

impl CampaignLifecycleController {
    pub fn new(repo: Arc<dyn CampaignRepository>) -> Self {
        Self { repo }
    }

    /// Attempts the published -> unpublished transition with a version
    /// compare-and-swap, so exactly one of any number of concurrent callers
    /// wins. Losers get `AlreadyUnpublished` or `VersionMismatch`; both are
    /// expected race outcomes meaning "someone else already handled it".
    ///
    /// Returns the campaign as read before the transition, so the winner
    /// can report pre-unpublish state in its notification.
    pub fn try_auto_unpublish(&self, campaign_id: Uuid) -> SentinelResult<Campaign> {
        let campaign = self.repo.campaign(campaign_id)?;
        if !campaign.is_published {
            return Err(SentinelError::AlreadyUnpublished(campaign_id));
        }

        if !self.repo.try_unpublish(campaign_id, campaign.version)? {
            return Err(SentinelError::VersionMismatch(campaign_id));
        }

        metrics::counter!("sentinel.campaigns_unpublished").increment(1);
        info!(
            campaign_id = %campaign_id,
            name = %campaign.name,
            "Campaign auto-unpublished after repeated failures"
        );
        Ok(campaign)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sentinel_store::MemoryRepository;

    fn setup() -> (Arc<MemoryRepository>, CampaignLifecycleController, Uuid) {
        let repo = Arc::new(MemoryRepository::new());
        let campaign = Campaign::new("drip", 500);
        let id = campaign.id;
        repo.insert_campaign(campaign).unwrap();
        let controller = CampaignLifecycleController::new(repo.clone() as Arc<dyn CampaignRepository>);
        (repo, controller, id)
    }

    #[test]
    fn test_unpublish_once() {
        let (repo, controller, id) = setup();

        controller.try_auto_unpublish(id).unwrap();
        assert!(!repo.campaign(id).unwrap().is_published);

        let err = controller.try_auto_unpublish(id).unwrap_err();
        assert!(matches!(err, SentinelError::AlreadyUnpublished(_)));
    }

    #[test]
    fn test_missing_campaign_is_not_a_race() {
        let (_, controller, _) = setup();
        let err = controller.try_auto_unpublish(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, SentinelError::CampaignNotFound(_)));
        assert!(!err.is_race());
    }

    #[test]
    fn test_concurrent_unpublish_single_winner() {
        let (_, controller, id) = setup();
        let controller = Arc::new(controller);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let controller = Arc::clone(&controller);
                std::thread::spawn(move || controller.try_auto_unpublish(id).is_ok())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .filter(|&won| won)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_losers_observe_race_outcomes() {
        let (_, controller, id) = setup();
        let controller = Arc::new(controller);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let controller = Arc::clone(&controller);
                std::thread::spawn(move || controller.try_auto_unpublish(id))
            })
            .collect();

        for h in handles {
            match h.join().expect("worker panicked") {
                Ok(campaign) => assert!(campaign.is_published),
                Err(e) => assert!(e.is_race(), "unexpected error: {e}"),
            }
        }
    }
}
