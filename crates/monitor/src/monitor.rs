//! Facade wiring the counter, threshold policy, lifecycle controller, and
//! dispatcher into the three hooks the execution pipeline calls.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use sentinel_core::config::MonitorConfig;
use sentinel_core::event_bus::{noop_sink, NotificationSink};
use sentinel_core::SentinelResult;
use sentinel_store::CampaignRepository;

use crate::counter::EventFailureCounter;
use crate::lifecycle::CampaignLifecycleController;
use crate::notify::NotificationDispatcher;
use crate::threshold::ThresholdEvaluator;

pub struct CampaignHealthMonitor {
    repo: Arc<dyn CampaignRepository>,
    counter: EventFailureCounter,
    evaluator: ThresholdEvaluator,
    lifecycle: CampaignLifecycleController,
    dispatcher: NotificationDispatcher,
}

impl CampaignHealthMonitor {
    /// Creates a monitor over the given repository with a no-op
    /// notification sink.
    pub fn new(repo: Arc<dyn CampaignRepository>, config: &MonitorConfig) -> Self {
        Self {
            counter: EventFailureCounter::new(repo.clone(), config.loops_to_fail),
            evaluator: ThresholdEvaluator::new(config),
            lifecycle: CampaignLifecycleController::new(repo.clone()),
            dispatcher: NotificationDispatcher::new(noop_sink()),
            repo,
        }
    }

    /// Attach a notification sink for failure/unpublish notifications.
    pub fn with_notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.dispatcher = NotificationDispatcher::new(sink);
        self
    }

    /// Called after each failed execution attempt. Updates the failure
    /// count, emits the failure notification, and unpublishes the campaign
    /// when the failure rate crosses the threshold. Losing a concurrent
    /// unpublish race is logged at debug and is not an error.
    pub fn on_event_failed(&self, event_id: Uuid, contact_id: &str) -> SentinelResult<()> {
        let event = self.repo.event(event_id)?;
        let failed_count = self.counter.increment_if_eligible(event_id, contact_id)?;

        self.dispatcher
            .notify_failure(event.campaign_id, event_id, contact_id);

        let enrolled = self.repo.enrolled_contact_count(event.campaign_id)?;
        if !self.evaluator.should_disable(failed_count, enrolled) {
            return Ok(());
        }

        match self.lifecycle.try_auto_unpublish(event.campaign_id) {
            Ok(campaign) => {
                info!(
                    campaign_id = %campaign.id,
                    event_id = %event_id,
                    failed_count,
                    enrolled,
                    "Failure threshold crossed"
                );
                self.dispatcher.notify_unpublish(
                    campaign.id,
                    event_id,
                    failed_count,
                    campaign.enrolled_contacts,
                );
                Ok(())
            }
            Err(e) if e.is_race() => {
                debug!(campaign_id = %event.campaign_id, outcome = %e, "Unpublish already handled");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Called after each successful execution attempt.
    pub fn on_event_executed(&self, event_id: Uuid, contact_id: &str) -> SentinelResult<()> {
        self.counter.decrement_if_recovered(event_id, contact_id)?;
        Ok(())
    }

    /// Called before a publish-state change is persisted. Counters reset
    /// exactly on the unpublished-to-published transition.
    pub fn on_campaign_pre_publish(
        &self,
        campaign_id: Uuid,
        was_published: bool,
        will_be_published: bool,
    ) -> SentinelResult<()> {
        if !was_published && will_be_published {
            info!(campaign_id = %campaign_id, "Campaign (re)published, resetting failure counters");
            self.counter.reset_for_campaign(campaign_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sentinel_core::event_bus::capture_sink;
    use sentinel_core::types::{Campaign, CampaignEvent, EventKind, NotificationKind};
    use sentinel_store::MemoryRepository;

    struct Fixture {
        repo: Arc<MemoryRepository>,
        monitor: CampaignHealthMonitor,
        sink: Arc<sentinel_core::event_bus::CaptureSink>,
        campaign_id: Uuid,
        event_id: Uuid,
    }

    /// Campaign with `enrolled` contacts and one action event. Streaks of
    /// `loops_to_fail` keep tests fast; the policy constants stay default.
    fn fixture(enrolled: u64, loops_to_fail: u32) -> Fixture {
        let repo = Arc::new(MemoryRepository::new());
        let campaign = Campaign::new("welcome-flow", enrolled);
        let event = CampaignEvent::new(campaign.id, "send-email", EventKind::Action);
        repo.insert_campaign(campaign.clone()).unwrap();
        repo.insert_event(event.clone()).unwrap();

        let config = MonitorConfig {
            loops_to_fail,
            ..MonitorConfig::default()
        };
        let sink = capture_sink();
        let monitor = CampaignHealthMonitor::new(repo.clone() as Arc<dyn CampaignRepository>, &config)
            .with_notification_sink(sink.clone());

        Fixture {
            repo,
            monitor,
            sink,
            campaign_id: campaign.id,
            event_id: event.id,
        }
    }

    /// Drives `contacts` distinct contacts each to a counted failure.
    fn fail_contacts(f: &Fixture, contacts: u64, loops: u32) {
        for c in 0..contacts {
            let contact = format!("c-{c}");
            for _ in 0..loops {
                f.monitor.on_event_failed(f.event_id, &contact).unwrap();
            }
        }
    }

    #[test]
    fn test_threshold_crossing_unpublishes_once() {
        let f = fixture(100, 2);

        fail_contacts(&f, 35, 2);

        assert!(!f.repo.campaign(f.campaign_id).unwrap().is_published);
        assert_eq!(f.sink.count_kind(NotificationKind::CampaignUnpublished), 1);

        // Further failures do not fire a second notification.
        for _ in 0..2 {
            f.monitor.on_event_failed(f.event_id, "c-late").unwrap();
        }
        assert_eq!(f.sink.count_kind(NotificationKind::CampaignUnpublished), 1);
    }

    #[test]
    fn test_below_threshold_stays_published() {
        let f = fixture(100, 2);

        fail_contacts(&f, 34, 2);

        assert!(f.repo.campaign(f.campaign_id).unwrap().is_published);
        assert_eq!(f.sink.count_kind(NotificationKind::CampaignUnpublished), 0);
    }

    #[test]
    fn test_small_campaign_never_unpublished() {
        let f = fixture(99, 2);

        // Every single contact failing is still not enough.
        fail_contacts(&f, 99, 2);

        assert!(f.repo.campaign(f.campaign_id).unwrap().is_published);
    }

    #[test]
    fn test_failure_notifications_emitted_per_attempt() {
        let f = fixture(100, 3);

        for _ in 0..5 {
            f.monitor.on_event_failed(f.event_id, "c-1").unwrap();
        }
        assert_eq!(f.sink.count_kind(NotificationKind::EventFailed), 5);
    }

    #[test]
    fn test_recovery_path() {
        let f = fixture(100, 2);

        fail_contacts(&f, 34, 2);
        // Contact 35 gets counted, then recovers before anything new fails.
        fail_contacts(&f, 35, 2);
        assert!(!f.repo.campaign(f.campaign_id).unwrap().is_published);

        // Recovery still decrements the counter on the unpublished campaign.
        f.monitor.on_event_executed(f.event_id, "c-34").unwrap();
        assert_eq!(f.repo.failed_count(f.event_id).unwrap(), 34);
    }

    #[test]
    fn test_pre_publish_resets_counters() {
        let f = fixture(100, 2);

        fail_contacts(&f, 10, 2);
        assert_eq!(f.repo.failed_count(f.event_id).unwrap(), 10);

        // unpublished -> published resets.
        f.monitor
            .on_campaign_pre_publish(f.campaign_id, false, true)
            .unwrap();
        assert_eq!(f.repo.failed_count(f.event_id).unwrap(), 0);
    }

    #[test]
    fn test_pre_publish_other_transitions_keep_counters() {
        let f = fixture(100, 2);

        fail_contacts(&f, 10, 2);

        for (was, will) in [(true, true), (true, false), (false, false)] {
            f.monitor
                .on_campaign_pre_publish(f.campaign_id, was, will)
                .unwrap();
            assert_eq!(f.repo.failed_count(f.event_id).unwrap(), 10);
        }
    }

    #[test]
    fn test_concurrent_failures_single_unpublish_notification() {
        let f = fixture(100, 1);

        // 34 contacts counted; one more crossing fires the transition.
        fail_contacts(&f, 34, 1);

        let monitor = Arc::new(f.monitor);
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let monitor = Arc::clone(&monitor);
                let event_id = f.event_id;
                std::thread::spawn(move || {
                    let contact = format!("c-racer-{worker}");
                    monitor.on_event_failed(event_id, &contact).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(!f.repo.campaign(f.campaign_id).unwrap().is_published);
        assert_eq!(f.sink.count_kind(NotificationKind::CampaignUnpublished), 1);
    }
}
