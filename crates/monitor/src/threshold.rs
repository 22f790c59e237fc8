//! Decides when a campaign's failure rate warrants disabling it.

use sentinel_core::config::MonitorConfig;

/// Stateless policy: a campaign is disabled once at least 35% of a
/// statistically meaningful population (100+ enrolled contacts) is
/// persistently failing. Both constants come from `MonitorConfig`.
#[derive(Debug, Clone)]
pub struct ThresholdEvaluator {
    disable_threshold: f64,
    min_contacts_for_disable: u64,
}

impl ThresholdEvaluator {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            disable_threshold: config.disable_threshold,
            min_contacts_for_disable: config.min_contacts_for_disable,
        }
    }

    /// Whether the campaign should be auto-unpublished. The minimum-contacts
    /// gate is checked first, so an empty campaign can never be disabled
    /// regardless of the ratio fallback below.
    pub fn should_disable(&self, failed_count: u64, enrolled_contacts: u64) -> bool {
        if enrolled_contacts < self.min_contacts_for_disable {
            return false;
        }
        self.failure_ratio(failed_count, enrolled_contacts) >= self.disable_threshold
    }

    /// Share of enrolled contacts persistently failing. An empty campaign
    /// reads as 1.0 so that direct callers fail safe.
    pub fn failure_ratio(&self, failed_count: u64, enrolled_contacts: u64) -> f64 {
        if enrolled_contacts == 0 {
            return 1.0;
        }
        failed_count as f64 / enrolled_contacts as f64
    }
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}
