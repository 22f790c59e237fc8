//! Campaign health monitor — the failure-threshold / auto-unpublish control
//! loop. Tracks per-contact failure streaks, counts persistent failures per
//! campaign event, and unpublishes a campaign once too large a share of its
//! enrolled contacts is persistently failing.

pub mod counter;
pub mod lifecycle;
pub mod monitor;
pub mod notify;
pub mod threshold;

pub use counter::EventFailureCounter;
pub use lifecycle::CampaignLifecycleController;
pub use monitor::CampaignHealthMonitor;
pub use notify::NotificationDispatcher;
pub use threshold::ThresholdEvaluator;
