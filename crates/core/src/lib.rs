//! Shared model types, error taxonomy, notification bus, and configuration
//! for the Campaign Sentinel health-monitoring core.

pub mod config;
pub mod error;
pub mod event_bus;
pub mod types;

pub use config::{AppConfig, MonitorConfig};
pub use error::{SentinelError, SentinelResult};
