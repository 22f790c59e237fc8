use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `SENTINEL__` and TOML config files.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            monitor: MonitorConfig::default(),
        }
    }
}

/// Tuning for the failure-threshold control loop. The defaults mirror the
/// production constants: a contact must fail an event 100 consecutive
/// times to count, and a campaign with at least 100 enrolled contacts is
/// unpublished once 35% of them are counted as failing.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Consecutive failures by one contact before it counts against the
    /// event's failure total.
    #[serde(default = "default_loops_to_fail")]
    pub loops_to_fail: u32,
    /// Failure ratio at or above which a published campaign is disabled.
    #[serde(default = "default_disable_threshold")]
    pub disable_threshold: f64,
    /// Campaigns with fewer enrolled contacts than this are never
    /// auto-unpublished.
    #[serde(default = "default_min_contacts_for_disable")]
    pub min_contacts_for_disable: u64,
}

fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_loops_to_fail() -> u32 {
    100
}
fn default_disable_threshold() -> f64 {
    0.35
}
fn default_min_contacts_for_disable() -> u64 {
    100
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            loops_to_fail: default_loops_to_fail(),
            disable_threshold: default_disable_threshold(),
            min_contacts_for_disable: default_min_contacts_for_disable(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and optional config file.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SENTINEL")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
