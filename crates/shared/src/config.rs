//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Workflow engine configuration.
    #[serde(default)]
    pub workflow: WorkflowSettings,
    /// Notification rendering configuration.
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Workflow engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSettings {
    /// Prefix for generated audit serial numbers.
    #[serde(default = "default_serial_prefix")]
    pub serial_prefix: String,
    /// Expected processing duration for steps that do not declare one, in hours.
    #[serde(default = "default_step_duration_hours")]
    pub default_step_duration_hours: i64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            serial_prefix: default_serial_prefix(),
            default_step_duration_hours: default_step_duration_hours(),
        }
    }
}

fn default_serial_prefix() -> String {
    "WF".to_string()
}

fn default_step_duration_hours() -> i64 {
    24
}

/// Notification rendering configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    /// Base URL used to build deep links into the approval UI.
    #[serde(default = "default_deep_link_base")]
    pub deep_link_base: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            deep_link_base: default_deep_link_base(),
        }
    }
}

fn default_deep_link_base() -> String {
    "/audits".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ACUMEN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
