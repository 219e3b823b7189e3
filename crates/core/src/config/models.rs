//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! client settings and scripted process definitions into a single
//! configuration object.

use pd_protocol::config_models::ClientConfig;
use pd_protocol::script_models::ProcessScript;

/// Unified application configuration loaded from `.procdesk/` directory.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Client settings
/// - `processes/*.yaml`: Scripted process definitions
///
/// # Example
///
/// ```rust,no_run
/// use pd_core::config::loader::load_config;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("."))?;
/// println!("Main process {} with {} scripts",
///          config.client.main_process,
///          config.scripts.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Client settings from `config.toml`.
    pub client: ClientConfig,

    /// All process scripts loaded from `processes/*.yaml`.
    pub scripts: Vec<ProcessScript>,
}

impl AppConfig {
    /// Look up a script by process name.
    pub fn script(&self, name: &str) -> Option<&ProcessScript> {
        self.scripts.iter().find(|s| s.name == name)
    }
}
