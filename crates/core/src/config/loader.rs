//! Configuration file loader for `.procdesk/` directory structure.
//!
//! This module provides functionality to load and parse all configuration files
//! from the `.procdesk/` directory, including:
//! - `config.toml`: Client settings
//! - `processes/*.yaml`: Scripted process definitions

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use pd_protocol::config_models::ClientConfig;
use pd_protocol::script_models::ProcessScript;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Name of the configuration directory below the project root.
pub const CONFIG_DIR: &str = ".procdesk";

/// Loads all configuration from the `.procdesk/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.procdesk/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. If directories or files
/// are missing (but the root exists), returns an empty/default configuration
/// rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid syntax (TOML or YAML)
/// - A script has no steps or two scripts share a name
///
/// # Example
///
/// ```rust,no_run
/// use pd_core::config::loader::load_config;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("."))?;
/// println!("Loaded {} process scripts", config.scripts.len());
/// # Ok(())
/// # }
/// ```
pub fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let pd_dir = root.join(CONFIG_DIR);

    if !pd_dir.exists() {
        debug!(path = %pd_dir.display(), "no configuration directory, using defaults");
        return Ok(AppConfig::default());
    }

    let client = load_client_config(&pd_dir)?;
    let scripts = load_scripts(&pd_dir)?;

    Ok(AppConfig { client, scripts })
}

/// Loads client settings from `config.toml`.
fn load_client_config(pd_dir: &Path) -> ConfigResult<ClientConfig> {
    let config_path = pd_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(ClientConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let config: ClientConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    if config.main_process.trim().is_empty() {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "main_process must not be empty".to_string(),
        });
    }

    Ok(config)
}

/// Loads all process scripts from `processes/*.yaml`.
fn load_scripts(pd_dir: &Path) -> ConfigResult<Vec<ProcessScript>> {
    let scripts_dir = pd_dir.join("processes");

    if !scripts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut scripts = Vec::new();
    let mut names = HashSet::new();

    // Sorted so that load order does not depend on the file system.
    for entry in WalkDir::new(&scripts_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: scripts_dir.clone(),
            source,
        })?;

        let path = entry.path();

        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let script: ProcessScript =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?;

        if script.steps.is_empty() {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: format!("process '{}' has no steps", script.name),
            });
        }

        if !names.insert(script.name.clone()) {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: format!("duplicate process name '{}'", script.name),
            });
        }

        debug!(process = %script.name, steps = script.steps.len(), "loaded process script");
        scripts.push(script);
    }

    Ok(scripts)
}
