//! Errors raised while loading a procdesk project.
//!
//! A project is `.procdesk/config.toml` (the client config) plus the
//! process scripts under `.procdesk/processes/`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A client config or process script could not be read.
    #[error("Failed to read procdesk file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed client config {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Malformed process script {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Failed to scan process scripts in {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// The project parses but cannot run, e.g. a script has no steps.
    #[error("Invalid procdesk project at {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
