//! Configuration loading from disk.
//!
//! Values are merged field by field over the defaults: a key that is missing
//! or has the wrong shape keeps its default and is reported as a diagnostic.
//! Only unreadable files and TOML syntax errors surface as `ConfigError`.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::config::schema::AppConfig;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse TOML text and merge it over the defaults.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let root: Table = content.parse()?;
    Ok(merge(&root))
}

/// Load configuration if a path is given, falling back to defaults on any error.
pub fn load_or_default(path: Option<&Path>) -> AppConfig {
    let Some(path) = path else {
        return AppConfig::default();
    };

    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Using default configuration");
            AppConfig::default()
        }
    }
}

fn merge(root: &Table) -> AppConfig {
    let mut config = AppConfig::default();

    if let Some(listener) = section(root, "listener") {
        if let Some(bind_address) = field(listener, "listener", &["bind_address"]) {
            config.listener.bind_address = bind_address;
        }
    }

    if let Some(logger) = section(root, "logger") {
        let target = &mut config.logger;
        if let Some(name) = field::<String>(logger, "logger", &["name"]) {
            target.name = Some(name).filter(|n| !n.is_empty());
        }
        if let Some(timeout) = field(logger, "logger", &["shutdown_timeout", "shutdownTimeout"]) {
            target.shutdown_timeout = timeout;
        }
        if let Some(exclude) = field(logger, "logger", &["exclude"]) {
            target.exclude = exclude;
        }
        if let Some(disabled) = field(logger, "logger", &["disabled"]) {
            target.disabled = disabled;
        }
    }

    if let Some(observability) = section(root, "observability") {
        let target = &mut config.observability;
        if let Some(level) = field(observability, "observability", &["log_level"]) {
            target.log_level = level;
        }
        if let Some(enabled) = field(observability, "observability", &["metrics_enabled"]) {
            target.metrics_enabled = enabled;
        }
        if let Some(address) = field(observability, "observability", &["metrics_address"]) {
            target.metrics_address = address;
        }
    }

    config
}

fn section<'a>(root: &'a Table, name: &str) -> Option<&'a Table> {
    match root.get(name) {
        Some(Value::Table(table)) => Some(table),
        Some(other) => {
            tracing::warn!(section = name, found = other.type_str(), "Ignoring malformed section");
            None
        }
        None => None,
    }
}

fn field<T: DeserializeOwned>(table: &Table, section: &str, keys: &[&str]) -> Option<T> {
    let (key, value) = keys
        .iter()
        .find_map(|key| table.get(*key).map(|value| (*key, value)))?;

    match value.clone().try_into() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(section, key, error = %e, "Ignoring malformed setting, keeping default");
            None
        }
    }
}
