//! Process-wide logger settings.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::schema::LoggerConfig;

/// Environment variable used when no service name is configured.
pub const HOSTNAME_ENV: &str = "HOSTNAME";

/// Immutable settings shared by the record builder, sink and lifecycle.
#[derive(Debug, Clone)]
pub struct Settings {
    service_name: Option<String>,
    shutdown_timeout: Duration,
    exclude: HashSet<String>,
    disabled: bool,
}

impl Settings {
    /// Build settings from config, reading `HOSTNAME` as the name fallback.
    pub fn from_config(config: &LoggerConfig) -> Self {
        Self::with_host(config, std::env::var(HOSTNAME_ENV).ok())
    }

    /// Build settings with an explicit host fallback.
    pub fn with_host(config: &LoggerConfig, host: Option<String>) -> Self {
        let service_name = config
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| host.filter(|h| !h.is_empty()));

        Self {
            service_name,
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout),
            exclude: config.exclude.iter().cloned().collect(),
            disabled: config.disabled,
        }
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.contains(path)
    }

    pub fn disabled(&self) -> bool {
        self.disabled
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_host(&LoggerConfig::default(), None)
    }
}
