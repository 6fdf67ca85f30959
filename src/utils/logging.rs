//! Logging configuration and subscriber setup

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::domain::errors::DomainError;
use crate::ports::LogLevel;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line format
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON lines for structured logging
    Json,
}

impl LogFormat {
    pub fn parse(format: &str) -> Result<Self, DomainError> {
        match format.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid log format: {}. Valid formats: pretty, compact, json",
                format
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

/// Logging configuration options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoggingConfig {
    /// Global log level, overridden per target by `RUST_LOG`
    pub level: LogLevel,
    pub format: LogFormat,
    /// Include target module information
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            target: false,
        }
    }
}

impl LoggingConfig {
    /// Build from the string values held by the config port
    pub fn from_values(level: &str, format: &str) -> Result<Self, DomainError> {
        Ok(Self {
            level: LogLevel::parse(level)?,
            format: LogFormat::parse(format)?,
            ..Self::default()
        })
    }

    /// Filter for the configured level; `RUST_LOG` wins when set
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
    }
}

/// Logging system manager
pub struct LoggingSystem {
    config: LoggingConfig,
}

impl LoggingSystem {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// Install the global subscriber. Logs go to stderr so stdout stays machine-readable.
    pub fn initialize(&self) -> Result<(), DomainError> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.config.env_filter())
            .with_target(self.config.target)
            .with_writer(std::io::stderr);

        let installed = match self.config.format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        installed.map_err(|e| {
            DomainError::InternalError(format!("Failed to install log subscriber: {}", e))
        })?;

        tracing::debug!(
            level = self.config.level.as_str(),
            format = self.config.format.as_str(),
            "Logging initialized"
        );
        Ok(())
    }

    /// Log version and platform once at startup
    pub fn log_system_info(&self) {
        tracing::debug!(
            version = env!("CARGO_PKG_VERSION"),
            os = std::env::consts::OS,
            "adcut starting"
        );
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_values() {
        let config = LoggingConfig::from_values("DEBUG", "json").unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.target);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(LoggingConfig::from_values("loud", "json").is_err());
        assert!(matches!(
            LogFormat::parse("xml"),
            Err(DomainError::BadArgs(_))
        ));
    }
}
