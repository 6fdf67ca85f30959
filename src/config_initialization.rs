//! Configuration initialization and hierarchy management

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::TomlConfigAdapter;
use crate::cli::Cli;
use crate::ports::ConfigPort;
use crate::utils::logging::LoggingConfig;

/// Environment variables and the config keys they override
pub const ENV_MAPPINGS: &[(&str, &str)] = &[
    ("ADCUT_LOG_LEVEL", "log_level"),
    ("ADCUT_LOG_FORMAT", "log_format"),
    ("ADCUT_RESOLUTION", "resolution"),
    ("ADCUT_FRAMERATE", "framerate"),
    ("ADCUT_CODEC", "codec"),
    ("ADCUT_BITRATE", "bitrate"),
    ("ADCUT_TICK_MS", "tick_ms"),
];

/// Effective configuration and where it came from
pub struct ConfigurationHierarchy {
    pub port: Arc<TomlConfigAdapter>,
    /// File that was loaded, if any
    pub file: Option<String>,
    pub env_overrides: usize,
    pub cli_overrides: usize,
}

impl ConfigurationHierarchy {
    /// Logging settings from the effective configuration
    pub async fn logging_config(&self) -> Result<LoggingConfig> {
        let level = self.port.get_config_or_default("log_level", "info").await?;
        let format = self.port.get_config_or_default("log_format", "pretty").await?;
        Ok(LoggingConfig::from_values(&level, &format)?)
    }

    /// Report the sources once logging is up
    pub fn log_summary(&self) {
        match &self.file {
            Some(file) => info!(file = %file, "Configuration file loaded"),
            None => debug!("No configuration file loaded"),
        }
        if self.env_overrides > 0 {
            info!("Applied {} environment variable overrides", self.env_overrides);
        }
        if self.cli_overrides > 0 {
            info!("Applied {} CLI configuration overrides", self.cli_overrides);
        }
    }
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub async fn initialize_configuration_hierarchy(cli: &Cli) -> Result<ConfigurationHierarchy> {
    initialize_with_env(cli, |key| std::env::var(key).ok()).await
}

/// Same as [`initialize_configuration_hierarchy`] with an injectable environment
pub async fn initialize_with_env(
    cli: &Cli,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ConfigurationHierarchy> {
    // Step 1: defaults are seeded by TomlConfigAdapter::new()
    let port = TomlConfigAdapter::new()?;

    // Step 2: file
    let file = load_config_file(&port, cli.config.as_deref()).await?;

    // Step 3: environment
    let env_overrides = apply_environment_overrides(&port, env).await?;

    // Step 4: CLI
    let cli_overrides = apply_cli_configuration_overrides(&port, cli).await?;

    port.validate_config().await.context("Invalid configuration")?;
    Ok(ConfigurationHierarchy {
        port: Arc::new(port),
        file,
        env_overrides,
        cli_overrides,
    })
}

/// Load the explicit file, or the default one when it exists
async fn load_config_file(port: &dyn ConfigPort, explicit: Option<&str>) -> Result<Option<String>> {
    if let Some(path) = explicit {
        port.load_config(path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", path))?;
        return Ok(Some(path.to_string()));
    }

    let default_path = port.get_config_file_path().await?;
    if Path::new(&default_path).is_file() {
        port.load_config(&default_path)
            .await
            .with_context(|| format!("Failed to load configuration from {}", default_path))?;
        return Ok(Some(default_path));
    }
    Ok(None)
}

/// Load environment variables and apply to configuration
async fn apply_environment_overrides(
    port: &dyn ConfigPort,
    env: impl Fn(&str) -> Option<String>,
) -> Result<usize> {
    let mut env_overrides = 0;
    for (env_var, config_key) in ENV_MAPPINGS {
        if let Some(value) = env(env_var) {
            port.set_config(config_key, &value).await?;
            env_overrides += 1;
        }
    }
    Ok(env_overrides)
}

/// Apply CLI argument overrides to configuration
async fn apply_cli_configuration_overrides(port: &dyn ConfigPort, cli: &Cli) -> Result<usize> {
    let mut cli_overrides = 0;
    if let Some(level) = &cli.log_level {
        port.set_config("log_level", level).await?;
        cli_overrides += 1;
    }
    if let Some(format) = &cli.log_format {
        port.set_config("log_format", format).await?;
        cli_overrides += 1;
    }
    Ok(cli_overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::LogLevel;
    use crate::utils::logging::LogFormat;
    use clap::Parser;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["adcut"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["inspect", "project.yaml"]);
        Cli::try_parse_from(argv).unwrap()
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[tokio::test]
    async fn test_cli_beats_env_beats_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("adcut.toml");
        std::fs::write(
            &path,
            "[adcut]\nlog_level = \"warn\"\ncodec = \"vp9\"\nbitrate = 1000000\n",
        )
        .unwrap();
        let path = path.to_str().unwrap();

        let hierarchy = initialize_with_env(
            &cli(&["--config", path, "--log-level", "debug"]),
            env(&[("ADCUT_LOG_LEVEL", "error"), ("ADCUT_CODEC", "hevc")]),
        )
        .await
        .unwrap();

        let port = &hierarchy.port;
        assert_eq!(port.get_config("log_level").await.unwrap().as_deref(), Some("debug"));
        assert_eq!(port.get_config("codec").await.unwrap().as_deref(), Some("hevc"));
        assert_eq!(port.get_config("bitrate").await.unwrap().as_deref(), Some("1000000"));
        assert_eq!(port.get_config("tick_ms").await.unwrap().as_deref(), Some("40"));
        assert_eq!(hierarchy.file.as_deref(), Some(path));
        assert_eq!(hierarchy.env_overrides, 2);
        assert_eq!(hierarchy.cli_overrides, 1);

        let logging = hierarchy.logging_config().await.unwrap();
        assert_eq!(logging.level, LogLevel::Debug);
        assert_eq!(logging.format, LogFormat::Pretty);
    }

    #[tokio::test]
    async fn test_invalid_override_fails_validation() {
        let result = initialize_with_env(&cli(&[]), env(&[("ADCUT_FRAMERATE", "0")])).await;
        assert!(result.is_err());

        let result = initialize_with_env(&cli(&["--log-format", "xml"]), env(&[])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_an_error() {
        let result = initialize_with_env(&cli(&["--config", "/nonexistent/adcut.toml"]), env(&[])).await;
        assert!(result.is_err());
    }
}
