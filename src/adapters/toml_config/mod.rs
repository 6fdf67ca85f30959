// TOML config adapter - Configuration management using TOML files

use crate::domain::errors::*;
use crate::domain::model::{Resolution, RenderSettings};
use crate::ports::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Section holding adcut settings in the config file
const SECTION: &str = "adcut";

/// Built-in defaults, lowest precedence
pub fn default_entries() -> Vec<(&'static str, String)> {
    let render = RenderSettings::default();
    vec![
        ("log_level", "info".to_string()),
        ("log_format", "pretty".to_string()),
        ("resolution", render.resolution.to_string()),
        ("framerate", render.framerate.to_string()),
        ("codec", render.codec),
        ("bitrate", render.bitrate.to_string()),
        ("tick_ms", "40".to_string()),
    ]
}

/// TOML configuration adapter
pub struct TomlConfigAdapter {
    config: Arc<RwLock<HashMap<String, String>>>,
    config_file_path: Arc<RwLock<Option<PathBuf>>>,
}

impl TomlConfigAdapter {
    /// Create new TOML config adapter seeded with defaults
    pub fn new() -> Result<Self, DomainError> {
        let config = default_entries()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_file_path: Arc::new(RwLock::new(None)),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, String>>, DomainError> {
        self.config
            .read()
            .map_err(|_| DomainError::InternalError("Config lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, String>>, DomainError> {
        self.config
            .write()
            .map_err(|_| DomainError::InternalError("Config lock poisoned".to_string()))
    }

    fn remember_path(&self, path: PathBuf) -> Result<(), DomainError> {
        let mut config_path = self
            .config_file_path
            .write()
            .map_err(|_| DomainError::InternalError("Config lock poisoned".to_string()))?;
        *config_path = Some(path);
        Ok(())
    }

    /// Get default config file path
    fn get_default_config_path() -> PathBuf {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(xdg).join("adcut").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("adcut")
                .join("config.toml")
        } else {
            PathBuf::from("adcut.toml")
        }
    }

    /// Serialize config to TOML string
    fn serialize_config(&self) -> Result<String, DomainError> {
        let config = self.read()?;
        let mut table = toml::map::Map::new();
        let mut keys: Vec<&String> = config.keys().collect();
        keys.sort();
        for key in keys {
            table.insert(key.clone(), toml::Value::String(config[key].clone()));
        }
        let mut root = toml::map::Map::new();
        root.insert(SECTION.to_string(), toml::Value::Table(table));
        toml::to_string(&toml::Value::Table(root))
            .map_err(|e| DomainError::InternalError(format!("Failed to serialize config: {}", e)))
    }

    /// Deserialize config from TOML string
    fn deserialize_config(&self, toml_content: &str) -> Result<(), DomainError> {
        let parsed: toml::Value = toml::from_str(toml_content)
            .map_err(|e| DomainError::BadArgs(format!("Failed to parse TOML config: {}", e)))?;

        let mut config = self.write()?;
        if let Some(table) = parsed.get(SECTION).and_then(|s| s.as_table()) {
            for (key, value) in table {
                let scalar = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    _ => {
                        tracing::warn!(key = %key, "Ignoring non-scalar config value");
                        continue;
                    }
                };
                config.insert(key.clone(), scalar);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ConfigPort for TomlConfigAdapter {
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError> {
        Ok(self
            .read()?
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.write()?.insert(key.to_string(), value.to_string());
        tracing::debug!("Set config {} = {}", key, value);
        Ok(())
    }

    async fn load_config(&self, file_path: &str) -> Result<(), DomainError> {
        let path = PathBuf::from(file_path);

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DomainError::StorageFailed(format!("Failed to read config file {}: {}", file_path, e))
        })?;

        self.deserialize_config(&content)?;
        self.remember_path(path)?;
        tracing::info!("Loaded configuration from {}", file_path);
        Ok(())
    }

    async fn save_config(&self, file_path: &str) -> Result<(), DomainError> {
        let path = PathBuf::from(file_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::StorageFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = self.serialize_config()?;
        tokio::fs::write(&path, content).await.map_err(|e| {
            DomainError::StorageFailed(format!("Failed to write config file: {}", e))
        })?;

        self.remember_path(path)
    }

    async fn load_default_config(&self) -> Result<(), DomainError> {
        let mut config = self.write()?;
        for (key, value) in default_entries() {
            config.insert(key.to_string(), value);
        }
        Ok(())
    }

    async fn validate_config(&self) -> Result<(), DomainError> {
        let config = self.read()?;

        if let Some(log_level) = config.get("log_level") {
            LogLevel::parse(log_level)?;
        }

        if let Some(format) = config.get("log_format") {
            if !matches!(format.as_str(), "pretty" | "compact" | "json") {
                return Err(DomainError::BadArgs(format!(
                    "Invalid log format: {}. Valid formats: pretty, compact, json",
                    format
                )));
            }
        }

        if let Some(resolution) = config.get("resolution") {
            Resolution::parse(resolution)?;
        }

        if let Some(framerate) = config.get("framerate") {
            let value: f64 = framerate
                .parse()
                .map_err(|e| DomainError::BadArgs(format!("Invalid framerate: {}", e)))?;
            if !(value > 0.0 && value <= 240.0) {
                return Err(DomainError::BadArgs(format!(
                    "Frame rate must be in (0, 240], got {}",
                    value
                )));
            }
        }

        for key in ["bitrate", "tick_ms"] {
            if let Some(value) = config.get(key) {
                let parsed: u64 = value.parse().map_err(|e| {
                    DomainError::BadArgs(format!("Invalid value for {}: {}", key, e))
                })?;
                if parsed == 0 {
                    return Err(DomainError::BadArgs(format!("{} must be positive", key)));
                }
            }
        }

        Ok(())
    }

    async fn get_all_config_keys(&self) -> Result<Vec<String>, DomainError> {
        let mut keys: Vec<String> = self.read()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn get_config_file_path(&self) -> Result<String, DomainError> {
        let config_path = self
            .config_file_path
            .read()
            .map_err(|_| DomainError::InternalError("Config lock poisoned".to_string()))?;
        Ok(config_path
            .clone()
            .unwrap_or_else(Self::get_default_config_path)
            .to_string_lossy()
            .to_string())
    }
}
