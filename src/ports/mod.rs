// Ports - Interface definitions (contracts)

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::session::SessionSnapshot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for the analysis collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub source: String,
    pub duration: f64,
    pub campaign_goal: CampaignGoal,
    pub target_audience: TargetAudience,
}

/// Port for machine analysis of the loaded media
#[async_trait]
pub trait AnalysisPort: Send + Sync {
    /// Analyze media and return an untrusted suggestion payload
    async fn analyze(&self, request: &AnalysisRequest) -> Result<serde_json::Value, DomainError>;
}

/// Everything the renderer needs, owned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub snapshot: SessionSnapshot,
    pub settings: RenderSettings,
    pub requested_at: DateTime<Utc>,
}

/// Renderer completion report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    pub output: String,
    pub clips_rendered: usize,
    pub duration: f64,
    pub finished_at: DateTime<Utc>,
}

/// Port for rendering an exported session
#[async_trait]
pub trait RenderPort: Send + Sync {
    /// Render the job. No partial output is promised on failure.
    async fn render(&self, job: &RenderJob) -> Result<RenderReport, DomainError>;
}

/// Port for persisting project snapshots
#[async_trait]
pub trait ProjectStorePort: Send + Sync {
    async fn load(&self, path: &str) -> Result<SessionSnapshot, DomainError>;

    async fn save(&self, path: &str, snapshot: &SessionSnapshot) -> Result<(), DomainError>;
}

/// Port for configuration management
#[async_trait]
pub trait ConfigPort: Send + Sync {
    /// Get configuration value
    async fn get_config(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Get configuration value with default
    async fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, DomainError>;

    /// Set configuration value
    async fn set_config(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Load configuration from file
    async fn load_config(&self, file_path: &str) -> Result<(), DomainError>;

    /// Save configuration to file
    async fn save_config(&self, file_path: &str) -> Result<(), DomainError>;

    /// Load default configuration
    async fn load_default_config(&self) -> Result<(), DomainError>;

    /// Validate configuration
    async fn validate_config(&self) -> Result<(), DomainError>;

    /// Get all configuration keys
    async fn get_all_config_keys(&self) -> Result<Vec<String>, DomainError>;

    /// Get configuration file path
    async fn get_config_file_path(&self) -> Result<String, DomainError>;
}

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from string
    pub fn parse(level_str: &str) -> Result<Self, DomainError> {
        match level_str.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(DomainError::BadArgs(format!(
                "Invalid log level: {}. Valid levels: trace, debug, info, warn, error",
                level_str
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
