// File analysis adapter - reads a suggestion payload produced elsewhere

use crate::domain::errors::*;
use crate::ports::*;
use async_trait::async_trait;
use std::path::PathBuf;

/// Analyzer that returns the JSON payload stored in a file
#[derive(Debug, Clone)]
pub struct FileAnalysisAdapter {
    path: PathBuf,
}

impl FileAnalysisAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AnalysisPort for FileAnalysisAdapter {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<serde_json::Value, DomainError> {
        tracing::info!(
            payload = %self.path.display(),
            source = %request.source,
            "Reading suggestion payload"
        );
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::AnalysisFailed(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            DomainError::AnalysisFailed(format!(
                "{} is not valid JSON: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CampaignGoal, TargetAudience};
    use tempfile::TempDir;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            source: "promo.mp4".to_string(),
            duration: 20.0,
            campaign_goal: CampaignGoal::Education,
            target_audience: TargetAudience::Families,
        }
    }

    #[tokio::test]
    async fn test_reads_payload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("payload.json");
        std::fs::write(&path, r#"{"suggestedCuts": [], "subtitles": []}"#).unwrap();
        let payload = FileAnalysisAdapter::new(&path).analyze(&request()).await.unwrap();
        assert!(payload["suggestedCuts"].is_array());
    }

    #[tokio::test]
    async fn test_failures_are_analysis_failures() {
        let dir = TempDir::new().unwrap();
        let missing = FileAnalysisAdapter::new(dir.path().join("none.json"));
        assert!(matches!(
            missing.analyze(&request()).await,
            Err(DomainError::AnalysisFailed(_))
        ));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "suggestedCuts: []").unwrap();
        assert!(matches!(
            FileAnalysisAdapter::new(&path).analyze(&request()).await,
            Err(DomainError::AnalysisFailed(_))
        ));
    }
}
