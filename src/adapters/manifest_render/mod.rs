// Manifest render adapter - writes the render job as a JSON manifest for an encoder

use crate::domain::errors::*;
use crate::domain::model::TrackKind;
use crate::domain::session::Session;
use crate::ports::*;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;

/// One entry of the edit decision list
#[derive(Debug, Clone, Serialize)]
struct ManifestSegment<'a> {
    track: TrackKind,
    start: f64,
    end: f64,
    source_in: f64,
    source: &'a crate::domain::model::ClipSource,
    /// Filter chain with this clip's parameter overrides applied
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    job: &'a RenderJob,
    /// Filter chain for the session-wide effects at time zero
    filter: String,
    segments: Vec<ManifestSegment<'a>>,
}

/// Renderer stand-in that records what an encoder would be asked to do
#[derive(Debug, Clone)]
pub struct ManifestRenderAdapter {
    output: PathBuf,
}

impl ManifestRenderAdapter {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

#[async_trait]
impl RenderPort for ManifestRenderAdapter {
    async fn render(&self, job: &RenderJob) -> Result<RenderReport, DomainError> {
        job.settings
            .validate()
            .map_err(|e| DomainError::RenderFailed(e.to_string()))?;

        // The snapshot must describe a session we could have produced
        let session = Session::restore(job.snapshot.clone())
            .map_err(|e| DomainError::RenderFailed(format!("Invalid snapshot: {}", e)))?;
        let duration = session
            .duration()
            .ok_or_else(|| DomainError::RenderFailed("Session duration unresolved".to_string()))?;

        let mut segments: Vec<ManifestSegment<'_>> = job
            .snapshot
            .tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .map(|clip| ManifestSegment {
                track: clip.track_kind,
                start: clip.start,
                end: clip.end,
                source_in: clip.source_in,
                source: &clip.source,
                filter: (clip.track_kind == TrackKind::Video).then(|| {
                    session
                        .effects()
                        .resolve_with_overrides(clip.start, &clip.parameters)
                        .css_filter()
                }),
            })
            .collect();
        segments.sort_by(|a, b| a.track.cmp(&b.track).then(a.start.total_cmp(&b.start)));

        let manifest = Manifest {
            job,
            filter: session.effects().resolve(0.0).css_filter(),
            segments,
        };
        let content = serde_json::to_string_pretty(&manifest)
            .map_err(|e| DomainError::RenderFailed(format!("Failed to encode manifest: {}", e)))?;

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::RenderFailed(format!("Failed to create output directory: {}", e))
            })?;
        }
        tokio::fs::write(&self.output, content).await.map_err(|e| {
            DomainError::RenderFailed(format!(
                "Failed to write {}: {}",
                self.output.display(),
                e
            ))
        })?;

        tracing::info!(
            output = %self.output.display(),
            resolution = %job.settings.resolution,
            codec = %job.settings.codec,
            "Render manifest written"
        );
        Ok(RenderReport {
            output: self.output.to_string_lossy().to_string(),
            clips_rendered: job.snapshot.clip_count(),
            duration,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::effects::ParamValue;
    use crate::domain::model::{Clip, RenderSettings};
    use tempfile::TempDir;

    fn job(duration: Option<f64>) -> RenderJob {
        let mut session = Session::with_media("ad.mp4", duration).unwrap();
        session
            .add_clip(Clip::media(TrackKind::Video, 0.0, 8.0, "ad.mp4").unwrap())
            .unwrap();
        session
            .add_clip(
                Clip::media(TrackKind::Video, 8.0, 10.0, "ad.mp4")
                    .unwrap()
                    .with_parameter("color.brightness", ParamValue::Float(20.0)),
            )
            .unwrap();
        session.add_clip(Clip::text(0.0, 2.0, "Hi").unwrap()).unwrap();
        RenderJob {
            snapshot: session.snapshot(Utc::now()),
            settings: RenderSettings::default(),
            requested_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_writes_manifest() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out").join("render.json");
        let report = ManifestRenderAdapter::new(&output)
            .render(&job(Some(10.0)))
            .await
            .unwrap();
        assert_eq!(report.clips_rendered, 3);
        assert_eq!(report.duration, 10.0);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let segments = written["segments"].as_array().unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0]["track"], "video");
        assert!(written["filter"].as_str().unwrap().starts_with("brightness(1.000)"));
        assert!(segments[0]["filter"].as_str().unwrap().starts_with("brightness(1.000)"));
        assert!(segments[1]["filter"].as_str().unwrap().starts_with("brightness(1.200)"));
        assert!(segments[2].get("filter").is_none());
    }

    #[tokio::test]
    async fn test_rejects_bad_jobs() {
        let dir = TempDir::new().unwrap();
        let adapter = ManifestRenderAdapter::new(dir.path().join("render.json"));

        let mut bad_settings = job(Some(10.0));
        bad_settings.settings.codec = String::new();
        assert!(matches!(
            adapter.render(&bad_settings).await,
            Err(DomainError::RenderFailed(_))
        ));

        assert!(matches!(
            adapter.render(&job(None)).await,
            Err(DomainError::RenderFailed(_))
        ));
    }
}
