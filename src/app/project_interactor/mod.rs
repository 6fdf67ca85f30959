// Project interactor - Orchestrates project file use cases

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::app::session_controller::SessionController;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::session::{Session, SessionSnapshot};
use crate::ports::*;

/// Request to start a new project
#[derive(Debug, Clone)]
pub struct NewProjectRequest {
    pub path: String,
    pub source: String,
    pub duration: Option<f64>,
    /// Place one user video clip spanning the whole media
    pub seed_clip: bool,
    pub campaign: Option<CampaignContext>,
}

/// Interactor for project lifecycle use cases
pub struct ProjectInteractor {
    project_store: Arc<dyn ProjectStorePort>,
    config_port: Arc<dyn ConfigPort>,
}

impl ProjectInteractor {
    /// Create new project interactor with injected ports
    pub fn new(project_store: Arc<dyn ProjectStorePort>, config_port: Arc<dyn ConfigPort>) -> Self {
        Self {
            project_store,
            config_port,
        }
    }

    /// Create and save a new project
    pub async fn create(&self, request: NewProjectRequest) -> Result<SessionSnapshot, DomainError> {
        let mut session = Session::with_media(&request.source, request.duration)?;
        if request.seed_clip {
            if let Some(duration) = request.duration {
                session.add_clip(Clip::media(
                    TrackKind::Video,
                    0.0,
                    duration,
                    request.source.clone(),
                )?)?;
            }
        }
        if let Some(campaign) = request.campaign {
            session.set_campaign(campaign);
        }

        let snapshot = session.snapshot(Utc::now());
        self.project_store.save(&request.path, &snapshot).await?;
        tracing::info!(
            path = %request.path,
            source = %request.source,
            clips = snapshot.clip_count(),
            "Project created"
        );
        Ok(snapshot)
    }

    /// Load a project into a fresh controller wired to the given collaborators
    pub async fn open(
        &self,
        path: &str,
        analysis_port: Arc<dyn AnalysisPort>,
        render_port: Arc<dyn RenderPort>,
    ) -> Result<SessionController, DomainError> {
        let snapshot = self.project_store.load(path).await?;
        let controller = SessionController::new(analysis_port, render_port);
        controller.restore(snapshot)?;
        tracing::debug!(path, "Project opened");
        Ok(controller)
    }

    /// Persist the controller's current session
    pub async fn save(
        &self,
        path: &str,
        controller: &SessionController,
    ) -> Result<SessionSnapshot, DomainError> {
        let snapshot = controller.snapshot()?;
        self.project_store.save(path, &snapshot).await?;
        tracing::debug!(path, clips = snapshot.clip_count(), "Project saved");
        Ok(snapshot)
    }

    /// Read a project without building a controller
    pub async fn load_snapshot(&self, path: &str) -> Result<SessionSnapshot, DomainError> {
        self.project_store.load(path).await
    }

    /// Render settings from configuration
    pub async fn render_settings(&self) -> Result<RenderSettings, DomainError> {
        let defaults = RenderSettings::default();
        let resolution = match self.config_port.get_config("resolution").await? {
            Some(value) => Resolution::parse(&value)?,
            None => defaults.resolution,
        };
        let framerate = match self.config_port.get_config("framerate").await? {
            Some(value) => value
                .parse::<f64>()
                .map_err(|e| DomainError::BadArgs(format!("Invalid framerate: {}", e)))?,
            None => defaults.framerate,
        };
        let codec = self
            .config_port
            .get_config_or_default("codec", &defaults.codec)
            .await?;
        let bitrate = match self.config_port.get_config("bitrate").await? {
            Some(value) => value
                .parse::<u64>()
                .map_err(|e| DomainError::BadArgs(format!("Invalid bitrate: {}", e)))?,
            None => defaults.bitrate,
        };

        let settings = RenderSettings {
            resolution,
            framerate,
            codec,
            bitrate,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Playback tick interval from configuration
    pub async fn tick_interval(&self) -> Result<Duration, DomainError> {
        let millis = self
            .config_port
            .get_config_or_default("tick_ms", "40")
            .await?
            .parse::<u64>()
            .map_err(|e| DomainError::BadArgs(format!("Invalid tick_ms: {}", e)))?;
        if millis == 0 {
            return Err(DomainError::BadArgs("tick_ms must be positive".to_string()));
        }
        Ok(Duration::from_millis(millis))
    }
}
