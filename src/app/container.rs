use std::sync::Arc;

use crate::adapters::{FsProjectAdapter, TomlConfigAdapter};
use crate::app::project_interactor::ProjectInteractor;
use crate::domain::errors::DomainError;
use crate::ports::{ConfigPort, ProjectStorePort};

pub trait AppContainer: Send + Sync {
    fn project_interactor(&self) -> Arc<ProjectInteractor>;
    fn config_port(&self) -> Arc<dyn ConfigPort>;
}

pub struct DefaultAppContainer {
    project_interactor: Arc<ProjectInteractor>,
    config_port: Arc<dyn ConfigPort>,
}

impl DefaultAppContainer {
    pub fn new() -> Result<Self, DomainError> {
        Self::with_config(Arc::new(TomlConfigAdapter::new()?))
    }

    /// Wire the container around an already-initialized config port
    pub fn with_config(config_port: Arc<dyn ConfigPort>) -> Result<Self, DomainError> {
        let project_store = Arc::new(FsProjectAdapter::new());

        let project_interactor = Arc::new(ProjectInteractor::new(
            Arc::clone(&project_store) as Arc<dyn ProjectStorePort>,
            Arc::clone(&config_port),
        ));

        Ok(Self {
            project_interactor,
            config_port,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn project_interactor(&self) -> Arc<ProjectInteractor> {
        Arc::clone(&self.project_interactor)
    }

    fn config_port(&self) -> Arc<dyn ConfigPort> {
        Arc::clone(&self.config_port)
    }
}
