// Filesystem project store - JSON or YAML snapshots chosen by extension

use crate::domain::errors::*;
use crate::domain::session::SessionSnapshot;
use crate::ports::*;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// On-disk encoding of a project file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    Json,
    Yaml,
}

impl ProjectFormat {
    /// `.yaml` / `.yml` are YAML, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ProjectFormat::Yaml,
            _ => ProjectFormat::Json,
        }
    }

    pub fn encode(&self, snapshot: &SessionSnapshot) -> Result<String, DomainError> {
        match self {
            ProjectFormat::Json => serde_json::to_string_pretty(snapshot)
                .map_err(|e| DomainError::StorageFailed(format!("Failed to encode JSON: {}", e))),
            ProjectFormat::Yaml => serde_yaml::to_string(snapshot)
                .map_err(|e| DomainError::StorageFailed(format!("Failed to encode YAML: {}", e))),
        }
    }

    pub fn decode(&self, content: &str) -> Result<SessionSnapshot, DomainError> {
        match self {
            ProjectFormat::Json => serde_json::from_str(content)
                .map_err(|e| DomainError::StorageFailed(format!("Invalid project JSON: {}", e))),
            ProjectFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| DomainError::StorageFailed(format!("Invalid project YAML: {}", e))),
        }
    }
}

/// Project store backed by the local filesystem
#[derive(Debug, Default)]
pub struct FsProjectAdapter;

impl FsProjectAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Sibling temp path used for atomic replacement
    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }
}

#[async_trait]
impl ProjectStorePort for FsProjectAdapter {
    async fn load(&self, path: &str) -> Result<SessionSnapshot, DomainError> {
        let path_buf = PathBuf::from(path);
        let content = tokio::fs::read_to_string(&path_buf).await.map_err(|e| {
            DomainError::StorageFailed(format!("Failed to read project {}: {}", path, e))
        })?;
        let snapshot = ProjectFormat::from_path(&path_buf).decode(&content)?;
        tracing::debug!(path, clips = snapshot.clip_count(), "Project loaded");
        Ok(snapshot)
    }

    async fn save(&self, path: &str, snapshot: &SessionSnapshot) -> Result<(), DomainError> {
        let path_buf = PathBuf::from(path);
        let content = ProjectFormat::from_path(&path_buf).encode(snapshot)?;

        if let Some(parent) = path_buf.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::StorageFailed(format!("Failed to create project directory: {}", e))
            })?;
        }

        let temp = Self::temp_path(&path_buf);
        tokio::fs::write(&temp, content).await.map_err(|e| {
            DomainError::StorageFailed(format!("Failed to write project {}: {}", path, e))
        })?;
        tokio::fs::rename(&temp, &path_buf).await.map_err(|e| {
            DomainError::StorageFailed(format!("Failed to replace project {}: {}", path, e))
        })?;

        tracing::debug!(path, clips = snapshot.clip_count(), "Project saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Clip, TrackKind};
    use crate::domain::session::Session;
    use chrono::Utc;
    use tempfile::TempDir;

    fn snapshot() -> SessionSnapshot {
        let mut session = Session::with_media("ad.mp4", Some(12.0)).unwrap();
        session
            .add_clip(Clip::media(TrackKind::Video, 0.0, 12.0, "ad.mp4").unwrap())
            .unwrap();
        session.add_clip(Clip::text(1.0, 2.0, "Hi").unwrap()).unwrap();
        session.snapshot(Utc::now())
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ProjectFormat::from_path(Path::new("a.yaml")), ProjectFormat::Yaml);
        assert_eq!(ProjectFormat::from_path(Path::new("a.YML")), ProjectFormat::Yaml);
        assert_eq!(ProjectFormat::from_path(Path::new("a.json")), ProjectFormat::Json);
        assert_eq!(ProjectFormat::from_path(Path::new("project")), ProjectFormat::Json);
    }

    #[tokio::test]
    async fn test_save_and_load_both_formats() {
        let dir = TempDir::new().unwrap();
        let store = FsProjectAdapter::new();
        let original = snapshot();

        for name in ["p.json", "sub/p.yaml"] {
            let path = dir.path().join(name);
            let path = path.to_str().unwrap();
            store.save(path, &original).await.unwrap();
            let loaded = store.load(path).await.unwrap();
            assert_eq!(loaded.tracks, original.tracks);
            assert_eq!(loaded.effect_parameters, original.effect_parameters);
            assert_eq!(loaded.duration, original.duration);
        }
    }

    #[tokio::test]
    async fn test_load_errors_are_storage_failures() {
        let dir = TempDir::new().unwrap();
        let store = FsProjectAdapter::new();
        let missing = dir.path().join("missing.json");
        let err = store.load(missing.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, DomainError::StorageFailed(_)));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{not json").unwrap();
        let err = store.load(garbage.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, DomainError::StorageFailed(_)));
    }
}
