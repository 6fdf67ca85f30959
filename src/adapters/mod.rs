// Adapters - External system implementations

pub mod file_analysis;
pub mod fs_project;
pub mod manifest_render;
pub mod template_analysis;
pub mod toml_config;

// Re-export adapters
pub use file_analysis::FileAnalysisAdapter;
pub use fs_project::{FsProjectAdapter, ProjectFormat};
pub use manifest_render::ManifestRenderAdapter;
pub use template_analysis::CampaignTemplateAnalyzer;
pub use toml_config::TomlConfigAdapter;
