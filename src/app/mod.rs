// Application layer - Session orchestration and use case interactors

pub mod container;
pub mod playback;
pub mod project_interactor;
pub mod session_controller;

// Re-export the main entry points
pub use playback::PlaybackDriver;
pub use project_interactor::{NewProjectRequest, ProjectInteractor};
pub use session_controller::{
    AnalysisOutcome, EditEvent, EditOutcome, ExportCompletion, ExportToken, FrameView,
    SessionController, SessionPhase, SessionView,
};
