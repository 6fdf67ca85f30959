//! adcut editing-session library
//!
//! A non-linear editing session for short campaign videos: video, caption and
//! audio tracks, a parameterized effect pipeline, a playback clock, and a
//! merger that folds machine-generated edit suggestions into the timeline
//! without disturbing user edits.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{EditEvent, SessionController, SessionPhase};
pub use domain::errors::{DomainError, ErrorKind};
pub use domain::model::{Clip, ClipId, RenderSettings, TimeSpec, TrackKind};
pub use domain::session::{Session, SessionSnapshot};
pub use error::AdcutError;
