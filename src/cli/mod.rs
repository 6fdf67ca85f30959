//! CLI module for adcut
//!
//! This module handles command-line argument parsing and command execution.
//! Every command opens a project file, applies one operation through the
//! session controller, saves the result and prints a JSON report on stdout.

use clap::{Parser, Subcommand};

use crate::domain::errors::DomainError;
use crate::error::AdcutError;

pub mod args;
pub mod commands;

pub use args::*;

/// adcut campaign video editor
///
/// Edit short campaign videos as project files: split and move clips,
/// add captions, tune effects, fold in machine suggestions and export.
#[derive(Parser, Debug)]
#[command(name = "adcut")]
#[command(about = "adcut - campaign video editing sessions from the command line")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "ADCUT_CONFIG")]
    pub config: Option<String>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a project for a media source
    New(NewArgs),
    /// Fix the media duration of a project created without one
    Resolve(ResolveArgs),
    /// Show the tracks of a project, or the frame at one instant
    Inspect(InspectArgs),
    /// Split a clip in two
    Split(SplitArgs),
    /// Remove a clip
    Delete(DeleteArgs),
    /// Move a clip to a new start time
    Move(MoveArgs),
    /// Add a caption on the text track
    AddText(AddTextArgs),
    /// Set a global effect parameter or a per-clip override
    SetParam(SetParamArgs),
    /// Lock or unlock a clip
    Lock(LockArgs),
    /// Merge a suggestion payload read from a JSON file
    Suggest(SuggestArgs),
    /// Run the built-in campaign analyzer and merge its suggestion
    Analyze(AnalyzeArgs),
    /// Render the project through the manifest renderer
    Export(ExportArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Process exit code for a failed command
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(adcut) = cause.downcast_ref::<AdcutError>() {
            return adcut.exit_code();
        }
        if let Some(domain) = cause.downcast_ref::<DomainError>() {
            return AdcutError::from(domain.clone()).exit_code();
        }
    }
    1
}
