//! Command-line argument definitions

use clap::Args;

/// Campaign flags shared by project creation and analysis
#[derive(Args, Debug, Clone)]
pub struct CampaignArgs {
    /// Campaign goal (sales, awareness, engagement, education, recruitment)
    #[arg(long)]
    pub goal: Option<String>,

    /// Target audience (young-adults, professionals, families, seniors, businesses)
    #[arg(long)]
    pub audience: Option<String>,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Project file to create (.yaml/.yml for YAML, anything else for JSON)
    pub project: String,

    /// Media source handle
    #[arg(short, long)]
    pub source: String,

    /// Media duration (HH:MM:SS.ms, MM:SS.ms, or seconds); resolved later when omitted
    #[arg(short, long)]
    pub duration: Option<String>,

    /// Start with empty tracks instead of one clip spanning the media
    #[arg(long)]
    pub empty: bool,

    /// Replace an existing project file
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub campaign: CampaignArgs,
}

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Project file
    pub project: String,

    /// Media duration, once known
    pub duration: String,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Project file
    pub project: String,

    /// Show the resolved frame at this time instead of the track listing
    #[arg(long)]
    pub at: Option<String>,
}

/// Arguments for the split command
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Project file
    pub project: String,

    /// Clip to split
    pub clip: String,

    /// Split point, strictly inside the clip
    pub time: String,
}

/// Arguments for the delete command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Project file
    pub project: String,

    /// Clip to remove
    pub clip: String,
}

/// Arguments for the move command
#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Project file
    pub project: String,

    /// Clip to move
    pub clip: String,

    /// New start time; the clip keeps its duration
    pub start: String,
}

/// Arguments for the add-text command
#[derive(Args, Debug)]
pub struct AddTextArgs {
    /// Project file
    pub project: String,

    /// Caption start time
    pub start: String,

    /// Caption end time
    pub end: String,

    /// Caption text
    pub text: String,

    /// Caption position (top, center, bottom)
    #[arg(long)]
    pub position: Option<String>,
}

/// Arguments for the set-param command
#[derive(Args, Debug)]
pub struct SetParamArgs {
    /// Project file
    pub project: String,

    /// Parameter key as category.name, e.g. color.brightness
    pub key: String,

    /// Numeric value or choice
    pub value: String,

    /// Store the value as an override on this clip instead of globally
    #[arg(long)]
    pub clip: Option<String>,
}

/// Arguments for the lock command
#[derive(Args, Debug)]
pub struct LockArgs {
    /// Project file
    pub project: String,

    /// Clip to lock
    pub clip: String,

    /// Unlock instead
    #[arg(long)]
    pub unlock: bool,
}

/// Arguments for the suggest command
#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Project file
    pub project: String,

    /// Suggestion payload (JSON)
    pub payload: String,

    #[command(flatten)]
    pub campaign: CampaignArgs,
}

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Project file
    pub project: String,

    #[command(flatten)]
    pub campaign: CampaignArgs,
}

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Project file
    pub project: String,

    /// Render manifest output path
    #[arg(short, long)]
    pub output: String,

    /// Output resolution (1920x1080, 1080p, 720p, ...)
    #[arg(long)]
    pub resolution: Option<String>,

    /// Output frame rate
    #[arg(long)]
    pub framerate: Option<f64>,

    /// Video codec
    #[arg(long)]
    pub codec: Option<String>,

    /// Bitrate in bits per second; SI suffixes accepted (8M, 500k)
    #[arg(long, value_parser = clap_num::si_number::<u64>)]
    pub bitrate: Option<u64>,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also write the effective configuration to this file
    #[arg(long)]
    pub save: Option<String>,
}
