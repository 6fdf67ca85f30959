// Domain models - Core types and data structures

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::effects::ParamValue;
use crate::domain::errors::DomainError;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Create a new TimeSpec from hours, minutes, seconds, milliseconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> Self {
        let total_seconds = hours as f64 * 3600.0
            + minutes as f64 * 60.0
            + seconds as f64
            + milliseconds as f64 / 1000.0;
        Self {
            seconds: total_seconds,
        }
    }

    /// Seconds as f64
    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        // Try parsing as seconds (float)
        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() {
                return Err(DomainError::BadArgs("Time must be finite".to_string()));
            }
            if seconds < 0.0 {
                return Err(DomainError::BadArgs("Time cannot be negative".to_string()));
            }
            return Ok(Self::from_seconds(seconds));
        }

        // Try parsing as HH:MM:SS.ms or MM:SS.ms
        let parts: Vec<&str> = trimmed.split(':').collect();
        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = minutes
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs("Invalid minutes format".to_string()))?;
                let seconds = parse_seconds_part(seconds)?;
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = hours
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs("Invalid hours format".to_string()))?;
                let minutes = minutes
                    .parse::<u32>()
                    .map_err(|_| DomainError::BadArgs("Invalid minutes format".to_string()))?;
                if minutes >= 60 {
                    return Err(DomainError::BadArgs(
                        "Minutes must be less than 60".to_string(),
                    ));
                }
                let seconds = parse_seconds_part(seconds)?;
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(DomainError::BadArgs(
                "Invalid time format. Supported formats: seconds (e.g., 12.5), MM:SS.ms (e.g., 0:08), HH:MM:SS.ms (e.g., 1:02:30.5)".to_string(),
            )),
        }
    }

    /// Format as [HH:]MM:SS.mmm
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let milliseconds = total_ms % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

fn parse_seconds_part(part: &str) -> Result<f64, DomainError> {
    let seconds = part
        .parse::<f64>()
        .map_err(|_| DomainError::BadArgs("Invalid seconds format".to_string()))?;
    if !(0.0..60.0).contains(&seconds) {
        return Err(DomainError::BadArgs(
            "Seconds must be between 0 and 60".to_string(),
        ));
    }
    Ok(seconds)
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Unique clip identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(Uuid);

impl ClipId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClipId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| DomainError::BadArgs(format!("Invalid clip id '{}': {}", s, e)))
    }
}

/// Kind of content a track holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Text,
    Audio,
}

impl TrackKind {
    pub const ALL: [TrackKind; 3] = [TrackKind::Video, TrackKind::Text, TrackKind::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Text => "text",
            TrackKind::Audio => "audio",
        }
    }

    /// Parse track kind from string
    pub fn parse(kind: &str) -> Result<Self, DomainError> {
        match kind.trim().to_lowercase().as_str() {
            "video" | "v" => Ok(TrackKind::Video),
            "text" | "t" | "caption" | "subtitle" => Ok(TrackKind::Text),
            "audio" | "a" => Ok(TrackKind::Audio),
            other => Err(DomainError::BadArgs(format!(
                "Invalid track kind: {}. Valid kinds: video, text, audio",
                other
            ))),
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who created a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipOrigin {
    #[default]
    User,
    Machine,
}

/// What a clip plays: an opaque media handle or a text payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipSource {
    Media { handle: String },
    Text { text: String },
}

/// Validate a clip time range
pub fn validate_range(start: f64, end: f64) -> Result<(), DomainError> {
    if !start.is_finite() || !end.is_finite() {
        return Err(DomainError::InvalidRange {
            start,
            end,
            reason: "times must be finite".to_string(),
        });
    }
    if start < 0.0 {
        return Err(DomainError::InvalidRange {
            start,
            end,
            reason: "start cannot be negative".to_string(),
        });
    }
    if end <= start {
        return Err(DomainError::InvalidRange {
            start,
            end,
            reason: "end must be after start".to_string(),
        });
    }
    Ok(())
}

/// A time-bounded element placed on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,
    pub track_kind: TrackKind,
    pub start: f64,
    pub end: f64,
    pub source: ClipSource,
    /// Offset into the source media that plays at `start`
    #[serde(default)]
    pub source_in: f64,
    /// Effect and style overrides, keyed `category.name`
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamValue>,
    pub origin: ClipOrigin,
    #[serde(default)]
    pub locked: bool,
    /// Insertion sequence assigned by the track store
    #[serde(default)]
    pub seq: u64,
}

impl Clip {
    /// Create new clip with validation
    pub fn new(
        track_kind: TrackKind,
        start: f64,
        end: f64,
        source: ClipSource,
    ) -> Result<Self, DomainError> {
        validate_range(start, end)?;
        Ok(Self {
            id: ClipId::new(),
            track_kind,
            start,
            end,
            source,
            source_in: 0.0,
            parameters: BTreeMap::new(),
            origin: ClipOrigin::User,
            locked: false,
            seq: 0,
        })
    }

    /// Create a clip referencing a media handle
    pub fn media(
        track_kind: TrackKind,
        start: f64,
        end: f64,
        handle: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::new(
            track_kind,
            start,
            end,
            ClipSource::Media {
                handle: handle.into(),
            },
        )
    }

    /// Create a caption clip on the text track
    pub fn text(start: f64, end: f64, text: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(TrackKind::Text, start, end, ClipSource::Text { text: text.into() })
    }

    pub fn with_origin(mut self, origin: ClipOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_source_in(mut self, source_in: f64) -> Self {
        self.source_in = source_in.max(0.0);
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open containment: start <= time < end
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Whether [start, end) intersects this clip's window
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && start < self.end
    }

    pub fn text_payload(&self) -> Option<&str> {
        match &self.source {
            ClipSource::Text { text } => Some(text),
            ClipSource::Media { .. } => None,
        }
    }

    pub fn media_handle(&self) -> Option<&str> {
        match &self.source {
            ClipSource::Media { handle } => Some(handle),
            ClipSource::Text { .. } => None,
        }
    }
}

/// Campaign goal offered when requesting an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CampaignGoal {
    Sales,
    Awareness,
    Engagement,
    Education,
    Recruitment,
}

impl CampaignGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignGoal::Sales => "sales",
            CampaignGoal::Awareness => "awareness",
            CampaignGoal::Engagement => "engagement",
            CampaignGoal::Education => "education",
            CampaignGoal::Recruitment => "recruitment",
        }
    }

    pub fn parse(goal: &str) -> Result<Self, DomainError> {
        match goal.trim().to_lowercase().as_str() {
            "sales" => Ok(CampaignGoal::Sales),
            "awareness" => Ok(CampaignGoal::Awareness),
            "engagement" => Ok(CampaignGoal::Engagement),
            "education" => Ok(CampaignGoal::Education),
            "recruitment" => Ok(CampaignGoal::Recruitment),
            other => Err(DomainError::BadArgs(format!(
                "Invalid campaign goal: {}. Valid goals: sales, awareness, engagement, education, recruitment",
                other
            ))),
        }
    }
}

impl fmt::Display for CampaignGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target audience offered when requesting an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetAudience {
    YoungAdults,
    Professionals,
    Families,
    Seniors,
    Businesses,
}

impl TargetAudience {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetAudience::YoungAdults => "young-adults",
            TargetAudience::Professionals => "professionals",
            TargetAudience::Families => "families",
            TargetAudience::Seniors => "seniors",
            TargetAudience::Businesses => "businesses",
        }
    }

    pub fn parse(audience: &str) -> Result<Self, DomainError> {
        match audience.trim().to_lowercase().as_str() {
            "young-adults" | "young_adults" => Ok(TargetAudience::YoungAdults),
            "professionals" => Ok(TargetAudience::Professionals),
            "families" => Ok(TargetAudience::Families),
            "seniors" => Ok(TargetAudience::Seniors),
            "businesses" => Ok(TargetAudience::Businesses),
            other => Err(DomainError::BadArgs(format!(
                "Invalid target audience: {}. Valid audiences: young-adults, professionals, families, seniors, businesses",
                other
            ))),
        }
    }
}

impl fmt::Display for TargetAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Campaign context attached to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignContext {
    pub goal: CampaignGoal,
    pub audience: TargetAudience,
}

/// Output frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::BadArgs(
                "Resolution dimensions cannot be zero".to_string(),
            ));
        }
        Ok(Self { width, height })
    }

    /// Parse `WxH` or a named preset (720p, 1080p, 1440p, 4k)
    pub fn parse(resolution: &str) -> Result<Self, DomainError> {
        let normalized = resolution.trim().to_lowercase();
        match normalized.as_str() {
            "720p" => return Self::new(1280, 720),
            "1080p" => return Self::new(1920, 1080),
            "1440p" => return Self::new(2560, 1440),
            "4k" | "2160p" => return Self::new(3840, 2160),
            _ => {}
        }

        let (w, h) = normalized.split_once('x').ok_or_else(|| {
            DomainError::BadArgs(format!(
                "Invalid resolution: {}. Use WxH or 720p/1080p/1440p/4k",
                resolution
            ))
        })?;
        let width = w
            .parse::<u32>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid width: {}", w)))?;
        let height = h
            .parse::<u32>()
            .map_err(|_| DomainError::BadArgs(format!("Invalid height: {}", h)))?;
        Self::new(width, height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Render settings chosen by the caller of an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub resolution: Resolution,
    pub framerate: f64,
    pub codec: String,
    /// Target bitrate in bits per second
    pub bitrate: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            framerate: 30.0,
            codec: "h264".to_string(),
            bitrate: 8_000_000,
        }
    }
}

impl RenderSettings {
    /// Validate settings before handing them to a renderer
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(DomainError::BadArgs(
                "Resolution dimensions cannot be zero".to_string(),
            ));
        }
        if !(self.framerate > 0.0 && self.framerate <= 240.0) {
            return Err(DomainError::BadArgs(format!(
                "Frame rate must be in (0, 240], got {}",
                self.framerate
            )));
        }
        if self.codec.trim().is_empty() {
            return Err(DomainError::BadArgs("Codec cannot be empty".to_string()));
        }
        if self.bitrate == 0 {
            return Err(DomainError::BadArgs("Bitrate must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
