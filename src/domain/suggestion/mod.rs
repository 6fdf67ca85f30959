//! Machine edit suggestions.
//!
//! Analysis payloads arrive as untyped JSON. [`Suggestion::from_payload`] is the
//! only way in: it rejects payloads whose overall shape is wrong and isolates
//! individual entries that cannot be read, so the merger only ever sees typed
//! values.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::model::TimeSpec;

/// Namespace for payload fingerprints; changing it changes every stored id
const FINGERPRINT_NAMESPACE: Uuid =
    Uuid::from_u128(0x6f1c2a7e_3b5d_4c8e_9a01_5d2e8b4c7f30);

/// Identity of a suggestion, used for idempotent merging
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(String);

impl SuggestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Name-based (v5) id over the compact JSON text of the payload
    pub fn fingerprint(payload: &Value) -> Self {
        let digest = Uuid::new_v5(&FINGERPRINT_NAMESPACE, payload.to_string().as_bytes());
        Self(format!("sg-{}", digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
}

impl Importance {
    fn from_value(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None | Some(Value::Null) => Ok(Importance::Medium),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "low" => Ok(Importance::Low),
                "medium" | "normal" => Ok(Importance::Medium),
                "high" | "critical" => Ok(Importance::High),
                other => Err(format!("unknown importance '{}'", other)),
            },
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v >= 0.66 => Ok(Importance::High),
                Some(v) if v >= 0.33 => Ok(Importance::Medium),
                Some(_) => Ok(Importance::Low),
                None => Err("importance is not a number".to_string()),
            },
            Some(_) => Err("importance must be a string or number".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMoment {
    /// Position in the payload's `keyMoments` array
    pub index: usize,
    pub time: f64,
    pub description: String,
    pub importance: Importance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedCut {
    /// Position in the payload's `suggestedCuts` array
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub reason: String,
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitlePosition {
    Top,
    Center,
    Bottom,
}

impl SubtitlePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitlePosition::Top => "top",
            SubtitlePosition::Center => "center",
            SubtitlePosition::Bottom => "bottom",
        }
    }

    fn from_value(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str).map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "top" => SubtitlePosition::Top,
            Some(s) if s == "center" || s == "middle" => SubtitlePosition::Center,
            Some(s) if s == "bottom" => SubtitlePosition::Bottom,
            Some(other) => {
                tracing::warn!(position = %other, "Unknown subtitle position, using bottom");
                SubtitlePosition::Bottom
            }
            None => SubtitlePosition::Bottom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// Position in the payload's `subtitles` array
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub position: SubtitlePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryCategory {
    Cut,
    Subtitle,
    KeyMoment,
}

/// An entry that was dropped instead of merged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub category: EntryCategory,
    pub index: usize,
    pub reason: String,
}

/// A validated suggestion payload
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub mood: Option<String>,
    pub emotions: Vec<String>,
    pub key_moments: Vec<KeyMoment>,
    pub suggested_cuts: Vec<SuggestedCut>,
    pub subtitles: Vec<SubtitleEntry>,
    pub color_grading: Map<String, Value>,
    /// Entries that could not be read at all
    pub unreadable: Vec<SkippedEntry>,
}

impl Suggestion {
    /// Validate an analysis payload.
    ///
    /// Fails with `MalformedSuggestion` when the payload is not an object,
    /// when `suggestedCuts` or `subtitles` is missing or not an array, or when
    /// an optional top-level field has the wrong type. Individual entries that
    /// cannot be read are recorded in `unreadable` instead.
    pub fn from_payload(payload: &Value) -> Result<Self, DomainError> {
        let object = payload
            .as_object()
            .ok_or_else(|| malformed("payload is not a JSON object"))?;

        let cuts = required_array(object, "suggestedCuts")?;
        let subtitles = required_array(object, "subtitles")?;

        let id = match object.get("id") {
            None | Some(Value::Null) => SuggestionId::fingerprint(payload),
            Some(Value::String(s)) if !s.trim().is_empty() => SuggestionId::new(s.trim()),
            Some(Value::Number(n)) => SuggestionId::new(n.to_string()),
            Some(_) => return Err(malformed("'id' must be a non-empty string or number")),
        };

        let mood = match object.get("mood") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(malformed("'mood' must be a string")),
        };

        let emotions = match object.get("emotions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(_) => return Err(malformed("'emotions' must be an array")),
        };

        let color_grading = match object.get("colorGrading") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(malformed("'colorGrading' must be an object")),
        };

        let mut unreadable = Vec::new();

        let mut key_moments = Vec::new();
        match object.get("keyMoments") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    match parse_key_moment(index, item) {
                        Ok(moment) => key_moments.push(moment),
                        Err(reason) => unreadable.push(SkippedEntry {
                            category: EntryCategory::KeyMoment,
                            index,
                            reason,
                        }),
                    }
                }
            }
            Some(_) => return Err(malformed("'keyMoments' must be an array")),
        }

        let mut suggested_cuts = Vec::new();
        for (index, item) in cuts.iter().enumerate() {
            match parse_cut(index, item) {
                Ok(cut) => suggested_cuts.push(cut),
                Err(reason) => unreadable.push(SkippedEntry {
                    category: EntryCategory::Cut,
                    index,
                    reason,
                }),
            }
        }

        let mut subtitle_entries = Vec::new();
        for (index, item) in subtitles.iter().enumerate() {
            match parse_subtitle(index, item) {
                Ok(entry) => subtitle_entries.push(entry),
                Err(reason) => unreadable.push(SkippedEntry {
                    category: EntryCategory::Subtitle,
                    index,
                    reason,
                }),
            }
        }

        Ok(Self {
            id,
            mood,
            emotions,
            key_moments,
            suggested_cuts,
            subtitles: subtitle_entries,
            color_grading,
            unreadable,
        })
    }
}

fn malformed(reason: &str) -> DomainError {
    DomainError::MalformedSuggestion(reason.to_string())
}

fn required_array<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a Vec<Value>, DomainError> {
    match object.get(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(DomainError::MalformedSuggestion(format!(
            "'{}' must be an array",
            key
        ))),
        None => Err(DomainError::MalformedSuggestion(format!(
            "missing required key '{}'",
            key
        ))),
    }
}

/// Seconds as a number, or a timestamp string such as "0:08"
fn time_field(entry: &Map<String, Value>, key: &str) -> Result<f64, String> {
    match entry.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("'{}' is not a finite number", key)),
        Some(Value::String(s)) => TimeSpec::parse(s)
            .map(|t| t.as_seconds())
            .map_err(|e| format!("'{}': {}", key, e)),
        Some(_) => Err(format!("'{}' must be a number or timestamp", key)),
        None => Err(format!("missing '{}'", key)),
    }
}

fn text_field(entry: &Map<String, Value>, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_string)
}

fn entry_object(item: &Value) -> Result<&Map<String, Value>, String> {
    item.as_object()
        .ok_or_else(|| "entry is not an object".to_string())
}

fn parse_cut(index: usize, item: &Value) -> Result<SuggestedCut, String> {
    let entry = entry_object(item)?;
    Ok(SuggestedCut {
        index,
        start: time_field(entry, "start")?,
        end: time_field(entry, "end")?,
        reason: text_field(entry, "reason")
            .or_else(|| text_field(entry, "description"))
            .unwrap_or_default(),
        kind: text_field(entry, "type").unwrap_or_else(|| "cut".to_string()),
    })
}

fn parse_subtitle(index: usize, item: &Value) -> Result<SubtitleEntry, String> {
    let entry = entry_object(item)?;
    let text = text_field(entry, "text").ok_or_else(|| "missing 'text'".to_string())?;
    if text.trim().is_empty() {
        return Err("empty subtitle text".to_string());
    }
    Ok(SubtitleEntry {
        index,
        start: time_field(entry, "start")?,
        end: time_field(entry, "end")?,
        text,
        position: SubtitlePosition::from_value(entry.get("position")),
    })
}

fn parse_key_moment(index: usize, item: &Value) -> Result<KeyMoment, String> {
    let entry = entry_object(item)?;
    Ok(KeyMoment {
        index,
        time: time_field(entry, "time")?,
        description: text_field(entry, "description").unwrap_or_default(),
        importance: Importance::from_value(entry.get("importance"))?,
    })
}
