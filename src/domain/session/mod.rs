//! The editing session aggregate and its persisted snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::clock::Clock;
use crate::domain::effects::{lookup_key, EffectCategory, EffectPipeline, ParamValue};
use crate::domain::errors::DomainError;
use crate::domain::merge::TEXT_POSITION_PARAM;
use crate::domain::model::{CampaignContext, Clip, ClipId, TrackKind};
use crate::domain::suggestion::SuggestionId;
use crate::domain::timeline::{Track, TrackStore};

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything one editing session owns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    store: TrackStore,
    effects: EffectPipeline,
    clock: Clock,
    selection: Option<ClipId>,
    suggestion_history: Vec<SuggestionId>,
    primary_source: Option<String>,
    campaign: Option<CampaignContext>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh session for a media source; the duration may arrive later
    pub fn with_media(source: impl Into<String>, duration: Option<f64>) -> Result<Self, DomainError> {
        let source = source.into();
        if source.trim().is_empty() {
            return Err(DomainError::BadArgs("Media source cannot be empty".to_string()));
        }
        let mut session = Self::new();
        session.primary_source = Some(source);
        if let Some(duration) = duration {
            session.resolve_duration(duration)?;
        }
        Ok(session)
    }

    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    pub fn effects(&self) -> &EffectPipeline {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectPipeline {
        &mut self.effects
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn selection(&self) -> Option<ClipId> {
        self.selection
    }

    pub fn suggestion_history(&self) -> &[SuggestionId] {
        &self.suggestion_history
    }

    pub fn primary_source(&self) -> Option<&str> {
        self.primary_source.as_deref()
    }

    pub fn campaign(&self) -> Option<CampaignContext> {
        self.campaign
    }

    pub fn set_campaign(&mut self, campaign: CampaignContext) {
        self.campaign = Some(campaign);
    }

    /// Session duration, once resolved
    pub fn duration(&self) -> Option<f64> {
        self.clock.is_resolved().then(|| self.clock.duration())
    }

    /// Resolve the media duration for both the clock and the track bound
    pub fn resolve_duration(&mut self, duration: f64) -> Result<(), DomainError> {
        let mut clock = self.clock.clone();
        clock.set_duration(duration)?;
        self.store.set_bound(duration)?;
        self.clock = clock;
        Ok(())
    }

    pub fn add_clip(&mut self, clip: Clip) -> Result<ClipId, DomainError> {
        self.store.add_clip(clip)
    }

    pub fn split(&mut self, id: ClipId, time: f64) -> Result<(ClipId, ClipId), DomainError> {
        self.store.split(id, time)
    }

    /// Delete a clip, clearing the selection if it pointed at it
    pub fn delete_clip(&mut self, id: ClipId) -> Result<Option<Clip>, DomainError> {
        let removed = self.store.delete_clip(id)?;
        if self.selection == Some(id) {
            self.selection = None;
        }
        Ok(removed)
    }

    pub fn move_clip(&mut self, id: ClipId, new_start: f64) -> Result<(), DomainError> {
        self.store.move_clip(id, new_start)
    }

    pub fn set_locked(&mut self, id: ClipId, locked: bool) -> Result<(), DomainError> {
        self.store.set_locked(id, locked)
    }

    pub fn set_text(&mut self, id: ClipId, text: impl Into<String>) -> Result<(), DomainError> {
        self.store.set_text(id, text)
    }

    /// Per-clip override of an effect parameter or the caption position.
    /// Returns the canonical key and the stored value.
    pub fn set_clip_parameter(
        &mut self,
        id: ClipId,
        key: &str,
        value: ParamValue,
    ) -> Result<(String, ParamValue), DomainError> {
        let (key, value) = if key.trim() == TEXT_POSITION_PARAM {
            let position = value
                .as_choice()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| matches!(p.as_str(), "top" | "center" | "bottom"))
                .ok_or_else(|| DomainError::ParameterTypeMismatch {
                    parameter: TEXT_POSITION_PARAM.to_string(),
                    expected: "one of top, center, bottom".to_string(),
                })?;
            (TEXT_POSITION_PARAM.to_string(), ParamValue::Choice(position))
        } else {
            let def =
                lookup_key(key).ok_or_else(|| DomainError::UnknownParameter(key.to_string()))?;
            (def.key(), def.validate(&value)?)
        };
        self.store
            .set_clip_parameter(id, key.clone(), value.clone())?;
        Ok((key, value))
    }

    pub fn set_effect(
        &mut self,
        category: EffectCategory,
        name: &str,
        value: ParamValue,
    ) -> Result<ParamValue, DomainError> {
        self.effects.set_parameter(category, name, value)
    }

    pub fn select(&mut self, id: ClipId) -> Result<(), DomainError> {
        if !self.store.contains(id) {
            return Err(DomainError::ClipNotFound(id.to_string()));
        }
        self.selection = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// The video clip under the playhead
    pub fn clip_at_playhead(&self) -> Option<&Clip> {
        self.store
            .query_at(TrackKind::Video, self.clock.position())
            .into_iter()
            .next()
    }

    pub fn has_merged(&self, id: &SuggestionId) -> bool {
        self.suggestion_history.contains(id)
    }

    pub(crate) fn record_suggestion(&mut self, id: SuggestionId) {
        if !self.has_merged(&id) {
            self.suggestion_history.push(id);
        }
    }

    /// Owned copy of the persistable state
    pub fn snapshot(&self, saved_at: DateTime<Utc>) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            tracks: self.store.to_tracks(),
            effect_parameters: self.effects.clone(),
            duration: self.duration(),
            primary_source: self.primary_source.clone(),
            campaign: self.campaign,
            suggestion_history: self.suggestion_history.clone(),
            saved_at,
        }
    }

    /// Rebuild a session from a snapshot, re-validating every clip and parameter
    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, DomainError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DomainError::BadArgs(format!(
                "Unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let clock = match snapshot.duration {
            Some(duration) => Clock::with_duration(duration)?,
            None => Clock::new(),
        };
        let store = TrackStore::from_tracks(snapshot.tracks, snapshot.duration)?;

        let mut effects = EffectPipeline::new();
        for (key, value) in snapshot.effect_parameters.entries() {
            let def = lookup_key(&key).ok_or_else(|| DomainError::UnknownParameter(key.clone()))?;
            effects.set_parameter(def.category, def.name, value)?;
        }

        Ok(Self {
            store,
            effects,
            clock,
            selection: None,
            suggestion_history: snapshot.suggestion_history,
            primary_source: snapshot.primary_source,
            campaign: snapshot.campaign,
        })
    }
}

/// Serialized session state handed to the renderer and the project store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub tracks: Vec<Track>,
    pub effect_parameters: EffectPipeline,
    pub duration: Option<f64>,
    #[serde(default)]
    pub primary_source: Option<String>,
    #[serde(default)]
    pub campaign: Option<CampaignContext>,
    #[serde(default)]
    pub suggestion_history: Vec<SuggestionId>,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }
}
