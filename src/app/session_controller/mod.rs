// Session controller - Owns the live session and serializes every mutation

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;

use crate::domain::effects::{EffectCategory, ParamValue, RenderAttributes};
use crate::domain::errors::*;
use crate::domain::merge::{MergeReport, SuggestionMerger};
use crate::domain::model::*;
use crate::domain::rules::OverlayResolver;
use crate::domain::session::{Session, SessionSnapshot};
use crate::domain::suggestion::{Suggestion, SuggestionId};
use crate::ports::*;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Editing,
    Analyzing,
    Exporting,
}

/// Discrete, synchronous edit events
#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    Seek(f64),
    TogglePlay,
    Play,
    Pause,
    /// Playback clock tick; only advances while playing
    Tick(f64),
    AddClip(Clip),
    AddText { start: f64, end: f64, text: String },
    Split { clip: ClipId, time: f64 },
    /// Split the video clip under the playhead
    SplitAtPlayhead,
    Delete(ClipId),
    Move { clip: ClipId, start: f64 },
    SetEffect {
        category: EffectCategory,
        name: String,
        value: ParamValue,
    },
    ResetEffects(Option<EffectCategory>),
    SetClipParameter {
        clip: ClipId,
        key: String,
        value: ParamValue,
    },
    SetText { clip: ClipId, text: String },
    SetLocked { clip: ClipId, locked: bool },
    Select(ClipId),
    ClearSelection,
}

impl EditEvent {
    fn name(&self) -> &'static str {
        match self {
            EditEvent::Seek(_) => "seek",
            EditEvent::TogglePlay => "toggle_play",
            EditEvent::Play => "play",
            EditEvent::Pause => "pause",
            EditEvent::Tick(_) => "tick",
            EditEvent::AddClip(_) => "add_clip",
            EditEvent::AddText { .. } => "add_text",
            EditEvent::Split { .. } => "split",
            EditEvent::SplitAtPlayhead => "split_at_playhead",
            EditEvent::Delete(_) => "delete",
            EditEvent::Move { .. } => "move",
            EditEvent::SetEffect { .. } => "set_effect",
            EditEvent::ResetEffects(_) => "reset_effects",
            EditEvent::SetClipParameter { .. } => "set_clip_parameter",
            EditEvent::SetText { .. } => "set_text",
            EditEvent::SetLocked { .. } => "set_locked",
            EditEvent::Select(_) => "select",
            EditEvent::ClearSelection => "clear_selection",
        }
    }
}

/// Result of an edit event
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Applied,
    ClipAdded(ClipId),
    ClipSplit { first: ClipId, second: ClipId },
    ClipDeleted(Option<Clip>),
    ParameterSet(ParamValue),
}

/// What became of an analysis response
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Merged into the session
    Merged(MergeReport),
    /// Arrived during an export; merged when the export completes
    Deferred(SuggestionId),
    /// Superseded by a newer request or a media load
    Discarded,
}

/// Proof of export ownership. Only `finish_export` consumes it.
#[derive(Debug)]
pub struct ExportToken {
    id: u64,
}

impl ExportToken {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Outcome of a finished export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportCompletion {
    pub render: Result<RenderReport, DomainError>,
    /// Report of a suggestion that was parked during the export
    pub deferred_merge: Option<MergeReport>,
}

/// Everything visible at one playhead position, read under a single lock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameView {
    pub position: f64,
    pub video: Option<Clip>,
    /// The winning caption
    pub overlay: Option<Clip>,
    /// All active captions in paint order
    pub overlays: Vec<Clip>,
    pub audio: Vec<Clip>,
    pub attributes: RenderAttributes,
}

impl FrameView {
    pub fn capture(session: &Session) -> Self {
        let position = session.clock().position();
        let store = session.store();
        let video = OverlayResolver::video_at(store, position).cloned();
        let attributes = match &video {
            Some(clip) => session
                .effects()
                .resolve_with_overrides(position, &clip.parameters),
            None => session.effects().resolve(position),
        };
        Self {
            position,
            video,
            overlay: OverlayResolver::resolve(store, position).cloned(),
            overlays: OverlayResolver::stack(store, position)
                .into_iter()
                .cloned()
                .collect(),
            audio: store
                .query_at(TrackKind::Audio, position)
                .into_iter()
                .cloned()
                .collect(),
            attributes,
        }
    }
}

/// Immutable copy of the session published after every write
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Increases with every publication
    pub revision: u64,
    pub phase: SessionPhase,
    pub session: Option<Session>,
    pub last_merge: Option<MergeReport>,
}

impl SessionView {
    /// Frame at the published playhead, consistent with the rest of the view
    pub fn frame(&self) -> Option<FrameView> {
        self.session.as_ref().map(FrameView::capture)
    }
}

/// A suggestion waiting for the export to finish
#[derive(Debug)]
struct ParkedSuggestion {
    generation: u64,
    suggestion: Suggestion,
    campaign: CampaignContext,
}

#[derive(Debug, Default)]
struct SessionState {
    session: Option<Session>,
    /// Bumped by every analysis request, media load and restore
    generation: u64,
    analysis_in_flight: Option<u64>,
    export_in_flight: Option<u64>,
    next_export: u64,
    parked: Option<ParkedSuggestion>,
    last_merge: Option<MergeReport>,
    revision: u64,
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        if self.session.is_none() {
            SessionPhase::Idle
        } else if self.export_in_flight.is_some() {
            SessionPhase::Exporting
        } else if self.analysis_in_flight.is_some() {
            SessionPhase::Analyzing
        } else {
            SessionPhase::Editing
        }
    }

    fn session(&self) -> Result<&Session, DomainError> {
        self.session.as_ref().ok_or(DomainError::NoMediaLoaded)
    }

    /// The session, if it may be mutated right now
    fn editable(&mut self, action: &str) -> Result<&mut Session, DomainError> {
        if self.export_in_flight.is_some() {
            return Err(DomainError::SessionBusy(format!(
                "cannot {} while exporting",
                action
            )));
        }
        self.session.as_mut().ok_or(DomainError::NoMediaLoaded)
    }

    fn cancel_analysis(&mut self) {
        self.generation += 1;
        if self.analysis_in_flight.take().is_some() {
            tracing::info!(generation = self.generation, "In-flight analysis superseded");
        }
        self.parked = None;
    }

    fn merge_parked(&mut self) -> Option<MergeReport> {
        let parked = self.parked.take()?;
        if parked.generation != self.generation {
            tracing::info!("Parked suggestion superseded, discarding");
            return None;
        }
        let session = self.session.as_mut()?;
        match merge_with_campaign(session, &parked.suggestion, parked.campaign) {
            Ok(report) => {
                self.last_merge = Some(report.clone());
                Some(report)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Parked suggestion could not be merged");
                None
            }
        }
    }
}

fn merge_with_campaign(
    session: &mut Session,
    suggestion: &Suggestion,
    campaign: CampaignContext,
) -> Result<MergeReport, DomainError> {
    let report = SuggestionMerger::merge(session, suggestion)?;
    if !report.duplicate {
        session.set_campaign(campaign);
    }
    Ok(report)
}

/// Releases the export slot if the export future is dropped before finishing
struct ExportGuard<'a> {
    controller: &'a SessionController,
    token: Option<ExportToken>,
}

impl<'a> ExportGuard<'a> {
    fn finish(
        mut self,
        render: Result<RenderReport, DomainError>,
    ) -> Result<ExportCompletion, DomainError> {
        match self.token.take() {
            Some(token) => self.controller.finish_export(token, render),
            None => Err(DomainError::InternalError("Export token already released".to_string())),
        }
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            tracing::warn!(export = token.id, "Export abandoned, releasing session");
            let _ = self.controller.finish_export(
                token,
                Err(DomainError::RenderFailed("export cancelled".to_string())),
            );
        }
    }
}

/// Clears the analysis slot if the analysis future is dropped mid-request
struct AnalysisGuard<'a> {
    controller: &'a SessionController,
    generation: Option<u64>,
}

impl AnalysisGuard<'_> {
    /// The response arrived; the caller settles the slot itself
    fn disarm(mut self) {
        self.generation = None;
    }
}

impl Drop for AnalysisGuard<'_> {
    fn drop(&mut self) {
        let Some(generation) = self.generation.take() else {
            return;
        };
        if let Ok(mut state) = self.controller.lock() {
            if state.analysis_in_flight == Some(generation) {
                tracing::warn!(generation, "Analysis abandoned, releasing session");
                state.analysis_in_flight = None;
                self.controller.publish(&mut state);
            }
        }
    }
}

/// Owns one editing session and the collaborators it talks to
pub struct SessionController {
    state: Mutex<SessionState>,
    views: watch::Sender<Arc<SessionView>>,
    analysis_port: Arc<dyn AnalysisPort>,
    render_port: Arc<dyn RenderPort>,
}

impl SessionController {
    /// Create an idle controller with injected ports
    pub fn new(analysis_port: Arc<dyn AnalysisPort>, render_port: Arc<dyn RenderPort>) -> Self {
        let (views, _) = watch::channel(Arc::new(SessionView {
            revision: 0,
            phase: SessionPhase::Idle,
            session: None,
            last_merge: None,
        }));
        Self {
            state: Mutex::new(SessionState::default()),
            views,
            analysis_port,
            render_port,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::InternalError("Session lock poisoned".to_string()))
    }

    /// Publish a view of `state`; called with the lock held
    fn publish(&self, state: &mut SessionState) {
        state.revision += 1;
        let view = SessionView {
            revision: state.revision,
            phase: state.phase(),
            session: state.session.clone(),
            last_merge: state.last_merge.clone(),
        };
        self.views.send_replace(Arc::new(view));
    }

    /// Observe published views
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionView>> {
        self.views.subscribe()
    }

    pub fn phase(&self) -> Result<SessionPhase, DomainError> {
        Ok(self.lock()?.phase())
    }

    pub fn is_analyzing(&self) -> Result<bool, DomainError> {
        Ok(self.lock()?.analysis_in_flight.is_some())
    }

    pub fn is_exporting(&self) -> Result<bool, DomainError> {
        Ok(self.lock()?.export_in_flight.is_some())
    }

    /// Load media, replacing any current session and cancelling analysis
    pub fn load_media(&self, source: &str, duration: Option<f64>) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        if state.export_in_flight.is_some() {
            return Err(DomainError::SessionBusy(
                "cannot load media while exporting".to_string(),
            ));
        }
        let session = Session::with_media(source, duration)?;
        state.cancel_analysis();
        state.session = Some(session);
        state.last_merge = None;
        tracing::info!(source, ?duration, "Media loaded");
        self.publish(&mut state);
        Ok(())
    }

    /// Late duration from media metadata
    pub fn resolve_media_duration(&self, duration: f64) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        state.editable("resolve duration")?.resolve_duration(duration)?;
        self.publish(&mut state);
        Ok(())
    }

    /// Apply one edit event
    pub fn handle(&self, event: EditEvent) -> Result<EditOutcome, DomainError> {
        let mut state = self.lock()?;
        let name = event.name();
        let session = match state.editable(name) {
            Ok(session) => session,
            Err(err) => {
                tracing::debug!(event = name, error = %err, "Edit event rejected");
                return Err(err);
            }
        };

        let clock_before =
            matches!(event, EditEvent::Tick(_)).then(|| session.clock().clone());
        let outcome = Self::apply(session, event).map_err(|err| {
            tracing::debug!(event = name, error = %err, "Edit event failed");
            err
        })?;
        // Idle ticks leave nothing new to observe
        if clock_before.map_or(false, |before| session.clock() == &before) {
            return Ok(outcome);
        }
        self.publish(&mut state);
        Ok(outcome)
    }

    fn apply(session: &mut Session, event: EditEvent) -> Result<EditOutcome, DomainError> {
        let outcome = match event {
            EditEvent::Seek(time) => {
                session.clock_mut().seek(time);
                EditOutcome::Applied
            }
            EditEvent::TogglePlay => {
                session.clock_mut().toggle_play();
                EditOutcome::Applied
            }
            EditEvent::Play => {
                session.clock_mut().play();
                EditOutcome::Applied
            }
            EditEvent::Pause => {
                session.clock_mut().pause();
                EditOutcome::Applied
            }
            EditEvent::Tick(delta) => {
                if session.clock().is_playing() {
                    session.clock_mut().advance(delta);
                }
                EditOutcome::Applied
            }
            EditEvent::AddClip(clip) => EditOutcome::ClipAdded(session.add_clip(clip)?),
            EditEvent::AddText { start, end, text } => {
                EditOutcome::ClipAdded(session.add_clip(Clip::text(start, end, text)?)?)
            }
            EditEvent::Split { clip, time } => {
                let (first, second) = session.split(clip, time)?;
                EditOutcome::ClipSplit { first, second }
            }
            EditEvent::SplitAtPlayhead => {
                let position = session.clock().position();
                let clip = session
                    .clip_at_playhead()
                    .map(|c| c.id)
                    .ok_or_else(|| {
                        DomainError::BadArgs(format!("No video clip at {:.3}s", position))
                    })?;
                let (first, second) = session.split(clip, position)?;
                EditOutcome::ClipSplit { first, second }
            }
            EditEvent::Delete(clip) => EditOutcome::ClipDeleted(session.delete_clip(clip)?),
            EditEvent::Move { clip, start } => {
                session.move_clip(clip, start)?;
                EditOutcome::Applied
            }
            EditEvent::SetEffect {
                category,
                name,
                value,
            } => EditOutcome::ParameterSet(session.set_effect(category, &name, value)?),
            EditEvent::ResetEffects(category) => {
                match category {
                    Some(category) => session.effects_mut().reset_category(category),
                    None => session.effects_mut().reset_all(),
                }
                EditOutcome::Applied
            }
            EditEvent::SetClipParameter { clip, key, value } => {
                let (_, stored) = session.set_clip_parameter(clip, &key, value)?;
                EditOutcome::ParameterSet(stored)
            }
            EditEvent::SetText { clip, text } => {
                session.set_text(clip, text)?;
                EditOutcome::Applied
            }
            EditEvent::SetLocked { clip, locked } => {
                session.set_locked(clip, locked)?;
                EditOutcome::Applied
            }
            EditEvent::Select(clip) => {
                session.select(clip)?;
                EditOutcome::Applied
            }
            EditEvent::ClearSelection => {
                session.clear_selection();
                EditOutcome::Applied
            }
        };
        Ok(outcome)
    }

    /// Run analysis for the loaded media and merge the result.
    ///
    /// The session lock is released while the collaborator runs, so edits keep
    /// flowing. A newer request or media load supersedes this one and its
    /// response is discarded.
    pub async fn analyze(&self, campaign: CampaignContext) -> Result<AnalysisOutcome, DomainError> {
        let (generation, request) = {
            let mut state = self.lock()?;
            let session = state.session()?;
            let duration = session.duration().ok_or_else(|| {
                DomainError::BadArgs("Media duration must be resolved before analysis".to_string())
            })?;
            let source = session
                .primary_source()
                .ok_or(DomainError::NoMediaLoaded)?
                .to_string();

            state.cancel_analysis();
            let generation = state.generation;
            state.analysis_in_flight = Some(generation);
            self.publish(&mut state);
            (
                generation,
                AnalysisRequest {
                    source,
                    duration,
                    campaign_goal: campaign.goal,
                    target_audience: campaign.audience,
                },
            )
        };

        tracing::info!(generation, goal = %campaign.goal, audience = %campaign.audience, "Analysis requested");
        let guard = AnalysisGuard {
            controller: self,
            generation: Some(generation),
        };
        let response = self.analysis_port.analyze(&request).await;
        guard.disarm();

        let mut state = self.lock()?;
        if state.generation != generation {
            tracing::info!(generation, current = state.generation, "Discarding superseded analysis response");
            return Ok(AnalysisOutcome::Discarded);
        }
        state.analysis_in_flight = None;

        let parsed = response.and_then(|payload| Suggestion::from_payload(&payload));
        let suggestion = match parsed {
            Ok(suggestion) => suggestion,
            Err(err) => {
                tracing::warn!(generation, error = %err, "Analysis failed, session unchanged");
                self.publish(&mut state);
                return Err(err);
            }
        };

        if state.export_in_flight.is_some() {
            let id = suggestion.id.clone();
            tracing::info!(suggestion = %id, "Export in progress, parking suggestion");
            state.parked = Some(ParkedSuggestion {
                generation,
                suggestion,
                campaign,
            });
            self.publish(&mut state);
            return Ok(AnalysisOutcome::Deferred(id));
        }

        let session = state.session.as_mut().ok_or(DomainError::NoMediaLoaded)?;
        let merged = merge_with_campaign(session, &suggestion, campaign);
        match merged {
            Ok(report) => {
                state.last_merge = Some(report.clone());
                self.publish(&mut state);
                Ok(AnalysisOutcome::Merged(report))
            }
            Err(err) => {
                self.publish(&mut state);
                Err(err)
            }
        }
    }

    /// Supersede any in-flight analysis
    pub fn cancel_analysis(&self) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        state.cancel_analysis();
        self.publish(&mut state);
        Ok(())
    }

    /// Freeze the session for export and hand out the only release token
    pub fn begin_export(
        &self,
        settings: &RenderSettings,
    ) -> Result<(ExportToken, SessionSnapshot), DomainError> {
        settings.validate()?;
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let session = state.session.as_mut().ok_or(DomainError::NoMediaLoaded)?;
        if let Some(current) = state.export_in_flight {
            return Err(DomainError::SessionBusy(format!(
                "export {} already in progress",
                current
            )));
        }
        if session.duration().is_none() {
            return Err(DomainError::BadArgs(
                "Media duration must be resolved before export".to_string(),
            ));
        }

        session.clock_mut().pause();
        let snapshot = session.snapshot(Utc::now());
        state.next_export += 1;
        let id = state.next_export;
        state.export_in_flight = Some(id);
        tracing::info!(export = id, clips = snapshot.clip_count(), "Export started");
        self.publish(state);
        Ok((ExportToken { id }, snapshot))
    }

    /// Release the export slot and merge anything parked meanwhile
    pub fn finish_export(
        &self,
        token: ExportToken,
        render: Result<RenderReport, DomainError>,
    ) -> Result<ExportCompletion, DomainError> {
        let mut state = self.lock()?;
        if state.export_in_flight != Some(token.id) {
            return Err(DomainError::InternalError(format!(
                "Export token {} does not own the session",
                token.id
            )));
        }
        state.export_in_flight = None;
        match &render {
            Ok(report) => tracing::info!(export = token.id, output = %report.output, "Export finished"),
            Err(err) => tracing::warn!(export = token.id, error = %err, "Export failed"),
        }
        let deferred_merge = state.merge_parked();
        self.publish(&mut state);
        Ok(ExportCompletion {
            render,
            deferred_merge,
        })
    }

    /// Export through the render port. The session is always released.
    pub async fn export(&self, settings: RenderSettings) -> Result<ExportCompletion, DomainError> {
        let (token, snapshot) = self.begin_export(&settings)?;
        let guard = ExportGuard {
            controller: self,
            token: Some(token),
        };
        let job = RenderJob {
            snapshot,
            settings,
            requested_at: Utc::now(),
        };
        let render = self.render_port.render(&job).await;
        guard.finish(render)
    }

    /// Consistent view of the current frame
    pub fn frame(&self) -> Result<FrameView, DomainError> {
        let state = self.lock()?;
        Ok(FrameView::capture(state.session()?))
    }

    /// Owned copy of the persistable state
    pub fn snapshot(&self) -> Result<SessionSnapshot, DomainError> {
        let state = self.lock()?;
        Ok(state.session()?.snapshot(Utc::now()))
    }

    /// Replace the session with one rebuilt from a snapshot
    pub fn restore(&self, snapshot: SessionSnapshot) -> Result<(), DomainError> {
        let mut state = self.lock()?;
        if state.export_in_flight.is_some() {
            return Err(DomainError::SessionBusy(
                "cannot restore while exporting".to_string(),
            ));
        }
        let session = Session::restore(snapshot)?;
        state.cancel_analysis();
        state.session = Some(session);
        state.last_merge = None;
        self.publish(&mut state);
        Ok(())
    }

    /// Read the live session under the lock
    pub fn with_session<T>(&self, read: impl FnOnce(&Session) -> T) -> Result<T, DomainError> {
        let state = self.lock()?;
        Ok(read(state.session()?))
    }
}
