//! Merges validated suggestions into a session without touching user edits.

use serde::Serialize;

use crate::domain::effects::ParamValue;
use crate::domain::errors::DomainError;
use crate::domain::model::{Clip, ClipOrigin, TrackKind};
use crate::domain::session::Session;
use crate::domain::suggestion::{EntryCategory, KeyMoment, SkippedEntry, Suggestion, SuggestionId};

/// Clip parameter carrying a caption's screen position
pub const TEXT_POSITION_PARAM: &str = "text.position";

/// What a merge did, entry by entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub suggestion_id: SuggestionId,
    /// The suggestion was merged before; nothing changed
    pub duplicate: bool,
    pub cuts_added: usize,
    pub cuts_skipped_invalid: usize,
    pub cuts_skipped_overlap: usize,
    pub subtitles_added: usize,
    pub subtitles_skipped_invalid: usize,
    pub applied_parameters: usize,
    pub ignored_parameters: usize,
    pub clamped_parameters: usize,
    pub mood: Option<String>,
    pub emotions: Vec<String>,
    pub key_moments: Vec<KeyMoment>,
    pub skipped: Vec<SkippedEntry>,
}

impl MergeReport {
    fn empty(suggestion_id: SuggestionId) -> Self {
        Self {
            suggestion_id,
            duplicate: false,
            cuts_added: 0,
            cuts_skipped_invalid: 0,
            cuts_skipped_overlap: 0,
            subtitles_added: 0,
            subtitles_skipped_invalid: 0,
            applied_parameters: 0,
            ignored_parameters: 0,
            clamped_parameters: 0,
            mood: None,
            emotions: Vec::new(),
            key_moments: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn clips_added(&self) -> usize {
        self.cuts_added + self.subtitles_added
    }

    pub fn entries_skipped(&self) -> usize {
        self.cuts_skipped_invalid + self.cuts_skipped_overlap + self.subtitles_skipped_invalid
    }

    fn skip(&mut self, category: EntryCategory, index: usize, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(?category, index, reason = %reason, "Suggestion entry skipped");
        self.skipped.push(SkippedEntry {
            category,
            index,
            reason,
        });
    }
}

fn range_problem(start: f64, end: f64, duration: f64) -> Option<String> {
    if !start.is_finite() || !end.is_finite() {
        return Some("non-finite time".to_string());
    }
    if start < 0.0 {
        return Some(format!("start {} is negative", start));
    }
    if end <= start {
        return Some(format!("end {} is not after start {}", end, start));
    }
    if end > duration {
        return Some(format!("end {} exceeds duration {}", end, duration));
    }
    None
}

pub struct SuggestionMerger;

impl SuggestionMerger {
    /// Merge a suggestion into the session.
    ///
    /// Invalid entries are dropped individually and overlapping cuts are
    /// skipped, never resized or replacing what is already on the track.
    /// A suggestion merged before is reported as a duplicate and changes
    /// nothing. The session is only replaced once the whole merge succeeds.
    pub fn merge(session: &mut Session, suggestion: &Suggestion) -> Result<MergeReport, DomainError> {
        let mut report = MergeReport::empty(suggestion.id.clone());
        if session.has_merged(&suggestion.id) {
            tracing::info!(suggestion = %suggestion.id, "Suggestion already merged, skipping");
            report.duplicate = true;
            return Ok(report);
        }

        let duration = session.duration().ok_or_else(|| {
            DomainError::BadArgs("Session duration must be resolved before merging".to_string())
        })?;

        let mut staged = session.clone();
        let source = staged.primary_source().map(str::to_string);

        for entry in &suggestion.unreadable {
            match entry.category {
                EntryCategory::Cut => report.cuts_skipped_invalid += 1,
                EntryCategory::Subtitle => report.subtitles_skipped_invalid += 1,
                EntryCategory::KeyMoment => {}
            }
            report.skip(entry.category, entry.index, entry.reason.clone());
        }

        for cut in &suggestion.suggested_cuts {
            if let Some(reason) = range_problem(cut.start, cut.end, duration) {
                report.cuts_skipped_invalid += 1;
                report.skip(EntryCategory::Cut, cut.index, reason);
                continue;
            }
            let Some(handle) = source.as_deref() else {
                report.cuts_skipped_invalid += 1;
                report.skip(EntryCategory::Cut, cut.index, "no primary video source");
                continue;
            };
            let clip = Clip::media(TrackKind::Video, cut.start, cut.end, handle)?
                .with_origin(ClipOrigin::Machine)
                .with_source_in(cut.start);
            match staged.add_clip(clip) {
                Ok(_) => report.cuts_added += 1,
                Err(DomainError::OverlapNotAllowed { conflicting, .. }) => {
                    report.cuts_skipped_overlap += 1;
                    report.skip(
                        EntryCategory::Cut,
                        cut.index,
                        format!("overlaps existing clip {}", conflicting),
                    );
                }
                Err(err) => {
                    report.cuts_skipped_invalid += 1;
                    report.skip(EntryCategory::Cut, cut.index, err.to_string());
                }
            }
        }

        for subtitle in &suggestion.subtitles {
            if let Some(reason) = range_problem(subtitle.start, subtitle.end, duration) {
                report.subtitles_skipped_invalid += 1;
                report.skip(EntryCategory::Subtitle, subtitle.index, reason);
                continue;
            }
            let clip = Clip::text(subtitle.start, subtitle.end, subtitle.text.clone())?
                .with_origin(ClipOrigin::Machine)
                .with_parameter(
                    TEXT_POSITION_PARAM,
                    ParamValue::Choice(subtitle.position.as_str().to_string()),
                );
            match staged.add_clip(clip) {
                Ok(_) => report.subtitles_added += 1,
                Err(err) => {
                    report.subtitles_skipped_invalid += 1;
                    report.skip(EntryCategory::Subtitle, subtitle.index, err.to_string());
                }
            }
        }

        let delta = staged.effects_mut().apply_delta(&suggestion.color_grading);
        report.applied_parameters = delta.applied;
        report.ignored_parameters = delta.ignored;
        report.clamped_parameters = delta.clamped;

        for moment in &suggestion.key_moments {
            if moment.time.is_finite() && (0.0..=duration).contains(&moment.time) {
                report.key_moments.push(moment.clone());
            } else {
                report.skip(
                    EntryCategory::KeyMoment,
                    moment.index,
                    format!("time {} outside [0, {}]", moment.time, duration),
                );
            }
        }
        report.mood = suggestion.mood.clone();
        report.emotions = suggestion.emotions.clone();

        staged.record_suggestion(suggestion.id.clone());
        *session = staged;

        tracing::info!(
            suggestion = %report.suggestion_id,
            cuts_added = report.cuts_added,
            subtitles_added = report.subtitles_added,
            skipped = report.entries_skipped(),
            ignored_parameters = report.ignored_parameters,
            "Suggestion merged"
        );
        Ok(report)
    }
}
