//! Track and clip store.
//!
//! Owns the ordered clip collections for each track kind. Every mutation is
//! validated in full before anything is written, so a failed call leaves the
//! store exactly as it was.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::effects::ParamValue;
use crate::domain::errors::DomainError;
use crate::domain::model::{validate_range, Clip, ClipId, ClipSource, TrackKind};
use crate::domain::rules::OverlapPolicy;

/// An ordered set of clips of one kind, kept in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub kind: TrackKind,
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            clips: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    fn position_of(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    /// First clip other than `except` overlapping [start, end)
    fn first_overlap(&self, start: f64, end: f64, except: Option<ClipId>) -> Option<&Clip> {
        self.clips
            .iter()
            .filter(|c| Some(c.id) != except)
            .find(|c| c.overlaps(start, end))
    }
}

/// Ordering used by every query: start ascending, then insertion order
fn by_start_then_seq(a: &&Clip, b: &&Clip) -> std::cmp::Ordering {
    a.start.total_cmp(&b.start).then(a.seq.cmp(&b.seq))
}

/// Clip collections for all track kinds
#[derive(Debug, Clone)]
pub struct TrackStore {
    tracks: BTreeMap<TrackKind, Track>,
    next_seq: u64,
    bound: Option<f64>,
}

// The sequence counter is bookkeeping, not content
impl PartialEq for TrackStore {
    fn eq(&self, other: &Self) -> bool {
        self.tracks == other.tracks && self.bound == other.bound
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackStore {
    /// Empty store with one track per kind and no time bound
    pub fn new() -> Self {
        let tracks = TrackKind::ALL
            .iter()
            .map(|kind| (*kind, Track::new(*kind)))
            .collect();
        Self {
            tracks,
            next_seq: 1,
            bound: None,
        }
    }

    /// Rebuild a store from serialized tracks, re-checking every invariant
    pub fn from_tracks(tracks: Vec<Track>, bound: Option<f64>) -> Result<Self, DomainError> {
        let mut store = Self::new();
        store.bound = bound;

        for track in tracks {
            for clip in track.clips {
                if clip.track_kind != track.kind {
                    return Err(DomainError::BadArgs(format!(
                        "Clip {} of kind {} stored on {} track",
                        clip.id, clip.track_kind, track.kind
                    )));
                }
                if store.contains(clip.id) {
                    return Err(DomainError::BadArgs(format!(
                        "Duplicate clip id: {}",
                        clip.id
                    )));
                }
                store.check_window(clip.track_kind, clip.start, clip.end, None)?;
                store.next_seq = store.next_seq.max(clip.seq.saturating_add(1));
                store
                    .tracks
                    .entry(clip.track_kind)
                    .or_insert_with(|| Track::new(clip.track_kind))
                    .clips
                    .push(clip);
            }
        }
        Ok(store)
    }

    /// Upper time bound (the resolved session duration), if any
    pub fn bound(&self) -> Option<f64> {
        self.bound
    }

    /// Fix the upper bound. Fails if an existing clip already exceeds it.
    pub fn set_bound(&mut self, bound: f64) -> Result<(), DomainError> {
        if let Some(clip) = self.all_clips().find(|c| c.end > bound) {
            return Err(DomainError::InvalidRange {
                start: clip.start,
                end: clip.end,
                reason: format!("clip {} exceeds duration {:.3}s", clip.id, bound),
            });
        }
        self.bound = Some(bound);
        Ok(())
    }

    pub fn track(&self, kind: TrackKind) -> Option<&Track> {
        self.tracks.get(&kind)
    }

    /// Clips on a track in insertion order
    pub fn clips(&self, kind: TrackKind) -> &[Clip] {
        self.tracks
            .get(&kind)
            .map(|t| t.clips.as_slice())
            .unwrap_or(&[])
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn all_clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.values().flat_map(|t| t.clips.iter())
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.values().map(|t| t.len()).sum()
    }

    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.all_clips().find(|c| c.id == id)
    }

    pub fn contains(&self, id: ClipId) -> bool {
        self.get(id).is_some()
    }

    fn locate(&self, id: ClipId) -> Option<(TrackKind, usize)> {
        self.tracks
            .iter()
            .find_map(|(kind, track)| track.position_of(id).map(|idx| (*kind, idx)))
    }

    fn locate_unlocked(&self, id: ClipId) -> Result<(TrackKind, usize, &Clip), DomainError> {
        let (kind, idx) = self
            .locate(id)
            .ok_or_else(|| DomainError::ClipNotFound(id.to_string()))?;
        let clip = &self.tracks[&kind].clips[idx];
        if clip.locked {
            return Err(DomainError::ClipLocked(id.to_string()));
        }
        Ok((kind, idx, clip))
    }

    fn check_window(
        &self,
        kind: TrackKind,
        start: f64,
        end: f64,
        except: Option<ClipId>,
    ) -> Result<(), DomainError> {
        validate_range(start, end)?;
        if let Some(bound) = self.bound {
            if end > bound {
                return Err(DomainError::InvalidRange {
                    start,
                    end,
                    reason: format!("exceeds session duration {:.3}s", bound),
                });
            }
        }
        if OverlapPolicy::for_kind(kind) == OverlapPolicy::Exclusive {
            if let Some(other) = self.tracks[&kind].first_overlap(start, end, except) {
                return Err(DomainError::OverlapNotAllowed {
                    track: kind.to_string(),
                    conflicting: other.id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Append a clip to the track matching its kind
    pub fn add_clip(&mut self, mut clip: Clip) -> Result<ClipId, DomainError> {
        if self.contains(clip.id) {
            return Err(DomainError::BadArgs(format!(
                "Clip id already present: {}",
                clip.id
            )));
        }
        let kind = clip.track_kind;
        self.check_window(kind, clip.start, clip.end, None)?;

        clip.seq = self.next_seq;
        self.next_seq += 1;
        let id = clip.id;
        tracing::debug!(clip = %id, track = %kind, start = clip.start, end = clip.end, "Clip added");
        self.tracks
            .entry(kind)
            .or_insert_with(|| Track::new(kind))
            .clips
            .push(clip);
        Ok(id)
    }

    /// Split a clip at `time` into [start, time) and [time, end).
    /// The first half keeps the id; the second half gets a fresh one.
    pub fn split(&mut self, id: ClipId, time: f64) -> Result<(ClipId, ClipId), DomainError> {
        let (kind, idx, clip) = self.locate_unlocked(id)?;
        if !(clip.start < time && time < clip.end) {
            return Err(DomainError::SplitOutOfRange {
                clip_id: id.to_string(),
                time,
                start: clip.start,
                end: clip.end,
            });
        }

        let mut first = clip.clone();
        let mut second = clip.clone();
        first.end = time;
        second.id = ClipId::new();
        second.start = time;
        second.source_in = clip.source_in + (time - clip.start);
        let second_id = second.id;

        let clips = &mut self.tracks.get_mut(&kind).ok_or_else(|| {
            DomainError::InternalError(format!("Track {} missing", kind))
        })?.clips;
        clips[idx] = first;
        clips.insert(idx + 1, second);
        tracing::debug!(clip = %id, second = %second_id, time, "Clip split");
        Ok((id, second_id))
    }

    /// Remove a clip. Absent ids are a no-op so repeated deletes are safe.
    pub fn delete_clip(&mut self, id: ClipId) -> Result<Option<Clip>, DomainError> {
        if !self.contains(id) {
            return Ok(None);
        }
        let (kind, idx, _) = self.locate_unlocked(id)?;
        let removed = self
            .tracks
            .get_mut(&kind)
            .map(|t| t.clips.remove(idx));
        tracing::debug!(clip = %id, "Clip deleted");
        Ok(removed)
    }

    /// Shift a clip so it starts at `new_start`, keeping its duration
    pub fn move_clip(&mut self, id: ClipId, new_start: f64) -> Result<(), DomainError> {
        let (kind, idx, clip) = self.locate_unlocked(id)?;
        let new_end = new_start + clip.duration();
        self.check_window(kind, new_start, new_end, Some(id))?;

        if let Some(track) = self.tracks.get_mut(&kind) {
            let clip = &mut track.clips[idx];
            clip.start = new_start;
            clip.end = new_end;
        }
        tracing::debug!(clip = %id, new_start, "Clip moved");
        Ok(())
    }

    /// Clips on `kind` whose [start, end) contains `time`
    pub fn query_at(&self, kind: TrackKind, time: f64) -> Vec<&Clip> {
        let mut hits: Vec<&Clip> = self.clips(kind).iter().filter(|c| c.contains(time)).collect();
        hits.sort_by(by_start_then_seq);
        hits
    }

    /// Clips on `kind` intersecting [start, end)
    pub fn clips_in_range(&self, kind: TrackKind, start: f64, end: f64) -> Vec<&Clip> {
        let mut hits: Vec<&Clip> = self
            .clips(kind)
            .iter()
            .filter(|c| c.overlaps(start, end))
            .collect();
        hits.sort_by(by_start_then_seq);
        hits
    }

    fn clip_mut(&mut self, id: ClipId) -> Result<&mut Clip, DomainError> {
        self.tracks
            .values_mut()
            .flat_map(|t| t.clips.iter_mut())
            .find(|c| c.id == id)
            .ok_or_else(|| DomainError::ClipNotFound(id.to_string()))
    }

    pub fn set_locked(&mut self, id: ClipId, locked: bool) -> Result<(), DomainError> {
        self.clip_mut(id)?.locked = locked;
        Ok(())
    }

    /// Replace the text of a caption clip
    pub fn set_text(&mut self, id: ClipId, text: impl Into<String>) -> Result<(), DomainError> {
        let (_, _, clip) = self.locate_unlocked(id)?;
        if clip.text_payload().is_none() {
            return Err(DomainError::BadArgs(format!("Clip {} is not a text clip", id)));
        }
        self.clip_mut(id)?.source = ClipSource::Text { text: text.into() };
        Ok(())
    }

    /// Set a per-clip effect or style override
    pub fn set_clip_parameter(
        &mut self,
        id: ClipId,
        key: impl Into<String>,
        value: ParamValue,
    ) -> Result<(), DomainError> {
        self.locate_unlocked(id)?;
        self.clip_mut(id)?.parameters.insert(key.into(), value);
        Ok(())
    }

    /// Tracks in kind order, for serialization
    pub fn to_tracks(&self) -> Vec<Track> {
        self.tracks.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ClipOrigin;

    fn video(start: f64, end: f64) -> Clip {
        Clip::media(TrackKind::Video, start, end, "source.mp4").unwrap()
    }

    fn bounded_store(bound: f64) -> TrackStore {
        let mut store = TrackStore::new();
        store.set_bound(bound).unwrap();
        store
    }

    #[test]
    fn test_split_then_overlapping_add_scenario() {
        let mut store = bounded_store(20.0);
        let id = store.add_clip(video(0.0, 20.0)).unwrap();
        let (first, second) = store.split(id, 8.0).unwrap();

        let clips = store.clips(TrackKind::Video);
        assert_eq!(clips.len(), 2);
        assert_eq!((clips[0].id, clips[0].start, clips[0].end), (first, 0.0, 8.0));
        assert_eq!((clips[1].id, clips[1].start, clips[1].end), (second, 8.0, 20.0));
        assert_eq!(first, id);
        assert_ne!(second, id);
        assert_eq!(clips[1].source_in, 8.0);

        let err = store.add_clip(video(5.0, 10.0)).unwrap_err();
        assert!(matches!(err, DomainError::OverlapNotAllowed { .. }));
        assert_eq!(store.clip_count(), 2);
    }

    #[test]
    fn test_split_then_delete_equals_delete() {
        let mut base = bounded_store(20.0);
        let id = base.add_clip(video(0.0, 20.0)).unwrap();
        base.add_clip(Clip::text(1.0, 3.0, "caption").unwrap()).unwrap();

        let mut split_path = base.clone();
        let (a, b) = split_path.split(id, 8.0).unwrap();
        split_path.delete_clip(a).unwrap();
        split_path.delete_clip(b).unwrap();

        let mut direct = base.clone();
        direct.delete_clip(id).unwrap();

        assert_eq!(split_path, direct);
    }

    #[test]
    fn test_split_out_of_range_leaves_store_unchanged() {
        let mut store = bounded_store(20.0);
        let id = store.add_clip(video(2.0, 6.0)).unwrap();
        let before = store.clone();
        for t in [2.0, 6.0, 1.0, 9.0] {
            assert!(matches!(
                store.split(id, t),
                Err(DomainError::SplitOutOfRange { .. })
            ));
        }
        assert_eq!(store, before);
        assert!(matches!(
            store.split(ClipId::new(), 3.0),
            Err(DomainError::ClipNotFound(_))
        ));
    }

    #[test]
    fn test_split_preserves_origin_and_parameters() {
        let mut store = bounded_store(20.0);
        let clip = Clip::text(0.0, 10.0, "Buy now")
            .unwrap()
            .with_origin(ClipOrigin::Machine)
            .with_parameter("text.position", ParamValue::Choice("bottom".to_string()));
        let id = store.add_clip(clip).unwrap();
        let (_, second) = store.split(id, 4.0).unwrap();
        let second = store.get(second).unwrap();
        assert_eq!(second.origin, ClipOrigin::Machine);
        assert_eq!(second.text_payload(), Some("Buy now"));
        assert_eq!(
            second.parameters.get("text.position"),
            Some(&ParamValue::Choice("bottom".to_string()))
        );
    }

    #[test]
    fn test_text_and_audio_allow_overlap() {
        let mut store = bounded_store(10.0);
        store.add_clip(Clip::text(0.0, 5.0, "one").unwrap()).unwrap();
        store.add_clip(Clip::text(2.0, 6.0, "two").unwrap()).unwrap();
        store
            .add_clip(Clip::media(TrackKind::Audio, 0.0, 10.0, "music.mp3").unwrap())
            .unwrap();
        store
            .add_clip(Clip::media(TrackKind::Audio, 1.0, 4.0, "voice.wav").unwrap())
            .unwrap();
        assert_eq!(store.clip_count(), 4);
    }

    #[test]
    fn test_add_rejects_out_of_bounds() {
        let mut store = bounded_store(10.0);
        let err = store.add_clip(Clip::text(8.0, 12.0, "late").unwrap()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidRange { .. }));
        assert_eq!(store.clip_count(), 0);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = bounded_store(10.0);
        let id = store.add_clip(video(0.0, 5.0)).unwrap();
        assert!(store.delete_clip(id).unwrap().is_some());
        assert!(store.delete_clip(id).unwrap().is_none());
        assert!(store.delete_clip(ClipId::new()).unwrap().is_none());
    }

    #[test]
    fn test_move_clip_rules() {
        let mut store = bounded_store(20.0);
        let a = store.add_clip(video(0.0, 5.0)).unwrap();
        let b = store.add_clip(video(10.0, 15.0)).unwrap();

        store.move_clip(a, 4.0).unwrap();
        let moved = store.get(a).unwrap();
        assert_eq!((moved.start, moved.end), (4.0, 9.0));

        assert!(matches!(
            store.move_clip(a, 7.0),
            Err(DomainError::OverlapNotAllowed { .. })
        ));
        assert!(matches!(
            store.move_clip(b, 17.0),
            Err(DomainError::InvalidRange { .. })
        ));
        assert!(matches!(
            store.move_clip(b, -1.0),
            Err(DomainError::InvalidRange { .. })
        ));
        // Moving onto its own old window is fine
        store.move_clip(b, 12.0).unwrap();
        assert_eq!(store.get(b).unwrap().start, 12.0);
    }

    #[test]
    fn test_locked_clips_reject_edits() {
        let mut store = bounded_store(20.0);
        let id = store.add_clip(video(0.0, 10.0).locked()).unwrap();
        assert!(matches!(store.split(id, 5.0), Err(DomainError::ClipLocked(_))));
        assert!(matches!(store.move_clip(id, 2.0), Err(DomainError::ClipLocked(_))));
        assert!(matches!(store.delete_clip(id), Err(DomainError::ClipLocked(_))));
        store.set_locked(id, false).unwrap();
        store.delete_clip(id).unwrap();
    }

    #[test]
    fn test_query_at_orders_by_start_then_insertion() {
        let mut store = bounded_store(20.0);
        let late = store.add_clip(Clip::text(2.0, 8.0, "late start").unwrap()).unwrap();
        let early_a = store.add_clip(Clip::text(1.0, 8.0, "a").unwrap()).unwrap();
        let early_b = store.add_clip(Clip::text(1.0, 8.0, "b").unwrap()).unwrap();
        store.add_clip(Clip::text(9.0, 10.0, "later").unwrap()).unwrap();

        let ids: Vec<ClipId> = store.query_at(TrackKind::Text, 3.0).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![early_a, early_b, late]);
        assert!(store.query_at(TrackKind::Text, 8.0).is_empty());
        assert_eq!(store.clips_in_range(TrackKind::Text, 7.5, 9.5).len(), 4);
    }

    #[test]
    fn test_set_text_only_on_captions() {
        let mut store = bounded_store(20.0);
        let caption = store.add_clip(Clip::text(0.0, 2.0, "old").unwrap()).unwrap();
        let shot = store.add_clip(video(0.0, 2.0)).unwrap();
        store.set_text(caption, "new").unwrap();
        assert_eq!(store.get(caption).unwrap().text_payload(), Some("new"));
        assert!(store.set_text(shot, "nope").is_err());
    }

    #[test]
    fn test_set_bound_rejects_existing_overflow() {
        let mut store = TrackStore::new();
        store.add_clip(video(0.0, 30.0)).unwrap();
        assert!(store.set_bound(20.0).is_err());
        assert_eq!(store.bound(), None);
        store.set_bound(30.0).unwrap();
    }

    #[test]
    fn test_from_tracks_round_trip() {
        let mut store = bounded_store(20.0);
        store.add_clip(video(0.0, 10.0)).unwrap();
        store.add_clip(Clip::text(1.0, 2.0, "x").unwrap()).unwrap();
        store.add_clip(Clip::text(1.0, 2.0, "y").unwrap()).unwrap();

        let rebuilt = TrackStore::from_tracks(store.to_tracks(), Some(20.0)).unwrap();
        assert_eq!(rebuilt, store);
    }
}
