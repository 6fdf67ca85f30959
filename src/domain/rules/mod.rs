// Domain rules - overlap policy and overlay precedence

use crate::domain::model::{Clip, TrackKind};
use crate::domain::timeline::TrackStore;

/// Whether clips on a track may overlap in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// At most one clip covers any instant
    Exclusive,
    /// Any number of clips may cover the same instant
    Stacking,
}

impl OverlapPolicy {
    pub fn for_kind(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Video => OverlapPolicy::Exclusive,
            TrackKind::Text | TrackKind::Audio => OverlapPolicy::Stacking,
        }
    }
}

/// Picks which caption is visible at a given instant
pub struct OverlayResolver;

impl OverlayResolver {
    /// The most recently added text clip active at `time`, if any.
    ///
    /// Recency is insertion order, so a caption added later always wins over
    /// one added earlier regardless of their start times.
    pub fn resolve(store: &TrackStore, time: f64) -> Option<&Clip> {
        store
            .query_at(TrackKind::Text, time)
            .into_iter()
            .max_by_key(|clip| clip.seq)
    }

    /// All text clips active at `time` in paint order (oldest first, winner last)
    pub fn stack(store: &TrackStore, time: f64) -> Vec<&Clip> {
        let mut active = store.query_at(TrackKind::Text, time);
        active.sort_by_key(|clip| clip.seq);
        active
    }

    /// The primary video clip at `time`. Video never overlaps, so this is unique.
    pub fn video_at(store: &TrackStore, time: f64) -> Option<&Clip> {
        store.query_at(TrackKind::Video, time).into_iter().next()
    }
}

#[cfg(test)]
mod tests;
