// Unit tests for overlap and overlay rules

use super::*;
use crate::domain::model::{Clip, ClipId};

fn caption_store() -> (TrackStore, ClipId, ClipId) {
    let mut store = TrackStore::new();
    store.set_bound(30.0).unwrap();
    let older = store.add_clip(Clip::text(0.0, 10.0, "older").unwrap()).unwrap();
    let newer = store.add_clip(Clip::text(5.0, 15.0, "newer").unwrap()).unwrap();
    (store, older, newer)
}

#[test]
fn test_overlap_policy_per_kind() {
    assert_eq!(OverlapPolicy::for_kind(TrackKind::Video), OverlapPolicy::Exclusive);
    assert_eq!(OverlapPolicy::for_kind(TrackKind::Text), OverlapPolicy::Stacking);
    assert_eq!(OverlapPolicy::for_kind(TrackKind::Audio), OverlapPolicy::Stacking);
}

#[test]
fn test_overlay_most_recent_wins() {
    let (store, older, newer) = caption_store();
    assert_eq!(OverlayResolver::resolve(&store, 2.0).map(|c| c.id), Some(older));
    assert_eq!(OverlayResolver::resolve(&store, 7.0).map(|c| c.id), Some(newer));
    assert_eq!(OverlayResolver::resolve(&store, 12.0).map(|c| c.id), Some(newer));
    assert!(OverlayResolver::resolve(&store, 20.0).is_none());
}

#[test]
fn test_overlay_recency_ignores_start_time() {
    let mut store = TrackStore::new();
    let wide = store.add_clip(Clip::text(0.0, 20.0, "wide").unwrap()).unwrap();
    let narrow = store.add_clip(Clip::text(8.0, 9.0, "narrow").unwrap()).unwrap();
    // Added after, starting earlier: still wins
    let late = store.add_clip(Clip::text(0.0, 20.0, "late").unwrap()).unwrap();

    assert_eq!(OverlayResolver::resolve(&store, 8.5).map(|c| c.id), Some(late));
    let paint: Vec<ClipId> = OverlayResolver::stack(&store, 8.5).iter().map(|c| c.id).collect();
    assert_eq!(paint, vec![wide, narrow, late]);
}

#[test]
fn test_overlay_survives_deleting_winner() {
    let (mut store, older, newer) = caption_store();
    store.delete_clip(newer).unwrap();
    assert_eq!(OverlayResolver::resolve(&store, 7.0).map(|c| c.id), Some(older));
}

#[test]
fn test_video_at_boundaries() {
    let mut store = TrackStore::new();
    let a = store
        .add_clip(Clip::media(TrackKind::Video, 0.0, 5.0, "a.mp4").unwrap())
        .unwrap();
    let b = store
        .add_clip(Clip::media(TrackKind::Video, 5.0, 9.0, "a.mp4").unwrap())
        .unwrap();
    assert_eq!(OverlayResolver::video_at(&store, 4.99).map(|c| c.id), Some(a));
    assert_eq!(OverlayResolver::video_at(&store, 5.0).map(|c| c.id), Some(b));
    assert!(OverlayResolver::video_at(&store, 9.0).is_none());
}
