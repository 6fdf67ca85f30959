//! Property-based tests for the track store, clock and overlay resolver.

use adcut::domain::clock::Clock;
use adcut::domain::model::{Clip, TrackKind};
use adcut::domain::rules::OverlayResolver;
use adcut::domain::timeline::TrackStore;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add { kind: TrackKind, start: f64, len: f64 },
    Split { pick: usize, fraction: f64 },
    Move { pick: usize, start: f64 },
    Delete { pick: usize },
}

fn kind() -> impl Strategy<Value = TrackKind> {
    prop_oneof![
        Just(TrackKind::Video),
        Just(TrackKind::Text),
        Just(TrackKind::Audio),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (kind(), 0.0..60.0f64, 0.05..15.0f64)
            .prop_map(|(kind, start, len)| Op::Add { kind, start, len }),
        2 => (any::<usize>(), 0.0..1.0f64)
            .prop_map(|(pick, fraction)| Op::Split { pick, fraction }),
        2 => (any::<usize>(), -5.0..70.0f64).prop_map(|(pick, start)| Op::Move { pick, start }),
        1 => any::<usize>().prop_map(|pick| Op::Delete { pick }),
    ]
}

fn clip(kind: TrackKind, start: f64, end: f64) -> Clip {
    match kind {
        TrackKind::Text => Clip::text(start, end, "caption").unwrap(),
        other => Clip::media(other, start, end, "source.mp4").unwrap(),
    }
}

fn pick_id(store: &TrackStore, pick: usize) -> Option<adcut::ClipId> {
    let ids: Vec<_> = store.all_clips().map(|c| c.id).collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids[pick % ids.len()])
    }
}

fn apply(store: &mut TrackStore, op: &Op) {
    // Rejections are expected; only the surviving state is checked.
    match *op {
        Op::Add { kind, start, len } => {
            let _ = store.add_clip(clip(kind, start, start + len));
        }
        Op::Split { pick, fraction } => {
            if let Some(id) = pick_id(store, pick) {
                let (start, end) = {
                    let c = store.get(id).unwrap();
                    (c.start, c.end)
                };
                let _ = store.split(id, start + (end - start) * fraction);
            }
        }
        Op::Move { pick, start } => {
            if let Some(id) = pick_id(store, pick) {
                let _ = store.move_clip(id, start);
            }
        }
        Op::Delete { pick } => {
            if let Some(id) = pick_id(store, pick) {
                let _ = store.delete_clip(id);
            }
        }
    }
}

proptest! {
    /// Every clip keeps a positive, non-negative range whatever edits are attempted.
    #[test]
    fn clips_stay_well_formed(ops in prop::collection::vec(op(), 1..40)) {
        let mut store = TrackStore::new();
        for op in &ops {
            apply(&mut store, op);
            for c in store.all_clips() {
                prop_assert!(c.end > c.start, "clip {} has end {} <= start {}", c.id, c.end, c.start);
                prop_assert!(c.start >= 0.0);
            }
        }
    }

    /// The video track never holds two clips that overlap.
    #[test]
    fn video_track_stays_exclusive(ops in prop::collection::vec(op(), 1..40)) {
        let mut store = TrackStore::new();
        for op in &ops {
            apply(&mut store, op);
        }
        let video = store.clips(TrackKind::Video);
        for (i, a) in video.iter().enumerate() {
            for b in &video[i + 1..] {
                prop_assert!(!(a.start < b.end && b.start < a.end),
                    "{:?} overlaps {:?}", (a.start, a.end), (b.start, b.end));
            }
        }
    }

    /// Splitting then deleting both halves equals deleting the original.
    #[test]
    fn split_then_delete_both_matches_delete(
        start in 0.0..20.0f64,
        len in 0.1..20.0f64,
        fraction in 0.01..0.99f64,
        neighbours in prop::collection::vec((0.0..50.0f64, 0.1..5.0f64), 0..6),
    ) {
        let mut store = TrackStore::new();
        for (s, l) in neighbours {
            let _ = store.add_clip(clip(TrackKind::Text, s, s + l));
        }
        let target = store.add_clip(clip(TrackKind::Audio, start, start + len)).unwrap();

        let mut expected = store.clone();
        expected.delete_clip(target).unwrap();

        let (first, second) = store.split(target, start + len * fraction).unwrap();
        store.delete_clip(first).unwrap();
        store.delete_clip(second).unwrap();
        prop_assert_eq!(store, expected);
    }

    /// Seeking never leaves [0, duration].
    #[test]
    fn seek_is_clamped(duration in 0.1..10_000.0f64, target in -1.0e6..1.0e6f64) {
        let mut clock = Clock::with_duration(duration).unwrap();
        clock.seek(target);
        prop_assert!(clock.position() >= 0.0);
        prop_assert!(clock.position() <= duration);
        if target < 0.0 {
            prop_assert_eq!(clock.position(), 0.0);
        }
        if target > duration {
            prop_assert_eq!(clock.position(), duration);
        }
    }

    /// The winning caption is stable across calls and is the newest active one.
    #[test]
    fn overlay_resolution_is_deterministic(
        captions in prop::collection::vec((0.0..30.0f64, 0.1..10.0f64), 1..12),
        time in 0.0..40.0f64,
    ) {
        let mut store = TrackStore::new();
        for (s, l) in captions {
            store.add_clip(clip(TrackKind::Text, s, s + l)).unwrap();
        }
        let first = OverlayResolver::resolve(&store, time).map(|c| c.id);
        let second = OverlayResolver::resolve(&store, time).map(|c| c.id);
        prop_assert_eq!(first, second);

        let newest = store
            .clips(TrackKind::Text)
            .iter()
            .filter(|c| c.contains(time))
            .max_by_key(|c| c.seq)
            .map(|c| c.id);
        prop_assert_eq!(first, newest);
    }
}
