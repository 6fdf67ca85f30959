//! End-to-end editing sessions wired to the file-backed collaborators.

use std::sync::Arc;
use std::time::Duration;

use adcut::adapters::{CampaignTemplateAnalyzer, FsProjectAdapter, ManifestRenderAdapter};
use adcut::app::{AnalysisOutcome, EditEvent, EditOutcome, SessionController, SessionPhase};
use adcut::domain::model::{
    CampaignContext, CampaignGoal, Clip, ClipOrigin, RenderSettings, TargetAudience, TrackKind,
};
use adcut::ports::ProjectStorePort;
use adcut::DomainError;
use tempfile::TempDir;

fn campaign() -> CampaignContext {
    CampaignContext {
        goal: CampaignGoal::Sales,
        audience: TargetAudience::YoungAdults,
    }
}

fn new_controller(dir: &TempDir) -> SessionController {
    SessionController::new(
        Arc::new(CampaignTemplateAnalyzer::new()),
        Arc::new(ManifestRenderAdapter::new(dir.path().join("out").join("promo.render.json"))),
    )
}

#[tokio::test]
async fn test_edit_analyze_export_and_reopen() {
    let dir = TempDir::new().unwrap();
    let controller = new_controller(&dir);
    controller.load_media("promo.mp4", Some(30.0)).unwrap();
    assert_eq!(controller.phase().unwrap(), SessionPhase::Editing);

    // The user keeps the closing shot; machine cuts must fit around it.
    let closing = match controller
        .handle(EditEvent::AddClip(
            Clip::media(TrackKind::Video, 20.0, 30.0, "promo.mp4").unwrap(),
        ))
        .unwrap()
    {
        EditOutcome::ClipAdded(id) => id,
        other => panic!("unexpected outcome: {:?}", other),
    };

    let report = match controller.analyze(campaign()).await.unwrap() {
        AnalysisOutcome::Merged(report) => report,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(report.cuts_added, 2);
    assert_eq!(report.cuts_skipped_overlap, 0);
    assert_eq!(report.subtitles_added, 3);
    assert_eq!(report.applied_parameters, 3);
    assert_eq!(report.mood.as_deref(), Some("energetic and optimistic"));
    assert_eq!(report.key_moments.len(), 3);

    controller.handle(EditEvent::Seek(5.0)).unwrap();
    let frame = controller.frame().unwrap();
    let video = frame.video.expect("machine cut under the playhead");
    assert_eq!(video.origin, ClipOrigin::Machine);
    assert_eq!((video.start, video.end), (2.0, 8.0));
    assert_eq!(
        frame.overlay.and_then(|c| c.text_payload().map(str::to_string)).as_deref(),
        Some("Today we present an amazing product")
    );
    assert!(frame.attributes.brightness > 1.0);

    let user_clip = controller
        .with_session(|s| s.store().get(closing).cloned())
        .unwrap()
        .unwrap();
    assert_eq!(user_clip.origin, ClipOrigin::User);
    assert_eq!((user_clip.start, user_clip.end), (20.0, 30.0));

    // A second run of the same suggestion changes nothing.
    let before = controller.snapshot().unwrap();
    match controller.analyze(campaign()).await.unwrap() {
        AnalysisOutcome::Merged(again) => {
            assert!(again.duplicate);
            assert_eq!(again.clips_added(), 0);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    let after = controller.snapshot().unwrap();
    assert_eq!(before.tracks, after.tracks);
    assert_eq!(before.effect_parameters, after.effect_parameters);

    let completion = controller.export(RenderSettings::default()).await.unwrap();
    let rendered = completion.render.unwrap();
    assert_eq!(rendered.clips_rendered, 6);
    assert!(std::path::Path::new(&rendered.output).exists());
    assert!(completion.deferred_merge.is_none());
    assert_eq!(controller.phase().unwrap(), SessionPhase::Editing);

    let store = FsProjectAdapter::new();
    let project = dir.path().join("promo.yaml");
    let project = project.to_str().unwrap();
    store.save(project, &controller.snapshot().unwrap()).await.unwrap();

    let reopened = new_controller(&dir);
    reopened.restore(store.load(project).await.unwrap()).unwrap();
    let (original, restored) = (controller.snapshot().unwrap(), reopened.snapshot().unwrap());
    assert_eq!(original.tracks, restored.tracks);
    assert_eq!(original.effect_parameters, restored.effect_parameters);
    assert_eq!(original.suggestion_history, restored.suggestion_history);
    assert_eq!(restored.campaign, Some(campaign()));
}

#[tokio::test]
async fn test_scripted_scenario_from_a_single_video_clip() {
    let dir = TempDir::new().unwrap();
    let controller = new_controller(&dir);
    controller.load_media("promo.mp4", Some(20.0)).unwrap();
    let clip = match controller
        .handle(EditEvent::AddClip(
            Clip::media(TrackKind::Video, 0.0, 20.0, "promo.mp4").unwrap(),
        ))
        .unwrap()
    {
        EditOutcome::ClipAdded(id) => id,
        other => panic!("unexpected outcome: {:?}", other),
    };

    controller.handle(EditEvent::Split { clip, time: 8.0 }).unwrap();
    let ranges = controller
        .with_session(|s| {
            s.store()
                .clips(TrackKind::Video)
                .iter()
                .map(|c| (c.start, c.end))
                .collect::<Vec<_>>()
        })
        .unwrap();
    assert_eq!(ranges, vec![(0.0, 8.0), (8.0, 20.0)]);

    let err = controller
        .handle(EditEvent::AddClip(
            Clip::media(TrackKind::Video, 5.0, 10.0, "promo.mp4").unwrap(),
        ))
        .unwrap_err();
    assert!(matches!(err, DomainError::OverlapNotAllowed { .. }));

    // Every template cut now lands on user footage and is skipped.
    match controller.analyze(campaign()).await.unwrap() {
        AnalysisOutcome::Merged(report) => {
            assert_eq!(report.cuts_added, 0);
            assert_eq!(report.cuts_skipped_overlap, 2);
            assert_eq!(report.subtitles_added, 3);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(
        controller
            .with_session(|s| s.store().clips(TrackKind::Video).len())
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_user_edits_during_slow_analysis_are_respected() {
    let dir = TempDir::new().unwrap();
    let controller = Arc::new(SessionController::new(
        Arc::new(CampaignTemplateAnalyzer::new().with_latency(Duration::from_millis(50))),
        Arc::new(ManifestRenderAdapter::new(dir.path().join("promo.render.json"))),
    ));
    controller.load_media("promo.mp4", Some(30.0)).unwrap();

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.analyze(campaign()).await })
    };
    for _ in 0..1000 {
        if controller.phase().unwrap() == SessionPhase::Analyzing {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(controller.phase().unwrap(), SessionPhase::Analyzing);

    // Claimed while the model is still thinking; the first template cut lands here.
    controller
        .handle(EditEvent::AddClip(
            Clip::media(TrackKind::Video, 2.0, 8.0, "promo.mp4").unwrap(),
        ))
        .unwrap();

    let report = match task.await.unwrap().unwrap() {
        AnalysisOutcome::Merged(report) => report,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(report.cuts_added, 1);
    assert_eq!(report.cuts_skipped_overlap, 1);
    assert_eq!(controller.phase().unwrap(), SessionPhase::Editing);

    controller.handle(EditEvent::Seek(4.0)).unwrap();
    let video = controller.frame().unwrap().video.expect("user clip at 4s");
    assert_eq!(video.origin, ClipOrigin::User);
}
