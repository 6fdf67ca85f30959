// Unit tests for domain models

use super::*;

#[test]
fn test_time_spec_from_components() {
    let time = TimeSpec::from_components(1, 2, 3, 500);
    assert_eq!(time.seconds, 3723.5);
}

#[test]
fn test_time_spec_parse_seconds() {
    let time = TimeSpec::parse("12.5").unwrap();
    assert_eq!(time.seconds, 12.5);
}

#[test]
fn test_time_spec_parse_mm_ss() {
    let time = TimeSpec::parse("0:08").unwrap();
    assert_eq!(time.seconds, 8.0);

    let time = TimeSpec::parse("01:30.5").unwrap();
    assert_eq!(time.seconds, 90.5);
}

#[test]
fn test_time_spec_parse_hh_mm_ss() {
    let time = TimeSpec::parse("01:02:03.5").unwrap();
    assert_eq!(time.seconds, 3723.5);
}

#[test]
fn test_time_spec_parse_invalid() {
    assert!(TimeSpec::parse("invalid").is_err());
    assert!(TimeSpec::parse("00:60").is_err());
    assert!(TimeSpec::parse("01:60:00").is_err());
    assert!(TimeSpec::parse("-10").is_err());
    assert!(TimeSpec::parse("inf").is_err());
}

#[test]
fn test_time_spec_display() {
    let time = TimeSpec::from_components(1, 2, 3, 456);
    assert_eq!(format!("{}", time), "01:02:03.456");

    let time_no_hours = TimeSpec::from_components(0, 2, 3, 456);
    assert_eq!(format!("{}", time_no_hours), "02:03.456");
}

#[test]
fn test_clip_rejects_bad_ranges() {
    assert!(matches!(
        Clip::media(TrackKind::Video, 5.0, 5.0, "a.mp4"),
        Err(DomainError::InvalidRange { .. })
    ));
    assert!(matches!(
        Clip::media(TrackKind::Video, -1.0, 5.0, "a.mp4"),
        Err(DomainError::InvalidRange { .. })
    ));
    assert!(matches!(
        Clip::text(2.0, f64::NAN, "hi"),
        Err(DomainError::InvalidRange { .. })
    ));
}

#[test]
fn test_clip_containment_is_half_open() {
    let clip = Clip::media(TrackKind::Video, 2.0, 4.0, "a.mp4").unwrap();
    assert!(clip.contains(2.0));
    assert!(clip.contains(3.999));
    assert!(!clip.contains(4.0));
    assert!(clip.overlaps(3.0, 5.0));
    assert!(!clip.overlaps(4.0, 5.0));
    assert_eq!(clip.duration(), 2.0);
}

#[test]
fn test_clip_payload_accessors() {
    let caption = Clip::text(0.0, 1.0, "Hello").unwrap();
    assert_eq!(caption.text_payload(), Some("Hello"));
    assert_eq!(caption.media_handle(), None);
    assert_eq!(caption.track_kind, TrackKind::Text);
    assert_eq!(caption.origin, ClipOrigin::User);
}

#[test]
fn test_clip_id_parse_round_trip() {
    let id = ClipId::new();
    let parsed: ClipId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
    assert!("not-a-uuid".parse::<ClipId>().is_err());
}

#[test]
fn test_track_kind_parse() {
    assert_eq!(TrackKind::parse("Video").unwrap(), TrackKind::Video);
    assert_eq!(TrackKind::parse("subtitle").unwrap(), TrackKind::Text);
    assert!(TrackKind::parse("midi").is_err());
}

#[test]
fn test_campaign_parse() {
    assert_eq!(CampaignGoal::parse("sales").unwrap(), CampaignGoal::Sales);
    assert_eq!(
        TargetAudience::parse("young-adults").unwrap(),
        TargetAudience::YoungAdults
    );
    assert!(CampaignGoal::parse("fame").is_err());
    assert!(TargetAudience::parse("aliens").is_err());
}

#[test]
fn test_resolution_parse() {
    assert_eq!(Resolution::parse("1080p").unwrap(), Resolution::new(1920, 1080).unwrap());
    assert_eq!(Resolution::parse("1280x720").unwrap(), Resolution::new(1280, 720).unwrap());
    assert!(Resolution::parse("0x720").is_err());
    assert!(Resolution::parse("huge").is_err());
}

#[test]
fn test_render_settings_validation() {
    assert!(RenderSettings::default().validate().is_ok());

    let mut settings = RenderSettings::default();
    settings.framerate = 0.0;
    assert!(settings.validate().is_err());

    let mut settings = RenderSettings::default();
    settings.codec = " ".to_string();
    assert!(settings.validate().is_err());

    let mut settings = RenderSettings::default();
    settings.bitrate = 0;
    assert!(settings.validate().is_err());
}
