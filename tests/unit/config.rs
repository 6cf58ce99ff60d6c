use super::*;

#[test]
fn defaults_validate_and_match_reference_output() {
    let cfg = VideoConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.canvas.width, 1920);
    assert_eq!(cfg.canvas.height, 1080);
    assert_eq!(cfg.fps, Fps { num: 30, den: 1 });
    assert_eq!(cfg.fade_secs, 2.0);
    assert_eq!(cfg.ring_capacity, 8);
    assert!(cfg.force_composite_without_image);
}

#[test]
fn partial_json_keeps_other_defaults() {
    let cfg = VideoConfig::from_json(
        r##"{
            "canvas": { "width": 640, "height": 360 },
            "palette": { "accent": "#ff0000" },
            "schedule": { "fullscreen_secs": 120.0 },
            "threading": { "parallel": true, "threads": 2 }
        }"##,
    )
    .unwrap();
    assert_eq!(cfg.canvas.width, 640);
    assert_eq!(cfg.palette.accent, crate::foundation::core::Rgb8::new(255, 0, 0));
    assert_eq!(cfg.palette.background, Palette::default().background);
    assert_eq!(cfg.schedule.fullscreen_secs, 120.0);
    assert_eq!(cfg.schedule.composite_secs, 30.0);
    assert!(cfg.threading.parallel);
    assert_eq!(cfg.threading.threads, Some(2));
    assert_eq!(cfg.podcast_name, DEFAULT_PODCAST_NAME);
}

#[test]
fn invalid_values_are_rejected() {
    assert!(matches!(
        VideoConfig::from_json(r#"{ "smoothing": 1.0 }"#),
        Err(WavecastError::Validation(_))
    ));
    assert!(matches!(
        VideoConfig::from_json(r#"{ "ring_capacity": 0 }"#),
        Err(WavecastError::Validation(_))
    ));
    assert!(matches!(
        VideoConfig::from_json(r#"{ "fps": { "num": 0, "den": 1 } }"#),
        Err(WavecastError::Validation(_))
    ));
    assert!(matches!(
        VideoConfig::from_json(r#"{ "schedule": { "transition_secs": 0.0 } }"#),
        Err(WavecastError::Validation(_))
    ));
    assert!(matches!(
        VideoConfig::from_json("{ not json"),
        Err(WavecastError::Serde(_))
    ));
}

#[test]
fn from_path_reads_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("video.json");
    std::fs::write(&path, r#"{ "fade_secs": 0.5 }"#).unwrap();
    let cfg = VideoConfig::from_path(&path).unwrap();
    assert_eq!(cfg.fade_secs, 0.5);

    let missing = VideoConfig::from_path(&dir.path().join("nope.json"));
    assert!(matches!(missing, Err(WavecastError::Other(_))));
}
