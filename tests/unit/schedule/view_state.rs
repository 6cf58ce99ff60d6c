use super::*;

fn p() -> ScheduleParams {
    ScheduleParams::default()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn reference_timeline_700s() {
    let d = 700.0;
    assert_eq!(schedule(30.0, d, &p()), ViewState::Composite);

    match schedule(60.7, d, &p()) {
        ViewState::ZoomIn { progress } => assert!((progress - 0.7 / 1.5).abs() < 1e-9),
        other => panic!("expected ZoomIn, got {other:?}"),
    }

    assert_eq!(schedule(200.0, d, &p()), ViewState::Fullscreen);

    match schedule(360.0, d, &p()) {
        ViewState::ZoomOut { progress } => assert!(approx(progress, 0.0)),
        other => panic!("expected ZoomOut, got {other:?}"),
    }

    assert_eq!(schedule(650.0, d, &p()), ViewState::Composite);
}

#[test]
fn second_cycle_starts_with_zoom_in() {
    let d = 2000.0;
    // cycle starts at 61.5; composite ends at 61.5 + 330 - 1.5 = 390
    assert_eq!(schedule(389.9, d, &p()), ViewState::Composite);
    assert!(matches!(schedule(390.0, d, &p()), ViewState::ZoomIn { .. }));
    assert_eq!(schedule(391.6, d, &p()), ViewState::Fullscreen);
}

#[test]
fn short_episode_is_always_composite() {
    for d in [0.0, 10.0, 59.9, 60.0] {
        let mut t = 0.0;
        while t < d {
            assert_eq!(schedule(t, d, &p()), ViewState::Composite);
            t += 0.25;
        }
    }
}

#[test]
fn trailing_window_is_composite() {
    let d = 1234.0;
    for eps in [0.001, 1.0, 30.0, 59.99, 60.0] {
        assert_eq!(schedule(d - eps, d, &p()), ViewState::Composite);
    }
}

#[test]
fn transition_progress_is_monotone_and_spans_unit_interval() {
    let d = 5000.0;
    let step = 1.0 / 30.0;
    let mut t = 60.0;
    let mut seen = Vec::new();
    while t < 61.5 {
        if let ViewState::ZoomIn { progress } = schedule(t, d, &p()) {
            seen.push(progress);
        }
        t += step;
    }
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert!(seen.first().copied().unwrap_or(1.0) < 0.05);
    assert!(seen.last().copied().unwrap_or(0.0) > 0.95);

    let mut out = Vec::new();
    let mut t = 358.0;
    while t < 362.0 {
        if let ViewState::ZoomOut { progress } = schedule(t, d, &p()) {
            out.push(progress);
        }
        t += step;
    }
    assert!(!out.is_empty());
    assert!(out.windows(2).all(|w| w[0] <= w[1]));
    assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn progress_accessor() {
    assert_eq!(ViewState::Composite.progress(), None);
    assert_eq!(ViewState::ZoomIn { progress: 0.3 }.progress(), Some(0.3));
    assert!(ViewState::ZoomOut { progress: 0.0 }.is_transition());
    assert!(!ViewState::Fullscreen.is_transition());
}

#[test]
fn validate_rejects_bad_cycles() {
    assert!(p().validate().is_ok());

    let mut bad = p();
    bad.transition_secs = 0.0;
    assert!(bad.validate().is_err());

    let mut bad = p();
    bad.transition_secs = 40.0;
    assert!(bad.validate().is_err());

    let mut bad = p();
    bad.outro_composite_secs = -1.0;
    assert!(bad.validate().is_err());

    let mut bad = p();
    bad.fullscreen_secs = f64::NAN;
    assert!(bad.validate().is_err());
}
