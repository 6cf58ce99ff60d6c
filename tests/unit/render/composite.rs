use super::*;
use crate::assets::{
    BuiltinOnlyResolver, CompositeAssetBuilder, EpisodeVisuals, ImageInput, LayoutParams, Palette,
};
use crate::foundation::core::Canvas;

const SMALL: Canvas = Canvas {
    width: 320,
    height: 180,
};

fn assets(full: bool) -> Arc<CompositeAssets> {
    let solid = |w, h, rgba| {
        ImageInput::Decoded(Arc::new(image::RgbaImage::from_pixel(w, h, image::Rgba(rgba))))
    };
    let visuals = if full {
        EpisodeVisuals {
            title: "Attention".to_string(),
            podcast_name: "Codex Mentis".to_string(),
            logo: Some(solid(40, 40, [250, 250, 250, 255])),
            thematic: Some(solid(60, 40, [30, 90, 160, 255])),
        }
    } else {
        EpisodeVisuals::default()
    };
    let fonts = BuiltinOnlyResolver;
    let out = CompositeAssetBuilder::new(SMALL, Palette::default(), LayoutParams::default(), &fonts)
        .build(&visuals)
        .unwrap();
    Arc::new(out.value)
}

fn wave(n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * ((i as f32) * 0.3).sin())
        .collect()
}

#[test]
fn identical_inputs_render_identical_bytes() {
    let mut c = FrameCompositor::new(assets(true), CompositorParams::default(), 7).unwrap();
    let amps = wave(320, 0.2);
    let a = c.render(&amps, 12.34, 100.0).unwrap();
    let b = c.render(&amps, 12.34, 100.0).unwrap();
    let mut other = c.clone();
    let d = other.render(&amps, 12.34, 100.0).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, d);
    assert_eq!((a.width, a.height), (320, 180));
}

#[test]
fn silence_draws_only_the_background() {
    let a = assets(false);
    let bg = a.palette.background;
    let mut c = FrameCompositor::new(a, CompositorParams::default(), 0).unwrap();
    let quiet = vec![0.0005f32; 320];
    assert!(c.shared().is_silent(&quiet));
    let frame = c.render(&quiet, 5.0, 100.0).unwrap();
    assert_eq!(frame, Frame::solid(SMALL, bg));

    let loud = wave(320, 0.3);
    assert!(!c.shared().is_silent(&loud));
    let frame = c.render(&loud, 5.0, 100.0).unwrap();
    assert_ne!(frame, Frame::solid(SMALL, bg));
}

#[test]
fn shake_is_zero_when_quiet_and_bounded_when_loud() {
    let c = FrameCompositor::new(assets(true), CompositorParams::default(), 3).unwrap();
    let s = c.shared();
    assert_eq!(s.shake_offset(&vec![0.01; 320], 1.0), (0, 0));
    assert_eq!(s.shake_offset(&[], 1.0), (0, 0));

    let loud = vec![0.5f32; 320];
    let max = SMALL.px(10.0).round() as i64;
    let mut moved = false;
    for i in 0..50 {
        let t = f64::from(i) / 30.0;
        let (dx, dy) = s.shake_offset(&loud, t);
        assert!(dx.abs() <= max && dy.abs() <= max);
        assert_eq!(s.shake_offset(&loud, t), (dx, dy));
        moved |= dx != 0 || dy != 0;
    }
    assert!(moved);
}

#[test]
fn logo_breathes_within_amplitude() {
    let c = FrameCompositor::new(assets(true), CompositorParams::default(), 0).unwrap();
    let s = c.shared();
    let d = 100.0;
    assert_eq!(s.logo_scale(0.0, d), 1.0);
    assert!((s.logo_scale(50.0, d) - 1.05).abs() < 1e-9);
    for i in 0..=200 {
        let t = f64::from(i) * 0.5;
        let k = s.logo_scale(t, d);
        assert!((0.95..=1.05).contains(&k), "scale {k} at {t}");
        assert_eq!(s.logo_scale(t, d), k);
    }
    assert_eq!(s.logo_scale(3.0, 0.0), 1.0);

    let still = CompositorParams {
        logo_breathing_amplitude: 0.0,
        ..CompositorParams::default()
    };
    let c = FrameCompositor::new(assets(true), still, 0).unwrap();
    assert_eq!(c.shared().logo_scale(50.0, d), 1.0);
}

#[test]
fn breathing_logo_changes_pixels_but_stays_deterministic() {
    let quiet = vec![0.0f32; 320];
    let mut c = FrameCompositor::new(assets(true), CompositorParams::default(), 0).unwrap();
    let a = c.render(&quiet, 50.0, 100.0).unwrap();
    let b = c.render(&quiet, 50.0, 100.0).unwrap();
    assert_eq!(a, b);

    let still = CompositorParams {
        logo_breathing_amplitude: 0.0,
        ..CompositorParams::default()
    };
    let mut s = FrameCompositor::new(assets(true), still, 0).unwrap();
    assert_ne!(a, s.render(&quiet, 50.0, 100.0).unwrap());
}

#[test]
fn perimeter_walks_clockwise() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(perimeter_point(r, 0.0), Point::new(0.0, 0.0));
    assert_eq!(perimeter_point(r, 0.125), Point::new(5.0, 0.0));
    assert_eq!(perimeter_point(r, 0.25), Point::new(10.0, 0.0));
    assert_eq!(perimeter_point(r, 0.5), Point::new(10.0, 10.0));
    assert_eq!(perimeter_point(r, 0.875), Point::new(0.0, 5.0));
    assert_eq!(perimeter_point(r, 1.0), Point::new(0.0, 0.0));
}

#[test]
fn orbit_has_fixed_period() {
    let c = FrameCompositor::new(assets(true), CompositorParams::default(), 0).unwrap();
    let rect = Rect::new(100.0, 40.0, 300.0, 140.0);
    let s = c.shared();
    assert_eq!(s.orbit_point(rect, 1.0), s.orbit_point(rect, 13.0));
    assert_ne!(s.orbit_point(rect, 1.0), s.orbit_point(rect, 4.0));
}

#[test]
fn title_fades_in() {
    let c = FrameCompositor::new(assets(true), CompositorParams::default(), 0).unwrap();
    let s = c.shared();
    assert_eq!(s.title_opacity(0.0), 0.0);
    assert!((s.title_opacity(0.75) - 0.5).abs() < 1e-6);
    assert_eq!(s.title_opacity(10.0), 1.0);

    let params = CompositorParams {
        text_fade_in_secs: 0.0,
        ..CompositorParams::default()
    };
    let c = FrameCompositor::new(assets(true), params, 0).unwrap();
    assert_eq!(c.shared().title_opacity(0.0), 1.0);
}

#[test]
fn progress_bar_fills_with_time() {
    let a = assets(false);
    let palette = a.palette.clone();
    let params = CompositorParams {
        progress_bar: true,
        ..CompositorParams::default()
    };
    let mut c = FrameCompositor::new(a, params, 0).unwrap();
    let frame = c.render(&vec![0.0; 320], 50.0, 100.0).unwrap();
    let acc = palette.accent;
    let dark = palette.waveform_dark;
    assert_eq!(frame.pixel(20, 175), [acc.r, acc.g, acc.b]);
    assert_eq!(frame.pixel(300, 175), [dark.r, dark.g, dark.b]);
}

#[test]
fn params_validate() {
    CompositorParams::default().validate().unwrap();
    let p = CompositorParams {
        pass_gains: Vec::new(),
        ..CompositorParams::default()
    };
    assert!(p.validate().is_err());
    let p = CompositorParams {
        orbit_period_secs: 0.0,
        ..CompositorParams::default()
    };
    assert!(FrameCompositor::new(assets(false), p, 0).is_err());
    let p = CompositorParams {
        logo_breathing_amplitude: 1.0,
        ..CompositorParams::default()
    };
    assert!(p.validate().is_err());
    let p = CompositorParams {
        logo_breathing_frequency: f64::NAN,
        ..CompositorParams::default()
    };
    assert!(p.validate().is_err());
}
