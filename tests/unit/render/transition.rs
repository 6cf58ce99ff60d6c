use std::sync::Arc;

use super::*;
use crate::assets::{
    BuiltinOnlyResolver, CompositeAssetBuilder, CompositeAssets, EpisodeVisuals, ImageInput,
    LayoutParams, Palette,
};
use crate::foundation::core::Rgb8;

const SMALL: Canvas = Canvas {
    width: 64,
    height: 36,
};

fn assets(thematic: bool) -> CompositeAssets {
    let visuals = EpisodeVisuals {
        thematic: thematic.then(|| {
            ImageInput::Decoded(Arc::new(image::RgbaImage::from_pixel(
                16,
                9,
                image::Rgba([200, 10, 10, 255]),
            )))
        }),
        ..EpisodeVisuals::default()
    };
    let fonts = BuiltinOnlyResolver;
    CompositeAssetBuilder::new(SMALL, Palette::default(), LayoutParams::default(), &fonts)
        .build(&visuals)
        .unwrap()
        .value
}

fn composite() -> Frame {
    Frame::solid(SMALL, Rgb8::new(0, 100, 200))
}

#[test]
fn fullscreen_falls_back_to_background() {
    let a = assets(false);
    let b = TransitionBlender::new(&a, TransitionParams::default()).unwrap();
    assert_eq!(b.fullscreen(), Frame::solid(SMALL, a.palette.background));
}

#[test]
fn fullscreen_uses_prepared_image() {
    let b = TransitionBlender::new(&assets(true), TransitionParams::default()).unwrap();
    assert_eq!(b.fullscreen().pixel(32, 18), [200, 10, 10]);
}

#[test]
fn zoom_in_endpoints() {
    let b = TransitionBlender::new(&assets(true), TransitionParams::default()).unwrap();
    let c = composite();
    assert_eq!(b.blend(&c, ViewState::ZoomIn { progress: 0.0 }).unwrap(), c);
    assert_eq!(
        b.blend(&c, ViewState::ZoomIn { progress: 1.0 }).unwrap(),
        b.fullscreen()
    );
}

#[test]
fn zoom_out_inverts_progress() {
    let b = TransitionBlender::new(&assets(true), TransitionParams::default()).unwrap();
    let c = composite();
    assert_eq!(
        b.blend(&c, ViewState::ZoomOut { progress: 0.0 }).unwrap(),
        b.fullscreen()
    );
    assert_eq!(b.blend(&c, ViewState::ZoomOut { progress: 1.0 }).unwrap(), c);
    let w_in = b.eased_weight(ViewState::ZoomIn { progress: 0.3 }).unwrap();
    let w_out = b.eased_weight(ViewState::ZoomOut { progress: 0.7 }).unwrap();
    assert!((w_in - w_out).abs() < 1e-12);
}

#[test]
fn midpoint_is_an_even_mix() {
    let b = TransitionBlender::new(&assets(true), TransitionParams::default()).unwrap();
    let out = b.blend(&composite(), ViewState::ZoomIn { progress: 0.5 }).unwrap();
    let [r, g, bl] = out.pixel(32, 18);
    assert!((i32::from(r) - 100).abs() <= 2);
    assert!((i32::from(g) - 55).abs() <= 2);
    assert!((i32::from(bl) - 105).abs() <= 2);
}

#[test]
fn steady_states_are_rejected() {
    let b = TransitionBlender::new(&assets(false), TransitionParams::default()).unwrap();
    assert!(b.blend(&composite(), ViewState::Composite).is_err());
    assert!(b.blend(&composite(), ViewState::Fullscreen).is_err());
    let wrong = Frame::solid(
        Canvas {
            width: 8,
            height: 8,
        },
        Rgb8::new(0, 0, 0),
    );
    assert!(b.blend(&wrong, ViewState::ZoomIn { progress: 0.5 }).is_err());
}

#[test]
fn zoom_keeps_centre_and_pushes_edges_out() {
    let mut data = Vec::new();
    for _y in 0..4 {
        for x in 0..8u8 {
            data.extend_from_slice(&[x * 30, 0, 0]);
        }
    }
    let f = Frame::new(8, 4, data).unwrap();
    let z = zoom_about_centre(&f, 2.0);
    // column 0 now samples around source x = 1.75
    assert_eq!(z.pixel(0, 0)[0], 53);
    assert!(z.pixel(7, 0)[0] < f.pixel(7, 0)[0]);
    let uniform = Frame::solid(SMALL, Rgb8::new(9, 8, 7));
    assert_eq!(zoom_about_centre(&uniform, 1.15), uniform);
}

#[test]
fn zoom_max_below_one_is_invalid() {
    let p = TransitionParams {
        zoom_max: 0.9,
        ..TransitionParams::default()
    };
    assert!(TransitionBlender::new(&assets(false), p).is_err());
}

#[test]
fn crossfade_endpoints() {
    let mut a = vec![10u8, 20, 30];
    crossfade_in_place(&mut a, &[200, 210, 220], 0.0);
    assert_eq!(a, vec![10, 20, 30]);
    crossfade_in_place(&mut a, &[200, 210, 220], 1.0);
    assert_eq!(a, vec![200, 210, 220]);
}
