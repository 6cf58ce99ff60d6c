use super::*;
use crate::assets::{BuiltinOnlyResolver, EpisodeVisuals, ImageInput};
use crate::config::VideoConfig;
use crate::foundation::core::{Canvas, Fps};
use crate::media::AudioTrack;
use crate::schedule::ScheduleParams;

fn context() -> Arc<EpisodeContext> {
    let cfg = VideoConfig {
        canvas: Canvas {
            width: 48,
            height: 28,
        },
        fps: Fps::new(10, 1).unwrap(),
        fade_secs: 0.5,
        schedule: ScheduleParams {
            initial_composite_secs: 0.5,
            fullscreen_secs: 1.0,
            composite_secs: 1.0,
            transition_secs: 0.4,
            outro_composite_secs: 0.5,
        },
        ..VideoConfig::default()
    };
    let rate = 1_000u32;
    let samples: Vec<f32> = (0..rate * 4)
        .map(|i| ((i as f32) * 0.3).sin() * if i % 700 < 350 { 0.6 } else { 0.05 })
        .collect();
    let track = AudioTrack::from_samples(samples, rate).unwrap();
    let img = image::RgbaImage::from_pixel(30, 20, image::Rgba([10, 160, 90, 255]));
    let visuals = EpisodeVisuals {
        title: "Parallel".to_string(),
        podcast_name: "Codex".to_string(),
        logo: Some(ImageInput::Decoded(Arc::new(image::RgbaImage::from_pixel(
            12,
            12,
            image::Rgba([220, 30, 30, 255]),
        )))),
        thematic: Some(ImageInput::Decoded(Arc::new(img))),
    };
    let ctx = EpisodeContext::prepare(&track, &visuals, &cfg, &BuiltinOnlyResolver, None)
        .unwrap()
        .value;
    Arc::new(ctx)
}

fn sequential() -> RenderThreading {
    RenderThreading::default()
}

#[test]
fn yields_every_frame_once_in_order() {
    let ctx = context();
    let gen_ = FrameSequenceGenerator::new(ctx.clone(), &sequential(), 4).unwrap();
    let idx: Vec<u64> = gen_.map(|r| r.unwrap().0.0).collect();
    assert_eq!(idx, (0..40).collect::<Vec<_>>());
}

#[test]
fn parallel_and_sequential_generation_match() {
    let ctx = context();
    let seq: Vec<_> = FrameSequenceGenerator::new(ctx.clone(), &sequential(), 8)
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    let threading = RenderThreading {
        parallel: true,
        chunk_size: 7,
        threads: Some(3),
    };
    let par: Vec<_> = FrameSequenceGenerator::new(ctx, &threading, 8)
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(seq.len(), par.len());
    for ((ia, fa), (ib, fb)) in seq.iter().zip(par.iter()) {
        assert_eq!(ia, ib);
        assert_eq!(fa.as_ref(), fb.as_ref(), "frame {} differs", ia.0);
    }
}

#[test]
fn frame_at_serves_retained_frames_and_advances() {
    let ctx = context();
    let mut g = FrameSequenceGenerator::new(ctx, &sequential(), 3).unwrap();

    let f5 = g.frame_at(FrameIndex(5)).unwrap();
    assert_eq!(g.position(), FrameIndex(6));
    let again = g.frame_at(FrameIndex(5)).unwrap();
    assert!(Arc::ptr_eq(&f5, &again));

    // 3..=5 are retained, 2 is gone
    assert!(g.frame_at(FrameIndex(3)).is_ok());
    let err = g.frame_at(FrameIndex(2)).unwrap_err();
    assert!(err.to_string().contains("evicted"));

    assert!(g.frame_at(FrameIndex(40)).is_err());
    let (next_idx, _) = g.next().unwrap().unwrap();
    assert_eq!(next_idx, FrameIndex(6));
}

#[test]
fn remaining_counts_down_and_stream_ends() {
    let ctx = context();
    let mut g = FrameSequenceGenerator::new(ctx, &sequential(), 2).unwrap();
    assert_eq!(g.remaining(), 40);
    for _ in 0..10 {
        g.next().unwrap().unwrap();
    }
    assert_eq!(g.remaining(), 30);
    assert_eq!(g.by_ref().count(), 30);
    assert!(g.next().is_none());
}

#[test]
fn zero_threads_is_rejected() {
    let threading = RenderThreading {
        parallel: true,
        chunk_size: 0,
        threads: Some(0),
    };
    assert!(FrameSequenceGenerator::new(context(), &threading, 2).is_err());
    assert_eq!(normalized_chunk_size(0), 1);
}
