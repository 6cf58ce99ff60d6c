//! Wavecast turns a speech track into a waveform video.
//!
//! Each frame shows a scrolling, audio-reactive waveform, a glowing logo, the episode title and
//! an optional thematic image; on a fixed schedule the view zooms into the thematic image shown
//! full-screen and back. The pipeline:
//!
//! - resolve per-frame waveform amplitudes ([`resolve_waveform`], cached on disk)
//! - build the episode's [`CompositeAssets`] once
//! - iterate a [`FrameSequenceGenerator`] and hand every frame to a [`FrameSink`]
//!
//! [`render_episode`] and [`render_batch`] wire these together.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

pub(crate) mod animation;
/// Per-episode visual assets.
pub mod assets;
/// Run configuration.
pub mod config;
/// Frame sinks.
pub mod encode;
/// Episode and batch orchestration.
pub mod episode;
/// Audio input.
pub mod media;
/// Frame rendering.
pub mod render;
/// View scheduling.
pub mod schedule;
/// Ordered frame streams.
pub mod sequence;
/// Waveform analysis and cache.
pub mod waveform;

pub use crate::animation::ease::Ease;
pub use crate::foundation::core::{Canvas, Fps, FrameIndex, Point, Rect, Rgb8, Vec2};
pub use crate::foundation::error::{Degradation, Outcome, WavecastError, WavecastResult};

pub use crate::assets::{
    BuiltinOnlyResolver, CandidateFontResolver, CompositeAssetBuilder, CompositeAssets,
    EpisodeVisuals, FontResolver, ImageInput, Palette,
};
pub use crate::config::VideoConfig;
pub use crate::encode::{
    AudioInput, FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, SinkConfig,
};
pub use crate::episode::{
    AudioSource, EpisodeJob, EpisodeReport, EpisodeStatus, ImageSource, render_batch,
    render_episode,
};
pub use crate::media::AudioTrack;
pub use crate::render::{Frame, FrameCompositor, TransitionBlender};
pub use crate::schedule::{ScheduleParams, ViewState, schedule};
pub use crate::sequence::{EpisodeContext, FrameSequenceGenerator, RenderThreading};
pub use crate::waveform::{WaveformAnalyzer, WaveformCache, WaveformFrames, resolve_waveform};
