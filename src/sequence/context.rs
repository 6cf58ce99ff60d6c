use std::sync::Arc;

use crate::assets::{CompositeAssetBuilder, CompositeAssets, EpisodeVisuals, FontResolver};
use crate::config::VideoConfig;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{Outcome, WavecastError, WavecastResult};
use crate::foundation::math::Fnv1a64;
use crate::media::AudioTrack;
use crate::render::composite::CompositorShared;
use crate::render::frame::Frame;
use crate::render::{FrameCompositor, TransitionBlender};
use crate::schedule::{ScheduleParams, ViewState, schedule};
use crate::waveform::{
    AnalysisRequest, WaveformAnalyzer, WaveformCache, WaveformFrames, resolve_waveform,
};

/// Everything one episode renders from: waveform analysis, assets and the per-state renderers.
///
/// Built once, never mutated afterwards, shared by every frame and every worker thread.
pub struct EpisodeContext {
    fps: Fps,
    duration_secs: f64,
    waveform: Arc<WaveformFrames>,
    assets: Arc<CompositeAssets>,
    compositor: Arc<CompositorShared>,
    blender: TransitionBlender,
    schedule: ScheduleParams,
    fade_frames: u64,
    composite_only: bool,
}

impl std::fmt::Debug for EpisodeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EpisodeContext")
            .field("fps", &self.fps)
            .field("duration_secs", &self.duration_secs)
            .field("frame_count", &self.frame_count())
            .field("composite_only", &self.composite_only)
            .finish()
    }
}

impl EpisodeContext {
    /// One-time setup: resolve the waveform (cache or analysis) and build the composite assets.
    ///
    /// Cache, image and font problems are absorbed and reported on the returned [`Outcome`].
    #[tracing::instrument(skip_all, fields(title = %visuals.title))]
    pub fn prepare(
        track: &AudioTrack,
        visuals: &EpisodeVisuals,
        config: &VideoConfig,
        fonts: &dyn FontResolver,
        cache: Option<&WaveformCache>,
    ) -> WavecastResult<Outcome<Self>> {
        config.validate()?;
        let mut degradations = Vec::new();

        let analyzer = WaveformAnalyzer::new(config.analyzer)?;
        let request = AnalysisRequest {
            fps: config.fps,
            canvas_width: config.canvas.width,
            smoothing: config.smoothing,
        };
        let waveform = resolve_waveform(track, &analyzer, request, cache)?
            .absorb_into(&mut degradations);

        let builder = CompositeAssetBuilder::new(
            config.canvas,
            config.palette,
            config.layout.clone(),
            fonts,
        );
        let assets = builder.build(visuals)?.absorb_into(&mut degradations);

        let ctx = Self::from_parts(waveform, Arc::new(assets), track.duration_secs(), config)?;
        tracing::info!(
            frames = ctx.frame_count(),
            duration_secs = ctx.duration_secs,
            composite_only = ctx.composite_only,
            degraded = !degradations.is_empty(),
            "episode prepared"
        );
        Ok(Outcome::degraded(ctx, degradations))
    }

    /// Assemble a context from an existing analysis and asset bundle.
    pub fn from_parts(
        waveform: Arc<WaveformFrames>,
        assets: Arc<CompositeAssets>,
        duration_secs: f64,
        config: &VideoConfig,
    ) -> WavecastResult<Self> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(WavecastError::validation(
                "episode duration must be finite and >= 0",
            ));
        }
        if !waveform.is_empty() && waveform.width() != assets.canvas.width {
            return Err(WavecastError::validation(format!(
                "waveform width {} does not match canvas width {}",
                waveform.width(),
                assets.canvas.width
            )));
        }

        let composite_only = config.force_composite_without_image && !assets.has_thematic();
        let blender = TransitionBlender::new(&assets, config.transition)?;
        let title = assets.text.title.as_ref().map_or("", |b| b.text.as_str());
        let seed_salt = shake_salt(title, config.analyzer.seed_salt);
        let compositor = FrameCompositor::new(assets.clone(), config.compositor.clone(), seed_salt)?
            .shared()
            .clone();
        let fade_frames = config.fps.secs_to_frames_floor(config.fade_secs);

        Ok(Self {
            fps: config.fps,
            duration_secs,
            waveform,
            assets,
            compositor,
            blender,
            schedule: config.schedule,
            fade_frames,
            composite_only,
        })
    }

    /// Number of frames in the episode.
    pub fn frame_count(&self) -> u64 {
        self.waveform.len() as u64
    }

    /// Output frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Episode length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Per-frame amplitudes.
    pub fn waveform(&self) -> &Arc<WaveformFrames> {
        &self.waveform
    }

    /// Shared asset bundle.
    pub fn assets(&self) -> &Arc<CompositeAssets> {
        &self.assets
    }

    /// A compositor with its own render surface, for one worker.
    pub fn compositor(&self) -> FrameCompositor {
        FrameCompositor::from_shared(self.compositor.clone())
    }

    /// View shown at frame `idx`.
    pub fn view_state(&self, idx: FrameIndex) -> ViewState {
        if self.composite_only {
            return ViewState::Composite;
        }
        schedule(self.fps.frame_to_secs(idx), self.duration_secs, &self.schedule)
    }

    /// Brightness multiplier of frame `idx`: ramps up over the first fade window and down over
    /// the last one.
    pub fn fade_alpha(&self, idx: FrameIndex) -> f64 {
        let fade = self.fade_frames;
        if fade == 0 {
            return 1.0;
        }
        let total = self.frame_count();
        let i = idx.0;
        let mut alpha: f64 = 1.0;
        if i < fade {
            alpha = alpha.min(i as f64 / fade as f64);
        }
        if i > total.saturating_sub(fade) {
            alpha = alpha.min(total.saturating_sub(i) as f64 / fade as f64);
        }
        alpha
    }

    /// Render frame `idx` with `worker`.
    pub fn render_frame(
        &self,
        worker: &mut FrameCompositor,
        idx: FrameIndex,
    ) -> WavecastResult<Frame> {
        let amplitudes = self.waveform.get(idx).ok_or_else(|| {
            WavecastError::render(format!(
                "frame {} is outside the episode ({} frames)",
                idx.0,
                self.frame_count()
            ))
        })?;
        let t = self.fps.frame_to_secs(idx);
        let state = self.view_state(idx);
        let mut frame = match state {
            ViewState::Composite => worker.render(amplitudes, t, self.duration_secs)?,
            ViewState::Fullscreen => self.blender.fullscreen(),
            ViewState::ZoomIn { .. } | ViewState::ZoomOut { .. } => {
                let composite = worker.render(amplitudes, t, self.duration_secs)?;
                self.blender.blend(&composite, state)?
            }
        };
        frame.apply_fade(self.fade_alpha(idx));
        Ok(frame)
    }
}

fn shake_salt(title: &str, base: u64) -> u64 {
    let mut h = Fnv1a64::new(base);
    h.write_bytes(title.as_bytes());
    h.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/context.rs"]
mod tests;
