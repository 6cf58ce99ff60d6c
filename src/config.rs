//! Serde-loadable configuration of a video run.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::{LayoutParams, Palette};
use crate::encode::EncoderSettings;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{WavecastError, WavecastResult};
use crate::render::{CompositorParams, DEFAULT_RING_CAPACITY, TransitionParams};
use crate::schedule::ScheduleParams;
use crate::sequence::RenderThreading;
use crate::waveform::AnalyzerParams;

/// Podcast name shown at the bottom of the composite view unless overridden.
pub const DEFAULT_PODCAST_NAME: &str = "Codex Mentis: Science and technology to study cognition";

/// Everything that shapes the output video, shared by every episode of a run.
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```json
/// { "canvas": { "width": 1280, "height": 720 }, "schedule": { "fullscreen_secs": 120 } }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Output size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Colours.
    pub palette: Palette,
    /// Fixed line at the bottom of the composite view.
    pub podcast_name: String,
    /// Temporal smoothing factor of the waveform, in `[0, 1)`.
    pub smoothing: f32,
    /// Length of the fade-in and fade-out envelopes.
    pub fade_secs: f64,
    /// View cycle timing.
    pub schedule: ScheduleParams,
    /// Amplitude analysis.
    pub analyzer: AnalyzerParams,
    /// Asset placement.
    pub layout: LayoutParams,
    /// Composite drawing.
    pub compositor: CompositorParams,
    /// Zoom transitions.
    pub transition: TransitionParams,
    /// Frames the generator keeps for repeated requests.
    pub ring_capacity: usize,
    /// Frame-level parallelism.
    pub threading: RenderThreading,
    /// Show the composite view for the whole episode when there is no thematic image.
    pub force_composite_without_image: bool,
    /// Directory for waveform caches; `None` stores the cache next to the audio file.
    pub cache_dir: Option<PathBuf>,
    /// Skip the waveform cache entirely.
    pub disable_cache: bool,
    /// Codec settings of the `ffmpeg` sink.
    pub encoder: EncoderSettings,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1920,
                height: 1080,
            },
            fps: Fps { num: 30, den: 1 },
            palette: Palette::default(),
            podcast_name: DEFAULT_PODCAST_NAME.to_string(),
            smoothing: 0.8,
            fade_secs: 2.0,
            schedule: ScheduleParams::default(),
            analyzer: AnalyzerParams::default(),
            layout: LayoutParams::default(),
            compositor: CompositorParams::default(),
            transition: TransitionParams::default(),
            ring_capacity: DEFAULT_RING_CAPACITY,
            threading: RenderThreading::default(),
            force_composite_without_image: true,
            cache_dir: None,
            disable_cache: false,
            encoder: EncoderSettings::default(),
        }
    }
}

impl VideoConfig {
    /// Read a JSON configuration file and validate it.
    pub fn from_path(path: &Path) -> WavecastResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        let cfg = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Parse a JSON configuration and validate it.
    pub fn from_json(text: &str) -> WavecastResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| WavecastError::serde(format!("invalid config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every nested parameter block.
    pub fn validate(&self) -> WavecastResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(WavecastError::validation("canvas width/height must be > 0"));
        }
        if u16::try_from(self.canvas.width).is_err() || u16::try_from(self.canvas.height).is_err()
        {
            return Err(WavecastError::validation(
                "canvas width/height must fit in u16",
            ));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if !self.smoothing.is_finite() || !(0.0..1.0).contains(&self.smoothing) {
            return Err(WavecastError::validation("smoothing must be within [0, 1)"));
        }
        if !self.fade_secs.is_finite() || self.fade_secs < 0.0 {
            return Err(WavecastError::validation(
                "fade_secs must be finite and >= 0",
            ));
        }
        if self.ring_capacity == 0 {
            return Err(WavecastError::validation("ring_capacity must be >= 1"));
        }
        if self.threading.threads == Some(0) {
            return Err(WavecastError::validation(
                "threading 'threads' must be >= 1 when set",
            ));
        }
        self.schedule.validate()?;
        self.analyzer.validate()?;
        self.layout.validate()?;
        self.compositor.validate()?;
        self.transition.validate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
