//! Composite view: background, waveform, logo, framed image with orbiting light, text.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assets::builder::CompositeAssets;
use crate::foundation::core::{Point, Rect, Rgb8};
use crate::foundation::error::{WavecastError, WavecastResult};
use crate::foundation::math::{DetRng, seed_for_time};
use crate::render::canvas::{self, ImagePaint, RenderSurface};
use crate::render::frame::{Frame, FrameRgba};

const SHAKE_SALT: u64 = 0x5348_414b_4500_0001;

/// Drawing knobs of the composite view. Pixel lengths are given at 1080p.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositorParams {
    /// Vertical displacement of an amplitude of 1.0.
    pub amplitude_px: f64,
    /// Stroke width of the innermost waveform pass.
    pub line_width_px: f64,
    /// Brightening factor applied to the waveform colour of each pass, outermost first.
    pub pass_gains: Vec<f32>,
    /// `|a| * intensity_gain` (capped at 1) scales segment brightness between 50% and 100%.
    pub intensity_gain: f64,
    /// Amplitude above which a glow dot is drawn.
    pub glow_threshold: f64,
    /// Glow dot radius.
    pub glow_radius_px: f64,
    /// The waveform never comes closer than this to the top/bottom edge.
    pub waveform_edge_px: f64,
    /// Alpha of the centre baseline.
    pub baseline_alpha: u8,
    /// Mean absolute amplitude below which the logo stays still.
    pub shake_threshold: f64,
    /// Shake amplitude per unit of mean absolute amplitude.
    pub shake_gain_px: f64,
    /// Upper bound on the shake offset.
    pub shake_max_px: f64,
    /// Relative logo scale swing around 1.0; `0` keeps the logo at its prepared size.
    pub logo_breathing_amplitude: f64,
    /// Breathing cycles over the whole episode.
    pub logo_breathing_frequency: f64,
    /// Seconds for the light to travel once around the image frame.
    pub orbit_period_secs: f64,
    /// Outer radius of the orbiting light.
    pub orbit_radius_px: f64,
    /// Title fade-in length.
    pub text_fade_in_secs: f64,
    /// Draw a playback progress bar near the bottom edge.
    pub progress_bar: bool,
}

impl Default for CompositorParams {
    fn default() -> Self {
        Self {
            amplitude_px: 350.0,
            line_width_px: 8.0,
            pass_gains: vec![1.4, 1.3, 1.2, 1.25, 1.3],
            intensity_gain: 15.0,
            glow_threshold: 0.06,
            glow_radius_px: 6.0,
            waveform_edge_px: 50.0,
            baseline_alpha: 128,
            shake_threshold: 0.02,
            shake_gain_px: 250.0,
            shake_max_px: 10.0,
            logo_breathing_amplitude: 0.05,
            logo_breathing_frequency: 0.5,
            orbit_period_secs: 12.0,
            orbit_radius_px: 28.0,
            text_fade_in_secs: 1.5,
            progress_bar: false,
        }
    }
}

impl CompositorParams {
    /// Reject non-finite or negative values.
    pub fn validate(&self) -> WavecastResult<()> {
        for (name, v) in [
            ("amplitude_px", self.amplitude_px),
            ("line_width_px", self.line_width_px),
            ("intensity_gain", self.intensity_gain),
            ("glow_threshold", self.glow_threshold),
            ("glow_radius_px", self.glow_radius_px),
            ("waveform_edge_px", self.waveform_edge_px),
            ("shake_threshold", self.shake_threshold),
            ("shake_gain_px", self.shake_gain_px),
            ("shake_max_px", self.shake_max_px),
            ("logo_breathing_frequency", self.logo_breathing_frequency),
            ("orbit_radius_px", self.orbit_radius_px),
            ("text_fade_in_secs", self.text_fade_in_secs),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(WavecastError::validation(format!(
                    "compositor {name} must be finite and >= 0"
                )));
            }
        }
        if !self.orbit_period_secs.is_finite() || self.orbit_period_secs <= 0.0 {
            return Err(WavecastError::validation(
                "compositor orbit_period_secs must be finite and > 0",
            ));
        }
        if !(0.0..1.0).contains(&self.logo_breathing_amplitude) {
            return Err(WavecastError::validation(
                "compositor logo_breathing_amplitude must be in [0, 1)",
            ));
        }
        if self.pass_gains.is_empty() {
            return Err(WavecastError::validation(
                "compositor needs at least one waveform pass",
            ));
        }
        if self.pass_gains.iter().any(|g| !g.is_finite() || *g < 0.0) {
            return Err(WavecastError::validation(
                "compositor pass gains must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

struct Placed {
    paint: ImagePaint,
    x: f64,
    y: f64,
}

struct Pass {
    width: f64,
    color: Rgb8,
}

/// Immutable per-episode drawing state shared by every compositor instance.
pub(crate) struct CompositorShared {
    assets: Arc<CompositeAssets>,
    params: CompositorParams,
    seed_salt: u64,
    passes: Vec<Pass>,
    logo: Option<Placed>,
    thematic: Option<(Placed, Rect)>,
    title: Option<Placed>,
    podcast: Option<Placed>,
}

/// Renders [`ViewState::Composite`](crate::ViewState::Composite) frames.
///
/// Output depends only on the amplitude array, the time position, the duration and the episode
/// assets, so equal inputs give byte-identical frames.
pub struct FrameCompositor {
    shared: Arc<CompositorShared>,
    surface: RenderSurface,
}

impl Clone for FrameCompositor {
    fn clone(&self) -> Self {
        Self::from_shared(self.shared.clone())
    }
}

impl std::fmt::Debug for FrameCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCompositor")
            .field("canvas", &self.shared.assets.canvas)
            .finish()
    }
}

fn placed(
    img: Option<&crate::assets::PreparedImage>,
    at: Option<(i64, i64)>,
) -> WavecastResult<Option<Placed>> {
    match (img, at) {
        (Some(img), Some((x, y))) => Ok(Some(Placed {
            paint: ImagePaint::new(img)?,
            x: x as f64,
            y: y as f64,
        })),
        _ => Ok(None),
    }
}

impl FrameCompositor {
    /// Prepare paints for `assets`. `seed_salt` decorrelates the logo shake between episodes.
    pub fn new(
        assets: Arc<CompositeAssets>,
        params: CompositorParams,
        seed_salt: u64,
    ) -> WavecastResult<Self> {
        params.validate()?;
        let scale = assets.canvas.scale();
        let palette = &assets.palette;
        let n = params.pass_gains.len();
        let passes = params
            .pass_gains
            .iter()
            .enumerate()
            .map(|(k, &gain)| {
                // outer passes are wider; the last two passes use the accent colour
                let base = match k {
                    0 => palette.waveform_light,
                    _ if k + 2 >= n && n > 2 => palette.accent,
                    _ => palette.waveform_mid,
                };
                Pass {
                    width: ((params.line_width_px + (n - 1 - k) as f64) * scale).max(1.0),
                    color: base.scaled(gain),
                }
            })
            .collect();

        let logo = placed(assets.logo.as_ref(), assets.layout.logo_origin)?;
        let thematic = match (assets.thematic.as_ref(), assets.layout.thematic_rect) {
            (Some(img), Some(rect)) => Some((
                Placed {
                    paint: ImagePaint::new(img)?,
                    x: rect.x0,
                    y: rect.y0,
                },
                rect,
            )),
            _ => None,
        };
        let title = match &assets.text.title {
            Some(b) => placed(Some(&b.layer), Some(b.origin))?,
            None => None,
        };
        let podcast = match &assets.text.podcast {
            Some(b) => placed(Some(&b.layer), Some(b.origin))?,
            None => None,
        };

        Ok(Self::from_shared(Arc::new(CompositorShared {
            assets,
            params,
            seed_salt,
            passes,
            logo,
            thematic,
            title,
            podcast,
        })))
    }

    pub(crate) fn from_shared(shared: Arc<CompositorShared>) -> Self {
        Self {
            shared,
            surface: RenderSurface::new(),
        }
    }

    pub(crate) fn shared(&self) -> &Arc<CompositorShared> {
        &self.shared
    }

    /// Episode assets this compositor draws.
    pub fn assets(&self) -> &Arc<CompositeAssets> {
        &self.shared.assets
    }

    /// Render the composite view for time `t_secs` of an episode lasting `duration_secs`.
    pub fn render(
        &mut self,
        amplitudes: &[f32],
        t_secs: f64,
        duration_secs: f64,
    ) -> WavecastResult<Frame> {
        let shared = self.shared.clone();
        let canvas = shared.assets.canvas;
        let bytes = self.surface.draw(canvas.width, canvas.height, |ctx| {
            shared.draw(ctx, amplitudes, t_secs, duration_secs);
            Ok(())
        })?;
        Ok(FrameRgba::new(canvas.width, canvas.height, bytes)?.flatten())
    }
}

impl CompositorShared {
    fn draw(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        amplitudes: &[f32],
        t_secs: f64,
        duration_secs: f64,
    ) {
        let canvas = self.assets.canvas;
        ctx.set_paint(canvas::color(self.assets.palette.background, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(canvas.width),
            f64::from(canvas.height),
        ));

        if !self.is_silent(amplitudes) {
            self.draw_waveform(ctx, amplitudes);
        }

        if let Some(logo) = &self.logo {
            let (dx, dy) = self.shake_offset(amplitudes, t_secs);
            let scale = self.logo_scale(t_secs, duration_secs);
            logo.paint.draw_scaled(ctx, logo.x + dx as f64, logo.y + dy as f64, scale, 1.0);
        }

        if let Some((img, rect)) = &self.thematic {
            img.paint.draw(ctx, img.x, img.y, 1.0);
            self.draw_orbit_light(ctx, *rect, t_secs);
        }

        if self.params.progress_bar {
            self.draw_progress_bar(ctx, t_secs, duration_secs);
        }

        if let Some(title) = &self.title {
            title.paint.draw(ctx, title.x, title.y, self.title_opacity(t_secs));
        }
        if let Some(podcast) = &self.podcast {
            podcast.paint.draw(ctx, podcast.x, podcast.y, 1.0);
        }
    }

    fn amplitude_px(&self) -> f64 {
        self.assets.canvas.px(self.params.amplitude_px)
    }

    /// No sample would move the line by half a pixel.
    pub(crate) fn is_silent(&self, amplitudes: &[f32]) -> bool {
        let amp = self.amplitude_px();
        amplitudes
            .iter()
            .all(|a| (f64::from(*a) * amp).abs() < 0.5)
    }

    fn waveform_points(&self, amplitudes: &[f32]) -> Vec<Point> {
        let canvas = self.assets.canvas;
        let centre = f64::from(canvas.height / 2);
        let amp = self.amplitude_px();
        let edge = canvas.px(self.params.waveform_edge_px).round();
        let bottom = (f64::from(canvas.height) - edge).max(edge);
        amplitudes
            .iter()
            .take(canvas.width as usize)
            .enumerate()
            .map(|(i, a)| {
                let y = (centre - (f64::from(*a) * amp).trunc()).clamp(edge, bottom);
                Point::new(i as f64, y)
            })
            .collect()
    }

    fn draw_waveform(&self, ctx: &mut vello_cpu::RenderContext, amplitudes: &[f32]) {
        let canvas = self.assets.canvas;
        let palette = &self.assets.palette;
        let scale = canvas.scale();
        let centre = f64::from(canvas.height / 2);

        ctx.set_paint(canvas::color(
            palette.waveform_dark.scaled(0.3),
            self.params.baseline_alpha,
        ));
        let half = (0.5 * scale).max(0.5);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            centre - half,
            f64::from(canvas.width),
            centre + half,
        ));

        let points = self.waveform_points(amplitudes);
        if points.len() < 2 {
            return;
        }
        let intensity: Vec<f32> = amplitudes
            .iter()
            .map(|a| (a.abs() as f64 * self.params.intensity_gain).min(1.0) as f32)
            .collect();

        for pass in &self.passes {
            let mut paths: BTreeMap<[u8; 3], vello_cpu::kurbo::BezPath> = BTreeMap::new();
            let mut current: Option<[u8; 3]> = None;
            for i in 0..points.len() - 1 {
                let c = pass.color.scaled(0.5 + 0.5 * intensity[i]);
                let key = [c.r, c.g, c.b];
                let path = paths.entry(key).or_default();
                if current != Some(key) {
                    path.move_to(to_cpu(points[i]));
                    current = Some(key);
                }
                path.line_to(to_cpu(points[i + 1]));
            }
            ctx.set_stroke(
                vello_cpu::kurbo::Stroke::new(pass.width)
                    .with_caps(vello_cpu::kurbo::Cap::Round)
                    .with_join(vello_cpu::kurbo::Join::Round),
            );
            for (rgb, path) in &paths {
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(rgb[0], rgb[1], rgb[2], 255));
                ctx.stroke_path(path);
            }
        }

        let radius = (self.params.glow_radius_px * scale).max(1.0);
        let mut dots: BTreeMap<[u8; 3], vello_cpu::kurbo::BezPath> = BTreeMap::new();
        for (p, a) in points.iter().zip(amplitudes) {
            let a = f64::from(a.abs());
            if a <= self.params.glow_threshold {
                continue;
            }
            let lift = (255.0 * a * 0.6).min(255.0) as u8;
            let c = palette.accent.lifted(lift);
            let path = dots.entry([c.r, c.g, c.b]).or_default();
            path.extend(canvas::circle_path(p.x, p.y, radius).elements().iter().copied());
        }
        for (rgb, path) in &dots {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(rgb[0], rgb[1], rgb[2], 255));
            ctx.fill_path(path);
        }
    }

    /// Integer logo offset for this frame; zero when the frame is quiet.
    pub(crate) fn shake_offset(&self, amplitudes: &[f32], t_secs: f64) -> (i64, i64) {
        if amplitudes.is_empty() {
            return (0, 0);
        }
        let mean = amplitudes.iter().map(|a| f64::from(a.abs())).sum::<f64>()
            / amplitudes.len() as f64;
        if mean <= self.params.shake_threshold {
            return (0, 0);
        }
        let canvas = self.assets.canvas;
        let magnitude = canvas
            .px(mean * self.params.shake_gain_px)
            .min(canvas.px(self.params.shake_max_px));
        let mut rng = DetRng::new(seed_for_time(self.seed_salt ^ SHAKE_SALT, t_secs));
        let dx = rng.uniform(-magnitude, magnitude).round() as i64;
        let dy = rng.uniform(-magnitude, magnitude).round() as i64;
        (dx, dy)
    }

    /// Breathing scale of the logo: one sine of `logo_breathing_frequency` cycles per episode.
    pub(crate) fn logo_scale(&self, t_secs: f64, duration_secs: f64) -> f64 {
        let amp = self.params.logo_breathing_amplitude;
        if amp == 0.0 || duration_secs <= 0.0 {
            return 1.0;
        }
        let cycles = t_secs / duration_secs * self.params.logo_breathing_frequency;
        let phase = cycles * std::f64::consts::TAU;
        1.0 + amp * phase.sin()
    }

    /// Position on the frame perimeter, clockwise from the top-left corner.
    pub(crate) fn orbit_point(&self, rect: Rect, t_secs: f64) -> Point {
        let period = self.params.orbit_period_secs;
        let phase = t_secs.rem_euclid(period) / period;
        perimeter_point(rect, phase)
    }

    fn draw_orbit_light(&self, ctx: &mut vello_cpu::RenderContext, rect: Rect, t_secs: f64) {
        let p = self.orbit_point(rect, t_secs);
        let r = self.assets.canvas.px(self.params.orbit_radius_px);
        if r <= 0.0 {
            return;
        }
        let palette = &self.assets.palette;
        let rings = [
            (1.0, palette.accent, 36u8),
            (0.7, palette.accent, 64),
            (0.45, palette.waveform_light, 120),
            (0.2, palette.waveform_light.lifted(40), 230),
        ];
        for (k, color, alpha) in rings {
            ctx.set_paint(canvas::color(color, alpha));
            ctx.fill_path(&canvas::circle_path(p.x, p.y, (r * k).max(0.5)));
        }
    }

    fn draw_progress_bar(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        t_secs: f64,
        duration_secs: f64,
    ) {
        if duration_secs <= 0.0 {
            return;
        }
        let canvas = self.assets.canvas;
        let palette = &self.assets.palette;
        let x = canvas.px(100.0).round();
        let w = (f64::from(canvas.width) - 2.0 * x).max(0.0);
        let h = canvas.px(4.0).round().max(1.0);
        let y = f64::from(canvas.height) - canvas.px(30.0).round();
        ctx.set_paint(canvas::color(palette.waveform_dark, 255));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x, y, x + w, y + h));
        let fill = (w * (t_secs / duration_secs).clamp(0.0, 1.0)).floor();
        if fill > 0.0 {
            ctx.set_paint(canvas::color(palette.accent, 255));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(x, y, x + fill, y + h));
        }
    }

    pub(crate) fn title_opacity(&self, t_secs: f64) -> f32 {
        let fade = self.params.text_fade_in_secs;
        if fade <= 0.0 {
            return 1.0;
        }
        (t_secs / fade).clamp(0.0, 1.0) as f32
    }
}

/// `phase` in `[0, 1)` maps to a point on the rectangle outline, clockwise from `(x0, y0)`.
pub(crate) fn perimeter_point(rect: Rect, phase: f64) -> Point {
    let (w, h) = (rect.width().abs(), rect.height().abs());
    let total = 2.0 * (w + h);
    if total <= 0.0 {
        return Point::new(rect.x0, rect.y0);
    }
    let mut s = phase.rem_euclid(1.0) * total;
    if s < w {
        return Point::new(rect.x0 + s, rect.y0);
    }
    s -= w;
    if s < h {
        return Point::new(rect.x1, rect.y0 + s);
    }
    s -= h;
    if s < w {
        return Point::new(rect.x1 - s, rect.y1);
    }
    s -= w;
    Point::new(rect.x0, rect.y1 - s)
}

fn to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
