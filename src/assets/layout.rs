//! Placement of logo, thematic image and text bands on the canvas.
//!
//! Pixel lengths are given at 1080p and scaled with the canvas height.

use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{WavecastError, WavecastResult};

/// Geometry knobs for the composite view.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Longest logo side before padding.
    pub logo_max_px: f64,
    /// Gaussian glow radius around the logo.
    pub logo_glow_radius_px: f64,
    /// Transparent padding around the logo that holds the glow.
    pub logo_pad_px: f64,
    /// Distance from the left canvas edge to the padded logo.
    pub logo_left_px: f64,
    /// Minimum distance between the padded logo and the top/bottom edges.
    pub logo_edge_px: f64,
    /// Horizontal gap between the padded logo and the thematic image.
    pub image_gap_px: f64,
    /// Right margin of the image area as a fraction of canvas width.
    pub image_right_margin_frac: f64,
    /// Tallest the framed image may be, as a fraction of canvas height.
    pub image_max_height_frac: f64,
    /// Gradient border width around the thematic image.
    pub frame_border_px: f64,
    /// Left/right text margin as a fraction of canvas width.
    pub text_margin_x_frac: f64,
    /// Space kept above the title band and below the podcast band, as a fraction of height.
    pub text_edge_frac: f64,
    /// Gap between a text band and the thematic image.
    pub band_gap_px: f64,
    /// Image-relative bands thinner than this fraction of height fall back to the fixed bands.
    pub min_band_frac: f64,
    /// Fixed title band `[top, bottom]` as fractions of height.
    pub title_band_frac: [f64; 2],
    /// Fixed podcast band `[top, bottom]` as fractions of height.
    pub podcast_band_frac: [f64; 2],
    /// Smallest font size the size search will return.
    pub min_font_px: f64,
    /// Drop-shadow offset.
    pub shadow_offset_px: f64,
    /// Drop-shadow alpha.
    pub shadow_alpha: u8,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            logo_max_px: 400.0,
            logo_glow_radius_px: 10.0,
            logo_pad_px: 20.0,
            logo_left_px: 50.0,
            logo_edge_px: 50.0,
            image_gap_px: 60.0,
            image_right_margin_frac: 0.05,
            image_max_height_frac: 0.6,
            frame_border_px: 10.0,
            text_margin_x_frac: 0.05,
            text_edge_frac: 0.04,
            band_gap_px: 12.0,
            min_band_frac: 0.06,
            title_band_frac: [0.10, 0.25],
            podcast_band_frac: [0.80, 0.92],
            min_font_px: 12.0,
            shadow_offset_px: 3.0,
            shadow_alpha: 120,
        }
    }
}

impl LayoutParams {
    /// Reject negative or non-finite lengths and inverted bands.
    pub fn validate(&self) -> WavecastResult<()> {
        let lengths = [
            ("logo_max_px", self.logo_max_px),
            ("logo_glow_radius_px", self.logo_glow_radius_px),
            ("logo_pad_px", self.logo_pad_px),
            ("logo_left_px", self.logo_left_px),
            ("logo_edge_px", self.logo_edge_px),
            ("image_gap_px", self.image_gap_px),
            ("frame_border_px", self.frame_border_px),
            ("band_gap_px", self.band_gap_px),
            ("min_font_px", self.min_font_px),
            ("shadow_offset_px", self.shadow_offset_px),
        ];
        for (name, v) in lengths {
            if !v.is_finite() || v < 0.0 {
                return Err(WavecastError::validation(format!(
                    "layout {name} must be finite and >= 0"
                )));
            }
        }
        if self.logo_max_px < 1.0 {
            return Err(WavecastError::validation("layout logo_max_px must be >= 1"));
        }
        let fractions = [
            ("image_right_margin_frac", self.image_right_margin_frac),
            ("image_max_height_frac", self.image_max_height_frac),
            ("text_margin_x_frac", self.text_margin_x_frac),
            ("text_edge_frac", self.text_edge_frac),
            ("min_band_frac", self.min_band_frac),
        ];
        for (name, v) in fractions {
            if !(0.0..=1.0).contains(&v) {
                return Err(WavecastError::validation(format!(
                    "layout {name} must be in [0, 1]"
                )));
            }
        }
        if self.text_margin_x_frac >= 0.5 {
            return Err(WavecastError::validation(
                "layout text_margin_x_frac must be < 0.5",
            ));
        }
        for (name, [a, b]) in [
            ("title_band_frac", self.title_band_frac),
            ("podcast_band_frac", self.podcast_band_frac),
        ] {
            if !(0.0..=1.0).contains(&a) || !(0.0..=1.0).contains(&b) || a >= b {
                return Err(WavecastError::validation(format!(
                    "layout {name} must satisfy 0 <= top < bottom <= 1"
                )));
            }
        }
        Ok(())
    }
}

/// Resolved positions for one canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    /// Top-left of the padded logo, if there is one.
    pub logo_origin: Option<(i64, i64)>,
    /// Framed thematic image rectangle, if there is one.
    pub thematic_rect: Option<Rect>,
    /// Band the title is fitted into.
    pub title_band: Rect,
    /// Band the podcast name is fitted into.
    pub podcast_band: Rect,
}

/// Left-anchored, vertically centred and clamped away from the edges.
pub(crate) fn logo_origin(canvas: Canvas, params: &LayoutParams, logo_h: u32) -> (i64, i64) {
    let x = canvas.px(params.logo_left_px).round() as i64;
    let h = i64::from(canvas.height);
    let lh = i64::from(logo_h);
    let edge = canvas.px(params.logo_edge_px).round() as i64;
    let centred = h / 2 - lh / 2;
    let y = edge.max((h - lh - edge).min(centred));
    (x, y)
}

/// Area the framed thematic image may occupy: right of the logo, inside the right margin, at
/// most `image_max_height_frac` tall and vertically centred.
pub(crate) fn image_area(canvas: Canvas, params: &LayoutParams, logo_right: Option<f64>) -> Rect {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let left = match logo_right {
        Some(r) => r + canvas.px(params.image_gap_px),
        None => w * params.text_margin_x_frac,
    };
    let right = (w - w * params.image_right_margin_frac).max(left);
    let max_h = h * params.image_max_height_frac;
    let top = (h - max_h) / 2.0;
    Rect::new(left, top, right, top + max_h)
}

/// Centre a `w x h` box inside `area`, snapped to whole pixels.
pub(crate) fn centre_in(area: Rect, w: u32, h: u32) -> Rect {
    let c = area.center();
    let x0 = (c.x - f64::from(w) / 2.0).round();
    let y0 = (c.y - f64::from(h) / 2.0).round();
    Rect::new(x0, y0, x0 + f64::from(w), y0 + f64::from(h))
}

/// Title and podcast bands; relative to the image when it leaves enough room.
pub(crate) fn text_bands(
    canvas: Canvas,
    params: &LayoutParams,
    image: Option<Rect>,
) -> (Rect, Rect) {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let x0 = w * params.text_margin_x_frac;
    let x1 = w - x0;
    let [title_top, title_bottom] = params.title_band_frac;
    let fixed_title = Rect::new(x0, h * title_top, x1, h * title_bottom);
    let fixed_podcast = Rect::new(
        x0,
        h * params.podcast_band_frac[0],
        x1,
        h * params.podcast_band_frac[1],
    );
    let Some(img) = image else {
        return (fixed_title, fixed_podcast);
    };
    let edge = h * params.text_edge_frac;
    let gap = canvas.px(params.band_gap_px);
    let min_band = h * params.min_band_frac;

    let title = Rect::new(x0, edge, x1, img.y0 - gap);
    let podcast = Rect::new(x0, img.y1 + gap, x1, h - edge);
    (
        if title.height() >= min_band && title.y1 > title.y0 {
            title
        } else {
            fixed_title
        },
        if podcast.height() >= min_band && podcast.y1 > podcast.y0 {
            podcast
        } else {
            fixed_podcast
        },
    )
}

#[cfg(test)]
#[path = "../../tests/unit/assets/layout.rs"]
mod tests;
