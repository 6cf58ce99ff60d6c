//! Title and podcast-name overlay: font resolution, size search and rasterization.

use std::collections::HashMap;

use crate::assets::builtin_font;
use crate::assets::decode::PreparedImage;
use crate::assets::fonts::{FontFace, FontLookup, FontResolver, FontRole};
use crate::foundation::core::{Rect, Rgb8};
use crate::foundation::error::{Degradation, WavecastError, WavecastResult};
use crate::render::canvas::RenderSurface;

/// Share of the band width a line may occupy.
pub const FIT_WIDTH_FRACTION: f64 = 0.95;
/// Share of the band height a line may occupy.
pub const FIT_HEIGHT_FRACTION: f64 = 0.90;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    /// Red channel.
    pub(crate) r: u8,
    /// Green channel.
    pub(crate) g: u8,
    /// Blue channel.
    pub(crate) b: u8,
    /// Alpha channel.
    pub(crate) a: u8,
}

impl From<Rgb8> for TextBrushRgba8 {
    fn from(c: Rgb8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: 255,
        }
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<String, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// Register `face` once and return its family name.
    pub(crate) fn register(&mut self, face: &FontFace) -> WavecastResult<String> {
        if let Some(name) = self.families.get(&face.name) {
            return Ok(name.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(face.bytes.as_ref().clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            WavecastError::font_resolution(format!("no font families in '{}'", face.name))
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| WavecastError::font_resolution("registered font family has no name"))?
            .to_string();
        self.families.insert(face.name.clone(), family_name.clone());
        Ok(family_name)
    }

    /// Shape `text` as a single unwrapped line.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        family: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> WavecastResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(WavecastError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family.to_string())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Remove a leading `"episode: "` (any case) from a title.
pub fn strip_episode_prefix(title: &str) -> &str {
    const PREFIX: &str = "episode: ";
    match title.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => &title[PREFIX.len()..],
        _ => title,
    }
}

/// Largest integer size in `[min_px, max_px]` whose measured box fits `max_w x max_h`.
///
/// `measure` must be monotone in size. When even `min_px` does not fit, `min_px` is returned.
pub(crate) fn fit_font_size(
    min_px: u32,
    max_px: u32,
    max_w: f64,
    max_h: f64,
    mut measure: impl FnMut(u32) -> WavecastResult<(f64, f64)>,
) -> WavecastResult<u32> {
    let min_px = min_px.max(1);
    let mut fits = |s: u32| -> WavecastResult<bool> {
        let (w, h) = measure(s)?;
        Ok(w <= max_w && h <= max_h)
    };
    let (mut lo, mut hi) = (min_px, max_px.max(min_px));
    if !fits(lo)? {
        return Ok(lo);
    }
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if fits(mid)? {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

/// How a text block was rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaceKind {
    /// Shaped with a resolved font file.
    Font {
        /// Font source name.
        name: String,
    },
    /// Drawn with the built-in bitmap face.
    Builtin,
}

/// One positioned, pre-rendered line of text.
#[derive(Clone, Debug)]
pub struct TextBlock {
    /// Text as rendered (after prefix stripping).
    pub text: String,
    /// Chosen font size in pixels.
    pub size_px: u32,
    /// Face used.
    pub face: FaceKind,
    /// Band the line was fitted into.
    pub band: Rect,
    /// Top-left canvas position of `layer`.
    pub origin: (i64, i64),
    /// Text plus drop shadow.
    pub layer: PreparedImage,
}

/// Text elements of the composite view, built once per episode.
#[derive(Clone, Debug, Default)]
pub struct TextOverlay {
    /// Episode title above the image.
    pub title: Option<TextBlock>,
    /// Podcast name below the image.
    pub podcast: Option<TextBlock>,
}

/// Drop shadow settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TextShadow {
    pub(crate) offset_px: u32,
    pub(crate) alpha: u8,
}

enum ResolvedFace {
    Font {
        name: String,
        family: String,
        data: vello_cpu::peniko::FontData,
    },
    Builtin,
}

/// Builds [`TextBlock`]s, resolving each role's font once.
pub(crate) struct TextOverlayBuilder<'a> {
    resolver: &'a dyn FontResolver,
    engine: TextLayoutEngine,
    surface: RenderSurface,
    faces: HashMap<FontRole, ResolvedFace>,
    min_size_px: u32,
    shadow: TextShadow,
}

impl<'a> TextOverlayBuilder<'a> {
    pub(crate) fn new(
        resolver: &'a dyn FontResolver,
        min_size_px: u32,
        shadow: TextShadow,
    ) -> Self {
        Self {
            resolver,
            engine: TextLayoutEngine::new(),
            surface: RenderSurface::new(),
            faces: HashMap::new(),
            min_size_px,
            shadow,
        }
    }

    fn take_face(&mut self, role: FontRole, degradations: &mut Vec<Degradation>) -> ResolvedFace {
        if let Some(face) = self.faces.remove(&role) {
            return face;
        }
        match self.resolver.resolve(role) {
            FontLookup::Found(face) => match self.engine.register(&face) {
                Ok(family) => ResolvedFace::Font {
                    name: face.name.clone(),
                    family,
                    data: vello_cpu::peniko::FontData::new(
                        vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
                        0,
                    ),
                },
                Err(err) => {
                    tracing::warn!(
                        role = role.as_str(),
                        font = %face.name,
                        %err,
                        "font unusable, using built-in face"
                    );
                    degradations.push(Degradation::BuiltinFont {
                        role: role.as_str().to_string(),
                        tried: vec![face.name.clone()],
                    });
                    ResolvedFace::Builtin
                }
            },
            FontLookup::NotFound { tried } => {
                tracing::warn!(
                    role = role.as_str(),
                    candidates = tried.len(),
                    "no font found, using built-in face"
                );
                degradations.push(Degradation::BuiltinFont {
                    role: role.as_str().to_string(),
                    tried,
                });
                ResolvedFace::Builtin
            }
        }
    }

    /// Fit `text` into `band` and render it. Empty text yields `None`.
    pub(crate) fn block(
        &mut self,
        role: FontRole,
        text: &str,
        band: Rect,
        color: Rgb8,
        degradations: &mut Vec<Degradation>,
    ) -> WavecastResult<Option<TextBlock>> {
        let text = text.trim();
        if text.is_empty() || band.width() < 1.0 || band.height() < 1.0 {
            return Ok(None);
        }
        let max_w = band.width() * FIT_WIDTH_FRACTION;
        let max_h = band.height() * FIT_HEIGHT_FRACTION;
        let max_px = band.height().floor() as u32;
        let min_px = self.min_size_px;
        let shadow = self.shadow;
        let brush = TextBrushRgba8::from(color);

        let face = self.take_face(role, degradations);
        let out = match &face {
            ResolvedFace::Builtin => {
                let size = fit_font_size(min_px, max_px, max_w, max_h, |s| {
                    let (w, h) = builtin_font::measure(text, s as f32);
                    Ok((f64::from(w), f64::from(h)))
                })?;
                let (tw, th) = builtin_font::measure(text, size as f32);
                let layer = builtin_font::render_layer(
                    text,
                    size as f32,
                    color.premul_rgba(255),
                    Some((shadow.offset_px, [0, 0, 0, shadow.alpha])),
                );
                TextBlock {
                    text: text.to_string(),
                    size_px: size,
                    face: FaceKind::Builtin,
                    band,
                    origin: centred_origin(band, f64::from(tw), f64::from(th), 0),
                    layer,
                }
            }
            ResolvedFace::Font { name, family, data } => {
                let engine = &mut self.engine;
                let size = fit_font_size(min_px, max_px, max_w, max_h, |s| {
                    let layout = engine.layout(text, family, s as f32, brush)?;
                    Ok((f64::from(layout.width()), f64::from(layout.height())))
                })?;
                let layout = self.engine.layout(text, family, size as f32, brush)?;
                let (tw, th) = (f64::from(layout.width()), f64::from(layout.height()));
                let margin = (size / 8).max(1);
                let layer =
                    render_layout(&mut self.surface, &layout, data, tw, th, margin, shadow)?;
                TextBlock {
                    text: text.to_string(),
                    size_px: size,
                    face: FaceKind::Font { name: name.clone() },
                    band,
                    origin: centred_origin(band, tw, th, margin),
                    layer,
                }
            }
        };
        self.faces.insert(role, face);
        tracing::debug!(role = role.as_str(), size_px = out.size_px, "text block fitted");
        Ok(Some(out))
    }
}

fn centred_origin(band: Rect, w: f64, h: f64, margin: u32) -> (i64, i64) {
    let c = band.center();
    (
        (c.x - w / 2.0).round() as i64 - i64::from(margin),
        (c.y - h / 2.0).round() as i64 - i64::from(margin),
    )
}

fn render_layout(
    surface: &mut RenderSurface,
    layout: &parley::Layout<TextBrushRgba8>,
    font: &vello_cpu::peniko::FontData,
    text_w: f64,
    text_h: f64,
    margin: u32,
    shadow: TextShadow,
) -> WavecastResult<PreparedImage> {
    let w = text_w.ceil() as u32 + shadow.offset_px + 2 * margin;
    let h = text_h.ceil() as u32 + shadow.offset_px + 2 * margin;
    let m = f64::from(margin);
    let o = f64::from(shadow.offset_px);
    let bytes = surface.draw(w, h, |ctx| {
        let passes = [(m + o, m + o, Some(shadow.alpha)), (m, m, None)];
        for (dx, dy, shadow_alpha) in passes {
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((dx, dy)));
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    let paint = match shadow_alpha {
                        Some(a) => vello_cpu::peniko::Color::from_rgba8(0, 0, 0, a),
                        None => vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ),
                    };
                    ctx.set_paint(paint);
                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }
        Ok(())
    })?;
    PreparedImage::from_premul(w, h, bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
