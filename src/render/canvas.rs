//! `vello_cpu` plumbing shared by every rasterizing step.

use std::sync::Arc;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::Rgb8;
use crate::foundation::error::{WavecastError, WavecastResult};

/// Reusable CPU render context plus output pixmap.
#[derive(Default)]
pub(crate) struct RenderSurface {
    ctx: Option<vello_cpu::RenderContext>,
    pixmap: Option<vello_cpu::Pixmap>,
}

impl std::fmt::Debug for RenderSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSurface")
            .field("has_ctx", &self.ctx.is_some())
            .finish()
    }
}

impl RenderSurface {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Run `f` against a reset context of `width x height` and return the premultiplied RGBA8
    /// result.
    pub(crate) fn draw(
        &mut self,
        width: u32,
        height: u32,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> WavecastResult<()>,
    ) -> WavecastResult<Vec<u8>> {
        let (w, h) = dims_u16(width, height)?;
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(w, h),
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            Some(_) => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        reset_state(&mut ctx);
        let res = f(&mut ctx);
        let out = res.map(|()| {
            let mut pixmap = match self.pixmap.take() {
                Some(p) if p.width() == w && p.height() == h => p,
                _ => vello_cpu::Pixmap::new(w, h),
            };
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            let bytes = pixmap.data_as_u8_slice().to_vec();
            self.pixmap = Some(pixmap);
            bytes
        });
        self.ctx = Some(ctx);
        out
    }
}

pub(crate) fn dims_u16(width: u32, height: u32) -> WavecastResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| WavecastError::render("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| WavecastError::render("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(WavecastError::render("surface must be non-empty"));
    }
    Ok((w, h))
}

pub(crate) fn reset_state(ctx: &mut vello_cpu::RenderContext) {
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
}

pub(crate) fn color(c: Rgb8, alpha: u8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, alpha)
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> WavecastResult<vello_cpu::Pixmap> {
    let (w, h) = dims_u16(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(WavecastError::render("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

/// Image paint for a prepared raster, positioned at the origin of the paint transform.
#[derive(Clone, Debug)]
pub(crate) struct ImagePaint {
    pub(crate) paint: vello_cpu::Image,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl ImagePaint {
    pub(crate) fn new(img: &PreparedImage) -> WavecastResult<Self> {
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        Ok(Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            width: img.width,
            height: img.height,
        })
    }

    /// Draw at integer offset `(x, y)`, with optional group opacity.
    pub(crate) fn draw(&self, ctx: &mut vello_cpu::RenderContext, x: f64, y: f64, opacity: f32) {
        self.draw_scaled(ctx, x, y, 1.0, opacity);
    }

    /// Like [`Self::draw`], scaled by `scale` about the centre of the unscaled placement.
    pub(crate) fn draw_scaled(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        x: f64,
        y: f64,
        scale: f64,
        opacity: f32,
    ) {
        if opacity <= 0.0 || scale <= 0.0 {
            return;
        }
        let layered = opacity < 1.0;
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        ctx.set_transform(placement(x, y, w, h, scale));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(self.paint.clone());
        if layered {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        if layered {
            ctx.pop_layer();
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}

/// Translate to `(x, y)`, then scale a `w` x `h` box about its centre.
pub(crate) fn placement(x: f64, y: f64, w: f64, h: f64, scale: f64) -> vello_cpu::kurbo::Affine {
    use vello_cpu::kurbo::Affine;
    if scale == 1.0 {
        return Affine::translate((x, y));
    }
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    Affine::translate((cx, cy)) * Affine::scale(scale) * Affine::translate((-w / 2.0, -h / 2.0))
}

pub(crate) fn circle_path(cx: f64, cy: f64, r: f64) -> vello_cpu::kurbo::BezPath {
    use vello_cpu::kurbo::Shape;
    let e = vello_cpu::kurbo::Circle::new((cx, cy), r);
    let mut p = vello_cpu::kurbo::BezPath::new();
    for el in e.path_elements(0.1) {
        p.push(el);
    }
    p
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
