use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{WavecastError, WavecastResult};

/// Raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Wrap premultiplied bytes, checking their length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> WavecastResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| WavecastError::render("image buffer size overflow"))?;
        if rgba8_premul.len() != expected {
            return Err(WavecastError::render(format!(
                "image buffer has {} bytes, expected {expected} for {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Premultiply a straight-alpha RGBA image.
    pub fn from_straight(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut rgba8_premul = img.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        }
    }

    /// Fully transparent image.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba8_premul: Arc::new(vec![0u8; (width as usize) * (height as usize) * 4]),
        }
    }

    /// Premultiplied pixel at `(x, y)`; transparent outside the image.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 4] {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return [0, 0, 0, 0];
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let p = &self.rgba8_premul[idx..idx + 4];
        [p[0], p[1], p[2], p[3]]
    }
}

/// A visual asset handed over by the caller.
#[derive(Clone, Debug)]
pub enum ImageInput {
    /// Encoded bytes (PNG, JPEG, WebP, ... or SVG).
    Encoded(Arc<[u8]>),
    /// Already decoded straight-alpha pixels.
    Decoded(Arc<image::RgbaImage>),
}

impl ImageInput {
    /// Decode to premultiplied RGBA8. SVG sources are rasterized so that their longer side is
    /// `svg_long_side_px`.
    pub fn prepare(&self, svg_long_side_px: u32) -> WavecastResult<PreparedImage> {
        match self {
            Self::Encoded(bytes) if looks_like_svg(bytes) => {
                rasterize_svg(bytes, svg_long_side_px)
            }
            Self::Encoded(bytes) => decode_image(bytes),
            Self::Decoded(img) => Ok(PreparedImage::from_straight(img.as_ref().clone())),
        }
    }
}

/// Decode raster bytes through `image`.
pub fn decode_image(bytes: &[u8]) -> WavecastResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(PreparedImage::from_straight(dyn_img.to_rgba8()))
}

/// Parse and rasterize an SVG document.
pub fn rasterize_svg(bytes: &[u8], long_side_px: u32) -> WavecastResult<PreparedImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let size = tree.size();
    let (sw, sh) = (size.width(), size.height());
    if !sw.is_finite() || !sh.is_finite() || sw <= 0.0 || sh <= 0.0 {
        return Err(WavecastError::asset_load("svg has invalid width/height"));
    }
    let scale = long_side_px.max(1) as f32 / sw.max(sh);
    let width = ((sw * scale).round() as u32).max(1);
    let height = ((sh * scale).round() as u32).max(1);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| WavecastError::asset_load("failed to allocate svg pixmap"))?;
    let xform = resvg::tiny_skia::Transform::from_scale(
        width as f32 / sw,
        height as f32 / sh,
    );
    resvg::render(&tree, xform, &mut pixmap.as_mut());
    // tiny-skia pixmaps are premultiplied already.
    PreparedImage::from_premul(width, height, pixmap.data().to_vec())
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let t = text.trim_start_matches('\u{feff}').trim_start();
    t.starts_with("<svg") || (t.starts_with("<?xml") && text.contains("<svg"))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
