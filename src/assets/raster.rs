//! Pixel operations used while preparing per-episode assets.
//!
//! Everything here works on premultiplied RGBA8.

use image::imageops::FilterType;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::error::{WavecastError, WavecastResult};
use crate::foundation::math::mul_div255_u8;

/// Largest size with the source aspect ratio that fits in `max_w x max_h`.
pub(crate) fn fit_size(
    src_w: u32,
    src_h: u32,
    max_w: f64,
    max_h: f64,
    allow_upscale: bool,
) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (0, 0);
    }
    let mut scale = (max_w / f64::from(src_w)).min(max_h / f64::from(src_h));
    if !allow_upscale {
        scale = scale.min(1.0);
    }
    let scale = scale.max(0.0);
    (
        ((f64::from(src_w) * scale).round() as u32).max(1),
        ((f64::from(src_h) * scale).round() as u32).max(1),
    )
}

/// Lanczos resample.
pub(crate) fn resize(
    img: &PreparedImage,
    width: u32,
    height: u32,
) -> WavecastResult<PreparedImage> {
    if width == img.width && height == img.height {
        return Ok(img.clone());
    }
    if width == 0 || height == 0 {
        return Err(WavecastError::render("resize target must be non-empty"));
    }
    let buf = image::RgbaImage::from_raw(img.width, img.height, img.rgba8_premul.to_vec())
        .ok_or_else(|| WavecastError::render("image buffer does not match its size"))?;
    let mut out = image::imageops::resize(&buf, width, height, FilterType::Lanczos3).into_raw();
    // Lanczos ringing can push colour above alpha, which is invalid for premultiplied pixels.
    for px in out.chunks_exact_mut(4) {
        let a = px[3];
        px[0] = px[0].min(a);
        px[1] = px[1].min(a);
        px[2] = px[2].min(a);
    }
    PreparedImage::from_premul(width, height, out)
}

/// Keep only the inscribed ellipse, with an anti-aliased edge.
pub(crate) fn circle_mask(img: &PreparedImage) -> PreparedImage {
    let (w, h) = (img.width, img.height);
    let rx = f64::from(w) / 2.0;
    let ry = f64::from(h) / 2.0;
    let edge = rx.min(ry).max(1.0);
    let mut out = img.rgba8_premul.to_vec();
    for y in 0..h {
        for x in 0..w {
            let dx = (f64::from(x) + 0.5 - rx) / rx;
            let dy = (f64::from(y) + 0.5 - ry) / ry;
            let d = (dx * dx + dy * dy).sqrt();
            let coverage = ((1.0 - d) * edge + 0.5).clamp(0.0, 1.0);
            let k = (coverage * 255.0).round() as u16;
            if k == 255 {
                continue;
            }
            let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
            for c in &mut out[idx..idx + 4] {
                *c = mul_div255_u8(u16::from(*c), k);
            }
        }
    }
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: std::sync::Arc::new(out),
    }
}

/// Transparent border of `pad` pixels on every side.
pub(crate) fn pad(img: &PreparedImage, pad: u32) -> WavecastResult<PreparedImage> {
    let w = img.width + 2 * pad;
    let h = img.height + 2 * pad;
    let mut out = vec![0u8; (w as usize) * (h as usize) * 4];
    let src_stride = img.width as usize * 4;
    for y in 0..img.height as usize {
        let dst_start = ((y + pad as usize) * (w as usize) + pad as usize) * 4;
        let src_start = y * src_stride;
        out[dst_start..dst_start + src_stride]
            .copy_from_slice(&img.rgba8_premul[src_start..src_start + src_stride]);
    }
    PreparedImage::from_premul(w, h, out)
}

/// Separable Gaussian blur with standard deviation `sigma` pixels.
pub(crate) fn gaussian_blur(img: &PreparedImage, sigma: f32) -> WavecastResult<PreparedImage> {
    if sigma <= 0.0 {
        return Ok(img.clone());
    }
    let radius = (sigma * 3.0).ceil() as u32;
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let len = img.rgba8_premul.len();
    let mut tmp = vec![0u8; len];
    let mut out = vec![0u8; len];
    horizontal_pass(&img.rgba8_premul, &mut tmp, img.width, img.height, &kernel);
    vertical_pass(&tmp, &mut out, img.width, img.height, &kernel);
    PreparedImage::from_premul(img.width, img.height, out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> WavecastResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(WavecastError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = sigma as f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(WavecastError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

/// Source-over for one premultiplied pixel.
pub(crate) fn over_px(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = u16::from(src[3]);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - sa;
    let mut out = [0u8; 4];
    out[3] = src[3].saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for c in 0..3 {
        out[c] = src[c].saturating_add(mul_div255_u8(u16::from(dst[c]), inv));
    }
    out
}

/// Composite `src` over `dst` (a `dst_w x dst_h` buffer) with its top-left at `(x, y)`.
pub(crate) fn blit_over(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    src: &PreparedImage,
    x: i64,
    y: i64,
) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src.width)).min(i64::from(dst_w));
    let y1 = (y + i64::from(src.height)).min(i64::from(dst_h));
    for dy in y0..y1 {
        for dx in x0..x1 {
            let s = src.pixel(dx - x, dy - y);
            if s[3] == 0 {
                continue;
            }
            let idx = ((dy as usize) * (dst_w as usize) + (dx as usize)) * 4;
            let d = [dst[idx], dst[idx + 1], dst[idx + 2], dst[idx + 3]];
            dst[idx..idx + 4].copy_from_slice(&over_px(d, s));
        }
    }
}

/// Frame `img` with a `border`-pixel vertical gradient from `top` to `bottom`.
pub(crate) fn gradient_frame(
    img: &PreparedImage,
    border: u32,
    top: Rgb8,
    bottom: Rgb8,
) -> WavecastResult<PreparedImage> {
    let w = img.width + 2 * border;
    let h = img.height + 2 * border;
    let mut out = Vec::with_capacity((w as usize) * (h as usize) * 4);
    for y in 0..h {
        let t = if h > 1 { y as f32 / (h - 1) as f32 } else { 0.0 };
        let c = top.lerp(bottom, t).premul_rgba(255);
        for _ in 0..w {
            out.extend_from_slice(&c);
        }
    }
    blit_over(&mut out, w, h, img, i64::from(border), i64::from(border));
    PreparedImage::from_premul(w, h, out)
}

/// Aspect-preserving fit onto a full canvas filled with `background`.
pub(crate) fn letterbox(
    img: &PreparedImage,
    canvas: Canvas,
    background: Rgb8,
) -> WavecastResult<PreparedImage> {
    let (fw, fh) = fit_size(
        img.width,
        img.height,
        f64::from(canvas.width),
        f64::from(canvas.height),
        true,
    );
    let scaled = resize(img, fw, fh)?;
    let bg = background.premul_rgba(255);
    let mut out = Vec::with_capacity(canvas.pixel_count() * 4);
    for _ in 0..canvas.pixel_count() {
        out.extend_from_slice(&bg);
    }
    let x = (i64::from(canvas.width) - i64::from(fw)) / 2;
    let y = (i64::from(canvas.height) - i64::from(fh)) / 2;
    blit_over(&mut out, canvas.width, canvas.height, &scaled, x, y);
    PreparedImage::from_premul(canvas.width, canvas.height, out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/raster.rs"]
mod tests;
