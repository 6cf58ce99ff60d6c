//! Full-screen view and the eased zoom/crossfade between it and the composite.

use crate::animation::ease::Ease;
use crate::assets::builder::CompositeAssets;
use crate::foundation::core::Canvas;
use crate::foundation::error::{WavecastError, WavecastResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::frame::Frame;
use crate::schedule::ViewState;

/// Zoom and easing of the view transitions.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransitionParams {
    /// Composite scale at the end of a zoom-in.
    pub zoom_max: f64,
    /// Curve applied to raw progress.
    pub ease: Ease,
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self {
            zoom_max: 1.15,
            ease: Ease::InOutCubic,
        }
    }
}

impl TransitionParams {
    /// `zoom_max` must be finite and at least 1.
    pub fn validate(&self) -> WavecastResult<()> {
        if !self.zoom_max.is_finite() || self.zoom_max < 1.0 {
            return Err(WavecastError::validation(
                "transition zoom_max must be finite and >= 1",
            ));
        }
        Ok(())
    }
}

/// Produces the full-screen view and transition frames.
#[derive(Clone, Debug)]
pub struct TransitionBlender {
    canvas: Canvas,
    fullscreen: Frame,
    params: TransitionParams,
}

impl TransitionBlender {
    /// Blender for one episode. Without a thematic image the full-screen view is solid background.
    pub fn new(assets: &CompositeAssets, params: TransitionParams) -> WavecastResult<Self> {
        params.validate()?;
        let canvas = assets.canvas;
        let fullscreen = match &assets.fullscreen {
            Some(img) => {
                if img.width != canvas.width || img.height != canvas.height {
                    return Err(WavecastError::render(
                        "full-screen image does not match the canvas",
                    ));
                }
                let mut data = Vec::with_capacity(canvas.pixel_count() * 3);
                for px in img.rgba8_premul.chunks_exact(4) {
                    data.extend_from_slice(&px[..3]);
                }
                Frame::new(canvas.width, canvas.height, data)?
            }
            None => Frame::solid(canvas, assets.palette.background),
        };
        Ok(Self {
            canvas,
            fullscreen,
            params,
        })
    }

    /// The full-screen view.
    pub fn fullscreen(&self) -> Frame {
        self.fullscreen.clone()
    }

    /// Eased weight of the full-screen image for a transition state; `None` for steady states.
    pub fn eased_weight(&self, state: ViewState) -> Option<f64> {
        match state {
            ViewState::ZoomIn { progress } => Some(self.params.ease.apply(progress)),
            ViewState::ZoomOut { progress } => Some(self.params.ease.apply(1.0 - progress)),
            ViewState::Composite | ViewState::Fullscreen => None,
        }
    }

    /// Blend `composite` towards the full-screen image for a transition `state`.
    ///
    /// The composite is scaled about the canvas centre by `1 + (zoom_max - 1) * w` and
    /// crossfaded with weight `w`, the eased progress.
    pub fn blend(&self, composite: &Frame, state: ViewState) -> WavecastResult<Frame> {
        if composite.canvas() != self.canvas {
            return Err(WavecastError::render(
                "composite frame does not match the canvas",
            ));
        }
        let Some(w) = self.eased_weight(state) else {
            return Err(WavecastError::render(format!(
                "blend called for steady state {state:?}"
            )));
        };
        let zoom = 1.0 + (self.params.zoom_max - 1.0) * w;
        let mut zoomed = zoom_about_centre(composite, zoom);
        crossfade_in_place(&mut zoomed.data, &self.fullscreen.data, w as f32);
        Ok(zoomed)
    }
}

/// Scale `src` by `factor` about its centre with bilinear sampling, cropped to the same size.
pub(crate) fn zoom_about_centre(src: &Frame, factor: f64) -> Frame {
    if (factor - 1.0).abs() < 1e-9 {
        return src.clone();
    }
    let (w, h) = (src.width as usize, src.height as usize);
    let cx = src.width as f64 / 2.0;
    let cy = src.height as f64 / 2.0;
    let inv = 1.0 / factor;
    let mut data = vec![0u8; w * h * 3];
    for y in 0..h {
        let sy = ((y as f64 + 0.5 - cy) * inv + cy - 0.5).clamp(0.0, (h - 1) as f64);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(h - 1);
        let fy = sy - y0 as f64;
        for x in 0..w {
            let sx = ((x as f64 + 0.5 - cx) * inv + cx - 0.5).clamp(0.0, (w - 1) as f64);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(w - 1);
            let fx = sx - x0 as f64;
            let out = (y * w + x) * 3;
            for c in 0..3 {
                let p = |xx: usize, yy: usize| f64::from(src.data[(yy * w + xx) * 3 + c]);
                let top = p(x0, y0) * (1.0 - fx) + p(x1, y0) * fx;
                let bottom = p(x0, y1) * (1.0 - fx) + p(x1, y1) * fx;
                data[out + c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Frame {
        width: src.width,
        height: src.height,
        data,
    }
}

/// `dst = dst * (1 - t) + b * t` per channel, with `t` quantized to 1/255.
pub(crate) fn crossfade_in_place(dst: &mut [u8], b: &[u8], t: f32) {
    let t = t.clamp(0.0, 1.0);
    let tt = ((t * 255.0).round() as i32).clamp(0, 255) as u16;
    let it = 255u16 - tt;
    for (d, &bv) in dst.iter_mut().zip(b) {
        let av = mul_div255_u8(u16::from(*d), it);
        let bv = mul_div255_u8(u16::from(bv), tt);
        *d = av.saturating_add(bv);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/transition.rs"]
mod tests;
