use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::error::{WavecastError, WavecastResult};

/// One output frame: row-major RGB8, no padding.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 3` bytes.
    pub data: Vec<u8>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Frame {
    /// Wrap RGB bytes, checking their length.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> WavecastResult<Self> {
        let expected = (width as usize) * (height as usize) * 3;
        if data.len() != expected {
            return Err(WavecastError::render(format!(
                "frame has {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame filled with one colour.
    pub fn solid(canvas: Canvas, color: Rgb8) -> Self {
        let mut data = Vec::with_capacity(canvas.pixel_count() * 3);
        for _ in 0..canvas.pixel_count() {
            data.extend_from_slice(&[color.r, color.g, color.b]);
        }
        Self {
            width: canvas.width,
            height: canvas.height,
            data,
        }
    }

    /// Canvas this frame covers.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// RGB at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Multiply every channel by `alpha` in `[0, 1]`, truncating.
    pub fn apply_fade(&mut self, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        if alpha >= 1.0 {
            return;
        }
        for v in &mut self.data {
            *v = (f64::from(*v) * alpha) as u8;
        }
    }
}

/// Premultiplied RGBA8 working buffer of a render step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FrameRgba {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
}

impl FrameRgba {
    pub(crate) fn new(width: u32, height: u32, data: Vec<u8>) -> WavecastResult<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(WavecastError::render("rgba frame byte len mismatch"));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Drop alpha, compositing over black.
    pub(crate) fn flatten(&self) -> Frame {
        let mut data = Vec::with_capacity((self.width as usize) * (self.height as usize) * 3);
        for px in self.data.chunks_exact(4) {
            data.extend_from_slice(&px[..3]);
        }
        Frame {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
