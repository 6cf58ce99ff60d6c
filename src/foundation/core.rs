use crate::foundation::error::{WavecastError, WavecastResult};

pub use kurbo::{Point, Rect, Vec2};

/// Zero-based output frame number.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Rational frame rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be > 0.
    pub den: u32,
}

impl Fps {
    /// Build a frame rate, rejecting zero numerator or denominator.
    pub fn new(num: u32, den: u32) -> WavecastResult<Self> {
        if den == 0 {
            return Err(WavecastError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(WavecastError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Seconds covered by one frame.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Time position (seconds) of the start of frame `idx`.
    pub fn frame_to_secs(self, idx: FrameIndex) -> f64 {
        (idx.0 as f64) * self.frame_duration_secs()
    }

    /// Whole frames that fit in `secs`, rounded down.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

/// Output canvas size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Reference height every pixel-valued layout parameter is expressed at.
    pub const REFERENCE_HEIGHT: f64 = 1080.0;

    /// Scale factor from 1080p reference pixels to this canvas.
    pub fn scale(self) -> f64 {
        f64::from(self.height) / Self::REFERENCE_HEIGHT
    }

    /// Scale a 1080p reference length to this canvas.
    pub fn px(self, reference_px: f64) -> f64 {
        reference_px * self.scale()
    }

    /// Canvas bounds as a rectangle at the origin.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Number of pixels.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Opaque 8-bit sRGB colour.
///
/// Serde forms live in `assets::color` (`"#rrggbb"` or `[r, g, b]`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Build a colour from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel by `k`, saturating at 255.
    pub fn scaled(self, k: f32) -> Self {
        let f = |c: u8| -> u8 { (f32::from(c) * k).clamp(0.0, 255.0) as u8 };
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    /// Add `v` to every channel, saturating at 255.
    pub fn lifted(self, v: u8) -> Self {
        Self::new(
            self.r.saturating_add(v),
            self.g.saturating_add(v),
            self.b.saturating_add(v),
        )
    }

    /// Premultiplied RGBA8 with alpha `a`.
    pub fn premul_rgba(self, a: u8) -> [u8; 4] {
        let a16 = u16::from(a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), a]
    }

    /// Linear interpolation towards `other`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let f = |a: u8, b: u8| -> u8 {
            let af = f32::from(a);
            let bf = f32::from(b);
            (af + (bf - af) * t).round().clamp(0.0, 255.0) as u8
        };
        Self::new(f(self.r, other.r), f(self.g, other.g), f(self.b, other.b))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
