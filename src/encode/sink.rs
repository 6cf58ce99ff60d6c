use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{WavecastError, WavecastResult};
use crate::render::frame::Frame;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Audio track to pair with the frames.
    pub audio: Option<AudioInput>,
}

/// Audio that accompanies the frame stream.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioInput {
    /// Raw interleaved `f32le` PCM.
    F32le {
        /// PCM file.
        path: PathBuf,
        /// Sample rate in Hz.
        sample_rate: u32,
        /// Channel count.
        channels: u16,
    },
    /// Any container/codec the encoder can probe on its own.
    File {
        /// Audio file.
        path: PathBuf,
    },
}

impl AudioInput {
    /// Reject zero sample rates or channel counts.
    pub fn validate(&self) -> WavecastResult<()> {
        if let Self::F32le {
            sample_rate,
            channels,
            ..
        } = self
        {
            if *sample_rate == 0 {
                return Err(WavecastError::validation(
                    "audio sample_rate must be non-zero",
                ));
            }
            if *channels == 0 {
                return Err(WavecastError::validation("audio channels must be non-zero"));
            }
        }
        Ok(())
    }
}

/// Consumer of rendered frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> WavecastResult<()>;
    /// Push one frame in strictly increasing order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> WavecastResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> WavecastResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    ended: bool,
    /// Frames in order of arrival.
    pub(crate) frames: Vec<(FrameIndex, Frame)>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Captured frames.
    pub fn frames(&self) -> &[(FrameIndex, Frame)] {
        &self.frames
    }

    /// `true` once `end` was called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> WavecastResult<()> {
        self.cfg = Some(cfg);
        self.ended = false;
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> WavecastResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> WavecastResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
