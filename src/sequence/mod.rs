//! Per-episode render context and the ordered frame stream built on it.

pub(crate) mod context;
pub(crate) mod generator;

pub use context::EpisodeContext;
pub use generator::{FrameSequenceGenerator, RenderThreading};
