//! Frame sinks: where rendered frames go.

pub(crate) mod ffmpeg;
pub(crate) mod sink;

pub use ffmpeg::{EncoderSettings, FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use sink::{AudioInput, FrameSink, InMemorySink, SinkConfig};
