use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{AudioInput, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{WavecastError, WavecastResult};
use crate::render::frame::Frame;

/// Codec settings of the `ffmpeg` subprocess.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Video codec.
    pub video_codec: String,
    /// Encoder preset.
    pub preset: String,
    /// Constant rate factor.
    pub crf: u8,
    /// Output pixel format.
    pub pix_fmt: String,
    /// Audio codec.
    pub audio_codec: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            pix_fmt: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output file path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// Codec settings.
    pub encoder: EncoderSettings,
}

impl FfmpegSinkOpts {
    /// Options for writing to `out_path` with default codecs.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            encoder: EncoderSettings::default(),
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams RGB24 frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a sink; `ffmpeg` is spawned in `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            cfg: None,
            last_idx: None,
        }
    }

    /// Output path.
    pub fn out_path(&self) -> &Path {
        &self.opts.out_path
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Full `ffmpeg` argument list for `cfg` (without the program name).
pub(crate) fn ffmpeg_args(opts: &FfmpegSinkOpts, cfg: &SinkConfig) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    args.push(if opts.overwrite { "-y" } else { "-n" }.to_string());
    args.extend(
        [
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
        ]
        .map(String::from),
    );
    args.push(format!("{}x{}", cfg.width, cfg.height));
    args.extend(input_fps_args(cfg.fps));
    args.extend(["-i", "pipe:0"].map(String::from));

    let enc = &opts.encoder;
    let video = [
        "-c:v".to_string(),
        enc.video_codec.clone(),
        "-preset".to_string(),
        enc.preset.clone(),
        "-crf".to_string(),
        enc.crf.to_string(),
        "-pix_fmt".to_string(),
        enc.pix_fmt.clone(),
    ];
    match cfg.audio.as_ref() {
        Some(AudioInput::F32le {
            path,
            sample_rate,
            channels,
        }) => {
            args.extend(["-f", "f32le", "-ar"].map(String::from));
            args.push(sample_rate.to_string());
            args.push("-ac".to_string());
            args.push(channels.to_string());
            args.push("-i".to_string());
            args.push(path.display().to_string());
        }
        Some(AudioInput::File { path }) => {
            args.push("-i".to_string());
            args.push(path.display().to_string());
        }
        None => {}
    }
    args.extend(video);
    if cfg.audio.is_some() {
        args.extend(["-c:a".to_string(), enc.audio_codec.clone(), "-shortest".to_string()]);
    } else {
        args.push("-an".to_string());
    }
    args.extend(["-movflags", "+faststart"].map(String::from));
    args.push(opts.out_path.display().to_string());
    args
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> WavecastResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(WavecastError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(WavecastError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(WavecastError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }
        if let Some(audio) = cfg.audio.as_ref() {
            audio.validate()?;
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(WavecastError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(WavecastError::encode(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        let args = ffmpeg_args(&self.opts, &cfg);
        tracing::debug!(?args, "spawning ffmpeg");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                WavecastError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| WavecastError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| WavecastError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> WavecastResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| WavecastError::encode("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(WavecastError::encode(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(WavecastError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(WavecastError::encode("ffmpeg sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(frame.as_bytes()).map_err(|e| {
            WavecastError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> WavecastResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| WavecastError::encode("ffmpeg sink not started"))?;

        let status = child.wait().map_err(|e| {
            WavecastError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| WavecastError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| WavecastError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(WavecastError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        tracing::info!(out = %self.opts.out_path.display(), "video written");
        self.cfg = None;
        Ok(())
    }
}

fn input_fps_args(fps: Fps) -> [String; 2] {
    ["-r".to_string(), format!("{}/{}", fps.num, fps.den)]
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> WavecastResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
