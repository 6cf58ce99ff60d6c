//! Episode and batch orchestration: audio in, frames into a sink, typed per-item outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::assets::{EpisodeVisuals, FontResolver, ImageInput};
use crate::config::VideoConfig;
use crate::encode::{AudioInput, FrameSink, SinkConfig};
use crate::foundation::error::{Degradation, Outcome, WavecastError, WavecastResult};
use crate::media::{ANALYSIS_SAMPLE_RATE, AudioTrack, write_f32le};
use crate::sequence::{EpisodeContext, FrameSequenceGenerator};
use crate::waveform::WaveformCache;

/// Where an episode's speech comes from.
#[derive(Clone, Debug)]
pub enum AudioSource {
    /// Audio file, decoded through `ffmpeg` and muxed as-is.
    File(PathBuf),
    /// Samples decoded by the caller.
    Decoded(AudioTrack),
}

/// Where an image comes from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Image file (raster or SVG).
    File(PathBuf),
    /// Bytes or pixels supplied by the caller.
    Input(ImageInput),
}

impl ImageSource {
    /// Read the image without decoding it.
    pub fn load(&self) -> WavecastResult<ImageInput> {
        match self {
            Self::File(path) => std::fs::read(path)
                .map(|bytes| ImageInput::Encoded(Arc::from(bytes)))
                .map_err(|e| {
                    WavecastError::asset_load(format!("cannot read '{}': {e}", path.display()))
                }),
            Self::Input(input) => Ok(input.clone()),
        }
    }
}

/// One audio-to-video work item.
#[derive(Clone, Debug)]
pub struct EpisodeJob {
    /// Label used in logs and reports.
    pub name: String,
    /// Speech track.
    pub audio: AudioSource,
    /// Episode title.
    pub title: String,
    /// Podcast logo.
    pub logo: Option<ImageSource>,
    /// Episode-specific thematic image.
    pub thematic: Option<ImageSource>,
    /// Output video path.
    pub output: PathBuf,
}

impl EpisodeJob {
    /// Job for an audio file with a title and output name derived from the file stem.
    pub fn for_audio_file(audio: &Path, output_dir: &Path) -> Self {
        let stem = audio
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "episode".to_string());
        Self {
            title: suggested_title(&stem),
            output: output_dir.join(format!("{}.mp4", sanitize_file_stem(&stem))),
            name: stem,
            audio: AudioSource::File(audio.to_path_buf()),
            logo: None,
            thematic: None,
        }
    }

    /// Title, podcast name and images of the job.
    ///
    /// An image that cannot be read is omitted and reported as a degradation.
    pub fn visuals(&self, config: &VideoConfig) -> Outcome<EpisodeVisuals> {
        let mut degradations = Vec::new();
        let visuals = EpisodeVisuals {
            title: self.title.clone(),
            podcast_name: config.podcast_name.clone(),
            logo: load_visual(
                self.logo.as_ref(),
                |reason| Degradation::LogoOmitted { reason },
                &mut degradations,
            ),
            thematic: load_visual(
                self.thematic.as_ref(),
                |reason| Degradation::ThematicImageOmitted { reason },
                &mut degradations,
            ),
        };
        Outcome::degraded(visuals, degradations)
    }
}

/// Title proposed for a file stem: a leading `"episode: "` is dropped and the first `_` becomes
/// `": "`.
///
/// `"EP12_Working memory"` becomes `"EP12: Working memory"`.
pub fn suggested_title(stem: &str) -> String {
    let stem = match stem.get(..9) {
        Some(head) if head.eq_ignore_ascii_case("episode: ") => &stem[9..],
        _ => stem,
    };
    match stem.split_once('_') {
        Some((a, b)) => format!("{}: {}", a.trim(), b.trim()),
        None => stem.to_string(),
    }
}

/// File stem with characters that are invalid on common filesystems replaced.
pub fn sanitize_file_stem(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        match c {
            ':' => out.push_str(" -"),
            '<' | '>' | '?' | '*' => {}
            '"' => out.push('\''),
            '|' | '\\' | '/' => out.push('-'),
            c => out.push(c),
        }
    }
    out
}

/// How one batch item ended.
#[derive(Debug)]
pub enum EpisodeStatus {
    /// Rendered with every element.
    Completed,
    /// Rendered, but something was omitted or recomputed.
    Degraded(Vec<Degradation>),
    /// Not rendered.
    Failed(WavecastError),
}

impl EpisodeStatus {
    /// `true` unless the item failed.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Result of one batch item.
#[derive(Debug)]
pub struct EpisodeReport {
    /// Job label.
    pub name: String,
    /// Output path of the job.
    pub output: PathBuf,
    /// Frames handed to the sink.
    pub frames: u64,
    /// Outcome.
    pub status: EpisodeStatus,
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn load_visual(
    source: Option<&ImageSource>,
    degrade: impl FnOnce(String) -> Degradation,
    degradations: &mut Vec<Degradation>,
) -> Option<ImageInput> {
    match source.map(ImageSource::load)? {
        Ok(input) => Some(input),
        Err(err) => {
            tracing::warn!(%err, "image unreadable, omitting it");
            degradations.push(degrade(err.to_string()));
            None
        }
    }
}

fn cache_for(config: &VideoConfig, track: &AudioTrack) -> Option<WaveformCache> {
    if config.disable_cache {
        return None;
    }
    let source = track.source()?;
    Some(match &config.cache_dir {
        Some(dir) => WaveformCache::in_dir(dir, source),
        None => WaveformCache::beside(source),
    })
}

/// Render one episode into `sink`. Returns the number of frames written.
///
/// Only failures that prevent a video (undecodable audio, invalid configuration, sink errors)
/// are returned as errors; everything else degrades the outcome.
#[tracing::instrument(skip_all, fields(episode = %job.name))]
pub fn render_episode(
    job: &EpisodeJob,
    config: &VideoConfig,
    fonts: &dyn FontResolver,
    sink: &mut dyn FrameSink,
) -> WavecastResult<Outcome<u64>> {
    config.validate()?;
    let mut degradations = Vec::new();

    let track = match &job.audio {
        AudioSource::File(path) => AudioTrack::decode(path, ANALYSIS_SAMPLE_RATE)?,
        AudioSource::Decoded(track) => track.clone(),
    };

    let mut pcm_tmp = TempFileGuard(None);
    let audio = match track.source() {
        Some(path) => AudioInput::File {
            path: path.to_path_buf(),
        },
        None => {
            let path = std::env::temp_dir().join(format!(
                "wavecast_pcm_{}_{}.f32le",
                std::process::id(),
                sanitize_file_stem(&job.name)
            ));
            write_f32le(track.samples(), &path)?;
            pcm_tmp.0 = Some(path.clone());
            AudioInput::F32le {
                path,
                sample_rate: track.sample_rate(),
                channels: 1,
            }
        }
    };

    let visuals = job.visuals(config).absorb_into(&mut degradations);

    let cache = cache_for(config, &track);
    let ctx = EpisodeContext::prepare(&track, &visuals, config, fonts, cache.as_ref())?
        .absorb_into(&mut degradations);
    let ctx = Arc::new(ctx);

    sink.begin(SinkConfig {
        width: config.canvas.width,
        height: config.canvas.height,
        fps: config.fps,
        audio: Some(audio),
    })?;

    let mut frames = 0u64;
    for item in FrameSequenceGenerator::new(ctx, &config.threading, config.ring_capacity)? {
        let (idx, frame) = item?;
        sink.push_frame(idx, &frame)?;
        frames += 1;
    }
    sink.end()?;
    drop(pcm_tmp);

    tracing::info!(frames, degraded = !degradations.is_empty(), "episode rendered");
    Ok(Outcome::degraded(frames, degradations))
}

/// Render every job in order. A failing job is reported and the batch moves on.
#[tracing::instrument(skip_all, fields(jobs = jobs.len()))]
pub fn render_batch<F>(
    jobs: &[EpisodeJob],
    config: &VideoConfig,
    fonts: &dyn FontResolver,
    mut make_sink: F,
) -> Vec<EpisodeReport>
where
    F: FnMut(&EpisodeJob) -> Box<dyn FrameSink>,
{
    let mut reports = Vec::with_capacity(jobs.len());
    for (i, job) in jobs.iter().enumerate() {
        tracing::info!(item = i + 1, total = jobs.len(), episode = %job.name, "processing");
        let mut sink = make_sink(job);
        let (frames, status) = match render_episode(job, config, fonts, sink.as_mut()) {
            Ok(out) if out.is_degraded() => (out.value, EpisodeStatus::Degraded(out.degradations)),
            Ok(out) => (out.value, EpisodeStatus::Completed),
            Err(err) => {
                tracing::error!(episode = %job.name, %err, "episode failed");
                (0, EpisodeStatus::Failed(err))
            }
        };
        reports.push(EpisodeReport {
            name: job.name.clone(),
            output: job.output.clone(),
            frames,
            status,
        });
    }

    let failed = reports.iter().filter(|r| !r.status.is_success()).count();
    tracing::info!(succeeded = reports.len() - failed, failed, "batch finished");
    reports
}

/// Episode titles keyed by audio file stem, as stored in a titles JSON file.
pub fn load_titles(path: &Path) -> WavecastResult<std::collections::BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read titles '{}'", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|e| WavecastError::serde(format!("invalid titles JSON: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/episode.rs"]
mod tests;
