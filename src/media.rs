//! Decoded audio input and the `ffmpeg` decode adapter.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{WavecastError, WavecastResult};

/// Sample rate used for waveform analysis when decoding from a file.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

/// Mono audio samples plus an optional source path used as cache identity.
#[derive(Clone, Debug)]
pub struct AudioTrack {
    source: Option<PathBuf>,
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl AudioTrack {
    /// Wrap decoded samples without a cache identity.
    pub fn from_samples(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> WavecastResult<Self> {
        if sample_rate == 0 {
            return Err(WavecastError::validation("audio sample_rate must be > 0"));
        }
        Ok(Self {
            source: None,
            samples: samples.into(),
            sample_rate,
        })
    }

    /// Attach the path the samples were decoded from.
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Decode `path` to mono `f32` at `sample_rate` through the system `ffmpeg`.
    #[tracing::instrument(skip_all, fields(path = %path.display(), sample_rate))]
    pub fn decode(path: &Path, sample_rate: u32) -> WavecastResult<Self> {
        let samples = decode_audio_mono_f32(path, sample_rate)?;
        tracing::debug!(samples = samples.len(), "decoded audio");
        Ok(Self::from_samples(samples, sample_rate)?.with_source(path))
    }

    /// Source path, when known.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Mono samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Samples per second.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Run `ffmpeg` and collect mono `f32le` PCM from stdout.
pub fn decode_audio_mono_f32(path: &Path, sample_rate: u32) -> WavecastResult<Vec<f32>> {
    if sample_rate == 0 {
        return Err(WavecastError::validation("decode sample_rate must be > 0"));
    }
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "1",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .context("failed to run ffmpeg for audio decode")?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        return Err(anyhow::anyhow!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )
        .into());
    }

    pcm_f32le_to_samples(&out.stdout)
}

pub(crate) fn pcm_f32le_to_samples(bytes: &[u8]) -> WavecastResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(WavecastError::validation(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Write mono samples as raw `f32le`, the format [`crate::AudioInput::F32le`] points at.
pub fn write_f32le(samples: &[f32], path: &Path) -> WavecastResult<()> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    std::fs::write(path, bytes)
        .with_context(|| format!("write pcm to '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../tests/unit/media.rs"]
mod tests;
