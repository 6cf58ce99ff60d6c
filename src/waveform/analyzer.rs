use rayon::prelude::*;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{WavecastError, WavecastResult};
use crate::foundation::math::{DetRng, Fnv1a64, seed_for_time};

/// Tunables of the amplitude analysis.
///
/// The shape of the algorithm (RMS and mean blend, jitter, rare spikes, temporal smoothing) is
/// fixed; the numbers are not.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalyzerParams {
    /// Length of the audio window shown by one frame.
    pub window_secs: f64,
    /// Constant term of the RMS multiplier (`a`).
    pub rms_base: f64,
    /// RMS gain of the multiplier (`b`).
    pub rms_gain: f64,
    /// Standard deviation of the jitter term, scaled by bucket RMS.
    pub jitter_std: f64,
    /// Chance that a bucket is amplified into a spike.
    pub spike_probability: f64,
    /// Spike multiplier.
    pub spike_gain: f64,
    /// Salt mixed into the per-frame seed.
    pub seed_salt: u64,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            window_secs: 3.0,
            rms_base: 0.7,
            rms_gain: 1.2,
            jitter_std: 0.035,
            spike_probability: 0.02,
            spike_gain: 1.8,
            seed_salt: 0x5741_5645_4341_5354,
        }
    }
}

impl AnalyzerParams {
    /// Check ranges.
    pub fn validate(&self) -> WavecastResult<()> {
        if !self.window_secs.is_finite() || self.window_secs <= 0.0 {
            return Err(WavecastError::validation(
                "analyzer window_secs must be finite and > 0",
            ));
        }
        for (name, v) in [
            ("rms_base", self.rms_base),
            ("rms_gain", self.rms_gain),
            ("jitter_std", self.jitter_std),
            ("spike_gain", self.spike_gain),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(WavecastError::validation(format!(
                    "analyzer {name} must be finite and >= 0"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.spike_probability) {
            return Err(WavecastError::validation(
                "analyzer spike_probability must be within [0, 1]",
            ));
        }
        Ok(())
    }

    pub(crate) fn digest(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        for v in [
            self.window_secs,
            self.rms_base,
            self.rms_gain,
            self.jitter_std,
            self.spike_probability,
            self.spike_gain,
        ] {
            h.write_u64(v.to_bits());
        }
        h.write_u64(self.seed_salt);
        h.finish()
    }
}

/// One amplitude array per output frame; every array is exactly `width` long.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformFrames {
    width: u32,
    frames: Vec<Vec<f32>>,
}

impl WaveformFrames {
    /// Wrap analyzed frames, checking that every array has length `width`.
    pub fn new(width: u32, frames: Vec<Vec<f32>>) -> WavecastResult<Self> {
        if let Some((i, f)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.len() != width as usize)
        {
            return Err(WavecastError::validation(format!(
                "waveform frame {i} has {} samples, expected {width}",
                f.len()
            )));
        }
        Ok(Self { width, frames })
    }

    /// Array length (canvas width).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when no frame was analyzed.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Amplitudes of frame `idx`, `None` past the end.
    pub fn get(&self, idx: FrameIndex) -> Option<&[f32]> {
        usize::try_from(idx.0)
            .ok()
            .and_then(|i| self.frames.get(i))
            .map(Vec::as_slice)
    }

    /// Borrow every frame.
    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }
}

/// Turns mono samples into smoothed per-frame amplitude arrays.
#[derive(Clone, Debug, Default)]
pub struct WaveformAnalyzer {
    params: AnalyzerParams,
}

impl WaveformAnalyzer {
    /// Create an analyzer with validated parameters.
    pub fn new(params: AnalyzerParams) -> WavecastResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters in use.
    pub fn params(&self) -> &AnalyzerParams {
        &self.params
    }

    /// Analyze the whole track.
    ///
    /// Produces `floor(duration * fps)` arrays of `canvas_width` values. The raw per-frame pass
    /// runs on the rayon pool; smoothing (`k * previous + (1 - k) * current`) is sequential.
    #[tracing::instrument(skip(self, samples), fields(samples = samples.len()))]
    pub fn analyze(
        &self,
        samples: &[f32],
        sample_rate: u32,
        fps: Fps,
        canvas_width: u32,
        smoothing: f32,
    ) -> WavecastResult<WaveformFrames> {
        if sample_rate == 0 {
            return Err(WavecastError::validation("sample_rate must be > 0"));
        }
        if canvas_width == 0 {
            return Err(WavecastError::validation("canvas width must be > 0"));
        }
        if !smoothing.is_finite() || !(0.0..1.0).contains(&smoothing) {
            return Err(WavecastError::validation(
                "smoothing factor must be within [0, 1)",
            ));
        }

        let duration = samples.len() as f64 / f64::from(sample_rate);
        let frame_count = usize::try_from(fps.secs_to_frames_floor(duration))
            .map_err(|_| WavecastError::validation("frame count overflows usize"))?;

        let mut frames: Vec<Vec<f32>> = (0..frame_count)
            .into_par_iter()
            .map(|i| {
                let t = fps.frame_to_secs(FrameIndex(i as u64));
                self.analyze_frame(samples, sample_rate, t, canvas_width)
            })
            .collect();

        let k = smoothing;
        for i in 1..frames.len() {
            let (done, rest) = frames.split_at_mut(i);
            let prev = &done[i - 1];
            for (cur, &p) in rest[0].iter_mut().zip(prev.iter()) {
                *cur = k * p + (1.0 - k) * *cur;
            }
        }

        tracing::debug!(frame_count, canvas_width, "waveform analysis complete");
        WaveformFrames::new(canvas_width, frames)
    }

    /// Raw (unsmoothed) amplitudes for the window starting at `t_secs`.
    pub fn analyze_frame(
        &self,
        samples: &[f32],
        sample_rate: u32,
        t_secs: f64,
        canvas_width: u32,
    ) -> Vec<f32> {
        let width = canvas_width as usize;
        let mut out = vec![0.0f32; width];

        let start = (t_secs * f64::from(sample_rate)).floor().max(0.0) as usize;
        if start >= samples.len() {
            return out;
        }
        let window_len = (self.params.window_secs * f64::from(sample_rate)) as usize;
        let end = start.saturating_add(window_len).min(samples.len());
        let window = &samples[start..end];

        let bucket = (window.len() / width).max(1);
        let mut rng = DetRng::new(seed_for_time(self.params.seed_salt, t_secs));
        for (slot, chunk) in out.iter_mut().zip(window.chunks(bucket)) {
            let n = chunk.len() as f64;
            let (sum, sum_sq) = chunk.iter().fold((0.0f64, 0.0f64), |(s, sq), &v| {
                let v = f64::from(v);
                (s + v, sq + v * v)
            });
            let avg = sum / n;
            let rms = (sum_sq / n).sqrt();

            let mut combined = avg * (self.params.rms_base + self.params.rms_gain * rms);
            combined += rng.normal() * self.params.jitter_std * rms;
            if rng.next_f64() < self.params.spike_probability {
                combined *= self.params.spike_gain;
            }
            *slot = combined as f32;
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/waveform/analyzer.rs"]
mod tests;
