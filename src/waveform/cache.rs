use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use xxhash_rust::xxh3::xxh3_128;

use crate::foundation::core::Fps;
use crate::foundation::error::{Degradation, Outcome, WavecastError, WavecastResult};
use crate::foundation::math::Fnv1a64;
use crate::media::AudioTrack;
use crate::waveform::analyzer::{WaveformAnalyzer, WaveformFrames};

/// Record layout tag. Bump when [`WaveformCacheRecord`] changes shape.
pub const CACHE_FORMAT_VERSION: &str = "wavecast-waveform/1";

const CACHE_DIR_NAME: &str = ".waveform_cache";

/// Temporary records older than this are leftovers of an interrupted write.
const STALE_TMP_AGE: std::time::Duration = std::time::Duration::from_secs(60);

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identity of an audio source for cache validity.
///
/// Built from file name, byte size and modification time only; this is not a content hash, so a
/// byte-identical copy with a different mtime is a different source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AudioFingerprint(String);

impl AudioFingerprint {
    /// Fingerprint from already-known metadata.
    pub fn from_parts(name: &str, size_bytes: u64, mtime_nanos: u128) -> Self {
        let key = format!("{name}\u{0}{size_bytes}\u{0}{mtime_nanos}");
        Self(format!("{:032x}", xxh3_128(key.as_bytes())))
    }

    /// Fingerprint a file on disk.
    pub fn from_path(path: &Path) -> WavecastResult<Self> {
        let meta = fs::metadata(path)
            .with_context(|| format!("stat audio source '{}'", path.display()))?;
        let mtime_nanos = meta
            .modified()
            .ok()
            .and_then(|m| m.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_parts(&name, meta.len(), mtime_nanos))
    }

    /// Lowercase hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AudioFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output geometry the analysis is computed for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalysisRequest {
    /// Output frame rate.
    pub fps: Fps,
    /// Canvas width, which is also the amplitude array length.
    pub canvas_width: u32,
    /// Temporal smoothing factor `k`.
    pub smoothing: f32,
}

impl AnalysisRequest {
    /// Frame count the request yields for `track`.
    pub fn expected_frames(&self, track: &AudioTrack) -> usize {
        self.fps.secs_to_frames_floor(track.duration_secs()) as usize
    }
}

/// Everything a stored record must match to be reused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheKey {
    /// Source identity.
    pub fingerprint: AudioFingerprint,
    /// Format version plus a digest of the analysis settings.
    pub version: String,
    /// Expected number of frames.
    pub frame_count: usize,
    /// Expected array width.
    pub width: u32,
}

impl CacheKey {
    /// Key for analysing `track` (whose bytes live at `source`) with `analyzer`.
    pub fn new(
        source: &Path,
        track: &AudioTrack,
        analyzer: &WaveformAnalyzer,
        request: &AnalysisRequest,
    ) -> WavecastResult<Self> {
        let mut h = Fnv1a64::new(analyzer.params().digest());
        h.write_u64(u64::from(request.fps.num));
        h.write_u64(u64::from(request.fps.den));
        h.write_u64(u64::from(request.smoothing.to_bits()));
        h.write_u64(u64::from(track.sample_rate()));
        Ok(Self {
            fingerprint: AudioFingerprint::from_path(source)?,
            version: format!("{CACHE_FORMAT_VERSION}+{:016x}", h.finish()),
            frame_count: request.expected_frames(track),
            width: request.canvas_width,
        })
    }
}

/// Persisted analysis result.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WaveformCacheRecord {
    /// [`AudioFingerprint`] in hex.
    pub fingerprint: String,
    /// Version tag the record was written with.
    pub version: String,
    /// One amplitude array per frame.
    pub frames: Vec<Vec<f32>>,
}

// Serializes exactly like `WaveformCacheRecord` without cloning the frames.
#[derive(serde::Serialize)]
struct WaveformCacheRecordRef<'a> {
    fingerprint: &'a str,
    version: &'a str,
    frames: &'a [Vec<f32>],
}

/// Why a stored record could not be used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheMiss {
    /// Nothing stored yet.
    NotFound,
    /// The file exists but could not be read.
    Unreadable(String),
    /// The file could not be deserialized.
    Corrupt(String),
    /// Written by a different format or analysis setting.
    VersionMismatch {
        /// Tag in the file.
        found: String,
        /// Tag requested.
        expected: String,
    },
    /// The source changed since the record was written.
    FingerprintMismatch,
    /// Frame count or width differ from the request.
    ShapeMismatch {
        /// `(frames, width)` in the record.
        found: (usize, usize),
        /// `(frames, width)` requested.
        expected: (usize, usize),
    },
}

impl CacheMiss {
    /// `true` when the stored file is damaged rather than merely stale.
    pub fn is_damage(&self) -> bool {
        matches!(self, Self::Unreadable(_) | Self::Corrupt(_))
    }
}

impl std::fmt::Display for CacheMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("no cached analysis"),
            Self::Unreadable(e) => write!(f, "cache file unreadable: {e}"),
            Self::Corrupt(e) => write!(f, "cache file corrupt: {e}"),
            Self::VersionMismatch { found, expected } => {
                write!(f, "cache version '{found}' does not match '{expected}'")
            }
            Self::FingerprintMismatch => f.write_str("audio source changed"),
            Self::ShapeMismatch { found, expected } => write!(
                f,
                "cached shape {}x{} does not match {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
        }
    }
}

/// Result of [`WaveformCache::load`].
#[derive(Debug)]
pub enum CacheLookup {
    /// A valid record.
    Hit(WaveformFrames),
    /// No usable record.
    Miss(CacheMiss),
}

/// One cache file for one audio source.
#[derive(Clone, Debug)]
pub struct WaveformCache {
    path: PathBuf,
}

impl WaveformCache {
    /// Cache file at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<audio dir>/.waveform_cache/<stem>_waveform.bin`.
    pub fn beside(audio_path: &Path) -> Self {
        let dir = audio_path
            .parent()
            .map(|p| p.join(CACHE_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(CACHE_DIR_NAME));
        Self::in_dir(&dir, audio_path)
    }

    /// `<dir>/<stem>_waveform.bin`.
    pub fn in_dir(dir: &Path, audio_path: &Path) -> Self {
        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        Self::at(dir.join(format!("{stem}_waveform.bin")))
    }

    /// Location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the stored record against `key`.
    pub fn load(&self, key: &CacheKey) -> CacheLookup {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return CacheLookup::Miss(CacheMiss::NotFound);
            }
            Err(e) => return CacheLookup::Miss(CacheMiss::Unreadable(e.to_string())),
        };
        let record: WaveformCacheRecord = match bincode::deserialize(&bytes) {
            Ok(r) => r,
            Err(e) => return CacheLookup::Miss(CacheMiss::Corrupt(e.to_string())),
        };

        if record.version != key.version {
            return CacheLookup::Miss(CacheMiss::VersionMismatch {
                found: record.version,
                expected: key.version.clone(),
            });
        }
        if record.fingerprint != key.fingerprint.as_str() {
            return CacheLookup::Miss(CacheMiss::FingerprintMismatch);
        }
        let width = key.width as usize;
        let found_width = record.frames.first().map_or(width, Vec::len);
        if record.frames.len() != key.frame_count || found_width != width {
            return CacheLookup::Miss(CacheMiss::ShapeMismatch {
                found: (record.frames.len(), found_width),
                expected: (key.frame_count, width),
            });
        }
        match WaveformFrames::new(key.width, record.frames) {
            Ok(frames) => CacheLookup::Hit(frames),
            Err(e) => CacheLookup::Miss(CacheMiss::Corrupt(e.to_string())),
        }
    }

    /// Persist `frames` under `key`.
    ///
    /// Writes a temporary file in the same directory, syncs it and renames it over the final
    /// name, so readers never observe a partial record.
    pub fn store(&self, key: &CacheKey, frames: &WaveformFrames) -> WavecastResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| {
            WavecastError::cache(format!(
                "failed to create cache dir '{}': {e}",
                dir.display()
            ))
        })?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "waveform.bin".to_string());
        sweep_stale_tmp(dir, &file_name);
        let tmp = dir.join(format!(
            ".{file_name}.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let record = WaveformCacheRecordRef {
            fingerprint: key.fingerprint.as_str(),
            version: &key.version,
            frames: frames.frames(),
        };
        let write = || -> anyhow::Result<()> {
            let mut w = BufWriter::new(File::create(&tmp)?);
            bincode::serialize_into(&mut w, &record)?;
            let file = w.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
            drop(file);
            fs::rename(&tmp, &self.path)?;
            Ok(())
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            WavecastError::cache(format!(
                "failed to write cache '{}': {e}",
                self.path.display()
            ))
        })
    }
}

/// Remove `.<file_name>.*.tmp` siblings left behind by interrupted writes.
fn sweep_stale_tmp(dir: &Path, file_name: &str) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let prefix = format!(".{file_name}.");
    let now = std::time::SystemTime::now();
    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(&prefix) || !name.ends_with(".tmp") {
            continue;
        }
        let stale = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .is_some_and(|age| age >= STALE_TMP_AGE);
        if stale && fs::remove_file(entry.path()).is_ok() {
            tracing::debug!(file = %name, "removed stale cache temp file");
        }
    }
}

/// Analysis for `track`, served from `cache` when a valid record exists.
///
/// Cache problems never fail the call: a damaged record or a failed write is reported as a
/// [`Degradation`] and the analysis is recomputed. Tracks without a source path skip the cache.
#[tracing::instrument(skip_all, fields(source = ?track.source()))]
pub fn resolve_waveform(
    track: &AudioTrack,
    analyzer: &WaveformAnalyzer,
    request: AnalysisRequest,
    cache: Option<&WaveformCache>,
) -> WavecastResult<Outcome<Arc<WaveformFrames>>> {
    let mut degradations = Vec::new();

    let mut pending_store = None;
    if let (Some(cache), Some(source)) = (cache, track.source()) {
        match CacheKey::new(source, track, analyzer, &request) {
            Ok(key) => match cache.load(&key) {
                CacheLookup::Hit(frames) => {
                    tracing::info!(
                        path = %cache.path().display(),
                        "using cached waveform analysis"
                    );
                    return Ok(Outcome::clean(Arc::new(frames)));
                }
                CacheLookup::Miss(miss) => {
                    if miss.is_damage() {
                        tracing::warn!(reason = %miss, "waveform cache unusable, recomputing");
                        degradations.push(Degradation::CacheRecomputed {
                            reason: miss.to_string(),
                        });
                    } else {
                        tracing::info!(reason = %miss, "computing waveform analysis");
                    }
                    pending_store = Some((cache, key));
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "cannot fingerprint audio source, cache bypassed");
                degradations.push(Degradation::CacheRecomputed {
                    reason: e.to_string(),
                });
            }
        }
    }

    let frames = analyzer.analyze(
        track.samples(),
        track.sample_rate(),
        request.fps,
        request.canvas_width,
        request.smoothing,
    )?;

    if let Some((cache, key)) = pending_store {
        match cache.store(&key, &frames) {
            Ok(()) => {
                tracing::info!(path = %cache.path().display(), "waveform analysis cached");
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not persist waveform analysis");
                degradations.push(Degradation::CacheNotPersisted {
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(Outcome::degraded(Arc::new(frames), degradations))
}

#[cfg(test)]
#[path = "../../tests/unit/waveform/cache.rs"]
mod tests;
