//! Per-frame waveform amplitude analysis and its disk cache.

pub(crate) mod analyzer;
pub(crate) mod cache;

pub use analyzer::{AnalyzerParams, WaveformAnalyzer, WaveformFrames};
pub use cache::{
    AnalysisRequest, AudioFingerprint, CACHE_FORMAT_VERSION, CacheKey, CacheLookup, CacheMiss,
    WaveformCache, WaveformCacheRecord, resolve_waveform,
};
