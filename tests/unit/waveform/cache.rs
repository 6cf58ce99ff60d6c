use super::*;
use crate::waveform::analyzer::AnalyzerParams;

fn request() -> AnalysisRequest {
    AnalysisRequest {
        fps: Fps::new(10, 1).unwrap(),
        canvas_width: 16,
        smoothing: 0.8,
    }
}

fn fixture(dir: &Path, samples: usize) -> (PathBuf, AudioTrack) {
    let audio = dir.join("episode.wav");
    fs::write(&audio, vec![7u8; samples]).unwrap();
    let pcm: Vec<f32> = (0..samples).map(|i| ((i % 50) as f32 / 50.0) - 0.5).collect();
    let track = AudioTrack::from_samples(pcm, 1000)
        .unwrap()
        .with_source(&audio);
    (audio, track)
}

#[test]
fn fingerprint_tracks_name_size_and_mtime() {
    let a = AudioFingerprint::from_parts("a.wav", 10, 5);
    assert_eq!(a, AudioFingerprint::from_parts("a.wav", 10, 5));
    assert_ne!(a, AudioFingerprint::from_parts("a.wav", 11, 5));
    assert_ne!(a, AudioFingerprint::from_parts("a.wav", 10, 6));
    assert_ne!(a, AudioFingerprint::from_parts("b.wav", 10, 5));
    assert_eq!(a.as_str().len(), 32);
    assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn default_location_sits_next_to_the_audio() {
    let c = WaveformCache::beside(Path::new("/data/show/ep7.wav"));
    assert_eq!(
        c.path(),
        Path::new("/data/show/.waveform_cache/ep7_waveform.bin")
    );
}

#[test]
fn store_then_load_hits() {
    let dir = tempfile::tempdir().unwrap();
    let (audio, track) = fixture(dir.path(), 3000);
    let analyzer = WaveformAnalyzer::default();
    let cache = WaveformCache::beside(&audio);

    let first = resolve_waveform(&track, &analyzer, request(), Some(&cache)).unwrap();
    assert!(!first.is_degraded());
    assert!(cache.path().exists());

    let key = CacheKey::new(&audio, &track, &analyzer, &request()).unwrap();
    match cache.load(&key) {
        CacheLookup::Hit(frames) => assert_eq!(&frames, first.value.as_ref()),
        CacheLookup::Miss(m) => panic!("expected hit, got {m}"),
    }

    let second = resolve_waveform(&track, &analyzer, request(), Some(&cache)).unwrap();
    assert_eq!(second.value, first.value);

    let leftovers: Vec<_> = fs::read_dir(cache.path().parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn size_change_misses_on_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let (audio, track) = fixture(dir.path(), 2000);
    let analyzer = WaveformAnalyzer::default();
    let cache = WaveformCache::beside(&audio);
    resolve_waveform(&track, &analyzer, request(), Some(&cache)).unwrap();

    let old_key = CacheKey::new(&audio, &track, &analyzer, &request()).unwrap();
    fs::write(&audio, vec![1u8; 2001]).unwrap();
    let new_key = CacheKey::new(&audio, &track, &analyzer, &request()).unwrap();
    assert_ne!(old_key.fingerprint, new_key.fingerprint);
    assert!(matches!(
        cache.load(&new_key),
        CacheLookup::Miss(CacheMiss::FingerprintMismatch)
    ));
}

#[test]
fn mtime_change_misses_on_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let (audio, track) = fixture(dir.path(), 2000);
    let analyzer = WaveformAnalyzer::default();
    let cache = WaveformCache::beside(&audio);
    resolve_waveform(&track, &analyzer, request(), Some(&cache)).unwrap();

    let f = fs::OpenOptions::new().write(true).open(&audio).unwrap();
    f.set_modified(std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000))
        .unwrap();
    drop(f);

    let key = CacheKey::new(&audio, &track, &analyzer, &request()).unwrap();
    assert!(matches!(
        cache.load(&key),
        CacheLookup::Miss(CacheMiss::FingerprintMismatch)
    ));
}

#[test]
fn analysis_settings_are_part_of_the_version() {
    let dir = tempfile::tempdir().unwrap();
    let (audio, track) = fixture(dir.path(), 2000);
    let cache = WaveformCache::beside(&audio);
    let a = WaveformAnalyzer::default();
    resolve_waveform(&track, &a, request(), Some(&cache)).unwrap();

    let b = WaveformAnalyzer::new(AnalyzerParams {
        jitter_std: 0.0,
        ..AnalyzerParams::default()
    })
    .unwrap();
    let key = CacheKey::new(&audio, &track, &b, &request()).unwrap();
    assert!(matches!(
        cache.load(&key),
        CacheLookup::Miss(CacheMiss::VersionMismatch { .. })
    ));
}

#[test]
fn wider_canvas_is_a_shape_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let (audio, track) = fixture(dir.path(), 2000);
    let analyzer = WaveformAnalyzer::default();
    let cache = WaveformCache::beside(&audio);
    resolve_waveform(&track, &analyzer, request(), Some(&cache)).unwrap();

    let mut wide = request();
    wide.canvas_width = 32;
    let key = CacheKey::new(&audio, &track, &analyzer, &wide).unwrap();
    assert!(matches!(
        cache.load(&key),
        CacheLookup::Miss(CacheMiss::ShapeMismatch { .. })
    ));
}

#[test]
fn corrupt_file_is_recomputed_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (audio, track) = fixture(dir.path(), 2000);
    let analyzer = WaveformAnalyzer::default();
    let cache = WaveformCache::beside(&audio);
    fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
    fs::write(cache.path(), b"definitely not bincode").unwrap();

    let out = resolve_waveform(&track, &analyzer, request(), Some(&cache)).unwrap();
    assert_eq!(out.value.len(), 20);
    assert!(matches!(
        out.degradations.as_slice(),
        [Degradation::CacheRecomputed { .. }]
    ));

    // The rewrite replaced the corrupt record.
    let key = CacheKey::new(&audio, &track, &analyzer, &request()).unwrap();
    assert!(matches!(cache.load(&key), CacheLookup::Hit(_)));
}

#[test]
fn store_sweeps_stale_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let (audio, track) = fixture(dir.path(), 2000);
    let analyzer = WaveformAnalyzer::default();
    let cache = WaveformCache::in_dir(dir.path(), &audio);
    let name = cache.path().file_name().unwrap().to_string_lossy().into_owned();

    let stale = dir.path().join(format!(".{name}.4242.0.tmp"));
    let fresh = dir.path().join(format!(".{name}.4243.0.tmp"));
    let unrelated = dir.path().join(".other_waveform.bin.4242.0.tmp");
    for p in [&stale, &fresh, &unrelated] {
        fs::write(p, b"partial").unwrap();
    }
    let old = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
    for p in [&stale, &unrelated] {
        File::options().write(true).open(p).unwrap().set_modified(old).unwrap();
    }

    let out = resolve_waveform(&track, &analyzer, request(), Some(&cache)).unwrap();
    assert!(!out.is_degraded());
    assert!(cache.path().exists());
    assert!(!stale.exists());
    assert!(fresh.exists());
    assert!(unrelated.exists());
}

#[test]
fn unwritable_cache_location_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let (_audio, track) = fixture(dir.path(), 2000);
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"x").unwrap();
    let cache = WaveformCache::at(blocker.join("sub").join("w.bin"));

    let out = resolve_waveform(&track, &WaveformAnalyzer::default(), request(), Some(&cache))
        .unwrap();
    assert_eq!(out.value.len(), 20);
    assert!(
        out.degradations
            .iter()
            .any(|d| matches!(d, Degradation::CacheNotPersisted { .. }))
    );
}

#[test]
fn tracks_without_source_bypass_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = WaveformCache::at(dir.path().join("w.bin"));
    let track = AudioTrack::from_samples(vec![0.1f32; 1000], 1000).unwrap();
    let out = resolve_waveform(&track, &WaveformAnalyzer::default(), request(), Some(&cache))
        .unwrap();
    assert_eq!(out.value.len(), 10);
    assert!(!cache.path().exists());
}
