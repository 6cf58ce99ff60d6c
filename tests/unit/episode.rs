use std::sync::Mutex;

use super::*;
use crate::assets::BuiltinOnlyResolver;
use crate::encode::InMemorySink;
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::render::Frame;

fn config() -> VideoConfig {
    VideoConfig {
        canvas: Canvas {
            width: 32,
            height: 18,
        },
        fps: Fps::new(5, 1).unwrap(),
        fade_secs: 0.4,
        disable_cache: true,
        ..VideoConfig::default()
    }
}

fn decoded(secs: u32) -> AudioSource {
    let rate = 800u32;
    let samples: Vec<f32> = (0..rate * secs).map(|i| ((i as f32) * 0.2).sin() * 0.3).collect();
    AudioSource::Decoded(AudioTrack::from_samples(samples, rate).unwrap())
}

fn job(name: &str) -> EpisodeJob {
    EpisodeJob {
        name: name.to_string(),
        audio: decoded(2),
        title: format!("Episode: {name}"),
        logo: None,
        thematic: None,
        output: PathBuf::from(format!("{name}.mp4")),
    }
}

#[test]
fn suggested_titles_follow_file_naming() {
    assert_eq!(suggested_title("EP12_Working memory"), "EP12: Working memory");
    assert_eq!(suggested_title("episode: Attention"), "Attention");
    assert_eq!(suggested_title("Episode: A_B_C"), "A: B_C");
    assert_eq!(suggested_title("plain"), "plain");
}

#[test]
fn sanitized_stems_are_filesystem_safe() {
    assert_eq!(sanitize_file_stem("EP1: Mind/Brain?"), "EP1 - Mind-Brain");
    assert_eq!(sanitize_file_stem(r#"a"b|c*<d>"#), "a'b-cd");
}

#[test]
fn job_for_audio_file_derives_title_and_output() {
    let job = EpisodeJob::for_audio_file(Path::new("in/EP3_Perception.wav"), Path::new("out"));
    assert_eq!(job.name, "EP3_Perception");
    assert_eq!(job.title, "EP3: Perception");
    assert_eq!(job.output, PathBuf::from("out/EP3_Perception.mp4"));
}

#[test]
fn episode_streams_every_frame_with_pcm_audio() {
    let mut sink = InMemorySink::new();
    let out = render_episode(&job("one"), &config(), &BuiltinOnlyResolver, &mut sink).unwrap();
    assert_eq!(out.value, 10);
    assert!(sink.is_ended());
    assert_eq!(sink.frames().len(), 10);

    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height), (32, 18));
    match cfg.audio {
        Some(AudioInput::F32le {
            sample_rate,
            channels,
            ref path,
        }) => {
            assert_eq!(sample_rate, 800);
            assert_eq!(channels, 1);
            // removed once the episode is done
            assert!(!path.exists());
        }
        other => panic!("unexpected audio input {other:?}"),
    }
}

#[test]
fn unreadable_images_degrade_instead_of_failing() {
    let mut j = job("missing");
    j.logo = Some(ImageSource::File(PathBuf::from("/nonexistent/logo.png")));
    j.thematic = Some(ImageSource::File(PathBuf::from("/nonexistent/theme.png")));
    let mut sink = InMemorySink::new();
    let out = render_episode(&j, &config(), &BuiltinOnlyResolver, &mut sink).unwrap();
    assert!(
        out.degradations
            .iter()
            .any(|d| matches!(d, Degradation::LogoOmitted { .. }))
    );
    assert!(
        out.degradations
            .iter()
            .any(|d| matches!(d, Degradation::ThematicImageOmitted { .. }))
    );
    assert_eq!(sink.frames().len(), 10);
}

#[test]
fn missing_logo_is_omitted_from_visuals() {
    let mut j = job("nologo");
    j.logo = Some(ImageSource::File(PathBuf::from("/nonexistent/logo.png")));
    j.thematic = Some(ImageSource::Input(ImageInput::Encoded(std::sync::Arc::from(
        &b"not read yet"[..],
    ))));
    let out = j.visuals(&config());
    assert!(out.value.logo.is_none());
    assert!(out.value.thematic.is_some());
    assert_eq!(out.value.title, "Episode: nologo");
    assert_eq!(out.degradations.len(), 1);
    assert!(matches!(out.degradations[0], Degradation::LogoOmitted { .. }));
}

#[test]
fn job_without_images_has_clean_visuals() {
    let out = job("plain").visuals(&config());
    assert!(!out.is_degraded());
    assert_eq!(out.value.podcast_name, config().podcast_name);
}

struct RecordingSink {
    fail: bool,
    log: std::sync::Arc<Mutex<Vec<(String, u64)>>>,
    name: String,
}

impl FrameSink for RecordingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> WavecastResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &Frame) -> WavecastResult<()> {
        if self.fail {
            return Err(WavecastError::encode("disk full"));
        }
        self.log.lock().unwrap().push((self.name.clone(), idx.0));
        Ok(())
    }

    fn end(&mut self) -> WavecastResult<()> {
        Ok(())
    }
}

#[test]
fn batch_continues_after_a_failing_sink() {
    let jobs = vec![job("first"), job("broken"), job("last")];
    let log = std::sync::Arc::new(Mutex::new(Vec::new()));
    let reports = render_batch(&jobs, &config(), &BuiltinOnlyResolver, |j| {
        Box::new(RecordingSink {
            fail: j.name == "broken",
            log: log.clone(),
            name: j.name.clone(),
        })
    });

    assert_eq!(reports.len(), 3);
    assert!(reports[0].status.is_success());
    assert!(matches!(
        reports[1].status,
        EpisodeStatus::Failed(WavecastError::Encode(_))
    ));
    assert_eq!(reports[1].frames, 0);
    assert!(reports[2].status.is_success());
    assert_eq!(reports[2].frames, 10);

    let log = log.lock().unwrap();
    assert_eq!(log.iter().filter(|(n, _)| n == "last").count(), 10);
    assert!(log.iter().all(|(n, _)| n != "broken"));
}

#[test]
fn failed_audio_decode_is_reported_per_item() {
    let mut bad = job("bad");
    bad.audio = AudioSource::File(PathBuf::from("/nonexistent/audio.wav"));
    let reports = render_batch(&[bad, job("good")], &config(), &BuiltinOnlyResolver, |_| {
        Box::new(InMemorySink::new())
    });
    assert!(matches!(reports[0].status, EpisodeStatus::Failed(_)));
    assert!(reports[1].status.is_success());
}

#[test]
fn titles_file_maps_stems_to_titles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("titles.json");
    std::fs::write(&path, r#"{ "EP1_x": "Custom title" }"#).unwrap();
    let titles = load_titles(&path).unwrap();
    assert_eq!(titles.get("EP1_x").map(String::as_str), Some("Custom title"));
}
