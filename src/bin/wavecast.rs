use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use wavecast::episode::{EpisodeJob, ImageSource, load_titles};
use wavecast::{
    AudioTrack, CandidateFontResolver, EpisodeContext, EpisodeStatus, FfmpegSink, FfmpegSinkOpts,
    FrameIndex, FrameSink, VideoConfig,
};

const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "flac", "ogg"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg"];

#[derive(Parser, Debug)]
#[command(name = "wavecast", version, about = "Speech track to waveform video")]
struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one episode to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render every audio file of a directory.
    Batch(BatchArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON configuration; every key is optional.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Podcast logo image.
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Font file tried before the system fonts.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Render frames on a thread pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for --parallel.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Speech track.
    #[arg(long)]
    audio: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Episode title; derived from the audio file name when omitted.
    #[arg(long)]
    title: Option<String>,

    /// Thematic image.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Fail instead of replacing an existing output file.
    #[arg(long)]
    no_overwrite: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Directory with audio files; an image with the same stem becomes the thematic image.
    #[arg(long)]
    input_dir: PathBuf,

    /// Directory for the MP4 files.
    #[arg(long)]
    output_dir: PathBuf,

    /// JSON object mapping audio file stems to episode titles.
    #[arg(long)]
    titles: Option<PathBuf>,

    /// Fail instead of replacing existing output files.
    #[arg(long)]
    no_overwrite: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Speech track.
    #[arg(long)]
    audio: PathBuf,

    /// Time position in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Episode title; derived from the audio file name when omitted.
    #[arg(long)]
    title: Option<String>,

    /// Thematic image.
    #[arg(long)]
    image: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_config(common: &CommonArgs) -> anyhow::Result<VideoConfig> {
    let mut cfg = match &common.config {
        Some(path) => VideoConfig::from_path(path)?,
        None => VideoConfig::default(),
    };
    if common.parallel {
        cfg.threading.parallel = true;
    }
    if common.threads.is_some() {
        cfg.threading.threads = common.threads;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn font_resolver(common: &CommonArgs) -> CandidateFontResolver {
    let fonts = CandidateFontResolver::system();
    match &common.font {
        Some(path) => fonts.with_preferred(path),
        None => fonts,
    }
}

fn ffmpeg_sink(cfg: &VideoConfig, out: &Path, overwrite: bool) -> Box<dyn FrameSink> {
    Box::new(FfmpegSink::new(FfmpegSinkOpts {
        out_path: out.to_path_buf(),
        overwrite,
        encoder: cfg.encoder.clone(),
    }))
}

fn job_for(
    audio: &Path,
    out: &Path,
    title: Option<String>,
    image: Option<PathBuf>,
    logo: Option<&PathBuf>,
) -> EpisodeJob {
    let mut job = EpisodeJob::for_audio_file(audio, out.parent().unwrap_or(Path::new(".")));
    job.output = out.to_path_buf();
    if let Some(title) = title {
        job.title = title;
    }
    job.logo = logo.cloned().map(ImageSource::File);
    job.thematic = image.map(ImageSource::File);
    job
}

fn report_status(name: &str, status: &EpisodeStatus) {
    match status {
        EpisodeStatus::Completed => eprintln!("ok       {name}"),
        EpisodeStatus::Degraded(reasons) => {
            eprintln!("degraded {name}");
            for r in reasons {
                eprintln!("         - {r}");
            }
        }
        EpisodeStatus::Failed(err) => eprintln!("failed   {name}: {err}"),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let fonts = font_resolver(&args.common);
    let job = job_for(
        &args.audio,
        &args.out,
        args.title,
        args.image,
        args.common.logo.as_ref(),
    );

    let mut sink = ffmpeg_sink(&cfg, &args.out, !args.no_overwrite);
    let out = wavecast::render_episode(&job, &cfg, &fonts, sink.as_mut())?;
    let status = if out.is_degraded() {
        EpisodeStatus::Degraded(out.degradations)
    } else {
        EpisodeStatus::Completed
    };
    report_status(&job.name, &status);
    eprintln!("wrote {} ({} frames)", args.out.display(), out.value);
    Ok(())
}

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

fn sibling_image(audio: &Path) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| audio.with_extension(ext))
        .find(|p| p.is_file())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let fonts = font_resolver(&args.common);
    let titles = match &args.titles {
        Some(path) => load_titles(path)?,
        None => Default::default(),
    };

    let mut audio_files = Vec::new();
    for entry in std::fs::read_dir(&args.input_dir)
        .with_context(|| format!("read input dir '{}'", args.input_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, AUDIO_EXTENSIONS) {
            audio_files.push(path);
        }
    }
    audio_files.sort();
    if audio_files.is_empty() {
        anyhow::bail!("no audio files found in '{}'", args.input_dir.display());
    }

    let jobs: Vec<EpisodeJob> = audio_files
        .iter()
        .map(|audio| {
            let mut job = EpisodeJob::for_audio_file(audio, &args.output_dir);
            if let Some(title) = titles.get(&job.name) {
                job.title = title.clone();
            }
            job.logo = args.common.logo.clone().map(ImageSource::File);
            job.thematic = sibling_image(audio).map(ImageSource::File);
            job
        })
        .collect();

    let overwrite = !args.no_overwrite;
    let reports = wavecast::render_batch(&jobs, &cfg, &fonts, |job| {
        ffmpeg_sink(&cfg, &job.output, overwrite)
    });

    eprintln!("summary:");
    for r in &reports {
        report_status(&r.name, &r.status);
    }
    let failed = reports.iter().filter(|r| !r.status.is_success()).count();
    eprintln!(
        "{} succeeded, {failed} failed, output in {}",
        reports.len() - failed,
        args.output_dir.display()
    );
    if failed > 0 {
        anyhow::bail!("{failed} episode(s) failed");
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let fonts = font_resolver(&args.common);
    let job = job_for(
        &args.audio,
        &args.out,
        args.title,
        args.image,
        args.common.logo.as_ref(),
    );

    let track = AudioTrack::decode(&args.audio, wavecast::media::ANALYSIS_SAMPLE_RATE)?;
    let mut degradations = Vec::new();
    let visuals = job.visuals(&cfg).absorb_into(&mut degradations);
    let ctx = EpisodeContext::prepare(&track, &visuals, &cfg, &fonts, None)?
        .absorb_into(&mut degradations);
    for d in &degradations {
        eprintln!("degraded: {d}");
    }
    let ctx = Arc::new(ctx);

    let idx = FrameIndex(cfg.fps.secs_to_frames_floor(args.time.max(0.0)));
    let mut worker = ctx.compositor();
    let frame = ctx.render_frame(&mut worker, idx)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        frame.as_bytes(),
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} (frame {}, {:?})",
        args.out.display(),
        idx.0,
        ctx.view_state(idx)
    );
    Ok(())
}
