use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use focusprompt::VideoSource as _;

#[derive(Parser, Debug)]
#[command(name = "focusprompt", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a single prompter frame over a test pattern and write a PNG.
    Frame(FrameArgs),
    /// Run a prompted recording session (requires `ffmpeg` on PATH).
    Record(RecordArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Script text; mutually exclusive with --script-file.
    #[arg(long, conflicts_with = "script_file")]
    script: Option<String>,

    /// Read the script from a file.
    #[arg(long)]
    script_file: Option<PathBuf>,

    /// TTF/OTF font used for the word overlay.
    #[arg(long)]
    font: PathBuf,

    /// Optional prompter config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// 0-based word index to display.
    #[arg(long, default_value_t = 0)]
    word: usize,

    /// Surface width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Surface height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RecordArgs {
    /// Script text; mutually exclusive with --script-file.
    #[arg(long, conflicts_with = "script_file")]
    script: Option<String>,

    /// Read the script from a file.
    #[arg(long)]
    script_file: Option<PathBuf>,

    /// TTF/OTF font used for the word overlay.
    #[arg(long)]
    font: PathBuf,

    /// Optional prompter config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured words-per-minute rate.
    #[arg(long)]
    wpm: Option<u32>,

    /// V4L2 camera device; mutually exclusive with --video.
    #[arg(long, default_value = "/dev/video0", conflicts_with = "video")]
    device: String,

    /// Use a video file as the live source instead of a camera.
    #[arg(long)]
    video: Option<PathBuf>,

    /// ALSA capture device for microphone audio (omit for silent output).
    #[arg(long)]
    audio_device: Option<String>,

    /// Directory recordings are written into.
    #[arg(long, default_value = "recordings")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Record(args) => cmd_record(args),
    }
}

fn read_script(inline: Option<String>, file: Option<&PathBuf>) -> anyhow::Result<String> {
    match (inline, file) {
        (Some(s), _) => Ok(s),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("read script '{}'", path.display())),
        (None, None) => anyhow::bail!("one of --script or --script-file is required"),
    }
}

fn read_config(path: Option<&PathBuf>) -> anyhow::Result<focusprompt::PrompterConfig> {
    let cfg = match path {
        Some(p) => focusprompt::PrompterConfig::load_json(p)?,
        None => focusprompt::PrompterConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn build_compositor(
    font: &Path,
    cfg: &focusprompt::PrompterConfig,
) -> anyhow::Result<focusprompt::Compositor> {
    let font_bytes =
        std::fs::read(font).with_context(|| format!("read font '{}'", font.display()))?;
    Ok(focusprompt::Compositor::new(
        font_bytes,
        focusprompt::CompositorOpts::from_config(cfg),
    )?)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_ref())?;
    let script = read_script(args.script, args.script_file.as_ref())?;
    let mut compositor = build_compositor(&args.font, &cfg)?;

    let tokens = focusprompt::tokenize(&script);
    let token = tokens
        .get(args.word)
        .with_context(|| format!("word index {} out of range ({})", args.word, tokens.len()))?;

    let size = focusprompt::SurfaceSize::new(args.width, args.height)?;
    let mut src = focusprompt::FrameRgba::new_black(size);
    let mut pattern = focusprompt::TestPatternSource::new(size, focusprompt::Fps::new(30, 1)?);
    pattern.read_frame(&mut src)?;

    let mut surface = focusprompt::FrameRgba::new_black(size);
    compositor.composite(&src, &mut surface, Some(token), true)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &surface.data,
        surface.width,
        surface.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_ref())?;
    let script = read_script(args.script, args.script_file.as_ref())?;
    let compositor = build_compositor(&args.font, &cfg)?;

    let wpm = args.wpm.unwrap_or(cfg.wpm);
    let engine = focusprompt::PacingEngine::new(&script, wpm);
    let mut coordinator = focusprompt::Coordinator::new(engine, Box::new(compositor));

    let source: Box<dyn focusprompt::VideoSource> = match args.video.as_ref() {
        Some(path) => Box::new(focusprompt::FileSource::open(
            path,
            focusprompt::Fps::new(30, 1)?,
        )?),
        None => Box::new(focusprompt::FfmpegCamera::open(
            &args.device,
            focusprompt::CaptureConstraints::default(),
        )?),
    };
    let fps = source.fps();
    coordinator.activate_camera(source, None)?;

    let format = focusprompt::pick_recording_format()?;
    let recorder = focusprompt::FfmpegRecorder::new(focusprompt::FfmpegRecorderOpts::new(
        &args.out_dir,
        format,
    ));

    let audio = match args.audio_device.as_deref() {
        Some(device) => {
            let pcm_path = args.out_dir.join("focusprompt-mic.pcm");
            std::fs::create_dir_all(&args.out_dir)
                .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
            Some(focusprompt::AudioCapture::start(device, pcm_path)?)
        }
        None => None,
    };

    coordinator.start_recording(recorder, Instant::now())?;

    // Paced at the capture cadence; the session ends when the script
    // finishes (the coordinator finalizes the recording itself) or the
    // source runs out of frames.
    let frame_duration = Duration::from_secs_f64(fps.frame_duration_secs());
    let recorder = loop {
        let tick_start = Instant::now();
        let live = coordinator.render_tick(tick_start)?;
        if let Some(recorder) = coordinator.take_finished_recording() {
            break Some(recorder);
        }
        if !live {
            break None;
        }
        let elapsed = tick_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    };
    coordinator.deactivate_camera()?;
    let recorder = match recorder {
        Some(r) => Some(r),
        None => coordinator.take_finished_recording(),
    };

    let artifact = recorder
        .as_ref()
        .and_then(|r| r.artifact())
        .context("session ended without a finalized recording")?;

    if let Some(capture) = audio {
        let audio_input = capture.stop()?;
        let out = with_audio_suffix(&artifact.path);
        focusprompt::mux_audio(&artifact.path, &audio_input, format, &out)?;
        std::fs::remove_file(&audio_input.path).ok();
        eprintln!("wrote {} ({} frames)", out.display(), artifact.frames_written);
    } else {
        eprintln!(
            "wrote {} ({} frames)",
            artifact.path.display(),
            artifact.frames_written
        );
    }
    Ok(())
}

fn with_audio_suffix(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("focusprompt");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("mp4");
    path.with_file_name(format!("{stem}-audio.{ext}"))
}
