use crate::foundation::core::{FrameIndex, FrameRgba};
use crate::foundation::error::{PromptError, PromptResult};
use crate::record::sink::{FrameSink, SinkConfig};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

/// Target video bitrate for recordings, matching the product's quality bar.
const VIDEO_BITRATE: &str = "8M";

/// Container/codec pairs a recording can be written in, in preference order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingFormat {
    H264Mp4,
    Vp9Webm,
    Vp8Webm,
    /// Always-available fallback: ffmpeg's native mpeg4 encoder.
    Mpeg4,
}

impl RecordingFormat {
    /// Preference order tried against the local ffmpeg build.
    pub const PREFERRED: [RecordingFormat; 3] = [
        RecordingFormat::H264Mp4,
        RecordingFormat::Vp9Webm,
        RecordingFormat::Vp8Webm,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            RecordingFormat::H264Mp4 | RecordingFormat::Mpeg4 => "mp4",
            RecordingFormat::Vp9Webm | RecordingFormat::Vp8Webm => "webm",
        }
    }

    /// Encoder name as listed by `ffmpeg -encoders`.
    fn encoder_name(self) -> &'static str {
        match self {
            RecordingFormat::H264Mp4 => "libx264",
            RecordingFormat::Vp9Webm => "libvpx-vp9",
            RecordingFormat::Vp8Webm => "libvpx",
            RecordingFormat::Mpeg4 => "mpeg4",
        }
    }

    fn audio_encoder_name(self) -> &'static str {
        match self {
            RecordingFormat::H264Mp4 | RecordingFormat::Mpeg4 => "aac",
            RecordingFormat::Vp9Webm | RecordingFormat::Vp8Webm => "libopus",
        }
    }

    fn is_mp4(self) -> bool {
        matches!(self, RecordingFormat::H264Mp4 | RecordingFormat::Mpeg4)
    }
}

/// Pick the best recording format supported by the ffmpeg on PATH.
///
/// The native `mpeg4` encoder ships with every ffmpeg build, so this only
/// fails when ffmpeg itself is missing.
pub fn pick_recording_format() -> PromptResult<RecordingFormat> {
    let out = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stderr(Stdio::null())
        .output()
        .map_err(|e| {
            PromptError::encode(format!(
                "failed to run ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
    if !out.status.success() {
        return Err(PromptError::encode("ffmpeg -encoders exited with failure"));
    }
    Ok(select_format(&String::from_utf8_lossy(&out.stdout)))
}

/// Choose the first preferred format whose encoder appears in the
/// `ffmpeg -encoders` listing, falling back to the native mpeg4 encoder.
pub fn select_format(encoders_listing: &str) -> RecordingFormat {
    for format in RecordingFormat::PREFERRED {
        let name = format.encoder_name();
        let found = encoders_listing
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(name));
        if found {
            return format;
        }
    }
    RecordingFormat::Mpeg4
}

/// Timestamped output filename, unique per session start.
pub fn recording_file_name(format: RecordingFormat, unix_ms: u128) -> String {
    format!("focusprompt-{unix_ms}.{}", format.extension())
}

fn now_unix_ms() -> PromptResult<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| PromptError::encode(format!("system clock before unix epoch: {e}")))?
        .as_millis())
}

/// Mux a captured PCM audio track into a finalized recording, copying the
/// video stream. Used when audio is captured in parallel with the video
/// and only complete at session end.
pub fn mux_audio(
    video: &Path,
    audio: &crate::record::sink::AudioInput,
    format: RecordingFormat,
    out: &Path,
) -> PromptResult<()> {
    let child = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-i"])
        .arg(video)
        .args([
            "-f",
            "f32le",
            "-ar",
            &audio.sample_rate.to_string(),
            "-ac",
            &audio.channels.to_string(),
            "-i",
        ])
        .arg(&audio.path)
        .args([
            "-c:v",
            "copy",
            "-c:a",
            format.audio_encoder_name(),
            "-shortest",
        ])
        .arg(out)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| PromptError::encode(format!("failed to run ffmpeg for audio mux: {e}")))?;
    if !child.status.success() {
        return Err(PromptError::encode(format!(
            "audio mux failed: {}",
            String::from_utf8_lossy(&child.stderr).trim()
        )));
    }
    Ok(())
}

/// A finalized recording on disk.
#[derive(Clone, Debug)]
pub struct RecordingArtifact {
    pub path: PathBuf,
    pub format: RecordingFormat,
    pub frames_written: u64,
}

/// Options for [`FfmpegRecorder`].
#[derive(Clone, Debug)]
pub struct FfmpegRecorderOpts {
    /// Directory recordings are written into.
    pub out_dir: PathBuf,
    pub format: RecordingFormat,
}

impl FfmpegRecorderOpts {
    pub fn new(out_dir: impl Into<PathBuf>, format: RecordingFormat) -> Self {
        Self {
            out_dir: out_dir.into(),
            format,
        }
    }
}

/// Sink that spawns the system `ffmpeg` and streams composited frames to
/// its stdin; the child finalizes the container on `end`.
///
/// Audio is optional and provided through `SinkConfig.audio`.
pub struct FfmpegRecorder {
    opts: FfmpegRecorderOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    out_path: Option<PathBuf>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    frames_written: u64,
    artifact: Option<RecordingArtifact>,
}

impl FfmpegRecorder {
    pub fn new(opts: FfmpegRecorderOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            out_path: None,
            cfg: None,
            last_idx: None,
            frames_written: 0,
            artifact: None,
        }
    }

    /// The finalized recording, available after a successful `end`.
    pub fn artifact(&self) -> Option<&RecordingArtifact> {
        self.artifact.as_ref()
    }
}

impl FrameSink for FfmpegRecorder {
    fn begin(&mut self, cfg: SinkConfig) -> PromptResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(PromptError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(PromptError::validation(
                "recorder width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(PromptError::validation(
                "recorder width/height must be even (required for yuv420p output)",
            ));
        }

        std::fs::create_dir_all(&self.opts.out_dir).map_err(|e| {
            PromptError::encode(format!(
                "failed to create output directory '{}': {e}",
                self.opts.out_dir.display()
            ))
        })?;
        let out_path = self
            .opts
            .out_dir
            .join(recording_file_name(self.opts.format, now_unix_ms()?));

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
        ]);

        if let Some(audio) = cfg.audio.as_ref() {
            if audio.sample_rate == 0 {
                return Err(PromptError::validation(
                    "audio sample_rate must be non-zero when audio is enabled",
                ));
            }
            if audio.channels == 0 {
                return Err(PromptError::validation(
                    "audio channels must be non-zero when audio is enabled",
                ));
            }
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path)
            .args([
                "-c:a",
                self.opts.format.audio_encoder_name(),
                "-shortest",
            ]);
        } else {
            cmd.arg("-an");
        }

        cmd.args([
            "-c:v",
            self.opts.format.encoder_name(),
            "-b:v",
            VIDEO_BITRATE,
            "-pix_fmt",
            "yuv420p",
        ]);
        if self.opts.format.is_mp4() {
            cmd.args(["-movflags", "+faststart"]);
        }
        cmd.arg(&out_path);

        let mut child = cmd.spawn().map_err(|e| {
            PromptError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PromptError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| PromptError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::info!(
            path = %out_path.display(),
            format = ?self.opts.format,
            "recording started"
        );

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.out_path = Some(out_path);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames_written = 0;
        self.artifact = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> PromptResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| PromptError::encode("recorder not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(PromptError::encode(
                "recorder received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(PromptError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        frame.validate()?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(PromptError::encode("recorder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            PromptError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames_written += 1;
        Ok(())
    }

    fn end(&mut self) -> PromptResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| PromptError::encode("recorder not started"))?;

        let status = child
            .wait()
            .map_err(|e| PromptError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PromptError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| PromptError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(PromptError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let path = self
            .out_path
            .take()
            .ok_or_else(|| PromptError::encode("recorder missing output path (unexpected)"))?;
        tracing::info!(
            path = %path.display(),
            frames = self.frames_written,
            "recording finalized"
        );
        self.artifact = Some(RecordingArtifact {
            path,
            format: self.opts.format,
            frames_written: self.frames_written,
        });
        self.cfg = None;
        Ok(())
    }
}
