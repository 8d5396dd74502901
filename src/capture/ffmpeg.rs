use crate::capture::source::{CaptureConstraints, VideoSource};
use crate::foundation::core::{Fps, FrameRgba, SurfaceSize};
use crate::foundation::error::{PromptError, PromptResult};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Basic metadata about a video file, probed through `ffprobe`.
#[derive(Clone, Debug)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
}

/// Probe video file metadata through `ffprobe`.
pub fn probe_video(path: &Path) -> PromptResult<VideoFileInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| PromptError::capture(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(PromptError::capture(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| PromptError::capture(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| PromptError::capture("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| PromptError::capture("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| PromptError::capture("missing video height from ffprobe"))?;
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoFileInfo {
        path: path.to_path_buf(),
        width,
        height,
        has_audio,
    })
}

/// Shared plumbing for ffmpeg-backed sources: a child process writing raw
/// RGBA8 frames to stdout, with stderr drained off-thread.
struct FfmpegStream {
    child: Child,
    stdout: ChildStdout,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    size: SurfaceSize,
    fps: Fps,
    eof: bool,
}

impl FfmpegStream {
    fn spawn(mut cmd: Command, size: SurfaceSize, fps: Fps) -> PromptResult<Self> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = cmd.spawn().map_err(|e| {
            PromptError::capture(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PromptError::capture("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| PromptError::capture("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });
        Ok(Self {
            child,
            stdout,
            stderr_drain: Some(stderr_drain),
            size,
            fps,
            eof: false,
        })
    }

    fn read_frame(&mut self, frame: &mut FrameRgba) -> PromptResult<bool> {
        if self.eof {
            return Ok(false);
        }
        if frame.size() != self.size {
            return Err(PromptError::capture(
                "frame buffer geometry does not match source",
            ));
        }
        match self.stdout.read_exact(&mut frame.data) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.eof = true;
                self.report_exit()?;
                Ok(false)
            }
            Err(e) => Err(PromptError::capture(format!(
                "failed to read frame from ffmpeg stdout: {e}"
            ))),
        }
    }

    /// Surface the child's stderr when it ended with a failure status.
    fn report_exit(&mut self) -> PromptResult<()> {
        let status = self
            .child
            .wait()
            .map_err(|e| PromptError::capture(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| PromptError::capture("ffmpeg stderr drain thread panicked"))?
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if !status.success() {
            return Err(PromptError::capture(format!(
                "ffmpeg capture exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        // Raw-frame pipes have no container to finalize, so a kill is safe.
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        self.eof = true;
    }
}

impl Drop for FfmpegStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Live camera source reading raw frames from a V4L2 device through ffmpeg.
pub struct FfmpegCamera {
    stream: FfmpegStream,
}

impl FfmpegCamera {
    /// Open `device` (e.g. `/dev/video0`) at the constrained geometry. The
    /// capture is normalized to the requested size, so `size()` always
    /// reports the constraint geometry.
    pub fn open(device: &str, constraints: CaptureConstraints) -> PromptResult<Self> {
        constraints.validate()?;
        let size = SurfaceSize::new(constraints.ideal_width, constraints.ideal_height)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "v4l2",
            "-framerate",
            &format!("{}/{}", constraints.fps.num, constraints.fps.den),
            "-video_size",
            &format!("{}x{}", size.width, size.height),
            "-i",
            device,
            "-vf",
            &format!("scale={}:{}", size.width, size.height),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ]);

        tracing::info!(device, width = size.width, height = size.height, "camera opened");
        Ok(Self {
            stream: FfmpegStream::spawn(cmd, size, constraints.fps)?,
        })
    }
}

impl VideoSource for FfmpegCamera {
    fn size(&self) -> SurfaceSize {
        self.stream.size
    }

    fn fps(&self) -> Fps {
        self.stream.fps
    }

    fn read_frame(&mut self, frame: &mut FrameRgba) -> PromptResult<bool> {
        self.stream.read_frame(frame)
    }
}

/// File-backed source, decoded in real time so pacing against it behaves
/// like a live camera.
pub struct FileSource {
    stream: FfmpegStream,
}

impl FileSource {
    pub fn open(path: &Path, fps: Fps) -> PromptResult<Self> {
        let info = probe_video(path)?;
        let size = SurfaceSize::new(info.width, info.height)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-loglevel", "error", "-re", "-i"])
            .arg(path)
            .args([
                "-r",
                &format!("{}/{}", fps.num, fps.den),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ]);

        Ok(Self {
            stream: FfmpegStream::spawn(cmd, size, fps)?,
        })
    }
}

impl VideoSource for FileSource {
    fn size(&self) -> SurfaceSize {
        self.stream.size
    }

    fn fps(&self) -> Fps {
        self.stream.fps
    }

    fn read_frame(&mut self, frame: &mut FrameRgba) -> PromptResult<bool> {
        self.stream.read_frame(frame)
    }
}

/// Microphone capture writing interleaved `f32le` PCM to a file, suitable
/// for muxing into the recording at finalize time.
pub struct AudioCapture {
    child: Option<Child>,
    path: PathBuf,
    sample_rate: u32,
    channels: u16,
}

impl AudioCapture {
    /// Start capturing from an ALSA `device` (e.g. `default`).
    pub fn start(device: &str, path: impl Into<PathBuf>) -> PromptResult<Self> {
        let path = path.into();
        let sample_rate = 48_000u32;
        let channels = 2u16;

        let child = Command::new("ffmpeg")
            .args([
                "-loglevel",
                "error",
                "-y",
                "-f",
                "alsa",
                "-ar",
                &sample_rate.to_string(),
                "-ac",
                &channels.to_string(),
                "-i",
                device,
                "-f",
                "f32le",
            ])
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PromptError::capture(format!("failed to spawn audio capture: {e}")))?;

        tracing::info!(device, path = %path.display(), "audio capture started");
        Ok(Self {
            child: Some(child),
            path,
            sample_rate,
            channels,
        })
    }

    /// Stop capturing and return the audio input descriptor for muxing.
    ///
    /// Raw PCM has no container, so truncating the writer mid-stream loses
    /// at most a partial sample frame.
    pub fn stop(mut self) -> PromptResult<crate::record::sink::AudioInput> {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        Ok(crate::record::sink::AudioInput {
            path: self.path.clone(),
            sample_rate: self.sample_rate,
            channels: self.channels,
        })
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

// No unit tests here: these types shell out to `ffmpeg`/`ffprobe` and are
// exercised by integration tests that skip when the tools are unavailable.
