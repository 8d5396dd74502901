use std::time::{Duration, Instant};

use focusprompt::{
    CameraState, Compositor, CompositorOpts, Coordinator, Fps, FrameComposer, FrameIndex,
    FrameRgba, FrameSink, InMemorySink, PacingEngine, PromptResult, SinkConfig, SurfaceSize,
    TestPatternSource, Token, VideoSource,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Blit-only composer so session lifecycle tests run without a font file.
struct BlitComposer;

impl FrameComposer for BlitComposer {
    fn composite(
        &mut self,
        src: &FrameRgba,
        dst: &mut FrameRgba,
        _token: Option<&Token>,
        _running: bool,
    ) -> PromptResult<()> {
        focusprompt::render::scale::aspect_fill(src, dst)
    }
}

/// Glyph drawing needs a real font; tests that check overlay pixels are
/// gated on a local font file, mirroring the unit-test convention.
fn compositor_with_local_font() -> Option<Compositor> {
    let font_bytes = std::fs::read("assets/PlayfairDisplay.ttf").ok()?;
    Compositor::new(
        font_bytes,
        CompositorOpts {
            font_size_px: 120,
            reference_viewport_width: 1280.0,
            show_orp: true,
        },
    )
    .ok()
}

fn ffmpeg_available() -> bool {
    focusprompt::capture::ffmpeg::is_ffmpeg_on_path()
}

#[test]
fn full_session_records_ordered_frames_until_script_finishes() {
    init_tracing();

    let t0 = Instant::now();
    // Two plain tokens at 250 wpm: advances at 240ms and 480ms.
    let mut c: Coordinator<InMemorySink> =
        Coordinator::new(PacingEngine::new("alpha beta", 250), Box::new(BlitComposer));

    let source = TestPatternSource::new(
        SurfaceSize::new(64, 64).unwrap(),
        Fps::new(30, 1).unwrap(),
    )
    .with_frame_limit(1000);
    c.activate_camera(Box::new(source), None).unwrap();
    c.start_recording(InMemorySink::new(), t0).unwrap();
    assert_eq!(c.camera_state(), CameraState::Recording);
    assert!(c.engine().is_running());

    // Tick at ~30fps until past the end of the script.
    let mut now = t0;
    let mut finished = None;
    for _ in 0..30 {
        now += Duration::from_millis(33);
        c.render_tick(now).unwrap();
        if let Some(sink) = c.take_finished_recording() {
            finished = Some(sink);
            break;
        }
    }

    let sink = finished.expect("recording should auto-stop when the script finishes");
    assert!(sink.is_ended());
    let indices: Vec<u64> = sink.frames().iter().map(|(idx, _)| idx.0).collect();
    let expected: Vec<u64> = (0..indices.len() as u64).collect();
    assert_eq!(indices, expected);
    assert!(!indices.is_empty());

    // Camera survives the auto-stop; teardown is still clean afterwards.
    assert_eq!(c.camera_state(), CameraState::CameraOn);
    c.deactivate_camera().unwrap();
    c.deactivate_camera().unwrap();
    assert_eq!(c.camera_state(), CameraState::CameraOff);
}

#[test]
fn composited_frames_differ_from_raw_when_running() {
    init_tracing();
    let Some(compositor) = compositor_with_local_font() else {
        return;
    };

    let t0 = Instant::now();
    let mut c: Coordinator<InMemorySink> =
        Coordinator::new(PacingEngine::new("steady", 250), Box::new(compositor));
    let size = SurfaceSize::new(256, 128).unwrap();
    c.activate_camera(
        Box::new(TestPatternSource::new(size, Fps::new(30, 1).unwrap())),
        None,
    )
    .unwrap();

    // Not running: the surface is the bare pattern.
    c.render_tick(t0).unwrap();
    let idle_frame = c.surface().unwrap().data.clone();

    // Running: the band plus glyphs must change pixels. The pattern
    // advances each tick, so compare against a fresh pattern frame.
    c.engine_mut().play(t0);
    c.render_tick(t0 + Duration::from_millis(1)).unwrap();
    let running_frame = c.surface().unwrap();

    let mut reference = TestPatternSource::new(size, Fps::new(30, 1).unwrap());
    let mut raw = FrameRgba::new_black(size);
    reference.read_frame(&mut raw).unwrap();
    reference.read_frame(&mut raw).unwrap();
    assert_ne!(running_frame.data, raw.data);
    assert_ne!(running_frame.data, idle_frame);
}

#[test]
fn ffmpeg_recorder_writes_a_playable_file() {
    init_tracing();
    if !ffmpeg_available() {
        return;
    }

    let format = focusprompt::pick_recording_format().unwrap();
    let out_dir = std::env::temp_dir().join(format!(
        "focusprompt-test-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));

    let mut recorder = focusprompt::FfmpegRecorder::new(focusprompt::FfmpegRecorderOpts::new(
        &out_dir, format,
    ));
    recorder
        .begin(SinkConfig {
            width: 64,
            height: 64,
            fps: Fps::new(30, 1).unwrap(),
            audio: None,
        })
        .unwrap();

    let size = SurfaceSize::new(64, 64).unwrap();
    let mut source = TestPatternSource::new(size, Fps::new(30, 1).unwrap());
    let mut frame = FrameRgba::new_black(size);
    for i in 0..15u64 {
        source.read_frame(&mut frame).unwrap();
        recorder.push_frame(FrameIndex(i), &frame).unwrap();
    }
    recorder.end().unwrap();

    let artifact = recorder.artifact().expect("artifact after end");
    assert_eq!(artifact.frames_written, 15);
    let meta = std::fs::metadata(&artifact.path).unwrap();
    assert!(meta.len() > 0);

    std::fs::remove_dir_all(&out_dir).ok();
}

#[test]
fn recorder_rejects_out_of_order_frames() {
    init_tracing();
    if !ffmpeg_available() {
        return;
    }

    let out_dir = std::env::temp_dir().join(format!(
        "focusprompt-test-ooo-{}",
        std::process::id()
    ));
    let mut recorder = focusprompt::FfmpegRecorder::new(focusprompt::FfmpegRecorderOpts::new(
        &out_dir,
        focusprompt::RecordingFormat::Mpeg4,
    ));
    recorder
        .begin(SinkConfig {
            width: 64,
            height: 64,
            fps: Fps::new(30, 1).unwrap(),
            audio: None,
        })
        .unwrap();

    let frame = FrameRgba::new_black(SurfaceSize::new(64, 64).unwrap());
    recorder.push_frame(FrameIndex(1), &frame).unwrap();
    assert!(recorder.push_frame(FrameIndex(1), &frame).is_err());
    assert!(recorder.push_frame(FrameIndex(0), &frame).is_err());

    recorder.end().ok();
    std::fs::remove_dir_all(&out_dir).ok();
}
