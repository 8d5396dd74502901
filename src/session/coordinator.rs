use crate::capture::source::{CameraSession, VideoSource};
use crate::foundation::core::{FrameIndex, FrameRgba};
use crate::foundation::error::{PromptError, PromptResult};
use crate::pacing::engine::{PacingEngine, PacingState};
use crate::record::sink::{AudioInput, FrameSink, SinkConfig};
use crate::render::compositor::FrameComposer;
use crate::session::enhance::{ScriptEnhancer, enhance_or_keep};
use std::time::Instant;

/// Camera/recording lifecycle, nested around the pacing state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraState {
    CameraOff,
    CameraOn,
    Recording,
}

/// Operator key surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// Toggle play/pause.
    Space,
    /// Seek one token back.
    Left,
    /// Seek one token forward.
    Right,
    /// Raise the rate by 10 wpm.
    Up,
    /// Lower the rate by 10 wpm.
    Down,
    /// Full teardown.
    Escape,
}

/// Owns the pacing engine, the compositor, the camera session, and an
/// optional recording sink, and sequences their lifecycles.
///
/// `S` is the recording sink type; production uses `FfmpegRecorder`,
/// tests use `InMemorySink`.
pub struct Coordinator<S: FrameSink> {
    engine: PacingEngine,
    compositor: Box<dyn FrameComposer>,

    camera: Option<CameraSession>,
    audio: Option<AudioInput>,
    /// Camera-sized read buffer.
    scratch: Option<FrameRgba>,
    /// Composited render surface, camera-native geometry.
    surface: Option<FrameRgba>,

    recorder: Option<S>,
    next_frame: u64,
    /// Sink finalized by an automatic stop (pacing finished, teardown),
    /// held for the caller to collect.
    finished_recording: Option<S>,
}

impl<S: FrameSink> Coordinator<S> {
    pub fn new(engine: PacingEngine, compositor: Box<dyn FrameComposer>) -> Self {
        Self {
            engine,
            compositor,
            camera: None,
            audio: None,
            scratch: None,
            surface: None,
            recorder: None,
            next_frame: 0,
            finished_recording: None,
        }
    }

    pub fn camera_state(&self) -> CameraState {
        if self.recorder.is_some() {
            CameraState::Recording
        } else if self.camera.is_some() {
            CameraState::CameraOn
        } else {
            CameraState::CameraOff
        }
    }

    pub fn engine(&self) -> &PacingEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PacingEngine {
        &mut self.engine
    }

    /// The last composited frame, for preview/snapshot consumers.
    pub fn surface(&self) -> Option<&FrameRgba> {
        self.surface.as_ref()
    }

    /// Take the sink of a recording that was stopped automatically.
    pub fn take_finished_recording(&mut self) -> Option<S> {
        self.finished_recording.take()
    }

    /// Bring a camera online and size the render surface to its native
    /// geometry. Fails without touching state when a camera is already
    /// active.
    pub fn activate_camera(
        &mut self,
        source: Box<dyn VideoSource>,
        audio: Option<AudioInput>,
    ) -> PromptResult<()> {
        if self.camera.is_some() {
            return Err(PromptError::capture("camera is already active"));
        }
        let session = CameraSession::new(source);
        let size = session.size();
        self.scratch = Some(FrameRgba::new_black(size));
        self.surface = Some(FrameRgba::new_black(size));
        self.camera = Some(session);
        self.audio = audio;
        tracing::debug!(width = size.width, height = size.height, "camera activated");
        Ok(())
    }

    /// Stop any recording, drop the render surface, release the camera —
    /// in that order. Idempotent: a second call is a clean no-op.
    ///
    /// The camera and the surfaces are released even when finalizing the
    /// recording fails; that error is returned after the teardown has
    /// run to completion.
    pub fn deactivate_camera(&mut self) -> PromptResult<()> {
        let stop_result = if self.recorder.is_some() {
            self.finish_recording()
        } else {
            Ok(())
        };
        self.scratch = None;
        self.surface = None;
        self.audio = None;
        if let Some(mut session) = self.camera.take() {
            session.deactivate();
        }
        stop_result
    }

    /// Start recording into `sink`. A no-op without an active camera or
    /// while already recording. Pacing is started if it is not running so
    /// the first captured frames carry the overlay.
    pub fn start_recording(&mut self, mut sink: S, now: Instant) -> PromptResult<()> {
        let Some(camera) = self.camera.as_ref() else {
            tracing::warn!("recording requested without an active camera; ignored");
            return Ok(());
        };
        if self.recorder.is_some() {
            tracing::warn!("recording already in progress; ignored");
            return Ok(());
        }

        let size = camera.size();
        sink.begin(SinkConfig {
            width: size.width,
            height: size.height,
            fps: camera.fps(),
            audio: self.audio.clone(),
        })?;
        self.recorder = Some(sink);
        self.next_frame = 0;
        self.finished_recording = None;

        if !self.engine.is_running() {
            self.engine.play(now);
        }
        Ok(())
    }

    /// Stop and finalize the active recording, returning its sink. A
    /// no-op returning `None` when not recording.
    pub fn stop_recording(&mut self) -> PromptResult<Option<S>> {
        let Some(mut sink) = self.recorder.take() else {
            return Ok(None);
        };
        sink.end()?;
        Ok(Some(sink))
    }

    fn finish_recording(&mut self) -> PromptResult<()> {
        if let Some(sink) = self.stop_recording()? {
            self.finished_recording = Some(sink);
        }
        Ok(())
    }

    /// One pass of the render loop: poll pacing, read a camera frame,
    /// composite the token currently under the cursor, and feed the
    /// recorder while recording.
    ///
    /// Returns `Ok(false)` once the camera stream has ended (the session
    /// is then fully deactivated).
    pub fn render_tick(&mut self, now: Instant) -> PromptResult<bool> {
        self.engine.poll(now);
        // Covers both the deadline elapsing this tick and an engine that
        // was already finished when recording started (empty script, or a
        // restart after the script ran out): captured frames are
        // finalized, the camera stays live.
        if self.recorder.is_some() && self.engine.state() == PacingState::Finished {
            self.finish_recording()?;
        }

        let Some(camera) = self.camera.as_mut() else {
            return Ok(false);
        };
        let scratch = self
            .scratch
            .as_mut()
            .ok_or_else(|| PromptError::capture("camera active without a read buffer"))?;
        if !camera.read_frame(scratch)? {
            tracing::debug!("camera stream ended");
            self.deactivate_camera()?;
            return Ok(false);
        }

        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| PromptError::capture("camera active without a render surface"))?;
        // The token is read fresh from the engine each tick, so a seek or
        // advance between ticks is always reflected in the next frame.
        self.compositor.composite(
            scratch,
            surface,
            self.engine.current_token(),
            self.engine.is_running(),
        )?;

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.push_frame(FrameIndex(self.next_frame), surface)?;
            self.next_frame += 1;
        }
        Ok(true)
    }

    /// Replace the script through the enhancement collaborator. On any
    /// enhancer failure the original text is kept; either way the engine
    /// rewinds to the start.
    pub fn replace_script(&mut self, enhancer: &dyn ScriptEnhancer, script: &str) {
        let text = enhance_or_keep(enhancer, script);
        self.engine.load_script(&text);
    }

    pub fn handle_key(&mut self, key: Key, now: Instant) -> PromptResult<()> {
        match key {
            Key::Space => self.engine.toggle(now),
            Key::Left => self.engine.seek(-1, now),
            Key::Right => self.engine.seek(1, now),
            Key::Up => self.engine.adjust_rate(10),
            Key::Down => self.engine.adjust_rate(-10),
            Key::Escape => self.deactivate_camera()?,
        }
        Ok(())
    }
}
