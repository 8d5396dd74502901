use crate::foundation::core::{Fps, FrameRgba, SurfaceSize};
use crate::foundation::error::{PromptError, PromptResult};

/// Requested capture geometry and cadence. The device may deliver a
/// different geometry; callers read the actual size off the opened source.
#[derive(Clone, Copy, Debug)]
pub struct CaptureConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub fps: Fps,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1920,
            ideal_height: 1080,
            fps: Fps { num: 30, den: 1 },
        }
    }
}

impl CaptureConstraints {
    pub fn validate(&self) -> PromptResult<()> {
        if self.ideal_width == 0 || self.ideal_height == 0 {
            return Err(PromptError::validation(
                "capture width/height must be non-zero",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(PromptError::validation("capture fps must be non-zero"));
        }
        Ok(())
    }
}

/// A live or file-backed stream of RGBA8 frames.
pub trait VideoSource: Send {
    /// Delivered frame geometry, fixed for the life of the source.
    fn size(&self) -> SurfaceSize;
    /// Delivered frame cadence.
    fn fps(&self) -> Fps;
    /// Read the next frame into `frame`, which must match `size()`.
    ///
    /// Returns `Ok(false)` when the stream has ended.
    fn read_frame(&mut self, frame: &mut FrameRgba) -> PromptResult<bool>;
}

/// Exclusive ownership of an open video source for the life of a session.
///
/// `deactivate` drops the source (killing any decoder child process) and
/// is idempotent; dropping the session releases the source as well, so
/// every exit path covers the release.
pub struct CameraSession {
    source: Option<Box<dyn VideoSource>>,
    size: SurfaceSize,
    fps: Fps,
}

impl CameraSession {
    pub fn new(source: Box<dyn VideoSource>) -> Self {
        let size = source.size();
        let fps = source.fps();
        Self {
            source: Some(source),
            size,
            fps,
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    /// Read the next frame. Returns `Ok(false)` once the stream has ended
    /// or the session was deactivated.
    pub fn read_frame(&mut self, frame: &mut FrameRgba) -> PromptResult<bool> {
        match self.source.as_mut() {
            Some(source) => source.read_frame(frame),
            None => Ok(false),
        }
    }

    /// Release the source. Safe to call any number of times.
    pub fn deactivate(&mut self) {
        if self.source.take().is_some() {
            tracing::debug!("camera session released");
        }
    }
}

/// Synthetic source producing a moving two-tone pattern. Used by tests and
/// by the CLI when no camera is present.
pub struct TestPatternSource {
    size: SurfaceSize,
    fps: Fps,
    tick: u64,
    frames_remaining: Option<u64>,
}

impl TestPatternSource {
    pub fn new(size: SurfaceSize, fps: Fps) -> Self {
        Self {
            size,
            fps,
            tick: 0,
            frames_remaining: None,
        }
    }

    /// Limit the source to `n` frames, after which it reports end-of-stream.
    pub fn with_frame_limit(mut self, n: u64) -> Self {
        self.frames_remaining = Some(n);
        self
    }
}

impl VideoSource for TestPatternSource {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fps(&self) -> Fps {
        self.fps
    }

    fn read_frame(&mut self, frame: &mut FrameRgba) -> PromptResult<bool> {
        if frame.size() != self.size {
            return Err(PromptError::capture(
                "test pattern frame buffer has wrong geometry",
            ));
        }
        if let Some(remaining) = self.frames_remaining.as_mut() {
            if *remaining == 0 {
                return Ok(false);
            }
            *remaining -= 1;
        }

        let w = self.size.width as usize;
        let phase = (self.tick % 255) as u8;
        for (i, px) in frame.data.chunks_exact_mut(4).enumerate() {
            let x = i % w;
            let y = i / w;
            let band = ((x / 16 + y / 16) % 2) as u8;
            px[0] = phase.wrapping_add(band * 96);
            px[1] = 64 + band * 64;
            px[2] = 255 - phase;
            px[3] = 255;
        }
        self.tick += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraints_validation() {
        CaptureConstraints::default().validate().unwrap();
        let bad = CaptureConstraints {
            ideal_width: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_pattern_respects_frame_limit() {
        let size = SurfaceSize::new(32, 32).unwrap();
        let mut src = TestPatternSource::new(size, Fps { num: 30, den: 1 }).with_frame_limit(2);
        let mut frame = FrameRgba::new_black(size);
        assert!(src.read_frame(&mut frame).unwrap());
        assert!(src.read_frame(&mut frame).unwrap());
        assert!(!src.read_frame(&mut frame).unwrap());
    }

    #[test]
    fn test_pattern_frames_are_opaque_and_change() {
        let size = SurfaceSize::new(32, 32).unwrap();
        let mut src = TestPatternSource::new(size, Fps { num: 30, den: 1 });
        let mut a = FrameRgba::new_black(size);
        let mut b = FrameRgba::new_black(size);
        src.read_frame(&mut a).unwrap();
        src.read_frame(&mut b).unwrap();
        assert!(a.data.chunks_exact(4).all(|px| px[3] == 255));
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn camera_session_deactivate_is_idempotent() {
        let size = SurfaceSize::new(16, 16).unwrap();
        let source = TestPatternSource::new(size, Fps { num: 30, den: 1 });
        let mut session = CameraSession::new(Box::new(source));
        assert!(session.is_active());

        let mut frame = FrameRgba::new_black(size);
        assert!(session.read_frame(&mut frame).unwrap());

        session.deactivate();
        session.deactivate();
        assert!(!session.is_active());
        assert!(!session.read_frame(&mut frame).unwrap());
    }

    #[test]
    fn test_pattern_rejects_mismatched_buffer() {
        let mut src = TestPatternSource::new(
            SurfaceSize::new(32, 32).unwrap(),
            Fps { num: 30, den: 1 },
        );
        let mut frame = FrameRgba::new_black(SurfaceSize::new(16, 16).unwrap());
        assert!(src.read_frame(&mut frame).is_err());
    }
}
