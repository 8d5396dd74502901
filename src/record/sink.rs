use crate::foundation::core::{Fps, FrameIndex, FrameRgba};
use crate::foundation::error::PromptResult;
use std::path::PathBuf;

/// Configuration handed to a [`FrameSink`] when a recording starts.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Recorded width in pixels.
    pub width: u32,
    /// Recorded height in pixels.
    pub height: u32,
    /// Recording frames-per-second.
    pub fps: Fps,
    /// Optional external raw PCM audio file input.
    pub audio: Option<AudioInput>,
}

/// Raw PCM audio input for sinks that mux audio.
#[derive(Debug, Clone)]
pub struct AudioInput {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Sink contract for consuming composited frames in capture order.
///
/// Ordering contract: `push_frame` is called in strictly increasing
/// `FrameIndex` order between `begin` and `end`.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> PromptResult<()>;
    /// Push one frame in strictly increasing capture order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> PromptResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> PromptResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    /// Frames in capture order.
    frames: Vec<(FrameIndex, FrameRgba)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRgba)] {
        &self.frames
    }

    /// Whether `end` has been observed.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> PromptResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRgba) -> PromptResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> PromptResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::SurfaceSize;

    #[test]
    fn in_memory_sink_keeps_order_and_config() {
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig {
            width: 2,
            height: 2,
            fps: Fps::new(30, 1).unwrap(),
            audio: None,
        })
        .unwrap();

        let frame = FrameRgba::new_black(SurfaceSize::new(2, 2).unwrap());
        sink.push_frame(FrameIndex(0), &frame).unwrap();
        sink.push_frame(FrameIndex(1), &frame).unwrap();
        sink.end().unwrap();

        assert_eq!(sink.frames().len(), 2);
        assert_eq!(sink.frames()[1].0, FrameIndex(1));
        assert!(sink.is_ended());
        assert_eq!(sink.config().map(|c| c.width), Some(2));
    }
}
