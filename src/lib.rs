//! focusprompt is an RSVP teleprompter engine.
//!
//! It paces one word at a time from a script on a punctuation-aware
//! words-per-minute clock, highlights the Optimal Recognition Point (ORP)
//! of each word, composites the current word onto live camera frames, and
//! records the composited frames plus microphone audio into a local video
//! file through the system `ffmpeg`.
#![forbid(unsafe_code)]

pub mod capture;
pub mod config;
pub mod foundation;
pub mod pacing;
pub mod record;
pub mod render;
pub mod script;
pub mod session;

pub use crate::capture::ffmpeg::{AudioCapture, FfmpegCamera, FileSource};
pub use crate::capture::source::{CameraSession, CaptureConstraints, TestPatternSource, VideoSource};
pub use crate::config::{PrompterConfig, Theme};
pub use crate::foundation::core::{Fps, FrameIndex, FrameRgba, SurfaceSize};
pub use crate::foundation::error::{PromptError, PromptResult};
pub use crate::pacing::engine::{PacingEngine, PacingEvent, PacingState};
pub use crate::record::encoder::{
    FfmpegRecorder, FfmpegRecorderOpts, RecordingArtifact, RecordingFormat, mux_audio,
    pick_recording_format, select_format,
};
pub use crate::record::sink::{AudioInput, FrameSink, InMemorySink, SinkConfig};
pub use crate::render::compositor::{Compositor, CompositorOpts, FrameComposer};
pub use crate::script::orp::{FocusSplit, focus_index};
pub use crate::script::tokenize::{Token, tokenize};
pub use crate::session::coordinator::{CameraState, Coordinator, Key};
pub use crate::session::enhance::{NoopEnhancer, ScriptEnhancer, enhance_or_keep};
