pub mod ffmpeg;
pub mod source;
