pub mod ffmpeg;
pub mod sessions;
