//! Session correlation: fingerprint records, the registry and its fuzzy
//! matching, and transcoder argument rewriting

pub mod ffmpeg;
pub mod manager;
pub mod record;
pub mod registry;

pub use ffmpeg::{FfmpegRewriter, ParsedFfmpeg, RewriteError};
pub use manager::SessionsManager;
pub use record::{SessionKey, SessionQuery, SessionRecord};
pub use registry::{SessionRegistry, Upsert};
