//! # camerabot-dvr
//!
//! Recorded video segments and their delivery: the [`DvrFile`] entity with
//! its lock count, ffprobe/ffmpeg collaborators, and per-destination upload
//! queues drained by retrying workers.

pub mod file;
pub mod probe;
pub mod retry;
pub mod thumbnail;
pub mod upload;

pub use file::DvrFile;
pub use probe::{FfprobeProber, MediaProber, ProbeContext, VideoMetadata};
pub use retry::RetryPolicy;
pub use thumbnail::{FfmpegThumbnailer, Thumbnailer};
pub use upload::{
    upload_pipeline, DvrUploadEngine, DvrUploadQueue, DvrUploadWorker, DvrUploader,
    TelegramDvrUploader,
};
