use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use camerabot_shared::DvrError;

#[async_trait]
pub trait Thumbnailer: Send + Sync {
    /// Render a still of `input` into `output`.
    async fn make_thumbnail(&self, output: &Path, input: &Path) -> Result<(), DvrError>;
}

/// Grabs the first frame with `ffmpeg`, scaled to a chat-friendly width.
#[derive(Debug, Clone)]
pub struct FfmpegThumbnailer {
    binary: PathBuf,
    width: u32,
    timeout: Duration,
}

impl Default for FfmpegThumbnailer {
    fn default() -> Self {
        Self::new("ffmpeg", 320, Duration::from_secs(30))
    }
}

impl FfmpegThumbnailer {
    pub fn new(binary: impl Into<PathBuf>, width: u32, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            width,
            timeout,
        }
    }
}

#[async_trait]
impl Thumbnailer for FfmpegThumbnailer {
    async fn make_thumbnail(&self, output: &Path, input: &Path) -> Result<(), DvrError> {
        let child = Command::new(&self.binary)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-vframes", "1", "-vf"])
            .arg(format!("scale={}:-1", self.width))
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DvrError::Thumbnail(format!("ffmpeg timed out on {}", input.display())))??;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DvrError::Thumbnail(format!("ffmpeg failed: {}", stderr.trim())));
        }
        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(DvrError::Thumbnail(format!(
                "ffmpeg did not produce {}",
                output.display()
            )));
        }
        Ok(())
    }
}
