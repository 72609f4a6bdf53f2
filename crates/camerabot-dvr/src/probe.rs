//! Media probing.
//!
//! [`FfprobeProber`] shells out to `ffprobe` and parses its JSON report. Only
//! the pieces the upload step needs are modelled; everything else in the
//! report is ignored.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use camerabot_shared::DvrError;

/// Parsed `ffprobe -show_format -show_streams` output.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProbeContext {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    pub format: Option<ProbeFormat>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProbeStream {
    pub codec_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProbeFormat {
    /// Seconds, as the decimal string ffprobe prints.
    pub duration: Option<String>,
}

/// Metadata attached to a video upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMetadata {
    /// Whole seconds, truncated.
    pub duration: u32,
    pub width: u32,
    pub height: u32,
}

impl ProbeContext {
    /// Duration plus the first video stream's dimensions.
    pub fn video_metadata(&self) -> Result<VideoMetadata, DvrError> {
        let raw = self
            .format
            .as_ref()
            .and_then(|format| format.duration.as_deref())
            .ok_or_else(|| DvrError::Probe("missing format duration".to_string()))?;
        let seconds: f64 = raw
            .trim()
            .parse()
            .map_err(|_| DvrError::Probe(format!("invalid duration {raw:?}")))?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(DvrError::Probe(format!("invalid duration {raw:?}")));
        }

        let video = self
            .streams
            .iter()
            .find(|stream| stream.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| DvrError::Probe("no video stream".to_string()))?;
        let (Some(width), Some(height)) = (video.width, video.height) else {
            return Err(DvrError::Probe("video stream without dimensions".to_string()));
        };

        Ok(VideoMetadata {
            duration: seconds.trunc() as u32,
            width,
            height,
        })
    }
}

#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Probe a media file. `Ok(None)` means the prober produced no report.
    async fn probe(&self, path: &Path) -> Result<Option<ProbeContext>, DvrError>;
}

/// Runs the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: PathBuf,
    timeout: Duration,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe", Duration::from_secs(30))
    }
}

impl FfprobeProber {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<Option<ProbeContext>, DvrError> {
        let child = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DvrError::Probe(format!("ffprobe timed out on {}", path.display())))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DvrError::Probe(format!("ffprobe failed: {}", stderr.trim())));
        }
        if output.stdout.is_empty() {
            return Ok(None);
        }

        let context: ProbeContext = serde_json::from_slice(&output.stdout)
            .map_err(|e| DvrError::Probe(format!("unreadable ffprobe output: {e}")))?;
        Ok(Some(context))
    }
}
