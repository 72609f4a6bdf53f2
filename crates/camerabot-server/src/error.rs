use std::path::PathBuf;

use thiserror::Error;

use camerabot_shared::types::CameraId;
use camerabot_shared::DvrError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Cannot read camera settings from {path}: {source}")]
    CameraSettingsIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid camera settings in {path}: {source}")]
    CameraSettingsFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Camera {0} is not registered")]
    UnknownCamera(CameraId),

    #[error("DVR error: {0}")]
    Dvr(#[from] DvrError),
}
