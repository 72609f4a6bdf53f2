use std::path::PathBuf;

use thiserror::Error;

use crate::types::{CameraId, ServiceName, ServiceType};

/// Device or network failure reported by the camera control API.
///
/// These are expected in normal operation and are surfaced to users as text
/// or retried, never treated as defects.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Camera request timed out")]
    Timeout,

    #[error("Camera unavailable: {0}")]
    Unavailable(String),
}

/// Invalid service state transition or a failed trigger switch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0} already started")]
    AlreadyStarted(String),

    #[error("{0} already stopped")]
    AlreadyStopped(String),

    #[error("{0}")]
    TriggerSwitch(String),

    #[error("Service {service_type}/{service_name} is not registered for camera {camera}")]
    NotRegistered {
        camera: CameraId,
        service_type: ServiceType,
        service_name: ServiceName,
    },
}

/// Errors around recorded DVR files.
#[derive(Error, Debug)]
pub enum DvrError {
    /// Construction with a non-positive lock count. Always a caller bug.
    #[error("Lock count cannot be lower or equal 0, got {0}")]
    InvalidLockCount(i64),

    #[error("File {0} does not exist")]
    NotFound(PathBuf),

    #[error("File {0} is broken")]
    Broken(PathBuf),

    #[error("File {0} is empty")]
    Empty(PathBuf),

    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Thumbnail failed: {0}")]
    Thumbnail(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the chat delivery collaborator.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat request failed: {0}")]
    Request(String),
}

/// Whatever a task handler lets propagate past its own error handling.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Result channel closed")]
    ResultChannelClosed,
}
