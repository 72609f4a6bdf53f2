//! Camera handle for configured cameras without a device client.
//!
//! The device API client is plugged in by the deployment. Until then every
//! device call fails with [`CameraError::Unavailable`], which the handlers
//! turn into user-facing text, so the whole command path can be exercised in
//! dry-run mode.

use async_trait::async_trait;

use camerabot_shared::camera::{AlertStream, Camera, Snapshot};
use camerabot_shared::types::{CameraId, DetectionType, IrcutFilterType, MessageHandle};
use camerabot_shared::CameraError;

use crate::config::CameraSettings;

#[derive(Debug, Clone)]
pub struct DetachedCamera {
    settings: CameraSettings,
}

impl DetachedCamera {
    pub fn new(settings: CameraSettings) -> Self {
        Self { settings }
    }

    fn unavailable(&self) -> CameraError {
        CameraError::Unavailable(format!("no device client for camera {}", self.settings.id))
    }
}

#[async_trait]
impl Camera for DetachedCamera {
    fn id(&self) -> &CameraId {
        &self.settings.id
    }

    fn description(&self) -> &str {
        &self.settings.description
    }

    fn hashtag(&self) -> &str {
        &self.settings.hashtag
    }

    fn is_behind_relay(&self) -> bool {
        self.settings.behind_relay
    }

    fn snapshot_channel(&self) -> u32 {
        self.settings.snapshot_channel
    }

    fn snapshots_taken(&self) -> u64 {
        0
    }

    async fn take_snapshot(&self, _channel: u32, _resize: bool) -> Result<Snapshot, CameraError> {
        Err(self.unavailable())
    }

    async fn start_videogif_record(
        &self,
        _message: MessageHandle,
        _rewind: bool,
    ) -> Result<(), CameraError> {
        Err(self.unavailable())
    }

    async fn set_ircut_filter(&self, _filter_type: IrcutFilterType) -> Result<(), CameraError> {
        Err(self.unavailable())
    }

    async fn switch(
        &self,
        _trigger: DetectionType,
        _state: bool,
    ) -> Result<Option<String>, CameraError> {
        Err(self.unavailable())
    }

    async fn alert_stream(&self) -> Result<AlertStream, CameraError> {
        Err(self.unavailable())
    }
}
