//! Camera control collaborator.
//!
//! The camera itself (HTTP control API, stream plumbing, configuration) lives
//! outside the core. Everything the core needs from a camera goes through the
//! [`Camera`] trait, and cameras are shared as [`CameraRef`] handles that the
//! core never creates or destroys.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::types::{CameraId, DetectionType, IrcutFilterType, MessageHandle};

/// Shared handle to an externally owned camera.
pub type CameraRef = Arc<dyn Camera>;

/// Raw chunks of the camera's alert stream.
pub type AlertStream = BoxStream<'static, Result<String, CameraError>>;

/// A single captured frame.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub image: Bytes,
    pub created_at: DateTime<Utc>,
}

/// Identity of a camera, detached from the live handle so it can travel
/// inside outbound events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CameraInfo {
    pub id: CameraId,
    pub description: String,
    pub hashtag: String,
}

#[async_trait]
pub trait Camera: Send + Sync + fmt::Debug {
    fn id(&self) -> &CameraId;

    fn description(&self) -> &str;

    /// Hashtag appended to captions so chat history can be filtered by camera.
    fn hashtag(&self) -> &str;

    /// Cameras behind an aggregating relay (NVR) do not run their own alarm
    /// monitoring.
    fn is_behind_relay(&self) -> bool;

    /// Channel used for on-demand snapshots.
    fn snapshot_channel(&self) -> u32;

    /// Running count of snapshots taken through this camera.
    fn snapshots_taken(&self) -> u64;

    async fn take_snapshot(&self, channel: u32, resize: bool) -> Result<Snapshot, CameraError>;

    async fn start_videogif_record(
        &self,
        message: MessageHandle,
        rewind: bool,
    ) -> Result<(), CameraError>;

    async fn set_ircut_filter(&self, filter_type: IrcutFilterType) -> Result<(), CameraError>;

    /// Enable or disable a detection trigger. Returns the device's
    /// informational text, if any.
    async fn switch(
        &self,
        trigger: DetectionType,
        state: bool,
    ) -> Result<Option<String>, CameraError>;

    /// Open the camera's alert stream.
    async fn alert_stream(&self) -> Result<AlertStream, CameraError>;

    fn info(&self) -> CameraInfo {
        CameraInfo {
            id: self.id().clone(),
            description: self.description().to_string(),
            hashtag: self.hashtag().to_string(),
        }
    }
}
