//! Inbound commands and outbound results.
//!
//! Both sides are closed enums with one variant per kind, so every dispatch
//! over them is checked for exhaustiveness at compile time.

use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::camera::{CameraInfo, CameraRef};
use crate::types::{
    AlarmType, DetectionType, IrcutFilterType, MessageHandle, ServiceType, StreamType,
};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    pub cam: CameraRef,
    pub resize: bool,
    pub message: MessageHandle,
}

#[derive(Debug, Clone)]
pub struct RecordRequest {
    pub cam: CameraRef,
    /// Include the seconds buffered before the command arrived.
    pub rewind: bool,
    pub message: MessageHandle,
}

#[derive(Debug, Clone)]
pub struct DetectionConfRequest {
    pub cam: CameraRef,
    pub trigger: DetectionType,
    pub state: bool,
    pub message: MessageHandle,
}

#[derive(Debug, Clone)]
pub struct AlarmConfRequest {
    pub cam: CameraRef,
    pub service_type: ServiceType,
    pub service_name: AlarmType,
    pub state: bool,
    pub message: MessageHandle,
}

#[derive(Debug, Clone)]
pub struct StreamConfRequest {
    pub cam: CameraRef,
    pub service_type: ServiceType,
    pub stream_type: StreamType,
    pub state: bool,
    pub message: MessageHandle,
}

#[derive(Debug, Clone)]
pub struct IrcutConfRequest {
    pub cam: CameraRef,
    pub filter_type: IrcutFilterType,
    pub message: MessageHandle,
}

/// A command addressed to one camera.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    TakeSnapshot(SnapshotRequest),
    RecordVideoGif(RecordRequest),
    DetectionConf(DetectionConfRequest),
    AlarmConf(AlarmConfRequest),
    StreamConf(StreamConfRequest),
    IrcutConf(IrcutConfRequest),
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::TakeSnapshot(_) => "take_snapshot",
            InboundEvent::RecordVideoGif(_) => "record_videogif",
            InboundEvent::DetectionConf(_) => "detection_conf",
            InboundEvent::AlarmConf(_) => "alarm_conf",
            InboundEvent::StreamConf(_) => "stream_conf",
            InboundEvent::IrcutConf(_) => "ircut_conf",
        }
    }

    pub fn cam(&self) -> &CameraRef {
        match self {
            InboundEvent::TakeSnapshot(e) => &e.cam,
            InboundEvent::RecordVideoGif(e) => &e.cam,
            InboundEvent::DetectionConf(e) => &e.cam,
            InboundEvent::AlarmConf(e) => &e.cam,
            InboundEvent::StreamConf(e) => &e.cam,
            InboundEvent::IrcutConf(e) => &e.cam,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TextReply {
    pub text: String,
    pub message: Option<MessageHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotResult {
    pub cam: CameraInfo,
    pub img: Bytes,
    pub create_ts: DateTime<Utc>,
    pub taken_count: u64,
    pub resized: bool,
    pub file_size: usize,
    pub message: MessageHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfResult {
    pub cam: CameraInfo,
    pub trigger: DetectionType,
    pub state: bool,
    /// Informational text from the switch call, or the error it raised.
    pub text: Option<String>,
    pub message: MessageHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlarmConfResult {
    pub cam: CameraInfo,
    pub service_type: ServiceType,
    pub service_name: AlarmType,
    pub state: bool,
    pub text: Option<String>,
    pub message: MessageHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfResult {
    pub cam: CameraInfo,
    pub service_type: ServiceType,
    pub stream_type: StreamType,
    pub state: bool,
    pub text: Option<String>,
    pub message: MessageHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    Photo(Bytes),
    /// A video file on disk, such as a finished recording.
    Video(PathBuf),
}

/// Media produced outside a direct command reply, e.g. when a recording
/// started by an earlier command is ready.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaReply {
    pub cam: CameraInfo,
    pub media: Media,
    pub caption: String,
    pub message: Option<MessageHandle>,
}

/// Snapshot taken because the camera raised an alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSnapshot {
    pub cam: CameraInfo,
    pub img: Bytes,
    pub create_ts: DateTime<Utc>,
    pub alert_count: u64,
}

/// A result ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    SendText(TextReply),
    SendMedia(MediaReply),
    Snapshot(SnapshotResult),
    DetectionConf(DetectionConfResult),
    AlarmConf(AlarmConfResult),
    StreamConf(StreamConfResult),
    AlertSnapshot(AlertSnapshot),
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::SendText(_) => "send_text",
            OutboundEvent::SendMedia(_) => "send_media",
            OutboundEvent::Snapshot(_) => "snapshot",
            OutboundEvent::DetectionConf(_) => "detection_conf",
            OutboundEvent::AlarmConf(_) => "alarm_conf",
            OutboundEvent::StreamConf(_) => "stream_conf",
            OutboundEvent::AlertSnapshot(_) => "alert_snapshot",
        }
    }

    /// The message this event answers, if it answers one.
    pub fn message(&self) -> Option<MessageHandle> {
        match self {
            OutboundEvent::SendText(e) => e.message,
            OutboundEvent::SendMedia(e) => e.message,
            OutboundEvent::Snapshot(e) => Some(e.message),
            OutboundEvent::DetectionConf(e) => Some(e.message),
            OutboundEvent::AlarmConf(e) => Some(e.message),
            OutboundEvent::StreamConf(e) => Some(e.message),
            OutboundEvent::AlertSnapshot(_) => None,
        }
    }
}
