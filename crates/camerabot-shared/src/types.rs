use std::fmt;

use serde::{Deserialize, Serialize};

/// Camera identifier as it appears in configuration (e.g. `cam_1`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CameraId(pub String);

impl CameraId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to the chat message a command came from.
///
/// The core only carries it from inbound to outbound events so the delivery
/// side can reply in the right place; it is never interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    pub chat_id: i64,
    pub message_id: i64,
}

impl MessageHandle {
    pub fn new(chat_id: i64, message_id: i64) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

/// Detection triggers a camera can switch on and off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectionType {
    Motion,
    LineCrossing,
    Intrusion,
}

impl DetectionType {
    /// Every trigger, in the order alarm start enables them.
    pub const ALL: [DetectionType; 3] = [
        DetectionType::Motion,
        DetectionType::LineCrossing,
        DetectionType::Intrusion,
    ];

    /// Human-readable name used in logs and chat replies.
    pub fn full_name(&self) -> &'static str {
        match self {
            DetectionType::Motion => "Motion Detection",
            DetectionType::LineCrossing => "Line Crossing Detection",
            DetectionType::Intrusion => "Intrusion (Field) Detection",
        }
    }
}

impl fmt::Display for DetectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Alarm,
    Stream,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceType::Alarm => f.write_str("alarm"),
            ServiceType::Stream => f.write_str("stream"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlarmType {
    Alarm,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    Dvr,
    Youtube,
    Telegram,
    Icecast,
    Srs,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Dvr => "dvr",
            StreamType::Youtube => "youtube",
            StreamType::Telegram => "telegram",
            StreamType::Icecast => "icecast",
            StreamType::Srs => "srs",
        }
    }
}

/// Name of a service within its [`ServiceType`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceName {
    Alarm(AlarmType),
    Stream(StreamType),
}

impl ServiceName {
    pub fn service_type(&self) -> ServiceType {
        match self {
            ServiceName::Alarm(_) => ServiceType::Alarm,
            ServiceName::Stream(_) => ServiceType::Stream,
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceName::Alarm(AlarmType::Alarm) => f.write_str("alarm"),
            ServiceName::Stream(stream) => f.write_str(stream.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IrcutFilterType {
    Day,
    Night,
    Auto,
}

impl IrcutFilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrcutFilterType::Day => "day",
            IrcutFilterType::Night => "night",
            IrcutFilterType::Auto => "auto",
        }
    }
}

/// Destinations a finished DVR recording can be uploaded to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DvrUploadType {
    Telegram,
}

impl fmt::Display for DvrUploadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DvrUploadType::Telegram => f.write_str("telegram"),
        }
    }
}
