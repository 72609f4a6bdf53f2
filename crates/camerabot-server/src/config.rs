//! Bot configuration loaded from environment variables.
//!
//! Every setting has a default so the bot can start with zero configuration
//! in dry-run mode. Per-camera settings live in a JSON file pointed to by
//! `CAMERABOT_CAMERAS_FILE`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use camerabot_dvr::RetryPolicy;
use camerabot_engine::AlertConfig;
use camerabot_shared::constants::{
    RESULT_QUEUE_SIZE, UPLOAD_QUEUE_SIZE, UPLOAD_RETRY_ATTEMPTS, UPLOAD_RETRY_WAIT_SECS,
};
use camerabot_shared::types::CameraId;

use crate::error::ServerError;

/// Bot configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Directory where finished DVR recordings land.
    /// Env: `CAMERABOT_DVR_PATH`
    /// Default: `./dvr`
    pub dvr_path: PathBuf,

    /// Upload finished recordings to the Telegram group.
    /// Env: `CAMERABOT_UPLOAD_TELEGRAM` (true/false)
    /// Default: `true`
    pub upload_telegram: bool,

    /// Chat receiving DVR uploads.
    /// Env: `CAMERABOT_UPLOAD_GROUP_ID`
    /// Default: `0`
    pub upload_group_id: i64,

    /// Chats receiving alert snapshots.
    /// Env: `CAMERABOT_NOTIFY_CHATS` (comma separated)
    /// Default: none
    pub notify_chats: Vec<i64>,

    /// Env: `CAMERABOT_RESULT_QUEUE_SIZE`
    pub result_queue_size: usize,

    /// Env: `CAMERABOT_UPLOAD_QUEUE_SIZE`
    pub upload_queue_size: usize,

    /// Env: `CAMERABOT_UPLOAD_RETRY_WAIT_SECS`
    pub upload_retry_wait_secs: u64,

    /// Env: `CAMERABOT_UPLOAD_RETRY_ATTEMPTS`
    pub upload_retry_attempts: u32,

    /// JSON file with per-camera settings.
    /// Env: `CAMERABOT_CAMERAS_FILE`
    /// Default: none (no cameras).
    pub cameras_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dvr_path: PathBuf::from("./dvr"),
            upload_telegram: true,
            upload_group_id: 0,
            notify_chats: Vec::new(),
            result_queue_size: RESULT_QUEUE_SIZE,
            upload_queue_size: UPLOAD_QUEUE_SIZE,
            upload_retry_wait_secs: UPLOAD_RETRY_WAIT_SECS,
            upload_retry_attempts: UPLOAD_RETRY_ATTEMPTS,
            cameras_file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("CAMERABOT_DVR_PATH") {
            config.dvr_path = PathBuf::from(path);
        }

        if let Some(val) = lookup("CAMERABOT_UPLOAD_TELEGRAM") {
            config.upload_telegram = val != "false" && val != "0";
        }

        parse_into(&lookup, "CAMERABOT_UPLOAD_GROUP_ID", &mut config.upload_group_id);
        parse_into(&lookup, "CAMERABOT_RESULT_QUEUE_SIZE", &mut config.result_queue_size);
        parse_into(&lookup, "CAMERABOT_UPLOAD_QUEUE_SIZE", &mut config.upload_queue_size);
        parse_into(
            &lookup,
            "CAMERABOT_UPLOAD_RETRY_WAIT_SECS",
            &mut config.upload_retry_wait_secs,
        );
        parse_into(
            &lookup,
            "CAMERABOT_UPLOAD_RETRY_ATTEMPTS",
            &mut config.upload_retry_attempts,
        );

        if let Some(val) = lookup("CAMERABOT_NOTIFY_CHATS") {
            match parse_chat_list(&val) {
                Ok(chats) => config.notify_chats = chats,
                Err(bad) => warn!(
                    value = %bad,
                    "Invalid chat id in CAMERABOT_NOTIFY_CHATS, using default"
                ),
            }
        }

        if let Some(path) = lookup("CAMERABOT_CAMERAS_FILE") {
            if !path.is_empty() {
                config.cameras_file = Some(PathBuf::from(path));
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }

    pub fn upload_retry(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(self.upload_retry_wait_secs),
            self.upload_retry_attempts,
        )
    }

    /// Per-camera settings, or none when no cameras file is configured.
    pub fn load_cameras(&self) -> Result<Vec<CameraSettings>, ServerError> {
        match &self.cameras_file {
            Some(path) => CameraSettings::load(path),
            None => Ok(Vec::new()),
        }
    }
}

fn parse_into<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    if let Some(val) = lookup(key) {
        match val.trim().parse::<T>() {
            Ok(parsed) => *slot = parsed,
            Err(_) => warn!(key, value = %val, "Invalid value, using default"),
        }
    }
}

/// Parse `"-100123, 42"`. Returns the offending entry on failure.
fn parse_chat_list(val: &str) -> Result<Vec<i64>, String> {
    val.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.parse::<i64>().map_err(|_| entry.to_string()))
        .collect()
}

/// One camera entry of the cameras file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CameraSettings {
    pub id: CameraId,
    pub description: String,
    #[serde(default)]
    pub hashtag: String,
    /// Alarm start is a no-op for cameras reached through a relay.
    #[serde(default)]
    pub behind_relay: bool,
    #[serde(default = "default_snapshot_channel")]
    pub snapshot_channel: u32,
    #[serde(default)]
    pub alert: AlertConfig,
}

fn default_snapshot_channel() -> u32 {
    101
}

impl CameraSettings {
    pub fn load(path: &Path) -> Result<Vec<Self>, ServerError> {
        let raw = std::fs::read(path).map_err(|source| ServerError::CameraSettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| ServerError::CameraSettingsFormat {
            path: path.to_path_buf(),
            source,
        })
    }
}
