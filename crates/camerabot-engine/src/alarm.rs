//! Alarm (detection) service.
//!
//! A two-state machine per camera. Starting enables every detection trigger
//! marked enabled in configuration and spawns the alert monitoring task;
//! stopping only clears the started flag, and the monitoring task exits on
//! its own once it notices.
//!
//! Start and stop are serialized per service by an async transition lock, so
//! two concurrent starts cannot both pass the started check while trigger
//! switching is in flight.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use camerabot_shared::constants::{ALERT_DELAY_SECS, ALERT_RECONNECT_SECS};
use camerabot_shared::types::{AlarmType, CameraId, DetectionType, ServiceName, ServiceType};
use camerabot_shared::{CameraRef, ServiceError};

use crate::monitor;
use crate::queue::ResultQueue;
use crate::service::Service;
use crate::task::spawn_named;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectionConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Per-camera alert settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertConfig {
    /// Minimum seconds between two alert notifications.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    #[serde(default)]
    pub motion: DetectionConfig,

    #[serde(default)]
    pub line_crossing: DetectionConfig,

    #[serde(default)]
    pub intrusion: DetectionConfig,
}

fn default_delay_secs() -> u64 {
    ALERT_DELAY_SECS
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            delay_secs: ALERT_DELAY_SECS,
            motion: DetectionConfig::default(),
            line_crossing: DetectionConfig::default(),
            intrusion: DetectionConfig::default(),
        }
    }
}

impl AlertConfig {
    pub fn detection(&self, trigger: DetectionType) -> &DetectionConfig {
        match trigger {
            DetectionType::Motion => &self.motion,
            DetectionType::LineCrossing => &self.line_crossing,
            DetectionType::Intrusion => &self.intrusion,
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Handle to a running monitoring task.
struct MonitorHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

pub struct AlarmService {
    me: Weak<AlarmService>,
    cam: CameraRef,
    conf: AlertConfig,
    result_queue: ResultQueue,
    reconnect_interval: Duration,
    started: AtomicBool,
    alert_count: AtomicU64,
    transition: Mutex<()>,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl AlarmService {
    pub fn new(cam: CameraRef, conf: AlertConfig, result_queue: ResultQueue) -> Arc<Self> {
        Self::with_reconnect_interval(
            cam,
            conf,
            result_queue,
            Duration::from_secs(ALERT_RECONNECT_SECS),
        )
    }

    pub fn with_reconnect_interval(
        cam: CameraRef,
        conf: AlertConfig,
        result_queue: ResultQueue,
        reconnect_interval: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            cam,
            conf,
            result_queue,
            reconnect_interval,
            started: AtomicBool::new(false),
            alert_count: AtomicU64::new(0),
            transition: Mutex::new(()),
            monitor: Mutex::new(None),
        })
    }

    pub fn camera_id(&self) -> &CameraId {
        self.cam.id()
    }

    pub fn cam(&self) -> &CameraRef {
        &self.cam
    }

    pub fn result_queue(&self) -> &ResultQueue {
        &self.result_queue
    }

    pub fn alert_delay(&self) -> Duration {
        Duration::from_secs(self.conf.delay_secs)
    }

    pub fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    pub fn alert_count(&self) -> u64 {
        self.alert_count.load(Ordering::SeqCst)
    }

    /// Record one observed alert and return the new total.
    pub fn increase_alert_count(&self) -> u64 {
        self.alert_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// True when any detection trigger is enabled in configuration.
    pub fn enabled_in_config(&self) -> bool {
        DetectionType::ALL
            .iter()
            .any(|trigger| self.conf.detection(*trigger).enabled)
    }

    /// Switch a detection trigger on the camera.
    ///
    /// Always calls the device. Device errors are logged and returned as
    /// [`ServiceError::TriggerSwitch`].
    pub async fn trigger_switch(
        &self,
        trigger: DetectionType,
        state: bool,
    ) -> Result<Option<String>, ServiceError> {
        let full_name = trigger.full_name();
        debug!(
            camera = %self.cam.id(),
            "{} {}",
            if state { "Enabling" } else { "Disabling" },
            full_name
        );

        self.cam.switch(trigger, state).await.map_err(|err| {
            let msg = format!("{full_name} Switch encountered an error: {err}");
            error!(camera = %self.cam.id(), "{}", msg);
            ServiceError::TriggerSwitch(msg)
        })
    }

    async fn enable_triggers_on_camera(&self) -> Result<(), ServiceError> {
        for trigger in DetectionType::ALL {
            if self.conf.detection(trigger).enabled {
                self.trigger_switch(trigger, true).await?;
            }
        }
        Ok(())
    }

    async fn start_monitoring_task(&self) {
        let Some(service) = self.me.upgrade() else {
            return;
        };

        let cancel = CancellationToken::new();
        let task_name = format!("AlarmMonitoringTask_{}", self.cam.id());
        let join = spawn_named(task_name, monitor::run(service, cancel.clone()));

        let mut slot = self.monitor.lock().await;
        // A task left over from an earlier start is already logically stopped.
        if let Some(previous) = slot.replace(MonitorHandle { cancel, join }) {
            previous.cancel.cancel();
        }
    }

    /// True when no monitoring task is running.
    #[cfg(test)]
    pub(crate) async fn monitor_finished(&self) -> bool {
        self.monitor
            .lock()
            .await
            .as_ref()
            .map_or(true, |handle| handle.join.is_finished())
    }

    /// Cancel the monitoring task, if any, and wait for it to finish.
    pub async fn shutdown(&self) {
        let handle = self.monitor.lock().await.take();
        if let Some(handle) = handle {
            handle.cancel.cancel();
            let _ = handle.join.await;
            debug!(camera = %self.cam.id(), "Alarm monitoring task shut down");
        }
    }
}

#[async_trait]
impl Service for AlarmService {
    fn service_type(&self) -> ServiceType {
        ServiceType::Alarm
    }

    fn name(&self) -> ServiceName {
        ServiceName::Alarm(AlarmType::Alarm)
    }

    fn started(&self) -> bool {
        self.is_started()
    }

    async fn start(&self) -> Result<(), ServiceError> {
        if self.cam.is_behind_relay() {
            info!(
                camera = %self.cam.id(),
                "Do not start Alarm Service - camera is behind relay"
            );
            return Ok(());
        }

        let _guard = self.transition.lock().await;
        if self.is_started() {
            return Err(ServiceError::AlreadyStarted(
                "Alarm (alert) mode".to_string(),
            ));
        }

        self.enable_triggers_on_camera().await?;
        self.started.store(true, Ordering::SeqCst);
        self.start_monitoring_task().await;

        info!(camera = %self.cam.id(), "Alarm service started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        let _guard = self.transition.lock().await;
        if !self.is_started() {
            return Err(ServiceError::AlreadyStopped("Alarm alert mode".to_string()));
        }

        self.started.store(false, Ordering::SeqCst);
        info!(camera = %self.cam.id(), "Alarm service stopped");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use bytes::Bytes;
    use camerabot_shared::camera::{AlertStream, Camera, Snapshot};
    use camerabot_shared::types::{IrcutFilterType, MessageHandle};
    use camerabot_shared::CameraError;
    use chrono::Utc;
    use futures::{stream, StreamExt};
    use tokio::sync::mpsc;

    use crate::queue::result_channel;

    /// Camera double shared by the engine tests.
    #[derive(Debug)]
    pub(crate) struct FakeCamera {
        pub id: CameraId,
        pub behind_relay: bool,
        pub fail_snapshot: bool,
        /// Number of upcoming snapshots that fail before they succeed again.
        pub snapshot_failures: AtomicU64,
        pub fail_switch: bool,
        pub fail_ircut: bool,
        pub switch_reply: Option<String>,
        pub switches: StdMutex<Vec<(DetectionType, bool)>>,
        pub records: StdMutex<Vec<bool>>,
        pub ircut: StdMutex<Vec<IrcutFilterType>>,
        pub snapshots: AtomicU64,
        /// Alert streams handed out in order; an empty queue yields a pending stream.
        pub alert_streams: StdMutex<Vec<mpsc::Receiver<Result<String, CameraError>>>>,
    }

    impl FakeCamera {
        pub fn new(id: &str) -> Self {
            Self {
                id: CameraId::new(id),
                behind_relay: false,
                fail_snapshot: false,
                snapshot_failures: AtomicU64::new(0),
                fail_switch: false,
                fail_ircut: false,
                switch_reply: None,
                switches: StdMutex::new(Vec::new()),
                records: StdMutex::new(Vec::new()),
                ircut: StdMutex::new(Vec::new()),
                snapshots: AtomicU64::new(0),
                alert_streams: StdMutex::new(Vec::new()),
            }
        }

        /// Queue an alert stream and return the sender that feeds it.
        pub fn push_alert_stream(&self) -> mpsc::Sender<Result<String, CameraError>> {
            let (tx, rx) = mpsc::channel(16);
            self.alert_streams.lock().unwrap().push(rx);
            tx
        }

        pub fn switch_calls(&self) -> Vec<(DetectionType, bool)> {
            self.switches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Camera for FakeCamera {
        fn id(&self) -> &CameraId {
            &self.id
        }

        fn description(&self) -> &str {
            "Front door"
        }

        fn hashtag(&self) -> &str {
            "#frontdoor"
        }

        fn is_behind_relay(&self) -> bool {
            self.behind_relay
        }

        fn snapshot_channel(&self) -> u32 {
            101
        }

        fn snapshots_taken(&self) -> u64 {
            self.snapshots.load(Ordering::SeqCst)
        }

        async fn take_snapshot(&self, _channel: u32, _resize: bool) -> Result<Snapshot, CameraError> {
            let pending_failure = self
                .snapshot_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if self.fail_snapshot || pending_failure {
                return Err(CameraError::Timeout);
            }
            self.snapshots.fetch_add(1, Ordering::SeqCst);
            Ok(Snapshot {
                image: Bytes::from_static(b"jpeg-bytes"),
                created_at: Utc::now(),
            })
        }

        async fn start_videogif_record(
            &self,
            _message: MessageHandle,
            rewind: bool,
        ) -> Result<(), CameraError> {
            self.records.lock().unwrap().push(rewind);
            Ok(())
        }

        async fn set_ircut_filter(&self, filter_type: IrcutFilterType) -> Result<(), CameraError> {
            if self.fail_ircut {
                return Err(CameraError::Api {
                    status: 400,
                    message: "bad filter".to_string(),
                });
            }
            self.ircut.lock().unwrap().push(filter_type);
            Ok(())
        }

        async fn switch(
            &self,
            trigger: DetectionType,
            state: bool,
        ) -> Result<Option<String>, CameraError> {
            self.switches.lock().unwrap().push((trigger, state));
            if self.fail_switch {
                return Err(CameraError::Unavailable("connection refused".to_string()));
            }
            Ok(self.switch_reply.clone())
        }

        async fn alert_stream(&self) -> Result<AlertStream, CameraError> {
            let next = {
                let mut streams = self.alert_streams.lock().unwrap();
                if streams.is_empty() {
                    None
                } else {
                    Some(streams.remove(0))
                }
            };
            match next {
                Some(rx) => Ok(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                })
                .boxed()),
                None => Ok(stream::pending().boxed()),
            }
        }
    }

    fn alert_config(motion: bool, line_crossing: bool, intrusion: bool) -> AlertConfig {
        AlertConfig {
            delay_secs: 0,
            motion: DetectionConfig { enabled: motion },
            line_crossing: DetectionConfig {
                enabled: line_crossing,
            },
            intrusion: DetectionConfig { enabled: intrusion },
        }
    }

    #[tokio::test]
    async fn test_start_enables_configured_triggers() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let (queue, _rx) = result_channel(8);
        let service = AlarmService::new(cam.clone(), alert_config(true, true, false), queue);

        service.start().await.unwrap();

        assert!(service.started());
        assert_eq!(
            cam.switch_calls(),
            vec![
                (DetectionType::Motion, true),
                (DetectionType::LineCrossing, true)
            ]
        );
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_double_start_and_double_stop_fail() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let (queue, _rx) = result_channel(8);
        let service = AlarmService::new(cam, alert_config(true, false, false), queue);

        service.start().await.unwrap();
        let err = service.start().await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyStarted(_)));

        service.stop().await.unwrap();
        let err = service.stop().await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyStopped(_)));
        assert!(!service.started());

        service.start().await.unwrap();
        assert!(service.started());
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_behind_relay_start_is_noop() {
        let mut cam = FakeCamera::new("cam_1");
        cam.behind_relay = true;
        let cam = Arc::new(cam);
        let (queue, _rx) = result_channel(8);
        let service = AlarmService::new(cam.clone(), alert_config(true, true, true), queue);

        service.start().await.unwrap();

        assert!(!service.started());
        assert!(cam.switch_calls().is_empty());
        assert!(service.monitor.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_trigger_switch_error_is_service_error() {
        let mut cam = FakeCamera::new("cam_1");
        cam.fail_switch = true;
        let (queue, _rx) = result_channel(8);
        let service = AlarmService::new(Arc::new(cam), AlertConfig::default(), queue);

        let err = service
            .trigger_switch(DetectionType::Intrusion, false)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Intrusion (Field) Detection Switch encountered an error: \
             Camera unavailable: connection refused"
        );
    }

    #[tokio::test]
    async fn test_failed_trigger_keeps_service_stopped() {
        let mut cam = FakeCamera::new("cam_1");
        cam.fail_switch = true;
        let (queue, _rx) = result_channel(8);
        let service = AlarmService::new(Arc::new(cam), alert_config(true, false, false), queue);

        assert!(service.start().await.is_err());
        assert!(!service.started());
    }

    #[test]
    fn test_enabled_in_config() {
        let (queue, _rx) = result_channel(1);
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let off = AlarmService::new(cam.clone(), AlertConfig::default(), queue.clone());
        let on = AlarmService::new(cam, alert_config(false, false, true), queue);
        assert!(!off.enabled_in_config());
        assert!(on.enabled_in_config());

        let conf: AlertConfig =
            serde_json::from_str(r#"{"line_crossing": {"enabled": true}}"#).unwrap();
        assert_eq!(conf.delay_secs, ALERT_DELAY_SECS);
        assert!(conf.detection(DetectionType::LineCrossing).enabled);
        assert!(!conf.detection(DetectionType::Motion).enabled);
    }
}
