//! Task handlers, one per inbound event kind.
//!
//! Every handler ends by putting zero or one event on the result channel.
//! Failures users can do something about (device, network, service state)
//! become text in that event. Anything else propagates out of `handle` and is
//! logged by the task that ran it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use camerabot_shared::events::{
    AlarmConfRequest, AlarmConfResult, DetectionConfRequest, DetectionConfResult,
    IrcutConfRequest, OutboundEvent, RecordRequest, SnapshotRequest, SnapshotResult,
    StreamConfRequest, StreamConfResult, TextReply,
};
use camerabot_shared::text::bold;
use camerabot_shared::types::{CameraId, DetectionType, ServiceName, ServiceType};
use camerabot_shared::{HandlerError, ServiceError};

use crate::queue::ResultQueue;
use crate::service::ServiceManager;

#[async_trait]
pub trait TaskHandler: Send + Sync {
    type Event: Send + 'static;

    fn name(&self) -> &'static str;

    async fn handle(&self, event: Self::Event) -> Result<(), HandlerError>;
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

pub struct TaskTakeSnapshot {
    result_queue: ResultQueue,
}

impl TaskTakeSnapshot {
    pub fn new(result_queue: ResultQueue) -> Self {
        Self { result_queue }
    }
}

#[async_trait]
impl TaskHandler for TaskTakeSnapshot {
    type Event = SnapshotRequest;

    fn name(&self) -> &'static str {
        "TaskTakeSnapshot"
    }

    async fn handle(&self, event: SnapshotRequest) -> Result<(), HandlerError> {
        let cam = &event.cam;
        let channel = cam.snapshot_channel();

        let snapshot = match cam.take_snapshot(channel, event.resize).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(camera = %cam.id(), error = %err, "Failed to take snapshot");
                let text = format!(
                    "🛑 {}\n\n{}",
                    bold(format!(
                        "Failed to take picture on [{}] {}",
                        cam.id(),
                        cam.description()
                    )),
                    bold(format!("👀 Details: {err}")),
                );
                return self
                    .result_queue
                    .put(OutboundEvent::SendText(TextReply {
                        text,
                        message: Some(event.message),
                    }))
                    .await;
            }
        };

        self.result_queue
            .put(OutboundEvent::Snapshot(SnapshotResult {
                cam: cam.info(),
                file_size: snapshot.image.len(),
                img: snapshot.image,
                create_ts: snapshot.created_at,
                taken_count: cam.snapshots_taken(),
                resized: event.resize,
                message: event.message,
            }))
            .await
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Starts a recording. The recording pipeline reports back on its own.
#[derive(Default)]
pub struct TaskRecordVideoGif;

#[async_trait]
impl TaskHandler for TaskRecordVideoGif {
    type Event = RecordRequest;

    fn name(&self) -> &'static str {
        "TaskRecordVideoGif"
    }

    async fn handle(&self, event: RecordRequest) -> Result<(), HandlerError> {
        event
            .cam
            .start_videogif_record(event.message, event.rewind)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Detection toggle
// ---------------------------------------------------------------------------

pub struct TaskDetectionConf {
    result_queue: ResultQueue,
    services: Arc<ServiceManager>,
}

impl TaskDetectionConf {
    pub fn new(result_queue: ResultQueue, services: Arc<ServiceManager>) -> Self {
        Self {
            result_queue,
            services,
        }
    }

    async fn switch(
        &self,
        cam: &CameraId,
        trigger: DetectionType,
        state: bool,
    ) -> Result<Option<String>, ServiceError> {
        self.services
            .alarm(cam)
            .await?
            .trigger_switch(trigger, state)
            .await
    }
}

#[async_trait]
impl TaskHandler for TaskDetectionConf {
    type Event = DetectionConfRequest;

    fn name(&self) -> &'static str {
        "TaskDetectionConf"
    }

    async fn handle(&self, event: DetectionConfRequest) -> Result<(), HandlerError> {
        let cam = &event.cam;
        info!(
            camera = %cam.id(),
            "{} camera's {} has been requested",
            if event.state { "Enabling" } else { "Disabling" },
            event.trigger.full_name()
        );

        let text = match self.switch(cam.id(), event.trigger, event.state).await {
            Ok(text) => text,
            Err(err) => Some(err.to_string()),
        };

        self.result_queue
            .put(OutboundEvent::DetectionConf(DetectionConfResult {
                cam: cam.info(),
                trigger: event.trigger,
                state: event.state,
                text,
                message: event.message,
            }))
            .await
    }
}

// ---------------------------------------------------------------------------
// Alarm / stream toggles
// ---------------------------------------------------------------------------

/// Start or stop a service, turning a state error into reply text.
async fn toggle_service(
    services: &ServiceManager,
    cam: &CameraId,
    service_type: ServiceType,
    service_name: ServiceName,
    state: bool,
) -> Option<String> {
    let result = if state {
        services.start(cam, service_type, service_name).await
    } else {
        services.stop(cam, service_type, service_name).await
    };

    match result {
        Ok(()) => None,
        Err(err) => {
            warn!(camera = %cam, service = %service_name, error = %err, "Service toggle failed");
            Some(err.to_string())
        }
    }
}

pub struct TaskAlarmConf {
    result_queue: ResultQueue,
    services: Arc<ServiceManager>,
}

impl TaskAlarmConf {
    pub fn new(result_queue: ResultQueue, services: Arc<ServiceManager>) -> Self {
        Self {
            result_queue,
            services,
        }
    }
}

#[async_trait]
impl TaskHandler for TaskAlarmConf {
    type Event = AlarmConfRequest;

    fn name(&self) -> &'static str {
        "TaskAlarmConf"
    }

    async fn handle(&self, event: AlarmConfRequest) -> Result<(), HandlerError> {
        let cam = &event.cam;
        let text = toggle_service(
            &self.services,
            cam.id(),
            event.service_type,
            ServiceName::Alarm(event.service_name),
            event.state,
        )
        .await;

        self.result_queue
            .put(OutboundEvent::AlarmConf(AlarmConfResult {
                cam: cam.info(),
                service_type: event.service_type,
                service_name: event.service_name,
                state: event.state,
                text,
                message: event.message,
            }))
            .await
    }
}

pub struct TaskStreamConf {
    result_queue: ResultQueue,
    services: Arc<ServiceManager>,
}

impl TaskStreamConf {
    pub fn new(result_queue: ResultQueue, services: Arc<ServiceManager>) -> Self {
        Self {
            result_queue,
            services,
        }
    }
}

#[async_trait]
impl TaskHandler for TaskStreamConf {
    type Event = StreamConfRequest;

    fn name(&self) -> &'static str {
        "TaskStreamConf"
    }

    async fn handle(&self, event: StreamConfRequest) -> Result<(), HandlerError> {
        let cam = &event.cam;
        info!(camera = %cam.id(), stream = event.stream_type.as_str(), state = event.state, "Stream toggle requested");
        let text = toggle_service(
            &self.services,
            cam.id(),
            event.service_type,
            ServiceName::Stream(event.stream_type),
            event.state,
        )
        .await;

        self.result_queue
            .put(OutboundEvent::StreamConf(StreamConfResult {
                cam: cam.info(),
                service_type: event.service_type,
                stream_type: event.stream_type,
                state: event.state,
                text,
                message: event.message,
            }))
            .await
    }
}

// ---------------------------------------------------------------------------
// IR-cut filter
// ---------------------------------------------------------------------------

/// Sets the IR-cut filter. Filter errors propagate: a rejected filter is a
/// misconfiguration, not something to paper over in chat.
pub struct TaskIrcutFilterConf {
    result_queue: ResultQueue,
}

impl TaskIrcutFilterConf {
    pub fn new(result_queue: ResultQueue) -> Self {
        Self { result_queue }
    }
}

#[async_trait]
impl TaskHandler for TaskIrcutFilterConf {
    type Event = IrcutConfRequest;

    fn name(&self) -> &'static str {
        "TaskIrcutFilterConf"
    }

    async fn handle(&self, event: IrcutConfRequest) -> Result<(), HandlerError> {
        event.cam.set_ircut_filter(event.filter_type).await?;

        self.result_queue
            .put(OutboundEvent::SendText(TextReply {
                text: bold(format!(
                    "IrcutFilter set to \"{}\"",
                    event.filter_type.as_str()
                )),
                message: Some(event.message),
            }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use camerabot_shared::types::{AlarmType, IrcutFilterType, MessageHandle, StreamType};
    use camerabot_shared::CameraRef;

    use crate::alarm::tests::FakeCamera;
    use crate::alarm::{AlarmService, AlertConfig, DetectionConfig};
    use crate::queue::{result_channel, ResultReceiver};
    use crate::service::Service;

    const MESSAGE: MessageHandle = MessageHandle {
        chat_id: 1,
        message_id: 2,
    };

    fn drain(rx: &mut ResultReceiver) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.try_get() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_snapshot_success_emits_image() {
        let cam: CameraRef = Arc::new(FakeCamera::new("cam_1"));
        let (queue, mut rx) = result_channel(8);
        let handler = TaskTakeSnapshot::new(queue);

        handler
            .handle(SnapshotRequest {
                cam,
                resize: true,
                message: MESSAGE,
            })
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            OutboundEvent::Snapshot(result) => {
                assert_eq!(result.file_size, b"jpeg-bytes".len());
                assert_eq!(result.taken_count, 1);
                assert!(result.resized);
                assert_eq!(result.message, MESSAGE);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_snapshot_failure_emits_text_instead_of_error() {
        let mut cam = FakeCamera::new("cam_1");
        cam.fail_snapshot = true;
        let (queue, mut rx) = result_channel(8);
        let handler = TaskTakeSnapshot::new(queue);

        handler
            .handle(SnapshotRequest {
                cam: Arc::new(cam),
                resize: false,
                message: MESSAGE,
            })
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            OutboundEvent::SendText(reply) => {
                assert!(reply.text.contains("Failed to take picture on [cam_1] Front door"));
                assert!(reply.text.contains("Camera request timed out"));
                assert_eq!(reply.message, Some(MESSAGE));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_record_emits_nothing() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let (queue, mut rx) = result_channel(8);
        drop(queue);

        TaskRecordVideoGif
            .handle(RecordRequest {
                cam: cam.clone(),
                rewind: true,
                message: MESSAGE,
            })
            .await
            .unwrap();

        assert_eq!(*cam.records.lock().unwrap(), vec![true]);
        assert!(rx.try_get().is_none());
    }

    async fn detection_fixture(cam: FakeCamera) -> (Arc<FakeCamera>, TaskDetectionConf, ResultReceiver) {
        let cam = Arc::new(cam);
        let (queue, rx) = result_channel(8);
        let services = Arc::new(ServiceManager::new());
        services
            .register_alarm(AlarmService::new(
                cam.clone(),
                AlertConfig::default(),
                queue.clone(),
            ))
            .await;
        (cam, TaskDetectionConf::new(queue, services), rx)
    }

    #[tokio::test]
    async fn test_detection_toggle_carries_switch_text() {
        let mut cam = FakeCamera::new("cam_1");
        cam.switch_reply = Some("OK".to_string());
        let (cam, handler, mut rx) = detection_fixture(cam).await;

        handler
            .handle(DetectionConfRequest {
                cam: cam.clone(),
                trigger: DetectionType::LineCrossing,
                state: true,
                message: MESSAGE,
            })
            .await
            .unwrap();

        assert_eq!(cam.switch_calls(), vec![(DetectionType::LineCrossing, true)]);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            OutboundEvent::DetectionConf(result) => {
                assert!(result.state);
                assert_eq!(result.text.as_deref(), Some("OK"));
                assert_eq!(result.trigger, DetectionType::LineCrossing);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_detection_toggle_surfaces_switch_failure() {
        let mut cam = FakeCamera::new("cam_1");
        cam.fail_switch = true;
        let (cam, handler, mut rx) = detection_fixture(cam).await;

        handler
            .handle(DetectionConfRequest {
                cam,
                trigger: DetectionType::Motion,
                state: false,
                message: MESSAGE,
            })
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        match &events[0] {
            OutboundEvent::DetectionConf(result) => {
                assert!(!result.state);
                let text = result.text.as_deref().unwrap();
                assert!(text.starts_with("Motion Detection Switch encountered an error"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_alarm_toggle_reports_state_errors_as_text() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let (queue, mut rx) = result_channel(8);
        let services = Arc::new(ServiceManager::new());
        let alarm = AlarmService::new(
            cam.clone(),
            AlertConfig {
                motion: DetectionConfig { enabled: true },
                ..AlertConfig::default()
            },
            queue.clone(),
        );
        services.register_alarm(alarm.clone()).await;
        let handler = TaskAlarmConf::new(queue, services);

        let request = |state| AlarmConfRequest {
            cam: cam.clone(),
            service_type: ServiceType::Alarm,
            service_name: AlarmType::Alarm,
            state,
            message: MESSAGE,
        };

        handler.handle(request(true)).await.unwrap();
        handler.handle(request(true)).await.unwrap();
        handler.handle(request(false)).await.unwrap();

        let texts: Vec<Option<String>> = drain(&mut rx)
            .into_iter()
            .filter_map(|event| match event {
                OutboundEvent::AlarmConf(result) => Some(result.text),
                _ => None,
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                None,
                Some("Alarm (alert) mode already started".to_string()),
                None
            ]
        );
        assert!(!alarm.started());
        alarm.shutdown().await;
    }

    struct FakeStream {
        started: AtomicBool,
    }

    #[async_trait]
    impl Service for FakeStream {
        fn service_type(&self) -> ServiceType {
            ServiceType::Stream
        }

        fn name(&self) -> ServiceName {
            ServiceName::Stream(StreamType::Youtube)
        }

        fn started(&self) -> bool {
            self.started.load(Ordering::SeqCst)
        }

        async fn start(&self) -> Result<(), ServiceError> {
            self.started.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> Result<(), ServiceError> {
            if !self.started.swap(false, Ordering::SeqCst) {
                return Err(ServiceError::AlreadyStopped("Youtube stream".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_stream_toggle_always_replies_once() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let (queue, mut rx) = result_channel(8);
        let services = Arc::new(ServiceManager::new());
        services
            .register(
                cam.id.clone(),
                Arc::new(FakeStream {
                    started: AtomicBool::new(false),
                }),
            )
            .await;
        let handler = TaskStreamConf::new(queue, services);

        handler
            .handle(StreamConfRequest {
                cam: cam.clone(),
                service_type: ServiceType::Stream,
                stream_type: StreamType::Youtube,
                state: false,
                message: MESSAGE,
            })
            .await
            .unwrap();
        handler
            .handle(StreamConfRequest {
                cam,
                service_type: ServiceType::Stream,
                stream_type: StreamType::Icecast,
                state: true,
                message: MESSAGE,
            })
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        match (&events[0], &events[1]) {
            (OutboundEvent::StreamConf(first), OutboundEvent::StreamConf(second)) => {
                assert_eq!(first.text.as_deref(), Some("Youtube stream already stopped"));
                assert_eq!(first.stream_type, StreamType::Youtube);
                assert!(second.text.as_deref().unwrap().contains("not registered"));
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ircut_confirms_on_success() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let (queue, mut rx) = result_channel(8);
        let handler = TaskIrcutFilterConf::new(queue);

        handler
            .handle(IrcutConfRequest {
                cam: cam.clone(),
                filter_type: IrcutFilterType::Night,
                message: MESSAGE,
            })
            .await
            .unwrap();

        assert_eq!(*cam.ircut.lock().unwrap(), vec![IrcutFilterType::Night]);
        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![OutboundEvent::SendText(TextReply {
                text: "<b>IrcutFilter set to \"night\"</b>".to_string(),
                message: Some(MESSAGE),
            })]
        );
    }

    #[tokio::test]
    async fn test_ircut_failure_propagates_without_reply() {
        let mut cam = FakeCamera::new("cam_1");
        cam.fail_ircut = true;
        let (queue, mut rx) = result_channel(8);
        let handler = TaskIrcutFilterConf::new(queue);

        let err = handler
            .handle(IrcutConfRequest {
                cam: Arc::new(cam),
                filter_type: IrcutFilterType::Day,
                message: MESSAGE,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Camera(_)));
        assert!(rx.try_get().is_none());
    }
}
