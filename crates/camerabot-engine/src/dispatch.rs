use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use camerabot_shared::events::InboundEvent;
use camerabot_shared::HandlerError;

use crate::handlers::{
    TaskAlarmConf, TaskDetectionConf, TaskHandler, TaskIrcutFilterConf, TaskRecordVideoGif,
    TaskStreamConf, TaskTakeSnapshot,
};
use crate::queue::ResultQueue;
use crate::service::ServiceManager;
use crate::task::spawn_named;

/// Routes inbound events to their handler.
///
/// The table is built once; the `match` in [`Dispatcher::handle`] is
/// exhaustive, so a new event kind without a handler does not compile.
pub struct Dispatcher {
    snapshot: TaskTakeSnapshot,
    record: TaskRecordVideoGif,
    detection: TaskDetectionConf,
    alarm: TaskAlarmConf,
    stream: TaskStreamConf,
    ircut: TaskIrcutFilterConf,
}

impl Dispatcher {
    pub fn new(result_queue: ResultQueue, services: Arc<ServiceManager>) -> Self {
        Self {
            snapshot: TaskTakeSnapshot::new(result_queue.clone()),
            record: TaskRecordVideoGif,
            detection: TaskDetectionConf::new(result_queue.clone(), services.clone()),
            alarm: TaskAlarmConf::new(result_queue.clone(), services.clone()),
            stream: TaskStreamConf::new(result_queue.clone(), services),
            ircut: TaskIrcutFilterConf::new(result_queue),
        }
    }

    pub fn handler_name(&self, event: &InboundEvent) -> &'static str {
        match event {
            InboundEvent::TakeSnapshot(_) => self.snapshot.name(),
            InboundEvent::RecordVideoGif(_) => self.record.name(),
            InboundEvent::DetectionConf(_) => self.detection.name(),
            InboundEvent::AlarmConf(_) => self.alarm.name(),
            InboundEvent::StreamConf(_) => self.stream.name(),
            InboundEvent::IrcutConf(_) => self.ircut.name(),
        }
    }

    /// Run the matching handler to completion.
    pub async fn handle(&self, event: InboundEvent) -> Result<(), HandlerError> {
        match event {
            InboundEvent::TakeSnapshot(e) => self.snapshot.handle(e).await,
            InboundEvent::RecordVideoGif(e) => self.record.handle(e).await,
            InboundEvent::DetectionConf(e) => self.detection.handle(e).await,
            InboundEvent::AlarmConf(e) => self.alarm.handle(e).await,
            InboundEvent::StreamConf(e) => self.stream.handle(e).await,
            InboundEvent::IrcutConf(e) => self.ircut.handle(e).await,
        }
    }

    /// Run the matching handler in its own named task.
    pub fn dispatch(self: &Arc<Self>, event: InboundEvent) -> JoinHandle<()> {
        let task_name = format!("{}_{}", self.handler_name(&event), event.cam().id());
        debug!(task = %task_name, event = event.name(), "Dispatching inbound event");

        let dispatcher = Arc::clone(self);
        spawn_named(task_name, async move { dispatcher.handle(event).await })
    }
}
