//! Process-level wiring.
//!
//! [`Bot`] owns the result channel producer, the dispatcher, the service
//! registry and the DVR upload intake, and the background tasks draining
//! them. Front-ends (chat command parsing, the DVR recorder) talk to the bot
//! through [`Bot::submit`], [`Bot::publish`] and [`Bot::on_recording_finished`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use camerabot_dvr::{
    upload_pipeline, DvrFile, DvrUploadEngine, MediaProber, TelegramDvrUploader, Thumbnailer,
};
use camerabot_engine::{
    result_channel, spawn_named, AlarmService, AlertConfig, Dispatcher, ResultQueue,
    ServiceManager,
};
use camerabot_shared::camera::CameraRef;
use camerabot_shared::chat::ChatClient;
use camerabot_shared::events::{InboundEvent, OutboundEvent};
use camerabot_shared::types::CameraId;
use camerabot_shared::HandlerError;

use crate::config::ServerConfig;
use crate::delivery::ResultDelivery;
use crate::error::ServerError;

/// How long [`Bot::shutdown`] waits for background tasks to drain.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub struct Bot {
    result_queue: ResultQueue,
    services: Arc<ServiceManager>,
    dispatcher: Arc<Dispatcher>,
    dvr: DvrUploadEngine,
    cameras: RwLock<HashMap<CameraId, CameraRef>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Bot {
    /// Build the pipeline and spawn the delivery consumer and one upload
    /// worker per enabled destination.
    pub fn start(
        config: &ServerConfig,
        chat: Arc<dyn ChatClient>,
        prober: Arc<dyn MediaProber>,
        thumbnailer: Arc<dyn Thumbnailer>,
    ) -> Self {
        let (result_queue, results) = result_channel(config.result_queue_size);
        let services = Arc::new(ServiceManager::new());
        let dispatcher = Arc::new(Dispatcher::new(result_queue.clone(), services.clone()));

        let mut tasks = Vec::new();
        tasks.push(spawn_named(
            "ResultDelivery",
            ResultDelivery::new(chat.clone(), config.notify_chats.clone()).run(results),
        ));

        let mut queues = Vec::new();
        if config.upload_telegram {
            let uploader = Arc::new(TelegramDvrUploader::new(chat, config.upload_group_id));
            let (queue, worker) =
                upload_pipeline(uploader, config.upload_queue_size, config.upload_retry());
            tasks.push(spawn_named(
                format!("DvrUploadWorker_{}", queue.upload_type()),
                worker.run(),
            ));
            queues.push(queue);
        }

        let dvr = DvrUploadEngine::new(config.dvr_path.clone(), prober, thumbnailer, queues);
        info!(
            destinations = ?dvr.destinations(),
            dvr_path = %config.dvr_path.display(),
            "Bot pipeline started"
        );

        Self {
            result_queue,
            services,
            dispatcher,
            dvr,
            cameras: RwLock::new(HashMap::new()),
            tasks,
        }
    }

    /// Register a camera and its alarm service.
    pub async fn register_camera(&self, cam: CameraRef, alert: AlertConfig) {
        let alarm = AlarmService::new(cam.clone(), alert, self.result_queue.clone());
        self.services.register_alarm(alarm).await;
        self.cameras.write().await.insert(cam.id().clone(), cam);
    }

    pub async fn camera(&self, id: &CameraId) -> Option<CameraRef> {
        self.cameras.read().await.get(id).cloned()
    }

    /// Start alarm monitoring on every camera configured for it.
    pub async fn start_enabled_alarms(&self) {
        self.services.start_enabled_alarms().await;
    }

    /// Hand an inbound command to its handler.
    pub fn submit(&self, event: InboundEvent) -> JoinHandle<()> {
        self.dispatcher.dispatch(event)
    }

    /// Put a result produced outside the task handlers, such as a finished
    /// video recording, on the result channel.
    pub async fn publish(&self, event: OutboundEvent) -> Result<(), HandlerError> {
        self.result_queue.put(event).await
    }

    /// Enqueue a finished recording for upload.
    pub async fn on_recording_finished(
        &self,
        file_name: &str,
        camera: &CameraId,
    ) -> Result<Option<Arc<DvrFile>>, ServerError> {
        let cam = self
            .camera(camera)
            .await
            .ok_or_else(|| ServerError::UnknownCamera(camera.clone()))?;
        Ok(self.dvr.on_recording_finished(file_name, cam.info()).await?)
    }

    /// Stop alarm monitoring, close every queue and wait for the background
    /// tasks to drain.
    pub async fn shutdown(self) {
        self.services.shutdown().await;

        let Self {
            result_queue,
            services,
            dispatcher,
            dvr,
            cameras,
            tasks,
        } = self;
        drop((result_queue, services, dispatcher, dvr, cameras));

        let drain = futures::future::join_all(tasks);
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!("Background tasks did not finish in time");
        }
        info!("Bot stopped");
    }
}
