//! DVR upload pipeline.
//!
//! Each enabled destination owns a bounded queue and one worker. The
//! [`DvrUploadEngine`] builds a [`DvrFile`] per finished recording, with one
//! lock per destination, and hands it to every queue. A worker validates the
//! file, uploads it under the retry policy and releases its lock whatever the
//! outcome.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use camerabot_shared::camera::CameraInfo;
use camerabot_shared::chat::{ChatAction, ChatClient, VideoUpload};
use camerabot_shared::types::DvrUploadType;
use camerabot_shared::{ChatError, DvrError};

use crate::file::DvrFile;
use crate::probe::MediaProber;
use crate::retry::RetryPolicy;
use crate::thumbnail::Thumbnailer;

/// Transport for one upload destination.
#[async_trait]
pub trait DvrUploader: Send + Sync {
    fn upload_type(&self) -> DvrUploadType;

    /// One upload attempt. Retries are the caller's business.
    async fn upload(&self, file: &DvrFile) -> Result<(), ChatError>;
}

/// Sends recordings to a Telegram group as streamable videos.
pub struct TelegramDvrUploader {
    chat: Arc<dyn ChatClient>,
    group_id: i64,
}

impl TelegramDvrUploader {
    pub fn new(chat: Arc<dyn ChatClient>, group_id: i64) -> Self {
        Self { chat, group_id }
    }

    pub fn caption(cam: &CameraInfo) -> String {
        format!("Video from {} {}", cam.description, cam.hashtag)
    }
}

#[async_trait]
impl DvrUploader for TelegramDvrUploader {
    fn upload_type(&self) -> DvrUploadType {
        DvrUploadType::Telegram
    }

    async fn upload(&self, file: &DvrFile) -> Result<(), ChatError> {
        self.chat
            .send_chat_action(self.group_id, ChatAction::UploadVideo)
            .await?;

        self.chat
            .send_video(VideoUpload {
                chat_id: self.group_id,
                caption: Self::caption(file.cam()),
                path: file.full_path().to_path_buf(),
                file_name: file.name().to_string(),
                duration: file.duration().unwrap_or(0),
                height: file.height().unwrap_or(0),
                width: file.width().unwrap_or(0),
                thumbnail: file.thumbnail().map(|path| path.to_path_buf()),
                supports_streaming: true,
            })
            .await
    }
}

/// Producer side of one destination queue.
#[derive(Clone)]
pub struct DvrUploadQueue {
    upload_type: DvrUploadType,
    tx: mpsc::Sender<Arc<DvrFile>>,
}

impl DvrUploadQueue {
    pub fn upload_type(&self) -> DvrUploadType {
        self.upload_type
    }

    /// Waits for room when the queue is full.
    pub async fn put(&self, file: Arc<DvrFile>) -> Result<(), Arc<DvrFile>> {
        self.tx.send(file).await.map_err(|e| e.0)
    }
}

/// Consumer side of one destination queue.
pub struct DvrUploadWorker {
    uploader: Arc<dyn DvrUploader>,
    rx: mpsc::Receiver<Arc<DvrFile>>,
    retry: RetryPolicy,
}

/// Build the queue and worker for one destination.
pub fn upload_pipeline(
    uploader: Arc<dyn DvrUploader>,
    capacity: usize,
    retry: RetryPolicy,
) -> (DvrUploadQueue, DvrUploadWorker) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let queue = DvrUploadQueue {
        upload_type: uploader.upload_type(),
        tx,
    };
    (queue, DvrUploadWorker { uploader, rx, retry })
}

impl DvrUploadWorker {
    /// Drain the queue until every producer is gone.
    pub async fn run(mut self) -> Result<(), DvrError> {
        let upload_type = self.uploader.upload_type();
        info!(%upload_type, "DVR upload worker started");

        while let Some(file) = self.rx.recv().await {
            self.process(&file).await;
        }

        info!(%upload_type, "DVR upload worker stopped");
        Ok(())
    }

    /// Upload one file and release this destination's lock.
    pub async fn process(&self, file: &DvrFile) {
        let upload_type = self.uploader.upload_type();
        match self.upload_video(file).await {
            Ok(true) => info!(%upload_type, file = %file, "Uploaded DVR file"),
            Ok(false) => {}
            Err(e) => error!(
                %upload_type,
                path = %file.full_path().display(),
                attempts = self.retry.attempts,
                error = %e,
                "Giving up on DVR file upload"
            ),
        }
        file.decrement_lock_count();
    }

    /// `Ok(false)` when the file was rejected before any transport call.
    async fn upload_video(&self, file: &DvrFile) -> Result<bool, ChatError> {
        if let Err(e) = file.check_uploadable().await {
            error!(path = %file.full_path().display(), error = %e, "Cannot upload DVR file");
            return Ok(false);
        }

        let path = file.full_path().display().to_string();
        self.retry
            .run(|attempt| {
                let path = path.as_str();
                async move {
                    debug!(path, attempt, "Uploading DVR file");
                    self.uploader.upload(file).await.map_err(|e| {
                        warn!(path, attempt, error = %e, "DVR file upload failed");
                        e
                    })
                }
            })
            .await?;
        Ok(true)
    }
}

/// Intake of finished recordings.
pub struct DvrUploadEngine {
    storage_path: PathBuf,
    prober: Arc<dyn MediaProber>,
    thumbnailer: Arc<dyn Thumbnailer>,
    queues: Vec<DvrUploadQueue>,
}

impl DvrUploadEngine {
    pub fn new(
        storage_path: impl Into<PathBuf>,
        prober: Arc<dyn MediaProber>,
        thumbnailer: Arc<dyn Thumbnailer>,
        queues: Vec<DvrUploadQueue>,
    ) -> Self {
        Self {
            storage_path: storage_path.into(),
            prober,
            thumbnailer,
            queues,
        }
    }

    pub fn destinations(&self) -> Vec<DvrUploadType> {
        self.queues.iter().map(|q| q.upload_type()).collect()
    }

    /// Build a [`DvrFile`] for a finished recording and enqueue it for every
    /// destination.
    ///
    /// Returns `Ok(None)` without touching the file when no destination is
    /// enabled.
    pub async fn on_recording_finished(
        &self,
        file_name: &str,
        cam: CameraInfo,
    ) -> Result<Option<Arc<DvrFile>>, DvrError> {
        if self.queues.is_empty() {
            debug!(file = file_name, "No DVR upload destination enabled");
            return Ok(None);
        }

        let mut file = DvrFile::new(file_name, self.queues.len() as i64, &self.storage_path, cam)?;
        file.make_context(self.prober.as_ref(), self.thumbnailer.as_ref())
            .await;
        let file = Arc::new(file);

        for queue in &self.queues {
            if let Err(file) = queue.put(Arc::clone(&file)).await {
                warn!(
                    upload_type = %queue.upload_type(),
                    file = %file,
                    "DVR upload queue closed, releasing lock"
                );
                file.decrement_lock_count();
            }
        }
        Ok(Some(file))
    }
}
