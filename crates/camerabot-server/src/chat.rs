use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use camerabot_shared::chat::{ChatAction, ChatClient, VideoUpload};
use camerabot_shared::types::MessageHandle;
use camerabot_shared::ChatError;

/// Dry-run chat client that logs every delivery instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingChat;

#[async_trait]
impl ChatClient for TracingChat {
    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), ChatError> {
        info!(chat_id, ?action, "chat action");
        Ok(())
    }

    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<MessageHandle>,
    ) -> Result<(), ChatError> {
        info!(
            chat_id,
            reply_to = reply_to.map(|m| m.message_id),
            text,
            "send text"
        );
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: Bytes,
        caption: &str,
        reply_to: Option<MessageHandle>,
    ) -> Result<(), ChatError> {
        info!(
            chat_id,
            reply_to = reply_to.map(|m| m.message_id),
            size = photo.len(),
            caption,
            "send photo"
        );
        Ok(())
    }

    async fn send_video(&self, video: VideoUpload) -> Result<(), ChatError> {
        info!(
            chat_id = video.chat_id,
            path = %video.path.display(),
            duration = video.duration,
            width = video.width,
            height = video.height,
            caption = %video.caption,
            "send video"
        );
        Ok(())
    }
}
