//! Chat delivery collaborator.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ChatError;
use crate::types::MessageHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    UploadPhoto,
    UploadVideo,
}

/// Everything needed to send a recorded video to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpload {
    pub chat_id: i64,
    pub caption: String,
    pub path: PathBuf,
    pub file_name: String,
    pub duration: u32,
    pub height: u32,
    pub width: u32,
    pub thumbnail: Option<PathBuf>,
    pub supports_streaming: bool,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), ChatError>;

    /// Send HTML-formatted text, replying to `reply_to` when given.
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<MessageHandle>,
    ) -> Result<(), ChatError>;

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: Bytes,
        caption: &str,
        reply_to: Option<MessageHandle>,
    ) -> Result<(), ChatError>;

    async fn send_video(&self, video: VideoUpload) -> Result<(), ChatError>;
}
