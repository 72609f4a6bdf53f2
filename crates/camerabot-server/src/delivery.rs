//! Outbound delivery.
//!
//! Drains the result channel in order and renders every outbound event into
//! chat messages. A failed delivery is logged and the next event goes out.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info};

use camerabot_engine::ResultReceiver;
use camerabot_shared::camera::CameraInfo;
use camerabot_shared::chat::{ChatAction, ChatClient, VideoUpload};
use camerabot_shared::events::{Media, MediaReply, OutboundEvent};
use camerabot_shared::text::{bold, with_details};
use camerabot_shared::types::MessageHandle;
use camerabot_shared::ChatError;

/// A rendered chat message.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    Text {
        chat_id: i64,
        text: String,
        reply_to: Option<MessageHandle>,
    },
    Photo {
        chat_id: i64,
        photo: Bytes,
        caption: String,
        reply_to: Option<MessageHandle>,
    },
    Video(VideoUpload),
}

const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

fn camera_label(cam: &CameraInfo) -> String {
    format!("[{}] {}", cam.id, cam.description)
}

fn on_off(state: bool) -> &'static str {
    if state {
        "on"
    } else {
        "off"
    }
}

/// The originating chat when there is one, otherwise every notify chat.
fn recipients(
    message: Option<MessageHandle>,
    notify_chats: &[i64],
) -> Vec<(i64, Option<MessageHandle>)> {
    match message {
        Some(message) => vec![(message.chat_id, Some(message))],
        None => notify_chats.iter().map(|&chat_id| (chat_id, None)).collect(),
    }
}

fn render_media(reply: MediaReply, notify_chats: &[i64]) -> Vec<ChatMessage> {
    let caption = format!("{}\n{}", bold(camera_label(&reply.cam)), reply.caption);
    recipients(reply.message, notify_chats)
        .into_iter()
        .map(|(chat_id, reply_to)| match &reply.media {
            Media::Photo(photo) => ChatMessage::Photo {
                chat_id,
                photo: photo.clone(),
                caption: caption.clone(),
                reply_to,
            },
            Media::Video(path) => ChatMessage::Video(VideoUpload {
                chat_id,
                caption: caption.clone(),
                path: path.clone(),
                file_name: path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                duration: 0,
                height: 0,
                width: 0,
                thumbnail: None,
                supports_streaming: true,
            }),
        })
        .collect()
}

/// Render one outbound event. Replies go to the originating chat; events
/// without an originating message go to every notify chat.
pub fn render(event: OutboundEvent, notify_chats: &[i64]) -> Vec<ChatMessage> {
    match event {
        OutboundEvent::SendText(reply) => recipients(reply.message, notify_chats)
            .into_iter()
            .map(|(chat_id, reply_to)| ChatMessage::Text {
                chat_id,
                text: reply.text.clone(),
                reply_to,
            })
            .collect(),
        OutboundEvent::SendMedia(reply) => render_media(reply, notify_chats),
        OutboundEvent::Snapshot(result) => {
            let headline = bold(format!("📷 Snapshot taken on {}", camera_label(&result.cam)));
            let size = if result.resized { "resized" } else { "full size" };
            let caption = format!(
                "{headline}\n{}, {size}, #{} {}",
                result.create_ts.format(TIMESTAMP_FORMAT),
                result.taken_count,
                result.cam.hashtag
            );
            vec![ChatMessage::Photo {
                chat_id: result.message.chat_id,
                photo: result.img,
                caption,
                reply_to: Some(result.message),
            }]
        }
        OutboundEvent::DetectionConf(result) => {
            let headline = bold(format!(
                "{} switched {} for {}",
                result.trigger.full_name(),
                on_off(result.state),
                camera_label(&result.cam)
            ));
            vec![ChatMessage::Text {
                chat_id: result.message.chat_id,
                text: with_details(&headline, result.text.as_deref()),
                reply_to: Some(result.message),
            }]
        }
        OutboundEvent::AlarmConf(result) => {
            let headline = bold(format!(
                "Alarm service switched {} for {}",
                on_off(result.state),
                camera_label(&result.cam)
            ));
            vec![ChatMessage::Text {
                chat_id: result.message.chat_id,
                text: with_details(&headline, result.text.as_deref()),
                reply_to: Some(result.message),
            }]
        }
        OutboundEvent::StreamConf(result) => {
            let headline = bold(format!(
                "{} stream switched {} for {}",
                result.stream_type.as_str(),
                on_off(result.state),
                camera_label(&result.cam)
            ));
            vec![ChatMessage::Text {
                chat_id: result.message.chat_id,
                text: with_details(&headline, result.text.as_deref()),
                reply_to: Some(result.message),
            }]
        }
        OutboundEvent::AlertSnapshot(alert) => {
            let caption = format!(
                "{}\n{}, alert #{} {}",
                bold(format!("🚨 Alert on {}", camera_label(&alert.cam))),
                alert.create_ts.format(TIMESTAMP_FORMAT),
                alert.alert_count,
                alert.cam.hashtag
            );
            notify_chats
                .iter()
                .map(|&chat_id| ChatMessage::Photo {
                    chat_id,
                    photo: alert.img.clone(),
                    caption: caption.clone(),
                    reply_to: None,
                })
                .collect()
        }
    }
}

/// Result channel consumer.
pub struct ResultDelivery {
    chat: Arc<dyn ChatClient>,
    notify_chats: Vec<i64>,
}

impl ResultDelivery {
    pub fn new(chat: Arc<dyn ChatClient>, notify_chats: Vec<i64>) -> Self {
        Self { chat, notify_chats }
    }

    /// Deliver until every producer has dropped its queue handle.
    pub async fn run(self, mut results: ResultReceiver) -> Result<(), ChatError> {
        info!(notify_chats = self.notify_chats.len(), "Result delivery started");
        while let Some(event) = results.get().await {
            let name = event.name();
            debug!(event = name, "Delivering result");
            for message in render(event, &self.notify_chats) {
                if let Err(e) = self.send(message).await {
                    error!(event = name, error = %e, "Failed to deliver result");
                }
            }
        }
        info!("Result delivery stopped");
        Ok(())
    }

    async fn send(&self, message: ChatMessage) -> Result<(), ChatError> {
        match message {
            ChatMessage::Text {
                chat_id,
                text,
                reply_to,
            } => self.chat.send_text(chat_id, &text, reply_to).await,
            ChatMessage::Photo {
                chat_id,
                photo,
                caption,
                reply_to,
            } => {
                self.chat
                    .send_chat_action(chat_id, ChatAction::UploadPhoto)
                    .await?;
                self.chat.send_photo(chat_id, photo, &caption, reply_to).await
            }
            ChatMessage::Video(video) => {
                self.chat
                    .send_chat_action(video.chat_id, ChatAction::UploadVideo)
                    .await?;
                self.chat.send_video(video).await
            }
        }
    }
}
