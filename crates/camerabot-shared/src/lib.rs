//! Types shared by every camerabot crate: identifiers, the inbound/outbound
//! event model, collaborator traits and the error taxonomy.

pub mod camera;
pub mod chat;
pub mod constants;
pub mod error;
pub mod events;
pub mod text;
pub mod types;

pub use camera::{AlertStream, Camera, CameraInfo, CameraRef, Snapshot};
pub use chat::{ChatAction, ChatClient, VideoUpload};
pub use error::{CameraError, ChatError, DvrError, HandlerError, ServiceError};
pub use events::{InboundEvent, OutboundEvent};
