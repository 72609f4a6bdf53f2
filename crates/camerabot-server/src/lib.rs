//! # camerabot-server
//!
//! Process wiring for the camera bot. The [`Bot`] handle is what front-ends
//! (chat command parsing, the DVR recorder) integrate with; the binary in
//! `main.rs` builds one from environment configuration.

pub mod bot;
pub mod camera;
pub mod chat;
pub mod config;
pub mod delivery;
pub mod error;

pub use bot::Bot;
pub use config::{CameraSettings, ServerConfig};
pub use error::ServerError;
