//! # camerabot-engine
//!
//! Command side of the camera bot. Inbound events are routed by the
//! [`Dispatcher`] to one task handler each; every handler result, as well as
//! alarm notifications, goes through the single ordered result channel.

pub mod alarm;
pub mod dispatch;
pub mod handlers;
pub mod queue;
pub mod service;
pub mod task;

mod monitor;

pub use alarm::{AlarmService, AlertConfig, DetectionConfig};
pub use dispatch::Dispatcher;
pub use handlers::TaskHandler;
pub use queue::{result_channel, ResultQueue, ResultReceiver};
pub use service::{Service, ServiceManager};
pub use task::spawn_named;
