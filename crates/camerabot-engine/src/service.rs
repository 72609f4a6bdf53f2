//! Per-camera service registry.
//!
//! Alarm and stream services are looked up by `(camera, service type,
//! service name)`. The alarm service is also kept under its concrete type,
//! because detection toggles call its trigger switch directly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use camerabot_shared::types::{AlarmType, CameraId, ServiceName, ServiceType};
use camerabot_shared::ServiceError;

use crate::alarm::AlarmService;

/// A start/stop service bound to one camera.
#[async_trait]
pub trait Service: Send + Sync {
    fn service_type(&self) -> ServiceType;

    fn name(&self) -> ServiceName;

    fn started(&self) -> bool;

    async fn start(&self) -> Result<(), ServiceError>;

    async fn stop(&self) -> Result<(), ServiceError>;
}

#[derive(Default)]
pub struct ServiceManager {
    services: RwLock<HashMap<(CameraId, ServiceName), Arc<dyn Service>>>,
    alarms: RwLock<HashMap<CameraId, Arc<AlarmService>>>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, camera: CameraId, service: Arc<dyn Service>) {
        let name = service.name();
        info!(camera = %camera, service = %name, "Registered service");
        self.services.write().await.insert((camera, name), service);
    }

    pub async fn register_alarm(&self, service: Arc<AlarmService>) {
        let camera = service.camera_id().clone();
        self.alarms
            .write()
            .await
            .insert(camera.clone(), service.clone());
        self.register(camera, service).await;
    }

    pub async fn get(
        &self,
        camera: &CameraId,
        service_type: ServiceType,
        service_name: ServiceName,
    ) -> Result<Arc<dyn Service>, ServiceError> {
        let not_registered = || ServiceError::NotRegistered {
            camera: camera.clone(),
            service_type,
            service_name,
        };

        if service_name.service_type() != service_type {
            return Err(not_registered());
        }

        self.services
            .read()
            .await
            .get(&(camera.clone(), service_name))
            .cloned()
            .ok_or_else(not_registered)
    }

    pub async fn alarm(&self, camera: &CameraId) -> Result<Arc<AlarmService>, ServiceError> {
        self.alarms
            .read()
            .await
            .get(camera)
            .cloned()
            .ok_or_else(|| ServiceError::NotRegistered {
                camera: camera.clone(),
                service_type: ServiceType::Alarm,
                service_name: ServiceName::Alarm(AlarmType::Alarm),
            })
    }

    pub async fn start(
        &self,
        camera: &CameraId,
        service_type: ServiceType,
        service_name: ServiceName,
    ) -> Result<(), ServiceError> {
        self.get(camera, service_type, service_name)
            .await?
            .start()
            .await
    }

    pub async fn stop(
        &self,
        camera: &CameraId,
        service_type: ServiceType,
        service_name: ServiceName,
    ) -> Result<(), ServiceError> {
        self.get(camera, service_type, service_name)
            .await?
            .stop()
            .await
    }

    /// Start every alarm service whose camera has at least one trigger
    /// enabled in configuration. Failures are logged per camera.
    pub async fn start_enabled_alarms(&self) {
        let alarms: Vec<Arc<AlarmService>> = self.alarms.read().await.values().cloned().collect();

        for alarm in alarms {
            if !alarm.enabled_in_config() {
                continue;
            }
            if let Err(e) = alarm.start().await {
                warn!(camera = %alarm.camera_id(), error = %e, "Failed to auto-start alarm service");
            }
        }
    }

    /// Cancel every alarm monitoring task. Called on process shutdown.
    pub async fn shutdown(&self) {
        let alarms: Vec<Arc<AlarmService>> = self.alarms.read().await.values().cloned().collect();
        for alarm in alarms {
            alarm.shutdown().await;
        }
    }
}
