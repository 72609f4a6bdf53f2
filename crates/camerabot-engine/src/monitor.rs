//! Alert monitoring task spawned by [`AlarmService::start`].
//!
//! Reads the camera's alert stream while the service is started. Every chunk
//! counts as one alert; at most one snapshot notification is sent per alert
//! delay window. The loop re-checks the started flag around every chunk and
//! reconnects a dropped stream after the reconnect interval.
//!
//! [`AlarmService::start`]: crate::alarm::AlarmService

use std::sync::Arc;

use futures::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use camerabot_shared::events::{AlertSnapshot, OutboundEvent};
use camerabot_shared::HandlerError;

use crate::alarm::AlarmService;

pub(crate) async fn run(
    service: Arc<AlarmService>,
    cancel: CancellationToken,
) -> Result<(), HandlerError> {
    let cam = service.cam().clone();
    let mut last_notified: Option<Instant> = None;

    info!(camera = %cam.id(), "Alarm monitoring started");

    'outer: while service.is_started() {
        let opened = tokio::select! {
            _ = cancel.cancelled() => break 'outer,
            opened = cam.alert_stream() => opened,
        };

        match opened {
            Ok(mut stream) => loop {
                let chunk = tokio::select! {
                    _ = cancel.cancelled() => break 'outer,
                    chunk = stream.next() => chunk,
                };

                if !service.is_started() {
                    break 'outer;
                }

                match chunk {
                    Some(Ok(chunk)) => {
                        handle_alert(&service, &chunk, &mut last_notified).await?;
                    }
                    Some(Err(e)) => {
                        warn!(camera = %cam.id(), error = %e, "Alert stream failed");
                        break;
                    }
                    None => {
                        debug!(camera = %cam.id(), "Alert stream ended");
                        break;
                    }
                }
            },
            Err(e) => {
                warn!(camera = %cam.id(), error = %e, "Failed to open alert stream");
            }
        }

        if !service.is_started() {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(service.reconnect_interval()) => {}
        }
    }

    info!(camera = %cam.id(), "Alarm monitoring finished");
    Ok(())
}

async fn handle_alert(
    service: &AlarmService,
    chunk: &str,
    last_notified: &mut Option<Instant>,
) -> Result<(), HandlerError> {
    let cam = service.cam();
    let alert_count = service.increase_alert_count();
    debug!(camera = %cam.id(), alert_count, chunk_len = chunk.len(), "Alert received");

    let due = last_notified.map_or(true, |at| at.elapsed() >= service.alert_delay());
    if !due {
        return Ok(());
    }

    // The delay window only opens once a notification actually went out.
    let snapshot = match cam.take_snapshot(cam.snapshot_channel(), false).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(camera = %cam.id(), error = %e, "Failed to take alert snapshot");
            return Ok(());
        }
    };
    service
        .result_queue()
        .put(OutboundEvent::AlertSnapshot(AlertSnapshot {
            cam: cam.info(),
            img: snapshot.image,
            create_ts: snapshot.created_at,
            alert_count,
        }))
        .await?;
    *last_notified = Some(Instant::now());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use camerabot_shared::types::DetectionType;

    use crate::alarm::tests::FakeCamera;
    use crate::alarm::{AlertConfig, AlarmService, DetectionConfig};
    use crate::queue::result_channel;
    use crate::service::Service;

    use super::*;

    fn motion_only(delay_secs: u64) -> AlertConfig {
        AlertConfig {
            delay_secs,
            motion: DetectionConfig { enabled: true },
            ..AlertConfig::default()
        }
    }

    async fn wait_for_count(service: &AlarmService, count: u64) {
        for _ in 0..200 {
            if service.alert_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("alert count never reached {count}");
    }

    #[tokio::test]
    async fn test_each_alert_is_counted_once() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let alerts = cam.push_alert_stream();
        let (queue, mut rx) = result_channel(16);
        let service = AlarmService::new(cam.clone(), motion_only(0), queue);

        service.start().await.unwrap();
        assert_eq!(cam.switch_calls(), vec![(DetectionType::Motion, true)]);

        alerts.send(Ok("motion".to_string())).await.unwrap();
        alerts.send(Ok("motion".to_string())).await.unwrap();
        wait_for_count(&service, 2).await;

        let first = rx.get().await.unwrap();
        match first {
            OutboundEvent::AlertSnapshot(alert) => {
                assert_eq!(alert.alert_count, 1);
                assert_eq!(alert.cam.id.as_str(), "cam_1");
            }
            other => panic!("unexpected event {other:?}"),
        }

        service.shutdown().await;
        assert_eq!(service.alert_count(), 2);
    }

    #[tokio::test]
    async fn test_alert_delay_throttles_notifications() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let alerts = cam.push_alert_stream();
        let (queue, mut rx) = result_channel(16);
        let service = AlarmService::new(cam, motion_only(3600), queue);

        service.start().await.unwrap();
        for _ in 0..3 {
            alerts.send(Ok("motion".to_string())).await.unwrap();
        }
        wait_for_count(&service, 3).await;
        service.shutdown().await;

        assert!(matches!(rx.try_get(), Some(OutboundEvent::AlertSnapshot(_))));
        assert_eq!(rx.try_get(), None);
    }

    #[tokio::test]
    async fn test_stop_lets_monitor_exit_on_next_chunk() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let alerts = cam.push_alert_stream();
        let (queue, _rx) = result_channel(16);
        let service = AlarmService::new(cam, motion_only(0), queue);

        service.start().await.unwrap();
        alerts.send(Ok("motion".to_string())).await.unwrap();
        wait_for_count(&service, 1).await;

        service.stop().await.unwrap();
        assert!(!service.monitor_finished().await);
        alerts.send(Ok("motion".to_string())).await.unwrap();

        // The chunk after stop is not counted and the task winds down by itself.
        let mut finished = false;
        for _ in 0..200 {
            if service.monitor_finished().await {
                finished = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(finished, "monitoring task kept running after stop");
        assert_eq!(service.alert_count(), 1);
        service.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_snapshot_does_not_start_delay_window() {
        let cam = FakeCamera::new("cam_1");
        cam.snapshot_failures.store(1, std::sync::atomic::Ordering::SeqCst);
        let cam = Arc::new(cam);
        let alerts = cam.push_alert_stream();
        let (queue, mut rx) = result_channel(16);
        let service = AlarmService::new(cam, motion_only(3600), queue);

        service.start().await.unwrap();
        alerts.send(Ok("motion".to_string())).await.unwrap();
        alerts.send(Ok("motion".to_string())).await.unwrap();
        wait_for_count(&service, 2).await;
        service.shutdown().await;

        match rx.try_get() {
            Some(OutboundEvent::AlertSnapshot(alert)) => assert_eq!(alert.alert_count, 2),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(rx.try_get(), None);
    }

    #[tokio::test]
    async fn test_monitor_reconnects_after_stream_ends() {
        let cam = Arc::new(FakeCamera::new("cam_1"));
        let first = cam.push_alert_stream();
        let second = cam.push_alert_stream();
        let (queue, _rx) = result_channel(16);
        let service = AlarmService::with_reconnect_interval(
            cam,
            motion_only(0),
            queue,
            Duration::from_millis(1),
        );

        service.start().await.unwrap();
        first.send(Ok("motion".to_string())).await.unwrap();
        drop(first);
        wait_for_count(&service, 1).await;

        second.send(Ok("motion".to_string())).await.unwrap();
        wait_for_count(&service, 2).await;
        service.shutdown().await;
    }
}
