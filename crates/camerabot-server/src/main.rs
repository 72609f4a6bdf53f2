//! # camerabot-server
//!
//! Camera bot process.
//!
//! This binary wires:
//! - the **result channel** and its delivery consumer, which renders every
//!   outbound event into chat messages
//! - the **dispatcher**, routing inbound commands to their task handlers
//! - one **alarm service** per configured camera, auto-started when any
//!   detection trigger is enabled in its settings
//! - the **DVR upload pipeline**, one queue and worker per enabled destination

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use camerabot_dvr::{FfmpegThumbnailer, FfprobeProber};
use camerabot_shared::constants::APP_NAME;

use camerabot_server::camera::DetachedCamera;
use camerabot_server::chat::TracingChat;
use camerabot_server::{Bot, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,camerabot_engine=debug,camerabot_dvr=debug,camerabot_server=debug")
        }))
        .init();

    info!("Starting {} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    let cameras = config.load_cameras()?;
    info!(count = cameras.len(), "Loaded camera settings");

    tokio::fs::create_dir_all(&config.dvr_path).await?;

    // -----------------------------------------------------------------------
    // 3. Build the pipeline
    // -----------------------------------------------------------------------
    let bot = Bot::start(
        &config,
        Arc::new(TracingChat),
        Arc::new(FfprobeProber::default()),
        Arc::new(FfmpegThumbnailer::default()),
    );

    for settings in cameras {
        let alert = settings.alert.clone();
        info!(
            camera = %settings.id,
            description = %settings.description,
            behind_relay = settings.behind_relay,
            "Registering camera"
        );
        bot.register_camera(Arc::new(DetachedCamera::new(settings)), alert)
            .await;
    }

    // -----------------------------------------------------------------------
    // 4. Start alarm monitoring where configured
    // -----------------------------------------------------------------------
    bot.start_enabled_alarms().await;

    // -----------------------------------------------------------------------
    // 5. Run until Ctrl+C
    // -----------------------------------------------------------------------
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down");

    bot.shutdown().await;
    Ok(())
}
