pub mod config;
pub mod mqtt;
pub mod push;
pub mod telemetry;
pub mod ui;

use crate::config::AppConfig;
use crate::mqtt::message_manager::inbound_channel;
use crate::mqtt::mqtt_handler::MqttHandle;
use crate::push::{ConfiguredHost, HostPlatform, PushRegistration};
use crate::ui::ProxmoxRemoteUI;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    if let Err(e) = AppConfig::ensure_default_config().await {
        warn!("Could not write default config: {}", e);
    }
    let config = AppConfig::load().await?;
    info!("Loaded config, broker {}:{}", config.mqtt.host, config.mqtt.port);

    let shutdown = CancellationToken::new();

    // Gateway -> UI
    let (router, inbound) = inbound_channel(config.mqtt.channel_capacity);
    let mqtt_config = config.mqtt_config();
    let server = mqtt_config.server.clone();
    let (publisher, status) = MqttHandle::spawn(
        mqtt_config,
        move |message| router.route(message),
        shutdown.child_token(),
    );

    let host: Arc<dyn HostPlatform> = Arc::new(ConfiguredHost::new(config.push.clone()));
    let push_outcome = PushRegistration::spawn(
        host,
        publisher.clone(),
        config.push.presentation,
        config.push_timeout(),
        shutdown.child_token(),
    );

    info!("Starting UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title("Proxmox Remote")
        .with_inner_size([420.0, 640.0])
        .with_fullscreen(config.ui.fullscreen);

    let repaint_interval = Duration::from_millis(config.ui.repaint_interval_ms);
    let ui_result = eframe::run_native(
        "Proxmox Remote",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(ProxmoxRemoteUI::new(
                cc,
                publisher,
                inbound,
                status,
                push_outcome,
                server,
                repaint_interval,
            )))
        }),
    );

    shutdown.cancel();
    ui_result.map_err(|e| eyre!("UI terminated with error: {}", e))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

const DEFAULT_LOG_FILTER: &str = "info";

/// Filter from a `RUST_LOG` style directive. Falls back to `info` when the
/// directive is missing or does not parse.
fn log_filter(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn setup_logging_env() {
    let directive = std::env::var("RUST_LOG").ok();
    FmtSubscriber::builder()
        .with_env_filter(log_filter(directive.as_deref()))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
