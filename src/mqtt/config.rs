use std::time::Duration;

use crate::ui;

/// Telemetry published by the NodeMCU watching the Proxmox host.
pub const STATE_TOPIC: &str = "proxmox/state";
/// Power command topic. Also subscribed, so the broker echoes our own commands.
pub const COMMAND_TOPIC: &str = "proxmox/on";
/// Push token hand-off topic.
pub const TOKEN_TOPIC: &str = "proxmox/expo-token";
pub const POWER_COMMAND: &str = "power";

#[derive(Debug, Clone, PartialEq)]
pub struct MqttConfig {
    pub subbed_topics: Vec<String>,
    pub server: ui::MQTTServer,
    pub client_id: String,
    pub keep_alive: Duration,
    pub poll_error_pause: Duration,
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            subbed_topics: vec![STATE_TOPIC.to_string(), COMMAND_TOPIC.to_string()],
            server: ui::MQTTServer::default(),
            client_id: "Proxmox-MobileApp".into(),
            keep_alive: Duration::from_secs(5),
            poll_error_pause: Duration::from_secs(1),
            channel_capacity: 100,
        }
    }
}
