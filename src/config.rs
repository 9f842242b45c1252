//! # Application Configuration
//!
//! Loads the `config.toml` that lives in `~/.proxmox-remote/` and layers the
//! broker environment variables (`MQTT_SERVER`, `MQTT_PORT`, `MQTT_USERNAME`,
//! `MQTT_PASSWORD`, `MQTT_CLIENT_ID`) on top of it. A missing file is not an
//! error: defaults are used and a fresh file can be written with
//! [`AppConfig::ensure_default_config`].

use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::mqtt::config::MqttConfig;
use crate::push::host::{HostPlatformKind, NotificationBehavior, PermissionStatus};
use crate::ui::MQTTServer;

const CONFIG_DIR: &str = ".proxmox-remote";
const CONFIG_FILE: &str = "config.toml";

/// Broker section of the config file.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BrokerSection {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: String,
    pub password: String,
    pub keep_alive_secs: u64,
    /// Pause between event loop polls after a connection error
    pub poll_error_pause_ms: u64,
    pub channel_capacity: usize,
}

impl Default for BrokerSection {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            client_id: "Proxmox-MobileApp".into(),
            username: String::new(),
            password: String::new(),
            keep_alive_secs: 5,
            poll_error_pause_ms: 1000,
            channel_capacity: 100,
        }
    }
}

/// Answers the [`ConfiguredHost`](crate::push::host::ConfiguredHost) gives
/// when the push registration flow asks the platform.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PushSection {
    pub physical_device: bool,
    pub permission: PermissionStatus,
    pub platform: HostPlatformKind,
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Foreground presentation installed at startup
    pub presentation: NotificationBehavior,
}

impl Default for PushSection {
    fn default() -> Self {
        Self {
            physical_device: false,
            permission: PermissionStatus::Undetermined,
            platform: HostPlatformKind::Desktop,
            token: None,
            timeout_secs: 30,
            presentation: NotificationBehavior::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UiSection {
    pub repaint_interval_ms: u64,
    pub fullscreen: bool,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            repaint_interval_ms: 33,
            fullscreen: false,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub mqtt: BrokerSection,
    pub push: PushSection,
    pub ui: UiSection,
}

impl AppConfig {
    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Writes a default config file if none exists yet.
    pub async fn ensure_default_config() -> Result<()> {
        Self::ensure_default_config_at(&Self::default_path()).await
    }

    pub async fn ensure_default_config_at(path: &Path) -> Result<()> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            debug!("Config file {} already present", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write default config: {}", e))?;

        info!("Wrote default config to {}", path.display());
        Ok(())
    }

    /// Loads the config from the default path and applies environment overrides.
    pub async fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::default_path()).await?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            warn!("Config file {} does not exist, using default", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file: {}", e))?;

        toml::from_str(&content).map_err(|e| eyre!("Failed to parse config file: {}", e))
    }

    /// Applies broker overrides. `lookup` resolves a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("MQTT_SERVER") {
            self.mqtt.host = host;
        }
        if let Some(raw) = lookup("MQTT_PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.mqtt.port = port,
                Err(e) => warn!("Ignoring MQTT_PORT '{}': {}", raw, e),
            }
        }
        if let Some(user) = lookup("MQTT_USERNAME") {
            self.mqtt.username = user;
        }
        if let Some(pw) = lookup("MQTT_PASSWORD") {
            self.mqtt.password = pw;
        }
        if let Some(client_id) = lookup("MQTT_CLIENT_ID") {
            self.mqtt.client_id = client_id;
        }
    }

    /// Builds the gateway configuration for this app's fixed topic set.
    pub fn mqtt_config(&self) -> MqttConfig {
        MqttConfig {
            server: MQTTServer {
                host: self.mqtt.host.clone(),
                port: self.mqtt.port,
                user: self.mqtt.username.clone(),
                pw: self.mqtt.password.clone(),
            },
            client_id: self.mqtt.client_id.clone(),
            keep_alive: Duration::from_secs(self.mqtt.keep_alive_secs),
            poll_error_pause: Duration::from_millis(self.mqtt.poll_error_pause_ms),
            channel_capacity: self.mqtt.channel_capacity,
            ..MqttConfig::default()
        }
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push.timeout_secs)
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
