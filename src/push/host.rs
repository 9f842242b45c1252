use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PushSection;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatformKind {
    Android,
    Ios,
    #[default]
    Desktop,
}

/// Android channel importance. Only the level this app registers is modelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Importance {
    Max,
}

/// How a notification is presented while the app is in the foreground.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationBehavior {
    pub show_alert: bool,
    pub set_badge: bool,
    pub play_sound: bool,
}

impl Default for NotificationBehavior {
    fn default() -> Self {
        Self {
            show_alert: true,
            set_badge: true,
            play_sound: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
}

impl NotificationChannel {
    /// The channel Android needs before it will show our notifications.
    pub fn default_channel() -> Self {
        Self {
            id: "default".into(),
            name: "default".into(),
            importance: Importance::Max,
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("push token unavailable: {0}")]
    TokenUnavailable(String),

    #[error("notification channel rejected: {0}")]
    Channel(String),
}

/// Platform services the push registration flow depends on.
#[async_trait]
pub trait HostPlatform: Send + Sync {
    fn kind(&self) -> HostPlatformKind;

    fn is_physical_device(&self) -> bool;

    /// Installs the foreground presentation policy for incoming notifications.
    fn set_notification_handler(&self, behavior: NotificationBehavior);

    /// Prompts the user if needed and resolves with the final status.
    async fn request_permissions(&self) -> PermissionStatus;

    async fn set_notification_channel(&self, channel: NotificationChannel)
        -> Result<(), HostError>;

    async fn push_token(&self) -> Result<String, HostError>;
}

/// Host whose answers come from the `[push]` section of the config file.
#[derive(Debug, Clone)]
pub struct ConfiguredHost {
    settings: PushSection,
}

impl ConfiguredHost {
    pub fn new(settings: PushSection) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl HostPlatform for ConfiguredHost {
    fn kind(&self) -> HostPlatformKind {
        self.settings.platform
    }

    fn is_physical_device(&self) -> bool {
        self.settings.physical_device
    }

    fn set_notification_handler(&self, behavior: NotificationBehavior) {
        info!(
            "Foreground notifications: alert={} badge={} sound={}",
            behavior.show_alert, behavior.set_badge, behavior.play_sound
        );
    }

    async fn request_permissions(&self) -> PermissionStatus {
        debug!("Configured notification permission: {:?}", self.settings.permission);
        self.settings.permission
    }

    async fn set_notification_channel(
        &self,
        channel: NotificationChannel,
    ) -> Result<(), HostError> {
        info!(
            "Notification channel '{}' set to {:?}",
            channel.id, channel.importance
        );
        Ok(())
    }

    async fn push_token(&self) -> Result<String, HostError> {
        match self.settings.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => Err(HostError::TokenUnavailable(
                "no push token configured".into(),
            )),
        }
    }
}
