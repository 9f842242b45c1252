use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::host::{
    HostError, HostPlatform, HostPlatformKind, NotificationBehavior, NotificationChannel,
    PermissionStatus,
};
use crate::mqtt::config::TOKEN_TOPIC;
use crate::mqtt::publisher::Publisher;

pub const NOT_PHYSICAL_DEVICE_ALERT: &str =
    "Must be on a physical device to receive push notifications";
pub const PERMISSION_ALERT: &str = "Failed to get push token for push notification!";

/// Terminal outcomes of a failed registration. None of them is retried.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("not running on a physical device")]
    NotPhysicalDevice,

    #[error("notification permission {0:?}")]
    PermissionDenied(PermissionStatus),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("push registration timed out after {0:?}")]
    TimedOut(Duration),

    #[error("push registration cancelled")]
    Cancelled,
}

impl PushError {
    /// Text shown to the user in the alert dialog.
    pub fn alert_text(&self) -> String {
        match self {
            PushError::NotPhysicalDevice => NOT_PHYSICAL_DEVICE_ALERT.to_string(),
            PushError::PermissionDenied(_) => PERMISSION_ALERT.to_string(),
            other => format!("{}: {}", PERMISSION_ALERT, other),
        }
    }
}

async fn acquire_token<H>(host: &H) -> Result<String, PushError>
where
    H: HostPlatform + ?Sized,
{
    if !host.is_physical_device() {
        return Err(PushError::NotPhysicalDevice);
    }

    let status = host.request_permissions().await;
    if status != PermissionStatus::Granted {
        return Err(PushError::PermissionDenied(status));
    }

    if host.kind() == HostPlatformKind::Android {
        host.set_notification_channel(NotificationChannel::default_channel())
            .await?;
    }

    Ok(host.push_token().await?)
}

/// Obtains the device push token and publishes it once to
/// `proxmox/expo-token`. Nothing is published on any failure path.
pub async fn register_for_push<H, P>(
    host: &H,
    publisher: &P,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<String, PushError>
where
    H: HostPlatform + ?Sized,
    P: Publisher + ?Sized,
{
    let token = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(PushError::Cancelled),
        acquired = tokio::time::timeout(timeout, acquire_token(host)) => match acquired {
            Ok(token) => token?,
            Err(_) => return Err(PushError::TimedOut(timeout)),
        },
    };

    publisher.publish(TOKEN_TOPIC, &token);
    info!("Push token forwarded to {}", TOKEN_TOPIC);
    Ok(token)
}

/// Installs the foreground notification handler, then runs
/// [`register_for_push`] on its own task and reports the outcome.
pub struct PushRegistration;

impl PushRegistration {
    /// The handler is installed before the task starts, whatever the
    /// registration outcome turns out to be.
    pub fn spawn<P>(
        host: Arc<dyn HostPlatform>,
        publisher: P,
        presentation: NotificationBehavior,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> oneshot::Receiver<Result<String, PushError>>
    where
        P: Publisher + 'static,
    {
        host.set_notification_handler(presentation);

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = register_for_push(host.as_ref(), &publisher, timeout, &cancel).await;
            if let Err(e) = &outcome {
                warn!("Push registration aborted: {}", e);
            }
            if tx.send(outcome).is_err() {
                error!("Push registration outcome dropped, receiver gone");
            }
        });
        rx
    }
}
