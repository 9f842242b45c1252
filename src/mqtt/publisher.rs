use rumqttc::{AsyncClient, QoS};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::mqtt_handler::MQTTStatus;

/// Outbound side of the gateway as seen by the presentation layer.
///
/// Publishing is fire-and-forget: no delivery confirmation is returned and
/// failures are only logged.
pub trait Publisher: Send + Sync {
    fn publish(&self, topic: &str, payload: &str);
}

/// Owned connection handle handed to whoever needs to publish.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    status: Arc<watch::Sender<MQTTStatus>>,
}

impl MqttPublisher {
    pub(crate) fn new(client: AsyncClient, status: Arc<watch::Sender<MQTTStatus>>) -> Self {
        Self { client, status }
    }
}

impl Publisher for MqttPublisher {
    fn publish(&self, topic: &str, payload: &str) {
        match self
            .client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
        {
            Ok(()) => {
                debug!("Queued publish on {}: {}", topic, payload);
                self.status.send_modify(|status| {
                    status.messages_queued += 1;
                    status.last_activity = Some(chrono::Local::now());
                });
            }
            Err(e) => warn!("Dropping publish on {}: {}", topic, e),
        }
    }
}

impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    fn publish(&self, topic: &str, payload: &str) {
        (**self).publish(topic, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::config::{MqttConfig, COMMAND_TOPIC, POWER_COMMAND};
    use crate::mqtt::mqtt_handler::{ConnectionState, MqttHandler};
    use crate::ui::MQTTServer;

    fn offline_config(channel_capacity: usize) -> MqttConfig {
        MqttConfig {
            server: MQTTServer {
                host: "unreachable.invalid".into(),
                port: 1883,
                ..MQTTServer::default()
            },
            channel_capacity,
            ..MqttConfig::default()
        }
    }

    #[tokio::test]
    async fn power_is_queued_once_without_a_broker() {
        let gateway = MqttHandler::create(offline_config(10));
        let status = gateway.status();
        let publisher = gateway.publisher();

        publisher.publish(COMMAND_TOPIC, POWER_COMMAND);

        let status = status.borrow();
        assert_eq!(status.connection_state, ConnectionState::Disconnected);
        assert_eq!(status.messages_queued, 1);
        assert!(status.last_activity.is_some());
    }

    #[tokio::test]
    async fn full_request_queue_drops_instead_of_blocking() {
        let gateway = MqttHandler::create(offline_config(1));
        let status = gateway.status();
        let publisher = gateway.publisher();

        publisher.publish(COMMAND_TOPIC, POWER_COMMAND);
        publisher.publish(COMMAND_TOPIC, POWER_COMMAND);

        assert_eq!(status.borrow().messages_queued, 1);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Publisher;
    use std::sync::Mutex;

    /// Records every publish for assertions.
    #[derive(Default)]
    pub struct RecordingPublisher {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingPublisher {
        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().expect("publisher lock").clone()
        }

        pub fn sent_to(&self, topic: &str) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter(|(t, _)| t == topic)
                .map(|(_, payload)| payload)
                .collect()
        }
    }

    impl Publisher for RecordingPublisher {
        fn publish(&self, topic: &str, payload: &str) {
            self.sent
                .lock()
                .expect("publisher lock")
                .push((topic.to_string(), payload.to_string()));
        }
    }
}
