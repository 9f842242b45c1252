//! Broker connection lifecycle.
//!
//! `MqttHandler<Configured>` holds the client identity and the single inbound
//! handler; `connect()` moves it to `MqttHandler<Connected>`, whose `run` loop
//! drives the rumqttc event loop. Reconnects are left to rumqttc: after an
//! error the loop pauses and polls again, and subscriptions are reissued on
//! every ConnAck.

use std::sync::Arc;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use statum::{machine, state};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::MqttConfig;
use super::message_manager::MQTTMessage;
use super::publisher::MqttPublisher;

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
    Reconnecting,
}

#[derive(Clone, Debug, Default)]
pub struct MQTTStatus {
    pub connection_state: ConnectionState,
    pub last_error: Option<String>,
    pub messages_received: usize,
    /// Publishes handed to the client queue. Delivery is not confirmed.
    pub messages_queued: usize,
    pub last_activity: Option<chrono::DateTime<chrono::Local>>,
}

impl MQTTStatus {
    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }
}

/// Callback invoked on the gateway task for every inbound message.
pub type MessageHandler = Box<dyn FnMut(MQTTMessage) + Send + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to subscribe to {topic}: {reason}")]
    Subscribe { topic: String, reason: String },
}

/// What an event loop event means for the gateway.
#[derive(Debug, PartialEq)]
pub(crate) enum Inbound {
    ConnAck,
    Message(MQTTMessage),
    Ignored,
}

pub(crate) fn classify(event: &Event) -> Inbound {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => Inbound::ConnAck,
        Event::Incoming(Packet::Publish(publish)) => {
            Inbound::Message(MQTTMessage::from_payload(&publish.topic, &publish.payload))
        }
        _ => Inbound::Ignored,
    }
}

pub(crate) fn mqtt_options(config: &MqttConfig) -> MqttOptions {
    let mut mqtt_options = MqttOptions::new(
        config.client_id.clone(),
        config.server.host.clone(),
        config.server.port,
    );
    mqtt_options.set_keep_alive(config.keep_alive);
    if !config.server.user.is_empty() {
        mqtt_options.set_credentials(config.server.user.clone(), config.server.pw.clone());
    }
    mqtt_options
}

#[state]
#[derive(Debug, Clone)]
pub enum GatewayState {
    Configured,
    Connected,
}

#[machine]
pub struct MqttHandler<S: GatewayState> {
    config: MqttConfig,
    client: AsyncClient,
    event_loop: EventLoop,
    handler: Option<MessageHandler>,
    status: Arc<watch::Sender<MQTTStatus>>,
}

impl<S: GatewayState> MqttHandler<S> {
    /// Cloneable publish handle bound to this connection.
    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher::new(self.client.clone(), self.status.clone())
    }

    pub fn status(&self) -> watch::Receiver<MQTTStatus> {
        self.status.subscribe()
    }
}

impl MqttHandler<Configured> {
    pub fn create(config: MqttConfig) -> Self {
        let mqtt_options = mqtt_options(&config);
        let (client, event_loop) = AsyncClient::new(mqtt_options, config.channel_capacity);
        let (status_tx, _) = watch::channel(MQTTStatus::default());

        debug!(
            "Created MQTT client {} for {}",
            config.client_id, config.server
        );
        Self::new(config, client, event_loop, None, Arc::new(status_tx))
    }

    /// Registers the inbound handler. Only one handler is kept; a later call
    /// replaces the earlier one.
    pub fn on_message<F>(&mut self, handler: F)
    where
        F: FnMut(MQTTMessage) + Send + 'static,
    {
        if self.handler.is_some() {
            warn!("Replacing previously registered MQTT message handler");
        }
        self.handler = Some(Box::new(handler));
    }

    pub fn connect(self) -> MqttHandler<Connected> {
        info!(
            "Connecting to MQTT broker {} as {}",
            self.config.server, self.config.client_id
        );
        self.status.send_modify(|status| {
            status.connection_state = ConnectionState::Connecting;
        });
        self.transition()
    }
}

impl MqttHandler<Connected> {
    /// Polls the broker until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("MQTT gateway shutting down");
                    if let Err(e) = self.client.try_disconnect() {
                        debug!("Disconnect request not queued: {}", e);
                    }
                    break;
                }
                polled = self.event_loop.poll() => match polled {
                    Ok(event) => self.dispatch(event),
                    Err(e) => {
                        error!("MQTT connection error: {}", e);
                        self.record_failure(e.to_string());
                        if self.pause_or_cancelled(&shutdown).await {
                            info!("MQTT gateway shutting down");
                            break;
                        }
                    }
                },
            }
        }
    }

    /// Waits out the poll pause. Returns `true` if `shutdown` fired first.
    async fn pause_or_cancelled(&mut self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => true,
            _ = tokio::time::sleep(self.config.poll_error_pause) => false,
        }
    }

    pub(crate) fn dispatch(&mut self, event: Event) {
        match classify(&event) {
            Inbound::ConnAck => {
                info!("Connected to {}", self.config.server);
                self.status.send_modify(|status| {
                    status.connection_state = ConnectionState::Connected;
                    status.last_error = None;
                    status.last_activity = Some(chrono::Local::now());
                });
                if let Err(e) = self.subscribe_all() {
                    error!("{}", e);
                }
            }
            Inbound::Message(message) => {
                debug!("Received message: {}", message);
                self.status.send_modify(|status| {
                    status.messages_received += 1;
                    status.last_activity = Some(chrono::Local::now());
                });
                match self.handler.as_mut() {
                    Some(handler) => handler(message),
                    None => warn!("No handler registered, dropping {}", message),
                }
            }
            Inbound::Ignored => debug!("MQTT event: {:?}", event),
        }
    }

    fn subscribe_all(&self) -> Result<(), GatewayError> {
        for topic in &self.config.subbed_topics {
            self.client
                .try_subscribe(topic.as_str(), QoS::AtMostOnce)
                .map_err(|e| GatewayError::Subscribe {
                    topic: topic.clone(),
                    reason: e.to_string(),
                })?;
            debug!("Subscribed to {}", topic);
        }
        Ok(())
    }

    fn record_failure(&self, reason: String) {
        self.status.send_modify(|status| {
            status.connection_state = match status.connection_state {
                ConnectionState::Connected | ConnectionState::Reconnecting => {
                    ConnectionState::Reconnecting
                }
                _ => ConnectionState::Failed,
            };
            status.last_error = Some(reason);
        });
    }
}

/// Spawns the gateway on the tokio runtime.
pub struct MqttHandle;

impl MqttHandle {
    pub fn spawn<F>(
        config: MqttConfig,
        handler: F,
        shutdown: CancellationToken,
    ) -> (MqttPublisher, watch::Receiver<MQTTStatus>)
    where
        F: FnMut(MQTTMessage) + Send + 'static,
    {
        let mut gateway = MqttHandler::create(config);
        gateway.on_message(handler);

        let publisher = gateway.publisher();
        let status = gateway.status();

        let connected = gateway.connect();
        tokio::spawn(connected.run(shutdown));
        info!("MQTT gateway task started");

        (publisher, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::config::{COMMAND_TOPIC, STATE_TOPIC};
    use crate::ui::MQTTServer;
    use rumqttc::{ConnAck, ConnectReturnCode, Publish};
    use std::sync::Mutex;
    use std::time::Duration;

    fn test_config() -> MqttConfig {
        MqttConfig {
            server: MQTTServer {
                host: "broker.local".into(),
                port: 1884,
                user: "user".into(),
                pw: "pw".into(),
            },
            keep_alive: Duration::from_secs(9),
            ..MqttConfig::default()
        }
    }

    fn publish_event(topic: &str, payload: &str) -> Event {
        Event::Incoming(Packet::Publish(Publish::new(
            topic,
            QoS::AtMostOnce,
            payload.as_bytes().to_vec(),
        )))
    }

    #[test]
    fn options_use_configured_identity() {
        let options = mqtt_options(&test_config());
        assert_eq!(
            options.broker_address(),
            ("broker.local".to_string(), 1884)
        );
        assert_eq!(options.client_id(), "Proxmox-MobileApp");
        assert_eq!(options.keep_alive(), Duration::from_secs(9));
    }

    #[test]
    fn classify_maps_publish_to_message() {
        match classify(&publish_event(STATE_TOPIC, "{}")) {
            Inbound::Message(msg) => {
                assert_eq!(msg.topic, STATE_TOPIC);
                assert_eq!(msg.content, "{}");
            }
            other => panic!("unexpected {:?}", other),
        }
        let ack = Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::Success,
            false,
        )));
        assert_eq!(classify(&ack), Inbound::ConnAck);
        assert_eq!(classify(&Event::Incoming(Packet::PingResp)), Inbound::Ignored);
    }

    #[tokio::test]
    async fn only_the_latest_handler_receives_messages() {
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let mut gateway = MqttHandler::create(test_config());
        let sink = first.clone();
        gateway.on_message(move |msg| sink.lock().expect("lock").push(msg.content));
        let sink = second.clone();
        gateway.on_message(move |msg| sink.lock().expect("lock").push(msg.content));

        let mut connected = gateway.connect();
        connected.dispatch(publish_event(COMMAND_TOPIC, "power"));

        assert!(first.lock().expect("lock").is_empty());
        assert_eq!(*second.lock().expect("lock"), vec!["power".to_string()]);
    }

    #[tokio::test]
    async fn status_tracks_connection_lifecycle() {
        let gateway = MqttHandler::create(test_config());
        let status = gateway.status();
        assert_eq!(status.borrow().connection_state, ConnectionState::Disconnected);

        let mut connected = gateway.connect();
        assert_eq!(status.borrow().connection_state, ConnectionState::Connecting);

        connected.record_failure("refused".into());
        assert_eq!(status.borrow().connection_state, ConnectionState::Failed);

        connected.dispatch(Event::Incoming(Packet::ConnAck(ConnAck::new(
            ConnectReturnCode::Success,
            false,
        ))));
        assert!(status.borrow().is_connected());
        assert_eq!(status.borrow().last_error, None);

        connected.dispatch(publish_event(STATE_TOPIC, "{}"));
        assert_eq!(status.borrow().messages_received, 1);

        connected.record_failure("reset".into());
        assert_eq!(status.borrow().connection_state, ConnectionState::Reconnecting);
        assert_eq!(status.borrow().last_error.as_deref(), Some("reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn error_pause_ends_early_on_shutdown() {
        let config = MqttConfig {
            poll_error_pause: Duration::from_secs(3600),
            ..test_config()
        };
        let mut connected = MqttHandler::create(config).connect();

        let shutdown = CancellationToken::new();
        let started = tokio::time::Instant::now();
        assert!(!connected.pause_or_cancelled(&shutdown).await);
        assert!(started.elapsed() >= Duration::from_secs(3600));

        shutdown.cancel();
        let started = tokio::time::Instant::now();
        assert!(connected.pause_or_cancelled(&shutdown).await);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
