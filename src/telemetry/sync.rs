use tracing::{debug, info, warn};

use super::display::{ButtonFeedback, DisplayState};
use super::snapshot::{DecodeError, TelemetrySnapshot};
use crate::mqtt::config::{COMMAND_TOPIC, POWER_COMMAND, STATE_TOPIC};
use crate::mqtt::message_manager::MQTTMessage;
use crate::mqtt::publisher::Publisher;

/// What happened to an inbound message.
#[derive(Debug)]
pub enum Applied {
    /// Snapshot replaced.
    Snapshot,
    /// Echo of a power command; snapshot untouched.
    CommandEcho,
    /// Topic we don't render.
    Ignored,
}

/// Holds the snapshot and the button feedback, and turns user input into
/// commands on the publisher it was given.
///
/// Pressing the button never changes the snapshot; new state only arrives
/// through [`PresentationSync::apply_message`].
pub struct PresentationSync<P: Publisher> {
    publisher: P,
    snapshot: TelemetrySnapshot,
    button: ButtonFeedback,
}

impl<P: Publisher> PresentationSync<P> {
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            snapshot: TelemetrySnapshot::default(),
            button: ButtonFeedback::Idle,
        }
    }

    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.snapshot
    }

    pub fn display(&self) -> DisplayState {
        DisplayState::derive(&self.snapshot, self.button)
    }

    /// Applies one inbound message. A payload that fails to decode leaves the
    /// current snapshot in place.
    pub fn apply_message(&mut self, message: &MQTTMessage) -> Result<Applied, DecodeError> {
        if message.is_on(STATE_TOPIC) {
            let snapshot = TelemetrySnapshot::decode(&message.content)?;
            if snapshot.server_state != self.snapshot.server_state {
                info!(
                    "Server state changed: {:?} -> {:?}",
                    self.snapshot.server_state, snapshot.server_state
                );
            }
            self.snapshot = snapshot;
            Ok(Applied::Snapshot)
        } else if message.is_on(COMMAND_TOPIC) {
            debug!("Command echo: {}", message.content);
            Ok(Applied::CommandEcho)
        } else {
            warn!("Ignoring message on unexpected topic {}", message.topic);
            Ok(Applied::Ignored)
        }
    }

    pub fn press_in(&mut self) {
        self.button = ButtonFeedback::Pressed;
    }

    pub fn press_out(&mut self) {
        self.button = ButtonFeedback::Idle;
    }

    /// Sends the power command. Called once per completed press.
    pub fn press(&self) {
        info!("Sending power command");
        self.publisher.publish(COMMAND_TOPIC, POWER_COMMAND);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::publisher::testing::RecordingPublisher;
    use crate::telemetry::display::Palette;
    use crate::telemetry::snapshot::ServerState;
    use std::sync::Arc;

    fn state_message(content: &str) -> MQTTMessage {
        MQTTMessage::from_topic(STATE_TOPIC.into(), content.into())
    }

    fn sync() -> (PresentationSync<Arc<RecordingPublisher>>, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        (PresentationSync::new(publisher.clone()), publisher)
    }

    #[test]
    fn online_message_updates_title_and_gauges() {
        let (mut sync, _) = sync();
        sync.apply_message(&state_message(
            r#"{"serverState":"online","ping":12,"rssi":-50}"#,
        ))
        .expect("apply");

        let display = sync.display();
        assert_eq!(display.title.text, "Proxmox is online");
        assert_eq!(display.title.color, Palette::GREEN);
        assert_eq!(display.ping.value, 12.0);
        assert_eq!(display.ping.max, 100.0);
        assert_eq!(display.rssi.value, -50.0);
        assert_eq!(display.rssi.max, 120.0);
    }

    #[test]
    fn snapshot_is_replaced_not_merged() {
        let (mut sync, _) = sync();
        sync.apply_message(&state_message(
            r#"{"serverState":"online","ping":12,"rssi":40}"#,
        ))
        .expect("first");
        sync.apply_message(&state_message(
            r#"{"serverState":"offline","ping":0,"rssi":0}"#,
        ))
        .expect("second");

        assert_eq!(
            *sync.snapshot(),
            TelemetrySnapshot {
                server_state: ServerState::Offline,
                ping: Some(0.0),
                rssi: Some(0.0),
            }
        );
    }

    #[test]
    fn malformed_payload_keeps_previous_snapshot() {
        let (mut sync, _) = sync();
        sync.apply_message(&state_message(
            r#"{"serverState":"waiting","ping":3,"rssi":4}"#,
        ))
        .expect("apply");
        let before = sync.snapshot().clone();

        assert!(sync.apply_message(&state_message("{not json")).is_err());
        assert_eq!(*sync.snapshot(), before);
    }

    #[test]
    fn command_echo_does_not_touch_snapshot() {
        let (mut sync, _) = sync();
        let applied = sync
            .apply_message(&MQTTMessage::from_topic(
                COMMAND_TOPIC.into(),
                POWER_COMMAND.into(),
            ))
            .expect("echo");
        assert!(matches!(applied, Applied::CommandEcho));
        assert!(sync.snapshot().is_empty());
    }

    #[test]
    fn press_publishes_power_once_per_press() {
        let (sync, publisher) = sync();
        sync.press();
        assert_eq!(
            publisher.sent(),
            vec![(COMMAND_TOPIC.to_string(), POWER_COMMAND.to_string())]
        );
        sync.press();
        assert_eq!(publisher.sent_to(COMMAND_TOPIC).len(), 2);
    }

    #[test]
    fn press_feedback_is_transient_and_local() {
        let (mut sync, publisher) = sync();
        sync.press_in();
        assert_eq!(sync.display().button_color, Palette::BUTTON_PRESSED);
        sync.press_out();
        assert_eq!(sync.display().button_color, Palette::BUTTON_IDLE);
        assert!(publisher.sent().is_empty());
        assert!(sync.snapshot().is_empty());
    }
}
