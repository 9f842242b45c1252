use chrono::NaiveDateTime;
use std::fmt;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use super::config::STATE_TOPIC;

const PREVIEW_CHARS: usize = 10;

/// A message that arrived on one of the subscribed topics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MQTTMessage {
    pub topic: String,
    pub content: String,
    pub timestamp: NaiveDateTime,
}

impl fmt::Display for MQTTMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let preview: String = self.content.chars().take(PREVIEW_CHARS).collect();
        write!(f, "{} - {}: {}", self.timestamp, self.topic, preview)
    }
}

impl MQTTMessage {
    pub fn from_topic(topic: String, content: String) -> Self {
        MQTTMessage {
            topic,
            content,
            timestamp: chrono::Local::now().naive_local(),
        }
    }

    /// Builds a message from a raw publish payload. Invalid UTF-8 is replaced
    /// rather than rejected so the decoder can report a proper error.
    pub fn from_payload(topic: &str, payload: &[u8]) -> Self {
        Self::from_topic(
            topic.to_string(),
            String::from_utf8_lossy(payload).into_owned(),
        )
    }

    pub fn is_on(&self, topic: &str) -> bool {
        self.topic == topic
    }
}

/// Creates the gateway to UI hand-off.
///
/// `proxmox/state` snapshots replace each other in a `watch` slot, so a slow
/// reader always ends up with the newest one. Every other topic goes through a
/// bounded queue of `capacity` and is dropped when the queue is full.
pub fn inbound_channel(capacity: usize) -> (InboundRouter, InboundReceiver) {
    let (state_tx, state_rx) = watch::channel(None);
    let (other_tx, other_rx) = mpsc::channel(capacity.max(1));
    (
        InboundRouter {
            latest_state: state_tx,
            others: other_tx,
        },
        InboundReceiver {
            latest_state: state_rx,
            others: other_rx,
        },
    )
}

/// Gateway side. Never blocks.
pub struct InboundRouter {
    latest_state: watch::Sender<Option<MQTTMessage>>,
    others: mpsc::Sender<MQTTMessage>,
}

impl InboundRouter {
    pub fn route(&self, message: MQTTMessage) {
        if message.is_on(STATE_TOPIC) {
            self.latest_state.send_replace(Some(message));
        } else if let Err(e) = self.others.try_send(message) {
            warn!("UI message queue rejected inbound message: {}", e);
        }
    }
}

pub struct InboundReceiver {
    latest_state: watch::Receiver<Option<MQTTMessage>>,
    others: mpsc::Receiver<MQTTMessage>,
}

impl InboundReceiver {
    /// Takes everything pending. Queued messages come first, followed by the
    /// newest unseen state snapshot, if any.
    pub fn drain(&mut self) -> Vec<MQTTMessage> {
        let mut pending = Vec::new();
        while let Ok(message) = self.others.try_recv() {
            pending.push(message);
        }

        let state = self.latest_state.borrow_and_update();
        if state.has_changed() {
            if let Some(message) = state.as_ref() {
                pending.push(message.clone());
            }
        }
        pending
    }
}
