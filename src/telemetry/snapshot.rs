use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Reported state of the Proxmox host.
///
/// Wire strings other than the four known ones map to [`ServerState::Unknown`],
/// as does the empty snapshot before the first message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ServerState {
    Offline,
    Online,
    Waiting,
    Error,
    #[default]
    Unknown,
}

#[cfg(test)]
impl ServerState {
    pub const ALL: [ServerState; 5] = [
        ServerState::Offline,
        ServerState::Online,
        ServerState::Waiting,
        ServerState::Error,
        ServerState::Unknown,
    ];
}

impl ServerState {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "offline" => ServerState::Offline,
            "online" => ServerState::Online,
            "waiting" => ServerState::Waiting,
            "error" => ServerState::Error,
            _ => ServerState::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for ServerState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ServerState::from_wire(&raw))
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("payload does not match the telemetry schema: {0}")]
    Schema(#[source] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSnapshot {
    server_state: ServerState,
    ping: f64,
    rssi: f64,
}

/// Latest known device telemetry. Replaced wholesale by every decoded message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub server_state: ServerState,
    pub ping: Option<f64>,
    pub rssi: Option<f64>,
}

impl TelemetrySnapshot {
    /// Decodes a `proxmox/state` payload.
    ///
    /// The payload must be an object with a string `serverState` and numeric
    /// `ping` and `rssi`. Extra keys are ignored.
    pub fn decode(payload: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(payload).map_err(DecodeError::Json)?;
        if !value.is_object() {
            return Err(DecodeError::NotAnObject(json_kind(&value)));
        }
        let wire: WireSnapshot = serde_json::from_value(value).map_err(DecodeError::Schema)?;

        Ok(Self {
            server_state: wire.server_state,
            ping: Some(wire.ping),
            rssi: Some(wire.rssi),
        })
    }
}

#[cfg(test)]
impl TelemetrySnapshot {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_payload() {
        let snapshot =
            TelemetrySnapshot::decode(r#"{"serverState":"online","ping":12,"rssi":-50}"#)
                .expect("decode");
        assert_eq!(snapshot.server_state, ServerState::Online);
        assert_eq!(snapshot.ping, Some(12.0));
        assert_eq!(snapshot.rssi, Some(-50.0));
    }

    #[test]
    fn unrecognised_state_is_unknown() {
        let snapshot =
            TelemetrySnapshot::decode(r#"{"serverState":"rebooting","ping":1,"rssi":2}"#)
                .expect("decode");
        assert_eq!(snapshot.server_state, ServerState::Unknown);
    }

    #[test]
    fn extra_keys_are_ignored() {
        let snapshot = TelemetrySnapshot::decode(
            r#"{"serverState":"waiting","ping":0,"rssi":70,"uptime":1234}"#,
        )
        .expect("decode");
        assert_eq!(snapshot.server_state, ServerState::Waiting);
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            TelemetrySnapshot::decode("power"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn rejects_non_object() {
        assert!(matches!(
            TelemetrySnapshot::decode("[1,2,3]"),
            Err(DecodeError::NotAnObject("an array"))
        ));
    }

    #[test]
    fn rejects_missing_or_mistyped_fields() {
        assert!(matches!(
            TelemetrySnapshot::decode(r#"{"serverState":"online","ping":12}"#),
            Err(DecodeError::Schema(_))
        ));
        assert!(matches!(
            TelemetrySnapshot::decode(r#"{"serverState":"online","ping":"12","rssi":3}"#),
            Err(DecodeError::Schema(_))
        ));
        assert!(matches!(
            TelemetrySnapshot::decode(r#"{"serverState":5,"ping":12,"rssi":3}"#),
            Err(DecodeError::Schema(_))
        ));
    }

    #[test]
    fn default_snapshot_is_empty() {
        let snapshot = TelemetrySnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.server_state, ServerState::Unknown);
    }
}
