//! # MQTT Gateway
//!
//! Owns the single broker connection of the app. It subscribes to
//! `proxmox/state` and `proxmox/on`, hands every inbound message to one
//! registered handler and exposes a fire-and-forget [`publisher::Publisher`].
//!
//! ```text
//! mqtt/
//! ├── config.rs           - topics and connection parameters
//! ├── message_manager.rs  - inbound message representation
//! ├── mqtt_handler.rs     - connection state machine and event loop
//! └── publisher.rs        - outbound publish handle
//! ```
//!
//! Connect, reconnect and delivery are rumqttc's job. This module only logs
//! failures and keeps a status snapshot for the UI.

pub mod config;
pub mod message_manager;
pub mod mqtt_handler;
pub mod publisher;
