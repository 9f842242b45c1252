//! # Push Registration
//!
//! One-shot startup flow: check the device, ask for notification permission,
//! fetch the push token and forward it to the broker on `proxmox/expo-token`.
//! The flow runs under a timeout and a cancellation token; every failure is
//! terminal and ends in a user-visible alert.

pub mod host;
pub mod registration;

pub use host::{ConfiguredHost, HostPlatform};
pub use registration::{register_for_push, PushError, PushRegistration};
