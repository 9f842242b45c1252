//! # Telemetry
//!
//! Presentation-side state for the Proxmox watchdog:
//!
//! ```text
//! telemetry/
//! ├── snapshot.rs  - ServerState and the validated proxmox/state decoder
//! ├── display.rs   - title table, gauges, button colors
//! └── sync.rs      - PresentationSync, the snapshot owner and command sender
//! ```
//!
//! The snapshot is written only by inbound messages and read only by the
//! render path. Everything drawn is derived from it on each frame.

pub mod display;
pub mod snapshot;
pub mod sync;

pub use display::{ButtonFeedback, DisplayState, Gauge, Palette};
pub use snapshot::{DecodeError, ServerState, TelemetrySnapshot};
pub use sync::{Applied, PresentationSync};
