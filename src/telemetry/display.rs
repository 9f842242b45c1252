use eframe::egui::Color32;

use super::snapshot::{ServerState, TelemetrySnapshot};

pub struct Palette;

impl Palette {
    pub const BACKGROUND: Color32 = Color32::from_rgb(0x21, 0x21, 0x21);
    pub const RED: Color32 = Color32::from_rgb(0xd3, 0x43, 0x5c);
    pub const GREEN: Color32 = Color32::from_rgb(0x2e, 0xcc, 0x71);
    pub const YELLOW: Color32 = Color32::from_rgb(0xff, 0xff, 0x00);
    pub const BLUE: Color32 = Color32::from_rgb(0x03, 0xc0, 0xf8);

    pub const PING_GAUGE: Color32 = Palette::GREEN;
    pub const RSSI_GAUGE: Color32 = Palette::RED;
    pub const BUTTON_IDLE: Color32 = Palette::BLUE;
    pub const BUTTON_PRESSED: Color32 = Palette::YELLOW;
}

pub const PING_MAX: f32 = 100.0;
pub const RSSI_MAX: f32 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Title {
    pub text: &'static str,
    pub color: Color32,
}

impl ServerState {
    /// Title shown at the top of the dashboard.
    pub fn title(self) -> Title {
        let (text, color) = match self {
            ServerState::Offline => ("Proxmox is offline", Palette::RED),
            ServerState::Online => ("Proxmox is online", Palette::GREEN),
            ServerState::Waiting => ("Waiting for ping...", Palette::YELLOW),
            ServerState::Error => ("Something went wrong!", Palette::RED),
            ServerState::Unknown => ("NodeMCU offline", Palette::RED),
        };
        Title { text, color }
    }
}

/// Visual state of the power button. Only reflects the pointer, never the
/// outcome of the command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonFeedback {
    #[default]
    Idle,
    Pressed,
}

impl ButtonFeedback {
    pub fn color(self) -> Color32 {
        match self {
            ButtonFeedback::Idle => Palette::BUTTON_IDLE,
            ButtonFeedback::Pressed => Palette::BUTTON_PRESSED,
        }
    }
}

/// Circular indicator bounded by `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gauge {
    pub title: &'static str,
    pub value: f32,
    pub max: f32,
    pub color: Color32,
}

impl Gauge {
    fn new(title: &'static str, value: Option<f64>, max: f32, color: Color32) -> Self {
        Self {
            title,
            value: value.unwrap_or(0.0) as f32,
            max,
            color,
        }
    }

    /// Share of the ring to fill, clamped to `[0, 1]`.
    pub fn fill(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.value / self.max).clamp(0.0, 1.0)
    }
}

/// Everything the dashboard draws, derived from the snapshot and the
/// button feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub title: Title,
    pub ping: Gauge,
    pub rssi: Gauge,
    pub button_color: Color32,
}

impl DisplayState {
    pub fn derive(snapshot: &TelemetrySnapshot, button: ButtonFeedback) -> Self {
        Self {
            title: snapshot.server_state.title(),
            ping: Gauge::new("Ping", snapshot.ping, PING_MAX, Palette::PING_GAUGE),
            rssi: Gauge::new("RSSI", snapshot.rssi, RSSI_MAX, Palette::RSSI_GAUGE),
            button_color: button.color(),
        }
    }
}
