//! Shared UI data and the status strip palette.

use eframe::egui::{Color32, Frame, Stroke};
use std::fmt;

/// Broker connection parameters, shared between the UI and the gateway.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MQTTServer {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pw: String,
}

impl fmt::Display for MQTTServer {
    /// Password is left out on purpose.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.user.is_empty() {
            write!(f, "{}:{}", self.host, self.port)
        } else {
            write!(f, "{}@{}:{}", self.user, self.host, self.port)
        }
    }
}

pub fn create_frame(bg_color: Color32, border_color: Color32) -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, border_color))
        .fill(bg_color)
        .inner_margin(4)
        .outer_margin(2)
}

pub struct UiColors;

impl UiColors {
    /// Status strip background (RGB: 25, 25, 25)
    pub const INNER_BG: Color32 = Color32::from_rgb(25, 25, 25);

    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);

    /// Connected (green)
    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    /// Disconnected (red)
    pub const INACTIVE: Color32 = Color32::from_rgb(200, 50, 20);

    pub const MUTED_TEXT: Color32 = Color32::from_rgb(150, 150, 150);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hides_password() {
        let server = MQTTServer {
            host: "broker".into(),
            port: 1883,
            user: "node".into(),
            pw: "secret".into(),
        };
        assert_eq!(server.to_string(), "node@broker:1883");

        let anonymous = MQTTServer {
            user: String::new(),
            ..server
        };
        assert_eq!(anonymous.to_string(), "broker:1883");
    }
}
