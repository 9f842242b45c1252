use eframe::egui::{vec2, Align2, FontId, RichText, Sense, Stroke, Ui};

use super::gauge::circular_gauge;
use crate::mqtt::publisher::Publisher;
use crate::telemetry::PresentationSync;

const GAUGE_RADIUS: f32 = 80.0;
const BUTTON_HEIGHT: f32 = 80.0;

/// Turns the per-frame pointer state of the power button into press-in,
/// press-out and press events.
#[derive(Debug, Default)]
pub struct PressTracker {
    held: bool,
}

impl PressTracker {
    pub fn update<P: Publisher>(
        &mut self,
        sync: &mut PresentationSync<P>,
        held: bool,
        clicked: bool,
    ) {
        match (self.held, held) {
            (false, true) => sync.press_in(),
            (true, false) => sync.press_out(),
            _ => {}
        }
        self.held = held;

        if clicked {
            sync.press();
        }
    }
}

/// Title, the two gauges and the power button.
pub fn render<P: Publisher>(
    ui: &mut Ui,
    sync: &mut PresentationSync<P>,
    tracker: &mut PressTracker,
) {
    let display = sync.display();

    ui.add_space(40.0);
    ui.horizontal(|ui| {
        ui.add_space(20.0);
        ui.label(
            RichText::new(display.title.text)
                .color(display.title.color)
                .size(21.0),
        );
    });

    ui.add_space(40.0);
    let gauge_row_width = ui.available_width() * 0.9;
    ui.horizontal(|ui| {
        let side = (ui.available_width() - gauge_row_width) / 2.0;
        let gap = (gauge_row_width - 4.0 * GAUGE_RADIUS).max(0.0);
        ui.add_space(side);
        circular_gauge(ui, &display.ping, GAUGE_RADIUS);
        ui.add_space(gap);
        circular_gauge(ui, &display.rssi, GAUGE_RADIUS);
    });

    ui.add_space(40.0);
    let (rect, response) =
        ui.allocate_exact_size(vec2(ui.available_width(), BUTTON_HEIGHT), Sense::click());
    tracker.update(sync, response.is_pointer_button_down_on(), response.clicked());

    let color = sync.display().button_color;
    let painter = ui.painter();
    let stroke = Stroke::new(1.0, color);
    painter.hline(rect.x_range(), rect.top(), stroke);
    painter.hline(rect.x_range(), rect.bottom(), stroke);
    painter.text(
        rect.center(),
        Align2::CENTER_CENTER,
        "TURN ON",
        FontId::proportional(16.0),
        color,
    );
}
