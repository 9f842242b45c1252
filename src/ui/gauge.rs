use eframe::egui::{vec2, Align2, FontId, Pos2, Response, Sense, Shape, Stroke, Ui, Vec2};
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::telemetry::Gauge;

const RING_WIDTH: f32 = 10.0;
const FULL_RING_SEGMENTS: f32 = 96.0;

/// Draws a circular gauge: a faint full ring, a colored arc for the filled
/// share starting at twelve o'clock, and the raw value in the middle.
pub fn circular_gauge(ui: &mut Ui, gauge: &Gauge, radius: f32) -> Response {
    let (rect, response) = ui.allocate_exact_size(Vec2::splat(radius * 2.0), Sense::hover());
    if !ui.is_rect_visible(rect) {
        return response;
    }

    let painter = ui.painter();
    let center = rect.center();
    let ring_radius = radius - RING_WIDTH / 2.0;

    painter.circle_stroke(
        center,
        ring_radius,
        Stroke::new(RING_WIDTH, gauge.color.gamma_multiply(0.2)),
    );

    let points = arc_points(center, ring_radius, gauge.fill());
    if points.len() >= 2 {
        painter.add(Shape::line(points, Stroke::new(RING_WIDTH, gauge.color)));
    }

    painter.text(
        center,
        Align2::CENTER_CENTER,
        format_value(gauge.value),
        FontId::proportional(radius * 0.35),
        gauge.color,
    );
    painter.text(
        center + vec2(0.0, radius * 0.35),
        Align2::CENTER_CENTER,
        gauge.title,
        FontId::proportional(14.0),
        gauge.color,
    );

    response.on_hover_text(format!("{} / {}", format_value(gauge.value), gauge.max))
}

/// Points along a clockwise arc covering `fill` of the circle. Empty for a
/// zero fill.
pub(crate) fn arc_points(center: Pos2, radius: f32, fill: f32) -> Vec<Pos2> {
    let fill = fill.clamp(0.0, 1.0);
    if fill <= 0.0 {
        return Vec::new();
    }

    let segments = (FULL_RING_SEGMENTS * fill).ceil().max(1.0) as usize;
    let start = -FRAC_PI_2;
    let sweep = TAU * fill;

    (0..=segments)
        .map(|i| {
            let angle = start + sweep * (i as f32 / segments as f32);
            center + radius * Vec2::angled(angle)
        })
        .collect()
}

pub(crate) fn format_value(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fill_draws_nothing() {
        assert!(arc_points(Pos2::ZERO, 70.0, 0.0).is_empty());
        assert!(arc_points(Pos2::ZERO, 70.0, -0.3).is_empty());
    }

    #[test]
    fn arc_starts_at_top_and_runs_clockwise() {
        let points = arc_points(Pos2::ZERO, 10.0, 0.25);
        let first = points[0];
        let last = *points.last().expect("points");

        assert!(first.x.abs() < 1e-4 && (first.y + 10.0).abs() < 1e-4);
        assert!((last.x - 10.0).abs() < 1e-3 && last.y.abs() < 1e-3);
    }

    #[test]
    fn full_fill_closes_the_ring() {
        let points = arc_points(Pos2::ZERO, 10.0, 1.0);
        let first = points[0];
        let last = *points.last().expect("points");
        assert!(first.distance(last) < 1e-3);
        assert_eq!(points.len(), FULL_RING_SEGMENTS as usize + 1);
    }

    #[test]
    fn values_render_without_needless_decimals() {
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(-50.0), "-50");
        assert_eq!(format_value(3.4), "3.4");
    }
}
