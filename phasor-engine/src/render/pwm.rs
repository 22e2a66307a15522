//! PWM pulse trains - one carrier period per leg

use super::{Point, Rgb, Stroke, Surface, LOGICAL_SIZE, PHASE_COLORS};
use crate::config::PwmAlignment;

/// Baselines of the three legs
const ROWS: [f64; 3] = [7.0 / 20.0, 12.0 / 20.0, 17.0 / 20.0];
const PULSE_HEIGHT: f64 = LOGICAL_SIZE * 0.15;
const X_START: f64 = LOGICAL_SIZE * 0.1;
/// Width of one carrier period
const PERIOD: f64 = LOGICAL_SIZE * 0.8;

/// Outline of one carrier period for a leg command in percent.
///
/// Commands at or beyond a rail collapse to a flat line on that rail.
pub fn pulse_path(command: f64, baseline: f64, alignment: PwmAlignment) -> Vec<Point> {
    let end = X_START + PERIOD;
    let high = baseline - PULSE_HEIGHT;
    if command <= 0.0 {
        return vec![Point::new(X_START, baseline), Point::new(end, baseline)];
    }
    if command >= 100.0 {
        return vec![Point::new(X_START, high), Point::new(end, high)];
    }

    let width = command / 100.0 * PERIOD;
    let rise = match alignment {
        PwmAlignment::Center => X_START + (PERIOD - width) / 2.0,
        PwmAlignment::Edge => X_START,
    };
    vec![
        Point::new(X_START, baseline),
        Point::new(rise, baseline),
        Point::new(rise, high),
        Point::new(rise + width, high),
        Point::new(rise + width, baseline),
        Point::new(end, baseline),
    ]
}

/// Renders the pulse-train panel; repainted completely every frame
#[derive(Debug, Clone, Default)]
pub struct PwmRenderer;

impl PwmRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, surface: &mut dyn Surface, legs: &[f64; 3], alignment: PwmAlignment) {
        draw_background(surface);
        for ((command, row), color) in legs.iter().zip(ROWS).zip(PHASE_COLORS) {
            let path = pulse_path(*command, LOGICAL_SIZE * row, alignment);
            surface.polyline(&path, &Stroke::solid(color, 2.0));
        }
    }
}

fn draw_background(surface: &mut dyn Surface) {
    surface.clear();
    let end = X_START + PERIOD;
    let rail = Stroke::solid(Rgb::WHITE, 4.0);
    let top = Stroke::solid(Rgb::WHITE, 1.5).alpha(0.2).dashed(5.0, 5.0);
    for row in ROWS {
        let y = LOGICAL_SIZE * row;
        surface.line(Point::new(X_START, y), Point::new(end, y), &rail);
        surface.line(
            Point::new(X_START, y - PULSE_HEIGHT),
            Point::new(end, y - PULSE_HEIGHT),
            &top,
        );
    }
    surface.line(
        Point::new(LOGICAL_SIZE / 2.0, LOGICAL_SIZE * 0.1),
        Point::new(LOGICAL_SIZE / 2.0, LOGICAL_SIZE * 0.9),
        &Stroke::solid(Rgb::WHITE, 2.0).alpha(0.4),
    );
}
