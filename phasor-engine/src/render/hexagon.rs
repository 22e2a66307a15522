//! Switching hexagon - command vector inside the realizable voltage space

use std::f64::consts::FRAC_PI_3;

use super::{draw_arrow, Point, Rgb, Stroke, Surface, LOGICAL_SIZE};
use crate::config::SimulationConfig;
use crate::state::FlickerState;
use crate::synthesis::{leg_amplitude, wrap_degrees, Voltages, SECTOR_DEG};

/// Circumradius of the hexagon (distance to a switching-state vertex)
pub const HEX_RADIUS: f64 = LOGICAL_SIZE * 0.38;
/// Leg amplitude that reaches a vertex
const VERTEX_AMPLITUDE: f64 = 66.6;
/// Opacity of an inactive switching vector
const DIM_ALPHA: f64 = 0.08;

fn inradius() -> f64 {
    HEX_RADIUS * (FRAC_PI_3 / 2.0).cos()
}

/// Distance from the centre to the hexagon edge along `angle_deg`
pub fn hex_boundary(angle_deg: f64) -> f64 {
    let theta = angle_deg.rem_euclid(SECTOR_DEG) - SECTOR_DEG / 2.0;
    inradius() / theta.to_radians().cos()
}

/// Projection of a command vector onto the two adjacent active states
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchingDecomposition {
    /// Sector index 0-5
    pub sector: usize,
    /// Length along the leading vertex
    pub r1: f64,
    /// Length along the trailing vertex
    pub r2: f64,
    /// Relative dwell time of the leading state
    pub d1: f64,
    /// Relative dwell time of the trailing state
    pub d2: f64,
}

impl SwitchingDecomposition {
    pub fn new(angle_deg: f64, radius: f64) -> Self {
        let angle = wrap_degrees(angle_deg);
        let sector = ((angle / SECTOR_DEG).floor() as usize) % 6;
        let theta = angle.rem_euclid(SECTOR_DEG).to_radians();
        let lead = (FRAC_PI_3 - theta).sin() / FRAC_PI_3.sin();
        let trail = theta.sin() / FRAC_PI_3.sin();
        let modulation = radius / inradius();
        Self {
            sector,
            r1: radius * lead,
            r2: radius * trail,
            d1: modulation * lead,
            d2: modulation * trail,
        }
    }

    pub fn lead_angle(&self) -> f64 {
        self.sector as f64 * SECTOR_DEG
    }

    pub fn trail_angle(&self) -> f64 {
        (self.sector + 1) as f64 * SECTOR_DEG
    }
}

/// Renders the hexagon panel; repainted completely every frame
#[derive(Debug, Clone, Default)]
pub struct HexagonRenderer;

impl HexagonRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        surface: &mut dyn Surface,
        angle: f64,
        voltages: &Voltages,
        config: &SimulationConfig,
        flicker: &FlickerState,
    ) {
        let center = Point::new(LOGICAL_SIZE / 2.0, LOGICAL_SIZE / 2.0);
        draw_background(surface, center);

        let ideal = leg_amplitude(config.amplitude) / VERTEX_AMPLITUDE * HEX_RADIUS;
        let actual = ideal.min(hex_boundary(angle));
        let tip = center.polar(actual, angle);

        if config.show_switching_vectors {
            let parts = SwitchingDecomposition::new(angle, actual);
            let alpha = |phase: f64, duty: f64| if phase < duty { 1.0 } else { DIM_ALPHA };
            let vertex = Stroke::solid(Rgb::LAVENDER, 4.0);
            draw_arrow(surface, center, HEX_RADIUS, parts.lead_angle(), &vertex.alpha(alpha(flicker.a, parts.d1)));
            draw_arrow(surface, center, HEX_RADIUS, parts.trail_angle(), &vertex.alpha(alpha(flicker.b, parts.d2)));

            let construction = Stroke::solid(Rgb::LAVENDER, 2.0).alpha(0.6).dashed(4.0, 6.0);
            for start in [
                center.polar(parts.r1, parts.lead_angle()),
                center.polar(parts.r2, parts.trail_angle()),
            ] {
                surface.line(start, tip, &construction);
            }
        }

        if voltages.is_saturated() {
            let over = Stroke::solid(Rgb::RED, 4.0).alpha(0.7);
            draw_arrow(surface, center, ideal, angle, &over);
        }
        draw_arrow(surface, center, actual, angle, &Stroke::solid(Rgb::PALE_GRAY, 4.0));
    }
}

fn draw_background(surface: &mut dyn Surface, center: Point) {
    surface.clear();
    let cross = Stroke::solid(Rgb::WHITE, 1.0).alpha(0.1);
    surface.line(Point::new(0.0, center.y), Point::new(LOGICAL_SIZE, center.y), &cross);
    surface.line(Point::new(center.x, 0.0), Point::new(center.x, LOGICAL_SIZE), &cross);

    let vertices: Vec<Point> = (0..=6)
        .map(|i| center.polar(HEX_RADIUS, i as f64 * SECTOR_DEG))
        .collect();
    surface.polyline(&vertices, &Stroke::solid(Rgb::HEX_PURPLE, 4.0));
}
