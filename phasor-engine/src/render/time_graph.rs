//! Scrolling time-domain graph ("oscilloscope" view)
//!
//! Three layers: a static grid, an append-only trace that gains one segment
//! per clock step, and a per-frame phasor overlay.

use super::{draw_arrow, Point, Rgb, Stroke, Surface, LOGICAL_SIZE, PHASE_COLORS};
use crate::config::SimulationConfig;
use crate::state::{SimulationState, Trace};
use crate::synthesis::{leg_amplitude, Voltages};

/// Vertical span of 100 % in the top band
const TOP_SPAN: f64 = LOGICAL_SIZE * 0.34;
/// Baseline (0 %) of the top band
const TOP_BASE: f64 = LOGICAL_SIZE * 0.40;
const TOP_RULE: f64 = LOGICAL_SIZE * 0.06;
const BOTTOM_TOP: f64 = LOGICAL_SIZE * 0.56;
const BOTTOM_MID: f64 = LOGICAL_SIZE * 0.73;
const BOTTOM_BASE: f64 = LOGICAL_SIZE * 0.90;
/// Phase-voltage scale in the bottom band (logical units per percent)
const PHASE_SCALE: f64 = LOGICAL_SIZE * 0.25 / 100.0;
/// Half height of the bottom band used for leg potentials
const BOTTOM_HALF: f64 = BOTTOM_MID - BOTTOM_TOP;

const TRACE_WIDTH: f64 = 4.0;
const NEUTRAL_WIDTH: f64 = 2.0;

/// Surfaces for the three stacked layers; any may be missing
#[derive(Default)]
pub struct TimeGraphSurfaces<'a> {
    pub grid: Option<&'a mut dyn Surface>,
    pub trace: Option<&'a mut dyn Surface>,
    pub overlay: Option<&'a mut dyn Surface>,
}

/// Renders the time graph layers
#[derive(Debug, Clone, Default)]
pub struct TimeGraphRenderer {
    /// `show_phase_voltages` the grid was last drawn for
    grid_mode: Option<bool>,
}

impl TimeGraphRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redraw the grid if the axis layout changed since the last call
    pub fn update_grid(&mut self, surface: &mut dyn Surface, show_phase_voltages: bool) {
        if self.grid_mode == Some(show_phase_voltages) {
            return;
        }
        self.grid_mode = Some(show_phase_voltages);
        draw_grid(surface, show_phase_voltages);
    }

    /// Draw the segments for one clock step, or clear on sweep wrap
    pub fn draw_step(&self, surface: &mut dyn Surface, state: &SimulationState, config: &SimulationConfig) {
        if !config.show_time_graph {
            return;
        }
        if state.wrapped() {
            surface.clear();
            return;
        }

        let x = state.x_deflection;
        let mut segment = |trace: &Trace, map: &dyn Fn(f64) -> f64, color: Rgb, width: f64| {
            surface.line(
                Point::new(x.prev, map(trace.prev)),
                Point::new(x.current, map(trace.current)),
                &Stroke::solid(color, width),
            );
        };
        let phases = config.phase_count.count();

        // Top band: ideal commands
        if config.show_star_point {
            segment(&state.neutral, &top_y, Rgb::WHITE, NEUTRAL_WIDTH);
        }
        for i in 0..phases {
            segment(&state.legs[i], &top_y, PHASE_COLORS[i], TRACE_WIDTH);
        }

        // Bottom band: what the inverter delivers
        if config.show_phase_voltages {
            if config.show_star_point {
                segment(&Trace::new(0.0), &phase_y, Rgb::WHITE, NEUTRAL_WIDTH);
            }
            for i in 0..phases {
                segment(&state.phase_real[i], &phase_y, PHASE_COLORS[i], TRACE_WIDTH);
            }
        } else {
            if config.show_star_point {
                segment(&state.neutral_real, &potential_y, Rgb::WHITE, NEUTRAL_WIDTH);
            }
            for i in 0..phases {
                segment(&state.legs_real[i], &potential_y, PHASE_COLORS[i], TRACE_WIDTH);
            }
        }
    }

    /// Draw the rotating phasor tripod at the sweep head
    pub fn draw_overlay(
        &self,
        surface: &mut dyn Surface,
        x_deflection: f64,
        angle: f64,
        voltages: &Voltages,
        config: &SimulationConfig,
    ) {
        surface.clear();
        let origin = Point::new(x_deflection, top_y(voltages.neutral));
        let length = leg_amplitude(config.amplitude) * TOP_SPAN / 100.0;
        let arms = [angle + 90.0, angle - 30.0, angle - 150.0];
        for (arm, color) in arms.iter().zip(PHASE_COLORS) {
            draw_arrow(surface, origin, length, *arm, &Stroke::solid(color, TRACE_WIDTH));
        }
    }
}

fn top_y(value: f64) -> f64 {
    TOP_BASE - value * TOP_SPAN / 100.0
}

fn phase_y(value: f64) -> f64 {
    BOTTOM_MID - value * PHASE_SCALE
}

fn potential_y(value: f64) -> f64 {
    BOTTOM_MID - (2.0 * value * BOTTOM_HALF / 100.0 - BOTTOM_HALF)
}

fn draw_grid(surface: &mut dyn Surface, show_phase_voltages: bool) {
    surface.clear();
    let rule = Stroke::solid(Rgb::WHITE, 4.0);
    let w = LOGICAL_SIZE;

    surface.line(Point::new(0.0, TOP_RULE), Point::new(w, TOP_RULE), &rule);
    surface.line(Point::new(0.0, TOP_BASE), Point::new(w, TOP_BASE), &rule);

    let axis = if show_phase_voltages { BOTTOM_MID } else { BOTTOM_BASE };
    surface.line(Point::new(0.0, axis), Point::new(w, axis), &rule);
    surface.line(
        Point::new(w / 2.0, BOTTOM_TOP - 25.0),
        Point::new(w / 2.0, BOTTOM_BASE + 25.0),
        &rule,
    );

    let faint = Stroke::solid(Rgb::GRAY, 2.0).alpha(0.15);
    surface.line(Point::new(0.0, LOGICAL_SIZE), Point::new(w, LOGICAL_SIZE), &faint);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhaseCount;
    use crate::render::DisplayList;
    use crate::synthesis::synthesize;

    fn stepped_state(config: &SimulationConfig) -> SimulationState {
        let mut state = SimulationState::at(0.0, &synthesize(0.0, config));
        state.x_deflection.push(10.0);
        state.record(&synthesize(10.0, config));
        state
    }

    #[test]
    fn test_grid_drawn_once_per_mode() {
        let mut renderer = TimeGraphRenderer::new();
        let mut grid = DisplayList::new();
        renderer.update_grid(&mut grid, true);
        assert_eq!(grid.len(), 5);
        // A marker survives only as long as the grid is not repainted
        grid.line(Point::default(), Point::new(1.0, 1.0), &Stroke::solid(Rgb::RED, 1.0));
        renderer.update_grid(&mut grid, true);
        assert_eq!(grid.len(), 6);
        renderer.update_grid(&mut grid, false);
        assert!(grid.primitives().iter().all(|p| p.stroke.color != Rgb::RED));
        let axis = grid.primitives()[2];
        assert!((axis.from.y - BOTTOM_BASE).abs() < 1e-9);
    }

    #[test]
    fn test_step_draws_one_segment_per_trace() {
        let config = SimulationConfig::default();
        let state = stepped_state(&config);
        let mut trace = DisplayList::new();
        TimeGraphRenderer::new().draw_step(&mut trace, &state, &config);
        // neutral + 3 legs, zero line + 3 phase voltages
        assert_eq!(trace.len(), 8);
        let first = trace.primitives()[0];
        assert_eq!(first.from.x, 0.0);
        assert_eq!(first.to.x, 10.0);
        assert_eq!(first.stroke.color, Rgb::WHITE);
    }

    #[test]
    fn test_single_phase_and_hidden_neutral() {
        let config = SimulationConfig {
            phase_count: PhaseCount::Single,
            show_star_point: false,
            show_phase_voltages: false,
            ..Default::default()
        };
        let state = stepped_state(&config);
        let mut trace = DisplayList::new();
        TimeGraphRenderer::new().draw_step(&mut trace, &state, &config);
        assert_eq!(trace.len(), 2);
        assert!(trace.primitives().iter().all(|p| p.stroke.color == Rgb::YELLOW));
    }

    #[test]
    fn test_wrap_clears_trace() {
        let config = SimulationConfig::default();
        let mut state = stepped_state(&config);
        let mut trace = DisplayList::new();
        let renderer = TimeGraphRenderer::new();
        renderer.draw_step(&mut trace, &state, &config);
        assert!(!trace.is_empty());
        state.x_deflection.push(0.0);
        renderer.draw_step(&mut trace, &state, &config);
        assert!(trace.is_empty());
    }

    #[test]
    fn test_band_mappings() {
        assert!((top_y(0.0) - TOP_BASE).abs() < 1e-9);
        assert!((top_y(100.0) - (TOP_BASE - TOP_SPAN)).abs() < 1e-9);
        assert!((potential_y(50.0) - BOTTOM_MID).abs() < 1e-9);
        assert!((potential_y(100.0) - BOTTOM_TOP).abs() < 1e-9);
        assert!((potential_y(0.0) - (BOTTOM_MID + BOTTOM_HALF)).abs() < 1e-9);
        assert!((phase_y(0.0) - BOTTOM_MID).abs() < 1e-9);
    }

    #[test]
    fn test_overlay_tripod() {
        let config = SimulationConfig::default();
        let voltages = synthesize(0.0, &config);
        let mut overlay = DisplayList::new();
        let renderer = TimeGraphRenderer::new();
        renderer.draw_overlay(&mut overlay, 100.0, 0.0, &voltages, &config);
        // three arrows with two head strokes each
        assert_eq!(overlay.len(), 9);
        let yellow = overlay.primitives()[0];
        assert!((yellow.from.y - top_y(50.0)).abs() < 1e-9);
        let expected = leg_amplitude(50.0) * TOP_SPAN / 100.0;
        assert!((yellow.from.distance(yellow.to) - expected).abs() < 1e-9);
        // first arm points straight up at angle 0
        assert!(yellow.to.y < yellow.from.y);

        renderer.draw_overlay(&mut overlay, 100.0, 0.0, &voltages, &config);
        assert_eq!(overlay.len(), 9);
    }
}
