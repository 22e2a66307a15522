//! Simulation clock - frame-driven phase advance with sub-stepping

use tracing::{debug, trace};

use crate::config::SimulationConfig;
use crate::render::LOGICAL_SIZE;
use crate::state::{FlickerState, SimulationState};
use crate::synthesis::{effective_angle, snap_to_sector, synthesize, wrap_degrees};

/// Empirical rate constants mapping frequency to per-frame motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTuning {
    /// Degrees of phase advance per frame per Hz
    pub phase_rate: f64,
    /// Sweep advance per frame at zero frequency (logical units)
    pub sweep_base: f64,
    /// Additional sweep advance per frame per |Hz|
    pub sweep_gain: f64,
    /// Largest phase increment handled by a single sub-step (degrees)
    pub max_step_deg: f64,
    /// Flicker counter increment per sub-step
    pub flicker_increment: f64,
}

impl Default for ClockTuning {
    fn default() -> Self {
        Self {
            phase_rate: 0.15,
            sweep_base: 0.8,
            sweep_gain: 0.045,
            max_step_deg: 2.0,
            flicker_increment: 0.15,
        }
    }
}

impl ClockTuning {
    /// Requested (phase, sweep) deltas for one displayed frame
    pub fn frame_deltas(&self, frequency: f64) -> (f64, f64) {
        (
            frequency * self.phase_rate,
            self.sweep_base + frequency.abs() * self.sweep_gain,
        )
    }

    /// Number of fixed sub-steps needed for a phase delta
    pub fn sub_steps(&self, phase_delta: f64) -> usize {
        ((phase_delta.abs() / self.max_step_deg).ceil() as usize).max(1)
    }
}

/// Advances the simulation state once per frame.
///
/// Running advances phase and sweep proportionally to frequency; stopped
/// only moves the phase while the operator scrubs.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    state: SimulationState,
    flicker: FlickerState,
    tuning: ClockTuning,
    running: bool,
    /// Angle held by an active scrub gesture
    scrub: Option<f64>,
}

impl SimulationClock {
    pub fn new(config: &SimulationConfig) -> Self {
        Self::with_tuning(config, ClockTuning::default())
    }

    pub fn with_tuning(config: &SimulationConfig, tuning: ClockTuning) -> Self {
        let voltages = synthesize(effective_angle(0.0, config.step_mode), config);
        Self {
            state: SimulationState::at(0.0, &voltages),
            flicker: FlickerState::default(),
            tuning,
            running: false,
            scrub: None,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn flicker(&self) -> &FlickerState {
        &self.flicker
    }

    pub fn tuning(&self) -> &ClockTuning {
        &self.tuning
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrub.is_some()
    }

    pub fn start(&mut self) {
        if !self.running {
            debug!("simulation started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            debug!("simulation stopped");
        }
        self.running = false;
    }

    /// Begin or continue a scrub gesture at `angle` degrees
    pub fn scrub_to(&mut self, angle: f64) {
        self.scrub = Some(wrap_degrees(angle));
    }

    /// Release the scrub gesture
    pub fn end_scrub(&mut self) {
        self.scrub = None;
    }

    /// Jump the live phase without drawing a segment
    pub fn set_phase(&mut self, angle: f64) {
        if angle.is_finite() {
            self.state.phase = wrap_degrees(angle);
        }
    }

    /// Snap the live phase to the nearest sector boundary
    pub fn snap_phase(&mut self) {
        self.state.phase = snap_to_sector(self.state.phase);
    }

    /// Advance one displayed frame.
    ///
    /// `on_step` is invoked after every synthesis sub-step so the time graph
    /// can draw one `prev -> current` segment per step. Returns the phase to
    /// display this frame.
    pub fn tick<F>(&mut self, config: &SimulationConfig, mut on_step: F) -> f64
    where
        F: FnMut(&SimulationState),
    {
        if self.running {
            let (phase_delta, sweep_delta) = self.tuning.frame_deltas(config.frequency);
            let steps = self.tuning.sub_steps(phase_delta);
            // An active scrub holds the phase while the sweep keeps running
            let phase_delta = match self.scrub {
                Some(angle) => {
                    self.state.phase = angle;
                    0.0
                }
                None => phase_delta,
            };
            trace!(steps, phase_delta, "clock tick");
            for _ in 0..steps {
                self.step(phase_delta / steps as f64, sweep_delta / steps as f64, config);
                on_step(&self.state);
            }
        } else if let Some(angle) = self.scrub {
            // A held scrub that has not moved adds nothing to the trace
            if angle != self.state.phase {
                self.state.phase = angle;
                self.step(0.0, 0.0, config);
                on_step(&self.state);
            }
        }
        self.state.phase
    }

    fn step(&mut self, phase_delta: f64, sweep_delta: f64, config: &SimulationConfig) {
        self.state.phase = wrap_degrees(self.state.phase + phase_delta);
        self.flicker.advance(self.tuning.flicker_increment);

        let x = self.state.x_deflection.current;
        let next = if config.show_time_graph {
            let advanced = x + sweep_delta;
            if advanced > LOGICAL_SIZE {
                0.0
            } else {
                advanced
            }
        } else {
            x
        };
        self.state.x_deflection.push(next);

        let voltages = synthesize(effective_angle(self.state.phase, config.step_mode), config);
        self.state.record(&voltages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_clock(config: &SimulationConfig) -> SimulationClock {
        let mut clock = SimulationClock::new(config);
        clock.start();
        clock
    }

    #[test]
    fn test_stopped_clock_does_not_advance() {
        let config = SimulationConfig::default();
        let mut clock = SimulationClock::new(&config);
        let mut steps = 0;
        let phase = clock.tick(&config, |_| steps += 1);
        assert_eq!(phase, 0.0);
        assert_eq!(steps, 0);
        assert_eq!(clock.state().x_deflection.current, 0.0);
    }

    #[test]
    fn test_running_advances_phase_and_sweep() {
        let config = SimulationConfig {
            frequency: 10.0,
            ..Default::default()
        };
        let mut clock = running_clock(&config);
        let phase = clock.tick(&config, |_| {});
        assert!((phase - 1.5).abs() < 1e-9);
        assert!((clock.state().x_deflection.current - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_sub_step_count() {
        let tuning = ClockTuning::default();
        assert_eq!(tuning.sub_steps(0.0), 1);
        assert_eq!(tuning.sub_steps(1.5), 1);
        assert_eq!(tuning.sub_steps(2.0), 1);
        assert_eq!(tuning.sub_steps(2.1), 2);
        assert_eq!(tuning.sub_steps(-15.0), 8);
    }

    #[test]
    fn test_fast_sweep_is_sub_stepped() {
        let config = SimulationConfig {
            frequency: 100.0,
            ..Default::default()
        };
        let mut clock = running_clock(&config);
        let mut phases = Vec::new();
        clock.tick(&config, |state| phases.push(state.phase));
        assert_eq!(phases.len(), 8);
        for pair in phases.windows(2) {
            assert!((pair[1] - pair[0] - 15.0 / 8.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_negative_frequency_wraps_into_range() {
        let config = SimulationConfig {
            frequency: -20.0,
            ..Default::default()
        };
        let mut clock = running_clock(&config);
        let phase = clock.tick(&config, |_| {});
        assert!((phase - 357.0).abs() < 1e-9);
        for _ in 0..500 {
            let phase = clock.tick(&config, |_| {});
            assert!((0.0..360.0).contains(&phase));
        }
    }

    #[test]
    fn test_sweep_wraps_exactly_once() {
        let config = SimulationConfig {
            frequency: 0.0,
            ..Default::default()
        };
        let mut clock = running_clock(&config);
        let mut wraps = 0;
        // 0.8 units per frame -> 640 frames to cross the 512 unit sweep
        for _ in 0..700 {
            clock.tick(&config, |state| {
                if state.wrapped() {
                    wraps += 1;
                }
            });
        }
        assert_eq!(wraps, 1);
    }

    #[test]
    fn test_hidden_time_graph_freezes_sweep() {
        let config = SimulationConfig {
            show_time_graph: false,
            ..Default::default()
        };
        let mut clock = running_clock(&config);
        for _ in 0..10 {
            clock.tick(&config, |_| {});
        }
        assert_eq!(clock.state().x_deflection.current, 0.0);
    }

    #[test]
    fn test_scrub_while_stopped_sets_phase() {
        let config = SimulationConfig::default();
        let mut clock = SimulationClock::new(&config);
        clock.scrub_to(120.0);
        let mut steps = 0;
        let phase = clock.tick(&config, |_| steps += 1);
        assert_eq!(phase, 120.0);
        assert_eq!(steps, 1);
        let expected = synthesize(120.0, &config);
        assert_eq!(clock.state().legs[0].current, expected.legs[0]);
    }

    #[test]
    fn test_scrub_while_running_holds_phase() {
        let config = SimulationConfig {
            frequency: 50.0,
            ..Default::default()
        };
        let mut clock = running_clock(&config);
        clock.scrub_to(200.0);
        for _ in 0..5 {
            assert_eq!(clock.tick(&config, |_| {}), 200.0);
        }
        assert!(clock.state().x_deflection.current > 0.0);
        clock.end_scrub();
        assert!(clock.tick(&config, |_| {}) > 200.0);
    }

    #[test]
    fn test_step_mode_synthesizes_snapped_angle() {
        let config = SimulationConfig {
            step_mode: true,
            frequency: 0.0,
            ..Default::default()
        };
        let mut clock = running_clock(&config);
        clock.scrub_to(47.0);
        clock.tick(&config, |_| {});
        let expected = synthesize(60.0, &config);
        assert_eq!(clock.state().legs[1].current, expected.legs[1]);
    }

    #[test]
    fn test_idle_scrub_while_stopped_draws_nothing() {
        let config = SimulationConfig::default();
        let mut clock = SimulationClock::new(&config);
        clock.scrub_to(90.0);
        let mut steps = 0;
        for _ in 0..600 {
            clock.tick(&config, |_| steps += 1);
        }
        assert_eq!(steps, 1);

        clock.scrub_to(95.0);
        clock.tick(&config, |_| steps += 1);
        assert_eq!(steps, 2);
        assert_eq!(clock.state().phase, 95.0);
    }

    #[test]
    fn test_tiny_negative_step_stays_below_360() {
        let config = SimulationConfig {
            frequency: -1e-13,
            ..Default::default()
        };
        let mut clock = running_clock(&config);
        let phase = clock.tick(&config, |_| {});
        assert!((0.0..360.0).contains(&phase), "phase {}", phase);

        clock.set_phase(-1e-15);
        assert!((0.0..360.0).contains(&clock.state().phase));
    }

    #[test]
    fn test_snap_phase() {
        let config = SimulationConfig::default();
        let mut clock = SimulationClock::new(&config);
        clock.scrub_to(151.0);
        clock.tick(&config, |_| {});
        clock.end_scrub();
        clock.snap_phase();
        assert_eq!(clock.state().phase, 180.0);
    }
}
