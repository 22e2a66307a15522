//! Frame orchestration: one clock tick, every 2D view, and the hand-offs

use tracing::{debug, info, trace};

use crate::clock::SimulationClock;
use crate::config::SimulationConfig;
use crate::motor::{MotorFrame, MotorPublisher};
use crate::panel::{angle_slider, ControlAction, ControlPanelModel};
use crate::render::{HexagonRenderer, PwmRenderer, Surface, TimeGraphRenderer, TimeGraphSurfaces};
use crate::snapshot::SnapshotWriter;
use crate::synthesis::{effective_angle, synthesize, wrap_degrees, Voltages};

/// Surfaces the host provides for one frame; a missing one skips that view
#[derive(Default)]
pub struct FrameSurfaces<'a> {
    pub time_graph: TimeGraphSurfaces<'a>,
    pub hexagon: Option<&'a mut dyn Surface>,
    pub pwm: Option<&'a mut dyn Surface>,
}

/// What a frame produced, for status displays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Continuous phase after the tick
    pub phase: f64,
    /// Angle actually synthesized and drawn
    pub angle: f64,
    pub voltages: Voltages,
    pub running: bool,
}

/// Owns the configuration and the clock; everything else only reads
pub struct Simulator {
    config: SimulationConfig,
    clock: SimulationClock,
    time_graph: TimeGraphRenderer,
    hexagon: HexagonRenderer,
    pwm: PwmRenderer,
    motor: Option<MotorPublisher>,
    duties: Option<SnapshotWriter<3>>,
    last: Voltages,
}

impl Simulator {
    pub fn new(config: SimulationConfig) -> Self {
        let config = config.sanitized();
        let clock = SimulationClock::new(&config);
        let last = synthesize(effective_angle(clock.state().phase, config.step_mode), &config);
        info!(method = %config.modulation_method, amplitude = config.amplitude, "simulator mounted");
        Self {
            config,
            clock,
            time_graph: TimeGraphRenderer::new(),
            hexagon: HexagonRenderer::new(),
            pwm: PwmRenderer::new(),
            motor: None,
            duties: None,
            last,
        }
    }

    /// Publish motor frames to the 3D loop
    pub fn with_motor(mut self, publisher: MotorPublisher) -> Self {
        self.motor = Some(publisher);
        self
    }

    /// Publish realizable leg duties (0-100) for the hardware bridge
    pub fn with_duties(mut self, writer: SnapshotWriter<3>) -> Self {
        self.duties = Some(writer);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Voltages drawn by the last frame
    pub fn voltages(&self) -> &Voltages {
        &self.last
    }

    /// View model for the control panel
    pub fn panel(&self) -> ControlPanelModel {
        ControlPanelModel::build(
            &self.config,
            self.clock.is_running(),
            self.last.neutral_real,
            self.clock.state().phase,
        )
    }

    /// Advance one displayed frame and repaint every provided surface
    pub fn frame(&mut self, surfaces: &mut FrameSurfaces<'_>) -> FrameReport {
        let config = &self.config;
        if let Some(grid) = surfaces.time_graph.grid.as_deref_mut() {
            self.time_graph.update_grid(grid, config.show_phase_voltages);
        }

        let time_graph = &self.time_graph;
        let mut trace_layer = surfaces.time_graph.trace.as_deref_mut();
        let phase = self.clock.tick(config, |state| {
            if let Some(surface) = trace_layer.as_deref_mut() {
                time_graph.draw_step(surface, state, config);
            }
        });

        let angle = effective_angle(phase, config.step_mode);
        let voltages = synthesize(angle, config);
        trace!(phase, angle, neutral = voltages.neutral, "frame");

        if let Some(overlay) = surfaces.time_graph.overlay.as_deref_mut() {
            if config.show_time_graph {
                let x = self.clock.state().x_deflection.current;
                time_graph.draw_overlay(overlay, x, angle, &voltages, config);
            } else {
                overlay.clear();
            }
        }
        if let Some(surface) = surfaces.hexagon.as_deref_mut() {
            self.hexagon.render(surface, angle, &voltages, config, self.clock.flicker());
        }
        if let Some(surface) = surfaces.pwm.as_deref_mut() {
            self.pwm.render(surface, &voltages.legs_real, config.pwm_alignment);
        }

        let running = self.clock.is_running();
        if let Some(motor) = self.motor.as_mut() {
            motor.publish(MotorFrame {
                angle,
                phase_voltages: voltages.phase_real,
                amplitude: config.amplitude,
                running,
            });
        }
        if let Some(duties) = self.duties.as_mut() {
            duties.publish(&voltages.legs_real);
        }

        self.last = voltages;
        FrameReport {
            phase,
            angle,
            voltages,
            running,
        }
    }

    /// Apply one operator action
    pub fn apply(&mut self, action: ControlAction) {
        debug!(?action, "control action");
        let config = &mut self.config;
        match action {
            ControlAction::Start => self.clock.start(),
            ControlAction::Stop => self.clock.stop(),
            ControlAction::ToggleRun => {
                if self.clock.is_running() {
                    self.clock.stop();
                } else {
                    self.clock.start();
                }
            }
            ControlAction::SetPhaseCount(count) => config.phase_count = count,
            ControlAction::TogglePhaseVoltages => config.show_phase_voltages = !config.show_phase_voltages,
            ControlAction::ToggleStarPoint => config.show_star_point = !config.show_star_point,
            ControlAction::ToggleSwitchingVectors => {
                config.show_switching_vectors = !config.show_switching_vectors
            }
            ControlAction::ToggleTimeGraph => config.show_time_graph = !config.show_time_graph,
            ControlAction::ToggleStepMode => {
                config.step_mode = !config.step_mode;
                if config.step_mode {
                    if self.clock.is_running() {
                        config.frequency = 0.0;
                    }
                    self.clock.snap_phase();
                }
                info!(step_mode = config.step_mode, "step mode changed");
            }
            ControlAction::SetMethod(method) => {
                if config.modulation_method != method {
                    info!(%method, "modulation method changed");
                }
                config.modulation_method = method;
            }
            ControlAction::SetAlignment(alignment) => config.pwm_alignment = alignment,
            ControlAction::SetAmplitude(value) => config.set_amplitude(value),
            ControlAction::NudgeAmplitude(delta) => config.set_amplitude(config.amplitude + delta),
            ControlAction::SetFrequency(value) => {
                if !config.step_mode {
                    config.set_frequency(value);
                }
            }
            ControlAction::NudgeFrequency(delta) => {
                if !config.step_mode {
                    config.set_frequency(config.frequency + delta);
                }
            }
            ControlAction::SetManualStarPoint(value) => {
                if config.is_manual() {
                    config.set_manual_star_point(value);
                }
            }
            ControlAction::NudgeManualStarPoint(delta) => {
                if config.is_manual() {
                    config.set_manual_star_point(config.manual_star_point + delta);
                }
            }
            ControlAction::SetPhase(angle) => {
                let angle = wrap_degrees(angle);
                self.clock
                    .set_phase(angle_slider(config.step_mode, angle).quantize(angle));
            }
            ControlAction::BeginScrub(angle) | ControlAction::ScrubTo(angle) => {
                let slider = angle_slider(config.step_mode, self.clock.state().phase);
                self.clock.scrub_to(slider.quantize(angle));
            }
            ControlAction::EndScrub => self.clock.end_scrub(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModulationMethod;
    use crate::motor::motor_link;
    use crate::render::DisplayList;
    use crate::snapshot::SnapshotCell;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_step_toggle_while_running_stops_advance() {
        let mut sim = Simulator::new(SimulationConfig {
            frequency: 10.0,
            ..Default::default()
        });
        sim.apply(ControlAction::Start);
        for _ in 0..21 {
            sim.frame(&mut FrameSurfaces::default());
        }
        // 21 frames * 1.5 degrees
        assert!((sim.clock().state().phase - 31.5).abs() < 1e-6);

        sim.apply(ControlAction::ToggleStepMode);
        assert_eq!(sim.config().frequency, 0.0);
        assert_eq!(sim.clock().state().phase, 60.0);

        let report = sim.frame(&mut FrameSurfaces::default());
        assert_eq!(report.angle, 60.0);
        assert_eq!(report.phase, 60.0);
    }

    #[test]
    fn test_step_toggle_while_stopped_keeps_frequency() {
        let mut sim = Simulator::new(SimulationConfig::default());
        sim.apply(ControlAction::SetPhase(100.0));
        sim.apply(ControlAction::ToggleStepMode);
        assert_eq!(sim.config().frequency, 5.0);
        assert_eq!(sim.clock().state().phase, 120.0);
    }

    #[test]
    fn test_frequency_read_only_in_step_mode() {
        let mut sim = Simulator::new(SimulationConfig {
            step_mode: true,
            ..Default::default()
        });
        sim.apply(ControlAction::SetFrequency(40.0));
        sim.apply(ControlAction::NudgeFrequency(1.0));
        assert_eq!(sim.config().frequency, 5.0);
    }

    #[test]
    fn test_manual_neutral_only_in_manual_mode() {
        let mut sim = Simulator::new(SimulationConfig::default());
        sim.apply(ControlAction::SetManualStarPoint(20.0));
        assert_eq!(sim.config().manual_star_point, 50.0);

        sim.apply(ControlAction::SetMethod(ModulationMethod::Manual));
        sim.apply(ControlAction::SetManualStarPoint(20.0));
        sim.apply(ControlAction::NudgeManualStarPoint(-30.0));
        assert_eq!(sim.config().manual_star_point, 0.0);
    }

    #[test]
    fn test_start_stop_are_idempotent() {
        let mut sim = Simulator::new(SimulationConfig::default());
        sim.apply(ControlAction::Start);
        sim.apply(ControlAction::Start);
        assert!(sim.is_running());
        sim.apply(ControlAction::ToggleRun);
        assert!(!sim.is_running());
        sim.apply(ControlAction::Stop);
        assert!(!sim.is_running());
    }

    #[test]
    fn test_scrub_quantized_in_step_mode() {
        let mut sim = Simulator::new(SimulationConfig {
            step_mode: true,
            ..Default::default()
        });
        sim.apply(ControlAction::BeginScrub(70.0));
        let report = sim.frame(&mut FrameSurfaces::default());
        assert_eq!(report.phase, 60.0);
        sim.apply(ControlAction::ScrubTo(170.0));
        assert_eq!(sim.frame(&mut FrameSurfaces::default()).phase, 180.0);
        sim.apply(ControlAction::EndScrub);
        assert!(!sim.clock().is_scrubbing());
    }

    #[test]
    fn test_held_scrub_while_stopped_keeps_trace_bounded() {
        let mut sim = Simulator::new(SimulationConfig::default());
        sim.apply(ControlAction::BeginScrub(90.0));
        let mut trace = DisplayList::new();
        for _ in 0..3600 {
            let mut surfaces = FrameSurfaces {
                time_graph: TimeGraphSurfaces {
                    trace: Some(&mut trace),
                    ..Default::default()
                },
                ..Default::default()
            };
            sim.frame(&mut surfaces);
        }
        // One step's worth of segments for the single move to 90°
        assert!(trace.len() <= 8, "trace grew to {}", trace.len());
    }

    #[test]
    fn test_frame_draws_every_surface() {
        let mut sim = Simulator::new(SimulationConfig::default());
        sim.apply(ControlAction::Start);
        let (mut grid, mut trace, mut overlay) = (DisplayList::new(), DisplayList::new(), DisplayList::new());
        let (mut hexagon, mut pwm) = (DisplayList::new(), DisplayList::new());
        {
            let mut surfaces = FrameSurfaces {
                time_graph: TimeGraphSurfaces {
                    grid: Some(&mut grid),
                    trace: Some(&mut trace),
                    overlay: Some(&mut overlay),
                },
                hexagon: Some(&mut hexagon),
                pwm: Some(&mut pwm),
            };
            sim.frame(&mut surfaces);
        }
        for list in [&grid, &trace, &overlay, &hexagon, &pwm] {
            assert!(!list.is_empty());
        }
    }

    #[test]
    fn test_missing_surfaces_do_not_stop_the_clock() {
        let mut sim = Simulator::new(SimulationConfig::default());
        sim.apply(ControlAction::Start);
        let mut hexagon = DisplayList::new();
        let report = sim.frame(&mut FrameSurfaces {
            hexagon: Some(&mut hexagon),
            ..Default::default()
        });
        assert!(report.phase > 0.0);
        assert!(!hexagon.is_empty());
    }

    #[test]
    fn test_publishes_motor_and_duties() {
        let (publisher, feed) = motor_link();
        let (writer, reader) = SnapshotCell::split([0.0; 3]);
        let mut sim = Simulator::new(SimulationConfig::default())
            .with_motor(publisher)
            .with_duties(writer);
        sim.apply(ControlAction::Start);
        let report = sim.frame(&mut FrameSurfaces::default());

        let frame = feed.latest();
        assert!(frame.running);
        assert_eq!(frame.angle, report.angle);
        assert_eq!(frame.phase_voltages, report.voltages.phase_real);
        let duties = reader.load();
        assert_eq!(duties, report.voltages.legs_real);
        let sum: f64 = frame.phase_voltages.iter().sum();
        assert!(sum.abs() < EPS);
    }

    #[test]
    fn test_panel_mirrors_realizable_neutral() {
        let mut sim = Simulator::new(SimulationConfig {
            modulation_method: ModulationMethod::Flattop120,
            ..Default::default()
        });
        let report = sim.frame(&mut FrameSurfaces::default());
        let panel = sim.panel();
        assert_eq!(panel.sliders[0].value, report.voltages.neutral_real.round());
    }

    #[test]
    fn test_out_of_range_config_is_clamped() {
        let sim = Simulator::new(SimulationConfig {
            amplitude: 180.0,
            frequency: 300.0,
            ..Default::default()
        });
        assert_eq!(sim.config().amplitude, 100.0);
        assert_eq!(sim.config().frequency, 100.0);
    }
}
