//! Control panel contract: operator actions and the view model hosts render

use crate::config::{
    ModulationMethod, PhaseCount, PwmAlignment, SimulationConfig, FREQUENCY_LIMIT, PERCENT_MAX,
    PERCENT_MIN,
};
use crate::synthesis::SECTOR_DEG;

/// Every input the control panel can produce
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    Start,
    Stop,
    /// Start when stopped, stop when running
    ToggleRun,
    SetPhaseCount(PhaseCount),
    TogglePhaseVoltages,
    ToggleStarPoint,
    ToggleSwitchingVectors,
    ToggleTimeGraph,
    ToggleStepMode,
    SetMethod(ModulationMethod),
    SetAlignment(PwmAlignment),
    SetAmplitude(f64),
    NudgeAmplitude(f64),
    SetFrequency(f64),
    NudgeFrequency(f64),
    SetManualStarPoint(f64),
    NudgeManualStarPoint(f64),
    /// Jump to an angle without a drag gesture
    SetPhase(f64),
    /// Press on the angle slider
    BeginScrub(f64),
    /// Drag on the angle slider
    ScrubTo(f64),
    /// Pointer released anywhere
    EndScrub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderId {
    StarPoint,
    Amplitude,
    Frequency,
    Angle,
}

/// Range-constrained slider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderSpec {
    pub id: SliderId,
    pub label_key: &'static str,
    pub tooltip_key: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub read_only: bool,
}

impl SliderSpec {
    /// Clamp into range and round to the nearest step
    pub fn quantize(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.value;
        }
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let snapped = self.min + ((clamped - self.min) / self.step).round() * self.step;
        snapped.clamp(self.min, self.max)
    }

    /// Value at `fraction` (0-1) of the track
    pub fn value_at(&self, fraction: f64) -> f64 {
        self.quantize(self.min + fraction.clamp(0.0, 1.0) * (self.max - self.min))
    }

    /// Position of the current value along the track (0-1)
    pub fn fraction(&self) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            0.0
        } else {
            ((self.value - self.min) / span).clamp(0.0, 1.0)
        }
    }

    /// The action a change of this slider to `value` produces, if editable
    pub fn action(&self, value: f64) -> Option<ControlAction> {
        if self.read_only {
            return None;
        }
        let value = self.quantize(value);
        Some(match self.id {
            SliderId::StarPoint => ControlAction::SetManualStarPoint(value),
            SliderId::Amplitude => ControlAction::SetAmplitude(value),
            SliderId::Frequency => ControlAction::SetFrequency(value),
            SliderId::Angle => ControlAction::ScrubTo(value),
        })
    }
}

/// Button, toggle or selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    pub label_key: &'static str,
    pub tooltip_key: &'static str,
    /// Pressed / on / selected
    pub active: bool,
    pub enabled: bool,
    pub action: ControlAction,
}

impl ControlSpec {
    fn new(label_key: &'static str, tooltip_key: &'static str, active: bool, action: ControlAction) -> Self {
        Self {
            label_key,
            tooltip_key,
            active,
            enabled: true,
            action,
        }
    }
}

/// Everything a host needs to draw the control panel
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPanelModel {
    /// Start, stop
    pub run: [ControlSpec; 2],
    /// 1-phase, 3-phase
    pub phases: [ControlSpec; 2],
    /// Voltages, neutral, switching vectors, time graph
    pub toggles: [ControlSpec; 4],
    pub methods: [ControlSpec; 6],
    /// Center, edge
    pub alignment: [ControlSpec; 2],
    pub step_mode: ControlSpec,
    /// Neutral point, amplitude, frequency, angle
    pub sliders: [SliderSpec; 4],
}

impl ControlPanelModel {
    /// Build the view model from the live configuration.
    ///
    /// `neutral_real` is the realizable neutral the neutral slider mirrors
    /// outside Manual mode.
    pub fn build(config: &SimulationConfig, running: bool, neutral_real: f64, phase: f64) -> Self {
        let mut start = ControlSpec::new("control.start", "control.start.tip", running, ControlAction::Start);
        start.enabled = !running;
        let mut stop = ControlSpec::new("control.stop", "control.stop.tip", !running, ControlAction::Stop);
        stop.enabled = running;

        let single = config.phase_count == PhaseCount::Single;
        let voltages_tip = if config.show_phase_voltages {
            "control.voltages.tip.on"
        } else {
            "control.voltages.tip.off"
        };

        let manual = config.is_manual();
        let star_value = if manual {
            config.manual_star_point
        } else {
            neutral_real.round()
        };

        Self {
            run: [start, stop],
            phases: [
                ControlSpec::new(
                    "control.single_phase",
                    "control.single_phase.tip",
                    single,
                    ControlAction::SetPhaseCount(PhaseCount::Single),
                ),
                ControlSpec::new(
                    "control.three_phase",
                    "control.three_phase.tip",
                    !single,
                    ControlAction::SetPhaseCount(PhaseCount::Three),
                ),
            ],
            toggles: [
                ControlSpec::new(
                    "control.voltages",
                    voltages_tip,
                    config.show_phase_voltages,
                    ControlAction::TogglePhaseVoltages,
                ),
                ControlSpec::new(
                    "control.neutral",
                    "control.neutral.tip",
                    config.show_star_point,
                    ControlAction::ToggleStarPoint,
                ),
                ControlSpec::new(
                    "control.vectors",
                    "control.vectors.tip",
                    config.show_switching_vectors,
                    ControlAction::ToggleSwitchingVectors,
                ),
                ControlSpec::new(
                    "control.time_graph",
                    "control.time_graph.tip",
                    config.show_time_graph,
                    ControlAction::ToggleTimeGraph,
                ),
            ],
            methods: ModulationMethod::ALL.map(|method| ControlSpec {
                label_key: method.label_key(),
                tooltip_key: method.tooltip_key(),
                active: config.modulation_method == method,
                enabled: true,
                action: ControlAction::SetMethod(method),
            }),
            alignment: [
                ControlSpec::new(
                    "align.center",
                    "align.center.tip",
                    config.pwm_alignment == PwmAlignment::Center,
                    ControlAction::SetAlignment(PwmAlignment::Center),
                ),
                ControlSpec::new(
                    "align.edge",
                    "align.edge.tip",
                    config.pwm_alignment == PwmAlignment::Edge,
                    ControlAction::SetAlignment(PwmAlignment::Edge),
                ),
            ],
            step_mode: ControlSpec::new(
                "control.step",
                "control.step.tip",
                config.step_mode,
                ControlAction::ToggleStepMode,
            ),
            sliders: [
                SliderSpec {
                    id: SliderId::StarPoint,
                    label_key: "slider.neutral",
                    tooltip_key: "slider.neutral.tip",
                    value: star_value,
                    min: PERCENT_MIN,
                    max: PERCENT_MAX,
                    step: 1.0,
                    read_only: !manual,
                },
                SliderSpec {
                    id: SliderId::Amplitude,
                    label_key: "slider.amplitude",
                    tooltip_key: "slider.amplitude.tip",
                    value: config.amplitude,
                    min: PERCENT_MIN,
                    max: PERCENT_MAX,
                    step: 1.0,
                    read_only: false,
                },
                SliderSpec {
                    id: SliderId::Frequency,
                    label_key: "slider.frequency",
                    tooltip_key: "slider.frequency.tip",
                    value: config.frequency,
                    min: -FREQUENCY_LIMIT,
                    max: FREQUENCY_LIMIT,
                    step: 1.0,
                    read_only: config.step_mode,
                },
                angle_slider(config.step_mode, phase),
            ],
        }
    }

    pub fn slider(&self, id: SliderId) -> &SliderSpec {
        match id {
            SliderId::StarPoint => &self.sliders[0],
            SliderId::Amplitude => &self.sliders[1],
            SliderId::Frequency => &self.sliders[2],
            SliderId::Angle => &self.sliders[3],
        }
    }
}

/// Angle slider; moves in whole sectors while in step mode
pub fn angle_slider(step_mode: bool, phase: f64) -> SliderSpec {
    SliderSpec {
        id: SliderId::Angle,
        label_key: "slider.angle",
        tooltip_key: "slider.angle.tip",
        value: phase,
        min: 0.0,
        max: 360.0,
        step: if step_mode { SECTOR_DEG } else { 1.0 },
        read_only: false,
    }
}

impl ModulationMethod {
    pub fn tooltip_key(self) -> &'static str {
        match self {
            ModulationMethod::Sinusoidal => "method.sinusoidal.tip",
            ModulationMethod::SpaceVector => "method.space_vector.tip",
            ModulationMethod::Flattop120 => "method.flattop120.tip",
            ModulationMethod::Flattop60 => "method.flattop60.tip",
            ModulationMethod::Schoerner => "method.schoerner.tip",
            ModulationMethod::Manual => "method.manual.tip",
        }
    }
}
