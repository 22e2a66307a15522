//! Operator-controlled simulation configuration

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Lower bound of the amplitude / neutral-point range (percent of bus voltage)
pub const PERCENT_MIN: f64 = 0.0;
/// Upper bound of the amplitude / neutral-point range
pub const PERCENT_MAX: f64 = 100.0;
/// Frequency range in Hz (signed, sign selects rotation direction)
pub const FREQUENCY_LIMIT: f64 = 100.0;

/// Errors from parsing textual configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown modulation method: {0}")]
    Method(String),
    #[error("unknown PWM alignment: {0}")]
    Alignment(String),
    #[error("phase count must be 1 or 3, got {0}")]
    PhaseCount(String),
}

/// Number of phases shown by the time graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseCount {
    Single,
    #[default]
    Three,
}

impl PhaseCount {
    pub fn count(self) -> usize {
        match self {
            PhaseCount::Single => 1,
            PhaseCount::Three => 3,
        }
    }
}

impl FromStr for PhaseCount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(PhaseCount::Single),
            "3" => Ok(PhaseCount::Three),
            other => Err(ParseError::PhaseCount(other.to_string())),
        }
    }
}

/// Common-mode (neutral) injection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModulationMethod {
    /// Sinusoidal PWM, neutral fixed at mid-bus
    #[default]
    Sinusoidal,
    /// Min-max injection (space vector modulation)
    SpaceVector,
    /// Discontinuous PWM, lowest leg pinned to the negative rail
    Flattop120,
    /// Discontinuous PWM, alternately pinning the upper and lower rail
    Flattop60,
    /// Asymmetric optimized injection
    Schoerner,
    /// Operator-supplied neutral potential
    Manual,
}

impl ModulationMethod {
    pub const ALL: [ModulationMethod; 6] = [
        ModulationMethod::Sinusoidal,
        ModulationMethod::SpaceVector,
        ModulationMethod::Flattop120,
        ModulationMethod::Flattop60,
        ModulationMethod::Schoerner,
        ModulationMethod::Manual,
    ];

    /// Stable identifier used in settings and on the command line
    pub fn key(self) -> &'static str {
        match self {
            ModulationMethod::Sinusoidal => "sinusoidal",
            ModulationMethod::SpaceVector => "space-vector",
            ModulationMethod::Flattop120 => "flattop120",
            ModulationMethod::Flattop60 => "flattop60",
            ModulationMethod::Schoerner => "schoerner",
            ModulationMethod::Manual => "manual",
        }
    }

    /// Label lookup key for the control panel
    pub fn label_key(self) -> &'static str {
        match self {
            ModulationMethod::Sinusoidal => "method.sinusoidal",
            ModulationMethod::SpaceVector => "method.space_vector",
            ModulationMethod::Flattop120 => "method.flattop120",
            ModulationMethod::Flattop60 => "method.flattop60",
            ModulationMethod::Schoerner => "method.schoerner",
            ModulationMethod::Manual => "method.manual",
        }
    }
}

impl fmt::Display for ModulationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ModulationMethod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sinusoidal" | "sine" | "spwm" | "1" => Ok(ModulationMethod::Sinusoidal),
            "space-vector" | "spacevector" | "svm" | "svpwm" | "2" => {
                Ok(ModulationMethod::SpaceVector)
            }
            "flattop120" | "flat120" | "120" | "3" => Ok(ModulationMethod::Flattop120),
            "flattop60" | "flat60" | "60" | "4" => Ok(ModulationMethod::Flattop60),
            "schoerner" | "5" => Ok(ModulationMethod::Schoerner),
            "manual" | "6" => Ok(ModulationMethod::Manual),
            _ => Err(ParseError::Method(s.to_string())),
        }
    }
}

/// Placement of the pulse inside each carrier period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PwmAlignment {
    #[default]
    Center,
    Edge,
}

impl PwmAlignment {
    pub fn key(self) -> &'static str {
        match self {
            PwmAlignment::Center => "center",
            PwmAlignment::Edge => "edge",
        }
    }
}

impl FromStr for PwmAlignment {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "center" | "centre" | "c" => Ok(PwmAlignment::Center),
            "edge" | "e" => Ok(PwmAlignment::Edge),
            _ => Err(ParseError::Alignment(s.to_string())),
        }
    }
}

/// Simulation configuration, mutated only through the control panel
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub phase_count: PhaseCount,
    /// Bottom graph shows phase-to-neutral voltages instead of leg potentials
    pub show_phase_voltages: bool,
    pub show_star_point: bool,
    pub show_switching_vectors: bool,
    /// Time graph sweeps and draws at all
    pub show_time_graph: bool,
    /// Effective angle snaps to 60° sector boundaries
    pub step_mode: bool,
    pub modulation_method: ModulationMethod,
    pub pwm_alignment: PwmAlignment,
    /// Neutral potential used by [`ModulationMethod::Manual`] (0-100)
    pub manual_star_point: f64,
    /// Commanded magnitude (0-100 %)
    pub amplitude: f64,
    /// Signed electrical frequency (-100..100 Hz)
    pub frequency: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            phase_count: PhaseCount::Three,
            show_phase_voltages: true,
            show_star_point: true,
            show_switching_vectors: false,
            show_time_graph: true,
            step_mode: false,
            modulation_method: ModulationMethod::Sinusoidal,
            pwm_alignment: PwmAlignment::Center,
            manual_star_point: 50.0,
            amplitude: 50.0,
            frequency: 5.0,
        }
    }
}

impl SimulationConfig {
    /// Clamp externally supplied values into their domains.
    ///
    /// Non-finite inputs fall back to the defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        self.amplitude = clamp_or(self.amplitude, PERCENT_MIN, PERCENT_MAX, defaults.amplitude);
        self.manual_star_point = clamp_or(
            self.manual_star_point,
            PERCENT_MIN,
            PERCENT_MAX,
            defaults.manual_star_point,
        );
        self.frequency = clamp_or(
            self.frequency,
            -FREQUENCY_LIMIT,
            FREQUENCY_LIMIT,
            defaults.frequency,
        );
        self
    }

    pub fn set_amplitude(&mut self, value: f64) {
        self.amplitude = clamp_or(value, PERCENT_MIN, PERCENT_MAX, self.amplitude);
    }

    pub fn set_manual_star_point(&mut self, value: f64) {
        self.manual_star_point = clamp_or(value, PERCENT_MIN, PERCENT_MAX, self.manual_star_point);
    }

    pub fn set_frequency(&mut self, value: f64) {
        self.frequency = clamp_or(value, -FREQUENCY_LIMIT, FREQUENCY_LIMIT, self.frequency);
    }

    pub fn is_manual(&self) -> bool {
        self.modulation_method == ModulationMethod::Manual
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}
