//! Voltage synthesis - leg commands, neutral injection and clamping
//!
//! All quantities are percent of the DC bus voltage. Ideal values may leave
//! the [0, 100] range (over-modulation); the `*_real` values are what an
//! inverter can actually deliver.

use crate::config::{ModulationMethod, SimulationConfig};

/// Phase offsets of the three legs in degrees
pub const LEG_OFFSETS_DEG: [f64; 3] = [0.0, 120.0, 240.0];
/// Width of one switching sector
pub const SECTOR_DEG: f64 = 60.0;

/// Operands of a neutral-offset strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeutralInputs {
    /// Raw phase signals s1..s3
    pub signals: [f64; 3],
    /// Per-phase sinusoid amplitude (amplitude * 2/3)
    pub amplitude: f64,
    /// Operator-supplied neutral for manual mode
    pub manual: f64,
}

impl NeutralInputs {
    pub fn max(&self) -> f64 {
        self.signals.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.signals.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// A pure common-mode offset function
pub type NeutralStrategy = fn(&NeutralInputs) -> f64;

impl ModulationMethod {
    /// Strategy table: method -> neutral offset function
    pub fn strategy(self) -> NeutralStrategy {
        match self {
            ModulationMethod::Sinusoidal => sinusoidal_neutral,
            ModulationMethod::SpaceVector => space_vector_neutral,
            ModulationMethod::Flattop120 => flattop120_neutral,
            ModulationMethod::Flattop60 => flattop60_neutral,
            ModulationMethod::Schoerner => schoerner_neutral,
            ModulationMethod::Manual => manual_neutral,
        }
    }
}

/// No injection, neutral sits at mid-bus
pub fn sinusoidal_neutral(_: &NeutralInputs) -> f64 {
    50.0
}

/// Min-max injection centring the leg envelope
pub fn space_vector_neutral(inputs: &NeutralInputs) -> f64 {
    50.0 - 0.5 * (inputs.max() + inputs.min())
}

/// Pins the most negative leg to the lower rail
pub fn flattop120_neutral(inputs: &NeutralInputs) -> f64 {
    -inputs.min()
}

/// Pins whichever extreme is larger to its rail
pub fn flattop60_neutral(inputs: &NeutralInputs) -> f64 {
    let (max, min) = (inputs.max(), inputs.min());
    if max > -min {
        100.0 - max
    } else {
        -min
    }
}

/// Asymmetric injection shifted by the sector's dominant extreme
pub fn schoerner_neutral(inputs: &NeutralInputs) -> f64 {
    let offset = (inputs.amplitude / 3f64.sqrt()) * 1.5;
    let (max, min) = (inputs.max(), inputs.min());
    if max + min > 0.0 {
        50.0 + offset - max
    } else {
        50.0 - offset - min
    }
}

pub fn manual_neutral(inputs: &NeutralInputs) -> f64 {
    inputs.manual
}

/// Instantaneous synthesized voltages
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Voltages {
    /// Raw phase signals s1..s3
    pub signals: [f64; 3],
    /// Ideal neutral potential (uStar)
    pub neutral: f64,
    /// Ideal leg commands u10..u30
    pub legs: [f64; 3],
    /// Leg commands clamped to [0, 100]
    pub legs_real: [f64; 3],
    /// Mean of the clamped legs
    pub neutral_real: f64,
    /// Realizable phase-to-neutral voltages us1..us3
    pub phase_real: [f64; 3],
}

impl Voltages {
    /// Any ideal leg command lies outside the realizable range
    pub fn is_saturated(&self) -> bool {
        self.legs.iter().any(|u| !(0.0..=100.0).contains(u))
    }
}

/// Per-phase sinusoid amplitude for an amplitude setting in percent
pub fn leg_amplitude(amplitude: f64) -> f64 {
    amplitude * 2.0 / 3.0
}

/// Angle used for synthesis and rendering.
///
/// In step mode this is the nearest sector boundary, always in [0, 360).
pub fn effective_angle(phase_deg: f64, step_mode: bool) -> f64 {
    if step_mode {
        snap_to_sector(phase_deg)
    } else {
        phase_deg
    }
}

/// Normalize an angle into [0, 360)
pub fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Nearest multiple of 60°, normalized into [0, 360)
pub fn snap_to_sector(phase_deg: f64) -> f64 {
    wrap_degrees((phase_deg / SECTOR_DEG).round() * SECTOR_DEG)
}

/// Synthesize leg commands and phase voltages at `phase_deg`
pub fn synthesize(phase_deg: f64, config: &SimulationConfig) -> Voltages {
    let amplitude = leg_amplitude(config.amplitude);
    let signals = LEG_OFFSETS_DEG.map(|offset| amplitude * (phase_deg - offset).to_radians().cos());

    let inputs = NeutralInputs {
        signals,
        amplitude,
        manual: config.manual_star_point,
    };
    let neutral = (config.modulation_method.strategy())(&inputs);

    let legs = signals.map(|s| s + neutral);
    let legs_real = legs.map(|u| u.clamp(0.0, 100.0));
    let neutral_real = legs_real.iter().sum::<f64>() / 3.0;
    let phase_real = legs_real.map(|u| u - neutral_real);

    Voltages {
        signals,
        neutral,
        legs,
        legs_real,
        neutral_real,
        phase_real,
    }
}
