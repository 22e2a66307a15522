//! Rotor pose and coil glow derived from a motor frame

use super::MotorFrame;

/// Glow of a coil with no excitation, also used whenever the simulation stops
pub const IDLE_GLOW: f64 = 0.15;
/// Phase voltage that counts as one unit of excitation
const VOLTAGE_NORM: f64 = 35.0;
const GLOW_GAIN: f64 = 3.0;

/// Emissive intensity of a coil carrying `voltage`
pub fn coil_intensity(voltage: f64, amplitude: f64, running: bool) -> f64 {
    if !running {
        return IDLE_GLOW;
    }
    IDLE_GLOW + (voltage.abs() / VOLTAGE_NORM) * (amplitude / 100.0) * GLOW_GAIN
}

/// Animated state of the motor model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorModel {
    /// Rotor rotation about the shaft in radians
    pub rotor_angle: f64,
    pub coil_intensity: [f64; 3],
    pub running: bool,
}

impl Default for MotorModel {
    fn default() -> Self {
        Self {
            rotor_angle: 0.0,
            coil_intensity: [IDLE_GLOW; 3],
            running: false,
        }
    }
}

impl MotorModel {
    /// Apply a frame directly, without smoothing
    pub fn update(&mut self, frame: &MotorFrame) {
        self.rotor_angle = frame.angle.to_radians();
        self.running = frame.running;
        self.coil_intensity = frame
            .phase_voltages
            .map(|v| coil_intensity(v, frame.amplitude, frame.running));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_scales_with_voltage_and_amplitude() {
        assert!((coil_intensity(35.0, 100.0, true) - 3.15).abs() < 1e-9);
        assert!((coil_intensity(-35.0, 50.0, true) - 1.65).abs() < 1e-9);
        assert_eq!(coil_intensity(0.0, 100.0, true), IDLE_GLOW);
    }

    #[test]
    fn test_stopped_motor_idles() {
        let mut model = MotorModel::default();
        model.update(&MotorFrame {
            angle: 90.0,
            phase_voltages: [40.0, -20.0, -20.0],
            amplitude: 100.0,
            running: true,
        });
        assert!(model.coil_intensity[0] > 1.0);

        model.update(&MotorFrame {
            angle: 90.0,
            phase_voltages: [40.0, -20.0, -20.0],
            amplitude: 100.0,
            running: false,
        });
        assert_eq!(model.coil_intensity, [IDLE_GLOW; 3]);
        assert!((model.rotor_angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
