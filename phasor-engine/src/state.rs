//! Simulation state - previous/current samples for incremental drawing

use crate::synthesis::Voltages;

/// Last two samples of a plotted quantity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Trace {
    pub prev: f64,
    pub current: f64,
}

impl Trace {
    pub fn new(value: f64) -> Self {
        Self {
            prev: value,
            current: value,
        }
    }

    /// Stash the current value and record a new one
    pub fn push(&mut self, value: f64) {
        self.prev = self.current;
        self.current = value;
    }
}

/// Electrical state owned by the simulation clock
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    /// Continuous electrical angle in [0, 360)
    pub phase: f64,
    /// Horizontal sweep position of the time graph (logical units)
    pub x_deflection: Trace,
    /// Ideal neutral (uStar)
    pub neutral: Trace,
    /// Ideal leg commands u10..u30
    pub legs: [Trace; 3],
    /// Clamped leg commands
    pub legs_real: [Trace; 3],
    /// Realizable neutral
    pub neutral_real: Trace,
    /// Realizable phase-to-neutral voltages
    pub phase_real: [Trace; 3],
}

impl SimulationState {
    /// State at `phase` with both samples equal to `voltages`
    pub fn at(phase: f64, voltages: &Voltages) -> Self {
        Self {
            phase,
            x_deflection: Trace::new(0.0),
            neutral: Trace::new(voltages.neutral),
            legs: voltages.legs.map(Trace::new),
            legs_real: voltages.legs_real.map(Trace::new),
            neutral_real: Trace::new(voltages.neutral_real),
            phase_real: voltages.phase_real.map(Trace::new),
        }
    }

    /// Push a freshly synthesized sample into every trace
    pub fn record(&mut self, voltages: &Voltages) {
        self.neutral.push(voltages.neutral);
        self.neutral_real.push(voltages.neutral_real);
        for i in 0..3 {
            self.legs[i].push(voltages.legs[i]);
            self.legs_real[i].push(voltages.legs_real[i]);
            self.phase_real[i].push(voltages.phase_real[i]);
        }
    }

    /// The sweep restarted on this step
    pub fn wrapped(&self) -> bool {
        self.x_deflection.current < self.x_deflection.prev
    }
}

/// Presentation-only animation counters for switching-vector highlighting.
///
/// Never feeds back into the electrical state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlickerState {
    pub a: f64,
    pub b: f64,
}

impl FlickerState {
    pub fn advance(&mut self, increment: f64) {
        self.a = (self.a + increment).rem_euclid(1.0);
        self.b = (self.b + increment).rem_euclid(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::synthesis::synthesize;

    #[test]
    fn test_trace_push() {
        let mut trace = Trace::new(1.0);
        trace.push(2.0);
        assert_eq!(trace.prev, 1.0);
        assert_eq!(trace.current, 2.0);
    }

    #[test]
    fn test_record_keeps_previous_sample() {
        let config = SimulationConfig::default();
        let first = synthesize(0.0, &config);
        let second = synthesize(30.0, &config);
        let mut state = SimulationState::at(0.0, &first);
        state.record(&second);
        assert_eq!(state.legs[0].prev, first.legs[0]);
        assert_eq!(state.legs[0].current, second.legs[0]);
        assert_eq!(state.phase_real[2].prev, first.phase_real[2]);
        assert_eq!(state.neutral_real.current, second.neutral_real);
    }

    #[test]
    fn test_flicker_wraps() {
        let mut flicker = FlickerState::default();
        for _ in 0..7 {
            flicker.advance(0.15);
        }
        assert!((flicker.a - 0.05).abs() < 1e-9);
        assert!((0.0..1.0).contains(&flicker.b));
    }
}
