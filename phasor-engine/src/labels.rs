//! User-facing label lookup

use std::borrow::Cow;

/// Maps label keys to display strings; the engine never branches on the result
pub trait Translate {
    fn translate<'a>(&'a self, key: &'a str) -> Cow<'a, str>;
}

/// Built-in English label table. Unknown keys translate to themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLabels;

const ENGLISH: &[(&str, &str)] = &[
    ("section.system", "System Control"),
    ("section.modulation", "Modulation Strategy"),
    ("section.machine", "Machine Parameters"),
    ("control.start", "START"),
    ("control.start.tip", "Begin simulation"),
    ("control.stop", "STOP"),
    ("control.stop.tip", "Stop simulation"),
    ("control.single_phase", "1-Phase"),
    ("control.single_phase.tip", "Show a single phase"),
    ("control.three_phase", "3-Phase"),
    ("control.three_phase.tip", "Show all three phases"),
    ("control.voltages", "Voltages"),
    ("control.voltages.tip.on", "Works without limits"),
    ("control.voltages.tip.off", "Has a limit (Clipping)"),
    ("control.neutral", "Neutral"),
    ("control.neutral.tip", "Display star point"),
    ("control.vectors", "SVM Vectors"),
    ("control.vectors.tip", "Switching state vectors"),
    ("control.time_graph", "X-Deflection"),
    ("control.time_graph.tip", "Time domain sweep"),
    ("control.step", "Step"),
    ("control.step.tip", "Select Sector"),
    ("method.sinusoidal", "Sinusoidal"),
    ("method.sinusoidal.tip", "Traditional sinusoidal PWM"),
    ("method.space_vector", "Space Vector"),
    ("method.space_vector.tip", "Min-max common mode injection"),
    ("method.flattop120", "120° Flat"),
    ("method.flattop120.tip", "Lowest leg clamped to the negative rail"),
    ("method.flattop60", "60° Flat"),
    ("method.flattop60.tip", "Alternating rail clamp every 60°"),
    ("method.schoerner", "Schoerner"),
    ("method.schoerner.tip", "Optimized overmodulation"),
    ("method.manual", "Manual"),
    ("method.manual.tip", "Set the neutral point by hand"),
    ("align.center", "Center"),
    ("align.center.tip", "Center Aligned PWM Switching"),
    ("align.edge", "Edge"),
    ("align.edge.tip", "Edge Aligned PWM Switching"),
    ("slider.neutral", "Neutral Pt"),
    ("slider.neutral.tip", "Virtual ground potential offset"),
    ("slider.amplitude", "Amplitude %"),
    ("slider.amplitude.tip", "Output magnitude scale"),
    ("slider.frequency", "Frequency Hz"),
    ("slider.frequency.tip", "Electrical cycle frequency"),
    ("slider.angle", "Angle °"),
    ("slider.angle.tip", "Phase offset angle"),
    ("panel.time_graph", "Time Domain"),
    ("panel.hexagon", "Space Vector"),
    ("panel.pwm", "PWM"),
    ("panel.motor", "Motor"),
    ("panel.controls", "Controls"),
    ("status.running", "RUNNING"),
    ("status.stopped", "STOPPED"),
    ("status.angle", "Angle"),
    ("status.saturated", "SAT"),
    ("bridge.off", "Bridge off"),
    ("bridge.connected", "Bridge connected"),
    ("bridge.disconnected", "Bridge offline"),
    ("bridge.estop", "E-STOP"),
];

impl EnglishLabels {
    /// Every key this table knows
    pub fn keys() -> impl Iterator<Item = &'static str> {
        ENGLISH.iter().map(|(key, _)| *key)
    }
}

impl Translate for EnglishLabels {
    fn translate<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        ENGLISH
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, text)| Cow::Borrowed(*text))
            .unwrap_or(Cow::Borrowed(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_keys() {
        let labels = EnglishLabels;
        assert_eq!(labels.translate("control.start"), "START");
        assert_eq!(labels.translate("control.voltages.tip.off"), "Has a limit (Clipping)");
        assert_eq!(labels.translate("method.schoerner.tip"), "Optimized overmodulation");
    }

    #[test]
    fn test_unknown_key_passes_through() {
        assert_eq!(EnglishLabels.translate("no.such.key"), "no.such.key");
    }

    #[test]
    fn test_keys_are_unique() {
        let keys: Vec<_> = EnglishLabels::keys().collect();
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(keys.len(), unique.len());
    }
}
