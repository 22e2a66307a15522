//! Settings persistence for Phasor
//!
//! Initial simulator configuration plus host preferences, stored as a
//! simple `key=value` file. Missing files give defaults; bad values are
//! skipped and reported back so the caller can log them once logging is up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use phasor_bridge::{BridgeConfig, DEFAULT_ENDPOINT};
use phasor_engine::{ModulationMethod, PhaseCount, PwmAlignment, SimulationConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Application settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub simulation: SimulationConfig,
    pub show_motor: bool,
    pub theme: String,
    /// Simulation and UI frame rate
    pub fps: u32,
    /// Motor render loop rate
    pub motor_fps: u32,
    pub bridge_enabled: bool,
    pub bridge_endpoint: String,
    pub bridge_sample_ms: u64,
    /// Overrides the default log location
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            show_motor: true,
            theme: "green".to_string(),
            fps: 30,
            motor_fps: 30,
            bridge_enabled: false,
            bridge_endpoint: DEFAULT_ENDPOINT.to_string(),
            bridge_sample_ms: 20,
            log_file: None,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl Settings {
    /// Load settings from the default location
    ///
    /// Returns defaults if the file doesn't exist or can't be read. The
    /// second value lists every problem met on the way.
    pub fn load() -> (Self, Vec<String>) {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(loaded) => loaded,
            Err(SettingsError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                (Self::default(), Vec::new())
            }
            Err(e) => (Self::default(), vec![format!("{}; using defaults", e)]),
        }
    }

    /// Read one settings file, returning the entries that were skipped
    pub fn load_from(path: &Path) -> Result<(Self, Vec<String>), SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_error = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, self.serialize()).map_err(write_error)
    }

    /// Get the default settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("phasor")
            .join("config.txt")
    }

    /// Log file location
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("phasor")
                .join("phasor.log")
        })
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            endpoint: self.bridge_endpoint.clone(),
            sample_interval: Duration::from_millis(self.bridge_sample_ms),
            ..BridgeConfig::default()
        }
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(1000 / self.fps.max(1) as u64)
    }

    /// Parse settings from simple key=value format
    fn parse(content: &str) -> (Self, Vec<String>) {
        let mut settings = Self::default();
        let mut problems = Vec::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                problems.push(format!("ignoring settings line without '=': {}", line));
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            if !settings.apply(key, value) {
                problems.push(format!("ignoring invalid setting {}={}", key, value));
            }
        }

        settings.simulation = settings.simulation.sanitized();
        (settings, problems)
    }

    /// Apply one entry; false when the value does not parse
    fn apply(&mut self, key: &str, value: &str) -> bool {
        let sim = &mut self.simulation;
        let number = || value.parse::<f64>().ok().filter(|v| v.is_finite());
        let flag = |target: &mut bool| parse_bool(value).map(|v| *target = v).is_some();

        match key {
            "phases" => value.parse::<PhaseCount>().map(|v| sim.phase_count = v).is_ok(),
            "modulation" => value.parse::<ModulationMethod>().map(|v| sim.modulation_method = v).is_ok(),
            "alignment" => value.parse::<PwmAlignment>().map(|v| sim.pwm_alignment = v).is_ok(),
            "amplitude" => number().map(|v| sim.amplitude = v).is_some(),
            "frequency" => number().map(|v| sim.frequency = v).is_some(),
            "manual_star_point" => number().map(|v| sim.manual_star_point = v).is_some(),
            "show_phase_voltages" => flag(&mut sim.show_phase_voltages),
            "show_star_point" => flag(&mut sim.show_star_point),
            "show_switching_vectors" => flag(&mut sim.show_switching_vectors),
            "show_time_graph" => flag(&mut sim.show_time_graph),
            "step_mode" => flag(&mut sim.step_mode),
            "show_motor" => flag(&mut self.show_motor),
            "theme" => {
                self.theme = value.to_string();
                true
            }
            "fps" => value.parse::<u32>().map(|v| self.fps = v.clamp(1, 240)).is_ok(),
            "motor_fps" => value.parse::<u32>().map(|v| self.motor_fps = v.clamp(1, 240)).is_ok(),
            "bridge_enabled" => flag(&mut self.bridge_enabled),
            "bridge_endpoint" if !value.is_empty() => {
                self.bridge_endpoint = value.to_string();
                true
            }
            "bridge_endpoint" => false,
            "bridge_sample_ms" => value
                .parse::<u64>()
                .map(|v| self.bridge_sample_ms = v.clamp(5, 1000))
                .is_ok(),
            "log_file" => {
                self.log_file = (!value.is_empty()).then(|| PathBuf::from(value));
                true
            }
            _ => true, // Ignore unknown keys
        }
    }

    /// Serialize settings to simple key=value format
    fn serialize(&self) -> String {
        let sim = &self.simulation;
        let mut lines = vec![
            "# Phasor Configuration".to_string(),
            format!("phases={}", sim.phase_count.count()),
            format!("modulation={}", sim.modulation_method.key()),
            format!("alignment={}", sim.pwm_alignment.key()),
            format!("amplitude={}", sim.amplitude),
            format!("frequency={}", sim.frequency),
            format!("manual_star_point={}", sim.manual_star_point),
            format!("show_phase_voltages={}", sim.show_phase_voltages),
            format!("show_star_point={}", sim.show_star_point),
            format!("show_switching_vectors={}", sim.show_switching_vectors),
            format!("show_time_graph={}", sim.show_time_graph),
            format!("step_mode={}", sim.step_mode),
            format!("show_motor={}", self.show_motor),
            format!("theme={}", self.theme),
            format!("fps={}", self.fps),
            format!("motor_fps={}", self.motor_fps),
            format!("bridge_enabled={}", self.bridge_enabled),
            format!("bridge_endpoint={}", self.bridge_endpoint),
            format!("bridge_sample_ms={}", self.bridge_sample_ms),
        ];
        if let Some(ref path) = self.log_file {
            lines.push(format!("log_file={}", path.display()));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let (settings, problems) = Settings::parse("");
        assert_eq!(settings, Settings::default());
        assert!(problems.is_empty());
    }

    #[test]
    fn test_parse_with_comments() {
        let content = "# Comment\nmodulation=svm\n# Another comment\nphases=1";
        let (settings, _) = Settings::parse(content);
        assert_eq!(settings.simulation.modulation_method, ModulationMethod::SpaceVector);
        assert_eq!(settings.simulation.phase_count, PhaseCount::Single);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let content = "amplitude=loud\nphases=2\nshow_motor=maybe\nfps=0\nfrobnicate=1";
        let (settings, problems) = Settings::parse(content);
        let defaults = Settings::default();
        assert!((settings.simulation.amplitude - defaults.simulation.amplitude).abs() < 1e-12);
        assert_eq!(settings.simulation.phase_count, defaults.simulation.phase_count);
        assert_eq!(settings.show_motor, defaults.show_motor);
        assert_eq!(settings.fps, 1);
        // Unknown keys are silent; the three bad values are reported
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("amplitude=loud"));
    }

    #[test]
    fn test_line_without_separator_is_reported() {
        let (settings, problems) = Settings::parse("theme=amber\nshow motor");
        assert_eq!(settings.theme, "amber");
        assert_eq!(problems, vec!["ignoring settings line without '=': show motor".to_string()]);
    }

    #[test]
    fn test_out_of_range_overrides_are_clamped() {
        let (settings, _) = Settings::parse("amplitude=250\nfrequency=-400\nmanual_star_point=-3");
        assert!((settings.simulation.amplitude - 100.0).abs() < 1e-12);
        assert!((settings.simulation.frequency + 100.0).abs() < 1e-12);
        assert!(settings.simulation.manual_star_point.abs() < 1e-12);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut settings = Settings::default();
        settings.simulation.modulation_method = ModulationMethod::Flattop60;
        settings.simulation.pwm_alignment = PwmAlignment::Edge;
        settings.simulation.amplitude = 72.0;
        settings.simulation.frequency = -12.0;
        settings.simulation.step_mode = true;
        settings.theme = "amber".to_string();
        settings.bridge_enabled = true;
        settings.bridge_endpoint = "10.0.0.5:9000".to_string();
        settings.log_file = Some(PathBuf::from("/tmp/phasor.log"));

        let (parsed, problems) = Settings::parse(&settings.serialize());
        assert!(problems.is_empty());
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("phasor-settings-{}", std::process::id()));
        let path = dir.join("nested").join("config.txt");
        let mut settings = Settings::default();
        settings.motor_fps = 60;

        settings.save_to(&path).expect("save");
        let (loaded, _) = Settings::load_from(&path).expect("load");
        assert_eq!(loaded.motor_fps, 60);

        let _ = fs::remove_dir_all(&dir);
        assert!(matches!(
            Settings::load_from(&path),
            Err(SettingsError::Read { .. })
        ));
    }

    #[test]
    fn test_bridge_config_from_settings() {
        let (settings, _) = Settings::parse("bridge_endpoint=192.168.1.20:4000\nbridge_sample_ms=2");
        let config = settings.bridge_config();
        assert_eq!(config.endpoint, "192.168.1.20:4000");
        assert_eq!(config.sample_interval, Duration::from_millis(5));
        assert!(config.validate().is_ok());
    }
}
