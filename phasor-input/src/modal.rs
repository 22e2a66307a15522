//! Modal state machine for vim-style input handling

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use phasor_engine::{ControlAction, ModulationMethod, PhaseCount, PwmAlignment};

use crate::commands::{BridgeAction, Command, Mode};

/// Slider change per key press (percent or Hz)
pub const NUDGE_STEP: f64 = 1.0;
/// Scrub change per key press in degrees
pub const SCRUB_STEP: f64 = 1.0;
/// Camera rotation per arrow key in radians
const ORBIT_STEP: f64 = 0.1;
const ZOOM_STEP: f64 = 1.1;

/// Handles keyboard input and converts to commands
pub struct InputHandler {
    mode: Mode,
    command_buffer: String,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            command_buffer: String::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current command buffer (for display)
    pub fn command_buffer(&self) -> &str {
        &self.command_buffer
    }

    /// Handle a key event and return a command if applicable
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Command::Quit);
        }
        match self.mode {
            Mode::Normal => self.handle_normal_mode(key),
            Mode::Command => self.handle_command_mode(key),
            Mode::Scrub => self.handle_scrub_mode(key),
            Mode::Help => self.handle_help_mode(key),
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> Option<Command> {
        let control = |action| Some(Command::Control(action));
        match key.code {
            // Mode switching
            KeyCode::Char(':') => {
                self.mode = Mode::Command;
                self.command_buffer.clear();
                Some(Command::EnterCommandMode)
            }
            KeyCode::Char('?') => {
                self.mode = Mode::Help;
                Some(Command::ToggleHelp)
            }
            KeyCode::Char('p') => {
                self.mode = Mode::Scrub;
                Some(Command::BeginScrub)
            }

            // System control
            KeyCode::Char(' ') => control(ControlAction::ToggleRun),
            KeyCode::Char('1') => control(ControlAction::SetPhaseCount(PhaseCount::Single)),
            KeyCode::Char('3') => control(ControlAction::SetPhaseCount(PhaseCount::Three)),
            KeyCode::Char('v') => control(ControlAction::TogglePhaseVoltages),
            KeyCode::Char('n') => control(ControlAction::ToggleStarPoint),
            KeyCode::Char('w') => control(ControlAction::ToggleSwitchingVectors),
            KeyCode::Char('x') => control(ControlAction::ToggleTimeGraph),
            KeyCode::Char('t') => control(ControlAction::ToggleStepMode),

            // Modulation strategy
            KeyCode::F(n @ 1..=6) => {
                control(ControlAction::SetMethod(ModulationMethod::ALL[usize::from(n) - 1]))
            }
            KeyCode::Char('c') => control(ControlAction::SetAlignment(PwmAlignment::Center)),
            KeyCode::Char('e') => control(ControlAction::SetAlignment(PwmAlignment::Edge)),

            // Machine parameters
            KeyCode::Char('a') => control(ControlAction::NudgeAmplitude(-NUDGE_STEP)),
            KeyCode::Char('A') => control(ControlAction::NudgeAmplitude(NUDGE_STEP)),
            KeyCode::Char('f') => control(ControlAction::NudgeFrequency(-NUDGE_STEP)),
            KeyCode::Char('F') => control(ControlAction::NudgeFrequency(NUDGE_STEP)),
            KeyCode::Char('s') => control(ControlAction::NudgeManualStarPoint(-NUDGE_STEP)),
            KeyCode::Char('S') => control(ControlAction::NudgeManualStarPoint(NUDGE_STEP)),

            // Motor view
            KeyCode::Char('m') => Some(Command::ToggleMotor),
            KeyCode::Left => Some(Command::OrbitMotor(-ORBIT_STEP, 0.0)),
            KeyCode::Right => Some(Command::OrbitMotor(ORBIT_STEP, 0.0)),
            KeyCode::Up => Some(Command::OrbitMotor(0.0, ORBIT_STEP)),
            KeyCode::Down => Some(Command::OrbitMotor(0.0, -ORBIT_STEP)),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Command::ZoomMotor(1.0 / ZOOM_STEP)),
            KeyCode::Char('-') => Some(Command::ZoomMotor(ZOOM_STEP)),
            KeyCode::Char('0') => Some(Command::ResetCamera),

            _ => None,
        }
    }

    fn handle_command_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Enter => {
                let cmd = self.parse_command();
                self.mode = Mode::Normal;
                let buffer = std::mem::take(&mut self.command_buffer);
                cmd.or(Some(Command::ExecuteCommand(buffer)))
            }
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.command_buffer.clear();
                Some(Command::EnterNormalMode)
            }
            KeyCode::Backspace => {
                self.command_buffer.pop();
                if self.command_buffer.is_empty() {
                    self.mode = Mode::Normal;
                    Some(Command::EnterNormalMode)
                } else {
                    None
                }
            }
            KeyCode::Char(c) => {
                self.command_buffer.push(c);
                None
            }
            _ => None,
        }
    }

    fn parse_command(&self) -> Option<Command> {
        let input = self.command_buffer.trim();
        let (name, arg) = match input.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (input, ""),
        };

        let number = |what: &str| -> Result<f64, Command> {
            arg.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| Command::Invalid(format!("{} needs a number, got '{}'", what, arg)))
        };
        let control = |action| Command::Control(action);

        let cmd = match (name, arg) {
            ("q" | "quit", "") => Command::Quit,
            ("w" | "write", "") => Command::SaveSettings,
            ("help", "") => Command::ToggleHelp,
            ("start", "") => control(ControlAction::Start),
            ("stop", "") => control(ControlAction::Stop),
            ("motor", "") => Command::ToggleMotor,
            ("amp" | "amplitude", _) => number("amp").map_or_else(|e| e, |v| control(ControlAction::SetAmplitude(v))),
            ("freq" | "frequency", _) => {
                number("freq").map_or_else(|e| e, |v| control(ControlAction::SetFrequency(v)))
            }
            ("neutral", _) => number("neutral").map_or_else(|e| e, |v| control(ControlAction::SetManualStarPoint(v))),
            ("phase" | "angle", _) => number("phase").map_or_else(|e| e, |v| control(ControlAction::SetPhase(v))),
            ("method", _) => match arg.parse::<ModulationMethod>() {
                Ok(method) => control(ControlAction::SetMethod(method)),
                Err(e) => Command::Invalid(e.to_string()),
            },
            ("align", _) => match arg.parse::<PwmAlignment>() {
                Ok(alignment) => control(ControlAction::SetAlignment(alignment)),
                Err(e) => Command::Invalid(e.to_string()),
            },
            ("phases", _) => match arg.parse::<PhaseCount>() {
                Ok(count) => control(ControlAction::SetPhaseCount(count)),
                Err(e) => Command::Invalid(e.to_string()),
            },
            ("theme", name) if !name.is_empty() => Command::SetTheme(name.to_string()),
            ("bridge", "on") => Command::Bridge(BridgeAction::Enable),
            ("bridge", "off") => Command::Bridge(BridgeAction::Disable),
            ("bridge", "reset") => Command::Bridge(BridgeAction::ResetEstop),
            ("bridge", "stop" | "estop") => Command::Bridge(BridgeAction::TriggerEstop),
            ("bridge", other) => Command::Invalid(format!("bridge expects on|off|reset|stop, got '{}'", other)),
            _ => return None,
        };
        Some(cmd)
    }

    fn handle_scrub_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => Some(Command::ScrubBy(-SCRUB_STEP)),
            KeyCode::Char('l') | KeyCode::Right => Some(Command::ScrubBy(SCRUB_STEP)),
            KeyCode::Char('H') => Some(Command::ScrubBy(-10.0 * SCRUB_STEP)),
            KeyCode::Char('L') => Some(Command::ScrubBy(10.0 * SCRUB_STEP)),
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('p') => {
                self.mode = Mode::Normal;
                Some(Command::EndScrub)
            }
            _ => None,
        }
    }

    fn handle_help_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.mode = Mode::Normal;
                Some(Command::ToggleHelp)
            }
            KeyCode::Char('j') | KeyCode::Down => Some(Command::HelpScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Command::HelpScrollUp),
            _ => None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(handler: &mut InputHandler, code: KeyCode) -> Option<Command> {
        handler.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn run_command(text: &str) -> Option<Command> {
        let mut handler = InputHandler::new();
        press(&mut handler, KeyCode::Char(':'));
        for c in text.chars() {
            press(&mut handler, KeyCode::Char(c));
        }
        let cmd = press(&mut handler, KeyCode::Enter);
        assert_eq!(handler.mode(), Mode::Normal);
        cmd
    }

    #[test]
    fn test_normal_keys_map_to_actions() {
        let mut handler = InputHandler::new();
        assert_eq!(
            press(&mut handler, KeyCode::Char(' ')),
            Some(Command::Control(ControlAction::ToggleRun))
        );
        assert_eq!(
            press(&mut handler, KeyCode::F(2)),
            Some(Command::Control(ControlAction::SetMethod(ModulationMethod::SpaceVector)))
        );
        assert_eq!(
            press(&mut handler, KeyCode::Char('A')),
            Some(Command::Control(ControlAction::NudgeAmplitude(NUDGE_STEP)))
        );
        assert_eq!(press(&mut handler, KeyCode::F(9)), None);
    }

    #[test]
    fn test_ctrl_q_quits_from_any_mode() {
        let mut handler = InputHandler::new();
        press(&mut handler, KeyCode::Char('p'));
        assert_eq!(handler.mode(), Mode::Scrub);
        let quit = handler.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert_eq!(quit, Some(Command::Quit));
    }

    #[test]
    fn test_scrub_mode_cycle() {
        let mut handler = InputHandler::new();
        assert_eq!(press(&mut handler, KeyCode::Char('p')), Some(Command::BeginScrub));
        assert_eq!(press(&mut handler, KeyCode::Char('l')), Some(Command::ScrubBy(SCRUB_STEP)));
        assert_eq!(press(&mut handler, KeyCode::Char('H')), Some(Command::ScrubBy(-10.0)));
        // normal-mode keys are inert while scrubbing
        assert_eq!(press(&mut handler, KeyCode::Char(' ')), None);
        assert_eq!(press(&mut handler, KeyCode::Esc), Some(Command::EndScrub));
        assert_eq!(handler.mode(), Mode::Normal);
    }

    #[test]
    fn test_command_line_values() {
        assert_eq!(
            run_command("amp 75"),
            Some(Command::Control(ControlAction::SetAmplitude(75.0)))
        );
        assert_eq!(
            run_command("freq -20"),
            Some(Command::Control(ControlAction::SetFrequency(-20.0)))
        );
        assert_eq!(
            run_command("method flat60"),
            Some(Command::Control(ControlAction::SetMethod(ModulationMethod::Flattop60)))
        );
        assert_eq!(
            run_command("phases 1"),
            Some(Command::Control(ControlAction::SetPhaseCount(PhaseCount::Single)))
        );
        assert_eq!(run_command("theme amber"), Some(Command::SetTheme("amber".into())));
        assert_eq!(run_command("bridge reset"), Some(Command::Bridge(BridgeAction::ResetEstop)));
        assert_eq!(run_command("w"), Some(Command::SaveSettings));
        assert_eq!(run_command("q"), Some(Command::Quit));
    }

    #[test]
    fn test_command_line_errors() {
        assert!(matches!(run_command("amp loud"), Some(Command::Invalid(_))));
        assert!(matches!(run_command("amp NaN"), Some(Command::Invalid(_))));
        assert!(matches!(run_command("method trapezoid"), Some(Command::Invalid(_))));
        assert!(matches!(run_command("bridge maybe"), Some(Command::Invalid(_))));
        assert_eq!(run_command("frobnicate"), Some(Command::ExecuteCommand("frobnicate".into())));
    }

    #[test]
    fn test_backspace_on_empty_buffer_leaves_command_mode() {
        let mut handler = InputHandler::new();
        press(&mut handler, KeyCode::Char(':'));
        press(&mut handler, KeyCode::Char('w'));
        assert_eq!(handler.command_buffer(), "w");
        assert_eq!(press(&mut handler, KeyCode::Backspace), Some(Command::EnterNormalMode));
        assert_eq!(handler.mode(), Mode::Normal);
    }

    #[test]
    fn test_help_mode_scrolls_and_closes() {
        let mut handler = InputHandler::new();
        press(&mut handler, KeyCode::Char('?'));
        assert_eq!(press(&mut handler, KeyCode::Char('j')), Some(Command::HelpScrollDown));
        assert_eq!(press(&mut handler, KeyCode::Char('q')), Some(Command::ToggleHelp));
        assert_eq!(handler.mode(), Mode::Normal);
    }
}
