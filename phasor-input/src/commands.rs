//! Command definitions for Phasor

use phasor_engine::ControlAction;

/// Input modes (vim-style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Command,
    /// Keyboard phase scrubbing
    Scrub,
    Help,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Command => "COMMAND",
            Mode::Scrub => "SCRUB",
            Mode::Help => "HELP",
        }
    }
}

/// Hardware bridge requests from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeAction {
    Enable,
    Disable,
    ResetEstop,
    TriggerEstop,
}

/// Commands produced by the input handler
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Forwarded to the simulator unchanged
    Control(ControlAction),

    // Phase scrubbing from the keyboard
    BeginScrub,
    /// Move the scrub angle by a signed number of degrees
    ScrubBy(f64),
    EndScrub,

    // Motor view
    ToggleMotor,
    OrbitMotor(f64, f64),
    ZoomMotor(f64),
    ResetCamera,

    // UI
    ToggleHelp,
    HelpScrollUp,
    HelpScrollDown,
    SetTheme(String),
    EnterCommandMode,
    EnterNormalMode,

    Bridge(BridgeAction),
    SaveSettings,
    /// Command line that could not be parsed, with the reason
    Invalid(String),
    /// Unrecognized command line
    ExecuteCommand(String),
    Quit,
}
