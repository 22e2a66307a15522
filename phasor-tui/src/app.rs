//! Application state management (Elm architecture)

use crate::theme::Theme;
use phasor_bridge::{BridgeEvent, BridgeStatus};
use phasor_engine::FrameReport;
use phasor_input::Mode;

/// Message type for colored status messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Application state
pub struct AppState {
    // UI state
    pub mode: Mode,
    pub command_buffer: String,
    pub message: Option<String>,
    pub message_type: MessageType,
    pub show_help: bool,
    pub help_scroll: u16,
    /// Motor panel visibility
    pub show_motor: bool,
    /// Tooltip key of the control under the pointer
    pub tooltip: Option<&'static str>,

    /// Latest simulator frame
    pub report: Option<FrameReport>,
    /// `None` while the hardware bridge is disabled
    pub bridge: Option<BridgeStatus>,

    // Theme
    pub theme: Theme,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            command_buffer: String::new(),
            message: None,
            message_type: MessageType::Info,
            show_help: false,
            help_scroll: 0,
            show_motor: true,
            tooltip: None,
            report: None,
            bridge: None,
            theme: Theme::default(),
        }
    }

    /// Apply a bridge event to the mirrored status and surface it as a message
    pub fn handle_bridge_event(&mut self, event: &BridgeEvent) {
        let status = self.bridge.get_or_insert_with(BridgeStatus::default);
        match event {
            BridgeEvent::Connected(endpoint) => {
                status.connected = true;
                self.set_success(format!("Bridge connected to {}", endpoint));
            }
            BridgeEvent::Disconnected(reason) => {
                status.connected = false;
                status.feedback.connected = false;
                self.set_warning(format!("Bridge disconnected: {}", reason));
            }
            BridgeEvent::EstopLatched => {
                status.e_stop = true;
                self.set_error("EMERGENCY STOP latched - :bridge reset to clear");
            }
            BridgeEvent::EstopCleared => {
                status.e_stop = false;
                self.set_success("Emergency stop cleared");
            }
        }
    }

    /// Set current mode
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        if mode != Mode::Command {
            self.command_buffer.clear();
        }
    }

    /// Toggle help display
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn help_scroll_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(3);
    }

    pub fn help_scroll_down(&mut self) {
        self.help_scroll = self.help_scroll.saturating_add(3);
    }

    /// Set theme by name
    pub fn set_theme(&mut self, name: &str) {
        match Theme::by_name(name) {
            Some(theme) => {
                self.theme = theme;
                self.set_success(format!("Theme set to: {}", self.theme.name));
            }
            None => self.set_error(format!("Unknown theme: {}. Use green/amber/cyber", name)),
        }
    }

    /// Set an info message
    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Info;
    }

    pub fn set_success(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Success;
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Warning;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Error;
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Main application wrapper
pub struct App {
    pub state: AppState,
    pub should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{CRT_AMBER, CRT_GREEN};
    use phasor_bridge::MotorFeedback;

    #[test]
    fn test_set_theme_unknown_keeps_current() {
        let mut state = AppState::new();
        state.set_theme("amber");
        assert_eq!(state.theme, CRT_AMBER);
        assert_eq!(state.message_type, MessageType::Success);

        state.set_theme("sepia");
        assert_eq!(state.theme, CRT_AMBER);
        assert_eq!(state.message_type, MessageType::Error);
        assert!(state.message.as_deref().is_some_and(|m| m.contains("sepia")));
        assert_ne!(state.theme, CRT_GREEN);
    }

    #[test]
    fn test_help_scroll_resets_on_open() {
        let mut state = AppState::new();
        state.toggle_help();
        state.help_scroll_down();
        state.help_scroll_down();
        assert_eq!(state.help_scroll, 6);
        state.help_scroll_up();
        assert_eq!(state.help_scroll, 3);

        state.toggle_help();
        state.toggle_help();
        assert_eq!(state.help_scroll, 0);

        state.help_scroll_up();
        assert_eq!(state.help_scroll, 0);
    }

    #[test]
    fn test_set_mode_clears_command_buffer() {
        let mut state = AppState::new();
        state.set_mode(Mode::Command);
        state.command_buffer.push_str("amp 40");
        state.set_mode(Mode::Normal);
        assert!(state.command_buffer.is_empty());
    }

    #[test]
    fn test_bridge_events_update_status() {
        let mut state = AppState::new();
        assert!(state.bridge.is_none());

        state.handle_bridge_event(&BridgeEvent::Connected("127.0.0.1:4000".into()));
        let status = state.bridge.expect("status after connect");
        assert!(status.connected);
        assert!(!status.e_stop);

        if let Some(status) = state.bridge.as_mut() {
            status.feedback = MotorFeedback {
                ch1_current: 0.5,
                ch2_current: -0.25,
                ch3_current: 0.0,
                connected: true,
            };
        }
        state.handle_bridge_event(&BridgeEvent::Disconnected("reset by peer".into()));
        state.handle_bridge_event(&BridgeEvent::EstopLatched);

        let status = state.bridge.expect("status after loss");
        assert!(!status.connected);
        assert!(status.e_stop);
        assert!((status.feedback.ch1_current - 0.5).abs() < 1e-12);
        assert!(!status.feedback.connected);
        assert_eq!(state.message_type, MessageType::Error);

        state.handle_bridge_event(&BridgeEvent::EstopCleared);
        assert!(state.bridge.is_some_and(|s| !s.e_stop));
    }
}
