//! Status bar widget - mode indicator, command line, run state and bridge link

use crate::app::MessageType;
use crate::theme::Theme;
use phasor_bridge::BridgeStatus;
use phasor_engine::{EnglishLabels, FrameReport, Translate};
use phasor_input::Mode;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Widget for displaying the status bar with mode and command input
pub struct StatusBarWidget<'a> {
    mode: Mode,
    command_buffer: &'a str,
    message: Option<&'a str>,
    message_type: MessageType,
    theme: &'a Theme,
    labels: &'a dyn Translate,
    /// Tooltip key of the hovered control
    tooltip: Option<&'a str>,
    report: Option<&'a FrameReport>,
    bridge: Option<BridgeStatus>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(mode: Mode, command_buffer: &'a str, theme: &'a Theme) -> Self {
        Self {
            mode,
            command_buffer,
            message: None,
            message_type: MessageType::Info,
            theme,
            labels: &EnglishLabels,
            tooltip: None,
            report: None,
            bridge: None,
        }
    }

    pub fn message(mut self, msg: Option<&'a str>, msg_type: MessageType) -> Self {
        self.message = msg;
        self.message_type = msg_type;
        self
    }

    pub fn labels(mut self, labels: &'a dyn Translate) -> Self {
        self.labels = labels;
        self
    }

    pub fn tooltip(mut self, key: Option<&'a str>) -> Self {
        self.tooltip = key;
        self
    }

    pub fn report(mut self, report: Option<&'a FrameReport>) -> Self {
        self.report = report;
        self
    }

    /// `None` while the bridge is disabled
    pub fn bridge(mut self, status: Option<BridgeStatus>) -> Self {
        self.bridge = status;
        self
    }

    fn mode_string(&self) -> (&'static str, Style) {
        let style = match self.mode {
            Mode::Normal | Mode::Help => self.theme.highlight(),
            Mode::Command => Style::from(self.theme.accent),
            Mode::Scrub => Style::from(self.theme.warning),
        };
        (self.mode.display_name(), style)
    }

    fn simulation_line(&self) -> Line<'a> {
        let Some(report) = self.report else {
            return Line::default();
        };
        let (state_key, state_style) = if report.running {
            ("status.running", self.theme.indicator(true))
        } else {
            ("status.stopped", Style::from(self.theme.warning))
        };
        let mut spans = vec![
            Span::styled(self.labels.translate(state_key).into_owned(), state_style),
            Span::raw("  "),
            Span::styled(self.labels.translate("status.angle").into_owned(), self.theme.dim()),
            Span::styled(format!(" {:>3.0}°", report.angle), self.theme.normal()),
        ];
        if report.voltages.is_saturated() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                self.labels.translate("status.saturated").into_owned(),
                Style::default().fg(self.theme.danger),
            ));
        }
        Line::from(spans)
    }

    fn bridge_line(&self) -> Line<'a> {
        let Some(status) = self.bridge else {
            return Line::from(Span::styled(
                self.labels.translate("bridge.off").into_owned(),
                self.theme.dim(),
            ));
        };
        let mut spans = Vec::new();
        if status.e_stop {
            spans.push(Span::styled(
                format!(" {} ", self.labels.translate("bridge.estop")),
                self.theme.alarm(),
            ));
            spans.push(Span::raw(" "));
        }
        if status.connected {
            spans.push(Span::styled(
                self.labels.translate("bridge.connected").into_owned(),
                Style::from(self.theme.accent),
            ));
            if status.feedback.connected {
                let [a, b, c] = status.feedback.currents();
                spans.push(Span::styled(
                    format!(" {:.2}/{:.2}/{:.2}A", a, b, c),
                    self.theme.normal(),
                ));
            }
        } else {
            spans.push(Span::styled(
                self.labels.translate("bridge.disconnected").into_owned(),
                Style::from(self.theme.warning),
            ));
        }
        Line::from(spans)
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let chunks = Layout::horizontal([
            Constraint::Length(10), // Mode indicator
            Constraint::Min(20),    // Command/message area
            Constraint::Length(28), // Run state and angle
            Constraint::Length(36), // Bridge link
            Constraint::Length(20), // Help hint
        ])
        .split(area);

        let (mode_text, mode_style) = self.mode_string();
        let mode_line = Line::from(vec![
            Span::raw("["),
            Span::styled(mode_text, mode_style),
            Span::raw("]"),
        ]);
        Paragraph::new(mode_line).render(chunks[0], buf);

        let content = if self.mode == Mode::Command {
            Line::from(vec![
                Span::styled(":", Style::from(self.theme.accent)),
                Span::styled(self.command_buffer, self.theme.normal()),
                Span::styled("█", self.theme.highlight()), // Cursor
            ])
        } else if let Some(msg) = self.message {
            let msg_style = match self.message_type {
                MessageType::Info => self.theme.dim(),
                MessageType::Success => Style::from(self.theme.accent),
                MessageType::Warning => Style::default().fg(self.theme.warning),
                MessageType::Error => Style::default().fg(self.theme.danger),
            };
            Line::from(Span::styled(msg, msg_style))
        } else if let Some(key) = self.tooltip {
            Line::from(Span::styled(self.labels.translate(key).into_owned(), self.theme.normal()))
        } else {
            Line::from(Span::styled(
                "Ready. Press ? for help, : for commands",
                self.theme.dim(),
            ))
        };
        Paragraph::new(content).render(chunks[1], buf);

        Paragraph::new(self.simulation_line()).render(chunks[2], buf);
        Paragraph::new(self.bridge_line()).render(chunks[3], buf);

        let help = match self.mode {
            Mode::Normal => "spc:run  ?:help",
            Mode::Command => "Enter:run  Esc:cancel",
            Mode::Scrub => "h/l H/L  Enter:done",
            Mode::Help => "Esc:close help",
        };
        let help_line = Line::from(Span::styled(help, self.theme.dim()));
        Paragraph::new(help_line).render(chunks[4], buf);
    }
}

/// Inner width of the help box
const HELP_WIDTH: usize = 64;

enum HelpEntry {
    Heading(&'static str),
    Key(&'static str, &'static str),
    Blank,
}

use HelpEntry::{Blank, Heading, Key};

const HELP_ENTRIES: &[HelpEntry] = &[
    Heading("SIMULATION"),
    Key("Space", "Start / stop"),
    Key("1 / 3", "Single phase / three phase"),
    Key("v", "Phase voltages / leg potentials"),
    Key("n", "Show neutral (star point)"),
    Key("w", "Show switching vectors"),
    Key("x", "Show time graph"),
    Key("t", "Step mode (60° sectors)"),
    Blank,
    Heading("MODULATION"),
    Key("F1 - F6", "Sine / SVM / 120° / 60° / Schoerner / Manual"),
    Key("c / e", "Center / edge aligned PWM"),
    Key("a / A", "Amplitude -1 / +1 %"),
    Key("f / F", "Frequency -1 / +1 Hz"),
    Key("s / S", "Manual neutral -1 / +1 %"),
    Blank,
    Heading("ANGLE"),
    Key("p", "Scrub the phase angle"),
    Key("h / l", "Scrub -1° / +1°"),
    Key("H / L", "Scrub -10° / +10°"),
    Key("Enter / Esc", "Finish scrubbing"),
    Key("Mouse", "Drag the angle slider"),
    Blank,
    Heading("MOTOR"),
    Key("m", "Show / hide motor view"),
    Key("Arrows", "Orbit camera"),
    Key("+ / -", "Zoom in / out"),
    Key("0", "Reset camera"),
    Key("Mouse", "Drag to orbit, wheel to zoom"),
    Blank,
    Heading("COMMANDS"),
    Key(":start :stop", "Run control"),
    Key(":amp N", "Amplitude 0-100 %"),
    Key(":freq N", "Frequency -100..100 Hz"),
    Key(":neutral N", "Manual neutral 0-100 %"),
    Key(":phase N", "Jump to angle"),
    Key(":method M", "sine|svm|flat120|flat60|schoerner|manual"),
    Key(":align A", "center|edge"),
    Key(":phases N", "1|3"),
    Key(":theme T", "green|amber|cyber"),
    Key(":bridge X", "on|off|reset|stop"),
    Key(":motor", "Toggle motor view"),
    Key(":w", "Save settings"),
    Key(":q", "Quit"),
];

/// Help overlay widget
pub struct HelpWidget<'a> {
    theme: &'a Theme,
    scroll: u16,
}

impl<'a> HelpWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme, scroll: 0 }
    }

    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    fn help_lines() -> Vec<String> {
        let rule = "═".repeat(HELP_WIDTH);
        let mut lines = vec![
            format!("╔{}╗", rule),
            format!("║{:^width$}║", "PHASOR - THREE-PHASE PWM", width = HELP_WIDTH),
            format!("╠{}╣", rule),
        ];
        for entry in HELP_ENTRIES {
            let body = match entry {
                Heading(title) => format!(" {}", title),
                Key(key, text) => format!("   {:<14}{}", key, text),
                Blank => String::new(),
            };
            lines.push(format!("║{:<width$}║", body, width = HELP_WIDTH));
        }
        lines.push(format!("╠{}╣", rule));
        lines.push(format!("║{:^width$}║", "Press Esc or ? to close help", width = HELP_WIDTH));
        lines.push(format!("║{:^width$}║", "Ctrl-Q to quit", width = HELP_WIDTH));
        lines.push(format!("╚{}╝", rule));
        lines
    }
}

impl Widget for HelpWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Clear background
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                buf[(x, y)].set_char(' ').set_style(self.theme.normal());
            }
        }

        let help_text = Self::help_lines();
        let total_lines = help_text.len() as u16;
        let visible_lines = area.height.min(total_lines);

        let max_scroll = total_lines.saturating_sub(visible_lines);
        let scroll = self.scroll.min(max_scroll);

        let start_x = area.x + area.width.saturating_sub(HELP_WIDTH as u16 + 2) / 2;

        for (i, line) in help_text
            .iter()
            .skip(scroll as usize)
            .take(visible_lines as usize)
            .enumerate()
        {
            let y = area.y + i as u16;
            for (j, ch) in line.chars().enumerate() {
                let x = start_x + j as u16;
                if x >= area.x + area.width {
                    break;
                }
                let style = if matches!(ch, '║' | '╔' | '╗' | '╚' | '╝' | '═' | '╠' | '╣') {
                    self.theme.border()
                } else {
                    self.theme.normal()
                };
                buf[(x, y)].set_char(ch).set_style(style);
            }
        }

        if total_lines > visible_lines && area.height > 0 {
            let indicator = format!(" [{}/{}] ", scroll + 1, max_scroll + 1);
            let indicator_x = area.x + area.width.saturating_sub(indicator.len() as u16 + 2);
            let indicator_y = area.y + area.height - 1;

            for (i, ch) in indicator.chars().enumerate() {
                let x = indicator_x + i as u16;
                if x < area.x + area.width {
                    buf[(x, indicator_y)].set_char(ch).set_style(self.theme.dim());
                }
            }
        }
    }
}
