//! Screen layout and pointer hit-testing

use ratatui::{
    layout::{Constraint, Layout, Rect},
    widgets::{Block, Borders},
};

/// Control panel height: title row plus nine control rows inside a border
pub const CONTROLS_HEIGHT: u16 = 12;
/// Motor panel width when shown
pub const MOTOR_WIDTH: u16 = 28;

/// Screen regions a pointer can land in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    TimeGraph,
    Hexagon,
    Pwm,
    Controls,
    Motor,
    Status,
}

/// Panel rectangles for one terminal size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub time_graph: Rect,
    pub hexagon: Rect,
    pub pwm: Rect,
    pub controls: Rect,
    pub motor: Option<Rect>,
    pub status: Rect,
}

impl ScreenLayout {
    pub fn compute(area: Rect, show_motor: bool) -> Self {
        let rows = Layout::vertical([
            Constraint::Min(8),
            Constraint::Length(CONTROLS_HEIGHT),
            Constraint::Length(1),
        ])
        .split(area);

        let plots = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[0]);

        let (controls, motor) = if show_motor {
            let bottom = Layout::horizontal([Constraint::Min(40), Constraint::Length(MOTOR_WIDTH)])
                .split(rows[1]);
            (bottom[0], Some(bottom[1]))
        } else {
            (rows[1], None)
        };

        Self {
            time_graph: plots[0],
            hexagon: plots[1],
            pwm: plots[2],
            controls,
            motor,
            status: rows[2],
        }
    }

    /// Area inside the control panel border
    pub fn controls_inner(&self) -> Rect {
        Block::default().borders(Borders::ALL).inner(self.controls)
    }

    pub fn region_at(&self, column: u16, row: u16) -> Option<Region> {
        let contains = |r: Rect| column >= r.x && column < r.right() && row >= r.y && row < r.bottom();
        [
            (Some(self.time_graph), Region::TimeGraph),
            (Some(self.hexagon), Region::Hexagon),
            (Some(self.pwm), Region::Pwm),
            (Some(self.controls), Region::Controls),
            (self.motor, Region::Motor),
            (Some(self.status), Region::Status),
        ]
        .into_iter()
        .find_map(|(rect, region)| rect.filter(|r| contains(*r)).map(|_| region))
    }
}
