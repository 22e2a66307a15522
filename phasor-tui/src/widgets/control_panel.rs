//! Control panel widget
//!
//! Three sections side by side: system control, modulation strategy and
//! machine parameters. [`panel_items`] is the single source of item
//! placement, shared by rendering and mouse hit-testing.

use crate::theme::Theme;
use phasor_engine::{ControlAction, ControlPanelModel, ControlSpec, SliderId, SliderSpec, Translate};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Widget},
};

const SECTION_KEYS: [&str; 3] = ["section.system", "section.modulation", "section.machine"];

/// How a control is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Button,
    Radio,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelHit {
    Control(ItemKind, ControlSpec),
    /// Label row followed by the track row
    Slider(SliderSpec),
}

/// One placed, clickable control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelItem {
    pub area: Rect,
    pub hit: PanelHit,
}

impl PanelItem {
    pub fn tooltip_key(&self) -> &'static str {
        match self.hit {
            PanelHit::Control(_, spec) => spec.tooltip_key,
            PanelHit::Slider(spec) => spec.tooltip_key,
        }
    }

    /// Slider track row
    fn track(&self) -> Rect {
        Rect {
            y: self.area.bottom().saturating_sub(1),
            height: self.area.height.min(1),
            ..self.area
        }
    }

    /// Action for a press or drag at `column`.
    ///
    /// Columns left or right of a slider track clamp to its ends. Disabled
    /// controls and read-only sliders produce nothing.
    pub fn action_at(&self, column: u16) -> Option<ControlAction> {
        match self.hit {
            PanelHit::Control(_, spec) => spec.enabled.then_some(spec.action),
            PanelHit::Slider(spec) => {
                let track = self.track();
                let fraction = if track.width <= 1 {
                    0.0
                } else {
                    column.saturating_sub(track.x) as f64 / (track.width - 1) as f64
                };
                spec.action(spec.value_at(fraction))
            }
        }
    }

    pub fn slider_id(&self) -> Option<SliderId> {
        match self.hit {
            PanelHit::Slider(spec) => Some(spec.id),
            PanelHit::Control(..) => None,
        }
    }
}

/// Find the item under a cell
pub fn item_at(items: &[PanelItem], column: u16, row: u16) -> Option<&PanelItem> {
    items.iter().find(|item| {
        column >= item.area.x
            && column < item.area.right()
            && row >= item.area.y
            && row < item.area.bottom()
    })
}

/// Section rectangles inside the panel's inner area
pub fn panel_sections(inner: Rect) -> [Rect; 3] {
    let chunks = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(inner);
    [chunks[0], chunks[1], chunks[2]]
}

fn halves(row: Rect) -> (Rect, Rect) {
    let left = row.width / 2;
    (
        Rect { width: left, ..row },
        Rect {
            x: row.x + left,
            width: row.width - left,
            ..row
        },
    )
}

fn row_of(section: Rect, offset: u16, height: u16) -> Option<Rect> {
    // the first row of every section holds its title
    let y = section.y + 1 + offset;
    (y + height <= section.bottom()).then_some(Rect {
        x: section.x + 1,
        y,
        width: section.width.saturating_sub(2),
        height,
    })
}

/// Place every control of `model` inside `inner`. Items that do not fit are left out.
pub fn panel_items(inner: Rect, model: &ControlPanelModel) -> Vec<PanelItem> {
    let [system, modulation, machine] = panel_sections(inner);
    let mut items = Vec::new();
    let mut push = |area: Option<Rect>, hit: PanelHit| {
        if let Some(area) = area.filter(|a| a.width > 0) {
            items.push(PanelItem { area, hit });
        }
    };

    for (offset, (pair, kind)) in [(&model.run, ItemKind::Button), (&model.phases, ItemKind::Radio)]
        .into_iter()
        .enumerate()
    {
        if let Some(row) = row_of(system, offset as u16, 1) {
            let (left, right) = halves(row);
            push(Some(left), PanelHit::Control(kind, pair[0]));
            push(Some(right), PanelHit::Control(kind, pair[1]));
        }
    }
    for (i, toggle) in model.toggles.iter().enumerate() {
        push(row_of(system, 2 + i as u16, 1), PanelHit::Control(ItemKind::Check, *toggle));
    }

    for (i, method) in model.methods.iter().enumerate() {
        push(row_of(modulation, i as u16, 1), PanelHit::Control(ItemKind::Radio, *method));
    }
    if let Some(row) = row_of(modulation, model.methods.len() as u16, 1) {
        let (left, right) = halves(row);
        push(Some(left), PanelHit::Control(ItemKind::Radio, model.alignment[0]));
        push(Some(right), PanelHit::Control(ItemKind::Radio, model.alignment[1]));
    }

    for (i, slider) in model.sliders.iter().enumerate() {
        push(row_of(machine, 2 * i as u16, 2), PanelHit::Slider(*slider));
    }
    push(
        row_of(machine, 2 * model.sliders.len() as u16, 1),
        PanelHit::Control(ItemKind::Check, model.step_mode),
    );

    items
}

/// Widget for the control panel
pub struct ControlPanelWidget<'a> {
    model: &'a ControlPanelModel,
    labels: &'a dyn Translate,
    theme: &'a Theme,
    /// Tooltip key of the hovered item
    hovered: Option<&'static str>,
}

impl<'a> ControlPanelWidget<'a> {
    pub fn new(model: &'a ControlPanelModel, labels: &'a dyn Translate, theme: &'a Theme) -> Self {
        Self {
            model,
            labels,
            theme,
            hovered: None,
        }
    }

    pub fn hovered(mut self, tooltip_key: Option<&'static str>) -> Self {
        self.hovered = tooltip_key;
        self
    }

    fn render_control(&self, area: Rect, kind: ItemKind, spec: &ControlSpec, buf: &mut Buffer) {
        let label = self.labels.translate(spec.label_key);
        let (text, style) = match kind {
            ItemKind::Button => {
                let style = if spec.enabled {
                    self.theme.highlight()
                } else {
                    self.theme.dim()
                };
                (format!("[ {} ]", label), style)
            }
            ItemKind::Radio => {
                let mark = if spec.active { '•' } else { ' ' };
                let style = if spec.active {
                    self.theme.title()
                } else {
                    self.theme.normal()
                };
                (format!("({}) {}", mark, label), style)
            }
            ItemKind::Check => {
                let mark = if spec.active { 'x' } else { ' ' };
                (format!("[{}] {}", mark, label), self.theme.indicator(spec.active))
            }
        };
        let style = if self.hovered == Some(spec.tooltip_key) {
            style.patch(self.theme.border_active())
        } else {
            style
        };
        buf.set_stringn(area.x, area.y, text, area.width as usize, style);
    }

    fn render_slider(&self, area: Rect, spec: &SliderSpec, buf: &mut Buffer) {
        let label_style = if spec.read_only {
            self.theme.dim()
        } else {
            self.theme.normal()
        };
        let label = self.labels.translate(spec.label_key);
        buf.set_stringn(area.x, area.y, label.as_ref(), area.width as usize, label_style);

        let value = format!("{:.0}", spec.value);
        let value_x = area.right().saturating_sub(value.chars().count() as u16);
        if value_x > area.x {
            buf.set_stringn(value_x, area.y, &value, area.width as usize, self.theme.title());
        }

        if area.height < 2 || area.width < 2 {
            return;
        }
        let y = area.y + 1;
        let knob = area.x + (spec.fraction() * (area.width - 1) as f64).round() as u16;
        let track_style = if spec.read_only {
            self.theme.dim()
        } else {
            self.theme.border()
        };
        for x in area.left()..area.right() {
            let (ch, style) = if x == knob {
                ('●', label_style.patch(self.theme.title()))
            } else if x < knob {
                ('━', self.theme.indicator(!spec.read_only))
            } else {
                ('─', track_style)
            };
            buf[(x, y)].set_char(ch).set_style(style);
        }
    }
}

impl Widget for ControlPanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = self.labels.translate("panel.controls");
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(format!(" {} ", title), self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 12 || inner.height < 2 {
            return;
        }

        for y in inner.top()..inner.bottom() {
            for x in inner.left()..inner.right() {
                buf[(x, y)].set_char(' ').set_style(self.theme.normal());
            }
        }

        for (section, key) in panel_sections(inner).iter().zip(SECTION_KEYS) {
            let heading = self.labels.translate(key);
            buf.set_stringn(
                section.x + 1,
                section.y,
                heading.to_uppercase(),
                section.width.saturating_sub(2) as usize,
                self.theme.dim(),
            );
        }

        for item in panel_items(inner, self.model) {
            match item.hit {
                PanelHit::Control(kind, spec) => self.render_control(item.area, kind, &spec, buf),
                PanelHit::Slider(spec) => self.render_slider(item.area, &spec, buf),
            }
        }
    }
}
