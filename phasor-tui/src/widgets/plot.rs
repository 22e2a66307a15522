//! Braille plot widget - rasterizes engine display lists into terminal cells
//!
//! Each cell holds a 2x4 braille dot matrix, so a plot of `w` x `h` cells is
//! a `2w` x `4h` dot canvas with square dots. The 512x512 logical canvas is
//! fitted into it with the engine's viewport mapping.

use crate::theme::Theme;
use phasor_engine::render::dash_segments;
use phasor_engine::{DisplayList, Point, Rgb, Viewport, LOGICAL_SIZE};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::Span,
    widgets::{Block, Borders, Widget},
};

const BRAILLE_BASE: u32 = 0x2800;

/// Bit for dot (column, row) inside one braille cell
const DOT_BITS: [[u8; 4]; 2] = [[0x01, 0x02, 0x04, 0x40], [0x08, 0x10, 0x20, 0x80]];

/// Strokes dimmer than this (r+g+b) would be invisible on the plot background
const MIN_BRIGHTNESS: u16 = 24;

/// Longest line we will walk, in dots
const MAX_LINE_STEPS: f64 = 4096.0;

#[derive(Debug, Clone, Copy, Default)]
struct BrailleCell {
    bits: u8,
    color: Option<Rgb>,
}

fn brightness(color: Rgb) -> u16 {
    color.0 as u16 + color.1 as u16 + color.2 as u16
}

/// Dot canvas backing one plot panel
#[derive(Debug, Clone)]
pub struct BrailleGrid {
    cols: u16,
    rows: u16,
    cells: Vec<BrailleCell>,
}

impl BrailleGrid {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            cells: vec![BrailleCell::default(); cols as usize * rows as usize],
        }
    }

    pub fn dot_width(&self) -> f64 {
        self.cols as f64 * 2.0
    }

    pub fn dot_height(&self) -> f64 {
        self.rows as f64 * 4.0
    }

    /// Light one dot; a cell takes the colour of its brightest stroke
    pub fn set_dot(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.cols as i64 * 2 || y >= self.rows as i64 * 4 {
            return;
        }
        let index = (y / 4) as usize * self.cols as usize + (x / 2) as usize;
        let cell = &mut self.cells[index];
        cell.bits |= DOT_BITS[(x % 2) as usize][(y % 4) as usize];
        match cell.color {
            Some(current) if brightness(current) >= brightness(color) => {}
            _ => cell.color = Some(color),
        }
    }

    /// Walk a line in dot space
    pub fn line(&mut self, from: Point, to: Point, color: Rgb) {
        if ![from.x, from.y, to.x, to.y].iter().all(|v| v.is_finite()) {
            return;
        }
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let steps = dx.abs().max(dy.abs()).ceil().clamp(1.0, MAX_LINE_STEPS);
        let count = steps as i64;
        for i in 0..=count {
            let t = i as f64 / steps;
            let x = (from.x + dx * t).floor() as i64;
            let y = (from.y + dy * t).floor() as i64;
            self.set_dot(x, y, color);
        }
    }

    /// Rasterize every primitive of a display list
    pub fn draw(&mut self, list: &DisplayList, viewport: &Viewport) {
        for primitive in list.primitives() {
            let color = primitive.stroke.visible_color();
            if brightness(color) < MIN_BRIGHTNESS {
                continue;
            }
            match primitive.stroke.dash {
                Some(pattern) => {
                    for (from, to) in dash_segments(primitive.from, primitive.to, pattern) {
                        self.line(viewport.to_physical(from), viewport.to_physical(to), color);
                    }
                }
                None => self.line(
                    viewport.to_physical(primitive.from),
                    viewport.to_physical(primitive.to),
                    color,
                ),
            }
        }
    }

    /// Glyph and colour of a lit cell
    pub fn cell(&self, col: u16, row: u16) -> Option<(char, Rgb)> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let cell = self.cells[row as usize * self.cols as usize + col as usize];
        if cell.bits == 0 {
            return None;
        }
        let glyph = char::from_u32(BRAILLE_BASE + cell.bits as u32)?;
        Some((glyph, cell.color.unwrap_or(Rgb::WHITE)))
    }
}

/// Widget drawing stacked display lists inside a titled frame
pub struct PlotWidget<'a> {
    title: &'a str,
    layers: &'a [&'a DisplayList],
    theme: &'a Theme,
    active: bool,
    placeholder: Option<&'a str>,
}

impl<'a> PlotWidget<'a> {
    pub fn new(title: &'a str, layers: &'a [&'a DisplayList], theme: &'a Theme) -> Self {
        Self {
            title,
            layers,
            theme,
            active: false,
            placeholder: None,
        }
    }

    /// Highlight the border (pointer interaction in progress)
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Text shown when every layer is empty
    pub fn placeholder(mut self, text: &'a str) -> Self {
        self.placeholder = Some(text);
        self
    }
}

impl Widget for PlotWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.active {
            self.theme.border_active()
        } else {
            self.theme.border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(format!(" {} ", self.title), self.theme.title()));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width < 2 || inner.height < 2 {
            return;
        }

        for y in inner.top()..inner.bottom() {
            for x in inner.left()..inner.right() {
                buf[(x, y)].set_char(' ').set_style(self.theme.normal());
            }
        }

        if self.layers.iter().all(|layer| layer.is_empty()) {
            if let Some(text) = self.placeholder {
                let y = inner.y + inner.height / 2;
                let x = inner.x + inner.width.saturating_sub(text.chars().count() as u16) / 2;
                buf.set_stringn(x, y, text, inner.width as usize, self.theme.dim());
            }
            return;
        }

        let mut grid = BrailleGrid::new(inner.width, inner.height);
        let viewport = Viewport::fit(LOGICAL_SIZE, grid.dot_width(), grid.dot_height());
        for layer in self.layers {
            grid.draw(layer, &viewport);
        }

        for row in 0..inner.height {
            for col in 0..inner.width {
                if let Some((glyph, color)) = grid.cell(col, row) {
                    buf[(inner.x + col, inner.y + row)]
                        .set_char(glyph)
                        .set_style(Style::default().fg(Color::Rgb(color.0, color.1, color.2)).bg(self.theme.bg));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phasor_engine::{Stroke, Surface};

    #[test]
    fn test_set_dot_bits() {
        let mut grid = BrailleGrid::new(2, 1);
        grid.set_dot(0, 0, Rgb::WHITE);
        grid.set_dot(1, 3, Rgb::WHITE);
        let (glyph, _) = grid.cell(0, 0).expect("lit cell");
        assert_eq!(glyph as u32, BRAILLE_BASE + 0x01 + 0x80);
        assert!(grid.cell(1, 0).is_none());

        // out of range is ignored
        grid.set_dot(-1, 0, Rgb::WHITE);
        grid.set_dot(4, 0, Rgb::WHITE);
        assert!(grid.cell(1, 0).is_none());
    }

    #[test]
    fn test_brightest_stroke_wins() {
        let mut grid = BrailleGrid::new(1, 1);
        grid.set_dot(0, 0, Rgb::GREEN);
        grid.set_dot(1, 1, Rgb::YELLOW);
        grid.set_dot(0, 2, Rgb::RED);
        assert_eq!(grid.cell(0, 0).map(|(_, c)| c), Some(Rgb::YELLOW));
    }

    #[test]
    fn test_line_covers_both_ends() {
        let mut grid = BrailleGrid::new(4, 1);
        grid.line(Point::new(0.0, 0.0), Point::new(7.0, 3.0), Rgb::WHITE);
        assert!(grid.cell(0, 0).is_some());
        assert!(grid.cell(3, 0).is_some());

        let mut empty = BrailleGrid::new(4, 1);
        empty.line(Point::new(f64::NAN, 0.0), Point::new(7.0, 3.0), Rgb::WHITE);
        assert!((0..4).all(|c| empty.cell(c, 0).is_none()));
    }

    #[test]
    fn test_dim_strokes_skipped() {
        let mut list = DisplayList::new();
        list.line(
            Point::new(0.0, 256.0),
            Point::new(512.0, 256.0),
            &Stroke::solid(Rgb::GRAY, 1.0).alpha(0.02),
        );
        let mut grid = BrailleGrid::new(8, 4);
        let viewport = Viewport::fit(LOGICAL_SIZE, grid.dot_width(), grid.dot_height());
        grid.draw(&list, &viewport);
        assert!((0..8).all(|c| (0..4).all(|r| grid.cell(c, r).is_none())));
    }

    #[test]
    fn test_dashed_line_has_gaps() {
        let mut list = DisplayList::new();
        list.line(
            Point::new(0.0, 0.0),
            Point::new(512.0, 0.0),
            &Stroke::solid(Rgb::WHITE, 1.0).dashed(64.0, 64.0),
        );
        let mut grid = BrailleGrid::new(16, 1);
        let viewport = Viewport::fit(LOGICAL_SIZE, grid.dot_width(), grid.dot_width());
        grid.draw(&list, &viewport);
        let lit = (0..16).filter(|&c| grid.cell(c, 0).is_some()).count();
        assert!(lit > 4 && lit < 16, "lit cells: {}", lit);
    }

    #[test]
    fn test_plot_widget_renders_layers() {
        let mut list = DisplayList::new();
        list.line(
            Point::new(0.0, 256.0),
            Point::new(512.0, 256.0),
            &Stroke::solid(Rgb::RED, 2.0),
        );
        let theme = Theme::default();
        let layers = [&list];
        let area = Rect::new(0, 0, 20, 12);
        let mut buf = Buffer::empty(area);
        PlotWidget::new("PWM", &layers, &theme).render(area, &mut buf);

        let braille = (1..19)
            .flat_map(|x| (1..11).map(move |y| (x, y)))
            .filter(|&(x, y)| {
                buf[(x, y)]
                    .symbol()
                    .chars()
                    .next()
                    .is_some_and(|c| (0x2801..=0x28ff).contains(&(c as u32)))
            })
            .count();
        assert!(braille > 0);
    }

    #[test]
    fn test_placeholder_for_empty_layers() {
        let empty = DisplayList::new();
        let theme = Theme::default();
        let layers = [&empty];
        let area = Rect::new(0, 0, 30, 5);
        let mut buf = Buffer::empty(area);
        PlotWidget::new("Time Domain", &layers, &theme)
            .placeholder("hidden")
            .render(area, &mut buf);
        let row: String = (0..30).map(|x| buf[(x, 2)].symbol().to_string()).collect();
        assert!(row.contains("hidden"));
    }
}
