//! Drawing surfaces and the 2D visualizations
//!
//! Renderers draw in a fixed 512x512 logical space with y pointing down.
//! A [`Viewport`] maps that space uniformly onto whatever the host can show.

mod hexagon;
mod pwm;
mod time_graph;

pub use hexagon::{hex_boundary, HexagonRenderer, SwitchingDecomposition, HEX_RADIUS};
pub use pwm::{pulse_path, PwmRenderer};
pub use time_graph::{TimeGraphRenderer, TimeGraphSurfaces};

/// Side length of the square logical canvas
pub const LOGICAL_SIZE: f64 = 512.0;
/// Reference length that arrow magnitudes (0-100) are scaled against
pub const GRAPH_LIMIT: f64 = LOGICAL_SIZE * 0.45;
/// Arrowhead edge length
pub const ARROW_HEAD: f64 = 12.0;
/// Arrows shorter than this are drawn without a head
const MIN_ARROW_LENGTH: f64 = GRAPH_LIMIT * 0.001;

/// Opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 128, 0);
    /// Hexagon outline
    pub const HEX_PURPLE: Rgb = Rgb(0x4c, 0x1d, 0x95);
    /// Switching-state vectors
    pub const LAVENDER: Rgb = Rgb(0xa7, 0x8b, 0xfa);
    /// Realized command vector
    pub const PALE_GRAY: Rgb = Rgb(0xe5, 0xe7, 0xeb);
    pub const GRAY: Rgb = Rgb(128, 128, 128);

    /// Blend towards black by `alpha` (panels have black backgrounds)
    pub fn over_black(self, alpha: f64) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |c: u8| (c as f64 * a).round() as u8;
        Rgb(mix(self.0), mix(self.1), mix(self.2))
    }
}

/// Per-phase colours shared by every view
pub const PHASE_COLORS: [Rgb; 3] = [Rgb::YELLOW, Rgb::RED, Rgb::GREEN];

/// Point in logical canvas space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `length` from `self` along `angle_deg` (counter-clockwise, y down)
    pub fn polar(self, length: f64, angle_deg: f64) -> Point {
        let rad = angle_deg.to_radians();
        Point::new(self.x + length * rad.cos(), self.y - length * rad.sin())
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Line style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    /// Opacity 0-1
    pub alpha: f64,
    /// Line width in logical units
    pub width: f64,
    /// `[on, off]` dash lengths
    pub dash: Option<[f64; 2]>,
}

impl Stroke {
    pub const fn solid(color: Rgb, width: f64) -> Self {
        Self {
            color,
            alpha: 1.0,
            width,
            dash: None,
        }
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn dashed(mut self, on: f64, off: f64) -> Self {
        self.dash = Some([on, off]);
        self
    }

    /// Colour as it appears over the black panel background
    pub fn visible_color(&self) -> Rgb {
        self.color.over_black(self.alpha)
    }
}

/// Something the renderers can draw on.
///
/// A renderer handed no surface for a panel simply skips that panel.
pub trait Surface {
    /// Erase everything back to the black background
    fn clear(&mut self);

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke);

    fn polyline(&mut self, points: &[Point], stroke: &Stroke) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], stroke);
        }
    }
}

/// Recorded drawing primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub from: Point,
    pub to: Point,
    pub stroke: Stroke,
}

/// Retained-mode surface that records primitives for later replay
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    primitives: Vec<Primitive>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl Surface for DisplayList {
    fn clear(&mut self) {
        self.primitives.clear();
    }

    fn line(&mut self, from: Point, to: Point, stroke: &Stroke) {
        self.primitives.push(Primitive {
            from,
            to,
            stroke: *stroke,
        });
    }
}

/// Uniform scale-and-centre mapping from logical to physical space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Viewport {
    /// Fit a square logical canvas into `width` x `height`, preserving aspect
    pub fn fit(logical: f64, width: f64, height: f64) -> Self {
        let scale = if logical > 0.0 {
            (width.min(height) / logical).max(0.0)
        } else {
            0.0
        };
        Self {
            scale,
            offset_x: (width - logical * scale) / 2.0,
            offset_y: (height - logical * scale) / 2.0,
        }
    }

    pub fn to_physical(&self, p: Point) -> Point {
        Point::new(self.offset_x + p.x * self.scale, self.offset_y + p.y * self.scale)
    }

    /// Inverse mapping; `None` for a degenerate viewport
    pub fn to_logical(&self, p: Point) -> Option<Point> {
        if self.scale <= 0.0 {
            return None;
        }
        Some(Point::new(
            (p.x - self.offset_x) / self.scale,
            (p.y - self.offset_y) / self.scale,
        ))
    }
}

/// Split a dashed segment into its solid pieces
pub fn dash_segments(from: Point, to: Point, pattern: [f64; 2]) -> Vec<(Point, Point)> {
    let [on, off] = pattern;
    let length = from.distance(to);
    if on <= 0.0 || length <= 0.0 {
        return vec![(from, to)];
    }
    let (ux, uy) = ((to.x - from.x) / length, (to.y - from.y) / length);
    let at = |d: f64| Point::new(from.x + ux * d, from.y + uy * d);

    let mut pieces = Vec::new();
    let mut start = 0.0;
    while start < length {
        let end = (start + on).min(length);
        pieces.push((at(start), at(end)));
        start = end + off.max(0.0);
    }
    pieces
}

/// Draw an arrow of `length` from `origin` along `angle_deg` with an open head
pub fn draw_arrow(surface: &mut dyn Surface, origin: Point, length: f64, angle_deg: f64, stroke: &Stroke) {
    let end = origin.polar(length, angle_deg);
    surface.line(origin, end, stroke);
    if length.abs() > MIN_ARROW_LENGTH {
        let heading = (end.y - origin.y).atan2(end.x - origin.x);
        for wing in [-std::f64::consts::FRAC_PI_6, std::f64::consts::FRAC_PI_6] {
            let tip = Point::new(
                end.x - ARROW_HEAD * (heading + wing).cos(),
                end.y - ARROW_HEAD * (heading + wing).sin(),
            );
            surface.line(end, tip, stroke);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_fit_landscape() {
        let vp = Viewport::fit(512.0, 200.0, 100.0);
        assert!((vp.scale - 100.0 / 512.0).abs() < 1e-12);
        assert!((vp.offset_x - 50.0).abs() < 1e-9);
        assert_eq!(vp.offset_y, 0.0);
        let corner = vp.to_physical(Point::new(512.0, 512.0));
        assert!((corner.x - 150.0).abs() < 1e-9);
        assert!((corner.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_roundtrip() {
        let vp = Viewport::fit(512.0, 300.0, 700.0);
        let p = Point::new(123.0, 456.0);
        let back = vp.to_logical(vp.to_physical(p)).unwrap();
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_viewport() {
        let vp = Viewport::fit(512.0, 0.0, 40.0);
        assert_eq!(vp.scale, 0.0);
        assert!(vp.to_logical(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_polar_is_y_down() {
        let p = Point::new(10.0, 10.0).polar(5.0, 90.0);
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_dash_segments_cover_pattern() {
        let pieces = dash_segments(Point::new(0.0, 0.0), Point::new(20.0, 0.0), [4.0, 6.0]);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].1.x, 4.0);
        assert_eq!(pieces[1].0.x, 10.0);
        assert_eq!(pieces[1].1.x, 14.0);
    }

    #[test]
    fn test_arrow_has_head() {
        let mut list = DisplayList::new();
        draw_arrow(&mut list, Point::new(0.0, 0.0), 50.0, 0.0, &Stroke::solid(Rgb::WHITE, 4.0));
        assert_eq!(list.len(), 3);
        let mut tiny = DisplayList::new();
        draw_arrow(&mut tiny, Point::new(0.0, 0.0), 0.0, 0.0, &Stroke::solid(Rgb::WHITE, 4.0));
        assert_eq!(tiny.len(), 1);
    }

    #[test]
    fn test_display_list_records_and_clears() {
        let mut list = DisplayList::new();
        list.line(Point::default(), Point::new(1.0, 1.0), &Stroke::solid(Rgb::RED, 1.0));
        assert_eq!(list.len(), 1);
        assert_eq!(list.primitives()[0].to, Point::new(1.0, 1.0));
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_alpha_over_black() {
        assert_eq!(Rgb(200, 100, 0).over_black(0.5), Rgb(100, 50, 0));
        assert_eq!(Rgb::WHITE.over_black(0.0), Rgb::BLACK);
    }
}
