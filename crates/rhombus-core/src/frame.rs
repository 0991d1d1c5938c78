//! Frame geometry.
//!
//! Every calculation here is pure: frame-local hit-testing for resize
//! bands and titlebar glyphs, the eight resize formulas, drag clamping and
//! release-time edge snapping. Coordinates passed in are frame-local
//! unless stated otherwise.

use crate::client::TitleButton;
use crate::config::Metrics;
use crate::state::{Geometry, Point};

/// Resize edge or corner of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeEdge {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResizeEdges: u8 {
        const TOP    = 0b0001;
        const BOTTOM = 0b0010;
        const LEFT   = 0b0100;
        const RIGHT  = 0b1000;
    }
}

impl ResizeEdge {
    pub const ALL: [Self; 8] = [
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Convert to `ResizeEdges` bitflags.
    pub const fn to_edges(self) -> ResizeEdges {
        match self {
            Self::Top => ResizeEdges::TOP,
            Self::Bottom => ResizeEdges::BOTTOM,
            Self::Left => ResizeEdges::LEFT,
            Self::Right => ResizeEdges::RIGHT,
            Self::TopLeft => ResizeEdges::TOP.union(ResizeEdges::LEFT),
            Self::TopRight => ResizeEdges::TOP.union(ResizeEdges::RIGHT),
            Self::BottomLeft => ResizeEdges::BOTTOM.union(ResizeEdges::LEFT),
            Self::BottomRight => ResizeEdges::BOTTOM.union(ResizeEdges::RIGHT),
        }
    }

    /// The edge found at the mirrored position.
    pub const fn mirrored(self, horizontal: bool, vertical: bool) -> Self {
        let edges = self.to_edges();
        let left = edges.contains(ResizeEdges::LEFT);
        let right = edges.contains(ResizeEdges::RIGHT);
        let top = edges.contains(ResizeEdges::TOP);
        let bottom = edges.contains(ResizeEdges::BOTTOM);
        let (left, right) = if horizontal { (right, left) } else { (left, right) };
        let (top, bottom) = if vertical { (bottom, top) } else { (top, bottom) };
        match (left, right, top, bottom) {
            (true, _, true, _) => Self::TopLeft,
            (_, true, true, _) => Self::TopRight,
            (true, _, _, true) => Self::BottomLeft,
            (_, true, _, true) => Self::BottomRight,
            (true, ..) => Self::Left,
            (_, true, ..) => Self::Right,
            (_, _, true, _) => Self::Top,
            _ => Self::Bottom,
        }
    }

    pub const fn cursor(self) -> CursorShape {
        match self {
            Self::Left | Self::Right => CursorShape::ResizeHorizontal,
            Self::Top | Self::Bottom => CursorShape::ResizeVertical,
            Self::TopLeft | Self::BottomRight => CursorShape::ResizeMainDiagonal,
            Self::TopRight | Self::BottomLeft => CursorShape::ResizeAntiDiagonal,
        }
    }
}

/// Pointer shapes the manager installs on frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorShape {
    Normal,
    Move,
    ResizeHorizontal,
    ResizeVertical,
    /// Top-left to bottom-right.
    ResizeMainDiagonal,
    /// Top-right to bottom-left.
    ResizeAntiDiagonal,
}

impl Metrics {
    /// Offset of the application window inside its frame.
    pub const fn inner_offset(&self) -> Point {
        Point::new(
            self.frame_border as i32,
            (self.titlebar_height + self.frame_border) as i32,
        )
    }

    /// Frame geometry wrapping an application window of the given geometry.
    pub const fn frame_for(&self, inner: Geometry) -> Geometry {
        Geometry::new(
            inner.x,
            inner.y,
            inner.width + 2 * self.frame_border,
            inner.height + self.titlebar_height + 2 * self.frame_border,
        )
    }

    /// Size of the application window inside a frame of the given size.
    pub const fn inner_size(&self, frame_width: u32, frame_height: u32) -> (u32, u32) {
        let w = frame_width.saturating_sub(2 * self.frame_border);
        let h = frame_height.saturating_sub(self.titlebar_height + 2 * self.frame_border);
        (if w == 0 { 1 } else { w }, if h == 0 { 1 } else { h })
    }

    /// Classify a frame-local point. Corners win over edges.
    pub fn resize_edge_at(&self, width: u32, height: u32, p: Point) -> Option<ResizeEdge> {
        let band = self.resize_handle as i32;
        let left = p.x < band;
        let right = p.x >= width as i32 - band;
        let top = p.y < band;
        let bottom = p.y >= height as i32 - band;

        match (left, right, top, bottom) {
            (true, _, true, _) => Some(ResizeEdge::TopLeft),
            (_, true, true, _) => Some(ResizeEdge::TopRight),
            (true, _, _, true) => Some(ResizeEdge::BottomLeft),
            (_, true, _, true) => Some(ResizeEdge::BottomRight),
            (true, ..) => Some(ResizeEdge::Left),
            (_, true, ..) => Some(ResizeEdge::Right),
            (_, _, true, _) => Some(ResizeEdge::Top),
            (.., true) => Some(ResizeEdge::Bottom),
            _ => None,
        }
    }

    pub const fn in_titlebar(&self, p: Point) -> bool {
        p.y >= 0 && p.y <= self.titlebar_height as i32
    }

    /// Frame-local square occupied by a titlebar glyph.
    pub const fn title_button_rect(&self, button: TitleButton) -> Geometry {
        let index = match button {
            TitleButton::Close => 0,
            TitleButton::Minimize => 1,
            TitleButton::Maximize => 2,
        };
        let x = self.button_margin + index * (self.button_size + self.button_spacing);
        let y = self.titlebar_height.saturating_sub(self.button_size) / 2;
        Geometry::new(x as i32, y as i32, self.button_size, self.button_size)
    }

    /// Titlebar glyph under a frame-local point; bounds are inclusive.
    pub fn title_button_at(&self, p: Point) -> Option<TitleButton> {
        TitleButton::ALL.into_iter().find(|&b| {
            let r = self.title_button_rect(b);
            p.x >= r.x && p.x <= r.right() && p.y >= r.y && p.y <= r.bottom()
        })
    }

    /// Frame geometry after dragging `edge` by `(dx, dy)` from `start`.
    ///
    /// Sizes never drop below the configured minimum; when they clamp, the
    /// edge opposite the dragged one stays exactly where it was.
    pub fn resize(&self, edge: ResizeEdge, start: Geometry, dx: i32, dy: i32) -> Geometry {
        let edges = edge.to_edges();
        let min_w = self.min_width as i32;
        let min_h = self.min_height as i32;
        let (sw, sh) = (start.width as i32, start.height as i32);
        let mut g = start;

        if edges.contains(ResizeEdges::LEFT) {
            let w = (sw - dx).max(min_w);
            g.x = start.x + sw - w;
            g.width = w as u32;
        }
        if edges.contains(ResizeEdges::RIGHT) {
            g.width = (sw + dx).max(min_w) as u32;
        }
        if edges.contains(ResizeEdges::TOP) {
            let h = (sh - dy).max(min_h);
            g.y = start.y + sh - h;
            g.height = h as u32;
        }
        if edges.contains(ResizeEdges::BOTTOM) {
            g.height = (sh + dy).max(min_h) as u32;
        }
        g
    }

    /// Keep a dragged frame inside `usable` (the screen above the panel).
    pub fn clamp_drag(&self, frame: Geometry, usable: Geometry) -> Point {
        let max_x = (usable.right() - frame.width as i32).max(usable.x);
        let max_y = (usable.bottom() - frame.height as i32).max(usable.y);
        Point::new(frame.x.clamp(usable.x, max_x), frame.y.clamp(usable.y, max_y))
    }

    /// Magnetic edges applied when a drag ends.
    pub fn snap(&self, frame: Geometry, usable: Geometry) -> Point {
        let t = self.snap_threshold as i32;
        let mut p = Point::new(frame.x, frame.y);
        if p.x - usable.x < t {
            p.x = usable.x;
        }
        if p.y - usable.y < t {
            p.y = usable.y;
        }
        if usable.right() - (p.x + frame.width as i32) < t {
            p.x = usable.right() - frame.width as i32;
        }
        if usable.bottom() - (p.y + frame.height as i32) < t {
            p.y = usable.bottom() - frame.height as i32;
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn m() -> Metrics {
        Metrics::default()
    }

    #[test]
    fn test_frame_wraps_inner() {
        let frame = m().frame_for(Geometry::new(100, 100, 600, 400));
        assert_eq!(frame, Geometry::new(100, 100, 610, 440));
        assert_eq!(m().inner_size(frame.width, frame.height), (600, 400));
        assert_eq!(m().inner_offset(), Point::new(5, 35));
    }

    #[test]
    fn test_corners_beat_edges() {
        let metrics = m();
        assert_eq!(metrics.resize_edge_at(300, 200, Point::new(0, 0)), Some(ResizeEdge::TopLeft));
        assert_eq!(
            metrics.resize_edge_at(300, 200, Point::new(299, 199)),
            Some(ResizeEdge::BottomRight)
        );
        assert_eq!(metrics.resize_edge_at(300, 200, Point::new(292, 3)), Some(ResizeEdge::TopRight));
        assert_eq!(metrics.resize_edge_at(300, 200, Point::new(3, 195)), Some(ResizeEdge::BottomLeft));
        assert_eq!(metrics.resize_edge_at(300, 200, Point::new(3, 100)), Some(ResizeEdge::Left));
        assert_eq!(metrics.resize_edge_at(300, 200, Point::new(150, 100)), None);
    }

    #[test]
    fn test_title_buttons() {
        let metrics = m();
        assert_eq!(metrics.title_button_at(Point::new(15, 9)), Some(TitleButton::Close));
        assert_eq!(metrics.title_button_at(Point::new(27, 21)), Some(TitleButton::Close));
        assert_eq!(metrics.title_button_at(Point::new(32, 15)), Some(TitleButton::Minimize));
        assert_eq!(metrics.title_button_at(Point::new(49, 15)), Some(TitleButton::Maximize));
        assert_eq!(metrics.title_button_at(Point::new(30, 15)), None);
        assert_eq!(metrics.title_button_at(Point::new(100, 15)), None);
    }

    #[test]
    fn test_resize_scenarios() {
        let start = Geometry::new(200, 150, 300, 200);
        assert_eq!(
            m().resize(ResizeEdge::BottomRight, start, 50, 30),
            Geometry::new(200, 150, 350, 230)
        );
        assert_eq!(
            m().resize(ResizeEdge::TopLeft, start, 50, 30),
            Geometry::new(250, 180, 250, 170)
        );
    }

    #[test]
    fn test_resize_minimum_keeps_opposite_edge() {
        let start = Geometry::new(200, 150, 300, 200);
        let g = m().resize(ResizeEdge::TopLeft, start, 1000, 1000);
        assert_eq!((g.width, g.height), (100, 80));
        assert_eq!(g.right(), start.right());
        assert_eq!(g.bottom(), start.bottom());
    }

    #[test]
    fn test_cursor_orientation() {
        assert_eq!(ResizeEdge::Left.cursor(), CursorShape::ResizeHorizontal);
        assert_eq!(ResizeEdge::Bottom.cursor(), CursorShape::ResizeVertical);
        assert_eq!(ResizeEdge::BottomRight.cursor(), CursorShape::ResizeMainDiagonal);
        assert_eq!(ResizeEdge::BottomLeft.cursor(), CursorShape::ResizeAntiDiagonal);
    }

    #[test]
    fn test_snap_and_clamp() {
        let usable = Geometry::new(0, 0, 1920, 1030);
        let metrics = m();
        assert_eq!(
            metrics.snap(Geometry::new(12, 15, 400, 300), usable),
            Point::new(0, 0)
        );
        assert_eq!(
            metrics.snap(Geometry::new(1510, 720, 400, 300), usable),
            Point::new(1520, 730)
        );
        assert_eq!(
            metrics.snap(Geometry::new(500, 300, 400, 300), usable),
            Point::new(500, 300)
        );
        assert_eq!(
            metrics.clamp_drag(Geometry::new(-40, 900, 400, 300), usable),
            Point::new(0, 730)
        );
        assert_eq!(
            metrics.clamp_drag(Geometry::new(50, 50, 2400, 300), usable),
            Point::new(0, 50)
        );
    }

    #[test]
    fn test_mirrored_edges() {
        assert_eq!(ResizeEdge::TopLeft.mirrored(true, false), ResizeEdge::TopRight);
        assert_eq!(ResizeEdge::TopLeft.mirrored(true, true), ResizeEdge::BottomRight);
        assert_eq!(ResizeEdge::Left.mirrored(false, true), ResizeEdge::Left);
        assert_eq!(ResizeEdge::Bottom.mirrored(false, true), ResizeEdge::Top);
    }
}
