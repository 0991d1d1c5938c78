//! Geometry primitives, the interaction mode and focus tracking.

use crate::client::ClientId;
use crate::frame::ResizeEdge;

/// Geometry of a rectangular region in absolute screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment test: the right and bottom edges are outside.
    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x
            && x < self.x + self.width as i32
            && y >= self.y
            && y < self.y + self.height as i32
    }

    pub const fn right(self) -> i32 {
        self.x + self.width as i32
    }

    pub const fn bottom(self) -> i32 {
        self.y + self.height as i32
    }

    /// Translate a root-relative point into this rectangle's local space.
    pub const fn local(self, point: Point) -> Point {
        Point::new(point.x - self.x, point.y - self.y)
    }

    /// Whether any part of this rectangle overlaps a `width`×`height` screen.
    pub const fn is_on_screen(self, width: u32, height: u32) -> bool {
        self.x < width as i32 && self.y < height as i32 && self.right() > 0 && self.bottom() > 0
    }
}

/// A pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// The mutually exclusive interaction modes.
///
/// Popup visibility is tracked separately by [`crate::popup::Popups`];
/// a popup may be shown while the mode is `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    PanelDragging {
        origin: Point,
    },
    WindowDragging {
        client: ClientId,
        origin: Point,
        /// Pointer position relative to the frame origin at press time.
        offset: Point,
        /// Last observed pointer position; motion deltas are incremental.
        last: Point,
    },
    WindowResizing {
        client: ClientId,
        edge: ResizeEdge,
        origin: Point,
        start: Geometry,
    },
    /// Full-screen lock; every key or button press unlocks.
    Locked,
}

impl Mode {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The client a drag or resize gesture operates on.
    pub const fn target(&self) -> Option<ClientId> {
        match *self {
            Self::WindowDragging { client, .. } | Self::WindowResizing { client, .. } => {
                Some(client)
            },
            _ => None,
        }
    }
}

/// Focus tracking.
#[derive(Debug, Clone, Default)]
pub struct FocusState {
    pub focused: Option<ClientId>,
}

impl FocusState {
    pub fn set_focused(&mut self, id: ClientId) {
        self.focused = Some(id);
    }

    pub fn clear_focused(&mut self) {
        self.focused = None;
    }

    /// Forget a client that left the registry.
    pub fn forget(&mut self, id: ClientId) {
        if self.focused == Some(id) {
            self.focused = None;
        }
    }
}
