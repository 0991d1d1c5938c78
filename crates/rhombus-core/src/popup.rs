//! Popup surfaces.
//!
//! The system menu, the application launcher, the per-client control menu
//! and the per-pinned-app menu share one `hidden ⇄ showing` state machine.
//! At most one popup is visible at a time and the pointer grab is held
//! exactly while one is: every transition emits the matching grab or
//! release action.

use crate::client::{ClientId, WindowHandle};
use crate::config::Metrics;
use crate::event::CoreAction;
use crate::pinned::PinnedId;
use crate::state::{Geometry, Point};

/// Gap between a popup and the panel top edge.
pub const PANEL_GAP: i32 = 5;
/// Keep the launcher this far from the screen edges.
pub const LAUNCHER_MARGIN: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupKind {
    SystemMenu,
    Launcher,
    ControlMenu,
    PinnedMenu,
}

impl PopupKind {
    pub const ALL: [Self; 4] = [
        Self::SystemMenu,
        Self::Launcher,
        Self::ControlMenu,
        Self::PinnedMenu,
    ];

    const fn index(self) -> usize {
        match self {
            Self::SystemMenu => 0,
            Self::Launcher => 1,
            Self::ControlMenu => 2,
            Self::PinnedMenu => 3,
        }
    }

    /// Menu item labels; the launcher has its own layout.
    pub const fn labels(self) -> &'static [&'static str] {
        match self {
            Self::SystemMenu => &SystemMenuItem::LABELS,
            Self::ControlMenu => &ControlMenuItem::LABELS,
            Self::PinnedMenu => &PinnedMenuItem::LABELS,
            Self::Launcher => &[],
        }
    }

    pub const fn item_count(self) -> usize {
        self.labels().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemMenuItem {
    Terminal,
    Lock,
    Logout,
    Shutdown,
}

impl SystemMenuItem {
    pub const LABELS: [&'static str; 4] = ["Terminal", "Lock", "Logout", "Shutdown"];

    pub const fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::Terminal),
            1 => Some(Self::Lock),
            2 => Some(Self::Logout),
            3 => Some(Self::Shutdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMenuItem {
    Pin,
    MaximizeRestore,
    Minimize,
    Close,
}

impl ControlMenuItem {
    pub const LABELS: [&'static str; 4] = ["Pin to Panel", "Maximize/Restore", "Minimize", "Close"];

    pub const fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::Pin),
            1 => Some(Self::MaximizeRestore),
            2 => Some(Self::Minimize),
            3 => Some(Self::Close),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinnedMenuItem {
    Unpin,
    Launch,
}

impl PinnedMenuItem {
    pub const LABELS: [&'static str; 2] = ["Unpin from Panel", "Launch"];

    pub const fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Self::Unpin),
            1 => Some(Self::Launch),
            _ => None,
        }
    }
}

/// What a control popup acts upon, captured when it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupTarget {
    Client(ClientId),
    Pinned(PinnedId),
}

#[derive(Debug, Clone)]
pub struct Popup {
    pub kind: PopupKind,
    pub handle: WindowHandle,
    pub geometry: Geometry,
    pub visible: bool,
    /// Hovered menu item.
    pub hover: Option<usize>,
    /// Opacity used while fading; 1.0 once shown.
    pub fade: f32,
    pub target: Option<PopupTarget>,
}

impl Popup {
    const fn new(kind: PopupKind, handle: WindowHandle) -> Self {
        Self {
            kind,
            handle,
            geometry: Geometry::new(0, 0, 1, 1),
            visible: false,
            hover: None,
            fade: 0.0,
            target: None,
        }
    }

    /// Menu item under a popup-local y offset, clamped to the item count.
    pub fn item_at(&self, local_y: i32, item_height: u32) -> Option<usize> {
        let count = self.kind.item_count();
        if count == 0 || local_y < 0 || item_height == 0 {
            return None;
        }
        let index = (local_y / item_height as i32) as usize;
        Some(index.min(count - 1))
    }

    pub fn set_hover(&mut self, hover: Option<usize>) -> bool {
        if self.hover == hover {
            false
        } else {
            self.hover = hover;
            true
        }
    }
}

/// Window handles allocated for the popups at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupHandles {
    pub system_menu: WindowHandle,
    pub launcher: WindowHandle,
    pub control_menu: WindowHandle,
    pub pinned_menu: WindowHandle,
}

#[derive(Debug, Clone)]
pub struct Popups {
    popups: [Popup; 4],
    grabbed: bool,
}

impl Popups {
    pub const fn new(handles: PopupHandles) -> Self {
        Self {
            popups: [
                Popup::new(PopupKind::SystemMenu, handles.system_menu),
                Popup::new(PopupKind::Launcher, handles.launcher),
                Popup::new(PopupKind::ControlMenu, handles.control_menu),
                Popup::new(PopupKind::PinnedMenu, handles.pinned_menu),
            ],
            grabbed: false,
        }
    }

    pub const fn get(&self, kind: PopupKind) -> &Popup {
        &self.popups[kind.index()]
    }

    pub fn get_mut(&mut self, kind: PopupKind) -> &mut Popup {
        &mut self.popups[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Popup> {
        self.popups.iter()
    }

    /// The currently visible popup.
    pub fn visible(&self) -> Option<PopupKind> {
        self.popups.iter().find(|p| p.visible).map(|p| p.kind)
    }

    pub fn any_visible(&self) -> bool {
        self.visible().is_some()
    }

    pub const fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    pub fn kind_for_handle(&self, handle: WindowHandle) -> Option<PopupKind> {
        self.popups
            .iter()
            .find(|p| p.handle == handle)
            .map(|p| p.kind)
    }

    /// Show `kind` at `geometry`, hiding whatever else is up first.
    pub fn show(
        &mut self,
        kind: PopupKind,
        geometry: Geometry,
        target: Option<PopupTarget>,
    ) -> Vec<CoreAction> {
        let mut actions = Vec::new();
        if let Some(current) = self.visible() {
            actions.extend(self.hide(current));
        }

        let popup = self.get_mut(kind);
        popup.geometry = geometry;
        popup.target = target;
        popup.hover = None;
        popup.visible = true;
        popup.fade = 1.0;
        let handle = popup.handle;

        actions.push(CoreAction::ShowPopup {
            kind,
            window: handle,
            geometry,
        });
        if !self.grabbed {
            self.grabbed = true;
            actions.push(CoreAction::GrabPointer);
        }
        if kind == PopupKind::Launcher {
            actions.push(CoreAction::GrabKeyboard);
        }
        actions
    }

    /// Hide `kind` if visible, releasing the grab.
    pub fn hide(&mut self, kind: PopupKind) -> Vec<CoreAction> {
        let popup = self.get_mut(kind);
        if !popup.visible {
            return Vec::new();
        }
        popup.visible = false;
        popup.target = None;
        popup.hover = None;
        popup.fade = 0.0;
        let handle = popup.handle;

        let mut actions = vec![CoreAction::HidePopup {
            kind,
            window: handle,
        }];
        if kind == PopupKind::Launcher {
            actions.push(CoreAction::UngrabKeyboard);
        }
        if self.grabbed && !self.any_visible() {
            self.grabbed = false;
            actions.push(CoreAction::UngrabPointer);
        }
        actions
    }

    /// Forget targets that point at a client that went away.
    pub fn drop_client_target(&mut self, id: ClientId) -> Vec<CoreAction> {
        let stale: Vec<_> = self
            .popups
            .iter()
            .filter(|p| p.visible && p.target == Some(PopupTarget::Client(id)))
            .map(|p| p.kind)
            .collect();
        stale.into_iter().flat_map(|kind| self.hide(kind)).collect()
    }
}

/// Geometry for a menu anchored at panel-relative `anchor_x`, just above the panel.
pub fn menu_geometry(
    kind: PopupKind,
    anchor_x: i32,
    panel: Geometry,
    metrics: &Metrics,
) -> Geometry {
    let width = metrics.menu_width;
    let height = kind.item_count() as u32 * metrics.menu_item_height;
    let max_x = (panel.right() - width as i32).max(panel.x);
    let x = (panel.x + anchor_x).clamp(panel.x, max_x);
    let y = panel.y - height as i32 - PANEL_GAP;
    Geometry::new(x, y, width, height)
}

/// Geometry for the launcher opened at a pointer position, kept on screen
/// and above the panel.
pub fn launcher_geometry(at: Point, screen: Geometry, panel: Geometry, metrics: &Metrics) -> Geometry {
    let (w, h) = (metrics.launcher_width as i32, metrics.launcher_height as i32);
    let mut x = at.x;
    let mut y = at.y;
    if x + w > screen.right() {
        x = screen.right() - w - LAUNCHER_MARGIN;
    }
    if y + h > panel.y {
        y = panel.y - h - LAUNCHER_MARGIN;
    }
    Geometry::new(x.max(screen.x), y.max(screen.y), w as u32, h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn popups() -> Popups {
        Popups::new(PopupHandles {
            system_menu: WindowHandle(1),
            launcher: WindowHandle(2),
            control_menu: WindowHandle(3),
            pinned_menu: WindowHandle(4),
        })
    }

    #[test]
    fn test_show_then_hide_pairs_grab() {
        let mut p = popups();
        let actions = p.show(PopupKind::SystemMenu, Geometry::new(0, 0, 120, 120), None);
        assert_eq!(actions.last(), Some(&CoreAction::GrabPointer));
        assert!(p.is_grabbed());
        let actions = p.hide(PopupKind::SystemMenu);
        assert_eq!(actions.last(), Some(&CoreAction::UngrabPointer));
        assert!(!p.is_grabbed());
        assert!(p.hide(PopupKind::SystemMenu).is_empty());
    }

    #[test]
    fn test_show_replaces_visible_popup() {
        let mut p = popups();
        p.show(PopupKind::Launcher, Geometry::new(0, 0, 350, 600), None);
        let actions = p.show(
            PopupKind::ControlMenu,
            Geometry::new(0, 0, 120, 120),
            Some(PopupTarget::Client(ClientId(7))),
        );
        assert_eq!(p.visible(), Some(PopupKind::ControlMenu));
        assert!(!p.get(PopupKind::Launcher).visible);
        assert_eq!(p.get(PopupKind::Launcher).target, None);
        let grabs = actions.iter().filter(|a| **a == CoreAction::GrabPointer).count();
        let releases = actions.iter().filter(|a| **a == CoreAction::UngrabPointer).count();
        assert_eq!((grabs, releases), (1, 1));
        assert!(actions.contains(&CoreAction::UngrabKeyboard));
        assert!(p.is_grabbed());
    }

    #[test]
    fn test_item_at_clamps() {
        let p = popups();
        let menu = p.get(PopupKind::PinnedMenu);
        assert_eq!(menu.item_at(0, 30), Some(0));
        assert_eq!(menu.item_at(45, 30), Some(1));
        assert_eq!(menu.item_at(60, 30), Some(1));
        assert_eq!(menu.item_at(-1, 30), None);
        assert_eq!(p.get(PopupKind::Launcher).item_at(10, 30), None);
    }

    #[test]
    fn test_menu_geometry_clamps_horizontally() {
        let panel = Geometry::new(0, 1030, 1920, 50);
        let m = Metrics::default();
        assert_eq!(
            menu_geometry(PopupKind::ControlMenu, 100, panel, &m),
            Geometry::new(100, 905, 120, 120)
        );
        assert_eq!(
            menu_geometry(PopupKind::PinnedMenu, 1900, panel, &m),
            Geometry::new(1800, 965, 120, 60)
        );
    }

    #[test]
    fn test_launcher_geometry_stays_above_panel() {
        let screen = Geometry::new(0, 0, 1920, 1080);
        let panel = Geometry::new(0, 1030, 1920, 50);
        let m = Metrics::default();
        assert_eq!(
            launcher_geometry(Point::new(100, 100), screen, panel, &m),
            Geometry::new(100, 100, 350, 600)
        );
        assert_eq!(
            launcher_geometry(Point::new(1800, 900), screen, panel, &m),
            Geometry::new(1560, 420, 350, 600)
        );
    }

    #[test]
    fn test_drop_client_target() {
        let mut p = popups();
        p.show(
            PopupKind::ControlMenu,
            Geometry::new(0, 0, 120, 120),
            Some(PopupTarget::Client(ClientId(3))),
        );
        assert!(p.drop_client_target(ClientId(4)).is_empty());
        let actions = p.drop_client_target(ClientId(3));
        assert!(actions.contains(&CoreAction::UngrabPointer));
        assert!(!p.any_visible());
    }
}
