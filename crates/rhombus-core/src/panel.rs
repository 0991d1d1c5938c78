//! Panel layout.
//!
//! Left to right: pinned-app icons, a separator when any are pinned, one
//! button per mapped client that no pinned record stands in for, then the
//! right-aligned system-menu area and the clock. The layout is recomputed
//! from the registry on demand, so slot positions are never cached across
//! registry changes. Coordinates are panel-local.

use crate::client::ClientId;
use crate::pinned::{PinnedApps, PinnedId};
use crate::registry::ClientRegistry;
use crate::state::{Geometry, Point};

pub const SLOT_TOP: i32 = 10;
pub const SLOT_BOTTOM: i32 = 40;
pub const FIRST_SLOT_X: i32 = 10;
pub const PINNED_WIDTH: i32 = 30;
pub const PINNED_PITCH: i32 = 40;
pub const SEPARATOR_GAP: i32 = 10;
pub const CLIENT_WIDTH: i32 = 40;
pub const CLIENT_PITCH: i32 = 50;
/// Distance of the system-menu area from the panel's right edge.
pub const MENU_AREA_OFFSET: i32 = 120;
pub const MENU_AREA_WIDTH: i32 = 70;
/// Distance of the clock text from the panel's right edge.
pub const CLOCK_OFFSET: i32 = 45;

/// Something clickable on the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelTarget {
    Pinned(PinnedId),
    SystemMenu,
    Client(ClientId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSlot {
    pub target: PanelTarget,
    pub x: i32,
    pub width: i32,
    /// Text drawn on the slot: an initial for pinned apps, a 1-based
    /// position for clients.
    pub label: String,
}

impl PanelSlot {
    /// Inclusive bounds, matching the drawn outline.
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= SLOT_TOP && p.y <= SLOT_BOTTOM
    }

    pub const fn rect(&self) -> Geometry {
        Geometry::new(
            self.x,
            SLOT_TOP,
            self.width as u32,
            (SLOT_BOTTOM - SLOT_TOP) as u32,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLayout {
    pub pinned: Vec<PanelSlot>,
    pub clients: Vec<PanelSlot>,
    /// Separator position, present when anything is pinned.
    pub separator: Option<i32>,
    pub menu_area: PanelSlot,
    pub clock_x: i32,
}

impl PanelLayout {
    pub fn compute(width: u32, pinned: &PinnedApps, registry: &ClientRegistry) -> Self {
        let mut x = FIRST_SLOT_X;

        let pinned_slots: Vec<_> = pinned
            .iter()
            .map(|app| {
                let slot = PanelSlot {
                    target: PanelTarget::Pinned(app.id),
                    x,
                    width: PINNED_WIDTH,
                    label: app.initial().to_string(),
                };
                x += PINNED_PITCH;
                slot
            })
            .collect();

        let separator = if pinned_slots.is_empty() {
            None
        } else {
            let sep = x;
            x += SEPARATOR_GAP;
            Some(sep)
        };

        let client_slots: Vec<_> = registry
            .iter()
            .filter(|c| c.is_mapped() && !pinned.is_linked(c.id))
            .enumerate()
            .map(|(i, c)| {
                let slot = PanelSlot {
                    target: PanelTarget::Client(c.id),
                    x,
                    width: CLIENT_WIDTH,
                    label: (i + 1).to_string(),
                };
                x += CLIENT_PITCH;
                slot
            })
            .collect();

        let right = width as i32;
        Self {
            pinned: pinned_slots,
            clients: client_slots,
            separator,
            menu_area: PanelSlot {
                target: PanelTarget::SystemMenu,
                x: right - MENU_AREA_OFFSET,
                width: MENU_AREA_WIDTH,
                label: String::new(),
            },
            clock_x: right - CLOCK_OFFSET,
        }
    }

    /// Pinned icons first, then the system-menu area, then client buttons.
    pub fn hit_test(&self, p: Point) -> Option<PanelTarget> {
        self.pinned
            .iter()
            .chain(std::iter::once(&self.menu_area))
            .chain(self.clients.iter())
            .find(|slot| slot.contains(p))
            .map(|slot| slot.target)
    }

    pub fn slot(&self, target: PanelTarget) -> Option<&PanelSlot> {
        self.pinned
            .iter()
            .chain(std::iter::once(&self.menu_area))
            .chain(self.clients.iter())
            .find(|slot| slot.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::WindowHandle;
    use pretty_assertions::assert_eq;

    fn registry(n: u32) -> ClientRegistry {
        let mut reg = ClientRegistry::new(10);
        for i in 0..n {
            reg.insert(
                WindowHandle(i + 1),
                WindowHandle(i + 100),
                Geometry::new(0, 0, 100, 100),
                format!("w{i}"),
            )
            .unwrap();
        }
        reg
    }

    #[test]
    fn test_layout_without_pins() {
        let reg = registry(2);
        let layout = PanelLayout::compute(1920, &PinnedApps::default(), &reg);
        assert_eq!(layout.separator, None);
        let xs: Vec<_> = layout.clients.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![10, 60]);
        assert_eq!(layout.clients[1].label, "2");
        assert_eq!(layout.menu_area.x, 1800);
    }

    #[test]
    fn test_layout_with_pins_and_linked_client() {
        let reg = registry(3);
        let mut pinned = PinnedApps::default();
        let pid = pinned.push("Firefox", Some("firefox".into()), None, None);
        let linked = reg.iter().nth(1).unwrap().id;
        pinned.pin_client(linked, "w1");

        let layout = PanelLayout::compute(1920, &pinned, &reg);
        assert_eq!(layout.pinned.len(), 2);
        assert_eq!(layout.separator, Some(90));
        let xs: Vec<_> = layout.clients.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![100, 150]);
        assert!(layout
            .clients
            .iter()
            .all(|s| s.target != PanelTarget::Client(linked)));

        assert_eq!(layout.hit_test(Point::new(25, 20)), Some(PanelTarget::Pinned(pid)));
        assert_eq!(layout.hit_test(Point::new(45, 20)), None);
        assert_eq!(layout.hit_test(Point::new(1830, 25)), Some(PanelTarget::SystemMenu));
        assert_eq!(layout.hit_test(Point::new(120, 5)), None);
    }

    #[test]
    fn test_unmapped_clients_hidden() {
        let mut reg = registry(2);
        let first = reg.iter().next().unwrap().id;
        reg.get_mut(first).unwrap().set_mapped(false);
        let layout = PanelLayout::compute(1920, &PinnedApps::default(), &reg);
        assert_eq!(layout.clients.len(), 1);
        assert_eq!(layout.clients[0].x, 10);
        assert_eq!(layout.clients[0].label, "1");
    }
}
