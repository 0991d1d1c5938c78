//! Managed client types.
//!
//! A [`Client`] pairs an application window with the decorating frame the
//! manager created for it. Handles are opaque server ids; the core never
//! interprets them beyond equality.

use bitflags::bitflags;

use crate::state::Geometry;

/// Opaque server-side window handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub u32);

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Stable identifier of a managed client, allocated monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client:{}", self.0)
    }
}

bitflags! {
    /// Client state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClientFlags: u8 {
        const MAPPED     = 0b0001;
        const FULLSCREEN = 0b0010;
        const ACTIVE     = 0b0100;
    }
}

/// The three titlebar glyphs, in titlebar reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleButton {
    Close,
    Minimize,
    Maximize,
}

impl TitleButton {
    pub const ALL: [Self; 3] = [Self::Close, Self::Minimize, Self::Maximize];
}

/// Raw title candidates gathered by the display session, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleSources {
    /// `_NET_WM_NAME` as UTF-8.
    pub net_wm_name: Option<String>,
    /// `WM_NAME` as a Latin-1 string property.
    pub wm_name: Option<String>,
    /// `WM_NAME` fetched with any property type, decoded lossily.
    pub fetched_name: Option<String>,
}

impl TitleSources {
    pub const FALLBACK: &'static str = "Untitled";

    /// Resolve the display title; empty candidates count as missing.
    pub fn resolve(&self) -> String {
        [&self.net_wm_name, &self.wm_name, &self.fetched_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim_end_matches('\0'))
            .find(|s| !s.is_empty())
            .unwrap_or(Self::FALLBACK)
            .to_string()
    }
}

/// One managed top-level application window.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    /// The application's own window.
    pub window: WindowHandle,
    /// The decorating frame that contains `window`.
    pub frame: WindowHandle,
    /// Frame geometry, authoritative.
    pub geometry: Geometry,
    /// Frame geometry before entering fullscreen.
    pub saved_geometry: Option<Geometry>,
    pub title: String,
    pub flags: ClientFlags,
    pub hover: Option<TitleButton>,
    /// Unmap notifications the manager caused itself and must not treat as
    /// application-initiated.
    pub pending_unmaps: u32,
}

impl Client {
    pub fn new(
        id: ClientId,
        window: WindowHandle,
        frame: WindowHandle,
        geometry: Geometry,
        title: String,
    ) -> Self {
        Self {
            id,
            window,
            frame,
            geometry,
            saved_geometry: None,
            title,
            flags: ClientFlags::MAPPED | ClientFlags::ACTIVE,
            hover: None,
            pending_unmaps: 0,
        }
    }

    pub const fn is_mapped(&self) -> bool {
        self.flags.contains(ClientFlags::MAPPED)
    }

    pub const fn is_fullscreen(&self) -> bool {
        self.flags.contains(ClientFlags::FULLSCREEN)
    }

    pub const fn is_active(&self) -> bool {
        self.flags.contains(ClientFlags::ACTIVE)
    }

    pub fn set_active(&mut self, active: bool) {
        self.flags.set(ClientFlags::ACTIVE, active);
    }

    pub fn set_mapped(&mut self, mapped: bool) {
        self.flags.set(ClientFlags::MAPPED, mapped);
    }

    /// Flip between windowed and fullscreen, returning the new frame geometry.
    ///
    /// Entering snapshots the current geometry and fills `area`; leaving
    /// restores the snapshot exactly.
    pub fn toggle_fullscreen(&mut self, area: Geometry) -> Geometry {
        if self.is_fullscreen() {
            if let Some(saved) = self.saved_geometry.take() {
                self.geometry = saved;
            }
            self.flags.remove(ClientFlags::FULLSCREEN);
        } else {
            self.saved_geometry = Some(self.geometry);
            self.geometry = area;
            self.flags.insert(ClientFlags::FULLSCREEN);
        }
        self.geometry
    }

    /// Update hover state, reporting whether it changed.
    pub fn set_hover(&mut self, hover: Option<TitleButton>) -> bool {
        if self.hover == hover {
            false
        } else {
            self.hover = hover;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(
            ClientId(1),
            WindowHandle(0x10),
            WindowHandle(0x20),
            Geometry::new(100, 100, 610, 440),
            "xterm".into(),
        )
    }

    #[test]
    fn test_new_client_is_mapped_and_active() {
        let c = client();
        assert!(c.is_mapped());
        assert!(c.is_active());
        assert!(!c.is_fullscreen());
    }

    #[test]
    fn test_fullscreen_round_trip() {
        let mut c = client();
        let area = Geometry::new(0, 0, 1920, 1030);
        assert_eq!(c.toggle_fullscreen(area), area);
        assert!(c.is_fullscreen());
        assert_eq!(c.toggle_fullscreen(area), Geometry::new(100, 100, 610, 440));
        assert!(!c.is_fullscreen());
        assert_eq!(c.saved_geometry, None);
    }

    #[test]
    fn test_title_fallback_chain() {
        let sources = TitleSources {
            net_wm_name: None,
            wm_name: None,
            fetched_name: Some("xterm".into()),
        };
        assert_eq!(sources.resolve(), "xterm");

        let sources = TitleSources {
            net_wm_name: Some("Ünïcode".into()),
            wm_name: Some("legacy".into()),
            fetched_name: None,
        };
        assert_eq!(sources.resolve(), "Ünïcode");

        let sources = TitleSources {
            net_wm_name: Some(String::new()),
            wm_name: Some("legacy".into()),
            fetched_name: None,
        };
        assert_eq!(sources.resolve(), "legacy");

        assert_eq!(TitleSources::default().resolve(), "Untitled");
    }

    #[test]
    fn test_hover_change_detection() {
        let mut c = client();
        assert!(c.set_hover(Some(TitleButton::Close)));
        assert!(!c.set_hover(Some(TitleButton::Close)));
        assert!(c.set_hover(None));
    }
}
