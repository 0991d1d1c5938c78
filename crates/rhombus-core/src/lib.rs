//! Rhombus Core - Protocol-agnostic stacking window manager engine
//!
//! This crate contains all window manager logic (client registry, frame
//! geometry, panel layout, popups, the application launcher and pinned
//! apps) with zero dependencies on display protocols.
//!
//! The display session translates X11 events into [`CoreEvent`]s, feeds
//! them to [`Core`], and applies the returned [`CoreAction`]s back to the
//! server.
//!
//! # Quick Start
//! ```
//! use rhombus_core::{Core, CoreEvent, Geometry, Surfaces, WindowHandle};
//! use rhombus_core::client::TitleSources;
//! use rhombus_core::config::Config;
//! use rhombus_core::popup::PopupHandles;
//!
//! let surfaces = Surfaces {
//!     root: WindowHandle(1),
//!     panel: WindowHandle(2),
//!     popups: PopupHandles {
//!         system_menu: WindowHandle(3),
//!         launcher: WindowHandle(4),
//!         control_menu: WindowHandle(5),
//!         pinned_menu: WindowHandle(6),
//!     },
//! };
//! let mut core = Core::new(Config::default(), surfaces, Geometry::new(0, 0, 1920, 1080));
//!
//! // The session tells core a window wants to appear
//! let actions = core.handle_event(CoreEvent::MapRequest {
//!     window: WindowHandle(0x40_0001),
//!     frame: WindowHandle(0x20_0001),
//!     geometry: None,
//!     title: TitleSources::default(),
//! });
//! assert!(core.is_managed(WindowHandle(0x40_0001)));
//! # let _ = actions;
//! ```

pub mod client;
pub mod config;
pub mod desktop;
pub mod event;
pub mod frame;
pub mod input;
pub mod invariants;
pub mod launcher;
pub mod panel;
pub mod pinned;
pub mod popup;
pub mod registry;
pub mod state;

mod dispatch;
mod lifecycle;

// Re-export primary API types at crate root
pub use client::{ClientId, WindowHandle};
pub use dispatch::Surface;
pub use event::{CoreAction, CoreEvent, Surfaces};
pub use state::{Geometry, Point};

use std::collections::HashMap;

use tracing::debug;

use config::{Config, Metrics};
use input::Hotkeys;
use launcher::Launcher;
use panel::{PanelLayout, PanelTarget};
use pinned::PinnedApps;
use popup::{PopupKind, Popups};
use registry::ClientRegistry;
use state::{FocusState, Mode};

/// The protocol-agnostic window manager engine.
///
/// Owns all WM state. The display session drives it via
/// [`handle_event`](Core::handle_event), then applies the returned
/// [`CoreAction`]s.
pub struct Core {
    config: Config,
    hotkeys: Hotkeys,
    registry: ClientRegistry,
    pinned: PinnedApps,
    launcher: Launcher,
    popups: Popups,
    mode: Mode,
    focus: FocusState,
    surfaces: Surfaces,
    screen: Geometry,
    /// Frames kept after their application unmapped itself, keyed by the
    /// application window.
    orphans: HashMap<WindowHandle, Orphan>,
    panel_hover: Option<PanelTarget>,
    /// Exit requested
    pub should_exit: bool,
}

/// An unmapped frame and where it last sat on screen.
#[derive(Debug, Clone, Copy)]
struct Orphan {
    frame: WindowHandle,
    geometry: Geometry,
}

impl Core {
    /// Create a new core engine for a screen of the given size.
    pub fn new(config: Config, surfaces: Surfaces, screen: Geometry) -> Self {
        let hotkeys = Hotkeys::from_config(&config.bindings);
        let registry = ClientRegistry::new(config.general.max_clients);

        Self {
            config,
            hotkeys,
            registry,
            pinned: PinnedApps::default(),
            launcher: Launcher::default(),
            popups: Popups::new(surfaces.popups),
            mode: Mode::Idle,
            focus: FocusState::default(),
            surfaces,
            screen,
            orphans: HashMap::new(),
            panel_hover: None,
            should_exit: false,
        }
    }

    /// Use a pinned-app list loaded from disk.
    pub fn with_pinned(mut self, pinned: PinnedApps) -> Self {
        self.pinned = pinned;
        self
    }

    /// Use a launcher populated from desktop entries.
    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    // ── Event handling (session → core) ──────────────────────────────

    /// Process a session event. Returns actions the session must apply.
    pub fn handle_event(&mut self, event: CoreEvent) -> Vec<CoreAction> {
        let actions = match event {
            CoreEvent::MapRequest {
                window,
                frame,
                geometry,
                title,
            } => self.manage(window, frame, geometry, &title),

            CoreEvent::UnmapNotify { window } => self.on_unmap(window),

            CoreEvent::DestroyNotify { window } => self.on_destroy(window),

            CoreEvent::ButtonPress {
                window,
                button,
                root,
            } => self.on_button_press(window, button, root),

            CoreEvent::ButtonRelease { button, .. } => self.on_button_release(button),

            CoreEvent::Motion { window, root } => self.on_motion(window, root),

            CoreEvent::KeyPress { key, modifiers } => self.on_key_press(key, modifiers),

            CoreEvent::Expose { window } => self.on_expose(window),

            CoreEvent::ConfigureRequest {
                window,
                width,
                height,
            } => self.on_configure_request(window, width, height),

            CoreEvent::TitleChanged { window, title } => self.on_title_changed(window, &title),

            CoreEvent::Tick => vec![CoreAction::RedrawPanel],
        };

        #[cfg(debug_assertions)]
        if let Err(e) = self.validate_invariants() {
            tracing::warn!("Invariant violation after handle_event: {}", e);
        }

        actions
    }

    fn on_expose(&self, window: WindowHandle) -> Vec<CoreAction> {
        if window == self.surfaces.panel {
            return vec![CoreAction::RedrawPanel];
        }
        if let Some(kind) = self.popups.kind_for_handle(window) {
            if self.popups.get(kind).visible {
                return vec![CoreAction::RedrawPopup { kind }];
            }
            return Vec::new();
        }
        match self.registry.find_by_frame(window) {
            Some(client) => vec![CoreAction::RedrawFrame { client }],
            None => Vec::new(),
        }
    }

    fn on_configure_request(
        &mut self,
        window: WindowHandle,
        width: u32,
        height: u32,
    ) -> Vec<CoreAction> {
        let Some(id) = self.registry.find_by_window(window) else {
            return Vec::new();
        };
        if self.registry.get(id).is_some_and(|c| c.is_fullscreen()) {
            debug!("Ignoring configure request from fullscreen {}", window);
            return Vec::new();
        }
        let m = self.metrics();
        let frame_width = width + 2 * m.frame_border;
        let frame_height = height + m.titlebar_height + 2 * m.frame_border;
        self.resize_window(id, frame_width, frame_height)
    }

    fn on_title_changed(
        &mut self,
        window: WindowHandle,
        title: &client::TitleSources,
    ) -> Vec<CoreAction> {
        let Some(id) = self.registry.find_by_window(window) else {
            return Vec::new();
        };
        let title = title.resolve();
        match self.registry.get_mut(id) {
            Some(client) if client.title != title => {
                debug!("Title of {} is now {:?}", window, title);
                client.title = title;
                vec![CoreAction::RedrawFrame { client: id }, CoreAction::RedrawPanel]
            },
            _ => Vec::new(),
        }
    }

    // ── Geometry helpers ─────────────────────────────────────────────

    /// The panel strip along the bottom of the screen.
    pub fn panel_geometry(&self) -> Geometry {
        let h = self.config.metrics.panel_height;
        Geometry::new(
            self.screen.x,
            self.screen.bottom() - h as i32,
            self.screen.width,
            h,
        )
    }

    /// The screen above the panel.
    pub fn usable_area(&self) -> Geometry {
        Geometry::new(
            self.screen.x,
            self.screen.y,
            self.screen.width,
            self.screen
                .height
                .saturating_sub(self.config.metrics.panel_height),
        )
    }

    /// Panel slots for the current registry and pinned list.
    pub fn panel_layout(&self) -> PanelLayout {
        PanelLayout::compute(self.screen.width, &self.pinned, &self.registry)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub const fn metrics(&self) -> &Metrics {
        &self.config.metrics
    }

    pub const fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub const fn pinned(&self) -> &PinnedApps {
        &self.pinned
    }

    pub const fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    pub const fn popups(&self) -> &Popups {
        &self.popups
    }

    pub const fn hotkeys(&self) -> &Hotkeys {
        &self.hotkeys
    }

    pub const fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    pub const fn screen(&self) -> Geometry {
        self.screen
    }

    pub const fn mode(&self) -> &Mode {
        &self.mode
    }

    pub const fn focused(&self) -> Option<ClientId> {
        self.focus.focused
    }

    pub const fn panel_hover(&self) -> Option<PanelTarget> {
        self.panel_hover
    }

    pub fn is_managed(&self, window: WindowHandle) -> bool {
        self.registry.find_by_window(window).is_some()
    }

    /// Frame kept for an application window that unmapped itself.
    pub fn orphan_frame(&self, window: WindowHandle) -> Option<WindowHandle> {
        self.orphans.get(&window).map(|o| o.frame)
    }

    /// Set the opacity of a popup during its fade animation.
    pub fn set_popup_fade(&mut self, kind: PopupKind, level: f32) {
        self.popups.get_mut(kind).fade = level.clamp(0.0, 1.0);
    }

    /// Check every core invariant.
    pub fn validate_invariants(&self) -> Result<(), invariants::InvariantError> {
        invariants::validate(self)
    }
}
