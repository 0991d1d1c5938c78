//! Window lifecycle: managing, hiding, tearing down and rearranging clients.

use tracing::{debug, info, warn};

use crate::client::{ClientId, TitleSources, WindowHandle};
use crate::event::CoreAction;
use crate::frame::CursorShape;
use crate::panel::PanelTarget;
use crate::pinned::PinnedId;
use crate::state::{Geometry, Mode};
use crate::{Core, Orphan};

/// Gap kept around a window pulled back on screen from the panel.
const RECOVER_MARGIN: i32 = 10;

impl Core {
    // ── Managing ─────────────────────────────────────────────────────

    /// Wrap a window asking to be mapped in a frame and register it.
    ///
    /// The window is mapped in every case; a window that cannot be
    /// managed stays visible without decorations.
    pub fn manage(
        &mut self,
        window: WindowHandle,
        frame: WindowHandle,
        geometry: Option<Geometry>,
        title: &TitleSources,
    ) -> Vec<CoreAction> {
        if let Some(id) = self.registry.find_by_window(window) {
            return self.show_client(id);
        }

        let orphan = self.orphans.remove(&window);
        let inner = geometry.unwrap_or_else(|| {
            debug!("No geometry for {}, using default", window);
            self.config.metrics.default_geometry()
        });
        let mut frame_geometry = self.config.metrics.frame_for(inner);
        // A window still inside its old frame reports frame-relative coordinates
        if let Some(orphan) = orphan {
            frame_geometry.x = orphan.geometry.x;
            frame_geometry.y = orphan.geometry.y;
        }
        let title = title.resolve();
        let frame = orphan.map_or(frame, |o| o.frame);

        let id = match self
            .registry
            .insert(window, frame, frame_geometry, title.clone())
        {
            Ok(id) => id,
            Err(e) => {
                warn!("Not managing {}: {}", window, e);
                return self.release_orphan(window, orphan);
            },
        };
        info!("Managing {} as {} ({:?})", window, id, title);

        let offset = self.config.metrics.inner_offset();
        let mut actions = vec![
            if orphan.is_some() {
                CoreAction::MoveResize {
                    window: frame,
                    geometry: frame_geometry,
                }
            } else {
                CoreAction::CreateFrame {
                    frame,
                    geometry: frame_geometry,
                }
            },
            CoreAction::Reparent {
                window,
                parent: frame,
                x: offset.x,
                y: offset.y,
            },
            CoreAction::Resize {
                window,
                width: inner.width,
                height: inner.height,
            },
            CoreAction::Map { window },
            CoreAction::Map { window: frame },
        ];
        actions.extend(self.raise_and_focus(id));
        actions.push(CoreAction::RedrawPanel);
        actions.push(CoreAction::Notify {
            message: "New window managed".into(),
        });
        actions
    }

    /// Map a window left unmanaged. One still parented to an orphaned frame
    /// goes back to the root where the frame showed it, and the frame is freed.
    fn release_orphan(&self, window: WindowHandle, orphan: Option<Orphan>) -> Vec<CoreAction> {
        let Some(orphan) = orphan else {
            return vec![CoreAction::Map { window }];
        };
        let offset = self.config.metrics.inner_offset();
        vec![
            CoreAction::Reparent {
                window,
                parent: self.surfaces.root,
                x: orphan.geometry.x + offset.x,
                y: orphan.geometry.y + offset.y,
            },
            CoreAction::Destroy {
                window: orphan.frame,
            },
            CoreAction::Map { window },
        ]
    }

    /// Map a managed client that was hidden by `close_window`.
    fn show_client(&mut self, id: ClientId) -> Vec<CoreAction> {
        let mut actions = self.remap(id);
        actions.extend(self.raise_and_focus(id));
        actions.push(CoreAction::RedrawPanel);
        actions
    }

    fn remap(&mut self, id: ClientId) -> Vec<CoreAction> {
        match self.registry.get_mut(id) {
            Some(client) if !client.is_mapped() => {
                debug!("Showing {} again", id);
                client.set_mapped(true);
                vec![
                    CoreAction::Map {
                        window: client.window,
                    },
                    CoreAction::Map {
                        window: client.frame,
                    },
                ]
            },
            _ => Vec::new(),
        }
    }

    // ── Teardown ─────────────────────────────────────────────────────

    pub(crate) fn on_unmap(&mut self, window: WindowHandle) -> Vec<CoreAction> {
        let Some(id) = self.registry.find_by_window(window) else {
            return Vec::new();
        };
        if let Some(client) = self.registry.get_mut(id) {
            if client.pending_unmaps > 0 {
                client.pending_unmaps -= 1;
                debug!("Ignoring self-inflicted unmap of {}", window);
                return Vec::new();
            }
        }
        self.unmanage(window)
    }

    /// Forget a client whose application unmapped itself. The frame is
    /// hidden and kept until the window is destroyed or mapped again.
    pub fn unmanage(&mut self, window: WindowHandle) -> Vec<CoreAction> {
        let Some(id) = self.registry.find_by_window(window) else {
            return Vec::new();
        };
        let Some(client) = self.registry.remove(id) else {
            return Vec::new();
        };
        info!("Unmanaging {} ({})", window, id);

        let mut actions = self.forget_client(id);
        actions.push(CoreAction::Unmap {
            window: client.frame,
        });
        self.orphans.insert(
            window,
            Orphan {
                frame: client.frame,
                geometry: client.geometry,
            },
        );
        actions.push(CoreAction::RedrawPanel);
        actions
    }

    pub(crate) fn on_destroy(&mut self, window: WindowHandle) -> Vec<CoreAction> {
        if let Some(id) = self.registry.find_by_window(window) {
            let Some(client) = self.registry.remove(id) else {
                return Vec::new();
            };
            info!("{} destroyed, dropping {}", window, id);
            let mut actions = self.forget_client(id);
            actions.push(CoreAction::Destroy {
                window: client.frame,
            });
            actions.push(CoreAction::RedrawPanel);
            return actions;
        }
        if let Some(orphan) = self.orphans.remove(&window) {
            debug!("Destroying orphaned frame {} of {}", orphan.frame, window);
            return vec![CoreAction::Destroy {
                window: orphan.frame,
            }];
        }
        Vec::new()
    }

    /// Drop every reference to a client that left the registry.
    fn forget_client(&mut self, id: ClientId) -> Vec<CoreAction> {
        self.pinned.unlink(id);
        let mut actions = self.popups.drop_client_target(id);
        if self.mode.target() == Some(id) {
            self.mode = Mode::Idle;
        }
        if self.panel_hover == Some(PanelTarget::Client(id)) {
            self.panel_hover = None;
        }
        let was_focused = self.focus.focused == Some(id);
        self.focus.forget(id);
        if was_focused {
            actions.extend(self.refocus(None));
        }
        actions
    }

    /// Hand focus to the last mapped client other than `except`.
    fn refocus(&mut self, except: Option<ClientId>) -> Vec<CoreAction> {
        let next = self
            .registry
            .iter()
            .rev()
            .find(|c| c.is_mapped() && Some(c.id) != except)
            .map(|c| (c.id, c.window));
        match next {
            Some((id, window)) => {
                self.focus.set_focused(id);
                vec![CoreAction::Focus { window }]
            },
            None => {
                self.focus.clear_focused();
                Vec::new()
            },
        }
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Flip a client between windowed and filling the usable area.
    pub fn toggle_fullscreen(&mut self, id: ClientId) -> Vec<CoreAction> {
        let area = self.usable_area();
        let Some(client) = self.registry.get_mut(id) else {
            return Vec::new();
        };
        let geometry = client.toggle_fullscreen(area);
        debug!("{} fullscreen: {}", id, client.is_fullscreen());
        let (window, frame) = (client.window, client.frame);
        let (width, height) = self
            .config
            .metrics
            .inner_size(geometry.width, geometry.height);
        vec![
            CoreAction::MoveResize {
                window: frame,
                geometry,
            },
            CoreAction::Resize {
                window,
                width,
                height,
            },
            CoreAction::RedrawFrame { client: id },
        ]
    }

    /// Set a frame's size; the application window follows.
    pub fn resize_window(&mut self, id: ClientId, width: u32, height: u32) -> Vec<CoreAction> {
        let Some(client) = self.registry.get_mut(id) else {
            return Vec::new();
        };
        client.geometry.width = width;
        client.geometry.height = height;
        let (window, frame) = (client.window, client.frame);
        let (inner_width, inner_height) = self.config.metrics.inner_size(width, height);
        vec![
            CoreAction::Resize {
                window: frame,
                width,
                height,
            },
            CoreAction::Resize {
                window,
                width: inner_width,
                height: inner_height,
            },
            CoreAction::RedrawFrame { client: id },
        ]
    }

    pub fn move_window(&mut self, id: ClientId, x: i32, y: i32) -> Vec<CoreAction> {
        let Some(client) = self.registry.get_mut(id) else {
            return Vec::new();
        };
        client.geometry.x = x;
        client.geometry.y = y;
        vec![CoreAction::Move {
            window: client.frame,
            x,
            y,
        }]
    }

    /// Push a client to the bottom of the stack and deactivate it.
    pub fn lower_window(&mut self, id: ClientId) -> Vec<CoreAction> {
        let Some(client) = self.registry.get_mut(id) else {
            return Vec::new();
        };
        client.set_active(false);
        let frame = client.frame;
        self.registry.lower(id);

        let mut actions = vec![
            CoreAction::Lower { window: frame },
            CoreAction::RedrawFrame { client: id },
            CoreAction::RedrawPanel,
        ];
        if self.focus.focused == Some(id) {
            actions.extend(self.refocus(Some(id)));
        }
        actions
    }

    /// Hide a client and politely ask it to close. The client is never
    /// killed here; the registry entry stays until the window is destroyed.
    pub fn close_window(&mut self, id: ClientId) -> Vec<CoreAction> {
        let Some(client) = self.registry.get_mut(id) else {
            return Vec::new();
        };
        let (window, frame) = (client.window, client.frame);
        let mut actions = Vec::new();
        if client.is_mapped() {
            client.pending_unmaps += 1;
            client.set_mapped(false);
            client.set_active(false);
            actions.push(CoreAction::Unmap { window: frame });
            actions.push(CoreAction::Unmap { window });
        }
        actions.push(CoreAction::RequestClose { window });
        actions.push(CoreAction::RedrawPanel);

        if self.panel_hover == Some(PanelTarget::Client(id)) {
            self.panel_hover = None;
        }
        if self.focus.focused == Some(id) {
            actions.extend(self.refocus(Some(id)));
        }
        actions
    }

    /// Raise, focus and exclusively activate a client.
    pub(crate) fn raise_and_focus(&mut self, id: ClientId) -> Vec<CoreAction> {
        let Some(client) = self.registry.get(id) else {
            return Vec::new();
        };
        let (window, frame) = (client.window, client.frame);
        self.registry.raise(id);
        self.focus.set_focused(id);

        let mut actions = vec![
            CoreAction::Raise { window: frame },
            CoreAction::Focus { window },
        ];
        actions.extend(self.activate(id));
        actions
    }

    /// Make `id` the only active client, redrawing every frame that changed.
    fn activate(&mut self, id: ClientId) -> Vec<CoreAction> {
        let changed: Vec<_> = self
            .registry
            .iter()
            .filter(|c| c.is_active() != (c.id == id))
            .map(|c| c.id)
            .collect();
        self.registry.activate(id);

        let mut actions: Vec<_> = changed
            .iter()
            .map(|&client| CoreAction::RedrawFrame { client })
            .collect();
        if !actions.iter().any(|a| *a == CoreAction::RedrawFrame { client: id }) {
            actions.push(CoreAction::RedrawFrame { client: id });
        }
        actions
    }

    /// Taskbar activation: bring the client back on screen if it is not,
    /// then raise and focus it.
    pub fn activate_from_panel(&mut self, id: ClientId) -> Vec<CoreAction> {
        let Some(geometry) = self.registry.get(id).map(|c| c.geometry) else {
            return Vec::new();
        };
        let mut actions = self.remap(id);

        if !geometry.is_on_screen(self.screen.width, self.screen.height) {
            let max_w = (self.screen.width as i32 - 2 * RECOVER_MARGIN).max(1) as u32;
            let max_h = (self.usable_area().height as i32 - 2 * RECOVER_MARGIN).max(1) as u32;
            debug!("{} is off screen at {:?}, pulling it back", id, geometry);
            if geometry.width > max_w || geometry.height > max_h {
                actions.extend(self.resize_window(
                    id,
                    geometry.width.min(max_w),
                    geometry.height.min(max_h),
                ));
            }
            actions.extend(self.move_window(id, RECOVER_MARGIN, RECOVER_MARGIN));
        }

        actions.extend(self.raise_and_focus(id));
        actions.push(CoreAction::RedrawPanel);
        actions.push(CoreAction::Notify {
            message: "Window activated".into(),
        });
        actions
    }

    // ── Pinned apps ──────────────────────────────────────────────────

    pub fn pin_client(&mut self, id: ClientId) -> Vec<CoreAction> {
        let Some(client) = self.registry.get(id) else {
            return Vec::new();
        };
        let title = client.title.clone();
        match self.pinned.pin_client(id, &title) {
            Some(pid) => {
                info!("Pinned {} as {:?} ({})", id, title, pid.0);
                vec![
                    CoreAction::PersistPinned,
                    CoreAction::RedrawPanel,
                    CoreAction::Notify {
                        message: "App pinned to panel".into(),
                    },
                ]
            },
            None => {
                debug!("{} is already pinned", id);
                Vec::new()
            },
        }
    }

    pub fn unpin(&mut self, pid: PinnedId) -> Vec<CoreAction> {
        match self.pinned.unpin(pid) {
            Some(app) => {
                info!("Unpinned {:?}", app.name);
                if self.panel_hover == Some(PanelTarget::Pinned(pid)) {
                    self.panel_hover = None;
                }
                vec![
                    CoreAction::PersistPinned,
                    CoreAction::RedrawPanel,
                    CoreAction::Notify {
                        message: "App unpinned from panel".into(),
                    },
                ]
            },
            None => Vec::new(),
        }
    }

    /// Activate the client a pinned record links to, or run its command.
    pub fn launch_pinned(&mut self, pid: PinnedId) -> Vec<CoreAction> {
        let Some(app) = self.pinned.get(pid) else {
            return Vec::new();
        };
        if let Some(id) = app.client.filter(|&id| self.registry.contains(id)) {
            return self.activate_from_panel(id);
        }
        match &app.command {
            Some(command) => {
                info!("Launching pinned {:?}: {}", app.name, command);
                vec![CoreAction::Spawn {
                    command: command.clone(),
                    feedback: Some("App launched".into()),
                }]
            },
            None => {
                debug!("Pinned {:?} has nothing to launch", app.name);
                Vec::new()
            },
        }
    }

    // ── Session ──────────────────────────────────────────────────────

    pub fn lock(&mut self) -> Vec<CoreAction> {
        info!("Locking screen");
        let mut actions = self.hide_all_popups();
        if let Some(id) = self.mode.target() {
            if let Some(client) = self.registry.get(id) {
                actions.push(CoreAction::SetCursor {
                    window: client.frame,
                    shape: CursorShape::Normal,
                });
            }
        }
        self.mode = Mode::Locked;
        actions.push(CoreAction::Lock);
        actions
    }

    pub fn unlock(&mut self) -> Vec<CoreAction> {
        if self.mode != Mode::Locked {
            return Vec::new();
        }
        info!("Unlocking screen");
        self.mode = Mode::Idle;
        vec![
            CoreAction::Unlock,
            CoreAction::Notify {
                message: "Screen unlocked".into(),
            },
        ]
    }

    /// Give every application window back to the root and exit.
    pub fn logout(&mut self) -> Vec<CoreAction> {
        info!("Logging out, releasing {} clients", self.registry.len());
        let mut actions = self.hide_all_popups();
        let root = self.surfaces.root;
        for client in self.registry.iter() {
            actions.push(CoreAction::Unmap {
                window: client.frame,
            });
            actions.push(CoreAction::Reparent {
                window: client.window,
                parent: root,
                x: client.geometry.x,
                y: client.geometry.y,
            });
            actions.push(CoreAction::Map {
                window: client.window,
            });
        }
        self.should_exit = true;
        actions.push(CoreAction::Exit);
        actions
    }
}
