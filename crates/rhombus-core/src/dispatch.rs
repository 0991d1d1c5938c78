//! Pointer and keyboard dispatch.
//!
//! A press is offered to surfaces in stacking order: the visible popup,
//! then the panel, then client frames, then the desktop.

use tracing::{debug, info};

use crate::client::{ClientId, TitleButton, WindowHandle};
use crate::event::CoreAction;
use crate::frame::CursorShape;
use crate::input::{Button, HotkeyAction, Key, Modifiers};
use crate::launcher::{LauncherHit, SCROLL_STEP};
use crate::panel::PanelTarget;
use crate::popup::{
    self, ControlMenuItem, PinnedMenuItem, PopupKind, PopupTarget, SystemMenuItem,
};
use crate::state::{Geometry, Mode, Point};
use crate::Core;

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Popup(PopupKind),
    Panel,
    Frame(ClientId),
    Desktop,
}

fn notify(message: &str) -> CoreAction {
    CoreAction::Notify {
        message: message.to_string(),
    }
}

impl Core {
    // ── Classification ───────────────────────────────────────────────

    /// Classify a pointer event by its event window, falling back to root
    /// coordinates when the event was reported on the root (always the
    /// case while a popup holds the grab).
    pub fn surface_at(&self, window: WindowHandle, root: Point) -> Surface {
        if window != self.surfaces.root {
            if let Some(kind) = self.popups.kind_for_handle(window) {
                if self.popups.get(kind).visible {
                    return Surface::Popup(kind);
                }
            } else if window == self.surfaces.panel {
                return Surface::Panel;
            } else if let Some(id) = self
                .registry
                .find_by_frame(window)
                .or_else(|| self.registry.find_by_window(window))
            {
                return Surface::Frame(id);
            }
        }

        if let Some(kind) = self.popups.visible() {
            if self.popups.get(kind).geometry.contains(root.x, root.y) {
                return Surface::Popup(kind);
            }
        }
        if self.panel_geometry().contains(root.x, root.y) {
            return Surface::Panel;
        }
        match self.registry.topmost_at(root.x, root.y) {
            Some(id) => Surface::Frame(id),
            None => Surface::Desktop,
        }
    }

    fn panel_target_at(&self, root: Point) -> Option<PanelTarget> {
        let panel = self.panel_geometry();
        if !panel.contains(root.x, root.y) {
            return None;
        }
        self.panel_layout().hit_test(panel.local(root))
    }

    // ── Popups ───────────────────────────────────────────────────────

    fn show_menu(
        &mut self,
        kind: PopupKind,
        anchor_x: i32,
        target: Option<PopupTarget>,
    ) -> Vec<CoreAction> {
        let geometry = popup::menu_geometry(kind, anchor_x, self.panel_geometry(), self.metrics());
        debug!("Showing {:?} at {:?}", kind, geometry);
        self.popups.show(kind, geometry, target)
    }

    fn show_launcher(&mut self, at: Point) -> Vec<CoreAction> {
        let geometry =
            popup::launcher_geometry(at, self.screen, self.panel_geometry(), self.metrics());
        debug!("Showing launcher at {:?}", geometry);
        self.launcher.set_hover(None);
        self.popups.show(PopupKind::Launcher, geometry, None)
    }

    pub(crate) fn hide_popup(&mut self, kind: PopupKind) -> Vec<CoreAction> {
        let actions = self.popups.hide(kind);
        if kind == PopupKind::Launcher && !actions.is_empty() {
            self.launcher.reset();
        }
        actions
    }

    pub(crate) fn hide_all_popups(&mut self) -> Vec<CoreAction> {
        PopupKind::ALL
            .into_iter()
            .flat_map(|kind| self.hide_popup(kind))
            .collect()
    }

    // ── Button press ─────────────────────────────────────────────────

    pub(crate) fn on_button_press(
        &mut self,
        window: WindowHandle,
        button: Button,
        root: Point,
    ) -> Vec<CoreAction> {
        if self.mode == Mode::Locked {
            return self.unlock();
        }
        if !self.mode.is_idle() {
            return Vec::new();
        }

        let had_popup = self.popups.any_visible();
        let mut actions = Vec::new();

        if let Some(kind) = self.popups.visible() {
            let geometry = self.popups.get(kind).geometry;
            if geometry.contains(root.x, root.y) {
                return self.popup_press(kind, geometry.local(root), button);
            }
            debug!("Click outside {:?}, dismissing", kind);
            actions.extend(self.hide_popup(kind));
            // The click that closes the system menu must not reopen it.
            if kind == PopupKind::SystemMenu
                && self.panel_target_at(root) == Some(PanelTarget::SystemMenu)
            {
                return actions;
            }
        }

        match self.surface_at(window, root) {
            Surface::Panel => actions.extend(self.panel_press(root, button, had_popup)),
            Surface::Frame(id) => actions.extend(self.frame_press(id, root, button)),
            Surface::Desktop => {
                if button == Button::Secondary || (button == Button::Primary && !had_popup) {
                    actions.extend(self.show_launcher(root));
                }
            },
            Surface::Popup(_) => {},
        }
        actions
    }

    fn panel_press(&mut self, root: Point, button: Button, had_popup: bool) -> Vec<CoreAction> {
        let layout = self.panel_layout();
        let local = self.panel_geometry().local(root);
        let target = layout.hit_test(local);
        let anchor = |t: PanelTarget| layout.slot(t).map_or(local.x, |s| s.x);
        debug!("Panel press {:?} on {:?}", button, target);

        match (target, button) {
            (Some(PanelTarget::Pinned(pid)), Button::Primary) => self.launch_pinned(pid),
            (Some(t @ PanelTarget::Pinned(pid)), Button::Secondary) => self.show_menu(
                PopupKind::PinnedMenu,
                anchor(t),
                Some(PopupTarget::Pinned(pid)),
            ),
            (Some(t @ PanelTarget::SystemMenu), Button::Primary) => {
                self.show_menu(PopupKind::SystemMenu, anchor(t), None)
            },
            (Some(PanelTarget::Client(id)), Button::Primary) => self.activate_from_panel(id),
            (Some(t @ PanelTarget::Client(id)), Button::Secondary) => self.show_menu(
                PopupKind::ControlMenu,
                anchor(t),
                Some(PopupTarget::Client(id)),
            ),
            (None, Button::Primary) if !had_popup => {
                self.mode = Mode::PanelDragging { origin: root };
                Vec::new()
            },
            _ => Vec::new(),
        }
    }

    fn frame_press(&mut self, id: ClientId, root: Point, button: Button) -> Vec<CoreAction> {
        let Some(client) = self.registry.get(id) else {
            return Vec::new();
        };
        let (frame, geometry, fullscreen) = (client.frame, client.geometry, client.is_fullscreen());
        let local = geometry.local(root);
        let m = &self.config.metrics;

        if button == Button::Primary {
            if let Some(edge) = m.resize_edge_at(geometry.width, geometry.height, local) {
                debug!("Resizing {} from {:?}", id, edge);
                self.mode = Mode::WindowResizing {
                    client: id,
                    edge,
                    origin: root,
                    start: geometry,
                };
                return vec![CoreAction::SetCursor {
                    window: frame,
                    shape: edge.cursor(),
                }];
            }
        }
        if button != Button::Primary || !m.in_titlebar(local) {
            return Vec::new();
        }

        match m.title_button_at(local) {
            Some(TitleButton::Close) => {
                let mut actions = vec![notify("Closing window...")];
                actions.extend(self.close_window(id));
                actions
            },
            Some(TitleButton::Minimize) => {
                let mut actions = vec![notify("Window minimized")];
                actions.extend(self.lower_window(id));
                actions
            },
            Some(TitleButton::Maximize) => {
                let mut actions = vec![notify(if fullscreen {
                    "Window restored"
                } else {
                    "Window maximized"
                })];
                actions.extend(self.toggle_fullscreen(id));
                actions
            },
            None => {
                debug!("Dragging {}", id);
                let mut actions = self.raise_and_focus(id);
                self.mode = Mode::WindowDragging {
                    client: id,
                    origin: root,
                    offset: local,
                    last: root,
                };
                actions.push(CoreAction::SetCursor {
                    window: frame,
                    shape: CursorShape::Move,
                });
                actions
            },
        }
    }

    fn popup_press(&mut self, kind: PopupKind, local: Point, button: Button) -> Vec<CoreAction> {
        if kind == PopupKind::Launcher {
            return self.launcher_press(local, button);
        }
        if !matches!(button, Button::Primary | Button::Secondary) {
            return Vec::new();
        }

        let popup = self.popups.get(kind);
        let item = popup.item_at(local.y, self.config.metrics.menu_item_height);
        let target = popup.target;
        debug!("{:?} item {:?} clicked", kind, item);

        // Hide first so the action sees the grab released.
        let mut actions = self.hide_popup(kind);
        if let Some(item) = item {
            actions.extend(self.menu_action(kind, item, target));
        }
        actions
    }

    fn launcher_press(&mut self, local: Point, button: Button) -> Vec<CoreAction> {
        let Geometry { width, height, .. } = self.popups.get(PopupKind::Launcher).geometry;
        let redraw = CoreAction::RedrawPopup {
            kind: PopupKind::Launcher,
        };

        match button {
            Button::ScrollUp => {
                self.launcher.scroll_by(-SCROLL_STEP, height);
                return vec![redraw];
            },
            Button::ScrollDown => {
                self.launcher.scroll_by(SCROLL_STEP, height);
                return vec![redraw];
            },
            Button::Primary | Button::Secondary => {},
            _ => return Vec::new(),
        }

        match self.launcher.hit_test(local, width, height) {
            Some(LauncherHit::SearchBox) => {
                let mut actions = vec![redraw];
                if self.launcher.toggle_search_mode() {
                    actions.push(notify("Search mode activated - type to search"));
                }
                actions
            },
            Some(LauncherHit::Category(index)) => {
                self.launcher.toggle_category(index);
                vec![redraw]
            },
            Some(LauncherHit::App { category, app }) => {
                let entry = self
                    .launcher
                    .app(category, app)
                    .map(|a| (a.name.clone(), a.command.clone()));
                let mut actions = self.hide_popup(PopupKind::Launcher);
                if let Some((name, command)) = entry {
                    info!("Launching {:?}: {}", name, command);
                    actions.push(CoreAction::Spawn {
                        command,
                        feedback: Some("Application launched".into()),
                    });
                }
                actions
            },
            None => self.hide_popup(PopupKind::Launcher),
        }
    }

    fn menu_action(
        &mut self,
        kind: PopupKind,
        item: usize,
        target: Option<PopupTarget>,
    ) -> Vec<CoreAction> {
        match kind {
            PopupKind::SystemMenu => match SystemMenuItem::from_index(item) {
                Some(SystemMenuItem::Terminal) => vec![CoreAction::Spawn {
                    command: self.config.general.terminal.clone(),
                    feedback: Some("Terminal launched".into()),
                }],
                Some(SystemMenuItem::Lock) => self.lock(),
                Some(SystemMenuItem::Logout) => {
                    let mut actions = vec![notify("Logging out...")];
                    actions.extend(self.logout());
                    actions
                },
                Some(SystemMenuItem::Shutdown) => vec![
                    notify("Shutting down..."),
                    CoreAction::Spawn {
                        command: self.config.general.shutdown_command.clone(),
                        feedback: None,
                    },
                ],
                None => Vec::new(),
            },

            PopupKind::ControlMenu => {
                let Some(PopupTarget::Client(id)) = target else {
                    return Vec::new();
                };
                if !self.registry.contains(id) {
                    debug!("Control menu target {} is gone", id);
                    return Vec::new();
                }
                match ControlMenuItem::from_index(item) {
                    Some(ControlMenuItem::Pin) => self.pin_client(id),
                    Some(ControlMenuItem::MaximizeRestore) => {
                        let mut actions = self.toggle_fullscreen(id);
                        let fullscreen = self.registry.get(id).is_some_and(|c| c.is_fullscreen());
                        actions.push(notify(if fullscreen {
                            "Window maximized"
                        } else {
                            "Window restored"
                        }));
                        actions
                    },
                    Some(ControlMenuItem::Minimize) => {
                        let mut actions = self.lower_window(id);
                        actions.push(notify("Window minimized"));
                        actions
                    },
                    Some(ControlMenuItem::Close) => {
                        let mut actions = self.close_window(id);
                        actions.push(notify("Window closed"));
                        actions
                    },
                    None => Vec::new(),
                }
            },

            PopupKind::PinnedMenu => {
                let Some(PopupTarget::Pinned(pid)) = target else {
                    return Vec::new();
                };
                match PinnedMenuItem::from_index(item) {
                    Some(PinnedMenuItem::Unpin) => self.unpin(pid),
                    Some(PinnedMenuItem::Launch) => self.launch_pinned(pid),
                    None => Vec::new(),
                }
            },

            PopupKind::Launcher => Vec::new(),
        }
    }

    // ── Motion ───────────────────────────────────────────────────────

    pub(crate) fn on_motion(&mut self, window: WindowHandle, root: Point) -> Vec<CoreAction> {
        match self.mode {
            Mode::WindowDragging {
                client,
                origin,
                offset,
                last,
            } => {
                self.mode = Mode::WindowDragging {
                    client,
                    origin,
                    offset,
                    last: root,
                };
                self.drag_by(client, root.x - last.x, root.y - last.y)
            },
            Mode::WindowResizing {
                client,
                edge,
                origin,
                start,
            } => {
                let g = self
                    .config
                    .metrics
                    .resize(edge, start, root.x - origin.x, root.y - origin.y);
                self.apply_geometry(client, g)
            },
            Mode::Idle => self.update_hover(window, root),
            Mode::PanelDragging { .. } | Mode::Locked => Vec::new(),
        }
    }

    fn drag_by(&mut self, id: ClientId, dx: i32, dy: i32) -> Vec<CoreAction> {
        let usable = self.usable_area();
        let Some(current) = self.registry.get(id).map(|c| c.geometry) else {
            self.mode = Mode::Idle;
            return Vec::new();
        };
        let moved = Geometry {
            x: current.x + dx,
            y: current.y + dy,
            ..current
        };
        let p = self.config.metrics.clamp_drag(moved, usable);
        if p == Point::new(current.x, current.y) {
            return Vec::new();
        }
        self.move_window(id, p.x, p.y)
    }

    /// Move and resize to `g`, emitting only what changed.
    fn apply_geometry(&mut self, id: ClientId, g: Geometry) -> Vec<CoreAction> {
        let Some(current) = self.registry.get(id).map(|c| c.geometry) else {
            self.mode = Mode::Idle;
            return Vec::new();
        };
        let mut actions = Vec::new();
        if (g.x, g.y) != (current.x, current.y) {
            actions.extend(self.move_window(id, g.x, g.y));
        }
        if (g.width, g.height) != (current.width, current.height) {
            actions.extend(self.resize_window(id, g.width, g.height));
        }
        actions
    }

    /// Track hover on popups, the panel and titlebar glyphs, redrawing
    /// only what changed.
    fn update_hover(&mut self, window: WindowHandle, root: Point) -> Vec<CoreAction> {
        let surface = self.surface_at(window, root);
        let mut actions = Vec::new();

        if let Some(kind) = self.popups.visible() {
            let geometry = self.popups.get(kind).geometry;
            let local = geometry.local(root);
            let inside = surface == Surface::Popup(kind);
            let changed = if kind == PopupKind::Launcher {
                let hit = if inside {
                    self.launcher.hit_test(local, geometry.width, geometry.height)
                } else {
                    None
                };
                self.launcher.set_hover(hit)
            } else {
                let item_height = self.config.metrics.menu_item_height;
                let popup = self.popups.get_mut(kind);
                let item = if inside {
                    popup.item_at(local.y, item_height)
                } else {
                    None
                };
                popup.set_hover(item)
            };
            if changed {
                actions.push(CoreAction::RedrawPopup { kind });
            }
        }

        let panel_hover = if surface == Surface::Panel {
            self.panel_target_at(root)
        } else {
            None
        };
        if panel_hover != self.panel_hover {
            self.panel_hover = panel_hover;
            actions.push(CoreAction::RedrawPanel);
        }

        let hovered = match surface {
            Surface::Frame(id) => Some(id),
            _ => None,
        };
        let m = &self.config.metrics;
        for client in self.registry.iter_mut() {
            let hover = if Some(client.id) == hovered {
                let local = client.geometry.local(root);
                if m.in_titlebar(local) {
                    m.title_button_at(local)
                } else {
                    None
                }
            } else {
                None
            };
            if client.set_hover(hover) {
                actions.push(CoreAction::RedrawFrame { client: client.id });
            }
        }
        actions
    }

    // ── Button release ───────────────────────────────────────────────

    pub(crate) fn on_button_release(&mut self, button: Button) -> Vec<CoreAction> {
        if matches!(button, Button::ScrollUp | Button::ScrollDown) {
            return Vec::new();
        }
        match self.mode {
            Mode::Locked | Mode::Idle => Vec::new(),
            Mode::PanelDragging { .. } => {
                self.mode = Mode::Idle;
                Vec::new()
            },
            Mode::WindowDragging { client, .. } => {
                self.mode = Mode::Idle;
                self.finish_drag(client)
            },
            Mode::WindowResizing { client, .. } => {
                self.mode = Mode::Idle;
                match self.registry.get(client) {
                    Some(c) => vec![CoreAction::SetCursor {
                        window: c.frame,
                        shape: CursorShape::Normal,
                    }],
                    None => Vec::new(),
                }
            },
        }
    }

    /// Snap a released frame to nearby screen edges.
    fn finish_drag(&mut self, id: ClientId) -> Vec<CoreAction> {
        let usable = self.usable_area();
        let Some((frame, g)) = self.registry.get(id).map(|c| (c.frame, c.geometry)) else {
            return Vec::new();
        };
        let mut actions = vec![CoreAction::SetCursor {
            window: frame,
            shape: CursorShape::Normal,
        }];
        let p = self.config.metrics.snap(g, usable);
        if p != Point::new(g.x, g.y) {
            debug!("Snapping {} to {:?}", id, p);
            actions.extend(self.move_window(id, p.x, p.y));
        }
        actions
    }

    // ── Keyboard ─────────────────────────────────────────────────────

    pub(crate) fn on_key_press(&mut self, key: Key, modifiers: Modifiers) -> Vec<CoreAction> {
        if self.mode == Mode::Locked {
            return self.unlock();
        }

        if self.popups.get(PopupKind::Launcher).visible {
            if self.launcher.search_mode() {
                return self.search_key(key);
            }
            if key == Key::Escape && modifiers.without_locks().is_empty() {
                return self.hide_popup(PopupKind::Launcher);
            }
        }

        let Some(action) = self.hotkeys.lookup(modifiers, key) else {
            debug!("Unbound key {:?} with {:?}", key, modifiers);
            return Vec::new();
        };
        let Some(id) = self
            .focus
            .focused
            .filter(|&id| self.registry.contains(id))
            .or_else(|| self.registry.last())
        else {
            return Vec::new();
        };
        debug!("Hotkey {:?} on {}", action, id);

        match action {
            HotkeyAction::ToggleFullscreen => {
                let fullscreen = self.registry.get(id).is_some_and(|c| c.is_fullscreen());
                let mut actions = vec![notify(if fullscreen {
                    "Exiting fullscreen"
                } else {
                    "Entering fullscreen"
                })];
                actions.extend(self.toggle_fullscreen(id));
                actions
            },
            HotkeyAction::Lower => {
                let mut actions = vec![notify("Window lowered")];
                actions.extend(self.lower_window(id));
                actions
            },
            HotkeyAction::ForceClose => match self.registry.get(id) {
                Some(client) => vec![
                    notify("Closing window"),
                    CoreAction::KillClient {
                        window: client.window,
                    },
                ],
                None => Vec::new(),
            },
        }
    }

    fn search_key(&mut self, key: Key) -> Vec<CoreAction> {
        let redraw = CoreAction::RedrawPopup {
            kind: PopupKind::Launcher,
        };
        match key {
            Key::Escape => {
                self.launcher.cancel_search();
                vec![redraw]
            },
            Key::Return => {
                let found = self
                    .launcher
                    .first_match()
                    .map(|a| (a.name.clone(), a.command.clone()));
                match found {
                    Some((name, command)) => {
                        info!("Launching search result {:?}: {}", name, command);
                        let mut actions = self.hide_popup(PopupKind::Launcher);
                        actions.push(CoreAction::Spawn {
                            command,
                            feedback: Some("Launched application".into()),
                        });
                        actions
                    },
                    None if self.launcher.search().is_empty() => Vec::new(),
                    None => vec![notify("No matching applications found")],
                }
            },
            Key::Backspace => {
                self.launcher.pop_char();
                vec![redraw]
            },
            _ => match key.printable() {
                Some(c) => {
                    self.launcher.push_char(c);
                    vec![redraw]
                },
                None => Vec::new(),
            },
        }
    }
}
