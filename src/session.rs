//! X11 display session
//!
//! Owns the server connection and the manager's own surfaces (panel,
//! popups, toast, lock screen). Server events are translated into
//! [`CoreEvent`]s; the [`CoreAction`]s the core returns are applied here.

use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, Timelike};
use rhombus_core::client::TitleSources;
use rhombus_core::config::Config;
use rhombus_core::event::{CoreAction, CoreEvent, Surfaces};
use rhombus_core::frame::CursorShape;
use rhombus_core::input::Button;
use rhombus_core::launcher::Launcher;
use rhombus_core::pinned::{self, PinnedApps};
use rhombus_core::popup::{PopupHandles, PopupKind};
use rhombus_core::{Core, Geometry, Point, WindowHandle};
use thiserror::Error;
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConfigWindow,
    ConfigureRequestEvent, ConfigureWindowAux, ConnectionExt, CreateWindowAux, Cursor, EventMask,
    Grab, GrabMode, GrabStatus, InputFocus, MapState, Mapping, ModMask, SetMode, StackMode,
    Window, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE};

use crate::keymap::{mod_mask, Keymap};
use crate::render::{redraw_client, Painter, Palette};
use crate::spawn::Spawner;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        _NET_WM_NAME,
        UTF8_STRING,
    }
}

/// Display session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to connect to the X server: {0}")]
    Connect(#[from] ConnectError),

    #[error("X connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X request failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("X request failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),

    #[error("Another window manager is already running")]
    AnotherWm,
}

// Cursor font glyphs
const XC_FLEUR: u16 = 52;
const XC_LEFT_PTR: u16 = 68;
const XC_SB_H_DOUBLE_ARROW: u16 = 108;
const XC_SB_V_DOUBLE_ARROW: u16 = 116;
const XC_TOP_LEFT_CORNER: u16 = 134;
const XC_TOP_RIGHT_CORNER: u16 = 136;

fn frame_events() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::BUTTON_PRESS
        | EventMask::BUTTON_RELEASE
        | EventMask::POINTER_MOTION
        | EventMask::LEAVE_WINDOW
        | EventMask::EXPOSURE
}

fn surface_events() -> EventMask {
    EventMask::EXPOSURE
        | EventMask::BUTTON_PRESS
        | EventMask::BUTTON_RELEASE
        | EventMask::POINTER_MOTION
        | EventMask::LEAVE_WINDOW
}

const fn handle(window: Window) -> WindowHandle {
    WindowHandle(window)
}

fn point(x: i16, y: i16) -> Point {
    Point::new(i32::from(x), i32::from(y))
}

/// Pointer shapes installed on frames.
struct Cursors {
    normal: Cursor,
    moving: Cursor,
    horizontal: Cursor,
    vertical: Cursor,
    main_diagonal: Cursor,
    anti_diagonal: Cursor,
}

impl Cursors {
    fn new(conn: &RustConnection) -> Result<Self, ReplyOrIdError> {
        let font = conn.generate_id()?;
        conn.open_font(font, b"cursor")?;
        let glyph = |shape: u16| -> Result<Cursor, ReplyOrIdError> {
            let cursor = conn.generate_id()?;
            conn.create_glyph_cursor(
                cursor,
                font,
                font,
                shape,
                shape + 1,
                0,
                0,
                0,
                0xffff,
                0xffff,
                0xffff,
            )?;
            Ok(cursor)
        };
        let cursors = Self {
            normal: glyph(XC_LEFT_PTR)?,
            moving: glyph(XC_FLEUR)?,
            horizontal: glyph(XC_SB_H_DOUBLE_ARROW)?,
            vertical: glyph(XC_SB_V_DOUBLE_ARROW)?,
            main_diagonal: glyph(XC_TOP_LEFT_CORNER)?,
            anti_diagonal: glyph(XC_TOP_RIGHT_CORNER)?,
        };
        conn.close_font(font)?;
        Ok(cursors)
    }

    const fn get(&self, shape: CursorShape) -> Cursor {
        match shape {
            CursorShape::Normal => self.normal,
            CursorShape::Move => self.moving,
            CursorShape::ResizeHorizontal => self.horizontal,
            CursorShape::ResizeVertical => self.vertical,
            CursorShape::ResizeMainDiagonal => self.main_diagonal,
            CursorShape::ResizeAntiDiagonal => self.anti_diagonal,
        }
    }
}

/// The transient notification window.
struct Toast {
    window: Window,
    size: (u32, u32),
    message: String,
    deadline: Option<Instant>,
}

/// A running window manager session on one X screen.
pub struct Session {
    conn: RustConnection,
    root: Window,
    screen: Geometry,
    atoms: Atoms,
    core: Core,
    painter: Painter,
    keymap: Keymap,
    cursors: Cursors,
    spawner: Spawner,
    toast: Toast,
    lock_window: Option<Window>,
    /// Windows reparented while viewable; the unmap that causes is ours.
    reparent_unmaps: HashSet<Window>,
    pinned_path: Option<PathBuf>,
    clock_second: Option<u32>,
    poll_interval: Duration,
}

impl Session {
    /// Connect to the X server and take over the root window.
    pub fn connect(
        config: Config,
        pinned: PinnedApps,
        launcher: Launcher,
    ) -> Result<Self, SessionError> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let screen = conn.setup().roots[screen_num].clone();
        let root = screen.root;
        let geometry = Geometry::new(
            0,
            0,
            u32::from(screen.width_in_pixels),
            u32::from(screen.height_in_pixels),
        );
        info!(
            "Connected to X11, screen {}, root window 0x{:x}, {}x{}",
            screen_num, root, geometry.width, geometry.height
        );

        become_wm(&conn, root)?;
        let atoms = Atoms::new(&conn)?.reply()?;
        let painter = Painter::new(
            &conn,
            root,
            &config.general.font,
            Palette::from_config(&config.colors),
        )?;
        let cursors = Cursors::new(&conn)?;
        let keymap = load_keymap(&conn)?;

        let surfaces = Surfaces {
            root: handle(root),
            panel: handle(conn.generate_id()?),
            popups: PopupHandles {
                system_menu: handle(conn.generate_id()?),
                launcher: handle(conn.generate_id()?),
                control_menu: handle(conn.generate_id()?),
                pinned_menu: handle(conn.generate_id()?),
            },
        };
        let toast_window = conn.generate_id()?;
        let toast_size = (config.toast.width, config.toast.height);
        let pinned_path = config.pinned_path();
        let poll_interval = Duration::from_millis(config.general.poll_interval_ms.max(1));

        let core = Core::new(config, surfaces, geometry)
            .with_pinned(pinned)
            .with_launcher(launcher);

        let palette = painter.palette();
        create_surface(
            &conn,
            root,
            surfaces.panel.0,
            core.panel_geometry(),
            palette.panel.pixel(),
            surface_events(),
        )?;
        for popup in core.popups().iter() {
            create_surface(
                &conn,
                root,
                popup.handle.0,
                Geometry::new(0, 0, 1, 1),
                palette.menu.pixel(),
                surface_events(),
            )?;
        }
        create_surface(
            &conn,
            root,
            toast_window,
            Geometry::new(0, 0, toast_size.0, toast_size.1),
            palette.panel.pixel(),
            EventMask::EXPOSURE,
        )?;
        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().cursor(cursors.normal),
        )?;
        conn.map_window(surfaces.panel.0)?;

        let mut session = Self {
            conn,
            root,
            screen: geometry,
            atoms,
            core,
            painter,
            keymap,
            cursors,
            spawner: Spawner::new(),
            toast: Toast {
                window: toast_window,
                size: toast_size,
                message: String::new(),
                deadline: None,
            },
            lock_window: None,
            reparent_unmaps: HashSet::new(),
            pinned_path,
            clock_second: None,
            poll_interval,
        };

        session.grab_hotkeys()?;
        session.painter.desktop(&session.conn, root, geometry)?;
        session.adopt_existing()?;
        session.conn.flush()?;
        Ok(session)
    }

    /// Run until logout.
    pub fn run(&mut self) -> Result<(), SessionError> {
        info!("Entering event loop");

        while !self.core.should_exit {
            self.tick_clock();
            self.expire_toast()?;
            self.spawner.reap();

            match self.conn.poll_for_event()? {
                Some(event) => {
                    if let Err(e) = self.handle_event(event) {
                        warn!("Error handling event: {}", e);
                    }
                },
                None => thread::sleep(self.poll_interval),
            }
            self.conn.flush()?;
        }

        info!("Exiting window manager");
        self.painter.free(&self.conn)?;
        self.conn.flush()?;
        Ok(())
    }

    // ── Event translation (server → core) ────────────────────────────

    fn handle_event(&mut self, event: Event) -> Result<(), SessionError> {
        let translated = match event {
            Event::MapRequest(e) => {
                debug!("MapRequest for window 0x{:x}", e.window);
                Some(self.map_request(e.window)?)
            },

            Event::UnmapNotify(e) => {
                if self.reparent_unmaps.remove(&e.window) {
                    None
                } else {
                    Some(CoreEvent::UnmapNotify {
                        window: handle(e.window),
                    })
                }
            },

            Event::DestroyNotify(e) => {
                self.reparent_unmaps.remove(&e.window);
                Some(CoreEvent::DestroyNotify {
                    window: handle(e.window),
                })
            },

            Event::ConfigureRequest(e) => self.configure_request(&e)?,

            Event::ButtonPress(e) => Some(CoreEvent::ButtonPress {
                window: handle(e.event),
                button: Button::from_index(e.detail),
                root: point(e.root_x, e.root_y),
            }),

            Event::ButtonRelease(e) => Some(CoreEvent::ButtonRelease {
                window: handle(e.event),
                button: Button::from_index(e.detail),
                root: point(e.root_x, e.root_y),
            }),

            Event::MotionNotify(e) => Some(CoreEvent::Motion {
                window: handle(e.event),
                root: point(e.root_x, e.root_y),
            }),

            // Leaving a frame or the panel clears its hover highlight
            Event::LeaveNotify(e) => Some(CoreEvent::Motion {
                window: handle(e.event),
                root: point(e.root_x, e.root_y),
            }),

            Event::KeyPress(e) => {
                let (key, modifiers) = self.keymap.resolve(e.detail, u16::from(e.state));
                debug!("KeyPress: keycode={}, key={:?}, {:?}", e.detail, key, modifiers);
                Some(CoreEvent::KeyPress { key, modifiers })
            },

            Event::Expose(e) if e.count == 0 => self.expose(e.window)?,

            Event::PropertyNotify(e) => self.property_notify(e.window, e.atom),

            Event::MappingNotify(e) => {
                if e.request != Mapping::POINTER {
                    info!("Keyboard mapping changed, re-grabbing keys");
                    self.keymap = load_keymap(&self.conn)?;
                    self.grab_hotkeys()?;
                }
                None
            },

            _ => None,
        };

        if let Some(event) = translated {
            let actions = self.core.handle_event(event);
            self.apply(actions);
        }
        Ok(())
    }

    fn map_request(&mut self, window: Window) -> Result<CoreEvent, SessionError> {
        let frame = self.conn.generate_id()?;
        let geometry = self
            .conn
            .get_geometry(window)?
            .reply()
            .ok()
            .map(|g| {
                Geometry::new(
                    i32::from(g.x),
                    i32::from(g.y),
                    u32::from(g.width),
                    u32::from(g.height),
                )
            });
        let title = self.fetch_title(window);
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )?;
        Ok(CoreEvent::MapRequest {
            window: handle(window),
            frame: handle(frame),
            geometry,
            title,
        })
    }

    fn configure_request(
        &self,
        e: &ConfigureRequestEvent,
    ) -> Result<Option<CoreEvent>, SessionError> {
        if !self.core.is_managed(handle(e.window)) {
            debug!("Honoring configure request from unmanaged 0x{:x}", e.window);
            let aux = ConfigureWindowAux::from_configure_request(e);
            self.conn.configure_window(e.window, &aux)?;
            return Ok(None);
        }
        let size = u16::from(ConfigWindow::WIDTH | ConfigWindow::HEIGHT);
        if u16::from(e.value_mask) & size == 0 {
            return Ok(None);
        }
        Ok(Some(CoreEvent::ConfigureRequest {
            window: handle(e.window),
            width: u32::from(e.width),
            height: u32::from(e.height),
        }))
    }

    fn expose(&self, window: Window) -> Result<Option<CoreEvent>, SessionError> {
        if window == self.root {
            self.painter.desktop(&self.conn, self.root, self.screen)?;
        } else if window == self.toast.window {
            self.painter
                .toast(&self.conn, window, self.toast.size, &self.toast.message)?;
        } else if Some(window) == self.lock_window {
            self.painter.lock(&self.conn, window, self.screen)?;
        } else {
            return Ok(Some(CoreEvent::Expose {
                window: handle(window),
            }));
        }
        Ok(None)
    }

    fn property_notify(&self, window: Window, atom: Atom) -> Option<CoreEvent> {
        let is_title = atom == self.atoms._NET_WM_NAME || atom == Atom::from(AtomEnum::WM_NAME);
        if !is_title || !self.core.is_managed(handle(window)) {
            return None;
        }
        Some(CoreEvent::TitleChanged {
            window: handle(window),
            title: self.fetch_title(window),
        })
    }

    /// Gather every title candidate; failed queries are simply missing.
    fn fetch_title(&self, window: Window) -> TitleSources {
        let net_wm_name = self
            .property_bytes(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)
            .map(|v| String::from_utf8_lossy(&v).into_owned());
        let wm_name = self
            .property_bytes(window, AtomEnum::WM_NAME.into(), AtomEnum::STRING.into())
            .map(|v| v.into_iter().map(char::from).collect());
        let fetched_name = self
            .property_bytes(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())
            .map(|v| String::from_utf8_lossy(&v).into_owned());
        TitleSources {
            net_wm_name,
            wm_name,
            fetched_name,
        }
    }

    fn property_bytes(&self, window: Window, property: Atom, type_: Atom) -> Option<Vec<u8>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, 1024)
            .ok()?
            .reply()
            .ok()?;
        (!reply.value.is_empty()).then_some(reply.value)
    }

    // ── Action application (core → server) ───────────────────────────

    fn apply(&mut self, actions: Vec<CoreAction>) {
        for action in actions {
            if let Err(e) = self.apply_action(action) {
                warn!("Failed to apply action: {}", e);
            }
        }
    }

    fn apply_action(&mut self, action: CoreAction) -> Result<(), SessionError> {
        match action {
            CoreAction::CreateFrame { frame, geometry } => {
                self.conn.create_window(
                    COPY_DEPTH_FROM_PARENT,
                    frame.0,
                    self.root,
                    geometry.x as i16,
                    geometry.y as i16,
                    geometry.width as u16,
                    geometry.height as u16,
                    0,
                    WindowClass::INPUT_OUTPUT,
                    COPY_FROM_PARENT,
                    &CreateWindowAux::new()
                        .background_pixel(self.painter.palette().frame.pixel())
                        .event_mask(frame_events()),
                )?;
            },

            CoreAction::Reparent {
                window,
                parent,
                x,
                y,
            } => {
                let mode = if parent.0 == self.root {
                    SetMode::DELETE
                } else {
                    SetMode::INSERT
                };
                self.conn.change_save_set(mode, window.0)?;
                self.conn
                    .reparent_window(window.0, parent.0, x as i16, y as i16)?;
            },

            CoreAction::MoveResize { window, geometry } => {
                self.conn.configure_window(
                    window.0,
                    &ConfigureWindowAux::new()
                        .x(geometry.x)
                        .y(geometry.y)
                        .width(geometry.width)
                        .height(geometry.height),
                )?;
            },

            CoreAction::Move { window, x, y } => {
                self.conn
                    .configure_window(window.0, &ConfigureWindowAux::new().x(x).y(y))?;
            },

            CoreAction::Resize {
                window,
                width,
                height,
            } => {
                self.conn.configure_window(
                    window.0,
                    &ConfigureWindowAux::new().width(width).height(height),
                )?;
            },

            CoreAction::Map { window } => {
                self.conn.map_window(window.0)?;
            },

            CoreAction::Unmap { window } => {
                self.conn.unmap_window(window.0)?;
            },

            CoreAction::Raise { window } => {
                self.restack(window.0, StackMode::ABOVE)?;
                // The panel stays above every frame
                self.restack(self.core.surfaces().panel.0, StackMode::ABOVE)?;
            },

            CoreAction::Lower { window } => {
                self.restack(window.0, StackMode::BELOW)?;
            },

            CoreAction::Destroy { window } => {
                self.conn.destroy_window(window.0)?;
            },

            CoreAction::Focus { window } => {
                self.conn
                    .set_input_focus(InputFocus::POINTER_ROOT, window.0, CURRENT_TIME)?;
            },

            CoreAction::SetCursor { window, shape } => {
                self.conn.change_window_attributes(
                    window.0,
                    &ChangeWindowAttributesAux::new().cursor(self.cursors.get(shape)),
                )?;
            },

            CoreAction::GrabPointer => self.grab_pointer()?,

            CoreAction::UngrabPointer => {
                self.conn.ungrab_pointer(CURRENT_TIME)?;
            },

            CoreAction::GrabKeyboard => self.grab_keyboard()?,

            CoreAction::UngrabKeyboard => {
                self.conn.ungrab_keyboard(CURRENT_TIME)?;
            },

            CoreAction::RequestClose { window } => self.close_politely(window.0)?,

            CoreAction::KillClient { window } => {
                info!("Killing client of {}", window);
                self.conn.kill_client(window.0)?;
            },

            CoreAction::Spawn { command, feedback } => match self.spawner.spawn(&command) {
                Ok(()) => {
                    if let Some(message) = feedback {
                        self.show_toast(&message)?;
                    }
                },
                Err(e) => {
                    warn!("Failed to spawn command '{}': {}", command, e);
                    self.show_toast("Failed to launch application")?;
                },
            },

            CoreAction::RedrawFrame { client } => {
                redraw_client(&self.painter, &self.conn, &self.core, client)?;
            },

            CoreAction::RedrawPanel => self.draw_panel()?,

            CoreAction::RedrawPopup { kind } => {
                if self.core.popups().get(kind).visible {
                    self.painter.popup(&self.conn, &self.core, kind)?;
                }
            },

            CoreAction::ShowPopup {
                kind,
                window,
                geometry,
            } => {
                self.conn.configure_window(
                    window.0,
                    &ConfigureWindowAux::new()
                        .x(geometry.x)
                        .y(geometry.y)
                        .width(geometry.width)
                        .height(geometry.height)
                        .stack_mode(StackMode::ABOVE),
                )?;
                self.conn.map_window(window.0)?;
                self.fade(kind, true)?;
            },

            CoreAction::HidePopup { kind, window } => {
                self.fade(kind, false)?;
                self.conn.unmap_window(window.0)?;
            },

            CoreAction::Notify { message } => self.show_toast(&message)?,

            CoreAction::Lock => self.lock_screen()?,

            CoreAction::Unlock => self.unlock_screen()?,

            CoreAction::PersistPinned => self.persist_pinned(),

            CoreAction::Exit => info!("Exit requested"),
        }
        Ok(())
    }

    fn restack(&self, window: Window, mode: StackMode) -> Result<(), SessionError> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(mode))?;
        Ok(())
    }

    /// All pointer events go to the root while a popup or the lock screen is up.
    fn grab_pointer(&self) -> Result<(), SessionError> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                self.root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                CURRENT_TIME,
            )?
            .reply()?;
        if reply.status != GrabStatus::SUCCESS {
            warn!("Pointer grab failed: {:?}", reply.status);
        }
        Ok(())
    }

    fn grab_keyboard(&self) -> Result<(), SessionError> {
        let reply = self
            .conn
            .grab_keyboard(false, self.root, CURRENT_TIME, GrabMode::ASYNC, GrabMode::ASYNC)?
            .reply()?;
        if reply.status != GrabStatus::SUCCESS {
            warn!("Keyboard grab failed: {:?}", reply.status);
        }
        Ok(())
    }

    /// Ask politely through `WM_DELETE_WINDOW`. Windows that don't take part
    /// in the protocol stay hidden and alive.
    fn close_politely(&self, window: Window) -> Result<(), SessionError> {
        match delete_request(&self.atoms, window, &self.protocols(window)) {
            Some(event) => {
                debug!("Using WM_DELETE_WINDOW protocol for 0x{:x}", window);
                self.conn
                    .send_event(false, window, EventMask::NO_EVENT, event)?;
            },
            None => debug!("0x{:x} doesn't support WM_DELETE_WINDOW, leaving it hidden", window),
        }
        Ok(())
    }

    fn protocols(&self, window: Window) -> Vec<Atom> {
        let Ok(cookie) =
            self.conn
                .get_property(false, window, self.atoms.WM_PROTOCOLS, AtomEnum::ATOM, 0, 32)
        else {
            return Vec::new();
        };
        cookie
            .reply()
            .ok()
            .and_then(|reply| reply.value32().map(Iterator::collect))
            .unwrap_or_default()
    }

    // ── Drawing ──────────────────────────────────────────────────────

    fn draw_panel(&self) -> Result<(), SessionError> {
        let clock = Local::now().format("%H:%M").to_string();
        self.painter
            .panel(&self.conn, self.core.surfaces().panel.0, &self.core, &clock)?;
        Ok(())
    }

    /// Step a popup's opacity, repainting synchronously between steps.
    fn fade(&mut self, kind: PopupKind, fade_in: bool) -> Result<(), SessionError> {
        let animation = self.core.config().animation.clone();
        if !animation.enabled || animation.steps == 0 {
            self.core.set_popup_fade(kind, if fade_in { 1.0 } else { 0.0 });
            if fade_in {
                self.painter.popup(&self.conn, &self.core, kind)?;
            }
            return Ok(());
        }

        let delay = Duration::from_millis(if fade_in {
            animation.fade_in_delay_ms
        } else {
            animation.fade_out_delay_ms
        });
        for step in 0..=animation.steps {
            let t = step as f32 / animation.steps as f32;
            self.core
                .set_popup_fade(kind, if fade_in { t } else { 1.0 - t });
            self.painter.popup(&self.conn, &self.core, kind)?;
            self.conn.flush()?;
            thread::sleep(delay);
        }
        Ok(())
    }

    fn tick_clock(&mut self) {
        let second = Local::now().second();
        if self.clock_second != Some(second) {
            self.clock_second = Some(second);
            let actions = self.core.handle_event(CoreEvent::Tick);
            self.apply(actions);
        }
    }

    // ── Toasts ───────────────────────────────────────────────────────

    fn show_toast(&mut self, message: &str) -> Result<(), SessionError> {
        info!("Toast: {}", message);
        let config = &self.core.config().toast;
        if !config.enabled {
            return Ok(());
        }
        let (width, height) = (config.width, config.height);
        let deadline = Instant::now() + Duration::from_millis(config.duration_ms);

        self.conn.configure_window(
            self.toast.window,
            &ConfigureWindowAux::new()
                .x(self.screen.width as i32 / 2 - width as i32 / 2)
                .y(self.screen.height as i32 / 2)
                .width(width)
                .height(height)
                .stack_mode(StackMode::ABOVE),
        )?;
        self.conn.map_window(self.toast.window)?;
        self.toast.size = (width, height);
        self.toast.message = message.to_string();
        self.toast.deadline = Some(deadline);
        self.painter
            .toast(&self.conn, self.toast.window, self.toast.size, message)?;
        Ok(())
    }

    fn expire_toast(&mut self) -> Result<(), SessionError> {
        if self.toast.deadline.is_some_and(|d| Instant::now() >= d) {
            self.toast.deadline = None;
            self.conn.unmap_window(self.toast.window)?;
        }
        Ok(())
    }

    // ── Lock screen ──────────────────────────────────────────────────

    fn lock_screen(&mut self) -> Result<(), SessionError> {
        let window = self.conn.generate_id()?;
        create_surface(
            &self.conn,
            self.root,
            window,
            self.screen,
            self.painter.palette().lock.pixel(),
            EventMask::EXPOSURE,
        )?;
        self.conn.map_window(window)?;
        self.restack(window, StackMode::ABOVE)?;
        self.lock_window = Some(window);
        self.grab_keyboard()?;
        self.grab_pointer()?;
        self.painter.lock(&self.conn, window, self.screen)?;
        Ok(())
    }

    fn unlock_screen(&mut self) -> Result<(), SessionError> {
        self.conn.ungrab_keyboard(CURRENT_TIME)?;
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        if let Some(window) = self.lock_window.take() {
            self.conn.destroy_window(window)?;
        }
        Ok(())
    }

    // ── Setup helpers ────────────────────────────────────────────────

    fn grab_hotkeys(&self) -> Result<(), SessionError> {
        self.conn.ungrab_key(Grab::ANY, self.root, ModMask::ANY)?;
        // Grab with and without NumLock/CapsLock to handle those states
        let locks = [
            ModMask::from(0u16),
            ModMask::LOCK,
            ModMask::M2,
            ModMask::LOCK | ModMask::M2,
        ];
        for binding in self.core.hotkeys().bindings() {
            let Some(keycode) = self.keymap.keycode_for(binding.key) else {
                warn!("Could not find keycode for {:?}", binding.key);
                continue;
            };
            let modifiers = mod_mask(binding.modifiers);
            for extra in locks {
                self.conn.grab_key(
                    false,
                    self.root,
                    modifiers | extra,
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }
            debug!("Grabbed {:?} (keycode {})", binding, keycode);
        }
        Ok(())
    }

    /// Manage windows that were already mapped before we started.
    fn adopt_existing(&mut self) -> Result<(), SessionError> {
        let tree = self.conn.query_tree(self.root)?.reply()?;
        let ours: HashSet<Window> = [self.core.surfaces().panel.0, self.toast.window]
            .into_iter()
            .chain(self.core.popups().iter().map(|p| p.handle.0))
            .collect();

        for window in tree.children {
            if ours.contains(&window) {
                continue;
            }
            let Ok(attrs) = self.conn.get_window_attributes(window)?.reply() else {
                continue;
            };
            if attrs.override_redirect || attrs.map_state != MapState::VIEWABLE {
                continue;
            }
            info!("Adopting existing window 0x{:x}", window);
            self.reparent_unmaps.insert(window);
            let event = self.map_request(window)?;
            let actions = self.core.handle_event(event);
            self.apply(actions);
            if !self.core.is_managed(handle(window)) {
                self.reparent_unmaps.remove(&window);
            }
        }
        Ok(())
    }

    fn persist_pinned(&self) {
        let Some(path) = &self.pinned_path else {
            return;
        };
        match pinned::save(path, self.core.pinned()) {
            Ok(()) => debug!("Saved {} pinned apps to {:?}", self.core.pinned().len(), path),
            Err(e) => warn!("Failed to save pinned apps to {:?}: {}", path, e),
        }
    }
}

/// `WM_DELETE_WINDOW` message for a window advertising it in `WM_PROTOCOLS`.
fn delete_request(atoms: &Atoms, window: Window, protocols: &[Atom]) -> Option<ClientMessageEvent> {
    protocols.contains(&atoms.WM_DELETE_WINDOW).then(|| {
        ClientMessageEvent::new(
            32,
            window,
            atoms.WM_PROTOCOLS,
            [atoms.WM_DELETE_WINDOW, CURRENT_TIME, 0, 0, 0],
        )
    })
}

/// Become the window manager by requesting SubstructureRedirect on root
fn become_wm(conn: &RustConnection, root: Window) -> Result<(), SessionError> {
    let event_mask = EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::BUTTON_PRESS
        | EventMask::EXPOSURE;
    let cookie = conn.change_window_attributes(
        root,
        &ChangeWindowAttributesAux::new().event_mask(event_mask),
    )?;
    match cookie.check() {
        Ok(()) => {
            info!("Successfully became the window manager");
            Ok(())
        },
        Err(ReplyError::X11Error(e)) => {
            debug!("SubstructureRedirect refused: {:?}", e);
            Err(SessionError::AnotherWm)
        },
        Err(e) => Err(e.into()),
    }
}

fn load_keymap(conn: &RustConnection) -> Result<Keymap, SessionError> {
    let setup = conn.setup();
    let (min, max) = (setup.min_keycode, setup.max_keycode);
    let reply = conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
    Ok(Keymap::new(min, reply))
}

/// Create one of the manager's own override-redirect windows.
fn create_surface(
    conn: &RustConnection,
    root: Window,
    window: Window,
    g: Geometry,
    background: u32,
    events: EventMask,
) -> Result<(), ConnectionError> {
    conn.create_window(
        COPY_DEPTH_FROM_PARENT,
        window,
        root,
        g.x as i16,
        g.y as i16,
        g.width.max(1) as u16,
        g.height.max(1) as u16,
        0,
        WindowClass::INPUT_OUTPUT,
        COPY_FROM_PARENT,
        &CreateWindowAux::new()
            .background_pixel(background)
            .override_redirect(1)
            .event_mask(events),
    )?;
    Ok(())
}
