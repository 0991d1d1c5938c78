//! Protocol-agnostic events and actions.
//!
//! [`CoreEvent`] represents what the display session tells core.
//! [`CoreAction`] represents what core tells the display session to do.

use crate::client::{ClientId, TitleSources, WindowHandle};
use crate::frame::CursorShape;
use crate::input::{Button, Key, Modifiers};
use crate::popup::{PopupHandles, PopupKind};
use crate::state::{Geometry, Point};

/// Windows the display session created at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surfaces {
    pub root: WindowHandle,
    pub panel: WindowHandle,
    pub popups: PopupHandles,
}

/// Events that the display session sends to the core engine.
///
/// The session translates X11 events into these variants, resolving
/// keycodes and gathering window properties beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// A top-level window asked to be mapped.
    MapRequest {
        window: WindowHandle,
        /// Pre-allocated id for the frame, used only if the window gets managed.
        frame: WindowHandle,
        /// `None` when the geometry query failed.
        geometry: Option<Geometry>,
        title: TitleSources,
    },

    /// A window was unmapped.
    UnmapNotify { window: WindowHandle },

    /// A window was destroyed.
    DestroyNotify { window: WindowHandle },

    /// Pointer button press. `window` is the event window.
    ButtonPress {
        window: WindowHandle,
        button: Button,
        root: Point,
    },

    ButtonRelease {
        window: WindowHandle,
        button: Button,
        root: Point,
    },

    /// Pointer moved to an absolute position.
    Motion { window: WindowHandle, root: Point },

    /// A key was pressed (already resolved to a symbolic key).
    KeyPress { key: Key, modifiers: Modifiers },

    /// Part of a window needs repainting.
    Expose { window: WindowHandle },

    /// A managed application window asked for a new size.
    ConfigureRequest {
        window: WindowHandle,
        width: u32,
        height: u32,
    },

    /// A managed window's name properties changed.
    TitleChanged {
        window: WindowHandle,
        title: TitleSources,
    },

    /// The wall-clock second changed.
    Tick,
}

/// Actions that core returns to the display session for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreAction {
    /// Create a frame window with the pre-allocated handle.
    CreateFrame {
        frame: WindowHandle,
        geometry: Geometry,
    },

    Reparent {
        window: WindowHandle,
        parent: WindowHandle,
        x: i32,
        y: i32,
    },

    MoveResize {
        window: WindowHandle,
        geometry: Geometry,
    },

    Move {
        window: WindowHandle,
        x: i32,
        y: i32,
    },

    Resize {
        window: WindowHandle,
        width: u32,
        height: u32,
    },

    Map { window: WindowHandle },

    Unmap { window: WindowHandle },

    Raise { window: WindowHandle },

    Lower { window: WindowHandle },

    Destroy { window: WindowHandle },

    /// Give keyboard focus to a window.
    Focus { window: WindowHandle },

    SetCursor {
        window: WindowHandle,
        shape: CursorShape,
    },

    /// Grab the pointer on the root window for button presses.
    GrabPointer,

    UngrabPointer,

    GrabKeyboard,

    UngrabKeyboard,

    /// Politely ask a client to close. Clients outside the close
    /// protocol are left running; their window is merely hidden.
    RequestClose { window: WindowHandle },

    /// Forcefully terminate the client's connection.
    KillClient { window: WindowHandle },

    /// Run a shell command in its own process group; show `feedback` as a
    /// toast if it started.
    Spawn {
        command: String,
        feedback: Option<String>,
    },

    RedrawFrame { client: ClientId },

    RedrawPanel,

    RedrawPopup { kind: PopupKind },

    /// Position, map and raise a popup, fading it in.
    ShowPopup {
        kind: PopupKind,
        window: WindowHandle,
        geometry: Geometry,
    },

    /// Fade out and unmap a popup.
    HidePopup {
        kind: PopupKind,
        window: WindowHandle,
    },

    /// Show a transient notification.
    Notify { message: String },

    /// Cover the screen and grab all input.
    Lock,

    Unlock,

    /// Write the pinned-app list to disk.
    PersistPinned,

    /// The session should exit.
    Exit,
}
