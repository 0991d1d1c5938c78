//! Core-only integration tests.
//!
//! These tests drive rhombus-core through `handle_event` alone, WITHOUT an
//! X server, proving the engine is self-contained and testable using only
//! plain Rust types.

use pretty_assertions::assert_eq;

use rhombus_core::client::TitleSources;
use rhombus_core::config::Config;
use rhombus_core::event::{CoreAction, CoreEvent, Surfaces};
use rhombus_core::frame::CursorShape;
use rhombus_core::input::{Button, Key, Modifiers};
use rhombus_core::launcher::{AppEntry, Category, Launcher};
use rhombus_core::pinned::{PinnedApps, PinnedRecord};
use rhombus_core::popup::{PopupHandles, PopupKind};
use rhombus_core::state::{Geometry, Mode, Point};
use rhombus_core::{Core, WindowHandle};

const ROOT: WindowHandle = WindowHandle(1);
const PANEL: WindowHandle = WindowHandle(2);

fn surfaces() -> Surfaces {
    Surfaces {
        root: ROOT,
        panel: PANEL,
        popups: PopupHandles {
            system_menu: WindowHandle(3),
            launcher: WindowHandle(4),
            control_menu: WindowHandle(5),
            pinned_menu: WindowHandle(6),
        },
    }
}

/// Helper: create a core with default config on a 1920×1080 screen.
fn test_core() -> Core {
    core_with(Config::default())
}

fn core_with(config: Config) -> Core {
    Core::new(config, surfaces(), Geometry::new(0, 0, 1920, 1080))
}

fn window(n: u32) -> WindowHandle {
    WindowHandle(0x40_0000 + n)
}

fn frame(n: u32) -> WindowHandle {
    WindowHandle(0x20_0000 + n)
}

/// Helper: map window `n` with the given inner geometry.
fn map_at(core: &mut Core, n: u32, geometry: Option<Geometry>) -> Vec<CoreAction> {
    core.handle_event(CoreEvent::MapRequest {
        window: window(n),
        frame: frame(n),
        geometry,
        title: TitleSources {
            net_wm_name: Some(format!("Window {n}")),
            ..TitleSources::default()
        },
    })
}

fn map_window(core: &mut Core, n: u32) -> Vec<CoreAction> {
    map_at(core, n, Some(Geometry::new(100, 100, 600, 400)))
}

fn press(core: &mut Core, on: WindowHandle, button: Button, x: i32, y: i32) -> Vec<CoreAction> {
    core.handle_event(CoreEvent::ButtonPress {
        window: on,
        button,
        root: Point::new(x, y),
    })
}

fn release(core: &mut Core, on: WindowHandle, x: i32, y: i32) -> Vec<CoreAction> {
    core.handle_event(CoreEvent::ButtonRelease {
        window: on,
        button: Button::Primary,
        root: Point::new(x, y),
    })
}

fn motion(core: &mut Core, on: WindowHandle, x: i32, y: i32) -> Vec<CoreAction> {
    core.handle_event(CoreEvent::Motion {
        window: on,
        root: Point::new(x, y),
    })
}

fn key(core: &mut Core, key: Key) -> Vec<CoreAction> {
    core.handle_event(CoreEvent::KeyPress {
        key,
        modifiers: Modifiers::empty(),
    })
}

fn notified(actions: &[CoreAction], message: &str) -> bool {
    actions
        .iter()
        .any(|a| matches!(a, CoreAction::Notify { message: m } if m == message))
}

fn geometry_of(core: &Core, n: u32) -> Geometry {
    let id = core.registry().find_by_window(window(n)).unwrap();
    core.registry().get(id).unwrap().geometry
}

// ── Test 1: managing wraps the window in a frame ─────────────────

#[test]
fn manage_wraps_window_in_frame() {
    let mut core = test_core();
    let actions = map_window(&mut core, 1);

    assert!(actions.contains(&CoreAction::CreateFrame {
        frame: frame(1),
        geometry: Geometry::new(100, 100, 610, 440),
    }));
    assert!(actions.contains(&CoreAction::Reparent {
        window: window(1),
        parent: frame(1),
        x: 5,
        y: 35,
    }));
    assert!(actions.contains(&CoreAction::Map { window: window(1) }));
    assert!(actions.contains(&CoreAction::Map { window: frame(1) }));
    assert!(notified(&actions, "New window managed"));

    let id = core.registry().find_by_window(window(1)).unwrap();
    let client = core.registry().get(id).unwrap();
    assert!(client.is_mapped());
    assert!(client.is_active());
    assert_eq!(client.title, "Window 1");
    assert_eq!(core.focused(), Some(id));
}

#[test]
fn manage_without_geometry_uses_default() {
    let mut core = test_core();
    map_at(&mut core, 1, None);
    assert_eq!(geometry_of(&core, 1), Geometry::new(100, 100, 610, 440));
}

#[test]
fn title_fallback_reaches_legacy_query() {
    let mut core = test_core();
    core.handle_event(CoreEvent::MapRequest {
        window: window(1),
        frame: frame(1),
        geometry: None,
        title: TitleSources {
            fetched_name: Some("xterm".into()),
            ..TitleSources::default()
        },
    });
    core.handle_event(CoreEvent::MapRequest {
        window: window(2),
        frame: frame(2),
        geometry: None,
        title: TitleSources::default(),
    });

    let titles: Vec<_> = core.registry().iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["xterm", "Untitled"]);
}

#[test]
fn capacity_leaves_window_unmanaged_but_mapped() {
    let mut config = Config::default();
    config.general.max_clients = 2;
    let mut core = core_with(config);

    map_window(&mut core, 1);
    map_window(&mut core, 2);
    let actions = map_window(&mut core, 3);

    assert_eq!(actions, vec![CoreAction::Map { window: window(3) }]);
    assert_eq!(core.registry().len(), 2);
    assert!(!core.is_managed(window(3)));
}

// ── Test 2: close, unmap and destroy ─────────────────────────────

#[test]
fn close_keeps_entry_until_destroy() {
    let mut core = test_core();
    map_window(&mut core, 1);

    // Close glyph sits at frame-local (15..=27, 9..=21)
    let actions = press(&mut core, frame(1), Button::Primary, 121, 115);
    assert!(actions.contains(&CoreAction::RequestClose { window: window(1) }));
    assert!(actions.contains(&CoreAction::Unmap { window: frame(1) }));
    assert!(notified(&actions, "Closing window..."));

    let id = core.registry().find_by_window(window(1)).unwrap();
    assert!(!core.registry().get(id).unwrap().is_mapped());

    // The unmap we caused ourselves is not an application unmap
    let actions = core.handle_event(CoreEvent::UnmapNotify { window: window(1) });
    assert!(actions.is_empty());
    assert!(core.is_managed(window(1)));

    let actions = core.handle_event(CoreEvent::DestroyNotify { window: window(1) });
    assert!(actions.contains(&CoreAction::Destroy { window: frame(1) }));
    assert!(core.registry().is_empty());
    assert_eq!(core.focused(), None);
}

#[test]
fn application_unmap_keeps_frame_for_remap() {
    let mut core = test_core();
    map_window(&mut core, 1);

    let actions = core.handle_event(CoreEvent::UnmapNotify { window: window(1) });
    assert!(actions.contains(&CoreAction::Unmap { window: frame(1) }));
    assert!(!actions.iter().any(|a| matches!(a, CoreAction::Destroy { .. })));
    assert!(!core.is_managed(window(1)));
    assert_eq!(core.orphan_frame(window(1)), Some(frame(1)));

    // Mapped again: the old frame is reused, the fresh id ignored
    let actions = core.handle_event(CoreEvent::MapRequest {
        window: window(1),
        frame: frame(99),
        geometry: None,
        title: TitleSources::default(),
    });
    assert!(!actions.iter().any(|a| matches!(a, CoreAction::CreateFrame { .. })));
    assert!(core.registry().find_by_frame(frame(1)).is_some());
    assert_eq!(core.orphan_frame(window(1)), None);
}

#[test]
fn orphan_frame_destroyed_with_window() {
    let mut core = test_core();
    map_window(&mut core, 1);
    core.handle_event(CoreEvent::UnmapNotify { window: window(1) });

    let actions = core.handle_event(CoreEvent::DestroyNotify { window: window(1) });
    assert_eq!(actions, vec![CoreAction::Destroy { window: frame(1) }]);
    assert_eq!(core.orphan_frame(window(1)), None);
}

#[test]
fn remap_keeps_orphan_frame_position() {
    let mut core = test_core();
    map_at(&mut core, 1, Some(Geometry::new(300, 200, 600, 400)));
    core.handle_event(CoreEvent::UnmapNotify { window: window(1) });

    // Still inside the old frame, the window reports frame-relative coordinates
    let actions = map_at(&mut core, 1, Some(Geometry::new(5, 35, 600, 400)));
    assert!(actions.contains(&CoreAction::MoveResize {
        window: frame(1),
        geometry: Geometry::new(300, 200, 610, 440),
    }));
    assert_eq!(geometry_of(&core, 1), Geometry::new(300, 200, 610, 440));
}

#[test]
fn remap_over_capacity_releases_orphan_frame() {
    let mut config = Config::default();
    config.general.max_clients = 1;
    let mut core = core_with(config);

    map_at(&mut core, 1, Some(Geometry::new(300, 200, 600, 400)));
    core.handle_event(CoreEvent::UnmapNotify { window: window(1) });
    map_window(&mut core, 2);

    let actions = map_at(&mut core, 1, Some(Geometry::new(5, 35, 600, 400)));
    assert_eq!(
        actions,
        vec![
            CoreAction::Reparent {
                window: window(1),
                parent: ROOT,
                x: 305,
                y: 235,
            },
            CoreAction::Destroy { window: frame(1) },
            CoreAction::Map { window: window(1) },
        ]
    );
    assert!(!core.is_managed(window(1)));
    assert_eq!(core.orphan_frame(window(1)), None);

    // The released window's later destroy has nothing left to clean up
    let actions = core.handle_event(CoreEvent::DestroyNotify { window: window(1) });
    assert!(actions.is_empty());
}

#[test]
fn close_never_kills_client() {
    let mut core = test_core();
    map_window(&mut core, 1);

    let actions = press(&mut core, frame(1), Button::Primary, 121, 115);
    assert!(actions.contains(&CoreAction::RequestClose { window: window(1) }));
    assert!(!actions
        .iter()
        .any(|a| matches!(a, CoreAction::KillClient { .. })));
    assert!(core.is_managed(window(1)));
}

#[test]
fn destroy_of_unknown_window_is_noop() {
    let mut core = test_core();
    map_window(&mut core, 1);
    let actions = core.handle_event(CoreEvent::DestroyNotify { window: window(7) });
    assert!(actions.is_empty());
    assert_eq!(core.registry().len(), 1);
}

// ── Test 3: fullscreen toggling restores geometry ────────────────

#[test]
fn maximize_glyph_round_trip() {
    let mut core = test_core();
    map_window(&mut core, 1);

    // Maximize glyph at frame-local (49..=61, 9..=21)
    let actions = press(&mut core, frame(1), Button::Primary, 155, 115);
    assert!(actions.contains(&CoreAction::MoveResize {
        window: frame(1),
        geometry: Geometry::new(0, 0, 1920, 1030),
    }));
    assert!(actions.contains(&CoreAction::Resize {
        window: window(1),
        width: 1910,
        height: 990,
    }));
    assert!(notified(&actions, "Window maximized"));

    let actions = press(&mut core, frame(1), Button::Primary, 55, 15);
    assert!(notified(&actions, "Window restored"));
    assert_eq!(geometry_of(&core, 1), Geometry::new(100, 100, 610, 440));
}

// ── Test 4: resizing from edges and corners ──────────────────────

#[test]
fn resize_corners_follow_the_pointer() {
    let mut core = test_core();
    map_at(&mut core, 1, Some(Geometry::new(200, 200, 290, 160)));
    assert_eq!(geometry_of(&core, 1), Geometry::new(200, 200, 300, 200));

    let actions = press(&mut core, frame(1), Button::Primary, 499, 399);
    assert_eq!(
        actions,
        vec![CoreAction::SetCursor {
            window: frame(1),
            shape: CursorShape::ResizeMainDiagonal,
        }]
    );
    motion(&mut core, frame(1), 549, 429);
    assert_eq!(geometry_of(&core, 1), Geometry::new(200, 200, 350, 230));
    let actions = release(&mut core, frame(1), 549, 429);
    assert!(core.mode().is_idle());
    assert!(actions.contains(&CoreAction::SetCursor {
        window: frame(1),
        shape: CursorShape::Normal,
    }));
}

#[test]
fn resize_top_left_moves_origin() {
    let mut core = test_core();
    map_at(&mut core, 1, Some(Geometry::new(200, 200, 290, 160)));

    press(&mut core, frame(1), Button::Primary, 200, 200);
    let actions = motion(&mut core, frame(1), 250, 230);
    assert!(actions.contains(&CoreAction::Move {
        window: frame(1),
        x: 250,
        y: 230,
    }));
    assert_eq!(geometry_of(&core, 1), Geometry::new(250, 230, 250, 170));

    // Far past the minimum: the bottom-right corner stays put
    motion(&mut core, frame(1), 900, 900);
    assert_eq!(geometry_of(&core, 1), Geometry::new(400, 320, 100, 80));
}

// ── Test 5: dragging, clamping and snapping ──────────────────────

#[test]
fn drag_clamps_and_snaps() {
    let mut core = test_core();
    map_window(&mut core, 1);

    let actions = press(&mut core, frame(1), Button::Primary, 400, 115);
    assert!(actions.contains(&CoreAction::SetCursor {
        window: frame(1),
        shape: CursorShape::Move,
    }));
    assert!(matches!(core.mode(), Mode::WindowDragging { .. }));

    motion(&mut core, frame(1), 315, 30);
    assert_eq!(geometry_of(&core, 1).x, 15);
    assert_eq!(geometry_of(&core, 1).y, 15);

    let actions = release(&mut core, frame(1), 315, 30);
    assert!(actions.contains(&CoreAction::Move {
        window: frame(1),
        x: 0,
        y: 0,
    }));
    assert!(core.mode().is_idle());

    // Dragging far away never leaves the area above the panel
    press(&mut core, frame(1), Button::Primary, 300, 15);
    motion(&mut core, frame(1), 5000, 5000);
    let g = geometry_of(&core, 1);
    assert_eq!((g.x, g.y), (1920 - 610, 1030 - 440));
}

// ── Test 6: panel routing ────────────────────────────────────────

fn with_firefox_pinned(core: Core) -> Core {
    core.with_pinned(PinnedApps::from_records(vec![PinnedRecord {
        name: "Firefox".into(),
        command: "firefox".into(),
        icon: String::new(),
    }]))
}

#[test]
fn pinned_click_spawns_without_touching_registry() {
    let mut core = with_firefox_pinned(test_core());
    let actions = press(&mut core, PANEL, Button::Primary, 25, 1050);
    assert_eq!(
        actions,
        vec![CoreAction::Spawn {
            command: "firefox".into(),
            feedback: Some("App launched".into()),
        }]
    );
    assert!(core.registry().is_empty());
}

#[test]
fn pinned_menu_unpins_and_persists() {
    let mut core = with_firefox_pinned(test_core());
    let actions = press(&mut core, PANEL, Button::Secondary, 25, 1050);
    assert!(actions.contains(&CoreAction::ShowPopup {
        kind: PopupKind::PinnedMenu,
        window: WindowHandle(6),
        geometry: Geometry::new(10, 965, 120, 60),
    }));

    let actions = press(&mut core, ROOT, Button::Primary, 50, 975);
    assert!(actions.contains(&CoreAction::PersistPinned));
    assert!(actions.contains(&CoreAction::UngrabPointer));
    assert!(core.pinned().is_empty());
}

#[test]
fn taskbar_click_recovers_offscreen_window() {
    let mut core = test_core();
    map_at(&mut core, 1, Some(Geometry::new(3000, 100, 600, 400)));

    let actions = press(&mut core, PANEL, Button::Primary, 30, 1050);
    assert!(actions.contains(&CoreAction::Move {
        window: frame(1),
        x: 10,
        y: 10,
    }));
    assert!(actions.contains(&CoreAction::Raise { window: frame(1) }));
    assert!(notified(&actions, "Window activated"));
    assert_eq!(geometry_of(&core, 1), Geometry::new(10, 10, 610, 440));
}

#[test]
fn empty_panel_area_starts_panel_drag() {
    let mut core = test_core();
    press(&mut core, PANEL, Button::Primary, 900, 1055);
    assert!(matches!(core.mode(), Mode::PanelDragging { .. }));
    release(&mut core, PANEL, 950, 1055);
    assert!(core.mode().is_idle());
}

// ── Test 7: popups and the pointer grab ──────────────────────────

#[test]
fn desktop_click_dismisses_without_reopening() {
    let mut core = test_core();
    let actions = press(&mut core, ROOT, Button::Secondary, 500, 300);
    assert!(actions.contains(&CoreAction::GrabPointer));
    assert!(actions.contains(&CoreAction::GrabKeyboard));
    assert_eq!(core.popups().visible(), Some(PopupKind::Launcher));

    let actions = press(&mut core, ROOT, Button::Primary, 1500, 100);
    assert!(actions.contains(&CoreAction::UngrabPointer));
    assert!(actions.contains(&CoreAction::UngrabKeyboard));
    assert_eq!(core.popups().visible(), None);
    assert!(!core.popups().is_grabbed());
}

#[test]
fn system_menu_toggles() {
    let mut core = test_core();
    let actions = press(&mut core, PANEL, Button::Primary, 1830, 1055);
    assert!(actions.contains(&CoreAction::ShowPopup {
        kind: PopupKind::SystemMenu,
        window: WindowHandle(3),
        geometry: Geometry::new(1800, 905, 120, 120),
    }));

    let actions = press(&mut core, ROOT, Button::Primary, 1830, 1055);
    assert!(actions.contains(&CoreAction::UngrabPointer));
    assert!(!actions.contains(&CoreAction::GrabPointer));
    assert_eq!(core.popups().visible(), None);
}

#[test]
fn system_menu_terminal() {
    let mut core = test_core();
    press(&mut core, PANEL, Button::Primary, 1830, 1055);
    let actions = press(&mut core, ROOT, Button::Primary, 1810, 915);
    assert!(actions.contains(&CoreAction::Spawn {
        command: "xterm".into(),
        feedback: Some("Terminal launched".into()),
    }));
    assert_eq!(core.popups().visible(), None);
}

#[test]
fn control_menu_close_and_pin() {
    let mut core = test_core();
    map_window(&mut core, 1);
    map_window(&mut core, 2);

    // Right-click the first taskbar button
    let actions = press(&mut core, PANEL, Button::Secondary, 30, 1050);
    assert!(actions.contains(&CoreAction::ShowPopup {
        kind: PopupKind::ControlMenu,
        window: WindowHandle(5),
        geometry: Geometry::new(10, 905, 120, 120),
    }));

    // "Pin to Panel"
    let actions = press(&mut core, ROOT, Button::Primary, 50, 915);
    assert!(actions.contains(&CoreAction::PersistPinned));
    assert!(notified(&actions, "App pinned to panel"));
    let layout = core.panel_layout();
    assert_eq!(layout.pinned.len(), 1);
    assert_eq!(layout.clients.len(), 1);

    // The remaining taskbar button now belongs to window 2
    press(&mut core, PANEL, Button::Secondary, layout.clients[0].x + 5, 1050);
    let actions = press(&mut core, ROOT, Button::Primary, layout.clients[0].x + 20, 1005);
    assert!(actions.contains(&CoreAction::RequestClose { window: window(2) }));
    assert!(notified(&actions, "Window closed"));
}

#[test]
fn popup_closes_when_target_destroyed() {
    let mut core = test_core();
    map_window(&mut core, 1);
    press(&mut core, PANEL, Button::Secondary, 30, 1050);
    assert_eq!(core.popups().visible(), Some(PopupKind::ControlMenu));

    let actions = core.handle_event(CoreEvent::DestroyNotify { window: window(1) });
    assert!(actions.contains(&CoreAction::UngrabPointer));
    assert_eq!(core.popups().visible(), None);
}

// ── Test 8: application launcher ─────────────────────────────────

fn launcher() -> Launcher {
    Launcher::new(vec![
        Category::new(
            "Internet",
            vec![AppEntry {
                name: "Firefox".into(),
                command: "firefox".into(),
            }],
        ),
        Category::new(
            "System",
            vec![AppEntry {
                name: "XTerm".into(),
                command: "xterm".into(),
            }],
        ),
    ])
}

#[test]
fn launcher_category_and_app_clicks() {
    let mut core = test_core().with_launcher(launcher());
    press(&mut core, ROOT, Button::Secondary, 100, 100);

    // Header of "Internet" at launcher-local y 75
    press(&mut core, ROOT, Button::Primary, 150, 180);
    assert!(core.launcher().categories()[0].expanded);

    // Firefox row at launcher-local y 100
    let actions = press(&mut core, ROOT, Button::Primary, 150, 205);
    assert!(actions.contains(&CoreAction::Spawn {
        command: "firefox".into(),
        feedback: Some("Application launched".into()),
    }));
    assert_eq!(core.popups().visible(), None);
}

#[test]
fn launcher_search_launches_first_match() {
    let mut core = test_core().with_launcher(launcher());
    press(&mut core, ROOT, Button::Secondary, 100, 100);
    let actions = press(&mut core, ROOT, Button::Primary, 150, 120);
    assert!(notified(&actions, "Search mode activated - type to search"));

    for c in "FIRE".chars() {
        key(&mut core, Key::Char(c));
    }
    assert_eq!(core.launcher().search(), "FIRE");

    let actions = key(&mut core, Key::Return);
    assert!(actions.contains(&CoreAction::Spawn {
        command: "firefox".into(),
        feedback: Some("Launched application".into()),
    }));
    assert!(actions.contains(&CoreAction::UngrabKeyboard));
    assert_eq!(core.launcher().search(), "");
    assert!(!core.launcher().search_mode());
}

#[test]
fn launcher_search_without_match() {
    let mut core = test_core().with_launcher(launcher());
    press(&mut core, ROOT, Button::Secondary, 100, 100);
    press(&mut core, ROOT, Button::Primary, 150, 120);
    key(&mut core, Key::Char('z'));
    let actions = key(&mut core, Key::Return);
    assert!(notified(&actions, "No matching applications found"));
    assert_eq!(core.popups().visible(), Some(PopupKind::Launcher));

    key(&mut core, Key::Backspace);
    key(&mut core, Key::Escape);
    assert!(!core.launcher().search_mode());
}

// ── Test 9: keyboard routing and focus ───────────────────────────

#[test]
fn hotkeys_follow_explicit_focus() {
    let mut core = test_core();
    map_window(&mut core, 1);
    map_window(&mut core, 2);

    // Focus window 1 through its titlebar
    press(&mut core, frame(1), Button::Primary, 400, 115);
    release(&mut core, frame(1), 400, 115);

    let actions = key(&mut core, Key::F(11));
    assert!(actions.contains(&CoreAction::MoveResize {
        window: frame(1),
        geometry: Geometry::new(0, 0, 1920, 1030),
    }));
    assert!(notified(&actions, "Entering fullscreen"));

    let actions = core.handle_event(CoreEvent::KeyPress {
        key: Key::Escape,
        modifiers: Modifiers::CTRL | Modifiers::NUM_LOCK,
    });
    assert!(actions.contains(&CoreAction::KillClient { window: window(1) }));
}

#[test]
fn lowering_moves_focus_on() {
    let mut core = test_core();
    map_window(&mut core, 1);
    map_window(&mut core, 2);

    let actions = key(&mut core, Key::F(12));
    assert!(actions.contains(&CoreAction::Lower { window: frame(2) }));
    let w1 = core.registry().find_by_window(window(1)).unwrap();
    assert_eq!(core.focused(), Some(w1));
    assert_eq!(core.registry().stacking().last(), Some(&w1));
}

// ── Test 10: lock and logout ─────────────────────────────────────

#[test]
fn lock_is_a_mode_of_the_event_loop() {
    let mut core = test_core();
    press(&mut core, PANEL, Button::Primary, 1830, 1055);
    let actions = press(&mut core, ROOT, Button::Primary, 1850, 945);
    assert!(actions.contains(&CoreAction::Lock));
    assert_eq!(core.mode(), &Mode::Locked);

    // Windows keep arriving while locked
    map_window(&mut core, 1);
    assert!(core.is_managed(window(1)));

    let actions = key(&mut core, Key::Char('a'));
    assert!(actions.contains(&CoreAction::Unlock));
    assert!(notified(&actions, "Screen unlocked"));
    assert!(core.mode().is_idle());
}

#[test]
fn logout_releases_every_window() {
    let mut core = test_core();
    map_window(&mut core, 1);
    map_at(&mut core, 2, Some(Geometry::new(300, 200, 400, 300)));

    press(&mut core, PANEL, Button::Primary, 1830, 1055);
    let actions = press(&mut core, ROOT, Button::Primary, 1850, 975);

    assert!(actions.contains(&CoreAction::Reparent {
        window: window(2),
        parent: ROOT,
        x: 300,
        y: 200,
    }));
    assert!(actions.contains(&CoreAction::Unmap { window: frame(1) }));
    assert_eq!(actions.last(), Some(&CoreAction::Exit));
    assert!(core.should_exit);
}

// ── Test 11: session updates ─────────────────────────────────────

#[test]
fn configure_request_resizes_frame() {
    let mut core = test_core();
    map_window(&mut core, 1);
    let actions = core.handle_event(CoreEvent::ConfigureRequest {
        window: window(1),
        width: 800,
        height: 600,
    });
    assert!(actions.contains(&CoreAction::Resize {
        window: frame(1),
        width: 810,
        height: 640,
    }));
    assert!(actions.contains(&CoreAction::Resize {
        window: window(1),
        width: 800,
        height: 600,
    }));
}

#[test]
fn title_change_redraws_once() {
    let mut core = test_core();
    map_window(&mut core, 1);
    let title = TitleSources {
        net_wm_name: Some("vim".into()),
        ..TitleSources::default()
    };
    let actions = core.handle_event(CoreEvent::TitleChanged {
        window: window(1),
        title: title.clone(),
    });
    assert_eq!(actions.len(), 2);
    let actions = core.handle_event(CoreEvent::TitleChanged {
        window: window(1),
        title,
    });
    assert!(actions.is_empty());
}

#[test]
fn titlebar_hover_redraws_on_change_only() {
    let mut core = test_core();
    map_window(&mut core, 1);
    let id = core.registry().find_by_window(window(1)).unwrap();

    let actions = motion(&mut core, frame(1), 121, 115);
    assert_eq!(actions, vec![CoreAction::RedrawFrame { client: id }]);
    assert!(motion(&mut core, frame(1), 122, 116).is_empty());
    let actions = motion(&mut core, frame(1), 400, 300);
    assert_eq!(actions, vec![CoreAction::RedrawFrame { client: id }]);
}

// ── Test 12: invariants hold after operations ────────────────────

#[test]
fn invariants_hold_after_mixed_operations() {
    let mut core = with_firefox_pinned(test_core()).with_launcher(launcher());

    map_window(&mut core, 1);
    map_window(&mut core, 2);
    map_window(&mut core, 3);

    press(&mut core, PANEL, Button::Secondary, 80, 1050);
    press(&mut core, ROOT, Button::Primary, 120, 915);
    press(&mut core, frame(1), Button::Primary, 121, 115);
    core.handle_event(CoreEvent::UnmapNotify { window: window(2) });
    press(&mut core, ROOT, Button::Secondary, 700, 500);
    core.handle_event(CoreEvent::DestroyNotify { window: window(3) });
    key(&mut core, Key::F(11));
    core.handle_event(CoreEvent::Tick);

    core.validate_invariants().expect("Invariants should hold");
}
