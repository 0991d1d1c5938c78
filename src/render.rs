//! Decoration renderer
//!
//! Draws the desktop, panel, frames, popups, toasts and the lock screen with
//! core-protocol primitives. Every surface is repainted in full from core
//! state; there is no damage tracking.

use std::borrow::Cow;

use rhombus_core::client::{Client, TitleButton};
use rhombus_core::config::{ColorConfig, Metrics};
use rhombus_core::launcher::{LauncherHit, ROW_HEIGHT, SEARCH_BOTTOM, SEARCH_TOP};
use rhombus_core::panel::{PanelSlot, PanelTarget, SLOT_BOTTOM, SLOT_TOP};
use rhombus_core::popup::PopupKind;
use rhombus_core::{ClientId, Core, Geometry};
use tracing::warn;
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyOrIdError};
use x11rb::protocol::xproto::{
    Arc, ChangeGCAux, ConnectionExt, CreateGCAux, Drawable, Font, Gcontext, Rectangle, Segment,
    Window,
};
use x11rb::rust_connection::RustConnection;

/// Gradient bands used for the desktop background.
const DESKTOP_BANDS: u32 = 64;
const TEXT_PAD: i32 = 10;

// ── Colors ───────────────────────────────────────────────────────────

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create from hex string (e.g., "#ff0000" or "ff0000")
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Pixel value for a 24-bit TrueColor visual.
    pub const fn pixel(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Linear mix: `t == 0` is `self`, `t == 1` is `other`.
    pub fn blend(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    pub fn lighten(self, amount: f32) -> Self {
        self.blend(Self::WHITE, amount)
    }
}

/// Parsed color scheme.
#[derive(Debug, Clone)]
pub struct Palette {
    pub desktop_top: Color,
    pub desktop_bottom: Color,
    pub panel: Color,
    pub panel_button: Color,
    pub panel_button_hover: Color,
    pub frame: Color,
    pub titlebar_active: Color,
    pub titlebar_inactive: Color,
    pub text: Color,
    pub text_inactive: Color,
    pub close_button: Color,
    pub minimize_button: Color,
    pub maximize_button: Color,
    pub menu: Color,
    pub menu_hover: Color,
    pub accent: Color,
    pub lock: Color,
}

impl Palette {
    /// Parse configured colors; invalid entries fall back to the built-in scheme.
    pub fn from_config(colors: &ColorConfig) -> Self {
        let defaults = ColorConfig::default();
        let parse = |name: &str, value: &str, fallback: &str| {
            Color::from_hex(value).unwrap_or_else(|| {
                warn!("Invalid color {:?} for {}, using {}", value, name, fallback);
                Color::from_hex(fallback).unwrap_or(Color::BLACK)
            })
        };
        macro_rules! pick {
            ($field:ident) => {
                parse(stringify!($field), &colors.$field, &defaults.$field)
            };
        }
        Self {
            desktop_top: pick!(desktop_top),
            desktop_bottom: pick!(desktop_bottom),
            panel: pick!(panel),
            panel_button: pick!(panel_button),
            panel_button_hover: pick!(panel_button_hover),
            frame: pick!(frame),
            titlebar_active: pick!(titlebar_active),
            titlebar_inactive: pick!(titlebar_inactive),
            text: pick!(text),
            text_inactive: pick!(text_inactive),
            close_button: pick!(close_button),
            minimize_button: pick!(minimize_button),
            maximize_button: pick!(maximize_button),
            menu: pick!(menu),
            menu_hover: pick!(menu_hover),
            accent: pick!(accent),
            lock: pick!(lock),
        }
    }

    const fn button(&self, button: TitleButton) -> Color {
        match button {
            TitleButton::Close => self.close_button,
            TitleButton::Minimize => self.minimize_button,
            TitleButton::Maximize => self.maximize_button,
        }
    }
}

/// Truncate `text` so it fits in `max_px`, marking the cut with "..".
pub fn fit_text(text: &str, max_px: i32, char_width: i32) -> Cow<'_, str> {
    if char_width <= 0 {
        return Cow::Borrowed(text);
    }
    let max_chars = (max_px / char_width).max(0) as usize;
    let len = text.chars().count();
    if len <= max_chars {
        return Cow::Borrowed(text);
    }
    if max_chars <= 2 {
        return Cow::Owned(".".repeat(max_chars));
    }
    let kept: String = text.chars().take(max_chars - 2).collect();
    Cow::Owned(format!("{kept}.."))
}

/// Core text only carries Latin-1; everything else becomes '?'.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .take(255)
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn rect(x: i32, y: i32, width: u32, height: u32) -> Rectangle {
    Rectangle {
        x: x as i16,
        y: y as i16,
        width: width as u16,
        height: height as u16,
    }
}

// ── Painter ──────────────────────────────────────────────────────────

/// Glyph metrics of the loaded core font.
#[derive(Debug, Clone, Copy)]
struct Glyphs {
    width: i32,
    ascent: i32,
    descent: i32,
}

/// Owns the graphics context and font used for all drawing.
pub struct Painter {
    gc: Gcontext,
    font: Font,
    glyphs: Glyphs,
    palette: Palette,
}

impl Painter {
    pub fn new(
        conn: &RustConnection,
        root: Window,
        font_name: &str,
        palette: Palette,
    ) -> Result<Self, ReplyOrIdError> {
        let font = conn.generate_id()?;
        let opened = conn.open_font(font, font_name.as_bytes())?.check();
        if let Err(e) = opened {
            warn!("Failed to open font {:?}: {}, using \"fixed\"", font_name, e);
            conn.open_font(font, b"fixed")?.check()?;
        }
        let info = conn.query_font(font)?.reply()?;
        let glyphs = Glyphs {
            width: i32::from(info.max_bounds.character_width).max(1),
            ascent: i32::from(info.font_ascent),
            descent: i32::from(info.font_descent),
        };

        let gc = conn.generate_id()?;
        conn.create_gc(
            gc,
            root,
            &CreateGCAux::new()
                .font(font)
                .foreground(palette.text.pixel())
                .background(palette.panel.pixel())
                .graphics_exposures(0),
        )?;

        Ok(Self {
            gc,
            font,
            glyphs,
            palette,
        })
    }

    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn free(&self, conn: &RustConnection) -> Result<(), ConnectionError> {
        conn.free_gc(self.gc)?;
        conn.close_font(self.font)?;
        Ok(())
    }

    fn fill(
        &self,
        conn: &RustConnection,
        d: Drawable,
        color: Color,
        r: Rectangle,
    ) -> Result<(), ConnectionError> {
        conn.change_gc(self.gc, &ChangeGCAux::new().foreground(color.pixel()))?;
        conn.poly_fill_rectangle(d, self.gc, &[r])?;
        Ok(())
    }

    fn circle(
        &self,
        conn: &RustConnection,
        d: Drawable,
        color: Color,
        g: Geometry,
    ) -> Result<(), ConnectionError> {
        conn.change_gc(self.gc, &ChangeGCAux::new().foreground(color.pixel()))?;
        conn.poly_fill_arc(
            d,
            self.gc,
            &[Arc {
                x: g.x as i16,
                y: g.y as i16,
                width: g.width as u16,
                height: g.height as u16,
                angle1: 0,
                angle2: 360 * 64,
            }],
        )?;
        Ok(())
    }

    /// Draw text with its top-left cell at `(x, top)` over `bg`.
    fn text(
        &self,
        conn: &RustConnection,
        d: Drawable,
        x: i32,
        top: i32,
        text: &str,
        fg: Color,
        bg: Color,
    ) -> Result<(), ConnectionError> {
        if text.is_empty() {
            return Ok(());
        }
        conn.change_gc(
            self.gc,
            &ChangeGCAux::new()
                .foreground(fg.pixel())
                .background(bg.pixel()),
        )?;
        let baseline = top + self.glyphs.ascent;
        conn.image_text8(d, self.gc, x as i16, baseline as i16, &latin1(text))?;
        Ok(())
    }

    /// Top of a text line vertically centered in a band.
    const fn centered_top(&self, band_top: i32, band_height: i32) -> i32 {
        band_top + (band_height - self.glyphs.ascent - self.glyphs.descent) / 2
    }

    fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * self.glyphs.width
    }

    // ── Desktop ──────────────────────────────────────────────────────

    /// Vertical gradient over the root window.
    pub fn desktop(
        &self,
        conn: &RustConnection,
        root: Window,
        screen: Geometry,
    ) -> Result<(), ConnectionError> {
        let band = screen.height.div_ceil(DESKTOP_BANDS).max(1);
        let mut y = 0;
        while y < screen.height {
            let t = y as f32 / screen.height as f32;
            let color = self.palette.desktop_top.blend(self.palette.desktop_bottom, t);
            self.fill(conn, root, color, rect(0, y as i32, screen.width, band))?;
            y += band;
        }
        Ok(())
    }

    // ── Panel ────────────────────────────────────────────────────────

    pub fn panel(
        &self,
        conn: &RustConnection,
        window: Window,
        core: &Core,
        clock: &str,
    ) -> Result<(), ConnectionError> {
        let p = &self.palette;
        let geometry = core.panel_geometry();
        let layout = core.panel_layout();
        let hover = core.panel_hover();

        self.fill(conn, window, p.panel, rect(0, 0, geometry.width, geometry.height))?;
        // Accent line along the top edge
        self.fill(conn, window, p.accent, rect(0, 0, geometry.width, 1))?;

        for slot in &layout.pinned {
            self.panel_slot(conn, window, slot, hover == Some(slot.target), false)?;
        }
        if let Some(x) = layout.separator {
            conn.change_gc(self.gc, &ChangeGCAux::new().foreground(p.text_inactive.pixel()))?;
            conn.poly_segment(
                window,
                self.gc,
                &[Segment {
                    x1: (x - 5) as i16,
                    y1: SLOT_TOP as i16,
                    x2: (x - 5) as i16,
                    y2: SLOT_BOTTOM as i16,
                }],
            )?;
        }
        for slot in &layout.clients {
            let active = match slot.target {
                PanelTarget::Client(id) => core.registry().get(id).is_some_and(Client::is_active),
                _ => false,
            };
            self.panel_slot(conn, window, slot, hover == Some(slot.target), active)?;
        }

        let menu = &layout.menu_area;
        let menu_bg = if hover == Some(PanelTarget::SystemMenu) {
            p.panel_button_hover
        } else {
            p.panel
        };
        self.fill(conn, window, menu_bg, menu.rect().into_rectangle())?;
        let label = "Menu";
        let x = menu.x + (menu.width - self.text_width(label)) / 2;
        let top = self.centered_top(SLOT_TOP, SLOT_BOTTOM - SLOT_TOP);
        self.text(conn, window, x, top, label, p.text, menu_bg)?;

        let top = self.centered_top(0, geometry.height as i32);
        self.text(conn, window, layout.clock_x, top, clock, p.text, p.panel)
    }

    fn panel_slot(
        &self,
        conn: &RustConnection,
        window: Window,
        slot: &PanelSlot,
        hovered: bool,
        active: bool,
    ) -> Result<(), ConnectionError> {
        let p = &self.palette;
        let bg = if active {
            p.accent
        } else if hovered {
            p.panel_button_hover
        } else {
            p.panel_button
        };
        self.fill(conn, window, bg, slot.rect().into_rectangle())?;
        let label = fit_text(&slot.label, slot.width - 4, self.glyphs.width);
        let x = slot.x + (slot.width - self.text_width(&label)) / 2;
        let top = self.centered_top(SLOT_TOP, SLOT_BOTTOM - SLOT_TOP);
        self.text(conn, window, x, top, &label, p.text, bg)
    }

    // ── Frames ───────────────────────────────────────────────────────

    pub fn frame(
        &self,
        conn: &RustConnection,
        client: &Client,
        metrics: &Metrics,
    ) -> Result<(), ConnectionError> {
        let p = &self.palette;
        let frame = client.frame.0;
        let Geometry { width, height, .. } = client.geometry;

        self.fill(conn, frame, p.frame, rect(0, 0, width, height))?;
        let (bar, fg) = if client.is_active() {
            (p.titlebar_active, p.text)
        } else {
            (p.titlebar_inactive, p.text_inactive)
        };
        self.fill(conn, frame, bar, rect(0, 0, width, metrics.titlebar_height))?;

        for button in TitleButton::ALL {
            let mut color = p.button(button);
            if client.hover == Some(button) {
                color = color.lighten(0.35);
            }
            self.circle(conn, frame, color, metrics.title_button_rect(button))?;
        }

        let x = metrics.title_button_rect(TitleButton::Maximize).right() + TEXT_PAD + 2;
        let room = width as i32 - x - TEXT_PAD;
        let title = fit_text(&client.title, room, self.glyphs.width);
        let top = self.centered_top(0, metrics.titlebar_height as i32);
        self.text(conn, frame, x, top, &title, fg, bar)
    }

    // ── Popups ───────────────────────────────────────────────────────

    pub fn popup(
        &self,
        conn: &RustConnection,
        core: &Core,
        kind: PopupKind,
    ) -> Result<(), ConnectionError> {
        let popup = core.popups().get(kind);
        let window = popup.handle.0;
        let fade = popup.fade;
        let p = &self.palette;
        let base = p.desktop_bottom.blend(p.menu, fade);
        let fg = base.blend(p.text, fade);
        let Geometry { width, height, .. } = popup.geometry;

        self.fill(conn, window, base, rect(0, 0, width, height))?;

        if kind == PopupKind::Launcher {
            return self.launcher(conn, window, core, base, fg, fade);
        }

        let item_height = core.metrics().menu_item_height;
        for (i, label) in kind.labels().iter().enumerate() {
            let y = i as i32 * item_height as i32;
            let bg = if popup.hover == Some(i) {
                base.blend(p.menu_hover, fade)
            } else {
                base
            };
            self.fill(conn, window, bg, rect(0, y, width, item_height))?;
            let top = self.centered_top(y, item_height as i32);
            self.text(conn, window, TEXT_PAD, top, label, fg, bg)?;
        }
        Ok(())
    }

    fn launcher(
        &self,
        conn: &RustConnection,
        window: Window,
        core: &Core,
        base: Color,
        fg: Color,
        fade: f32,
    ) -> Result<(), ConnectionError> {
        let p = &self.palette;
        let launcher = core.launcher();
        let Geometry { width, height, .. } = core.popups().get(PopupKind::Launcher).geometry;
        let hover = launcher.hover();

        // Search box
        let box_height = (SEARCH_BOTTOM - SEARCH_TOP) as u32;
        let box_bg = if launcher.search_mode() {
            base.blend(p.accent, 0.4 * fade)
        } else {
            base.lighten(0.08)
        };
        self.fill(conn, window, box_bg, rect(TEXT_PAD, SEARCH_TOP, width - 20, box_height))?;
        let prompt = if launcher.search_mode() {
            Cow::Owned(format!("{}_", launcher.search()))
        } else if launcher.search().is_empty() {
            Cow::Borrowed("Search...")
        } else {
            Cow::Borrowed(launcher.search())
        };
        let prompt = fit_text(&prompt, width as i32 - 40, self.glyphs.width).into_owned();
        let top = self.centered_top(SEARCH_TOP, SEARCH_BOTTOM - SEARCH_TOP);
        self.text(conn, window, 2 * TEXT_PAD, top, &prompt, fg, box_bg)?;

        self.text(conn, window, TEXT_PAD, SEARCH_BOTTOM + 8, "Applications", fg, base)?;

        for row in launcher.rows(height) {
            let bg = if hover == Some(row.hit) {
                base.blend(p.menu_hover, fade)
            } else {
                base
            };
            self.fill(conn, window, bg, rect(0, row.y, width, ROW_HEIGHT as u32))?;
            let top = self.centered_top(row.y, ROW_HEIGHT);
            match row.hit {
                LauncherHit::Category(index) => {
                    let Some(category) = launcher.categories().get(index) else {
                        continue;
                    };
                    let marker = if category.expanded { "[-]" } else { "[+]" };
                    let label = format!("{marker} {}", category.name);
                    self.text(conn, window, TEXT_PAD, top, &label, fg, bg)?;
                },
                LauncherHit::App { category, app } => {
                    let Some(entry) = launcher.app(category, app) else {
                        continue;
                    };
                    let name = fit_text(&entry.name, width as i32 - 50, self.glyphs.width);
                    self.text(conn, window, 3 * TEXT_PAD, top, &name, fg, bg)?;
                },
                LauncherHit::SearchBox => {},
            }
        }
        Ok(())
    }

    // ── Toast and lock screen ────────────────────────────────────────

    pub fn toast(
        &self,
        conn: &RustConnection,
        window: Window,
        size: (u32, u32),
        message: &str,
    ) -> Result<(), ConnectionError> {
        let p = &self.palette;
        let (width, height) = size;
        self.fill(conn, window, p.accent, rect(0, 0, width, height))?;
        self.fill(conn, window, p.panel, rect(2, 2, width - 4, height - 4))?;
        let text = fit_text(message, width as i32 - 2 * TEXT_PAD, self.glyphs.width);
        let top = self.centered_top(0, height as i32);
        self.text(conn, window, TEXT_PAD, top, &text, p.text, p.panel)
    }

    pub fn lock(
        &self,
        conn: &RustConnection,
        window: Window,
        screen: Geometry,
    ) -> Result<(), ConnectionError> {
        let p = &self.palette;
        self.fill(conn, window, p.lock, rect(0, 0, screen.width, screen.height))?;
        let message = "Screen locked - press any key or click to unlock";
        let x = (screen.width as i32 - self.text_width(message)) / 2;
        let top = self.centered_top(0, screen.height as i32);
        self.text(conn, window, x, top, message, p.text, p.lock)
    }
}

trait IntoRectangle {
    fn into_rectangle(self) -> Rectangle;
}

impl IntoRectangle for Geometry {
    fn into_rectangle(self) -> Rectangle {
        rect(self.x, self.y, self.width, self.height)
    }
}

/// Frame repaint for a client looked up by id; gone clients are skipped.
pub fn redraw_client(
    painter: &Painter,
    conn: &RustConnection,
    core: &Core,
    id: ClientId,
) -> Result<(), ConnectionError> {
    match core.registry().get(id) {
        Some(client) if client.is_mapped() => painter.frame(conn, client, core.metrics()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#8a2be2"), Some(Color::new(0x8a, 0x2b, 0xe2)));
        assert_eq!(Color::from_hex("ffffff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("#fff"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color::new(0x12, 0x34, 0x56).pixel(), 0x0012_3456);
    }

    #[test]
    fn test_blend_endpoints() {
        let a = Color::new(0, 100, 200);
        let b = Color::new(200, 100, 0);
        assert_eq!(a.blend(b, 0.0), a);
        assert_eq!(a.blend(b, 1.0), b);
        assert_eq!(a.blend(b, 0.5), Color::new(100, 100, 100));
        assert_eq!(a.blend(b, 7.0), b);
    }

    #[test]
    fn test_invalid_palette_entry_falls_back() {
        let mut colors = ColorConfig::default();
        colors.accent = "purple".to_string();
        let palette = Palette::from_config(&colors);
        assert_eq!(Some(palette.accent), Color::from_hex(&ColorConfig::default().accent));
    }

    #[test]
    fn test_fit_text() {
        assert_eq!(fit_text("Terminal", 100, 6), "Terminal");
        assert_eq!(fit_text("A very long window title", 60, 6), "A very l..");
        assert_eq!(fit_text("abc", 12, 6), "..");
        assert_eq!(fit_text("abc", 0, 6), "");
    }

    #[test]
    fn test_latin1_replaces_wide_chars() {
        assert_eq!(latin1("caf\u{e9} \u{263a}"), vec![b'c', b'a', b'f', 0xe9, b' ', b'?']);
    }
}
