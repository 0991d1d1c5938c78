//! Keycode and modifier translation
//!
//! Resolves server keycodes to the symbolic [`Key`]s the core understands
//! and back again for passive hotkey grabs.

use std::collections::HashMap;

use rhombus_core::input::{Key, Modifiers};
use x11rb::protocol::xproto::{GetKeyboardMappingReply, Keycode, ModMask};

// ── Keysyms ──────────────────────────────────────────────────────────

const XK_BACKSPACE: u32 = 0xff08;
const XK_TAB: u32 = 0xff09;
const XK_RETURN: u32 = 0xff0d;
const XK_ESCAPE: u32 = 0xff1b;
const XK_KP_ENTER: u32 = 0xff8d;
const XK_F1: u32 = 0xffbe;
const XK_F12: u32 = 0xffc9;

/// Symbolic key for a keysym.
pub fn key_for_keysym(keysym: u32) -> Key {
    match keysym {
        XK_ESCAPE => Key::Escape,
        XK_RETURN | XK_KP_ENTER => Key::Return,
        XK_BACKSPACE => Key::Backspace,
        XK_TAB => Key::Tab,
        XK_F1..=XK_F12 => Key::F((keysym - XK_F1 + 1) as u8),
        0x20..=0x7e => char::from_u32(keysym).map_or(Key::Other(keysym), Key::Char),
        other => Key::Other(other),
    }
}

/// Unshifted keysym for a key, as found in column 0 of the mapping.
pub fn keysym_for_key(key: Key) -> Option<u32> {
    match key {
        Key::Escape => Some(XK_ESCAPE),
        Key::Return => Some(XK_RETURN),
        Key::Backspace => Some(XK_BACKSPACE),
        Key::Tab => Some(XK_TAB),
        Key::F(n @ 1..=12) => Some(XK_F1 + u32::from(n) - 1),
        Key::Char(c) if c.is_ascii_graphic() || c == ' ' => Some(u32::from(c.to_ascii_lowercase())),
        _ => None,
    }
}

/// Core modifier bits from a key or button event state.
pub fn modifiers_from_state(state: u16) -> Modifiers {
    let bits = [
        (ModMask::SHIFT, Modifiers::SHIFT),
        (ModMask::LOCK, Modifiers::CAPS_LOCK),
        (ModMask::CONTROL, Modifiers::CTRL),
        (ModMask::M1, Modifiers::ALT),
        (ModMask::M2, Modifiers::NUM_LOCK),
        (ModMask::M4, Modifiers::SUPER),
    ];
    bits.into_iter()
        .filter(|(mask, _)| state & u16::from(*mask) != 0)
        .fold(Modifiers::empty(), |acc, (_, m)| acc | m)
}

/// Server modifier mask for a set of core modifiers.
pub fn mod_mask(modifiers: Modifiers) -> ModMask {
    let bits = [
        (Modifiers::SHIFT, ModMask::SHIFT),
        (Modifiers::CAPS_LOCK, ModMask::LOCK),
        (Modifiers::CTRL, ModMask::CONTROL),
        (Modifiers::ALT, ModMask::M1),
        (Modifiers::NUM_LOCK, ModMask::M2),
        (Modifiers::SUPER, ModMask::M4),
    ];
    bits.into_iter()
        .filter(|(m, _)| modifiers.contains(*m))
        .fold(ModMask::from(0u16), |acc, (_, mask)| acc | mask)
}

/// Snapshot of the server keyboard mapping.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    min_keycode: Keycode,
    per_keycode: usize,
    keysyms: Vec<u32>,
    /// Column-0 keysym to the first keycode producing it.
    reverse: HashMap<u32, Keycode>,
}

impl Keymap {
    pub fn new(min_keycode: Keycode, reply: GetKeyboardMappingReply) -> Self {
        Self::from_keysyms(min_keycode, reply.keysyms_per_keycode as usize, reply.keysyms)
    }

    fn from_keysyms(min_keycode: Keycode, per_keycode: usize, keysyms: Vec<u32>) -> Self {
        let mut reverse = HashMap::new();
        if per_keycode > 0 {
            for (i, chunk) in keysyms.chunks(per_keycode).enumerate() {
                if let Some(&sym) = chunk.first().filter(|&&s| s != 0) {
                    reverse.entry(sym).or_insert(min_keycode.wrapping_add(i as u8));
                }
            }
        }
        Self {
            min_keycode,
            per_keycode,
            keysyms,
            reverse,
        }
    }

    /// Keysym for a keycode; column 1 when shifted and populated.
    pub fn keysym(&self, keycode: Keycode, shifted: bool) -> u32 {
        if keycode < self.min_keycode || self.per_keycode == 0 {
            return 0;
        }
        let base = (keycode - self.min_keycode) as usize * self.per_keycode;
        let column0 = self.keysyms.get(base).copied().unwrap_or(0);
        let column1 = self.keysyms.get(base + 1).copied().unwrap_or(0);
        if shifted && column1 != 0 {
            column1
        } else {
            column0
        }
    }

    /// Resolve a key event to a symbolic key and modifiers.
    pub fn resolve(&self, keycode: Keycode, state: u16) -> (Key, Modifiers) {
        let modifiers = modifiers_from_state(state);
        let keysym = self.keysym(keycode, modifiers.contains(Modifiers::SHIFT));
        (key_for_keysym(keysym), modifiers)
    }

    /// Keycode to grab for a key.
    pub fn keycode_for(&self, key: Key) -> Option<Keycode> {
        keysym_for_key(key).and_then(|sym| self.reverse.get(&sym).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keymap() -> Keymap {
        // keycode 9: Escape, 10: a/A, 11: 1/!, 12: F11
        Keymap::from_keysyms(
            9,
            2,
            vec![XK_ESCAPE, 0, 0x61, 0x41, 0x31, 0x21, XK_F1 + 10, 0],
        )
    }

    #[test]
    fn test_keysym_translation() {
        assert_eq!(key_for_keysym(XK_ESCAPE), Key::Escape);
        assert_eq!(key_for_keysym(XK_KP_ENTER), Key::Return);
        assert_eq!(key_for_keysym(0xffc8), Key::F(11));
        assert_eq!(key_for_keysym(0x41), Key::Char('A'));
        assert_eq!(key_for_keysym(0xffe1), Key::Other(0xffe1));
    }

    #[test]
    fn test_shift_selects_second_column() {
        let map = keymap();
        assert_eq!(map.resolve(10, 0).0, Key::Char('a'));
        assert_eq!(map.resolve(10, u16::from(ModMask::SHIFT)).0, Key::Char('A'));
        assert_eq!(map.resolve(11, u16::from(ModMask::SHIFT)).0, Key::Char('!'));
        // No shifted symbol: fall back to column 0
        assert_eq!(map.resolve(9, u16::from(ModMask::SHIFT)).0, Key::Escape);
        assert_eq!(map.resolve(3, 0).0, Key::Other(0));
    }

    #[test]
    fn test_reverse_lookup_for_grabs() {
        let map = keymap();
        assert_eq!(map.keycode_for(Key::F(11)), Some(12));
        assert_eq!(map.keycode_for(Key::Escape), Some(9));
        assert_eq!(map.keycode_for(Key::Char('A')), Some(10));
        assert_eq!(map.keycode_for(Key::Return), None);
    }

    #[test]
    fn test_modifier_masks_round_trip() {
        let state = u16::from(ModMask::CONTROL | ModMask::M2);
        let mods = modifiers_from_state(state);
        assert_eq!(mods, Modifiers::CTRL | Modifiers::NUM_LOCK);
        assert_eq!(mods.without_locks(), Modifiers::CTRL);
        assert_eq!(u16::from(mod_mask(mods)), state);
    }
}
