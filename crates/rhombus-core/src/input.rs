//! Input handling
//!
//! Symbolic keys, modifier masks, pointer buttons and the global hotkey
//! table. The display session resolves raw keycodes to [`Key`]s before
//! handing them to the core.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::BindingConfig;

/// Input handling errors
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid key: {0}")]
    Key(String),
    #[error("Invalid binding: {0}")]
    Binding(String),
}

bitflags! {
    /// Keyboard modifiers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT     = 0b0000_0001;
        const CTRL      = 0b0000_0010;
        const ALT       = 0b0000_0100;
        const SUPER     = 0b0000_1000;
        const CAPS_LOCK = 0b0001_0000;
        const NUM_LOCK  = 0b0010_0000;
    }
}

impl Modifiers {
    /// Lock modifiers never take part in hotkey matching.
    pub const LOCKS: Self = Self::CAPS_LOCK.union(Self::NUM_LOCK);

    pub const fn without_locks(self) -> Self {
        self.difference(Self::LOCKS)
    }
}

/// A resolved symbolic key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable ASCII character (space through tilde).
    Char(char),
    Escape,
    Return,
    Backspace,
    Tab,
    /// Function key `F1`..`F12`.
    F(u8),
    /// Any other keysym, kept for logging.
    Other(u32),
}

impl Key {
    /// Parse a key name as written in configuration.
    pub fn from_name(name: &str) -> Result<Self, InputError> {
        let lower = name.to_lowercase();
        let key = match lower.as_str() {
            "escape" | "esc" => Self::Escape,
            "return" | "enter" => Self::Return,
            "backspace" => Self::Backspace,
            "tab" => Self::Tab,
            "space" => Self::Char(' '),
            _ => {
                if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                    if (1..=12).contains(&n) {
                        return Ok(Self::F(n));
                    }
                }
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_graphic() => Self::Char(c.to_ascii_lowercase()),
                    _ => return Err(InputError::Key(name.to_string())),
                }
            },
        };
        Ok(key)
    }

    /// The printable character this key inserts, if any.
    pub const fn printable(self) -> Option<char> {
        match self {
            Self::Char(c) if c.is_ascii() && !c.is_ascii_control() => Some(c),
            _ => None,
        }
    }

    fn normalized(self) -> Self {
        match self {
            Self::Char(c) => Self::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

/// Pointer buttons the manager distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
    ScrollUp,
    ScrollDown,
    Other(u8),
}

impl Button {
    /// Map a core-protocol button number.
    pub const fn from_index(index: u8) -> Self {
        match index {
            1 => Self::Primary,
            2 => Self::Middle,
            3 => Self::Secondary,
            4 => Self::ScrollUp,
            5 => Self::ScrollDown,
            n => Self::Other(n),
        }
    }
}

/// What a global hotkey does to the focused client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyAction {
    ToggleFullscreen,
    Lower,
    ForceClose,
}

/// A key binding (modifiers + key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl KeyBinding {
    pub const fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// Parse a binding string like "Ctrl+Escape"
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let mut modifiers = Modifiers::empty();
        let mut key_part: Option<&str> = None;

        for part in s.split('+') {
            let part = part.trim();
            match part.to_lowercase().as_str() {
                "shift" => modifiers.insert(Modifiers::SHIFT),
                "ctrl" | "control" => modifiers.insert(Modifiers::CTRL),
                "alt" | "mod1" => modifiers.insert(Modifiers::ALT),
                "super" | "mod4" | "logo" | "win" => modifiers.insert(Modifiers::SUPER),
                "" => return Err(InputError::Binding(s.to_string())),
                _ => {
                    if key_part.replace(part).is_some() {
                        return Err(InputError::Binding(s.to_string()));
                    }
                },
            }
        }

        let key = match key_part {
            Some(k) => Key::from_name(k)?,
            None => return Err(InputError::Binding(s.to_string())),
        };

        Ok(Self { modifiers, key })
    }

    fn matches(&self, modifiers: Modifiers, key: Key) -> bool {
        self.key == key.normalized() && self.modifiers == modifiers.without_locks()
    }
}

/// The global hotkey table.
#[derive(Debug, Clone, Default)]
pub struct Hotkeys {
    bindings: Vec<(KeyBinding, HotkeyAction)>,
}

impl Hotkeys {
    /// Build from configuration, skipping (and logging) unparsable entries.
    pub fn from_config(bindings: &[BindingConfig]) -> Self {
        let bindings = bindings
            .iter()
            .filter_map(|b| match KeyBinding::parse(&b.keys) {
                Ok(kb) => Some((kb, b.action)),
                Err(e) => {
                    warn!("Ignoring hotkey {:?}: {}", b.keys, e);
                    None
                },
            })
            .collect();
        Self { bindings }
    }

    pub fn lookup(&self, modifiers: Modifiers, key: Key) -> Option<HotkeyAction> {
        self.bindings
            .iter()
            .find(|(kb, _)| kb.matches(modifiers, key))
            .map(|&(_, action)| action)
    }

    /// Every binding, for the display session to grab.
    pub fn bindings(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.iter().map(|(kb, _)| kb)
    }
}
