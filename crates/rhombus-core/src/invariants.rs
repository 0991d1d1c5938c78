//! Invariant validation for the core state.
//!
//! Called after every `handle_event` in debug builds.

use std::collections::HashSet;

use crate::popup::PopupTarget;
use crate::Core;

/// Error indicating which invariant was violated.
#[derive(Debug, thiserror::Error)]
pub enum InvariantError {
    #[error("Focused client {0} does not exist")]
    FocusedClientMissing(String),

    #[error("{0} clients are active at once")]
    MultipleActive(usize),

    #[error("{0} popups are visible at once")]
    MultiplePopups(usize),

    #[error("Pointer grab held: {grabbed}, popup visible: {visible}")]
    GrabMismatch { grabbed: bool, visible: bool },

    #[error("Popup target {0} no longer exists")]
    StalePopupTarget(String),

    #[error("Window {0} is managed twice")]
    DuplicateWindow(String),

    #[error("Registry holds {len} clients, above capacity {capacity}")]
    OverCapacity { len: usize, capacity: usize },

    #[error("Interaction targets missing client {0}")]
    ModeTargetMissing(String),
}

/// Validate all core invariants. Returns the first violation found.
pub fn validate(core: &Core) -> Result<(), InvariantError> {
    let registry = core.registry();

    // 1. Focused client must exist
    if let Some(id) = core.focused() {
        if !registry.contains(id) {
            return Err(InvariantError::FocusedClientMissing(id.to_string()));
        }
    }

    // 2. Activation is exclusive
    let active = registry.iter().filter(|c| c.is_active()).count();
    if active > 1 {
        return Err(InvariantError::MultipleActive(active));
    }

    // 3. One popup at most, and the grab follows visibility
    let popups = core.popups();
    let visible = popups.iter().filter(|p| p.visible).count();
    if visible > 1 {
        return Err(InvariantError::MultiplePopups(visible));
    }
    if popups.is_grabbed() != (visible == 1) {
        return Err(InvariantError::GrabMismatch {
            grabbed: popups.is_grabbed(),
            visible: visible == 1,
        });
    }

    // 4. Popup targets point at live records
    for popup in popups.iter().filter(|p| p.visible) {
        match popup.target {
            Some(PopupTarget::Client(id)) if !registry.contains(id) => {
                return Err(InvariantError::StalePopupTarget(id.to_string()));
            },
            Some(PopupTarget::Pinned(id)) if core.pinned().get(id).is_none() => {
                return Err(InvariantError::StalePopupTarget(format!("pinned:{}", id.0)));
            },
            _ => {},
        }
    }

    // 5. Application windows are unique and within capacity
    let mut seen = HashSet::new();
    for client in registry.iter() {
        if !seen.insert(client.window) {
            return Err(InvariantError::DuplicateWindow(client.window.to_string()));
        }
    }
    if registry.len() > registry.capacity() {
        return Err(InvariantError::OverCapacity {
            len: registry.len(),
            capacity: registry.capacity(),
        });
    }

    // 6. Drag and resize targets exist
    if let Some(id) = core.mode().target() {
        if !registry.contains(id) {
            return Err(InvariantError::ModeTargetMissing(id.to_string()));
        }
    }

    Ok(())
}
