use glam::Vec2;
use hexfog_core::{Key, Modifiers};

use crate::{WHEEL_ZOOM_IN, WHEEL_ZOOM_OUT};

/// Pan distance in pixels for one arrow key press.
pub const KEY_PAN_STEP: f32 = 50.0;

/// Pan distance in pixels for one arrow key press with shift held.
pub const KEY_PAN_FAST: f32 = 150.0;

/// Action bound to a keyboard shortcut.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shortcut {
    /// Steps back one committed action.
    Undo,
    /// Re-applies the last undone action.
    Redo,
    /// Flips between reveal and hide.
    ToggleRevealMode,
    /// Enters or leaves add-token mode.
    ToggleAddToken,
    /// Leaves add-token mode, or clears the selection.
    Cancel,
    /// Removes the selected token.
    DeleteSelected,
    /// Shifts the camera by a screen-space delta.
    Pan(Vec2),
    /// Multiplies the zoom, anchored at the viewport center.
    Zoom(f32),
}

/// Maps a key press to its shortcut.
///
/// Letters are matched case-insensitively because shift changes the reported
/// character. Command shortcuts accept either control or meta.
#[must_use]
pub fn shortcut_for(key: Key, modifiers: Modifiers) -> Option<Shortcut> {
    if modifiers.command() {
        if let Key::Char(character) = key {
            return match (character.to_ascii_lowercase(), modifiers.shift) {
                ('z', true) | ('y', _) => Some(Shortcut::Redo),
                ('z', false) => Some(Shortcut::Undo),
                ('m', _) => Some(Shortcut::ToggleRevealMode),
                ('t', _) => Some(Shortcut::ToggleAddToken),
                _ => None,
            };
        }
    }

    let step = if modifiers.shift {
        KEY_PAN_FAST
    } else {
        KEY_PAN_STEP
    };
    match key {
        Key::Escape => Some(Shortcut::Cancel),
        Key::Delete | Key::Backspace => Some(Shortcut::DeleteSelected),
        Key::ArrowUp => Some(Shortcut::Pan(Vec2::new(0.0, step))),
        Key::ArrowDown => Some(Shortcut::Pan(Vec2::new(0.0, -step))),
        Key::ArrowLeft => Some(Shortcut::Pan(Vec2::new(step, 0.0))),
        Key::ArrowRight => Some(Shortcut::Pan(Vec2::new(-step, 0.0))),
        Key::Char('+' | '=') => Some(Shortcut::Zoom(WHEEL_ZOOM_IN)),
        Key::Char('-') => Some(Shortcut::Zoom(WHEEL_ZOOM_OUT)),
        Key::Char(_) | Key::Enter | Key::Function(_) => None,
    }
}
