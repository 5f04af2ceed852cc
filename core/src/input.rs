use std::time::Duration;

use glam::Vec2;

/// Mouse button that produced a pointer event. Touch events report [`PointerButton::Primary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left mouse button or a finger.
    Primary,
    /// Middle mouse button.
    Middle,
    /// Right mouse button.
    Secondary,
}

/// Device family that produced a pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputDevice {
    /// Mouse or trackpad.
    Mouse,
    /// Touch screen.
    Touch,
}

/// Lifecycle stage of a pointer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputPhase {
    /// A button or finger went down.
    Press,
    /// The pointer moved.
    Move,
    /// A button or finger went up.
    Release,
    /// The host aborted the gesture, for example when the pointer left the canvas.
    Cancel,
}

/// Modifier keys held during an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Control key.
    pub ctrl: bool,
    /// Meta or command key.
    pub meta: bool,
    /// Shift key.
    pub shift: bool,
}

impl Modifiers {
    /// Reports whether the platform command modifier (control or meta) is held.
    #[must_use]
    pub const fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Unified pointer event covering mouse and touch input.
///
/// Touch phases carry the active finger count after the change. `position` is
/// the first active finger for presses and moves and the lifted finger for
/// releases; `secondary` is the second active finger when present.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    /// Lifecycle stage.
    pub phase: InputPhase,
    /// Originating device.
    pub device: InputDevice,
    /// Button that changed state, or the held button for moves.
    pub button: PointerButton,
    /// Screen position of the primary contact.
    pub position: Vec2,
    /// Screen position of the second finger during multi-touch.
    pub secondary: Option<Vec2>,
    /// Number of fingers still touching the screen.
    pub fingers: usize,
    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
    /// Host timestamp used for tap timing.
    pub timestamp: Duration,
}

impl InputEvent {
    /// Builds a mouse event.
    #[must_use]
    pub fn mouse(
        phase: InputPhase,
        button: PointerButton,
        position: Vec2,
        modifiers: Modifiers,
        timestamp: Duration,
    ) -> Self {
        Self {
            phase,
            device: InputDevice::Mouse,
            button,
            position,
            secondary: None,
            fingers: 0,
            modifiers,
            timestamp,
        }
    }

    /// Builds a touch event from the active touches and the touch that changed.
    #[must_use]
    pub fn touch(phase: InputPhase, touches: &[Vec2], changed: Vec2, timestamp: Duration) -> Self {
        let position = match phase {
            InputPhase::Press | InputPhase::Move => touches.first().copied().unwrap_or(changed),
            InputPhase::Release | InputPhase::Cancel => changed,
        };
        Self {
            phase,
            device: InputDevice::Touch,
            button: PointerButton::Primary,
            position,
            secondary: touches.get(1).copied(),
            fingers: touches.len(),
            modifiers: Modifiers::default(),
            timestamp,
        }
    }
}

/// Keys recognized by the engine's keyboard handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character, reported as typed.
    Char(char),
    /// Escape key.
    Escape,
    /// Enter key.
    Enter,
    /// Delete key.
    Delete,
    /// Backspace key.
    Backspace,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Function key `F1` through `F12`.
    Function(u8),
}
