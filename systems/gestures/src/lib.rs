#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pointer and touch interpretation for the hex map.
//!
//! Mouse and touch input arrive as the same [`InputEvent`] type and feed one
//! state machine. The machine reads the world through its query functions
//! and answers with [`Command`] batches; it never mutates the world itself.

mod keyboard;

use std::time::Duration;

use glam::Vec2;
use hexfog_core::{Command, InputDevice, InputEvent, InputPhase, PointerButton, TokenIndex};
use hexfog_world::{query, World};

pub use keyboard::{shortcut_for, Shortcut, KEY_PAN_FAST, KEY_PAN_STEP};

/// Longest touch that still counts as a tap.
pub const TAP_TIME_LIMIT: Duration = Duration::from_millis(300);

/// Largest travel, in pixels, that still counts as a tap or a click.
pub const TAP_MOVE_LIMIT: f32 = 5.0;

/// Largest distance, in pixels, between two taps forming a double-tap.
pub const DOUBLE_TAP_DISTANCE: f32 = 20.0;

/// Zoom factor applied per wheel notch towards the user.
pub const WHEEL_ZOOM_IN: f32 = 1.1;

/// Zoom factor applied per wheel notch away from the user.
pub const WHEEL_ZOOM_OUT: f32 = 0.9;

/// Externally visible state of the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    /// No gesture in progress.
    Idle,
    /// The camera follows the pointer.
    Panning,
    /// A token follows the pointer.
    DraggingToken,
    /// Two fingers scale the camera.
    Pinching,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Gesture {
    Idle,
    Panning { last: Vec2 },
    DraggingToken { token: TokenIndex, start: Vec2 },
    Pinching { start_distance: f32, start_zoom: f32 },
}

/// Press that may turn into a click on release.
#[derive(Clone, Copy, Debug)]
struct Press {
    button: PointerButton,
    origin: Vec2,
    travelled: bool,
    dragged: bool,
}

/// One finger-down to last-finger-up sequence.
#[derive(Clone, Copy, Debug)]
struct TouchSequence {
    origin: Vec2,
    started: Duration,
    moved: bool,
    pinched: bool,
}

#[derive(Clone, Copy, Debug)]
struct Tap {
    at: Duration,
    position: Vec2,
}

/// Gesture state machine shared by mouse and touch input.
#[derive(Debug)]
pub struct GestureMachine {
    gesture: Gesture,
    press: Option<Press>,
    touch: Option<TouchSequence>,
    last_tap: Option<Tap>,
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureMachine {
    /// Creates an idle machine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
            press: None,
            touch: None,
            last_tap: None,
        }
    }

    /// Current phase of the machine.
    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        match self.gesture {
            Gesture::Idle => GesturePhase::Idle,
            Gesture::Panning { .. } => GesturePhase::Panning,
            Gesture::DraggingToken { .. } => GesturePhase::DraggingToken,
            Gesture::Pinching { .. } => GesturePhase::Pinching,
        }
    }

    /// Drops the active gesture and any pending press or tap without emitting commands.
    ///
    /// Used when the token list changed underneath a gesture, so a drag no
    /// longer refers to the token it started on.
    pub fn abort(&mut self) {
        self.gesture = Gesture::Idle;
        self.press = None;
        self.touch = None;
        self.last_tap = None;
    }

    /// Consumes one pointer event and emits the resulting commands.
    pub fn handle(&mut self, world: &World, event: &InputEvent, out: &mut Vec<Command>) {
        match (event.device, event.phase) {
            (InputDevice::Mouse, InputPhase::Press) => self.mouse_press(world, event, out),
            (InputDevice::Mouse, InputPhase::Move) => {
                if let Some(press) = self.press.as_mut() {
                    if press.origin.distance(event.position) > TAP_MOVE_LIMIT {
                        press.travelled = true;
                    }
                }
                self.follow(world, event.position, out);
            }
            (InputDevice::Mouse, InputPhase::Release) => self.mouse_release(world, event, out),
            (InputDevice::Touch, InputPhase::Press) => self.touch_start(world, event, out),
            (InputDevice::Touch, InputPhase::Move) => self.touch_move(world, event, out),
            (InputDevice::Touch, InputPhase::Release) => self.touch_end(world, event, out),
            (_, InputPhase::Cancel) => {
                let _ = self.finish(out);
                self.press = None;
                self.touch = None;
            }
        }
    }

    /// Zooms about the cursor by one wheel step. Positive `delta_y` scrolls away and zooms out.
    pub fn handle_wheel(
        &self,
        world: &World,
        position: Vec2,
        delta_y: f32,
        out: &mut Vec<Command>,
    ) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let factor = if delta_y > 0.0 {
            WHEEL_ZOOM_OUT
        } else {
            WHEEL_ZOOM_IN
        };
        out.push(Command::ZoomAt {
            anchor: position,
            zoom: query::camera(world).zoom() * factor,
        });
    }

    /// Opens the edit dialog for the token under a double-clicked position.
    pub fn handle_double_click(&self, world: &World, position: Vec2, out: &mut Vec<Command>) {
        if query::modes(world).token_mode_active() {
            return;
        }
        if let Some(token) = query::find_token_at(world, position) {
            out.push(Command::BeginTokenEdit { token });
        }
    }

    /// Resolves a click at a screen position against the active mode.
    ///
    /// Add mode opens a placement dialog, remove mode removes the token under
    /// the cursor, and otherwise the click deselects any token and toggles the
    /// hex under the cursor towards the reveal mode's target.
    pub fn click(&self, world: &World, position: Vec2, out: &mut Vec<Command>) {
        let modes = query::modes(world);
        if modes.adding_token {
            out.push(Command::BeginTokenPlacement {
                position: query::to_world(world, position),
            });
            return;
        }
        if modes.removing_token {
            out.push(Command::RemoveTokenAt { position });
            return;
        }
        if query::find_token_at(world, position).is_some() {
            return;
        }
        if query::selected_token(world).is_some() {
            out.push(Command::SelectToken { token: None });
        }
        if let Some(cell) = query::find_hex_at(world, position) {
            if cell.revealed != modes.reveal {
                let hex = cell.id;
                out.push(if modes.reveal {
                    Command::RevealHex { hex }
                } else {
                    Command::HideHex { hex }
                });
            }
        }
    }

    fn mouse_press(&mut self, world: &World, event: &InputEvent, out: &mut Vec<Command>) {
        self.press = Some(Press {
            button: event.button,
            origin: event.position,
            travelled: false,
            dragged: false,
        });

        let token_mode = query::modes(world).token_mode_active();
        let token = query::find_token_at(world, event.position);
        match (event.button, token) {
            (PointerButton::Primary, Some(token)) if !token_mode => {
                self.begin_drag(world, token, out);
            }
            (PointerButton::Secondary, _) if query::selected_token(world).is_some() => {
                out.push(Command::SelectToken { token: None });
            }
            (button, token) => {
                let pans = match button {
                    PointerButton::Middle => true,
                    PointerButton::Secondary => token.is_none(),
                    PointerButton::Primary => event.modifiers.command() && token.is_none(),
                };
                if pans && !token_mode {
                    self.gesture = Gesture::Panning {
                        last: event.position,
                    };
                }
            }
        }
    }

    fn mouse_release(&mut self, world: &World, event: &InputEvent, out: &mut Vec<Command>) {
        let dragged = self.finish(out);
        let Some(press) = self.press.take() else {
            return;
        };
        let clicked = press.button == PointerButton::Primary
            && event.button == PointerButton::Primary
            && !press.travelled
            && !press.dragged
            && !dragged;
        if clicked {
            self.click(world, event.position, out);
        }
    }

    fn touch_start(&mut self, world: &World, event: &InputEvent, out: &mut Vec<Command>) {
        if event.fingers >= 2 {
            let _ = self.finish(out);
            if let Some(sequence) = self.touch.as_mut() {
                sequence.pinched = true;
            }
            if let Some(secondary) = event.secondary {
                self.gesture = Gesture::Pinching {
                    start_distance: event.position.distance(secondary),
                    start_zoom: query::camera(world).zoom(),
                };
            }
            return;
        }

        self.touch = Some(TouchSequence {
            origin: event.position,
            started: event.timestamp,
            moved: false,
            pinched: false,
        });
        if query::modes(world).token_mode_active() {
            return;
        }
        match query::find_token_at(world, event.position) {
            Some(token) => self.begin_drag(world, token, out),
            None => {
                self.gesture = Gesture::Panning {
                    last: event.position,
                };
            }
        }
    }

    fn touch_move(&mut self, world: &World, event: &InputEvent, out: &mut Vec<Command>) {
        if let Some(sequence) = self.touch.as_mut() {
            if sequence.origin.distance(event.position) > TAP_MOVE_LIMIT {
                sequence.moved = true;
            }
        }
        if let Gesture::Pinching {
            start_distance,
            start_zoom,
        } = self.gesture
        {
            let Some(secondary) = event.secondary else {
                return;
            };
            let distance = event.position.distance(secondary);
            if start_distance > 0.0 {
                out.push(Command::ZoomAt {
                    anchor: (event.position + secondary) / 2.0,
                    zoom: start_zoom * (distance / start_distance),
                });
            }
            return;
        }
        self.follow(world, event.position, out);
    }

    fn touch_end(&mut self, world: &World, event: &InputEvent, out: &mut Vec<Command>) {
        if matches!(self.gesture, Gesture::Pinching { .. }) {
            if event.fingers < 2 {
                self.gesture = Gesture::Idle;
            }
        } else {
            let _ = self.finish(out);
        }
        if event.fingers > 0 {
            return;
        }
        let Some(sequence) = self.touch.take() else {
            return;
        };
        let quick = event.timestamp.saturating_sub(sequence.started) < TAP_TIME_LIMIT;
        let is_tap = quick && !sequence.moved && !sequence.pinched;
        if is_tap {
            self.tap(world, event.position, event.timestamp, out);
        }
    }

    fn tap(&mut self, world: &World, position: Vec2, at: Duration, out: &mut Vec<Command>) {
        let double = self.last_tap.take().filter(|previous| {
            at.saturating_sub(previous.at) < TAP_TIME_LIMIT
                && previous.position.distance(position) < DOUBLE_TAP_DISTANCE
        });
        let token_mode = query::modes(world).token_mode_active();
        if double.is_some() && !token_mode && query::find_token_at(world, position).is_some() {
            self.handle_double_click(world, position, out);
            return;
        }
        self.click(world, position, out);
        if double.is_none() {
            self.last_tap = Some(Tap { at, position });
        }
    }

    fn begin_drag(&mut self, world: &World, token: TokenIndex, out: &mut Vec<Command>) {
        let Some(start) = query::token(world, token).map(|token| token.position()) else {
            return;
        };
        out.push(Command::SelectToken { token: Some(token) });
        self.gesture = Gesture::DraggingToken { token, start };
        if let Some(press) = self.press.as_mut() {
            press.dragged = true;
        }
    }

    fn follow(&mut self, world: &World, position: Vec2, out: &mut Vec<Command>) {
        match &mut self.gesture {
            Gesture::Panning { last } => {
                let delta = position - *last;
                *last = position;
                if delta != Vec2::ZERO {
                    out.push(Command::PanBy { delta });
                }
            }
            Gesture::DraggingToken { token, .. } => out.push(Command::MoveToken {
                token: *token,
                position: query::to_world(world, position),
            }),
            Gesture::Idle | Gesture::Pinching { .. } => {}
        }
    }

    /// Leaves the active gesture. A drag is committed; returns whether one was active.
    fn finish(&mut self, out: &mut Vec<Command>) -> bool {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::DraggingToken { token, start } => {
                out.push(Command::CommitTokenDrag { token, from: start });
                true
            }
            Gesture::Idle | Gesture::Panning { .. } | Gesture::Pinching { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_machine_is_idle() {
        let machine = GestureMachine::default();
        assert_eq!(machine.phase(), GesturePhase::Idle);
    }

    #[test]
    fn wheel_without_delta_is_ignored() {
        let machine = GestureMachine::new();
        let world = World::new();
        let mut out = Vec::new();
        machine.handle_wheel(&world, Vec2::ZERO, 0.0, &mut out);
        assert!(out.is_empty());
    }
}
