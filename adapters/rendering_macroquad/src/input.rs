use std::time::Duration;

use glam::Vec2;
use hexfog_core::{InputEvent, InputPhase, Key, Modifiers, PointerButton};
use hexfog_rendering::HostInput;
use macroquad::input::{
    get_char_pressed, is_key_down, is_key_pressed, is_mouse_button_down,
    is_mouse_button_pressed, is_mouse_button_released, mouse_position, mouse_wheel, touches,
    KeyCode, MouseButton, TouchPhase,
};

/// Second click within this window and distance counts as a double click.
const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(400);
const DOUBLE_CLICK_DISTANCE: f32 = 5.0;

const KEY_BINDINGS: [(KeyCode, Key); 22] = [
    (KeyCode::Escape, Key::Escape),
    (KeyCode::Enter, Key::Enter),
    (KeyCode::KpEnter, Key::Enter),
    (KeyCode::Delete, Key::Delete),
    (KeyCode::Backspace, Key::Backspace),
    (KeyCode::Up, Key::ArrowUp),
    (KeyCode::Down, Key::ArrowDown),
    (KeyCode::Left, Key::ArrowLeft),
    (KeyCode::Right, Key::ArrowRight),
    (KeyCode::Z, Key::Char('z')),
    (KeyCode::Y, Key::Char('y')),
    (KeyCode::M, Key::Char('m')),
    (KeyCode::T, Key::Char('t')),
    (KeyCode::Equal, Key::Char('=')),
    (KeyCode::KpAdd, Key::Char('+')),
    (KeyCode::Minus, Key::Char('-')),
    (KeyCode::KpSubtract, Key::Char('-')),
    (KeyCode::F2, Key::Function(2)),
    (KeyCode::F5, Key::Function(5)),
    (KeyCode::F8, Key::Function(8)),
    (KeyCode::F9, Key::Function(9)),
    (KeyCode::F12, Key::Function(12)),
];

/// Mouse state observed during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct MouseFrame {
    pub(crate) position: Vec2,
    pub(crate) pressed: Option<PointerButton>,
    pub(crate) released: Option<PointerButton>,
    pub(crate) wheel_y: f32,
    pub(crate) modifiers: Modifiers,
}

/// Lifecycle of one touch point, independent of the windowing backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TouchStage {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// Converts raw per-frame device state into [`HostInput`] events.
#[derive(Clone, Debug, Default)]
pub(crate) struct InputCapture {
    cursor: Option<Vec2>,
    held: Option<PointerButton>,
    last_click: Option<(Duration, Vec2)>,
    active_touches: Vec<(u64, Vec2)>,
}

impl InputCapture {
    /// Polls macroquad and returns this frame's events in arrival order.
    pub(crate) fn poll(&mut self, now: Duration) -> Vec<HostInput> {
        let modifiers = modifiers();
        let mut events = Vec::new();

        let raw_touches: Vec<(u64, TouchStage, Vec2)> = touches()
            .into_iter()
            .filter_map(|touch| {
                let stage = match touch.phase {
                    TouchPhase::Started => TouchStage::Started,
                    TouchPhase::Moved => TouchStage::Moved,
                    TouchPhase::Ended => TouchStage::Ended,
                    TouchPhase::Cancelled => TouchStage::Cancelled,
                    TouchPhase::Stationary => return None,
                };
                Some((touch.id, stage, Vec2::new(touch.position.x, touch.position.y)))
            })
            .collect();
        if raw_touches.is_empty() {
            let (x, y) = mouse_position();
            let (_, wheel_y) = mouse_wheel();
            let frame = MouseFrame {
                position: Vec2::new(x, y),
                pressed: first_button(is_mouse_button_pressed),
                released: first_button(is_mouse_button_released),
                wheel_y,
                modifiers,
            };
            self.mouse_frame(frame, now, &mut events);
            if self.held.is_some() && first_button(is_mouse_button_down).is_none() {
                self.held = None;
            }
        } else {
            self.touch_frame(&raw_touches, now, &mut events);
        }

        for (code, key) in KEY_BINDINGS {
            if is_key_pressed(code) {
                events.push(HostInput::Key { key, modifiers });
            }
        }
        while let Some(character) = get_char_pressed() {
            if !character.is_control() {
                events.push(HostInput::Text(character));
            }
        }
        events
    }

    pub(crate) fn mouse_frame(
        &mut self,
        frame: MouseFrame,
        now: Duration,
        out: &mut Vec<HostInput>,
    ) {
        let MouseFrame {
            position,
            pressed,
            released,
            wheel_y,
            modifiers,
        } = frame;

        if self.cursor.is_some_and(|cursor| cursor != position) {
            let button = self.held.unwrap_or(PointerButton::Primary);
            out.push(HostInput::Pointer(InputEvent::mouse(
                InputPhase::Move,
                button,
                position,
                modifiers,
                now,
            )));
        }
        self.cursor = Some(position);

        if let Some(button) = pressed {
            self.held = Some(button);
            out.push(HostInput::Pointer(InputEvent::mouse(
                InputPhase::Press,
                button,
                position,
                modifiers,
                now,
            )));
        }
        if let Some(button) = released {
            self.held = None;
            out.push(HostInput::Pointer(InputEvent::mouse(
                InputPhase::Release,
                button,
                position,
                modifiers,
                now,
            )));
            if button == PointerButton::Primary {
                self.register_click(position, now, out);
            }
        }
        if wheel_y != 0.0 {
            out.push(HostInput::Wheel {
                position,
                delta_y: -wheel_y,
            });
        }
    }

    fn register_click(&mut self, position: Vec2, now: Duration, out: &mut Vec<HostInput>) {
        let double = self.last_click.take().is_some_and(|(at, previous)| {
            now.saturating_sub(at) < DOUBLE_CLICK_TIME
                && previous.distance(position) < DOUBLE_CLICK_DISTANCE
        });
        if double {
            out.push(HostInput::DoubleClick { position });
        } else {
            self.last_click = Some((now, position));
        }
    }

    pub(crate) fn touch_frame(
        &mut self,
        raw: &[(u64, TouchStage, Vec2)],
        now: Duration,
        out: &mut Vec<HostInput>,
    ) {
        let mut moved = None;
        for &(id, stage, position) in raw {
            match stage {
                TouchStage::Started => {
                    self.active_touches.push((id, position));
                    out.push(self.touch_event(InputPhase::Press, position, now));
                }
                TouchStage::Moved => {
                    if let Some(entry) = self.active_touches.iter_mut().find(|(t, _)| *t == id) {
                        entry.1 = position;
                        let _ = moved.get_or_insert(position);
                    }
                }
                TouchStage::Ended | TouchStage::Cancelled => {
                    self.active_touches.retain(|(t, _)| *t != id);
                    let phase = if stage == TouchStage::Ended {
                        InputPhase::Release
                    } else {
                        InputPhase::Cancel
                    };
                    out.push(self.touch_event(phase, position, now));
                }
            }
        }
        if let Some(changed) = moved {
            out.push(self.touch_event(InputPhase::Move, changed, now));
        }
    }

    fn touch_event(&self, phase: InputPhase, changed: Vec2, now: Duration) -> HostInput {
        let positions: Vec<Vec2> = self
            .active_touches
            .iter()
            .map(|&(_, position)| position)
            .collect();
        HostInput::Pointer(InputEvent::touch(phase, &positions, changed, now))
    }
}

fn first_button(probe: fn(MouseButton) -> bool) -> Option<PointerButton> {
    [
        (MouseButton::Left, PointerButton::Primary),
        (MouseButton::Middle, PointerButton::Middle),
        (MouseButton::Right, PointerButton::Secondary),
    ]
    .into_iter()
    .find(|&(button, _)| probe(button))
    .map(|(_, button)| button)
}

pub(crate) fn modifiers() -> Modifiers {
    Modifiers {
        ctrl: is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl),
        meta: is_key_down(KeyCode::LeftSuper) || is_key_down(KeyCode::RightSuper),
        shift: is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer_phases(events: &[HostInput]) -> Vec<InputPhase> {
        events
            .iter()
            .filter_map(|event| match event {
                HostInput::Pointer(event) => Some(event.phase),
                _ => None,
            })
            .collect()
    }

    fn click_frames(capture: &mut InputCapture, position: Vec2, at: Duration) -> Vec<HostInput> {
        let mut out = Vec::new();
        capture.mouse_frame(
            MouseFrame {
                position,
                pressed: Some(PointerButton::Primary),
                ..MouseFrame::default()
            },
            at,
            &mut out,
        );
        capture.mouse_frame(
            MouseFrame {
                position,
                released: Some(PointerButton::Primary),
                ..MouseFrame::default()
            },
            at + Duration::from_millis(50),
            &mut out,
        );
        out
    }

    #[test]
    fn cursor_motion_becomes_move_events() {
        let mut capture = InputCapture::default();
        let mut out = Vec::new();
        capture.mouse_frame(MouseFrame::default(), Duration::ZERO, &mut out);
        assert!(out.is_empty(), "first observation only records the cursor");

        capture.mouse_frame(
            MouseFrame {
                position: Vec2::new(4.0, 2.0),
                ..MouseFrame::default()
            },
            Duration::ZERO,
            &mut out,
        );
        assert_eq!(pointer_phases(&out), vec![InputPhase::Move]);
    }

    #[test]
    fn scrolling_up_reports_negative_delta() {
        let mut capture = InputCapture::default();
        let mut out = Vec::new();
        capture.mouse_frame(
            MouseFrame {
                wheel_y: 1.0,
                ..MouseFrame::default()
            },
            Duration::ZERO,
            &mut out,
        );
        assert_eq!(
            out,
            vec![HostInput::Wheel {
                position: Vec2::ZERO,
                delta_y: -1.0
            }]
        );
    }

    #[test]
    fn two_quick_clicks_make_a_double_click() {
        let mut capture = InputCapture::default();
        let position = Vec2::new(30.0, 30.0);
        let first = click_frames(&mut capture, position, Duration::ZERO);
        assert!(!first.contains(&HostInput::DoubleClick { position }));

        let second = click_frames(&mut capture, position, Duration::from_millis(200));
        assert_eq!(second.last(), Some(&HostInput::DoubleClick { position }));

        let third = click_frames(&mut capture, position, Duration::from_millis(400));
        assert!(
            !third.contains(&HostInput::DoubleClick { position }),
            "a double click does not chain into the next click"
        );
    }

    #[test]
    fn slow_clicks_stay_single() {
        let mut capture = InputCapture::default();
        let position = Vec2::new(30.0, 30.0);
        let _ = click_frames(&mut capture, position, Duration::ZERO);
        let second = click_frames(&mut capture, position, Duration::from_millis(900));
        assert!(!second.contains(&HostInput::DoubleClick { position }));
    }

    #[test]
    fn touches_report_every_active_finger() {
        let mut capture = InputCapture::default();
        let mut out = Vec::new();
        let first = Vec2::new(10.0, 10.0);
        let second = Vec2::new(50.0, 10.0);
        capture.touch_frame(
            &[(1, TouchStage::Started, first), (2, TouchStage::Started, second)],
            Duration::ZERO,
            &mut out,
        );
        capture.touch_frame(
            &[(2, TouchStage::Moved, Vec2::new(60.0, 10.0))],
            Duration::from_millis(16),
            &mut out,
        );
        capture.touch_frame(
            &[(1, TouchStage::Ended, first)],
            Duration::from_millis(32),
            &mut out,
        );

        let HostInput::Pointer(pinch) = &out[2] else {
            panic!("expected pointer event");
        };
        assert_eq!(pinch.phase, InputPhase::Move);
        assert_eq!(pinch.fingers, 2);
        assert_eq!(pinch.secondary, Some(Vec2::new(60.0, 10.0)));

        let HostInput::Pointer(lift) = &out[3] else {
            panic!("expected pointer event");
        };
        assert_eq!(lift.phase, InputPhase::Release);
        assert_eq!(lift.position, first);
        assert_eq!(lift.fingers, 1);
    }
}
