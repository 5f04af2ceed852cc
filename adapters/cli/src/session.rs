use std::{path::PathBuf, sync::mpsc::Receiver};

use hexfog_core::{HexId, InputPhase, Key, TokenDetails};
use hexfog_engine::Engine;
use hexfog_rendering::{FrameInput, FrameOutput, HostInput, ImageSource, Layers};
use hexfog_world::{query, TokenDialog};

use crate::sinks::{JsonFileStore, NoticeFeed};

const LABEL_HINT: &str = "Type a label, Enter to confirm, Escape to cancel";

/// Window session: routes host input into the engine and hands back frames.
#[derive(Debug)]
pub(crate) struct Session {
    engine: Engine<JsonFileStore, NoticeFeed>,
    notices: Receiver<String>,
    draft: Option<TokenDetails>,
    hovered: Option<HexId>,
    initial_image: Option<ImageSource>,
}

impl Session {
    /// Wraps a booted engine. The map image, or the placeholder when none is
    /// given, is requested on the first frame.
    pub(crate) fn new(
        mut engine: Engine<JsonFileStore, NoticeFeed>,
        notices: Receiver<String>,
        map: Option<PathBuf>,
    ) -> Self {
        let source = map.map_or(ImageSource::Placeholder, ImageSource::File);
        let initial_image = Some(engine.load_map_image(source));
        Self {
            engine,
            notices,
            draft: None,
            hovered: None,
            initial_image,
        }
    }

    /// Processes one frame of host input and rebuilds `layers` when needed.
    pub(crate) fn frame(&mut self, input: FrameInput, layers: &mut Layers) -> FrameOutput {
        let mut output = FrameOutput {
            load_image: self.initial_image.take(),
            ..FrameOutput::default()
        };

        self.engine.tick(input.elapsed);
        self.engine.set_viewport(input.viewport.x, input.viewport.y);
        self.engine.set_visible(input.visible);

        for event in input.events {
            if let Some(next) = self.route(event) {
                output.load_image = Some(next);
            }
            self.sync_draft(&mut output);
        }

        let _ = self.engine.render_frame(layers);
        output.status.extend(self.notices.try_iter());
        output.readout = self.hovered.map(hex_readout);
        output
    }

    fn route(&mut self, event: HostInput) -> Option<ImageSource> {
        match event {
            HostInput::Pointer(pointer) => {
                if pointer.phase == InputPhase::Move {
                    self.track_hover(pointer.position);
                }
                self.engine.handle_input(&pointer);
            }
            HostInput::DoubleClick { position } => self.engine.handle_double_click(position),
            HostInput::Wheel { position, delta_y } => self.engine.handle_wheel(position, delta_y),
            HostInput::Key { key, modifiers } => {
                if self.draft.is_some() {
                    self.edit_draft(key);
                } else {
                    match key {
                        Key::Function(2) => self.engine.toggle_remove_token_mode(),
                        Key::Function(5) => self.engine.reset_view(),
                        Key::Function(8) => self.engine.reset_fog(),
                        Key::Function(9) => self.engine.clear_tokens(),
                        Key::Function(12) => self.engine.toggle_debug_overlay(),
                        _ => {
                            let _ = self.engine.handle_key(key, modifiers);
                        }
                    }
                }
            }
            HostInput::Text(character) => {
                if let Some(draft) = &mut self.draft {
                    if !character.is_control() {
                        draft.label.push(character);
                    }
                }
            }
            HostInput::Image(event) => return self.engine.on_image_event(event),
        }
        None
    }

    fn edit_draft(&mut self, key: Key) {
        match key {
            Key::Enter => {
                if let Some(details) = self.draft.take() {
                    self.engine.confirm_token(details);
                }
            }
            Key::Escape => {
                self.draft = None;
                self.engine.cancel_token_dialog();
            }
            Key::Backspace => {
                if let Some(draft) = &mut self.draft {
                    let _ = draft.label.pop();
                }
            }
            _ => {}
        }
    }

    /// Opens or closes the label draft to follow the engine's dialog.
    fn sync_draft(&mut self, output: &mut FrameOutput) {
        let world = self.engine.world();
        match (query::dialog(world), self.draft.is_some()) {
            (Some(dialog), false) => {
                let draft = match dialog {
                    TokenDialog::Placement { .. } => TokenDetails::default(),
                    TokenDialog::Edit { token } => query::token(world, token)
                        .map(|token| TokenDetails {
                            label: token.label.clone(),
                            icon: token.icon.clone(),
                            color: token.color.clone().unwrap_or_default(),
                            notes: token.notes.clone(),
                        })
                        .unwrap_or_default(),
                };
                output.status.push(LABEL_HINT.to_owned());
                self.draft = Some(draft);
            }
            (None, true) => self.draft = None,
            _ => {}
        }
    }

    fn track_hover(&mut self, position: glam::Vec2) {
        let hovered = self.engine.hovered_hex(position);
        if hovered != self.hovered {
            if let Some(hex) = hovered {
                tracing::debug!(%hex, "hovering hex");
            }
            self.hovered = hovered;
        }
    }
}

fn hex_readout(hex: HexId) -> String {
    format!("Hex {}, {}", hex.column(), hex.row())
}

impl Drop for Session {
    fn drop(&mut self) {
        self.engine.flush_persistence();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::mpsc, time::Duration};

    use glam::Vec2;
    use hexfog_core::{InputEvent, Modifiers, PointerButton};
    use hexfog_engine::EngineConfig;

    fn booted_session(directory: &tempfile::TempDir) -> (Session, Vec2) {
        let (sender, receiver) = mpsc::channel();
        let mut engine = Engine::new(
            EngineConfig::default(),
            JsonFileStore::new(directory.path().join("map.json")),
            NoticeFeed::forwarding(sender),
        );
        engine.boot();
        let cell = query::hexes(engine.world())
            .iter()
            .find(|cell| cell.id == HexId::new(3, 2))
            .map(|cell| cell.center)
            .expect("hex 3,2");
        (Session::new(engine, receiver, None), cell)
    }

    fn frame_with(events: Vec<HostInput>) -> FrameInput {
        FrameInput {
            elapsed: Duration::ZERO,
            viewport: Vec2::new(800.0, 600.0),
            visible: true,
            events,
        }
    }

    #[test]
    fn first_frame_requests_the_placeholder() {
        let directory = tempfile::tempdir().expect("tempdir");
        let (mut session, _) = booted_session(&directory);
        let mut layers = Layers::default();

        let output = session.frame(frame_with(Vec::new()), &mut layers);
        assert_eq!(output.load_image, Some(ImageSource::Placeholder));

        let output = session.frame(frame_with(Vec::new()), &mut layers);
        assert_eq!(output.load_image, None);
    }

    #[test]
    fn hovering_shows_the_hex_coordinates() {
        let directory = tempfile::tempdir().expect("tempdir");
        let (mut session, center) = booted_session(&directory);
        let mut layers = Layers::default();
        let hover = InputEvent::mouse(
            InputPhase::Move,
            PointerButton::Primary,
            center,
            Modifiers::default(),
            Duration::ZERO,
        );

        let output = session.frame(frame_with(vec![HostInput::Pointer(hover)]), &mut layers);
        assert_eq!(output.readout.as_deref(), Some("Hex 3, 2"));

        let output = session.frame(frame_with(Vec::new()), &mut layers);
        assert_eq!(output.readout.as_deref(), Some("Hex 3, 2"));
    }
}
