#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Top-level controller for the hex map.
//!
//! The [`Engine`] owns the world, the gesture machine, the undo history, the
//! frame scheduler and the two host-provided sinks. Every host call turns
//! into a batch of [`Command`] values; the resulting [`Event`] batch decides
//! whether one history snapshot is pushed, whether persistence is owed, which
//! notices are shown, and that the next frame must be redrawn.

mod notices;
mod persistence;

use std::time::Duration;

use glam::Vec2;
use hexfog_core::{
    Command, Event, GridConfig, HexId, HistorySnapshot, InputEvent, InputPhase, Key, MapState,
    Modifiers, Notice, NoticeLevel, PersistenceSink, PointerButton, RawMapState, SettingOutcome,
    SettingUpdate, Settings, StateError, StatusSink, TokenDetails, DEFAULT_HISTORY_CAPACITY,
};
use hexfog_rendering::{
    render_layers, BackgroundImage, FrameScheduler, FrameSource, ImageEvent, ImageOutcome,
    ImageSource, Layers,
};
use hexfog_system_gestures::{shortcut_for, GestureMachine, Shortcut};
use hexfog_system_history::History;
use hexfog_world::{apply, query, World};

pub use hexfog_system_gestures::GesturePhase;

use notices::notice_for;
use persistence::PendingSave;

/// Construction parameters for an [`Engine`].
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Snapshots kept on each history stack.
    pub history_capacity: usize,
    /// Quiet period between the last change and the save. Zero saves synchronously.
    pub persistence_debounce: Duration,
    /// Settings used for new maps and for fields missing from loaded state.
    pub defaults: Settings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            persistence_debounce: Duration::ZERO,
            defaults: Settings::default(),
        }
    }
}

/// Hex map engine driven by a host window.
#[derive(Debug)]
pub struct Engine<P, S> {
    world: World,
    gestures: GestureMachine,
    history: History<HistorySnapshot>,
    pending_save: PendingSave,
    persistence: P,
    status: S,
    scheduler: FrameScheduler,
    image: BackgroundImage,
    viewport: Vec2,
    defaults: Settings,
    now: Duration,
}

impl<P: PersistenceSink, S: StatusSink> Engine<P, S> {
    /// Creates an engine with an empty world. Call [`Self::boot`] to load or generate a map.
    pub fn new(config: EngineConfig, persistence: P, status: S) -> Self {
        let world = World::with_settings(config.defaults.clone());
        let mut history = History::new(config.history_capacity);
        history.reset(query::snapshot(&world));
        Self {
            world,
            gestures: GestureMachine::new(),
            history,
            pending_save: PendingSave::new(config.persistence_debounce),
            persistence,
            status,
            scheduler: FrameScheduler::new(),
            image: BackgroundImage::new(),
            viewport: Vec2::ZERO,
            defaults: config.defaults,
            now: Duration::ZERO,
        }
    }

    /// Restores the saved map, or generates a fresh grid from the defaults.
    ///
    /// Either way the history starts over with the resulting state as baseline.
    pub fn boot(&mut self) {
        match self.persistence.load() {
            Some(raw) => {
                let loaded = raw.into_lenient(&self.defaults);
                for warning in loaded.warnings {
                    tracing::warn!(%warning, "saved state adjusted");
                    self.notify(NoticeLevel::Warning, warning);
                }
                let mut events = Vec::new();
                let command = Command::LoadState {
                    state: Box::new(loaded.state),
                };
                apply(&mut self.world, command, &mut events);
                self.scheduler.request_redraw();
                tracing::info!(
                    tokens = query::tokens(&self.world).len(),
                    revealed = query::revealed(&self.world).len(),
                    "restored saved map"
                );
            }
            None => {
                let config = self.defaults.grid();
                self.generate_grid(config);
                tracing::info!("no saved map, generated default grid");
            }
        }
        self.reset_history();
    }

    /// Replaces the grid layout and regenerates every cell.
    ///
    /// Reveals are kept by identifier and the token index is rebuilt. The
    /// change is persisted but does not enter history.
    pub fn generate_grid(&mut self, config: GridConfig) {
        self.execute(vec![Command::ConfigureGrid { config }]);
    }

    /// Installs a complete state and starts a new history from it.
    pub fn apply_state(&mut self, state: MapState) {
        self.execute(vec![Command::LoadState {
            state: Box::new(state),
        }]);
        self.reset_history();
    }

    /// Validates and installs an imported state, saving it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when a required section is missing. The live
    /// state is left untouched and an error notice is shown.
    pub fn import_state(&mut self, raw: RawMapState) -> Result<(), StateError> {
        let loaded = match raw.into_strict(&self.defaults) {
            Ok(loaded) => loaded,
            Err(error) => {
                tracing::warn!(%error, "import rejected");
                self.notify(
                    NoticeLevel::Error,
                    "Error importing file. Please check the file format.",
                );
                return Err(error);
            }
        };
        for warning in loaded.warnings {
            tracing::warn!(%warning, "imported state adjusted");
            self.notify(NoticeLevel::Warning, warning);
        }
        self.apply_state(loaded.state);
        self.save_now();
        tracing::info!("map state imported");
        self.notify(NoticeLevel::Success, "Map state imported successfully!");
        Ok(())
    }

    /// Complete persisted record of the current map.
    #[must_use]
    pub fn full_state(&self) -> MapState {
        query::full_state(&self.world)
    }

    /// Read access to the world for hosts that display dialogs or readouts.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Phase of the gesture in progress.
    #[must_use]
    pub fn gesture_phase(&self) -> GesturePhase {
        self.gestures.phase()
    }

    /// Persistence sink.
    #[must_use]
    pub const fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Status sink.
    #[must_use]
    pub const fn status(&self) -> &S {
        &self.status
    }

    /// Reports whether an undo step is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Reports whether a redo step is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Reports whether a change is waiting for the debounced save.
    #[must_use]
    pub const fn has_unsaved_changes(&self) -> bool {
        self.pending_save.is_pending()
    }

    /// Feeds a pointer event captured by the host. Presses are ignored while a
    /// token dialog is open.
    pub fn handle_input(&mut self, event: &InputEvent) {
        if event.phase == InputPhase::Press && self.dialog_open() {
            return;
        }
        let mut commands = Vec::new();
        self.gestures.handle(&self.world, event, &mut commands);
        self.execute(commands);
    }

    /// Mouse button press.
    pub fn handle_pointer_down(
        &mut self,
        position: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
        timestamp: Duration,
    ) {
        let event = InputEvent::mouse(InputPhase::Press, button, position, modifiers, timestamp);
        self.handle_input(&event);
    }

    /// Mouse movement.
    pub fn handle_pointer_move(
        &mut self,
        position: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
        timestamp: Duration,
    ) {
        let event = InputEvent::mouse(InputPhase::Move, button, position, modifiers, timestamp);
        self.handle_input(&event);
    }

    /// Mouse button release.
    pub fn handle_pointer_up(
        &mut self,
        position: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
        timestamp: Duration,
    ) {
        let event = InputEvent::mouse(InputPhase::Release, button, position, modifiers, timestamp);
        self.handle_input(&event);
    }

    /// Pointer left the canvas or was captured elsewhere. Ends any gesture.
    pub fn handle_pointer_cancel(&mut self, position: Vec2, timestamp: Duration) {
        let event = InputEvent::mouse(
            InputPhase::Cancel,
            PointerButton::Primary,
            position,
            Modifiers::default(),
            timestamp,
        );
        self.handle_input(&event);
    }

    /// A finger touched down. `touches` lists every active finger.
    pub fn handle_touch_start(&mut self, touches: &[Vec2], changed: Vec2, timestamp: Duration) {
        self.handle_input(&InputEvent::touch(InputPhase::Press, touches, changed, timestamp));
    }

    /// Active fingers moved.
    pub fn handle_touch_move(&mut self, touches: &[Vec2], changed: Vec2, timestamp: Duration) {
        self.handle_input(&InputEvent::touch(InputPhase::Move, touches, changed, timestamp));
    }

    /// A finger lifted. `touches` lists the fingers still down.
    pub fn handle_touch_end(&mut self, touches: &[Vec2], changed: Vec2, timestamp: Duration) {
        self.handle_input(&InputEvent::touch(InputPhase::Release, touches, changed, timestamp));
    }

    /// The platform cancelled the touch sequence.
    pub fn handle_touch_cancel(&mut self, touches: &[Vec2], changed: Vec2, timestamp: Duration) {
        self.handle_input(&InputEvent::touch(InputPhase::Cancel, touches, changed, timestamp));
    }

    /// Double click. Opens the editor for the token underneath.
    pub fn handle_double_click(&mut self, position: Vec2) {
        if self.dialog_open() {
            return;
        }
        let mut commands = Vec::new();
        self.gestures
            .handle_double_click(&self.world, position, &mut commands);
        self.execute(commands);
    }

    /// Scroll wheel. Zooms about the cursor.
    pub fn handle_wheel(&mut self, position: Vec2, delta_y: f32) {
        if self.dialog_open() {
            return;
        }
        let mut commands = Vec::new();
        self.gestures
            .handle_wheel(&self.world, position, delta_y, &mut commands);
        self.execute(commands);
    }

    /// Key press. Returns whether the key was bound to an action.
    pub fn handle_key(&mut self, key: Key, modifiers: Modifiers) -> bool {
        if self.dialog_open() {
            if key == Key::Escape {
                self.cancel_token_dialog();
                return true;
            }
            return false;
        }
        let Some(shortcut) = shortcut_for(key, modifiers) else {
            return false;
        };
        match shortcut {
            Shortcut::Undo => {
                let _ = self.undo();
            }
            Shortcut::Redo => {
                let _ = self.redo();
            }
            Shortcut::ToggleRevealMode => self.toggle_reveal_mode(),
            Shortcut::ToggleAddToken => self.toggle_add_token_mode(),
            Shortcut::Cancel => {
                let command = if query::modes(&self.world).adding_token {
                    Command::SetAddTokenMode { active: false }
                } else {
                    Command::SelectToken { token: None }
                };
                self.execute(vec![command]);
            }
            Shortcut::DeleteSelected => {
                if let Some(token) = query::selected_token(&self.world) {
                    self.execute(vec![Command::RemoveToken { token }]);
                }
            }
            Shortcut::Pan(delta) => self.execute(vec![Command::PanBy { delta }]),
            Shortcut::Zoom(factor) => {
                let zoom = query::camera(&self.world).zoom() * factor;
                self.execute(vec![Command::ZoomAt {
                    anchor: self.viewport / 2.0,
                    zoom,
                }]);
            }
        }
        true
    }

    /// Confirms the open token dialog.
    pub fn confirm_token(&mut self, details: TokenDetails) {
        self.execute(vec![Command::ConfirmToken { details }]);
    }

    /// Closes the open token dialog without changes.
    pub fn cancel_token_dialog(&mut self) {
        self.execute(vec![Command::CancelTokenDialog]);
    }

    /// Flips between revealing and hiding hexes on click.
    pub fn toggle_reveal_mode(&mut self) {
        let reveal = !query::modes(&self.world).reveal;
        self.execute(vec![Command::SetRevealMode { reveal }]);
        let target = if reveal { "Reveal" } else { "Hide" };
        self.notify(
            NoticeLevel::Info,
            format!("Mode switched to: {target} hexes"),
        );
    }

    /// Enters or leaves add-token mode. Entering leaves remove-token mode.
    pub fn toggle_add_token_mode(&mut self) {
        let active = !query::modes(&self.world).adding_token;
        self.execute(vec![Command::SetAddTokenMode { active }]);
        if active {
            self.notify(NoticeLevel::Info, "Click on the map to place a token");
        }
    }

    /// Enters or leaves remove-token mode. Entering leaves add-token mode.
    pub fn toggle_remove_token_mode(&mut self) {
        let active = !query::modes(&self.world).removing_token;
        self.execute(vec![Command::SetRemoveTokenMode { active }]);
        if active {
            self.notify(NoticeLevel::Info, "Click a token to remove it");
        }
    }

    /// Covers every hex with fog.
    pub fn reset_fog(&mut self) {
        self.execute(vec![Command::ResetFog]);
    }

    /// Removes every token.
    pub fn clear_tokens(&mut self) {
        self.execute(vec![Command::ClearTokens]);
    }

    /// Shows or hides the debug overlay.
    pub fn toggle_debug_overlay(&mut self) {
        let enabled = !query::debug_overlay(&self.world);
        self.execute(vec![Command::SetDebugOverlay { enabled }]);
    }

    /// Changes one setting, sanitizing the value.
    ///
    /// Adjusted values raise a warning notice. Settings changes are persisted
    /// and redrawn but never enter history.
    pub fn update_setting(&mut self, update: SettingUpdate) -> SettingOutcome {
        let mut settings = query::settings(&self.world).clone();
        let outcome = settings.apply_update(update);
        if let Some(warning) = &outcome.warning {
            tracing::warn!(%warning, "setting adjusted");
            self.notify(NoticeLevel::Warning, warning.to_string());
        }
        if outcome.changed {
            self.execute(vec![Command::ApplySettings {
                settings: Box::new(settings),
            }]);
        }
        outcome
    }

    /// Steps back one committed action. Returns `false` at the baseline.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            tracing::debug!("nothing to undo");
            return false;
        };
        self.restore(snapshot);
        tracing::info!(remaining = self.history.undo_depth(), "undo");
        true
    }

    /// Re-applies the last undone action. Returns `false` when nothing was undone.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            tracing::debug!("nothing to redo");
            return false;
        };
        self.restore(snapshot);
        tracing::info!(remaining = self.history.redo_depth(), "redo");
        true
    }

    /// Restores the default camera, clears the selection and leaves token modes.
    pub fn reset_view(&mut self) {
        self.execute(vec![Command::ResetView]);
    }

    /// Marks the layers as stale.
    pub fn request_redraw(&mut self) {
        self.scheduler.request_redraw();
    }

    /// Records the canvas size used for culling and keyboard zoom.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        let viewport = Vec2::new(width.max(0.0), height.max(0.0));
        if viewport != self.viewport {
            self.viewport = viewport;
            self.scheduler.request_redraw();
        }
    }

    /// Suspends drawing while the window is hidden.
    pub fn set_visible(&mut self, visible: bool) {
        if self.scheduler.set_visible(visible) {
            tracing::debug!("render loop resumed");
        }
    }

    /// Rebuilds the layers if anything changed since the last frame.
    ///
    /// Returns `false`, leaving `layers` untouched, when no redraw was pending
    /// or drawing is suspended.
    pub fn render_frame(&mut self, layers: &mut Layers) -> bool {
        if !self.scheduler.begin_frame() {
            return false;
        }
        let world = &self.world;
        let modes = query::modes(world);
        let source = FrameSource {
            settings: query::settings(world),
            hexes: query::hexes(world),
            tokens: query::tokens(world),
            revealed_count: query::revealed(world).len(),
            camera: query::camera(world),
            viewport: self.viewport,
            selected: query::selected_token(world),
            reveal_mode: modes.reveal,
            debug_overlay: query::debug_overlay(world),
            image_size: self.image.size(),
        };
        let stats = render_layers(&source, layers);
        tracing::trace!(
            hexes = stats.hexes,
            tokens = stats.tokens,
            frame = self.scheduler.frames_drawn(),
            "map redrawn"
        );
        true
    }

    /// Starts loading a background image. The host reports the result through
    /// [`Self::on_image_event`].
    pub fn load_map_image(&mut self, source: ImageSource) -> ImageSource {
        tracing::info!(?source, "loading map image");
        self.image.request(source)
    }

    /// Applies an image load result. Returns the next source to load, if any.
    pub fn on_image_event(&mut self, event: ImageEvent) -> Option<ImageSource> {
        match self.image.on_event(event) {
            ImageOutcome::Ready { size } => {
                tracing::info!(width = size.x, height = size.y, "map image loaded");
                self.notify(NoticeLevel::Success, "Map loaded successfully!");
                self.scheduler.request_redraw();
                None
            }
            ImageOutcome::Fallback { reason } => {
                tracing::warn!(%reason, "map image failed, using placeholder");
                self.notify(
                    NoticeLevel::Warning,
                    format!("Could not load map image ({reason}). Using placeholder."),
                );
                Some(ImageSource::Placeholder)
            }
            ImageOutcome::Fatal { reason } => {
                tracing::error!(%reason, "placeholder image failed");
                self.notify(NoticeLevel::Error, "Error loading map");
                None
            }
            ImageOutcome::Ignored => None,
        }
    }

    /// Advances the host clock and performs a save once its debounce elapsed.
    pub fn tick(&mut self, now: Duration) {
        self.now = now;
        if self.pending_save.is_due(now) {
            self.save_now();
        }
    }

    /// Saves immediately if a change is pending.
    pub fn flush_persistence(&mut self) {
        if self.pending_save.is_pending() {
            self.save_now();
        }
    }

    /// Hex under the screen position, for coordinate readouts.
    #[must_use]
    pub fn hovered_hex(&self, screen: Vec2) -> Option<HexId> {
        query::find_hex_at(&self.world, screen).map(|cell| cell.id)
    }

    fn dialog_open(&self) -> bool {
        query::dialog(&self.world).is_some()
    }

    fn execute(&mut self, commands: Vec<Command>) {
        if commands.is_empty() {
            return;
        }
        let mut events = Vec::new();
        for command in commands {
            apply(&mut self.world, command, &mut events);
        }
        self.process_events(&events);
    }

    fn process_events(&mut self, events: &[Event]) {
        if events.is_empty() {
            return;
        }
        if self.gestures.phase() != GesturePhase::Idle
            && events.iter().any(Event::invalidates_token_indices)
        {
            tracing::debug!(phase = ?self.gestures.phase(), "gesture aborted by token list change");
            self.gestures.abort();
        }
        if events.iter().any(Event::commits_history) {
            self.history.push(query::snapshot(&self.world));
        }
        if events.iter().any(Event::requires_persistence) {
            self.pending_save.mark(self.now);
            if self.pending_save.is_due(self.now) {
                self.save_now();
            }
        }
        for event in events {
            tracing::debug!(?event, "world event");
            if let Some(notice) = notice_for(event) {
                self.status.notify(notice);
            }
        }
        self.scheduler.request_redraw();
    }

    fn restore(&mut self, snapshot: HistorySnapshot) {
        self.execute(vec![Command::RestoreSnapshot {
            snapshot: Box::new(snapshot),
        }]);
    }

    fn reset_history(&mut self) {
        self.history.reset(query::snapshot(&self.world));
    }

    fn save_now(&mut self) {
        let _ = self.pending_save.take();
        let state = query::full_state(&self.world);
        self.persistence.save(&state);
        tracing::debug!("map state saved");
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.status.notify(Notice::new(level, message));
    }
}
