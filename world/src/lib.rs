#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative map state: grid, fog, tokens, camera and interaction modes.
//!
//! All mutation flows through [`apply`], which executes one [`Command`] and
//! reports what changed as [`Event`] values. Read access goes through the
//! [`query`] module so hit testing and rendering never observe a half-applied
//! change.

mod fog;
mod tokens;

use glam::Vec2;
use hexfog_core::{
    CameraView, Command, Event, GridConfig, InteractionModes, RemovalError, Settings, TokenIndex,
};
use hexfog_system_geometry::{screen_to_world, zoom_about_anchor};

use fog::FogLayer;
use tokens::TokenRegistry;

/// Token dialog awaiting confirmation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenDialog {
    /// A new token will be created at the world position.
    Placement {
        /// World position of the pending token.
        position: Vec2,
    },
    /// An existing token's details are being edited.
    Edit {
        /// Token being edited.
        token: TokenIndex,
    },
}

/// Represents the authoritative map state.
#[derive(Debug)]
pub struct World {
    settings: Settings,
    fog: FogLayer,
    tokens: TokenRegistry,
    camera: CameraView,
    modes: InteractionModes,
    selected_token: Option<TokenIndex>,
    dialog: Option<TokenDialog>,
    debug_overlay: bool,
}

impl World {
    /// Creates a world with default settings and no generated grid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Creates a world with the provided settings and no generated grid.
    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            tokens: TokenRegistry::new(settings.hex_size),
            settings,
            fog: FogLayer::new(),
            camera: CameraView::default(),
            modes: InteractionModes::default(),
            selected_token: None,
            dialog: None,
            debug_overlay: false,
        }
    }

    fn regenerate(&mut self, out_events: &mut Vec<Event>) {
        let config = self.settings.grid();
        self.fog.regenerate(config);
        self.tokens.rebuild(config.hex_size);
        tracing::debug!(
            columns = config.columns,
            rows = config.rows,
            hex_size = config.hex_size,
            "hex grid regenerated"
        );
        out_events.push(Event::GridGenerated {
            hexes: self.fog.cells().len(),
            revealed: self.fog.revealed_cell_count(),
        });
    }

    fn grid_outdated(&self, config: &GridConfig) -> bool {
        self.fog.config() != Some(config)
    }

    fn select(&mut self, token: Option<TokenIndex>, out_events: &mut Vec<Event>) {
        let token = token.filter(|token| token.get() < self.tokens.len());
        if self.selected_token != token {
            self.selected_token = token;
            out_events.push(Event::TokenSelected { token });
        }
    }

    fn set_camera(&mut self, camera: CameraView, out_events: &mut Vec<Event>) {
        if self.camera != camera {
            self.camera = camera;
            out_events.push(Event::CameraChanged { camera });
        }
    }

    fn set_modes(&mut self, modes: InteractionModes, out_events: &mut Vec<Event>) {
        if self.modes != modes {
            self.modes = modes;
            out_events.push(Event::ModesChanged { modes });
        }
    }

    /// Clears transient references into the token list after it was rebuilt or shrunk.
    fn forget_token_references(&mut self, out_events: &mut Vec<Event>) {
        self.select(None, out_events);
        if matches!(self.dialog, Some(TokenDialog::Edit { .. })) {
            self.dialog = None;
            out_events.push(Event::TokenDialogClosed);
        }
    }

    fn remove_token(&mut self, token: TokenIndex, out_events: &mut Vec<Event>) {
        if self.tokens.remove(token).is_none() {
            out_events.push(Event::TokenRemovalRejected {
                reason: RemovalError::MissingToken,
            });
            return;
        }
        self.forget_token_references(out_events);
        out_events.push(Event::TokenRemoved { token });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { config } => {
            world.settings.set_grid(&config);
            world.regenerate(out_events);
        }
        Command::ApplySettings { settings } => {
            let regenerate = world.grid_outdated(&settings.grid());
            world.settings = *settings;
            if regenerate {
                world.regenerate(out_events);
            }
            out_events.push(Event::SettingsApplied {
                regenerated: regenerate,
            });
        }
        Command::LoadState { state } => {
            let state = *state;
            world.settings = state.settings;
            world.fog.replace_revealed(state.revealed_hexes);
            world
                .tokens
                .replace_all(state.tokens, world.settings.hex_size);
            world.forget_token_references(out_events);
            world.dialog = None;
            world.set_camera(state.view.into(), out_events);
            world.regenerate(out_events);
            out_events.push(Event::StateLoaded {
                tokens: world.tokens.len(),
            });
        }
        Command::RevealHex { hex } => {
            if world.fog.reveal(hex) {
                out_events.push(Event::HexRevealed { hex });
            }
        }
        Command::HideHex { hex } => {
            if world.fog.hide(hex) {
                out_events.push(Event::HexHidden { hex });
            }
        }
        Command::ResetFog => {
            world.fog.reset();
            out_events.push(Event::FogReset);
        }
        Command::PanBy { delta } => {
            let camera = world.camera.panned_by(delta);
            world.set_camera(camera, out_events);
        }
        Command::ZoomAt { anchor, zoom } => {
            let camera = zoom_about_anchor(world.camera, anchor, zoom);
            world.set_camera(camera, out_events);
        }
        Command::ResetView => {
            world.set_camera(CameraView::default(), out_events);
            world.select(None, out_events);
            let modes = InteractionModes {
                adding_token: false,
                removing_token: false,
                ..world.modes
            };
            world.set_modes(modes, out_events);
            out_events.push(Event::ViewReset);
        }
        Command::SetRevealMode { reveal } => {
            let modes = InteractionModes {
                reveal,
                ..world.modes
            };
            world.set_modes(modes, out_events);
        }
        Command::SetAddTokenMode { active } => {
            let modes = InteractionModes {
                adding_token: active,
                removing_token: world.modes.removing_token && !active,
                ..world.modes
            };
            world.set_modes(modes, out_events);
        }
        Command::SetRemoveTokenMode { active } => {
            let modes = InteractionModes {
                removing_token: active,
                adding_token: world.modes.adding_token && !active,
                ..world.modes
            };
            world.set_modes(modes, out_events);
        }
        Command::SelectToken { token } => world.select(token, out_events),
        Command::BeginTokenPlacement { position } => {
            world.dialog = Some(TokenDialog::Placement { position });
            out_events.push(Event::TokenPlacementPending { position });
        }
        Command::BeginTokenEdit { token } => {
            if world.tokens.get(token).is_some() {
                world.dialog = Some(TokenDialog::Edit { token });
                out_events.push(Event::TokenEditRequested { token });
            }
        }
        Command::ConfirmToken { details } => {
            let color = if details.color.trim().is_empty() {
                world.settings.token_color.clone()
            } else {
                details.color.trim().to_owned()
            };
            match world.dialog.take() {
                Some(TokenDialog::Placement { position }) => {
                    let token = world.tokens.push(position);
                    if let Some(entry) = world.tokens.get_mut(token) {
                        entry.apply_details(&details, color.clone());
                    }
                    world.settings.token_color = color;
                    world.select(Some(token), out_events);
                    let modes = InteractionModes {
                        adding_token: false,
                        ..world.modes
                    };
                    world.set_modes(modes, out_events);
                    out_events.push(Event::TokenAdded { token });
                }
                Some(TokenDialog::Edit { token }) => {
                    if let Some(entry) = world.tokens.get_mut(token) {
                        entry.apply_details(&details, color.clone());
                        world.settings.token_color = color;
                        world.select(Some(token), out_events);
                        out_events.push(Event::TokenUpdated { token });
                    }
                }
                None => {}
            }
        }
        Command::CancelTokenDialog => {
            if world.dialog.take().is_some() {
                out_events.push(Event::TokenDialogClosed);
            }
        }
        Command::MoveToken { token, position } => {
            if world.tokens.set_position(token, position) {
                out_events.push(Event::TokenMoved { token });
            }
        }
        Command::CommitTokenDrag { token, from } => {
            if world.tokens.commit_move(token) {
                tracing::debug!(slot = token.get(), from = ?from, "token drag committed");
                out_events.push(Event::TokenDragCommitted { token });
            }
        }
        Command::RemoveToken { token } => world.remove_token(token, out_events),
        Command::RemoveTokenAt { position } => {
            match query::find_token_at(world, position) {
                Some(token) => world.remove_token(token, out_events),
                None => out_events.push(Event::TokenRemovalRejected {
                    reason: RemovalError::NoTokenAtPosition,
                }),
            }
        }
        Command::ClearTokens => {
            let count = world.tokens.clear();
            if count > 0 {
                world.forget_token_references(out_events);
            }
            out_events.push(Event::TokensCleared { count });
        }
        Command::RestoreSnapshot { snapshot } => {
            let snapshot = *snapshot;
            world.fog.replace_revealed(snapshot.revealed);
            world
                .tokens
                .replace_all(snapshot.tokens, world.settings.hex_size);
            world.forget_token_references(out_events);
            world.set_camera(snapshot.camera, out_events);
            out_events.push(Event::SnapshotRestored);
        }
        Command::SetDebugOverlay { enabled } => {
            if world.debug_overlay != enabled {
                world.debug_overlay = enabled;
                out_events.push(Event::DebugOverlayChanged { enabled });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use hexfog_core::{
        CameraView, HexCell, HistorySnapshot, InteractionModes, MapState, RevealedSet, Settings,
        Token, TokenIndex,
    };

    use super::{screen_to_world, TokenDialog, World};

    /// Current settings record.
    #[must_use]
    pub fn settings(world: &World) -> &Settings {
        &world.settings
    }

    /// Generated cells in row-major order. Empty until a grid is generated.
    #[must_use]
    pub fn hexes(world: &World) -> &[HexCell] {
        world.fog.cells()
    }

    /// Reports whether a grid has been generated.
    #[must_use]
    pub fn grid_generated(world: &World) -> bool {
        world.fog.config().is_some()
    }

    /// Revealed hex identifiers, including ones outside the current grid.
    #[must_use]
    pub fn revealed(world: &World) -> &RevealedSet {
        world.fog.revealed()
    }

    /// Tokens in list order.
    #[must_use]
    pub fn tokens(world: &World) -> &[Token] {
        world.tokens.tokens()
    }

    /// Token at the provided list position.
    #[must_use]
    pub fn token(world: &World, token: TokenIndex) -> Option<&Token> {
        world.tokens.get(token)
    }

    /// Draw order the next raised or created token receives.
    #[must_use]
    pub fn next_z_index(world: &World) -> u32 {
        world.tokens.next_z_index()
    }

    /// Cached list position of every token as seen by the hit-test index.
    ///
    /// Entry `i` equals `Some(i)` whenever the index is consistent.
    #[must_use]
    pub fn cached_token_slots(world: &World) -> Vec<Option<usize>> {
        world.tokens.cached_slots()
    }

    /// Current camera.
    #[must_use]
    pub fn camera(world: &World) -> CameraView {
        world.camera
    }

    /// Current interaction modes.
    #[must_use]
    pub fn modes(world: &World) -> InteractionModes {
        world.modes
    }

    /// Currently selected token, if any.
    #[must_use]
    pub fn selected_token(world: &World) -> Option<TokenIndex> {
        world.selected_token
    }

    /// Open token dialog, if any.
    #[must_use]
    pub fn dialog(world: &World) -> Option<TokenDialog> {
        world.dialog
    }

    /// Reports whether the debug overlay is drawn.
    #[must_use]
    pub fn debug_overlay(world: &World) -> bool {
        world.debug_overlay
    }

    /// Maps a screen position into world space through the current camera.
    #[must_use]
    pub fn to_world(world: &World, screen: Vec2) -> Vec2 {
        screen_to_world(screen, world.camera.pan(), world.camera.zoom())
    }

    /// Hex under the screen position, if any.
    #[must_use]
    pub fn find_hex_at(world: &World, screen: Vec2) -> Option<&HexCell> {
        world.fog.find_at(to_world(world, screen))
    }

    /// Topmost token under the screen position, if any.
    #[must_use]
    pub fn find_token_at(world: &World, screen: Vec2) -> Option<TokenIndex> {
        world.tokens.find_at(to_world(world, screen))
    }

    /// Deep copy of the undoable state.
    #[must_use]
    pub fn snapshot(world: &World) -> HistorySnapshot {
        HistorySnapshot {
            revealed: world.fog.revealed().clone(),
            tokens: world.tokens.tokens().to_vec(),
            camera: world.camera,
        }
    }

    /// Complete persisted record.
    #[must_use]
    pub fn full_state(world: &World) -> MapState {
        MapState {
            settings: world.settings.clone(),
            view: world.camera.into(),
            tokens: world.tokens.tokens().to_vec(),
            revealed_hexes: world.fog.revealed().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfog_core::{HexId, MapState, Token, TokenDetails};

    fn generated_world() -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureGrid {
                config: GridConfig {
                    columns: 4,
                    rows: 4,
                    ..GridConfig::default()
                },
            },
            &mut events,
        );
        world
    }

    fn run(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    #[test]
    fn configure_grid_reports_generated_cells() {
        let mut world = World::new();
        let events = run(
            &mut world,
            Command::ConfigureGrid {
                config: GridConfig {
                    columns: 3,
                    rows: 2,
                    ..GridConfig::default()
                },
            },
        );
        assert_eq!(
            events,
            vec![Event::GridGenerated {
                hexes: 6,
                revealed: 0
            }]
        );
        assert_eq!(query::settings(&world).column_count, 3);
    }

    #[test]
    fn queries_miss_before_grid_generation() {
        let world = World::new();
        assert!(!query::grid_generated(&world));
        assert!(query::find_hex_at(&world, Vec2::ZERO).is_none());
        assert!(query::find_token_at(&world, Vec2::ZERO).is_none());
    }

    #[test]
    fn revealing_an_already_revealed_hex_is_silent() {
        let mut world = generated_world();
        let hex = HexId::new(1, 1);
        assert_eq!(
            run(&mut world, Command::RevealHex { hex }),
            vec![Event::HexRevealed { hex }]
        );
        assert!(run(&mut world, Command::RevealHex { hex }).is_empty());
    }

    #[test]
    fn confirming_placement_adds_selects_and_leaves_add_mode() {
        let mut world = generated_world();
        let _ = run(&mut world, Command::SetAddTokenMode { active: true });
        let _ = run(
            &mut world,
            Command::BeginTokenPlacement {
                position: Vec2::new(50.0, 60.0),
            },
        );
        let events = run(
            &mut world,
            Command::ConfirmToken {
                details: TokenDetails {
                    label: "  Goblin ".to_owned(),
                    ..TokenDetails::default()
                },
            },
        );

        let token = TokenIndex::new(0);
        assert!(events.contains(&Event::TokenAdded { token }));
        assert_eq!(query::selected_token(&world), Some(token));
        assert!(!query::modes(&world).adding_token);
        let stored = query::token(&world, token).expect("token stored");
        assert_eq!(stored.label, "Goblin");
        assert_eq!(stored.color.as_deref(), Some("#FF0000"));
        assert_eq!(query::dialog(&world), None);
    }

    #[test]
    fn confirm_without_dialog_does_nothing() {
        let mut world = generated_world();
        let events = run(
            &mut world,
            Command::ConfirmToken {
                details: TokenDetails::default(),
            },
        );
        assert!(events.is_empty());
        assert!(query::tokens(&world).is_empty());
    }

    #[test]
    fn explicit_token_color_becomes_new_default() {
        let mut world = generated_world();
        let _ = run(
            &mut world,
            Command::BeginTokenPlacement {
                position: Vec2::ZERO,
            },
        );
        let _ = run(
            &mut world,
            Command::ConfirmToken {
                details: TokenDetails {
                    color: "#00FF00".to_owned(),
                    ..TokenDetails::default()
                },
            },
        );
        assert_eq!(query::settings(&world).token_color, "#00FF00");
    }

    #[test]
    fn add_and_remove_modes_are_mutually_exclusive() {
        let mut world = generated_world();
        let _ = run(&mut world, Command::SetRemoveTokenMode { active: true });
        let _ = run(&mut world, Command::SetAddTokenMode { active: true });
        let modes = query::modes(&world);
        assert!(modes.adding_token);
        assert!(!modes.removing_token);
    }

    #[test]
    fn removing_missing_token_is_rejected() {
        let mut world = generated_world();
        assert_eq!(
            run(
                &mut world,
                Command::RemoveToken {
                    token: TokenIndex::new(3)
                }
            ),
            vec![Event::TokenRemovalRejected {
                reason: RemovalError::MissingToken
            }]
        );
    }

    #[test]
    fn clearing_empty_token_list_reports_zero() {
        let mut world = generated_world();
        assert_eq!(
            run(&mut world, Command::ClearTokens),
            vec![Event::TokensCleared { count: 0 }]
        );
    }

    #[test]
    fn reset_view_restores_camera_and_leaves_token_modes() {
        let mut world = generated_world();
        let _ = run(
            &mut world,
            Command::PanBy {
                delta: Vec2::new(30.0, 40.0),
            },
        );
        let _ = run(&mut world, Command::SetRevealMode { reveal: false });
        let _ = run(&mut world, Command::SetRemoveTokenMode { active: true });
        let events = run(&mut world, Command::ResetView);

        assert_eq!(query::camera(&world), CameraView::default());
        let modes = query::modes(&world);
        assert!(!modes.removing_token);
        assert!(!modes.reveal, "reveal mode is not part of the view");
        assert_eq!(events.last(), Some(&Event::ViewReset));
    }

    #[test]
    fn load_state_installs_everything_and_regenerates() {
        let mut world = World::new();
        let mut state = MapState::default();
        state.settings.column_count = 2;
        state.settings.row_count = 2;
        let _ = state.revealed_hexes.insert(HexId::new(1, 1));
        state.tokens.push(Token::at(Vec2::new(10.0, 10.0), 4));
        state.view.pan_x = 25.0;

        let events = run(
            &mut world,
            Command::LoadState {
                state: Box::new(state.clone()),
            },
        );

        assert!(events.contains(&Event::GridGenerated {
            hexes: 4,
            revealed: 1
        }));
        assert_eq!(query::next_z_index(&world), 5);
        assert_eq!(query::full_state(&world), state);
    }
}
