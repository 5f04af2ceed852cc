#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the hexfog map engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Input adapters and the gesture
//! system submit [`Command`] values describing desired mutations, the world
//! executes those commands via its `apply` entry point, and then broadcasts
//! [`Event`] values that the engine uses to decide whether a change is
//! committed to history, persisted, and redrawn.

mod input;
mod settings;
mod sinks;
mod state;

use std::{collections::BTreeSet, fmt, str::FromStr};

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use input::{InputDevice, InputEvent, InputPhase, Key, Modifiers, PointerButton};
pub use settings::{
    NumericField, NumericRange, SettingOutcome, SettingUpdate, SettingWarning, Settings,
    WarningKind,
};
pub use sinks::{Notice, NoticeLevel, PersistenceSink, StatusSink};
pub use state::{
    Lenient, LoadedState, MapState, RawMapState, RawSettings, RawToken, RawView, StateError,
    ViewState,
};

/// Smallest zoom factor the camera accepts.
pub const ZOOM_MIN: f32 = 0.1;

/// Largest zoom factor the camera accepts.
pub const ZOOM_MAX: f32 = 5.0;

/// Token radius and hit-test radius expressed as a fraction of the hex size.
pub const TOKEN_RADIUS_FACTOR: f32 = 0.4;

/// Default number of snapshots retained by the undo history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid geometry settings and regenerates every hex cell.
    ConfigureGrid {
        /// Layout that the regenerated grid must follow.
        config: GridConfig,
    },
    /// Replaces the full settings record, regenerating the grid when its geometry changed.
    ApplySettings {
        /// Settings that become authoritative.
        settings: Box<Settings>,
    },
    /// Replaces settings, view, tokens and fog with a persisted state.
    LoadState {
        /// State to install.
        state: Box<MapState>,
    },
    /// Requests that a hex be revealed.
    RevealHex {
        /// Identifier of the hex to reveal.
        hex: HexId,
    },
    /// Requests that a hex be covered with fog again.
    HideHex {
        /// Identifier of the hex to hide.
        hex: HexId,
    },
    /// Covers every hex with fog.
    ResetFog,
    /// Shifts the camera by a delta measured in screen pixels.
    PanBy {
        /// Translation applied to the pan offset.
        delta: Vec2,
    },
    /// Zooms the camera while keeping the anchor's world position fixed on screen.
    ZoomAt {
        /// Screen position that stays stationary.
        anchor: Vec2,
        /// Requested zoom factor before clamping.
        zoom: f32,
    },
    /// Restores the default camera, clears the selection and leaves token modes.
    ResetView,
    /// Enables or disables reveal mode. Disabled means clicks hide hexes.
    SetRevealMode {
        /// Whether clicks reveal hexes.
        reveal: bool,
    },
    /// Enters or leaves add-token mode.
    SetAddTokenMode {
        /// Whether add-token mode should be active.
        active: bool,
    },
    /// Enters or leaves remove-token mode.
    SetRemoveTokenMode {
        /// Whether remove-token mode should be active.
        active: bool,
    },
    /// Changes the selected token.
    SelectToken {
        /// Token to select, or `None` to clear the selection.
        token: Option<TokenIndex>,
    },
    /// Opens the token dialog for a token about to be placed.
    BeginTokenPlacement {
        /// World position the new token will occupy.
        position: Vec2,
    },
    /// Opens the token dialog to edit an existing token.
    BeginTokenEdit {
        /// Token whose details are being edited.
        token: TokenIndex,
    },
    /// Confirms the open token dialog with the provided details.
    ConfirmToken {
        /// Details entered into the dialog.
        details: TokenDetails,
    },
    /// Closes the token dialog without changing any token.
    CancelTokenDialog,
    /// Moves a token while it is being dragged.
    MoveToken {
        /// Token being dragged.
        token: TokenIndex,
        /// World position the token now occupies.
        position: Vec2,
    },
    /// Finishes a drag, re-indexing the token and raising it to the top.
    CommitTokenDrag {
        /// Token that was dragged.
        token: TokenIndex,
        /// World position the token occupied before the drag started.
        from: Vec2,
    },
    /// Removes a token by index.
    RemoveToken {
        /// Token to remove.
        token: TokenIndex,
    },
    /// Removes the topmost token under a screen position, if any.
    RemoveTokenAt {
        /// Screen position that was clicked.
        position: Vec2,
    },
    /// Removes every token.
    ClearTokens,
    /// Replaces fog, tokens and camera with a history snapshot.
    RestoreSnapshot {
        /// Snapshot to restore.
        snapshot: Box<HistorySnapshot>,
    },
    /// Enables or disables the debug overlay.
    SetDebugOverlay {
        /// Whether the overlay should be drawn.
        enabled: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the hex grid was rebuilt.
    GridGenerated {
        /// Number of hexes in the new grid.
        hexes: usize,
        /// Number of hexes in the new grid flagged as revealed.
        revealed: usize,
    },
    /// Confirms that the settings record was replaced.
    SettingsApplied {
        /// Whether the grid was regenerated as part of the change.
        regenerated: bool,
    },
    /// Confirms that a persisted state was installed.
    StateLoaded {
        /// Number of tokens in the installed state.
        tokens: usize,
    },
    /// Confirms that a hex was revealed.
    HexRevealed {
        /// Identifier of the revealed hex.
        hex: HexId,
    },
    /// Confirms that a hex was covered with fog.
    HexHidden {
        /// Identifier of the hidden hex.
        hex: HexId,
    },
    /// Confirms that every hex was covered with fog.
    FogReset,
    /// Announces a new camera transform.
    CameraChanged {
        /// Camera after the change.
        camera: CameraView,
    },
    /// Confirms that the view was reset to its defaults.
    ViewReset,
    /// Announces a change to the interaction modes.
    ModesChanged {
        /// Modes after the change.
        modes: InteractionModes,
    },
    /// Announces a selection change.
    TokenSelected {
        /// Newly selected token, if any.
        token: Option<TokenIndex>,
    },
    /// Announces that a token dialog opened for a new token.
    TokenPlacementPending {
        /// World position the new token will occupy.
        position: Vec2,
    },
    /// Announces that a token dialog opened for an existing token.
    TokenEditRequested {
        /// Token being edited.
        token: TokenIndex,
    },
    /// Announces that the token dialog closed without changes.
    TokenDialogClosed,
    /// Confirms that a token was added.
    TokenAdded {
        /// Index assigned to the new token.
        token: TokenIndex,
    },
    /// Confirms that a token's details were edited.
    TokenUpdated {
        /// Index of the edited token.
        token: TokenIndex,
    },
    /// Reports an intermediate drag position.
    TokenMoved {
        /// Token being dragged.
        token: TokenIndex,
    },
    /// Confirms that a drag finished and the token was re-indexed.
    TokenDragCommitted {
        /// Token that was dragged.
        token: TokenIndex,
    },
    /// Confirms that a token was removed.
    TokenRemoved {
        /// Index the token occupied before removal.
        token: TokenIndex,
    },
    /// Reports that a token removal request was rejected.
    TokenRemovalRejected {
        /// Specific reason the removal failed.
        reason: RemovalError,
    },
    /// Confirms a request to clear every token.
    TokensCleared {
        /// Number of tokens removed. Zero means nothing changed.
        count: usize,
    },
    /// Confirms that a history snapshot was restored.
    SnapshotRestored,
    /// Announces a change to the debug overlay flag.
    DebugOverlayChanged {
        /// Whether the overlay is drawn.
        enabled: bool,
    },
}

impl Event {
    /// Reports whether the event records a user-visible change that belongs in history.
    #[must_use]
    pub const fn commits_history(&self) -> bool {
        match self {
            Self::HexRevealed { .. }
            | Self::HexHidden { .. }
            | Self::FogReset
            | Self::ViewReset
            | Self::TokenAdded { .. }
            | Self::TokenUpdated { .. }
            | Self::TokenDragCommitted { .. }
            | Self::TokenRemoved { .. } => true,
            Self::TokensCleared { count } => *count > 0,
            _ => false,
        }
    }

    /// Reports whether the event changes state that must be written to persistence.
    #[must_use]
    pub const fn requires_persistence(&self) -> bool {
        self.commits_history()
            || matches!(
                self,
                Self::SettingsApplied { .. }
                    | Self::GridGenerated { .. }
                    | Self::SnapshotRestored
                    | Self::CameraChanged { .. }
            )
    }

    /// Reports whether token list positions held outside the world are stale after the event.
    #[must_use]
    pub const fn invalidates_token_indices(&self) -> bool {
        match self {
            Self::TokenRemoved { .. } | Self::StateLoaded { .. } | Self::SnapshotRestored => true,
            Self::TokensCleared { count } => *count > 0,
            _ => false,
        }
    }
}

/// Reasons a token removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// No token exists at the requested index.
    MissingToken,
    /// No token lies under the clicked position.
    NoTokenAtPosition,
}

/// Layout of the hex grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Hexes with a vertex pointing up; odd rows shift right by half a hex.
    #[default]
    Pointy,
    /// Hexes with an edge on top; odd columns shift down by half a hex.
    Flat,
}

impl Orientation {
    /// Returns the persisted name of the orientation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pointy => "pointy",
            Self::Flat => "flat",
        }
    }

    /// Parses a persisted orientation name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pointy" => Some(Self::Pointy),
            "flat" => Some(Self::Flat),
            _ => None,
        }
    }
}

/// Geometry parameters that fully determine the generated hex grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    /// Circumradius of every hex in world units.
    pub hex_size: f32,
    /// Horizontal world offset of the first hex center.
    pub offset_x: f32,
    /// Vertical world offset of the first hex center.
    pub offset_y: f32,
    /// Number of hex columns.
    pub columns: u32,
    /// Number of hex rows.
    pub rows: u32,
    /// Layout of the grid.
    pub orientation: Orientation,
}

impl Default for GridConfig {
    fn default() -> Self {
        Settings::default().grid()
    }
}

/// Identifier of a hex, rendered as `"<column>-<row>"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexId {
    column: u32,
    row: u32,
}

impl HexId {
    /// Creates an identifier from grid coordinates.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column of the hex.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row of the hex.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

impl fmt::Display for HexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.column, self.row)
    }
}

/// Error returned when a string is not a `"<column>-<row>"` identifier.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a hex identifier")]
pub struct ParseHexIdError(String);

impl FromStr for HexId {
    type Err = ParseHexIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseHexIdError(value.to_owned());
        let (column, row) = value.split_once('-').ok_or_else(invalid)?;
        let column = column.parse().map_err(|_| invalid())?;
        let row = row.parse().map_err(|_| invalid())?;
        Ok(Self::new(column, row))
    }
}

/// One cell of the generated grid. Cells are rebuilt whenever the grid changes.
#[derive(Clone, Debug, PartialEq)]
pub struct HexCell {
    /// Identifier derived from the cell's column and row.
    pub id: HexId,
    /// World-space center of the cell.
    pub center: Vec2,
    /// World-space corners in drawing order.
    pub vertices: [Vec2; 6],
    /// Whether the fog over the cell has been lifted.
    pub revealed: bool,
}

/// Set of revealed hex identifiers, persisted as a `{"<col>-<row>": true}` map.
///
/// Identifiers outside the current grid are kept so that shrinking and then
/// growing the grid restores the earlier reveals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "std::collections::BTreeMap<String, bool>",
    into = "std::collections::BTreeMap<String, bool>"
)]
pub struct RevealedSet {
    ids: BTreeSet<HexId>,
}

impl RevealedSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports whether the hex is revealed.
    #[must_use]
    pub fn contains(&self, hex: HexId) -> bool {
        self.ids.contains(&hex)
    }

    /// Marks the hex as revealed. Returns `false` when it already was.
    pub fn insert(&mut self, hex: HexId) -> bool {
        self.ids.insert(hex)
    }

    /// Covers the hex. Returns `false` when it was not revealed.
    pub fn remove(&mut self, hex: HexId) -> bool {
        self.ids.remove(&hex)
    }

    /// Covers every hex.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Number of revealed identifiers, including ones outside the current grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Reports whether nothing is revealed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates the revealed identifiers in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = HexId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<HexId> for RevealedSet {
    fn from_iter<I: IntoIterator<Item = HexId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl From<std::collections::BTreeMap<String, bool>> for RevealedSet {
    fn from(map: std::collections::BTreeMap<String, bool>) -> Self {
        map.into_iter()
            .filter(|(_, revealed)| *revealed)
            .filter_map(|(key, _)| key.parse().ok())
            .collect()
    }
}

impl From<RevealedSet> for std::collections::BTreeMap<String, bool> {
    fn from(set: RevealedSet) -> Self {
        set.ids.iter().map(|id| (id.to_string(), true)).collect()
    }
}

/// Position of a token within the token list, ordered by insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenIndex(usize);

impl TokenIndex {
    /// Creates a new token index wrapper.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the underlying list position.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Marker placed on the map at a world position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// World x coordinate of the token center.
    pub x: f32,
    /// World y coordinate of the token center.
    pub y: f32,
    /// Fill color as `#RRGGBB`. Missing colors fall back to the settings token color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Text drawn below the token.
    #[serde(default)]
    pub label: String,
    /// Short glyph drawn inside the token.
    #[serde(default)]
    pub icon: String,
    /// Free-form notes kept with the token.
    #[serde(default)]
    pub notes: String,
    /// Draw order. Higher values are drawn later and win hit tests.
    pub z_index: u32,
}

impl Token {
    /// Creates an unlabeled token at the provided world position.
    #[must_use]
    pub fn at(position: Vec2, z_index: u32) -> Self {
        Self {
            x: position.x,
            y: position.y,
            color: None,
            label: String::new(),
            icon: String::new(),
            notes: String::new(),
            z_index,
        }
    }

    /// World position of the token center.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Moves the token center.
    pub fn set_position(&mut self, position: Vec2) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Copies label, icon, notes and color from dialog details.
    pub fn apply_details(&mut self, details: &TokenDetails, color: String) {
        self.label = details.label.trim().to_owned();
        self.icon = details.icon.trim().to_owned();
        self.notes = details.notes.trim().to_owned();
        self.color = Some(color);
    }
}

/// Values entered into the token dialog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenDetails {
    /// Text drawn below the token.
    pub label: String,
    /// Short glyph drawn inside the token.
    pub icon: String,
    /// Requested fill color. Empty falls back to the settings token color.
    pub color: String,
    /// Free-form notes.
    pub notes: String,
}

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Smallest x coordinate covered.
    pub x_min: f32,
    /// Smallest y coordinate covered.
    pub y_min: f32,
    /// Largest x coordinate covered.
    pub x_max: f32,
    /// Largest y coordinate covered.
    pub y_max: f32,
}

impl Bounds {
    /// Creates bounds from explicit extents.
    #[must_use]
    pub const fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates a square of half-width `half_extent` around `center`.
    #[must_use]
    pub fn around(center: Vec2, half_extent: f32) -> Self {
        Self::new(
            center.x - half_extent,
            center.y - half_extent,
            center.x + half_extent,
            center.y + half_extent,
        )
    }

    /// Reports whether the point lies inside or on the edge of the bounds.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }

    /// Reports whether two bounds overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }

    /// Reports whether every extent is a finite number.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x_min.is_finite()
            && self.y_min.is_finite()
            && self.x_max.is_finite()
            && self.y_max.is_finite()
    }
}

/// Pan and zoom applied to every layer. Zoom is always within [`ZOOM_MIN`, `ZOOM_MAX`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pan: Vec2,
    zoom: f32,
}

impl CameraView {
    /// Creates a camera, clamping the zoom into the supported range.
    #[must_use]
    pub fn new(pan: Vec2, zoom: f32) -> Self {
        Self {
            pan,
            zoom: clamp_zoom(zoom),
        }
    }

    /// Screen-space translation applied before scaling.
    #[must_use]
    pub const fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Scale factor applied after translation.
    #[must_use]
    pub const fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Returns a copy shifted by `delta` screen pixels.
    #[must_use]
    pub fn panned_by(self, delta: Vec2) -> Self {
        Self {
            pan: self.pan + delta,
            zoom: self.zoom,
        }
    }
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

/// Clamps a zoom factor into [`ZOOM_MIN`, `ZOOM_MAX`]; non-finite values become `1.0`.
#[must_use]
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(ZOOM_MIN, ZOOM_MAX)
    } else {
        1.0
    }
}

/// Mutually exclusive token modes plus the reveal toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InteractionModes {
    /// Whether clicks reveal (`true`) or hide (`false`) hexes.
    pub reveal: bool,
    /// Whether the next click places a token.
    pub adding_token: bool,
    /// Whether the next click removes a token.
    pub removing_token: bool,
}

impl InteractionModes {
    /// Reports whether either token mode is active.
    #[must_use]
    pub const fn token_mode_active(&self) -> bool {
        self.adding_token || self.removing_token
    }
}

impl Default for InteractionModes {
    fn default() -> Self {
        Self {
            reveal: true,
            adding_token: false,
            removing_token: false,
        }
    }
}

/// State captured by the undo history.
#[derive(Clone, Debug, PartialEq)]
pub struct HistorySnapshot {
    /// Revealed hex identifiers.
    pub revealed: RevealedSet,
    /// Tokens in list order.
    pub tokens: Vec<Token>,
    /// Camera at the time of the snapshot.
    pub camera: CameraView,
}
