use std::collections::BTreeMap;

use glam::Vec2;
use serde::{de::IgnoredAny, Deserialize, Serialize};

use crate::{
    settings::{
        is_hex_color, WarningKind, DEFAULT_FOG_COLOR, DEFAULT_GRID_COLOR, DEFAULT_TOKEN_COLOR,
    },
    CameraView, NumericField, Orientation, RevealedSet, SettingWarning, Settings, Token,
};

/// Persisted camera values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Zoom factor.
    pub zoom_level: f32,
    /// Horizontal pan in screen pixels.
    pub pan_x: f32,
    /// Vertical pan in screen pixels.
    pub pan_y: f32,
}

impl From<CameraView> for ViewState {
    fn from(camera: CameraView) -> Self {
        Self {
            zoom_level: camera.zoom(),
            pan_x: camera.pan().x,
            pan_y: camera.pan().y,
        }
    }
}

impl From<ViewState> for CameraView {
    fn from(view: ViewState) -> Self {
        CameraView::new(Vec2::new(view.pan_x, view.pan_y), view.zoom_level)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        CameraView::default().into()
    }
}

/// Complete persisted record: settings, view, tokens and revealed hexes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapState {
    /// Grid and appearance settings.
    pub settings: Settings,
    /// Camera values.
    pub view: ViewState,
    /// Tokens in list order.
    pub tokens: Vec<Token>,
    /// Revealed hex identifiers.
    pub revealed_hexes: RevealedSet,
}

/// A field that either parsed as `T` or held something else.
///
/// Wrapping every persisted field this way lets one malformed value fall back
/// to its default instead of discarding the whole record.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Lenient<T> {
    /// The value parsed as expected.
    Valid(T),
    /// The value had an unexpected shape.
    Invalid(IgnoredAny),
}

impl<T> Lenient<T> {
    /// Returns the parsed value, if any.
    pub fn valid(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }
}

/// Settings as read from storage, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettings {
    /// Raw hex size.
    pub hex_size: Option<Lenient<f64>>,
    /// Raw horizontal offset.
    pub offset_x: Option<Lenient<f64>>,
    /// Raw vertical offset.
    pub offset_y: Option<Lenient<f64>>,
    /// Raw column count.
    pub column_count: Option<Lenient<f64>>,
    /// Raw row count.
    pub row_count: Option<Lenient<f64>>,
    /// Raw orientation name.
    pub orientation: Option<Lenient<String>>,
    /// Raw map scale.
    pub map_scale: Option<Lenient<f64>>,
    /// Raw fog color.
    pub fog_color: Option<Lenient<String>>,
    /// Raw fog opacity.
    pub fog_opacity: Option<Lenient<f64>>,
    /// Raw grid color.
    pub grid_color: Option<Lenient<String>>,
    /// Raw grid thickness.
    pub grid_thickness: Option<Lenient<f64>>,
    /// Raw token color.
    pub token_color: Option<Lenient<String>>,
}

impl RawSettings {
    /// Validates every present field on top of `base`.
    ///
    /// Missing fields keep the value from `base`. Malformed fields use the
    /// documented default and numbers outside their range are clamped; both
    /// produce a warning.
    #[must_use]
    pub fn resolve(self, base: &Settings) -> (Settings, Vec<SettingWarning>) {
        let mut settings = base.clone();
        let mut warnings = Vec::new();
        let numbers = [
            (NumericField::HexSize, self.hex_size),
            (NumericField::OffsetX, self.offset_x),
            (NumericField::OffsetY, self.offset_y),
            (NumericField::ColumnCount, self.column_count),
            (NumericField::RowCount, self.row_count),
            (NumericField::MapScale, self.map_scale),
            (NumericField::FogOpacity, self.fog_opacity),
            (NumericField::GridThickness, self.grid_thickness),
        ];
        for (field, raw) in numbers {
            let Some(raw) = raw else { continue };
            let value = raw.valid().unwrap_or(f64::NAN);
            let (value, warning) = field.sanitize(value);
            settings.set_number(field, value);
            warnings.extend(warning);
        }

        if let Some(raw) = self.orientation {
            match raw.valid().as_deref().and_then(Orientation::parse) {
                Some(orientation) => settings.orientation = orientation,
                None => {
                    settings.orientation = Orientation::Pointy;
                    warnings.push(SettingWarning {
                        field: "orientation",
                        kind: WarningKind::InvalidOrientation,
                    });
                }
            }
        }

        let colors = [
            ("fogColor", self.fog_color, &mut settings.fog_color, DEFAULT_FOG_COLOR),
            ("gridColor", self.grid_color, &mut settings.grid_color, DEFAULT_GRID_COLOR),
            ("tokenColor", self.token_color, &mut settings.token_color, DEFAULT_TOKEN_COLOR),
        ];
        for (field, raw, slot, default) in colors {
            let Some(raw) = raw else { continue };
            match raw.valid() {
                Some(color) if is_hex_color(&color) => *slot = color,
                _ => {
                    *slot = default.to_owned();
                    warnings.push(SettingWarning {
                        field,
                        kind: WarningKind::InvalidColor { default },
                    });
                }
            }
        }

        (settings, warnings)
    }
}

/// View as read from storage, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawView {
    /// Raw zoom factor.
    pub zoom_level: Option<Lenient<f64>>,
    /// Raw horizontal pan.
    pub pan_x: Option<Lenient<f64>>,
    /// Raw vertical pan.
    pub pan_y: Option<Lenient<f64>>,
}

impl RawView {
    fn resolve(self) -> CameraView {
        let number = |raw: Option<Lenient<f64>>, fallback: f32| {
            raw.and_then(Lenient::valid)
                .filter(|value| value.is_finite())
                .map_or(fallback, |value| value as f32)
        };
        let pan = Vec2::new(number(self.pan_x, 0.0), number(self.pan_y, 0.0));
        CameraView::new(pan, number(self.zoom_level, 1.0))
    }
}

/// Token as read from storage, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawToken {
    /// Raw x coordinate.
    pub x: Option<Lenient<f64>>,
    /// Raw y coordinate.
    pub y: Option<Lenient<f64>>,
    /// Raw color.
    pub color: Option<Lenient<String>>,
    /// Raw label.
    pub label: Option<Lenient<String>>,
    /// Raw icon.
    pub icon: Option<Lenient<String>>,
    /// Raw notes.
    pub notes: Option<Lenient<String>>,
    /// Raw draw order.
    pub z_index: Option<Lenient<f64>>,
}

impl RawToken {
    /// Converts the raw token; tokens without a finite position are dropped.
    ///
    /// A missing draw order falls back to `position + 1`.
    fn resolve(self, position: usize) -> Option<Token> {
        let coordinate = |raw: Option<Lenient<f64>>| {
            raw.and_then(Lenient::valid)
                .filter(|value| value.is_finite())
                .map(|value| value as f32)
        };
        let text = |raw: Option<Lenient<String>>| raw.and_then(Lenient::valid).unwrap_or_default();
        let x = coordinate(self.x)?;
        let y = coordinate(self.y)?;
        let z_index = self
            .z_index
            .and_then(Lenient::valid)
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map_or(position as u32 + 1, |value| value as u32);
        Some(Token {
            x,
            y,
            color: self
                .color
                .and_then(Lenient::valid)
                .filter(|color| !color.is_empty()),
            label: text(self.label),
            icon: text(self.icon),
            notes: text(self.notes),
            z_index,
        })
    }
}

/// Persisted record as read from storage, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMapState {
    /// Raw settings object.
    pub settings: Option<Lenient<RawSettings>>,
    /// Raw view object.
    pub view: Option<Lenient<RawView>>,
    /// Raw token list.
    pub tokens: Option<Lenient<Vec<Lenient<RawToken>>>>,
    /// Raw revealed-hex map.
    pub revealed_hexes: Option<Lenient<BTreeMap<String, Lenient<bool>>>>,
}

/// A validated state plus the adjustments made while validating it.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedState {
    /// State ready to install.
    pub state: MapState,
    /// Adjustments made to individual fields.
    pub warnings: Vec<String>,
}

/// Errors raised when an imported state is structurally unusable.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// A required top-level key is missing or has the wrong shape.
    #[error("invalid map state: missing `{key}`")]
    MissingKey {
        /// Name of the missing key.
        key: &'static str,
    },
}

impl RawMapState {
    /// Validates the record, falling back per field wherever something is missing.
    #[must_use]
    pub fn into_lenient(self, defaults: &Settings) -> LoadedState {
        let mut warnings = Vec::new();

        let settings = match self.settings.and_then(Lenient::valid) {
            Some(raw) => {
                let (settings, adjusted) = raw.resolve(defaults);
                warnings.extend(adjusted.iter().map(ToString::to_string));
                settings
            }
            None => defaults.clone(),
        };

        let camera = self
            .view
            .and_then(Lenient::valid)
            .map(RawView::resolve)
            .unwrap_or_default();

        let raw_tokens = self
            .tokens
            .and_then(Lenient::valid)
            .unwrap_or_default();
        let total = raw_tokens.len();
        let tokens: Vec<Token> = raw_tokens
            .into_iter()
            .enumerate()
            .filter_map(|(position, raw)| raw.valid()?.resolve(position))
            .collect();
        if tokens.len() < total {
            warnings.push(format!(
                "dropped {} token(s) without a valid position",
                total - tokens.len()
            ));
        }

        let revealed_hexes = self
            .revealed_hexes
            .and_then(Lenient::valid)
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, revealed)| matches!(revealed, Lenient::Valid(true)))
            .filter_map(|(key, _)| key.parse().ok())
            .collect();

        LoadedState {
            state: MapState {
                settings,
                view: camera.into(),
                tokens,
                revealed_hexes,
            },
            warnings,
        }
    }

    /// Validates an imported record that must carry `settings` and `revealedHexes`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::MissingKey`] when either required key is absent or
    /// is not an object.
    pub fn into_strict(self, defaults: &Settings) -> Result<LoadedState, StateError> {
        if !matches!(self.settings, Some(Lenient::Valid(_))) {
            return Err(StateError::MissingKey { key: "settings" });
        }
        if !matches!(self.revealed_hexes, Some(Lenient::Valid(_))) {
            return Err(StateError::MissingKey {
                key: "revealedHexes",
            });
        }
        Ok(self.into_lenient(defaults))
    }
}
