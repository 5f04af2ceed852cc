use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GridConfig, Orientation};

/// Persisted configuration of the grid and its appearance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Circumradius of every hex in world units.
    pub hex_size: f32,
    /// Horizontal world offset of the first hex center.
    pub offset_x: f32,
    /// Vertical world offset of the first hex center.
    pub offset_y: f32,
    /// Number of hex columns.
    pub column_count: u32,
    /// Number of hex rows.
    pub row_count: u32,
    /// Layout of the grid.
    pub orientation: Orientation,
    /// Background image scale as a percentage.
    pub map_scale: f32,
    /// Fog fill color as `#RRGGBB`.
    pub fog_color: String,
    /// Fog opacity between 0 and 1.
    pub fog_opacity: f32,
    /// Grid stroke color as `#RRGGBB`.
    pub grid_color: String,
    /// Grid stroke width in world units.
    pub grid_thickness: f32,
    /// Default fill color for new tokens as `#RRGGBB`.
    pub token_color: String,
}

impl Settings {
    /// Extracts the geometry that determines the generated grid.
    #[must_use]
    pub fn grid(&self) -> GridConfig {
        GridConfig {
            hex_size: self.hex_size,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            columns: self.column_count,
            rows: self.row_count,
            orientation: self.orientation,
        }
    }

    /// Copies grid geometry into the settings record.
    pub fn set_grid(&mut self, config: &GridConfig) {
        self.hex_size = config.hex_size;
        self.offset_x = config.offset_x;
        self.offset_y = config.offset_y;
        self.column_count = config.columns;
        self.row_count = config.rows;
        self.orientation = config.orientation;
    }

    /// Applies a single field change, sanitizing the incoming value.
    ///
    /// Out-of-range numbers are clamped and unparseable input falls back to the
    /// field default; either case is reported through the returned warning.
    pub fn apply_update(&mut self, update: SettingUpdate) -> SettingOutcome {
        let before = self.grid();
        let previous = self.clone();
        let warning = match update {
            SettingUpdate::Number(field, value) => {
                let (sanitized, warning) = field.sanitize(value);
                self.set_number(field, sanitized);
                warning
            }
            SettingUpdate::Orientation(orientation) => {
                self.orientation = orientation;
                None
            }
            SettingUpdate::FogColor(color) => {
                assign_color(&mut self.fog_color, color, "fogColor", DEFAULT_FOG_COLOR)
            }
            SettingUpdate::GridColor(color) => {
                assign_color(&mut self.grid_color, color, "gridColor", DEFAULT_GRID_COLOR)
            }
            SettingUpdate::TokenColor(color) => {
                assign_color(&mut self.token_color, color, "tokenColor", DEFAULT_TOKEN_COLOR)
            }
        };

        SettingOutcome {
            changed: previous != *self,
            regenerate_grid: before != self.grid(),
            warning,
        }
    }

    pub(crate) fn set_number(&mut self, field: NumericField, value: f64) {
        match field {
            NumericField::HexSize => self.hex_size = value as f32,
            NumericField::OffsetX => self.offset_x = value as f32,
            NumericField::OffsetY => self.offset_y = value as f32,
            NumericField::ColumnCount => self.column_count = value.round() as u32,
            NumericField::RowCount => self.row_count = value.round() as u32,
            NumericField::MapScale => self.map_scale = value as f32,
            NumericField::FogOpacity => self.fog_opacity = value as f32,
            NumericField::GridThickness => self.grid_thickness = value as f32,
        }
    }
}

pub(crate) const DEFAULT_FOG_COLOR: &str = "#225522";
pub(crate) const DEFAULT_GRID_COLOR: &str = "#FFFFFF";
pub(crate) const DEFAULT_TOKEN_COLOR: &str = "#FF0000";

impl Default for Settings {
    fn default() -> Self {
        Self {
            hex_size: NumericField::HexSize.range().default as f32,
            offset_x: 0.0,
            offset_y: 0.0,
            column_count: 20,
            row_count: 15,
            orientation: Orientation::Pointy,
            map_scale: 100.0,
            fog_color: DEFAULT_FOG_COLOR.to_owned(),
            fog_opacity: 0.85,
            grid_color: DEFAULT_GRID_COLOR.to_owned(),
            grid_thickness: 1.0,
            token_color: DEFAULT_TOKEN_COLOR.to_owned(),
        }
    }
}

fn assign_color(
    slot: &mut String,
    color: String,
    field: &'static str,
    default: &'static str,
) -> Option<SettingWarning> {
    if is_hex_color(&color) {
        *slot = color;
        None
    } else {
        *slot = default.to_owned();
        Some(SettingWarning {
            field,
            kind: WarningKind::InvalidColor { default },
        })
    }
}

/// Reports whether the string is a `#RRGGBB` color.
#[must_use]
pub(crate) fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Numeric settings fields that carry a validated range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumericField {
    /// Hex circumradius.
    HexSize,
    /// Horizontal grid offset.
    OffsetX,
    /// Vertical grid offset.
    OffsetY,
    /// Number of columns.
    ColumnCount,
    /// Number of rows.
    RowCount,
    /// Background image scale percentage.
    MapScale,
    /// Fog opacity.
    FogOpacity,
    /// Grid stroke width.
    GridThickness,
}

/// Inclusive range and fallback for a numeric field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumericRange {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
    /// Value used when the input is not a number.
    pub default: f64,
}

impl NumericField {
    /// Persisted field name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HexSize => "hexSize",
            Self::OffsetX => "offsetX",
            Self::OffsetY => "offsetY",
            Self::ColumnCount => "columnCount",
            Self::RowCount => "rowCount",
            Self::MapScale => "mapScale",
            Self::FogOpacity => "fogOpacity",
            Self::GridThickness => "gridThickness",
        }
    }

    /// Accepted range and fallback.
    #[must_use]
    pub const fn range(self) -> NumericRange {
        let (min, max, default) = match self {
            Self::HexSize => (10.0, 300.0, 40.0),
            Self::OffsetX | Self::OffsetY => (-1000.0, 1000.0, 0.0),
            Self::ColumnCount => (1.0, 200.0, 20.0),
            Self::RowCount => (1.0, 200.0, 15.0),
            Self::MapScale => (10.0, 500.0, 100.0),
            Self::FogOpacity => (0.0, 1.0, 0.85),
            Self::GridThickness => (0.0, 10.0, 1.0),
        };
        NumericRange { min, max, default }
    }

    /// Clamps the value into range, substituting the default for non-finite input.
    #[must_use]
    pub fn sanitize(self, value: f64) -> (f64, Option<SettingWarning>) {
        let range = self.range();
        let field = self.name();
        if !value.is_finite() {
            let warning = SettingWarning {
                field,
                kind: WarningKind::NotANumber {
                    default: range.default,
                },
            };
            return (range.default, Some(warning));
        }
        if value < range.min {
            let warning = SettingWarning {
                field,
                kind: WarningKind::BelowMinimum { min: range.min },
            };
            return (range.min, Some(warning));
        }
        if value > range.max {
            let warning = SettingWarning {
                field,
                kind: WarningKind::AboveMaximum { max: range.max },
            };
            return (range.max, Some(warning));
        }
        (value, None)
    }
}

/// A single settings change requested by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum SettingUpdate {
    /// Sets a numeric field. Non-finite values fall back to the field default.
    Number(NumericField, f64),
    /// Sets the grid orientation.
    Orientation(Orientation),
    /// Sets the fog color.
    FogColor(String),
    /// Sets the grid color.
    GridColor(String),
    /// Sets the default token color.
    TokenColor(String),
}

/// Result of [`Settings::apply_update`].
#[derive(Clone, Debug, PartialEq)]
pub struct SettingOutcome {
    /// Whether any field changed value.
    pub changed: bool,
    /// Whether the grid geometry changed and cells must be regenerated.
    pub regenerate_grid: bool,
    /// Adjustment made to the incoming value, if any.
    pub warning: Option<SettingWarning>,
}

/// Describes how an incoming settings value was adjusted.
#[derive(Clone, Debug, PartialEq)]
pub struct SettingWarning {
    /// Persisted name of the adjusted field.
    pub field: &'static str,
    /// Kind of adjustment.
    pub kind: WarningKind,
}

/// Kind of adjustment applied to a settings value.
#[derive(Clone, Debug, PartialEq)]
pub enum WarningKind {
    /// Input was not a number and the default was used.
    NotANumber {
        /// Value that replaced the input.
        default: f64,
    },
    /// Input was below the minimum and was raised.
    BelowMinimum {
        /// Value that replaced the input.
        min: f64,
    },
    /// Input was above the maximum and was lowered.
    AboveMaximum {
        /// Value that replaced the input.
        max: f64,
    },
    /// Input was not a `#RRGGBB` color and the default was used.
    InvalidColor {
        /// Value that replaced the input.
        default: &'static str,
    },
    /// Input was not a known orientation and the default was used.
    InvalidOrientation,
}

impl fmt::Display for SettingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.field)?;
        match &self.kind {
            WarningKind::NotANumber { default } => {
                write!(f, "invalid input, using default value {default}")
            }
            WarningKind::BelowMinimum { min } => write!(f, "value too small, minimum is {min}"),
            WarningKind::AboveMaximum { max } => write!(f, "value too large, maximum is {max}"),
            WarningKind::InvalidColor { default } => {
                write!(f, "invalid color, using default {default}")
            }
            WarningKind::InvalidOrientation => write!(f, "unknown orientation, using pointy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.hex_size, 40.0);
        assert_eq!(settings.column_count, 20);
        assert_eq!(settings.row_count, 15);
        assert_eq!(settings.map_scale, 100.0);
        assert_eq!(settings.fog_color, "#225522");
        assert!((settings.fog_opacity - 0.85).abs() < f32::EPSILON);
        assert_eq!(settings.orientation, Orientation::Pointy);
    }

    #[test]
    fn out_of_range_hex_size_is_clamped_with_warning() {
        let mut settings = Settings::default();
        let outcome = settings.apply_update(SettingUpdate::Number(NumericField::HexSize, 5.0));
        assert_eq!(settings.hex_size, 10.0);
        assert!(outcome.regenerate_grid);
        assert_eq!(
            outcome.warning.map(|warning| warning.kind),
            Some(WarningKind::BelowMinimum { min: 10.0 })
        );
    }

    #[test]
    fn non_numeric_column_count_uses_default() {
        let mut settings = Settings::default();
        settings.column_count = 50;
        let outcome =
            settings.apply_update(SettingUpdate::Number(NumericField::ColumnCount, f64::NAN));
        assert_eq!(settings.column_count, 20);
        assert!(outcome.warning.is_some());
    }

    #[test]
    fn appearance_changes_do_not_regenerate_grid() {
        let mut settings = Settings::default();
        let outcome = settings.apply_update(SettingUpdate::FogColor("#000000".to_owned()));
        assert!(outcome.changed);
        assert!(!outcome.regenerate_grid);
        assert!(outcome.warning.is_none());
    }

    #[test]
    fn malformed_color_falls_back_to_default() {
        let mut settings = Settings::default();
        settings.grid_color = "#123456".to_owned();
        let outcome = settings.apply_update(SettingUpdate::GridColor("white".to_owned()));
        assert_eq!(settings.grid_color, "#FFFFFF");
        assert!(outcome.warning.is_some());
    }

    #[test]
    fn unchanged_value_reports_no_change() {
        let mut settings = Settings::default();
        let outcome = settings.apply_update(SettingUpdate::Number(NumericField::RowCount, 15.0));
        assert!(!outcome.changed);
    }
}
