use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use hexfog_core::{
    NumericField, Orientation, SettingUpdate, Settings, DEFAULT_HISTORY_CAPACITY,
};
use hexfog_engine::EngineConfig;
use serde::Deserialize;

/// Errors raised while reading the TOML configuration file.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file {path}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or contains unknown keys.
    #[error("invalid config file {path}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of the optional `--config` file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AppConfig {
    pub(crate) window: WindowConfig,
    pub(crate) history: HistoryConfig,
    pub(crate) persistence: PersistenceConfig,
    pub(crate) defaults: DefaultsConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowConfig {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Hexfog".to_owned(),
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HistoryConfig {
    pub(crate) capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PersistenceConfig {
    pub(crate) debounce_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self { debounce_ms: 300 }
    }
}

/// Settings overrides for new maps, using the persisted field names.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct DefaultsConfig {
    hex_size: Option<f64>,
    offset_x: Option<f64>,
    offset_y: Option<f64>,
    column_count: Option<f64>,
    row_count: Option<f64>,
    orientation: Option<Orientation>,
    map_scale: Option<f64>,
    fog_color: Option<String>,
    fog_opacity: Option<f64>,
    grid_color: Option<String>,
    grid_thickness: Option<f64>,
    token_color: Option<String>,
}

impl DefaultsConfig {
    /// Applies the overrides to the built-in defaults, validating each one.
    ///
    /// Returns the resulting settings and a description of every adjusted value.
    pub(crate) fn resolve(&self) -> (Settings, Vec<String>) {
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
        let mut updates: Vec<SettingUpdate> = numbers
            .into_iter()
            .filter_map(|(field, value)| Some(SettingUpdate::Number(field, value?)))
            .collect();
        updates.extend(self.orientation.map(SettingUpdate::Orientation));
        updates.extend(self.fog_color.clone().map(SettingUpdate::FogColor));
        updates.extend(self.grid_color.clone().map(SettingUpdate::GridColor));
        updates.extend(self.token_color.clone().map(SettingUpdate::TokenColor));

        let mut settings = Settings::default();
        let warnings = updates
            .into_iter()
            .filter_map(|update| settings.apply_update(update).warning)
            .map(|warning| warning.to_string())
            .collect();
        (settings, warnings)
    }
}

impl AppConfig {
    /// Reads the file at `path`, or returns the built-in configuration when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Engine parameters, with `defaults` as the settings for new maps.
    pub(crate) fn engine_config(&self, defaults: Settings) -> EngineConfig {
        EngineConfig {
            history_capacity: self.history.capacity,
            persistence_debounce: Duration::from_millis(self.persistence.debounce_ms),
            defaults,
        }
    }
}
