//! Application configuration
//! Loaded from a TOML file; every section and field falls back to its default.

use crate::map::Palette;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub map: MapConfig,
    pub render: RenderConfig,
}

/// Locations of the two CSV datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub municipalities_csv: PathBuf,
    pub regions_csv: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            municipalities_csv: PathBuf::from("attached_assets/Obcine_z_napovedjo.csv"),
            regions_csv: PathBuf::from("attached_assets/Regije_z_napovedjo.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Zoom at or above which municipalities replace regions.
    pub entity_zoom_threshold: f64,
    pub default_zoom: f64,
    /// `[lat, lon]`
    pub default_center: [f64; 2],
    /// Path or `http(s)://` URL.
    pub entities_geometry: String,
    /// Path or `http(s)://` URL.
    pub regions_geometry: String,
    pub stall_warning_secs: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            entity_zoom_threshold: 9.0,
            default_zoom: 8.0,
            default_center: [46.119944, 14.815333],
            entities_geometry: "data/obcinepodatki.json".to_string(),
            regions_geometry: "data/regije.json".to_string(),
            stall_warning_secs: 30,
        }
    }
}

/// Static PNG snapshot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub palette: Palette,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            palette: Palette::Blues,
        }
    }
}

impl AppConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults when no path is given; an explicit path must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }
}
