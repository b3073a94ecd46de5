use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::data::loader::LoadOptions;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "NE_AIRPORTS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "ne-airports.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup settings. Every field has a default, so an empty `{}` is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    /// Table opened at startup, if any.
    pub data_path: Option<PathBuf>,
    pub fill_missing_elevation: bool,
    pub require_municipality: bool,
    /// Default length of the ranking table.
    pub top_n: usize,
    pub histogram_bins: usize,
    /// Heatmap grid resolution along the longer axis.
    pub heatmap_cells: usize,
    /// Gaussian kernel bandwidth in degrees.
    pub heatmap_bandwidth_deg: f64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            fill_missing_elevation: true,
            require_municipality: true,
            top_n: 10,
            histogram_bins: 20,
            heatmap_cells: 60,
            heatmap_bandwidth_deg: 0.15,
        }
    }
}

impl ExplorerConfig {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            fill_missing_elevation: self.fill_missing_elevation,
            require_municipality: self.require_municipality,
        }
    }

    /// Where the config is read from: `$NE_AIRPORTS_CONFIG` or
    /// `ne-airports.json` in the working directory.
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load from [`ExplorerConfig::path`], falling back to defaults on error.
    pub fn load() -> Self {
        let path = Self::path();
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}. Using defaults.");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        assert_eq!(ExplorerConfig::from_json("{}").unwrap(), ExplorerConfig::default());
    }

    #[test]
    fn partial_override() {
        let cfg = ExplorerConfig::from_json(
            r#"{ "data_path": "airports.csv", "top_n": 5, "fill_missing_elevation": false }"#,
        )
        .unwrap();
        assert_eq!(cfg.data_path, Some(PathBuf::from("airports.csv")));
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.histogram_bins, 20);
        assert!(!cfg.load_options().fill_missing_elevation);
        assert!(cfg.load_options().require_municipality);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ExplorerConfig::from_json(r#"{ "topn": 5 }"#).is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = ExplorerConfig::from_file(Path::new("/nonexistent/ne-airports.json")).unwrap();
        assert_eq!(cfg, ExplorerConfig::default());
    }
}
