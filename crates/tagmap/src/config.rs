//! Configuration management for tagmap.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record::MarkerColor;
use crate::schema::SchemaVariant;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration directory name.
const CONFIG_DIR_NAME: &str = "tagmap";

/// Fixed file name of the generated map document.
pub const DOCUMENT_FILE_NAME: &str = "map.html";

/// Highest zoom level the tile layer serves.
const MAX_ZOOM: u8 = 20;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TAGMAP_`, sections split by `__`)
/// 2. TOML config file at `~/.config/tagmap/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Upload and output locations.
    pub paths: PathsConfig,
    /// Map rendering configuration.
    pub map: MapConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Largest accepted upload body in bytes.
    pub max_upload_bytes: usize,
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory receiving uploaded spreadsheets.
    pub upload_dir: PathBuf,
    /// Directory holding the generated map document.
    pub output_dir: PathBuf,
}

/// Map rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Required column set.
    pub schema: SchemaVariant,
    /// Zoom used when the map is not fitted to bounds.
    pub default_zoom: u8,
    /// Divisor applied to scaled integer coordinates.
    pub coordinate_scale: f64,
    /// Maximum popup width in pixels.
    pub popup_max_width: u32,
    /// Tile layer URL template.
    pub tile_url: String,
    /// Attribution shown for the tile layer.
    pub tile_attribution: String,
    /// Ordered classification rules; the first match wins.
    pub rules: Vec<RuleConfig>,
    /// Color for descriptions matching no rule.
    pub default_color: MarkerColor,
}

/// A single description classification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Case-insensitive substring to look for.
    pub pattern: String,
    /// Marker color when the pattern matches.
    pub color: MarkerColor,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("static/maps"),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            schema: SchemaVariant::Strict,
            default_zoom: 6,
            coordinate_scale: 1_000_000.0,
            popup_max_width: 300,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            tile_attribution:
                "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
                    .to_string(),
            rules: default_rules(),
            default_color: MarkerColor::Blue,
        }
    }
}

/// Default tagging-status rules.
fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig {
            pattern: "sudah tagging".to_string(),
            color: MarkerColor::Green,
        },
        RuleConfig {
            pattern: "belum tagging".to_string(),
            color: MarkerColor::Red,
        },
    ]
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("TAGMAP_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("port must be greater than 0"));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(invalid("max_upload_bytes must be greater than 0"));
        }

        if !(self.map.coordinate_scale.is_finite() && self.map.coordinate_scale > 0.0) {
            return Err(invalid(format!(
                "coordinate_scale must be a positive number, got {}",
                self.map.coordinate_scale
            )));
        }

        if self.map.default_zoom > MAX_ZOOM {
            return Err(invalid(format!(
                "default_zoom ({}) cannot be greater than {MAX_ZOOM}",
                self.map.default_zoom
            )));
        }

        if self.map.tile_url.trim().is_empty() {
            return Err(invalid("tile_url must not be empty"));
        }

        for rule in &self.map.rules {
            if rule.pattern.trim().is_empty() {
                return Err(invalid(format!(
                    "classification rule for {} has an empty pattern",
                    rule.color
                )));
            }
        }

        Ok(())
    }

    /// Directory receiving uploaded spreadsheets.
    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.paths.upload_dir
    }

    /// Directory holding the generated document.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.paths.output_dir
    }

    /// Full path of the generated document.
    #[must_use]
    pub fn document_path(&self) -> PathBuf {
        self.paths.output_dir.join(DOCUMENT_FILE_NAME)
    }

    /// Socket address string for the HTTP server.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.map.schema, SchemaVariant::Strict);
        assert_eq!(config.map.default_zoom, 6);
        assert!((config.map.coordinate_scale - 1_000_000.0).abs() < f64::EPSILON);
        assert_eq!(config.map.default_color, MarkerColor::Blue);
    }

    #[test]
    fn test_default_paths() {
        let paths = PathsConfig::default();
        assert_eq!(paths.upload_dir, PathBuf::from("uploads"));
        assert_eq!(paths.output_dir, PathBuf::from("static/maps"));
    }

    #[test]
    fn test_default_rules_order() {
        let rules = default_rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].pattern, "sudah tagging");
        assert_eq!(rules[0].color, MarkerColor::Green);
        assert_eq!(rules[1].pattern, "belum tagging");
        assert_eq!(rules[1].color, MarkerColor::Red);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("port"));
    }

    #[test]
    fn test_validate_bad_scale() {
        let mut config = Config::default();
        config.map.coordinate_scale = 0.0;
        assert!(config.validate().is_err());

        config.map.coordinate_scale = f64::NAN;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("coordinate_scale"));
    }

    #[test]
    fn test_validate_zoom_too_high() {
        let mut config = Config::default();
        config.map.default_zoom = 25;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_zoom"));
    }

    #[test]
    fn test_validate_empty_rule_pattern() {
        let mut config = Config::default();
        config.map.rules.push(RuleConfig {
            pattern: "  ".to_string(),
            color: MarkerColor::Orange,
        });

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("empty pattern"));
    }

    #[test]
    fn test_validate_empty_tile_url() {
        let mut config = Config::default();
        config.map.tile_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_document_path() {
        let mut config = Config::default();
        config.paths.output_dir = PathBuf::from("/srv/maps");
        assert_eq!(config.document_path(), PathBuf::from("/srv/maps/map.html"));
    }

    #[test]
    fn test_bind_address() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("tagmap"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[map]
schema = "basic"
default_zoom = 9

[[map.rules]]
pattern = "selesai"
color = "purple"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.map.schema, SchemaVariant::Basic);
        assert_eq!(config.map.default_zoom, 9);
        assert_eq!(config.map.rules.len(), 1);
        assert_eq!(config.map.rules[0].color, MarkerColor::Purple);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[map]\ndefault_zoom = 42\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("coordinate_scale"));
        assert!(json.contains("\"schema\":\"strict\""));
    }
}
