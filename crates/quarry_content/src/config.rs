//! Staging configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `QUARRY_IMPORT_WORKERS=4`, `QUARRY_WRITE_MANIFEST=0`
//! 2. Config file passed on the command line, or `quarry.toml` in the working directory
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! [extensions]
//! mesh = ["fbx", "obj"]
//! image = ["png", "jpg", "tga", "dds"]
//! audio = ["ogg", "wav"]
//!
//! [import]
//! worker_threads = 2
//! write_manifest = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StagingError, StagingResult};
use crate::kind::ExtensionSets;

/// Default config file name looked up by [`StagingConfig::load_or_default`]
pub const DEFAULT_CONFIG_FILE: &str = "quarry.toml";

/// Import execution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Worker threads of the import runtime
    pub worker_threads: usize,
    /// Write `<name>.import.json` next to imported assets
    pub write_manifest: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            write_manifest: true,
        }
    }
}

/// Complete staging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    pub extensions: ExtensionSets,
    pub import: ImportConfig,
}

impl StagingConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> StagingResult<Self> {
        let mut config: StagingConfig =
            toml::from_str(content).map_err(|e| StagingError::Config(e.to_string()))?;
        config.extensions = config.extensions.normalized();
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> StagingResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Load `path` (or `quarry.toml` when `None`), falling back to defaults
    /// when the file is missing, then apply environment overrides.
    ///
    /// A file that exists but fails to parse is an error.
    pub fn load_or_default(path: Option<&Path>) -> StagingResult<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let mut config = if path.is_file() {
            let config = Self::load(path)?;
            log::info!("Loaded staging config from {:?}", path);
            config
        } else {
            log::debug!("No config at {:?}, using defaults", path);
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `QUARRY_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(workers) = std::env::var("QUARRY_IMPORT_WORKERS") {
            match workers.parse::<usize>() {
                Ok(n) if n > 0 => {
                    self.import.worker_threads = n;
                    log::info!("Import workers from env: {}", n);
                }
                _ => log::warn!("Ignoring QUARRY_IMPORT_WORKERS={}", workers),
            }
        }

        if let Ok(value) = std::env::var("QUARRY_WRITE_MANIFEST") {
            self.import.write_manifest = parse_flag(&value);
        }
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> StagingResult<String> {
        toml::to_string_pretty(self).map_err(|e| StagingError::Config(e.to_string()))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = StagingConfig::from_toml(
            r#"
            [import]
            worker_threads = 6
            "#,
        )
        .unwrap();

        assert_eq!(config.import.worker_threads, 6);
        assert!(config.import.write_manifest);
        assert_eq!(config.extensions, ExtensionSets::default());
    }

    #[test]
    fn test_extensions_are_normalized() {
        let config = StagingConfig::from_toml(
            r#"
            [extensions]
            image = [".PNG", "Exr"]
            "#,
        )
        .unwrap();

        assert!(config.extensions.image.contains("png"));
        assert!(config.extensions.image.contains("exr"));
        // Sets not mentioned keep their defaults.
        assert!(config.extensions.mesh.contains("fbx"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = StagingConfig::from_toml("[import]\nworker_threads = \"many\"");
        assert!(matches!(result, Err(StagingError::Config(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StagingConfig::load_or_default(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.extensions, ExtensionSets::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = StagingConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(StagingConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }
}
