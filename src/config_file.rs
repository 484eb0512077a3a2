//! Configuration file handling for toolbox.
//!
//! The configuration is an optional JSON file. Every field has a default, so a
//! missing file or a partial file both work.
//!
//! ```json
//! {
//!   "catalog_path": "pkgs/packages-info.json",
//!   "default_platform": "linux_debian_apt",
//!   "favorites_path": "pkgs/list/fav-packages.json",
//!   "export_path": "toolbox-exported-packages.json"
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::platform::Platform;
use crate::selection::DEFAULT_EXPORT_FILENAME;

/// Environment variable naming a config file when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "TOOLBOX_CONFIG";

pub const DEFAULT_CATALOG_PATH: &str = "pkgs/packages-info.json";
pub const DEFAULT_FAVORITES_PATH: &str = "pkgs/list/fav-packages.json";

/// User configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolboxConfig {
    /// Catalog used when `--catalog` is not given
    pub catalog_path: PathBuf,
    /// Platform used when neither `--platform` nor `--os` is given
    pub default_platform: Option<Platform>,
    pub favorites_path: PathBuf,
    /// Where `generate --export` writes when no file name is given
    pub export_path: PathBuf,
}

impl Default for ToolboxConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            default_platform: None,
            favorites_path: PathBuf::from(DEFAULT_FAVORITES_PATH),
            export_path: PathBuf::from(DEFAULT_EXPORT_FILENAME),
        }
    }
}

impl ToolboxConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Load from `explicit`, else from `$TOOLBOX_CONFIG`, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let path = explicit.map(Path::to_path_buf).or(from_env);

        let config = match path {
            Some(path) => {
                debug!("Loading configuration from {:?}", path);
                Self::load_from_file(&path)?
            }
            None => {
                debug!("No configuration file, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.catalog_path.as_os_str().is_empty() {
            anyhow::bail!("Catalog path must not be empty");
        }

        if let Some(platform) = self.default_platform {
            if !platform.is_selectable() {
                anyhow::bail!(
                    "Default platform {} is a fallback repository and cannot be selected",
                    platform
                );
            }
        }

        if self.export_path.extension().is_none_or(|ext| ext != "json") {
            anyhow::bail!("Export path must end in .json");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = ToolboxConfig::default();
        assert_eq!(config.catalog_path, PathBuf::from("pkgs/packages-info.json"));
        assert_eq!(config.default_platform, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_roundtrip_save_load() {
        let config = ToolboxConfig {
            default_platform: Some(Platform::LinuxFedoraRpm),
            catalog_path: PathBuf::from("/srv/catalog.json"),
            ..Default::default()
        };

        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();

        let loaded = ToolboxConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{ "default_platform": "macos_brew" }"#)
            .unwrap();
        temp_file.flush().unwrap();

        let loaded = ToolboxConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.default_platform, Some(Platform::MacosBrew));
        assert_eq!(loaded.favorites_path, PathBuf::from(DEFAULT_FAVORITES_PATH));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ToolboxConfig::load_from_file(Path::new("/nonexistent/path"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_unknown_platform_fails() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{ "default_platform": "linux_alpine_apk" }"#)
            .unwrap();
        temp_file.flush().unwrap();

        assert!(ToolboxConfig::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_validation_rejects_fallback_platform() {
        let config = ToolboxConfig {
            default_platform: Some(Platform::LinuxArchAur),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_non_json_export() {
        let config = ToolboxConfig {
            export_path: PathBuf::from("selection.txt"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discover_explicit_path() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = ToolboxConfig {
            default_platform: Some(Platform::WindowsWinget),
            ..Default::default()
        };
        config.save_to_file(temp_file.path()).unwrap();

        let found = ToolboxConfig::discover(Some(temp_file.path())).unwrap();
        assert_eq!(found.default_platform, Some(Platform::WindowsWinget));
    }
}
