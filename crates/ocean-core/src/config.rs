//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/ocean/config.toml)
//! 3. Environment variables (OCEAN_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::StoreKind;
use crate::store::StoreOptions;

/// Environment variable prefix
const ENV_PREFIX: &str = "OCEAN";

/// Default property under which link annotations are written
pub const DEFAULT_LINK_PROPERTY: &str = "links";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the store's snapshot files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Store name; the file name in single-file mode
    #[serde(default = "default_name")]
    pub name: String,

    /// Persistence mode
    #[serde(default)]
    pub kind: StoreKind,

    /// Property that holds link annotations on source items
    #[serde(default = "default_link_property")]
    pub link_property: String,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            name: default_name(),
            kind: StoreKind::default(),
            link_property: default_link_property(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (OCEAN_DATA_DIR, OCEAN_NAME, OCEAN_KIND, ...)
    /// 2. Config file (~/.config/ocean/config.toml or OCEAN_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_NAME", ENV_PREFIX)) {
            if !val.is_empty() {
                self.name = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_KIND", ENV_PREFIX)) {
            self.kind = val
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid OCEAN_KIND")?;
        }

        if let Ok(val) = std::env::var(format!("{}_LINK_PROPERTY", ENV_PREFIX)) {
            if !val.is_empty() {
                self.link_property = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.log_level = val;
            }
        }

        Ok(())
    }

    /// Save configuration to a file, creating its directory
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with OCEAN_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ocean")
            .join("config.toml")
    }

    /// Options for opening the configured store
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            kind: self.kind,
            name: self.name.clone(),
            path: Some(self.data_dir.clone()),
            link_property: self.link_property.clone(),
        }
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ocean")
}

fn default_name() -> String {
    "ocean".to_string()
}

fn default_link_property() -> String {
    DEFAULT_LINK_PROPERTY.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "OCEAN_DATA_DIR",
        "OCEAN_NAME",
        "OCEAN_KIND",
        "OCEAN_LINK_PROPERTY",
        "OCEAN_LOG_LEVEL",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.name, "ocean");
        assert_eq!(config.kind, StoreKind::Directory);
        assert_eq!(config.link_property, "links");
        assert_eq!(config.log_level, "warn");
        assert!(config.data_dir.ends_with("ocean"));
    }

    #[test]
    fn test_env_override_data_dir_and_name() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("OCEAN_DATA_DIR", "/tmp/ocean-test");
        env::set_var("OCEAN_NAME", "catalog");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/ocean-test"));
        assert_eq!(config.name, "catalog");
    }

    #[test]
    fn test_env_override_kind() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("OCEAN_KIND", "memory");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.kind, StoreKind::Memory);

        env::set_var("OCEAN_KIND", "floppy");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("OCEAN_LINK_PROPERTY", "");
        env::set_var("OCEAN_LOG_LEVEL", "");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.link_property, "links");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            name = "catalog.json"
            kind = "file"
            link_property = "relations"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.name, "catalog.json");
        assert_eq!(config.kind, StoreKind::File);
        assert_eq!(config.link_property, "relations");
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: PathBuf::from("/data/ocean"),
            name: "ocean".to_string(),
            kind: StoreKind::Memory,
            link_property: "links".to_string(),
            log_level: "debug".to_string(),
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_store_options() {
        let config = Config {
            data_dir: PathBuf::from("/data"),
            ..Config::default()
        };
        let options = config.store_options();
        assert_eq!(options.kind, StoreKind::Directory);
        assert_eq!(options.name, "ocean");
        assert_eq!(options.path, Some(PathBuf::from("/data")));
        assert_eq!(options.link_property, "links");
    }
}
