//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/geo-board/config.toml
//!
//! `MAX_SEARCH_RADIUS_KM` and `API_PAGE_SIZE` in the environment override
//! the file when loaded through [`Config::load`].

pub mod defaults;

use crate::error::{Error, Result};
use crate::service::SearchLimits;
use crate::store::Database;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Radius search policy
    #[serde(default)]
    pub search: SearchConfig,

    /// Result paging
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Spatial index tuning
    #[serde(default)]
    pub index: IndexConfig,

    /// Snapshot persistence
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Radius search policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Largest accepted radius in km; unset means no ceiling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_radius_km: Option<f64>,
}

/// Result paging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size when the client does not ask for one
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Upper clamp for client-requested page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

/// Spatial index tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Grid cell edge in degrees
    #[serde(default = "default_cell_size_deg")]
    pub cell_size_deg: f64,
}

/// Snapshot persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file; defaults to the XDG data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,

    /// Write the snapshot after every successful create
    #[serde(default = "default_persist")]
    pub persist: bool,
}

// Default value functions for serde
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_max_page_size() -> usize {
    DEFAULT_MAX_PAGE_SIZE
}
fn default_cell_size_deg() -> f64 {
    DEFAULT_CELL_SIZE_DEG
}
fn default_persist() -> bool {
    DEFAULT_PERSIST
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cell_size_deg: default_cell_size_deg(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            persist: default_persist(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path, then apply environment overrides
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            let config = Config::default();
            config.save_to(&path)?;
            config
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file, without environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    ///
    /// Blank values are ignored. A page size above `max_page_size` is
    /// clamped to it.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value_of = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(raw) = value_of(ENV_MAX_SEARCH_RADIUS_KM) {
            let radius = raw.parse().map_err(|_| {
                Error::Config(format!("Invalid {} value: {}", ENV_MAX_SEARCH_RADIUS_KM, raw))
            })?;
            self.search.max_radius_km = Some(radius);
        }

        if let Some(raw) = value_of(ENV_PAGE_SIZE) {
            let page_size: usize = raw.parse().map_err(|_| {
                Error::Config(format!("Invalid {} value: {}", ENV_PAGE_SIZE, raw))
            })?;
            let max = self.pagination.max_page_size;
            if page_size > max {
                tracing::warn!(
                    requested = page_size,
                    max,
                    "{} clamped to max_page_size",
                    ENV_PAGE_SIZE
                );
            }
            self.pagination.page_size = page_size.min(max);
        }

        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if let Some(radius) = self.search.max_radius_km {
            if !radius.is_finite() || radius < 0.0 {
                return Err(Error::Config(format!(
                    "search.max_radius_km must be a non-negative number, got {}",
                    radius
                )));
            }
        }
        if self.pagination.page_size == 0 {
            return Err(Error::Config(
                "pagination.page_size must be at least 1".to_string(),
            ));
        }
        if self.pagination.max_page_size < self.pagination.page_size {
            return Err(Error::Config(format!(
                "pagination.max_page_size ({}) is smaller than pagination.page_size ({})",
                self.pagination.max_page_size, self.pagination.page_size
            )));
        }
        let cell = self.index.cell_size_deg;
        if !cell.is_finite() || cell <= 0.0 || cell > 180.0 {
            return Err(Error::Config(format!(
                "index.cell_size_deg must be in (0, 180], got {}",
                cell
            )));
        }
        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            ["search", "max_radius_km"] => Some(
                self.search
                    .max_radius_km
                    .map_or_else(|| "none".to_string(), |r| r.to_string()),
            ),

            ["pagination", "page_size"] => Some(self.pagination.page_size.to_string()),
            ["pagination", "max_page_size"] => Some(self.pagination.max_page_size.to_string()),

            ["index", "cell_size_deg"] => Some(self.index.cell_size_deg.to_string()),

            ["storage", "data_file"] => Some(
                self.storage
                    .data_file
                    .as_ref()
                    .map_or_else(|| "default".to_string(), |p| p.display().to_string()),
            ),
            ["storage", "persist"] => Some(self.storage.persist.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key". Optional values are cleared with "none".
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        let cleared = value.is_empty() || value.eq_ignore_ascii_case("none");

        match parts.as_slice() {
            ["server", "host"] => {
                self.server.host = value.to_string();
            }
            ["server", "port"] => {
                self.server.port = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid port value: {}", value)))?;
            }

            ["search", "max_radius_km"] => {
                self.search.max_radius_km = if cleared {
                    None
                } else {
                    Some(value.parse().map_err(|_| {
                        Error::Config(format!("Invalid radius value: {}", value))
                    })?)
                };
            }

            ["pagination", "page_size"] => {
                self.pagination.page_size = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid page size value: {}", value)))?;
            }
            ["pagination", "max_page_size"] => {
                self.pagination.max_page_size = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid page size value: {}", value)))?;
            }

            ["index", "cell_size_deg"] => {
                self.index.cell_size_deg = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid cell size value: {}", value)))?;
            }

            ["storage", "data_file"] => {
                self.storage.data_file = if cleared || value == "default" {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            ["storage", "persist"] => {
                self.storage.persist = value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid boolean value: {}", value)))?;
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        self.validate()
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "server.host",
            "server.port",
            "search.max_radius_km",
            "pagination.page_size",
            "pagination.max_page_size",
            "index.cell_size_deg",
            "storage.data_file",
            "storage.persist",
        ]
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Snapshot file to use: the configured one or the XDG default
    pub fn data_file(&self) -> Result<PathBuf> {
        match &self.storage.data_file {
            Some(path) => Ok(path.clone()),
            None => Database::default_path(),
        }
    }

    /// Search policy derived from this configuration
    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_radius_km: self.search.max_radius_km,
            page_size: self.pagination.page_size,
            max_page_size: self.pagination.max_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.search.max_radius_km, None);
        assert_eq!(config.pagination.page_size, 50);
        assert_eq!(config.pagination.max_page_size, 200);
        assert_eq!(config.index.cell_size_deg, 1.0);
        assert!(config.storage.persist);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        assert_eq!(config.get("search.max_radius_km"), Some("none".to_string()));

        config.set("search.max_radius_km", "25").unwrap();
        assert_eq!(config.get("search.max_radius_km"), Some("25".to_string()));
        assert_eq!(config.search.max_radius_km, Some(25.0));

        config.set("search.max_radius_km", "none").unwrap();
        assert_eq!(config.search.max_radius_km, None);

        config.set("index.cell_size_deg", "0.5").unwrap();
        assert_eq!(config.index.cell_size_deg, 0.5);

        config.set("storage.data_file", "/tmp/geo.json").unwrap();
        assert_eq!(config.get("storage.data_file"), Some("/tmp/geo.json".to_string()));
        config.set("storage.data_file", "default").unwrap();
        assert_eq!(config.storage.data_file, None);
    }

    #[test]
    fn test_get_invalid_key() {
        let config = Config::default();
        assert_eq!(config.get("invalid.key"), None);
    }

    #[test]
    fn test_set_invalid_key() {
        let mut config = Config::default();
        let result = config.set("invalid.key", "value");
        assert!(result.is_err());
    }

    #[test]
    fn test_set_invalid_value() {
        let mut config = Config::default();
        assert!(config.set("server.port", "not_a_number").is_err());
        assert!(config.set("search.max_radius_km", "-3").is_err());
        assert!(config.set("index.cell_size_deg", "0").is_err());
        assert!(config.set("pagination.page_size", "500").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(overrides(&[
                ("MAX_SEARCH_RADIUS_KM", "10.5"),
                ("API_PAGE_SIZE", " 20 "),
            ]))
            .unwrap();

        assert_eq!(config.search.max_radius_km, Some(10.5));
        assert_eq!(config.pagination.page_size, 20);
    }

    #[test]
    fn test_env_page_size_clamped_to_max() {
        let mut config = Config::default();
        config
            .apply_overrides(overrides(&[("API_PAGE_SIZE", "500")]))
            .unwrap();

        assert_eq!(config.pagination.page_size, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_env_override_is_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides(overrides(&[("MAX_SEARCH_RADIUS_KM", "")]))
            .unwrap();
        assert_eq!(config.search.max_radius_km, None);
    }

    #[test]
    fn test_invalid_env_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(overrides(&[("API_PAGE_SIZE", "lots")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("geo-board").join("config.toml");

        let mut config = Config::default();
        config.search.max_radius_km = Some(5.0);
        config.server.port = 9090;
        config.storage.data_file = Some(temp_dir.path().join("store.json"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.search.max_radius_km, Some(5.0));
        assert_eq!(loaded.server.port, 9090);
        assert_eq!(loaded.data_file().unwrap(), temp_dir.path().join("store.json"));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[index]\ncell_size_deg = -1.0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[search]\nmax_radius_km = 3.0\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.search.max_radius_km, Some(3.0));
        assert_eq!(loaded.pagination.page_size, 50);
        assert_eq!(loaded.server.host, "127.0.0.1");
    }

    #[test]
    fn test_serialization_format() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();

        // Check that key sections exist
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[pagination]"));
        assert!(toml.contains("[index]"));
        assert!(toml.contains("[storage]"));
        // Unset optionals are left out
        assert!(!toml.contains("max_radius_km"));
    }

    #[test]
    fn test_server_addr() {
        let config = Config::default();
        assert_eq!(config.server_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_search_limits() {
        let mut config = Config::default();
        config.search.max_radius_km = Some(2.0);

        let limits = config.search_limits();
        assert_eq!(limits.max_radius_km, Some(2.0));
        assert_eq!(limits.page_size, 50);
        assert_eq!(limits.max_page_size, 200);
    }

    #[test]
    fn test_available_keys() {
        let keys = Config::available_keys();
        assert!(keys.contains(&"search.max_radius_km"));
        assert!(keys.contains(&"server.port"));
        assert!(keys.contains(&"index.cell_size_deg"));
    }
}
