//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 8000;

/// Default page size for search results
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page size a client may request
pub const DEFAULT_MAX_PAGE_SIZE: usize = 200;

/// Default grid cell edge in degrees
pub const DEFAULT_CELL_SIZE_DEG: f64 = crate::index::DEFAULT_CELL_SIZE_DEG;

/// Snapshot persistence is on unless disabled
pub const DEFAULT_PERSIST: bool = true;

/// Environment variable capping the search radius (km)
pub const ENV_MAX_SEARCH_RADIUS_KM: &str = "MAX_SEARCH_RADIUS_KM";

/// Environment variable overriding the default page size
pub const ENV_PAGE_SIZE: &str = "API_PAGE_SIZE";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "geo-board";
