//! Server shared state
//!
//! Holds the service the handlers call into.

use crate::config::Config;
use crate::error::Result;
use crate::service::GeoService;
use std::sync::Arc;

/// Shared state for the HTTP server
pub struct AppState {
    pub service: Arc<GeoService>,
}

impl AppState {
    pub fn new(service: GeoService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Open the configured database and build state around it
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(GeoService::from_config(config)?))
    }
}
