//! Geographic coordinates and the distance model

pub mod distance;

pub use distance::{distance_km, is_within_radius};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A geographic coordinate (latitude, longitude) in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create new coordinates
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    ///
    /// NaN fails both checks.
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::validation(
                "latitude",
                format!("{} is out of range [-90, 90]", self.lat),
            ));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::validation(
                "longitude",
                format!("{} is out of range [-180, 180]", self.lng),
            ));
        }
        Ok(())
    }
}
