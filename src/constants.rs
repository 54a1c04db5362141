//! Centralized constants for the geo-board crate
//!
//! This module consolidates constants that are used across multiple modules
//! to avoid duplication and ensure consistency.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in kilometers (spherical approximation)
    pub const EARTH_RADIUS_KM: f64 = 6_371.0;

    /// Kilometers per degree of latitude on the spherical model
    pub const KM_PER_DEGREE_LAT: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
}

/// Input limits
pub mod limits {
    /// Maximum point title length, in characters, after trimming
    pub const TITLE_MAX_CHARS: usize = 255;
}

/// HTTP boundary constants
pub mod http {
    /// Header carrying the caller identity set by the upstream auth layer
    pub const IDENTITY_HEADER: &str = "x-user-id";
}
