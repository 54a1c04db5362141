//! geo-board: location-based points and messages
//!
//! A library, HTTP service and CLI for storing geographic points with
//! attached text messages and finding them by distance.
//!
//! ## Features
//!
//! - Great-circle (haversine) distance on a spherical Earth
//! - Uniform lat/lng grid index with an exact distance filter
//! - Thread-safe point and message stores with JSON snapshot persistence
//! - Page-number pagination over search results
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use geo_board::coord::Coordinates;
//! use geo_board::store::Database;
//!
//! let db = Database::in_memory(1.0).unwrap();
//! let red_square = db.points().create(Some("Red Square"), 55.751244, 37.618423).unwrap();
//! db.points().create(None, 55.761244, 37.618423).unwrap();
//!
//! let center = Coordinates::new(55.751244, 37.618423);
//! let nearby = db.points().search_within_radius(center, 1.0).unwrap();
//! assert_eq!(nearby.len(), 1);
//!
//! db.messages().create(red_square.id, "user-1", "Meet here").unwrap();
//! let messages = db.messages().search_within_radius(center, 1.0).unwrap();
//! assert_eq!(messages.len(), 1);
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod index;
pub mod pagination;
pub mod server;
pub mod service;
pub mod store;
pub mod validate;

// Re-export commonly used types
pub use config::Config;
pub use coord::Coordinates;
pub use error::{Error, Result};
pub use service::GeoService;
pub use store::{Database, Message, Point};
