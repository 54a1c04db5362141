//! Spatial indexing
//!
//! Candidate selection for radius queries. The grid index buckets ids by
//! latitude/longitude cell and confirms every candidate with the exact
//! haversine distance, so results never depend on the cell size.

pub mod grid;

pub use grid::{CellKey, GridIndex, DEFAULT_CELL_SIZE_DEG};
