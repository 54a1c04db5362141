//! Grid-bucket spatial index
//!
//! Divides the globe into fixed-size latitude/longitude cells and records
//! each id in the bucket of the cell containing its coordinate.
//!
//! A range query runs in two phases:
//! 1. Coarse: compute the window of cells that can contain a point within
//!    the radius (a latitude band plus a longitude span), grown by one cell
//!    on every side, and collect the ids bucketed there.
//! 2. Exact: keep only candidates whose haversine distance to the center is
//!    at most the radius.
//!
//! Longitude spans wrap across the antimeridian. When the latitude band
//! reaches a pole every column of the band is visited.

use crate::constants::geo::{EARTH_RADIUS_KM, KM_PER_DEGREE_LAT};
use crate::coord::{distance_km, Coordinates};
use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::f64::consts::FRAC_PI_2;
use std::ops::RangeInclusive;

/// Default cell edge, in degrees
pub const DEFAULT_CELL_SIZE_DEG: f64 = 1.0;

/// Grid cell address (row counts up from the south pole, col east from -180)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: i64,
    pub col: i64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: u64,
    coords: Coordinates,
}

/// Cells a range query has to visit. `cols` is sorted and unique.
#[derive(Debug)]
struct CellWindow {
    rows: RangeInclusive<i64>,
    cols: Vec<i64>,
}

impl CellWindow {
    fn cell_count(&self) -> usize {
        let rows = (self.rows.end() - self.rows.start() + 1).max(0) as usize;
        rows * self.cols.len()
    }

    fn contains(&self, key: &CellKey) -> bool {
        self.rows.contains(&key.row) && self.cols.binary_search(&key.col).is_ok()
    }
}

/// Fixed-size latitude/longitude grid index
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell_size_deg: f64,
    rows: i64,
    cols: i64,
    cells: HashMap<CellKey, Vec<Entry>>,
    len: usize,
}

impl Default for GridIndex {
    fn default() -> Self {
        Self {
            cell_size_deg: DEFAULT_CELL_SIZE_DEG,
            rows: 180,
            cols: 360,
            cells: HashMap::new(),
            len: 0,
        }
    }
}

impl GridIndex {
    /// Create an empty index with cells `cell_size_deg` degrees on a side
    ///
    /// The cell size must be finite and in (0, 180].
    pub fn new(cell_size_deg: f64) -> Result<Self> {
        if !cell_size_deg.is_finite() || cell_size_deg <= 0.0 || cell_size_deg > 180.0 {
            return Err(Error::Config(format!(
                "Cell size must be in (0, 180] degrees, got {}",
                cell_size_deg
            )));
        }

        Ok(Self {
            cell_size_deg,
            rows: (180.0 / cell_size_deg).ceil() as i64,
            cols: (360.0 / cell_size_deg).ceil() as i64,
            cells: HashMap::new(),
            len: 0,
        })
    }

    /// Number of indexed ids
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cell containing `coords`
    pub fn cell_of(&self, coords: Coordinates) -> CellKey {
        CellKey {
            row: self.row_of(coords.lat),
            col: self.col_of(coords.lng),
        }
    }

    fn row_of(&self, lat: f64) -> i64 {
        let row = ((lat + 90.0) / self.cell_size_deg).floor() as i64;
        row.clamp(0, self.rows - 1)
    }

    // 180 and -180 share column 0
    fn col_of(&self, lng: f64) -> i64 {
        let wrapped = (lng + 180.0).rem_euclid(360.0);
        let col = (wrapped / self.cell_size_deg).floor() as i64;
        col.clamp(0, self.cols - 1)
    }

    /// Record `id` at `coords`
    ///
    /// Callers guarantee id uniqueness; the index does not deduplicate.
    pub fn insert(&mut self, id: u64, coords: Coordinates) {
        let key = self.cell_of(coords);
        self.cells.entry(key).or_default().push(Entry { id, coords });
        self.len += 1;
    }

    /// Drop `id` from the cell of `coords`; false if it was not there
    pub fn remove(&mut self, id: u64, coords: Coordinates) -> bool {
        let key = self.cell_of(coords);
        let Some(bucket) = self.cells.get_mut(&key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|entry| entry.id == id) else {
            return false;
        };

        bucket.swap_remove(pos);
        if bucket.is_empty() {
            self.cells.remove(&key);
        }
        self.len -= 1;
        true
    }

    /// Ids within `radius_km` of `center` (boundary inclusive), ascending
    ///
    /// A negative or NaN radius matches nothing.
    pub fn range_query(&self, center: Coordinates, radius_km: f64) -> BTreeSet<u64> {
        let mut found = BTreeSet::new();
        if self.cells.is_empty() || radius_km.is_nan() || radius_km < 0.0 {
            return found;
        }

        let window = self.window(center, radius_km);
        let mut visit = |bucket: &[Entry]| {
            for entry in bucket {
                if distance_km(center, entry.coords) <= radius_km {
                    found.insert(entry.id);
                }
            }
        };

        if window.cell_count() > self.cells.len() {
            // Sparse grid: walking the occupied buckets is cheaper than the window
            for (key, bucket) in &self.cells {
                if window.contains(key) {
                    visit(bucket);
                }
            }
        } else {
            for row in window.rows.clone() {
                for &col in &window.cols {
                    if let Some(bucket) = self.cells.get(&CellKey { row, col }) {
                        visit(bucket);
                    }
                }
            }
        }

        found
    }

    fn window(&self, center: Coordinates, radius_km: f64) -> CellWindow {
        // Along a meridian the arc length is exact, so this band is tight
        let lat_delta = radius_km / KM_PER_DEGREE_LAT;
        let min_lat = center.lat - lat_delta;
        let max_lat = center.lat + lat_delta;

        let row_lo = (self.row_of(min_lat.max(-90.0)) - 1).max(0);
        let row_hi = (self.row_of(max_lat.min(90.0)) + 1).min(self.rows - 1);
        let rows = row_lo..=row_hi;

        let all_cols = || (0..self.cols).collect::<Vec<_>>();

        if min_lat <= -90.0 || max_lat >= 90.0 {
            return CellWindow {
                rows,
                cols: all_cols(),
            };
        }

        // Widest longitude offset of a circle that does not contain a pole
        let angular = radius_km / EARTH_RADIUS_KM;
        let ratio = angular.sin() / center.lat.to_radians().cos();
        if angular >= FRAC_PI_2 || ratio >= 1.0 {
            return CellWindow {
                rows,
                cols: all_cols(),
            };
        }
        let lng_delta = ratio.asin().to_degrees();

        let lo = self.col_of(center.lng - lng_delta);
        let hi = self.col_of(center.lng + lng_delta);
        let inclusive = if hi >= lo { hi - lo + 1 } else { hi + self.cols - lo + 1 };
        let span = inclusive + 2;
        if span >= self.cols {
            return CellWindow {
                rows,
                cols: all_cols(),
            };
        }

        let mut cols: Vec<i64> = (lo - 1..lo - 1 + span)
            .map(|col| col.rem_euclid(self.cols))
            .collect();
        cols.sort_unstable();

        CellWindow { rows, cols }
    }
}
