//! Point store
//!
//! Owns every [`Point`] and the grid index over their locations. Records and
//! index live behind one lock so a reader never sees one without the other.

use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::index::GridIndex;
use crate::store::SearchResults;
use crate::validate::{check_title_length, normalize_title, validate_coordinate, validate_radius};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A stored geo-tagged point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    pub location: Coordinates,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct PointState {
    records: BTreeMap<u64, Point>,
    index: GridIndex,
    next_id: u64,
}

#[derive(Debug)]
pub struct PointStore {
    state: RwLock<PointState>,
}

impl PointStore {
    /// Create an empty store indexed with `cell_size_deg` cells
    pub fn new(cell_size_deg: f64) -> Result<Self> {
        Self::from_points(Vec::new(), cell_size_deg)
    }

    /// Rebuild a store from previously persisted points
    ///
    /// Every point must carry valid coordinates and a unique id. New ids
    /// continue after the highest loaded one.
    pub fn from_points(points: Vec<Point>, cell_size_deg: f64) -> Result<Self> {
        let mut index = GridIndex::new(cell_size_deg)?;
        let mut records = BTreeMap::new();

        for point in points {
            point.location.validate().map_err(|e| {
                Error::Storage(format!("Stored point {} is invalid: {}", point.id, e))
            })?;
            if records.contains_key(&point.id) {
                return Err(Error::Storage(format!("Duplicate stored point id {}", point.id)));
            }
            index.insert(point.id, point.location);
            records.insert(point.id, point);
        }

        let next_id = records.keys().next_back().map_or(1, |id| id + 1);

        Ok(Self {
            state: RwLock::new(PointState {
                records,
                index,
                next_id,
            }),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, PointState>> {
        self.state
            .read()
            .map_err(|_| Error::Storage("Point store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, PointState>> {
        self.state
            .write()
            .map_err(|_| Error::Storage("Point store lock poisoned".to_string()))
    }

    /// Validate and store a new point
    ///
    /// The title is trimmed (blank becomes absent). The id is assigned and
    /// the record and index entry are written inside a single write lock.
    pub fn create(&self, title: Option<&str>, latitude: f64, longitude: f64) -> Result<Point> {
        let title = normalize_title(title);
        check_title_length(title.as_deref())?;
        let location = validate_coordinate(latitude, longitude)?;

        let mut state = self.write()?;
        let point = Point {
            id: state.next_id,
            title,
            location,
            created_at: Utc::now(),
        };
        state.index.insert(point.id, point.location);
        state.records.insert(point.id, point.clone());
        state.next_id += 1;

        Ok(point)
    }

    /// Undo a create: drop the record and its index entry
    ///
    /// The id is handed out again only if nothing was created after it.
    pub(crate) fn remove(&self, id: u64) -> Result<Option<Point>> {
        let mut state = self.write()?;
        let Some(point) = state.records.remove(&id) else {
            return Ok(None);
        };
        state.index.remove(id, point.location);
        if state.next_id == id + 1 {
            state.next_id = id;
        }
        Ok(Some(point))
    }

    pub fn get_by_id(&self, id: u64) -> Result<Option<Point>> {
        Ok(self.read()?.records.get(&id).cloned())
    }

    pub fn contains(&self, id: u64) -> Result<bool> {
        Ok(self.read()?.records.contains_key(&id))
    }

    /// Ids of points within `radius_km` of `center`, ascending
    pub fn ids_within_radius(&self, center: Coordinates, radius_km: f64) -> Result<BTreeSet<u64>> {
        validate_radius(radius_km, None)?;
        Ok(self.read()?.index.range_query(center, radius_km))
    }

    /// Points within `radius_km` of `center`, ordered by ascending id
    pub fn search_within_radius(
        &self,
        center: Coordinates,
        radius_km: f64,
    ) -> Result<SearchResults<Point>> {
        validate_radius(radius_km, None)?;

        let state = self.read()?;
        let points = state
            .index
            .range_query(center, radius_km)
            .into_iter()
            .filter_map(|id| state.records.get(&id).cloned())
            .collect();

        Ok(SearchResults::new(points))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.records.is_empty())
    }

    /// Copy of every stored point, ordered by id
    pub fn snapshot(&self) -> Result<Vec<Point>> {
        Ok(self.read()?.records.values().cloned().collect())
    }
}
