//! Create and search use-cases
//!
//! [`GeoService`] is what the transport layers call. It applies the request
//! level policy (required fields, radius ceiling, page size clamp) and
//! delegates to the [`Database`], whose creates are all-or-nothing with
//! respect to the snapshot file.

use crate::config::Config;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::pagination::{paginate, Page};
use crate::store::{Database, Message, Point};
use crate::validate::{validate_coordinate, validate_radius};
use tracing::{debug, info};

/// Request-level search policy
#[derive(Debug, Clone, PartialEq)]
pub struct SearchLimits {
    /// Largest accepted radius in km, if capped
    pub max_radius_km: Option<f64>,
    /// Page size when the caller does not ask for one
    pub page_size: usize,
    /// Upper clamp for caller-requested page sizes
    pub max_page_size: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Config::default().search_limits()
    }
}

/// A validated radius search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusQuery {
    pub center: Coordinates,
    pub radius_km: f64,
}

/// Page selection as sent by a caller; absent fields use the defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub struct GeoService {
    db: Database,
    limits: SearchLimits,
}

impl GeoService {
    pub fn new(db: Database, limits: SearchLimits) -> Self {
        Self { db, limits }
    }

    /// Open the configured snapshot (or an in-memory database when
    /// persistence is disabled) and apply the configured limits
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = if config.storage.persist {
            Database::open(config.data_file()?, config.index.cell_size_deg)?
        } else {
            Database::in_memory(config.index.cell_size_deg)?
        };
        Ok(Self::new(db, config.search_limits()))
    }

    /// Keep a file-backed database but stop writing snapshots
    pub fn read_only(self) -> Self {
        Self {
            db: self.db.into_read_only(),
            limits: self.limits,
        }
    }

    pub fn create_point(&self, title: Option<&str>, latitude: f64, longitude: f64) -> Result<Point> {
        let point = self.db.create_point(title, latitude, longitude)?;
        info!(
            id = point.id,
            lat = point.location.lat,
            lon = point.location.lng,
            has_title = point.title.is_some(),
            "point_created"
        );
        Ok(point)
    }

    /// Attach a message to `point_id` on behalf of `author_id`
    ///
    /// Ids below 1 can never name a stored point and are rejected as input
    /// errors before the lookup.
    pub fn create_message(&self, point_id: i64, author_id: &str, text: &str) -> Result<Message> {
        let point_id = u64::try_from(point_id)
            .ok()
            .filter(|id| *id >= 1)
            .ok_or_else(|| {
                Error::validation("point_id", "Ensure this value is greater than or equal to 1")
            })?;

        let message = self.db.create_message(point_id, author_id, text)?;
        info!(
            id = message.id,
            point_id = message.point_id,
            author_id = %message.author_id,
            text_len = message.text.chars().count(),
            "message_created"
        );
        Ok(message)
    }

    /// Validate raw search parameters into a [`RadiusQuery`]
    ///
    /// All three parameters are required. Errors name the first bad field.
    pub fn radius_query(
        &self,
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius_km: Option<f64>,
    ) -> Result<RadiusQuery> {
        let required = |value: Option<f64>, field: &str| {
            value.ok_or_else(|| Error::validation(field, "This field is required"))
        };

        let center = validate_coordinate(
            required(latitude, "latitude")?,
            required(longitude, "longitude")?,
        )?;
        let radius_km = validate_radius(required(radius_km, "radius")?, self.limits.max_radius_km)?;

        Ok(RadiusQuery { center, radius_km })
    }

    fn page_bounds(&self, request: PageRequest) -> (usize, usize) {
        (
            request.page.unwrap_or(1),
            request.page_size.unwrap_or(self.limits.page_size),
        )
    }

    pub fn search_points(&self, query: &RadiusQuery, request: PageRequest) -> Result<Page<Point>> {
        let results = self
            .db
            .points()
            .search_within_radius(query.center, query.radius_km)?;

        let (page, page_size) = self.page_bounds(request);
        let page = paginate(results, page, page_size, self.limits.max_page_size);
        debug!(
            lat = query.center.lat,
            lon = query.center.lng,
            radius_km = query.radius_km,
            results = page.total_count,
            "points_searched"
        );
        Ok(page)
    }

    pub fn search_messages(
        &self,
        query: &RadiusQuery,
        request: PageRequest,
    ) -> Result<Page<Message>> {
        let results = self
            .db
            .messages()
            .search_within_radius(query.center, query.radius_km)?;

        let (page, page_size) = self.page_bounds(request);
        let page = paginate(results, page, page_size, self.limits.max_page_size);
        debug!(
            lat = query.center.lat,
            lon = query.center.lng,
            radius_km = query.radius_km,
            results = page.total_count,
            "messages_searched"
        );
        Ok(page)
    }
}
