//! HTTP API routes
//!
//! Points and messages are created with JSON bodies and searched with query
//! parameters. Search responses are paginated as
//! `{count, next, previous, results}`.

use crate::constants::http::IDENTITY_HEADER;
use crate::error::Error;
use crate::pagination::Page;
use crate::server::state::AppState;
use crate::service::{PageRequest, RadiusQuery};
use crate::store::{Message, Point};

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequestParts, Query, State,
    },
    http::{request::Parts, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/points/", post(create_point_handler))
        .route("/points/search/", get(search_points_handler))
        .route("/points/messages/", post(create_message_handler))
        .route("/points/messages/search/", get(search_messages_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    /// Offending input field, for validation errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    fn bad_request(field: &str, error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            code: "VALIDATION_ERROR".to_string(),
            field: Some(field.to_string()),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code, field) = match &err {
            Error::Validation { field, .. } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", Some(field.clone()))
            }
            Error::PointNotFound(_) => (StatusCode::NOT_FOUND, "POINT_NOT_FOUND", None),
            Error::Unauthenticated => (StatusCode::UNAUTHORIZED, "NOT_AUTHENTICATED", None),
            _ => {
                tracing::error!(error = %err, "request_failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None)
            }
        };
        ApiError {
            error: err.to_string(),
            code: code.to_string(),
            field,
            status,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("query", rejection.body_text())
    }
}

/// Caller identity established by the upstream auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Identity(value.to_string()))
            .ok_or_else(|| Error::Unauthenticated.into())
    }
}

/// Create point request body
#[derive(Debug, Deserialize)]
pub struct CreatePointRequest {
    #[serde(default)]
    pub title: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointResponse {
    pub id: u64,
    pub title: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Point> for PointResponse {
    fn from(point: Point) -> Self {
        Self {
            id: point.id,
            title: point.title,
            latitude: point.location.lat,
            longitude: point.location.lng,
            created_at: point.created_at,
        }
    }
}

/// Create message request body
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub point_id: Option<i64>,
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: u64,
    pub point_id: u64,
    pub text: String,
    /// Author identity
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            point_id: message.point_id,
            text: message.text,
            author: message.author_id,
            created_at: message.created_at,
        }
    }
}

/// Search query parameters
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Kilometers
    pub radius: Option<f64>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl SearchParams {
    fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// Relative link to `page` of the same search on `path`
    fn link(&self, path: &str, query: &RadiusQuery, page: usize) -> String {
        let mut link = format!(
            "{}?latitude={}&longitude={}&radius={}&page={}",
            path, query.center.lat, query.center.lng, query.radius_km, page
        );
        if let Some(page_size) = self.page_size {
            link.push_str(&format!("&page_size={}", page_size));
        }
        link
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    fn from_page<U: Into<T>>(
        page: Page<U>,
        uri: &Uri,
        params: &SearchParams,
        query: &RadiusQuery,
    ) -> Self {
        let path = uri.path();
        let next = page.next_page().map(|n| params.link(path, query, n));
        let previous = page.previous_page().map(|n| params.link(path, query, n));
        let page = page.map(Into::into);
        Self {
            count: page.total_count,
            next,
            previous,
            results: page.items,
        }
    }
}

/// Create a point
///
/// POST /points/
async fn create_point_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePointRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PointResponse>), ApiError> {
    let Json(req) = payload?;
    let latitude = req
        .latitude
        .ok_or_else(|| Error::validation("latitude", "This field is required"))?;
    let longitude = req
        .longitude
        .ok_or_else(|| Error::validation("longitude", "This field is required"))?;

    let point = state
        .service
        .create_point(req.title.as_deref(), latitude, longitude)?;

    Ok((StatusCode::CREATED, Json(point.into())))
}

/// Points within a radius
///
/// GET /points/search/?latitude=&longitude=&radius=
async fn search_points_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<PointResponse>>, ApiError> {
    let Query(params) = params?;
    let query = state
        .service
        .radius_query(params.latitude, params.longitude, params.radius)?;

    let page = state.service.search_points(&query, params.page_request())?;

    Ok(Json(PaginatedResponse::from_page(page, &uri, &params, &query)))
}

/// Create a message on behalf of the caller
///
/// POST /points/messages/
async fn create_message_handler(
    State(state): State<Arc<AppState>>,
    Identity(author_id): Identity,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(req) = payload?;
    let point_id = req
        .point_id
        .ok_or_else(|| Error::validation("point_id", "This field is required"))?;
    let text = req
        .text
        .ok_or_else(|| Error::validation("text", "This field is required"))?;

    let message = state.service.create_message(point_id, &author_id, &text)?;

    Ok((StatusCode::CREATED, Json(message.into())))
}

/// Messages attached to points within a radius
///
/// GET /points/messages/search/?latitude=&longitude=&radius=
async fn search_messages_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<PaginatedResponse<MessageResponse>>, ApiError> {
    let Query(params) = params?;
    let query = state
        .service
        .radius_query(params.latitude, params.longitude, params.radius)?;

    let page = state.service.search_messages(&query, params.page_request())?;

    Ok(Json(PaginatedResponse::from_page(page, &uri, &params, &query)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DEFAULT_CELL_SIZE_DEG;
    use crate::service::{GeoService, SearchLimits};
    use crate::store::Database;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn create_test_app(limits: SearchLimits) -> Router {
        let db = Database::in_memory(DEFAULT_CELL_SIZE_DEG).unwrap();
        create_router(Arc::new(AppState::new(GeoService::new(db, limits))))
    }

    async fn send<T: DeserializeOwned>(app: &Router, request: Request<Body>) -> (StatusCode, T) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(user) = user {
            builder = builder.header(IDENTITY_HEADER, user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn create_point(app: &Router, title: &str, lat: f64, lng: f64) -> PointResponse {
        let body = serde_json::json!({ "title": title, "latitude": lat, "longitude": lng });
        let (status, point) = send(app, post_json("/points/", body, None)).await;
        assert_eq!(status, StatusCode::CREATED);
        point
    }

    #[tokio::test]
    async fn test_create_point() {
        let app = create_test_app(SearchLimits::default());

        let point = create_point(&app, " A ", 55.751244, 37.618423).await;
        assert_eq!(point.id, 1);
        assert_eq!(point.title.as_deref(), Some("A"));
        assert_eq!(point.latitude, 55.751244);

        let untitled = create_point(&app, "", 0.0, 0.0).await;
        assert_eq!(untitled.id, 2);
        assert_eq!(untitled.title, None);
    }

    #[tokio::test]
    async fn test_create_point_invalid_latitude() {
        let app = create_test_app(SearchLimits::default());

        let body = serde_json::json!({ "latitude": 91.0, "longitude": -74.0060 });
        let (status, err): (_, ApiError) = send(&app, post_json("/points/", body, None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.field.as_deref(), Some("latitude"));
    }

    #[tokio::test]
    async fn test_create_point_missing_longitude() {
        let app = create_test_app(SearchLimits::default());

        let body = serde_json::json!({ "latitude": 10.0 });
        let (status, err): (_, ApiError) = send(&app, post_json("/points/", body, None)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.field.as_deref(), Some("longitude"));
    }

    #[tokio::test]
    async fn test_create_point_malformed_body() {
        let app = create_test_app(SearchLimits::default());

        let request = Request::builder()
            .method("POST")
            .uri("/points/")
            .header("Content-Type", "application/json")
            .body(Body::from("{ nope"))
            .unwrap();
        let (status, err): (_, ApiError) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_search_points_scenario() {
        let app = create_test_app(SearchLimits::default());
        let center = create_point(&app, "center", 55.751244, 37.618423).await;
        let near = create_point(&app, "near", 55.761244, 37.618423).await;

        let (status, page): (_, PaginatedResponse<PointResponse>) = send(
            &app,
            get("/points/search/?latitude=55.751244&longitude=37.618423&radius=1"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].id, center.id);
        assert!(page.next.is_none());
        assert!(page.previous.is_none());

        let (_, page): (_, PaginatedResponse<PointResponse>) = send(
            &app,
            get("/points/search/?latitude=55.751244&longitude=37.618423&radius=2"),
        )
        .await;
        let ids: Vec<u64> = page.results.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![center.id, near.id]);
    }

    #[tokio::test]
    async fn test_search_points_links() {
        let app = create_test_app(SearchLimits::default());
        for _ in 0..5 {
            create_point(&app, "p", 10.0, 10.0).await;
        }

        let (_, page): (_, PaginatedResponse<PointResponse>) = send(
            &app,
            get("/points/search/?latitude=10&longitude=10&radius=1&page=2&page_size=2"),
        )
        .await;
        assert_eq!(page.count, 5);
        assert_eq!(page.results.len(), 2);
        assert_eq!(
            page.next.as_deref(),
            Some("/points/search/?latitude=10&longitude=10&radius=1&page=3&page_size=2")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("/points/search/?latitude=10&longitude=10&radius=1&page=1&page_size=2")
        );
    }

    #[tokio::test]
    async fn test_search_missing_radius() {
        let app = create_test_app(SearchLimits::default());

        let (status, err): (_, ApiError) =
            send(&app, get("/points/search/?latitude=1&longitude=1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.field.as_deref(), Some("radius"));
    }

    #[tokio::test]
    async fn test_search_negative_radius() {
        let app = create_test_app(SearchLimits::default());

        let (status, err): (_, ApiError) =
            send(&app, get("/points/search/?latitude=1&longitude=1&radius=-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_search_radius_over_ceiling() {
        let app = create_test_app(SearchLimits {
            max_radius_km: Some(50.0),
            ..SearchLimits::default()
        });

        let (status, err): (_, ApiError) =
            send(&app, get("/points/search/?latitude=1&longitude=1&radius=51")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.field.as_deref(), Some("radius"));
    }

    #[tokio::test]
    async fn test_search_unparseable_query() {
        let app = create_test_app(SearchLimits::default());

        let (status, err): (_, ApiError) = send(
            &app,
            get("/points/search/?latitude=north&longitude=1&radius=1"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_create_message() {
        let app = create_test_app(SearchLimits::default());
        let point = create_point(&app, "A", 55.751244, 37.618423).await;

        let body = serde_json::json!({ "point_id": point.id, "text": " hello " });
        let (status, message): (_, MessageResponse) =
            send(&app, post_json("/points/messages/", body, Some("user-1"))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(message.point_id, point.id);
        assert_eq!(message.text, "hello");
        assert_eq!(message.author, "user-1");
    }

    #[tokio::test]
    async fn test_create_message_requires_identity() {
        let app = create_test_app(SearchLimits::default());
        let point = create_point(&app, "A", 1.0, 1.0).await;

        let body = serde_json::json!({ "point_id": point.id, "text": "hi" });
        let (status, err): (_, ApiError) =
            send(&app, post_json("/points/messages/", body.clone(), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "NOT_AUTHENTICATED");

        let (status, _): (_, ApiError) =
            send(&app, post_json("/points/messages/", body, Some("  "))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_message_unknown_point() {
        let app = create_test_app(SearchLimits::default());

        let body = serde_json::json!({ "point_id": 999999, "text": "hi" });
        let (status, err): (_, ApiError) =
            send(&app, post_json("/points/messages/", body, Some("user-1"))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "POINT_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_message_bad_input() {
        let app = create_test_app(SearchLimits::default());
        let point = create_point(&app, "A", 1.0, 1.0).await;

        let body = serde_json::json!({ "point_id": point.id, "text": "   " });
        let (status, err): (_, ApiError) =
            send(&app, post_json("/points/messages/", body, Some("u"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.field.as_deref(), Some("text"));

        let body = serde_json::json!({ "point_id": 0, "text": "hi" });
        let (status, err): (_, ApiError) =
            send(&app, post_json("/points/messages/", body, Some("u"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.field.as_deref(), Some("point_id"));
    }

    #[tokio::test]
    async fn test_search_messages_scenario() {
        let app = create_test_app(SearchLimits::default());
        let center = create_point(&app, "center", 55.751244, 37.618423).await;
        let near = create_point(&app, "near", 55.761244, 37.618423).await;

        let mut on_center = Vec::new();
        for (point_id, text) in [(center.id, "a"), (near.id, "b"), (center.id, "c")] {
            let body = serde_json::json!({ "point_id": point_id, "text": text });
            let (status, message): (_, MessageResponse) =
                send(&app, post_json("/points/messages/", body, Some("u"))).await;
            assert_eq!(status, StatusCode::CREATED);
            if point_id == center.id {
                on_center.push(message.id);
            }
        }

        let (status, page): (_, PaginatedResponse<MessageResponse>) = send(
            &app,
            get("/points/messages/search/?latitude=55.751244&longitude=37.618423&radius=1"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page.count, 2);
        let ids: Vec<u64> = page.results.iter().map(|m| m.id).collect();
        assert_eq!(ids, on_center);
    }
}
