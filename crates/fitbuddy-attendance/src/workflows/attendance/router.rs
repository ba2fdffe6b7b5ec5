use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Coordinate, GeofenceError, RawBranch};
use super::geofence::{distance_meters, GeofenceEvaluator, DEFAULT_RADIUS_METERS};

#[derive(Debug, Clone, Deserialize)]
pub struct GeofenceCheckRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub radius_meters: Option<f64>,
    pub branches: Vec<RawBranch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistanceRequest {
    pub from: Coordinate,
    pub to: Coordinate,
}

#[derive(Debug, Clone, Serialize)]
pub struct DistanceResponse {
    pub distance_meters: f64,
}

/// Radius applied when a geofence request does not carry its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceDefaults {
    pub radius_meters: f64,
}

impl Default for GeofenceDefaults {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
        }
    }
}

/// Router exposing the geofence evaluator over HTTP.
pub fn geofence_router() -> Router {
    geofence_router_with_defaults(GeofenceDefaults::default())
}

pub fn geofence_router_with_defaults(defaults: GeofenceDefaults) -> Router {
    Router::new()
        .route("/api/v1/attendance/geofence", post(geofence_handler))
        .route("/api/v1/attendance/distance", post(distance_handler))
        .with_state(defaults)
}

pub(crate) async fn geofence_handler(
    State(defaults): State<GeofenceDefaults>,
    Json(request): Json<GeofenceCheckRequest>,
) -> Response {
    let point = Coordinate::new(request.latitude, request.longitude);
    if !point.is_valid() {
        return unprocessable(GeofenceError::InvalidPoint(point));
    }

    let radius = request.radius_meters.unwrap_or(defaults.radius_meters);
    let evaluator = match GeofenceEvaluator::new(radius) {
        Ok(evaluator) => evaluator,
        Err(err) => return unprocessable(err),
    };

    let branches = match request
        .branches
        .iter()
        .map(RawBranch::parse)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(branches) => branches,
        Err(err) => return unprocessable(err),
    };

    if branches.is_empty() {
        let payload = json!({ "error": "at least one branch is required" });
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
    }

    let result = evaluator.evaluate(point, &branches);
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn distance_handler(Json(request): Json<DistanceRequest>) -> Response {
    for point in [request.from, request.to] {
        if !point.is_valid() {
            return unprocessable(GeofenceError::InvalidPoint(point));
        }
    }

    let body = DistanceResponse {
        distance_meters: distance_meters(request.from, request.to),
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn unprocessable(err: GeofenceError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}
