use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{read_json_body, BRANCH, EMPLOYEE};
use crate::workflows::attendance::domain::{Coordinate, RawBranch};
use crate::workflows::attendance::router::{
    distance_handler, geofence_handler, geofence_router, geofence_router_with_defaults,
    DistanceRequest, GeofenceCheckRequest, GeofenceDefaults,
};

fn post(uri: &str, body: Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

fn salt_lake() -> Value {
    json!({ "id": "salt-lake", "name": "Salt Lake", "lat": "22.5739500", "lng": "88.3066500" })
}

#[tokio::test]
async fn geofence_route_reports_nearest_branch() {
    let response = geofence_router()
        .oneshot(post(
            "/api/v1/attendance/geofence",
            json!({
                "latitude": EMPLOYEE.latitude,
                "longitude": EMPLOYEE.longitude,
                "branches": [
                    salt_lake(),
                    { "id": "howrah", "name": "Howrah", "lat": "22.5958", "lng": "88.2636" }
                ]
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["within_radius"], json!(true));
    assert_eq!(payload["nearest_branch"]["id"], json!("salt-lake"));
    let distance = payload["distance_meters"].as_f64().expect("numeric distance");
    assert!((7.0..=8.5).contains(&distance));
}

#[tokio::test]
async fn geofence_route_honours_custom_radius() {
    let response = geofence_router()
        .oneshot(post(
            "/api/v1/attendance/geofence",
            json!({
                "latitude": EMPLOYEE.latitude,
                "longitude": EMPLOYEE.longitude,
                "radius_meters": 5.0,
                "branches": [salt_lake()]
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["within_radius"], json!(false));
}

#[tokio::test]
async fn configured_default_radius_applies_without_override() {
    let router = geofence_router_with_defaults(GeofenceDefaults { radius_meters: 5.0 });
    let response = router
        .oneshot(post(
            "/api/v1/attendance/geofence",
            json!({
                "latitude": EMPLOYEE.latitude,
                "longitude": EMPLOYEE.longitude,
                "branches": [salt_lake()]
            }),
        ))
        .await
        .expect("route executes");

    let payload = read_json_body(response).await;
    assert_eq!(payload["within_radius"], json!(false));
}

#[tokio::test]
async fn distance_route_returns_haversine_meters() {
    let response = geofence_router()
        .oneshot(post(
            "/api/v1/attendance/distance",
            json!({
                "from": { "latitude": 22.5726, "longitude": 88.3639 },
                "to": { "latitude": 22.5736, "longitude": 88.3649 }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let distance = payload["distance_meters"].as_f64().expect("numeric distance");
    assert!((distance - 129.289).abs() < 0.01, "got {distance}");
}

#[tokio::test]
async fn geofence_handler_rejects_empty_branch_list() {
    let request = GeofenceCheckRequest {
        latitude: EMPLOYEE.latitude,
        longitude: EMPLOYEE.longitude,
        radius_meters: None,
        branches: Vec::new(),
    };

    let response =
        geofence_handler(State(GeofenceDefaults::default()), axum::Json(request)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn geofence_handler_rejects_unparseable_branch() {
    let request = GeofenceCheckRequest {
        latitude: EMPLOYEE.latitude,
        longitude: EMPLOYEE.longitude,
        radius_meters: None,
        branches: vec![RawBranch {
            id: "broken".to_string(),
            name: "Broken".to_string(),
            lat: "north".to_string(),
            lng: "88.30".to_string(),
        }],
    };

    let response =
        geofence_handler(State(GeofenceDefaults::default()), axum::Json(request)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some());
}

#[tokio::test]
async fn geofence_handler_rejects_non_positive_radius() {
    for radius in [-10.0, 0.0] {
        let request = GeofenceCheckRequest {
            latitude: EMPLOYEE.latitude,
            longitude: EMPLOYEE.longitude,
            radius_meters: Some(radius),
            branches: Vec::new(),
        };

        let response =
            geofence_handler(State(GeofenceDefaults::default()), axum::Json(request)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json_body(response).await;
        let error = payload["error"].as_str().expect("error message");
        assert!(error.contains("positive"), "unexpected error: {error}");
    }
}

#[tokio::test]
async fn distance_handler_rejects_out_of_range_point() {
    let request = DistanceRequest {
        from: Coordinate::new(91.0, 0.0),
        to: BRANCH,
    };

    let response = distance_handler(axum::Json(request)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
