use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::attendance::{BranchImportError, GeofenceError, SubmissionError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Branches(BranchImportError),
    Geofence(GeofenceError),
    Submission(SubmissionError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Branches(err) => write!(f, "branch roster error: {}", err),
            AppError::Geofence(err) => write!(f, "geofence error: {}", err),
            AppError::Submission(err) => write!(f, "submission error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Branches(err) => Some(err),
            AppError::Geofence(err) => Some(err),
            AppError::Submission(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Branches(_) | AppError::Geofence(_) => StatusCode::BAD_REQUEST,
            AppError::Submission(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<BranchImportError> for AppError {
    fn from(value: BranchImportError) -> Self {
        Self::Branches(value)
    }
}

impl From<GeofenceError> for AppError {
    fn from(value: GeofenceError) -> Self {
        Self::Geofence(value)
    }
}

impl From<SubmissionError> for AppError {
    fn from(value: SubmissionError) -> Self {
        Self::Submission(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        let bad_input = AppError::from(GeofenceError::InvalidRadius(-1.0)).into_response();
        assert_eq!(bad_input.status(), StatusCode::BAD_REQUEST);

        let upstream =
            AppError::from(SubmissionError::Transport("connection refused".to_string()))
                .into_response();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let config = AppError::from(ConfigError::InvalidPort).into_response();
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bind = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let server = AppError::from(bind);
        assert!(server.to_string().starts_with("io error:"));
        assert_eq!(server.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
