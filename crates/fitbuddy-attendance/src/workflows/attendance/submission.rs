use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{Coordinate, PunchType};

pub const ATTENDANCE_ENDPOINT: &str = "/employee_attendance.php";

/// Body of the remote attendance call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendancePayload {
    pub emp_id: i64,
    pub lat: f64,
    pub lng: f64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:mm:ss`
    pub time: String,
    #[serde(rename = "type")]
    pub punch: PunchType,
}

impl AttendancePayload {
    pub fn new(emp_id: i64, coordinate: Coordinate, at: NaiveDateTime, punch: PunchType) -> Self {
        Self {
            emp_id,
            lat: coordinate.latitude,
            lng: coordinate.longitude,
            date: at.format("%Y-%m-%d").to_string(),
            time: at.format("%H:%M:%S").to_string(),
            punch,
        }
    }
}

/// The API answers `status: true` on some endpoints and `status: "success"` on others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseStatus {
    Flag(bool),
    Text(String),
}

impl ResponseStatus {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => text.eq_ignore_ascii_case("success"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Rejected(String),
    #[error("attendance API returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("attendance API unreachable: {0}")]
    Transport(String),
    #[error("unexpected attendance API response: {0}")]
    Decode(String),
}

impl SubmissionError {
    /// Text shown to the employee; API messages are surfaced verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) | Self::Http { message, .. } => message.clone(),
            Self::Transport(_) | Self::Decode(_) => "Something went wrong".to_string(),
        }
    }
}

/// Remote attendance endpoint.
#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn submit(&self, payload: &AttendancePayload) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Interprets a decoded response body.
pub fn interpret_response(response: AttendanceResponse) -> Result<SubmissionReceipt, SubmissionError> {
    if response.status.is_success() {
        Ok(SubmissionReceipt {
            message: response
                .message
                .unwrap_or_else(|| "Attendance recorded successfully.".to_string()),
        })
    } else {
        Err(SubmissionError::Rejected(
            response
                .message
                .unwrap_or_else(|| "Failed to mark attendance".to_string()),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// JSON-over-HTTP client for the PHP attendance API.
#[derive(Debug, Clone)]
pub struct HttpAttendanceApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAttendanceApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint_url(base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), ATTENDANCE_ENDPOINT)
}

#[async_trait]
impl AttendanceApi for HttpAttendanceApi {
    async fn submit(&self, payload: &AttendancePayload) -> Result<SubmissionReceipt, SubmissionError> {
        info!(endpoint = %self.endpoint, emp_id = payload.emp_id, "submitting attendance");
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|err| SubmissionError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| "Something went wrong".to_string());
            warn!(status = status.as_u16(), %message, "attendance API error response");
            return Err(SubmissionError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .json::<AttendanceResponse>()
            .await
            .map_err(|err| SubmissionError::Decode(err.to_string()))?;
        interpret_response(body)
    }
}

/// Wall-clock source for the payload timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn payload_matches_wire_shape() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 9)
            .and_then(|date| date.and_hms_opt(7, 5, 3))
            .expect("valid timestamp");
        let payload = AttendancePayload::new(
            42,
            Coordinate::new(22.5738994, 88.3065939),
            at,
            PunchType::In,
        );

        let json = serde_json::to_value(&payload).expect("serializes");
        assert_eq!(json["emp_id"], 42);
        assert_eq!(json["date"], "2025-03-09");
        assert_eq!(json["time"], "07:05:03");
        assert_eq!(json["type"], "in");
        assert_eq!(json["lat"], 22.5738994);
    }

    #[test]
    fn accepts_boolean_and_text_success() {
        let flag: AttendanceResponse =
            serde_json::from_str(r#"{"status": true, "message": "Marked"}"#).expect("decodes");
        assert_eq!(
            interpret_response(flag),
            Ok(SubmissionReceipt {
                message: "Marked".to_string()
            })
        );

        let text: AttendanceResponse =
            serde_json::from_str(r#"{"status": "success"}"#).expect("decodes");
        assert!(interpret_response(text).is_ok());
    }

    #[test]
    fn rejection_surfaces_api_message_verbatim() {
        let body: AttendanceResponse =
            serde_json::from_str(r#"{"status": false, "message": "Already checked in today"}"#)
                .expect("decodes");
        let err = interpret_response(body).expect_err("rejected");
        assert_eq!(err.user_message(), "Already checked in today");

        let bare: AttendanceResponse =
            serde_json::from_str(r#"{"status": "error"}"#).expect("decodes");
        assert_eq!(
            interpret_response(bare).expect_err("rejected").user_message(),
            "Failed to mark attendance"
        );
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint_url("https://performyx.fitbuddy.in/app_api/"),
            "https://performyx.fitbuddy.in/app_api/employee_attendance.php"
        );
        assert_eq!(
            endpoint_url("http://127.0.0.1:8000/app_api"),
            "http://127.0.0.1:8000/app_api/employee_attendance.php"
        );
    }
}
