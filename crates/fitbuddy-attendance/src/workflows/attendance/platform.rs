//! Seams over the native device bridge.
//!
//! Every platform capability the check-in flow touches is expressed as an async trait so the
//! whole pipeline can run against an in-memory device in tests and in the CLI simulator. A
//! [`DeviceBridge`] bundles one implementation of each and is constructed once per session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::domain::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    Android,
    Ios,
}

/// Operating system family and raw version (Android API level on Android).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub kind: PlatformKind,
    pub version: u32,
}

impl PlatformInfo {
    pub const fn android(api_level: u32) -> Self {
        Self {
            kind: PlatformKind::Android,
            version: api_level,
        }
    }

    pub const fn ios(major: u32) -> Self {
        Self {
            kind: PlatformKind::Ios,
            version: major,
        }
    }

    /// Marketing name used in logs and user-facing messages.
    pub fn device_name(&self) -> String {
        match self.kind {
            PlatformKind::Android => super::profile::platform_version_name(self.version),
            PlatformKind::Ios => format!("iOS {}", self.version),
        }
    }
}

/// Options handed to a single `getCurrentPosition`-style call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionRequest {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl PositionRequest {
    pub const fn new(enable_high_accuracy: bool, timeout_ms: u64, maximum_age_ms: u64) -> Self {
        Self {
            enable_high_accuracy,
            timeout: Duration::from_millis(timeout_ms),
            maximum_age: Duration::from_millis(maximum_age_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionFix {
    pub coordinate: Coordinate,
    pub accuracy_meters: Option<f64>,
}

/// Failure reported by the geolocation provider for one request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location provider disabled")]
    ProviderDisabled,
    #[error("location request timed out after {0:?}")]
    Timeout(Duration),
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

impl PositionError {
    /// Maps W3C-style geolocation error codes (1 denied, 2 unavailable, 3 timeout).
    pub fn from_code(code: i32, message: impl Into<String>, timeout: Duration) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::ProviderDisabled,
            3 => Self::Timeout(timeout),
            _ => Self::Unavailable(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("native bridge error: {0}")]
    Bridge(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    NeverAskAgain,
}

/// Justification shown in the OS permission dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRationale {
    pub title: &'static str,
    pub message: &'static str,
    pub button_neutral: &'static str,
    pub button_negative: &'static str,
    pub button_positive: &'static str,
}

pub const LOCATION_RATIONALE: PermissionRationale = PermissionRationale {
    title: "Location Access Required",
    message: "This app needs location access to mark your attendance accurately.",
    button_neutral: "Ask Me Later",
    button_negative: "Cancel",
    button_positive: "Allow",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptChoice {
    Acknowledge,
    Cancel,
    OpenSettings,
    TryAgain,
}

impl PromptChoice {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Acknowledge => "OK",
            Self::Cancel => "Cancel",
            Self::OpenSettings => "Open Settings",
            Self::TryAgain => "Try Again",
        }
    }
}

/// A blocking alert with a fixed set of choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub title: String,
    pub message: String,
    pub choices: Vec<PromptChoice>,
}

impl Prompt {
    pub fn new(title: impl Into<String>, message: impl Into<String>, choices: &[PromptChoice]) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            choices: choices.to_vec(),
        }
    }
}

#[async_trait]
pub trait PermissionPlatform: Send + Sync {
    async fn request_location_permission(
        &self,
        rationale: &PermissionRationale,
    ) -> Result<PermissionStatus, PlatformError>;
}

#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self, request: PositionRequest) -> Result<PositionFix, PositionError>;
}

#[async_trait]
pub trait UserPrompter: Send + Sync {
    async fn present(&self, prompt: Prompt) -> PromptChoice;
}

#[async_trait]
pub trait SettingsLauncher: Send + Sync {
    async fn open_location_settings(&self) -> Result<(), PlatformError>;
}

/// One implementation of every device seam, shared by reference for the app session.
#[derive(Clone)]
pub struct DeviceBridge {
    pub info: PlatformInfo,
    pub permissions: Arc<dyn PermissionPlatform>,
    pub geolocation: Arc<dyn GeolocationProvider>,
    pub prompts: Arc<dyn UserPrompter>,
    pub settings: Arc<dyn SettingsLauncher>,
}

impl std::fmt::Debug for DeviceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBridge")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
