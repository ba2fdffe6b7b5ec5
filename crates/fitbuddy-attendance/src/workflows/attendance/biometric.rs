use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::platform::{PlatformError, PlatformKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricSensor {
    TouchId,
    FaceId,
    Biometrics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiometricPrompt {
    pub message: String,
    pub cancel_button: &'static str,
    pub fallback_button: &'static str,
}

/// Native biometric bridge.
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    /// `None` when the device has no usable sensor.
    async fn sensor(&self) -> Result<Option<BiometricSensor>, PlatformError>;
    /// `true` when the user authenticated, `false` when they failed or dismissed the prompt.
    async fn prompt(&self, prompt: &BiometricPrompt) -> Result<bool, PlatformError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BiometricOutcome {
    Authenticated,
    Unavailable,
    Failed { reason: String, help: String },
}

pub const DEFAULT_BIOMETRIC_PROMPT: &str = "Authenticate to mark attendance";

pub struct BiometricService {
    kind: PlatformKind,
    authenticator: Arc<dyn BiometricAuthenticator>,
}

impl BiometricService {
    pub fn new(kind: PlatformKind, authenticator: Arc<dyn BiometricAuthenticator>) -> Self {
        Self {
            kind,
            authenticator,
        }
    }

    pub async fn authenticate(&self, message: &str) -> BiometricOutcome {
        let sensor = match self.authenticator.sensor().await {
            Ok(Some(sensor)) => sensor,
            Ok(None) => return BiometricOutcome::Unavailable,
            Err(err) => {
                warn!(error = %err, "biometric availability check failed");
                return BiometricOutcome::Unavailable;
            }
        };

        let prompt = BiometricPrompt {
            message: prompt_message(self.kind, sensor, message),
            cancel_button: "Cancel",
            fallback_button: "Use Password",
        };

        info!(?sensor, "starting biometric authentication");
        match self.authenticator.prompt(&prompt).await {
            Ok(true) => BiometricOutcome::Authenticated,
            Ok(false) => BiometricOutcome::Failed {
                reason: "AUTH_FAILED".to_string(),
                help: "Authentication failed. Please try again.".to_string(),
            },
            Err(err) => {
                warn!(error = %err, "biometric authentication error");
                classify_bridge_error(&err)
            }
        }
    }
}

fn prompt_message(kind: PlatformKind, sensor: BiometricSensor, fallback: &str) -> String {
    match (kind, sensor) {
        (PlatformKind::Android, BiometricSensor::Biometrics) => {
            "Use fingerprint sensor to authenticate\n\nCheck: Back, Front, or Power button"
                .to_string()
        }
        (PlatformKind::Ios, BiometricSensor::TouchId) => {
            "Touch the Home button fingerprint sensor".to_string()
        }
        (PlatformKind::Ios, BiometricSensor::FaceId) => "Face ID to authenticate".to_string(),
        _ => fallback.to_string(),
    }
}

fn classify_bridge_error(err: &PlatformError) -> BiometricOutcome {
    let PlatformError::Bridge(message) = err;
    let message = message.to_ascii_lowercase();
    let (reason, help) = if message.contains("cancel") {
        (
            "Authentication cancelled",
            "You cancelled the biometric authentication",
        )
    } else if message.contains("not enrolled") {
        (
            "Biometric not set up",
            "Please set up fingerprint/face ID in device settings",
        )
    } else {
        ("Authentication failed", "Please try again")
    };

    BiometricOutcome::Failed {
        reason: reason.to_string(),
        help: help.to_string(),
    }
}
