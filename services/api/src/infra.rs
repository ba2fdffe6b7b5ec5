use async_trait::async_trait;
use fitbuddy_attendance::workflows::attendance::platform::PermissionRationale;
use fitbuddy_attendance::workflows::attendance::{
    AttendanceApi, AttendancePayload, BiometricAuthenticator, BiometricPrompt, BiometricSensor,
    Coordinate, DeviceBridge, GeolocationProvider, PermissionPlatform, PermissionStatus,
    PlatformError, PlatformInfo, PositionError, PositionFix, PositionRequest, Prompt,
    PromptChoice, PunchType, SettingsLauncher, SubmissionError, SubmissionReceipt,
    UserPrompter, PROBE_REQUEST,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Knobs for a scripted handset.
#[derive(Debug, Clone)]
pub(crate) struct DeviceScript {
    pub(crate) info: PlatformInfo,
    pub(crate) position: Coordinate,
    pub(crate) permission: PermissionStatus,
    pub(crate) services_enabled: bool,
    /// Acquisition requests that time out before fixes start arriving.
    pub(crate) failed_fixes: u32,
    pub(crate) biometric_sensor: Option<BiometricSensor>,
}

/// Handset stand-in implementing every native capability the location pipeline needs.
pub(crate) struct SimulatedDevice {
    script: DeviceScript,
    remaining_failures: AtomicU32,
    prompts: Mutex<Vec<Prompt>>,
}

impl SimulatedDevice {
    pub(crate) fn new(script: DeviceScript) -> Arc<Self> {
        Arc::new(Self {
            remaining_failures: AtomicU32::new(script.failed_fixes),
            script,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn bridge(self: &Arc<Self>) -> DeviceBridge {
        DeviceBridge {
            info: self.script.info,
            permissions: self.clone(),
            geolocation: self.clone(),
            prompts: self.clone(),
            settings: self.clone(),
        }
    }

    pub(crate) fn info(&self) -> PlatformInfo {
        self.script.info
    }

    pub(crate) fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().expect("prompt mutex poisoned").clone()
    }

    fn take_failure(&self) -> bool {
        self.remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PermissionPlatform for SimulatedDevice {
    async fn request_location_permission(
        &self,
        rationale: &PermissionRationale,
    ) -> Result<PermissionStatus, PlatformError> {
        info!(title = rationale.title, status = ?self.script.permission, "permission requested");
        Ok(self.script.permission)
    }
}

#[async_trait]
impl GeolocationProvider for SimulatedDevice {
    async fn current_position(&self, request: PositionRequest) -> Result<PositionFix, PositionError> {
        if request == PROBE_REQUEST {
            if !self.script.services_enabled {
                return Err(PositionError::ProviderDisabled);
            }
        } else if self.take_failure() {
            return Err(PositionError::Timeout(request.timeout));
        }

        Ok(PositionFix {
            coordinate: self.script.position,
            accuracy_meters: Some(if request.enable_high_accuracy { 8.0 } else { 35.0 }),
        })
    }
}

#[async_trait]
impl UserPrompter for SimulatedDevice {
    async fn present(&self, prompt: Prompt) -> PromptChoice {
        let choice = prompt
            .choices
            .first()
            .copied()
            .unwrap_or(PromptChoice::Acknowledge);
        info!(title = %prompt.title, choice = choice.label(), "prompt shown");
        self.prompts
            .lock()
            .expect("prompt mutex poisoned")
            .push(prompt);
        choice
    }
}

#[async_trait]
impl SettingsLauncher for SimulatedDevice {
    async fn open_location_settings(&self) -> Result<(), PlatformError> {
        info!("location settings opened");
        Ok(())
    }
}

#[async_trait]
impl BiometricAuthenticator for SimulatedDevice {
    async fn sensor(&self) -> Result<Option<BiometricSensor>, PlatformError> {
        Ok(self.script.biometric_sensor)
    }

    async fn prompt(&self, prompt: &BiometricPrompt) -> Result<bool, PlatformError> {
        info!(message = %prompt.message, "biometric prompt accepted");
        Ok(true)
    }
}

/// Accepts every payload without calling the remote API.
#[derive(Default)]
pub(crate) struct DryRunAttendanceApi {
    payloads: Mutex<Vec<AttendancePayload>>,
}

impl DryRunAttendanceApi {
    pub(crate) fn payloads(&self) -> Vec<AttendancePayload> {
        self.payloads.lock().expect("payload mutex poisoned").clone()
    }
}

#[async_trait]
impl AttendanceApi for DryRunAttendanceApi {
    async fn submit(&self, payload: &AttendancePayload) -> Result<SubmissionReceipt, SubmissionError> {
        info!(emp_id = payload.emp_id, date = %payload.date, time = %payload.time, "dry run submission");
        self.payloads
            .lock()
            .expect("payload mutex poisoned")
            .push(payload.clone());
        Ok(SubmissionReceipt {
            message: "Dry run: attendance not sent".to_string(),
        })
    }
}

pub(crate) fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected 'LAT,LNG', got '{raw}'"))?;
    let parse = |value: &str, label: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid {label} '{}' ({err})", value.trim()))
    };

    let coordinate = Coordinate::new(parse(lat, "latitude")?, parse(lng, "longitude")?);
    if !coordinate.is_valid() {
        return Err(format!("coordinate out of range: {coordinate}"));
    }
    Ok(coordinate)
}

pub(crate) fn parse_punch(raw: &str) -> Result<PunchType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "in" => Ok(PunchType::In),
        "out" => Ok(PunchType::Out),
        other => Err(format!("punch must be 'in' or 'out', got '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> DeviceScript {
        DeviceScript {
            info: PlatformInfo::android(33),
            position: Coordinate::new(22.5738994, 88.3065939),
            permission: PermissionStatus::Granted,
            services_enabled: true,
            failed_fixes: 2,
            biometric_sensor: None,
        }
    }

    #[test]
    fn parses_coordinates_and_punches() {
        let coordinate = parse_coordinate("22.5738994, 88.3065939").expect("valid coordinate");
        assert_eq!(coordinate.latitude, 22.5738994);
        assert!(parse_coordinate("22.57").is_err());
        assert!(parse_coordinate("95.0,10.0").is_err());

        assert_eq!(parse_punch("OUT"), Ok(PunchType::Out));
        assert!(parse_punch("lunch").is_err());
    }

    #[tokio::test]
    async fn simulated_device_fails_scripted_fixes_then_recovers() {
        let device = SimulatedDevice::new(script());
        let request = PositionRequest::new(true, 25_000, 180_000);

        assert!(device.current_position(PROBE_REQUEST).await.is_ok());
        assert!(matches!(
            device.current_position(request).await,
            Err(PositionError::Timeout(_))
        ));
        assert!(device.current_position(request).await.is_err());
        assert!(device.current_position(request).await.is_ok());
    }

    #[tokio::test]
    async fn disabled_services_fail_the_probe() {
        let device = SimulatedDevice::new(DeviceScript {
            services_enabled: false,
            ..script()
        });

        assert_eq!(
            device.current_position(PROBE_REQUEST).await,
            Err(PositionError::ProviderDisabled)
        );
    }
}
