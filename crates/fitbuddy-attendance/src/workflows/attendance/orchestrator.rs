use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::biometric::{BiometricOutcome, BiometricService, DEFAULT_BIOMETRIC_PROMPT};
use super::domain::{
    AcquisitionOutcome, Coordinate, EmployeeSession, GeofenceError, GeofenceResult, PunchType,
};
use super::geofence::GeofenceEvaluator;
use super::location::LocationSource;
use super::submission::{AttendanceApi, AttendancePayload, Clock};
use crate::config::AttendanceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    PermissionDenied,
    ServiceDisabled,
}

/// Check-in state machine. Terminal states are listed in [`AttendanceState::is_terminal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttendanceState {
    Idle,
    Authenticating,
    AuthenticationFailed,
    AcquiringLocation { attempt: u32 },
    LocationFailed { attempt: u32 },
    LocationFailedFinal,
    LocationBlocked { reason: BlockReason },
    Evaluating,
    OutOfRange,
    Cancelled,
    Submitting,
    Success,
    SubmissionFailed,
}

impl AttendanceState {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed
                | Self::LocationFailedFinal
                | Self::LocationBlocked { .. }
                | Self::Cancelled
                | Self::Success
                | Self::SubmissionFailed
        )
    }

    /// Whether the employee may dismiss the check-in dialog in this state.
    pub const fn allows_close(self) -> bool {
        !matches!(
            self,
            Self::Authenticating
                | Self::AcquiringLocation { .. }
                | Self::Evaluating
                | Self::Submitting
        )
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::AuthenticationFailed => "authentication failed",
            Self::AcquiringLocation { .. } => "acquiring location",
            Self::LocationFailed { .. } => "location failed",
            Self::LocationFailedFinal => "location unavailable",
            Self::LocationBlocked {
                reason: BlockReason::PermissionDenied,
            } => "location permission denied",
            Self::LocationBlocked {
                reason: BlockReason::ServiceDisabled,
            } => "location services disabled",
            Self::Evaluating => "checking distance to branches",
            Self::OutOfRange => "out of range",
            Self::Cancelled => "cancelled",
            Self::Submitting => "submitting",
            Self::Success => "attendance marked",
            Self::SubmissionFailed => "submission failed",
        }
    }
}

/// Pause between location attempts; injected so retries are testable without real timers.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendancePolicy {
    pub radius_meters: f64,
    pub location_retries: u32,
    pub retry_delay: Duration,
    pub biometric_prompt: String,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self::from(&AttendanceConfig::default())
    }
}

impl From<&AttendanceConfig> for AttendancePolicy {
    fn from(config: &AttendanceConfig) -> Self {
        Self {
            radius_meters: config.radius_meters,
            location_retries: config.location_retries,
            retry_delay: config.retry_delay,
            biometric_prompt: DEFAULT_BIOMETRIC_PROMPT.to_string(),
        }
    }
}

/// Everything one check-in run observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub state: AttendanceState,
    pub trail: Vec<AttendanceState>,
    pub acquisition_attempts: u32,
    pub coordinate: Option<Coordinate>,
    pub geofence: Option<GeofenceResult>,
    pub message: Option<String>,
}

impl AttendanceReport {
    fn new() -> Self {
        Self {
            state: AttendanceState::Idle,
            trail: vec![AttendanceState::Idle],
            acquisition_attempts: 0,
            coordinate: None,
            geofence: None,
            message: None,
        }
    }

    fn transition(&mut self, next: AttendanceState) {
        info!(from = self.state.label(), to = next.label(), "attendance state");
        self.state = next;
        self.trail.push(next);
    }

    fn conclude(&mut self, terminal: AttendanceState, message: impl Into<String>) {
        self.message = Some(message.into());
        self.transition(terminal);
    }
}

/// Sequences biometrics, location, geofence and submission for one employee session.
pub struct AttendanceOrchestrator {
    session: EmployeeSession,
    location: Arc<dyn LocationSource>,
    api: Arc<dyn AttendanceApi>,
    delay: Arc<dyn Delay>,
    clock: Arc<dyn Clock>,
    biometrics: Option<Arc<BiometricService>>,
    evaluator: GeofenceEvaluator,
    policy: AttendancePolicy,
}

impl AttendanceOrchestrator {
    pub fn new(
        session: EmployeeSession,
        location: Arc<dyn LocationSource>,
        api: Arc<dyn AttendanceApi>,
        delay: Arc<dyn Delay>,
        clock: Arc<dyn Clock>,
        policy: AttendancePolicy,
    ) -> Result<Self, GeofenceError> {
        let evaluator = GeofenceEvaluator::new(policy.radius_meters)?;
        Ok(Self {
            session,
            location,
            api,
            delay,
            clock,
            biometrics: None,
            evaluator,
            policy,
        })
    }

    /// Adds the optional Authenticating step ahead of location acquisition.
    pub fn with_biometrics(mut self, biometrics: Arc<BiometricService>) -> Self {
        self.biometrics = Some(biometrics);
        self
    }

    pub fn policy(&self) -> &AttendancePolicy {
        &self.policy
    }

    pub async fn run(&self, punch: PunchType) -> AttendanceReport {
        let mut report = AttendanceReport::new();

        if let Some(biometrics) = &self.biometrics {
            report.transition(AttendanceState::Authenticating);
            match biometrics.authenticate(&self.policy.biometric_prompt).await {
                BiometricOutcome::Authenticated => {}
                // no sensor is a soft pass-through; a failed prompt stops the flow
                BiometricOutcome::Unavailable => {
                    warn!("biometric sensor unavailable, continuing without it");
                }
                BiometricOutcome::Failed { reason, help } => {
                    warn!(%reason, "biometric authentication failed");
                    report.conclude(AttendanceState::AuthenticationFailed, help);
                    return report;
                }
            }
        }

        let Some(coordinate) = self.acquire_with_retry(&mut report).await else {
            return report;
        };
        report.coordinate = Some(coordinate);

        report.transition(AttendanceState::Evaluating);
        let branches = self.session.branch_locations();
        let geofence = self.evaluator.evaluate(coordinate, &branches);
        report.geofence = Some(geofence.clone());

        if !geofence.within_radius {
            info!(
                distance_meters = geofence.distance_meters,
                radius_meters = self.evaluator.radius_meters(),
                "employee outside every branch geofence"
            );
            report.transition(AttendanceState::OutOfRange);
            let message = format!(
                "You are not within {} meters of any branch.",
                self.evaluator.radius_meters()
            );
            report.conclude(AttendanceState::Cancelled, message);
            return report;
        }

        report.transition(AttendanceState::Submitting);
        let payload = AttendancePayload::new(
            self.session.user_id,
            coordinate,
            self.clock.now(),
            punch,
        );

        // no automatic retry here: a resend could create a duplicate attendance record
        match self.api.submit(&payload).await {
            Ok(receipt) => report.conclude(AttendanceState::Success, receipt.message),
            Err(err) => {
                warn!(error = %err, "attendance submission failed");
                report.conclude(AttendanceState::SubmissionFailed, err.user_message());
            }
        }
        report
    }

    /// Runs the location routine up to `1 + location_retries` times with a fixed pause.
    /// Permission and service problems halt immediately, as does an employee declining to
    /// try again; only exhaustion is retried.
    async fn acquire_with_retry(
        &self,
        report: &mut AttendanceReport,
    ) -> Option<Coordinate> {
        let total_attempts = self.policy.location_retries.saturating_add(1);
        let mut last_reason = String::new();

        for attempt in 1..=total_attempts {
            report.transition(AttendanceState::AcquiringLocation { attempt });
            report.acquisition_attempts = attempt;

            match self.location.locate().await {
                AcquisitionOutcome::Success(coordinate) => return Some(coordinate),
                AcquisitionOutcome::PermissionDenied => {
                    report.conclude(
                        AttendanceState::LocationBlocked {
                            reason: BlockReason::PermissionDenied,
                        },
                        "Please allow location access to mark attendance.",
                    );
                    return None;
                }
                AcquisitionOutcome::ServiceDisabled => {
                    report.conclude(
                        AttendanceState::LocationBlocked {
                            reason: BlockReason::ServiceDisabled,
                        },
                        "Please enable location services to mark attendance.",
                    );
                    return None;
                }
                AcquisitionOutcome::Abandoned(reason) => {
                    report.transition(AttendanceState::LocationFailed { attempt });
                    report.conclude(
                        AttendanceState::Cancelled,
                        format!("Attendance not marked: {reason}."),
                    );
                    return None;
                }
                AcquisitionOutcome::Unavailable(reason) => {
                    report.transition(AttendanceState::LocationFailed { attempt });
                    last_reason = reason;
                    if attempt < total_attempts {
                        info!(
                            attempt,
                            remaining = total_attempts - attempt,
                            "retrying location acquisition"
                        );
                        self.delay.wait(self.policy.retry_delay).await;
                    }
                }
            }
        }

        report.conclude(
            AttendanceState::LocationFailedFinal,
            format!(
                "Unable to get your location after {total_attempts} attempts ({last_reason}). \
                 Enable GPS, check your internet connection, and try again in an open area."
            ),
        );
        None
    }
}
