use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::workflows::attendance::domain::{AcquisitionOutcome, Coordinate, EmployeeSession, RawBranch};
use crate::workflows::attendance::orchestrator::{AttendanceOrchestrator, AttendancePolicy, Delay};
use crate::workflows::attendance::platform::{
    DeviceBridge, GeolocationProvider, PermissionPlatform, PermissionRationale, PermissionStatus,
    PlatformError, PlatformInfo, PositionError, PositionFix, PositionRequest, Prompt,
    PromptChoice, SettingsLauncher, UserPrompter,
};
use crate::workflows::attendance::location::LocationSource;
use crate::workflows::attendance::submission::{
    AttendanceApi, AttendancePayload, Clock, SubmissionError, SubmissionReceipt,
};

pub(super) const EMPLOYEE: Coordinate = Coordinate::new(22.5738994, 88.3065939);
pub(super) const BRANCH: Coordinate = Coordinate::new(22.5739500, 88.3066500);
/// Roughly 2 km north of the branch.
pub(super) const FAR_AWAY: Coordinate = Coordinate::new(22.5918994, 88.3065939);

pub(super) fn session() -> EmployeeSession {
    EmployeeSession {
        user_id: 17,
        branches: vec![
            RawBranch {
                id: "salt-lake".to_string(),
                name: "Salt Lake".to_string(),
                lat: "22.5739500".to_string(),
                lng: "88.3066500".to_string(),
            },
            RawBranch {
                id: "howrah".to_string(),
                name: "Howrah".to_string(),
                lat: "22.5958".to_string(),
                lng: "88.2636".to_string(),
            },
        ],
    }
}

pub(super) fn fix(coordinate: Coordinate) -> PositionFix {
    PositionFix {
        coordinate,
        accuracy_meters: Some(12.0),
    }
}

/// One scripted answer from the fake geolocation provider.
#[derive(Debug, Clone)]
pub(super) enum Step {
    Fix(Coordinate),
    Fail(PositionError),
    /// Never answers; only the caller's own timeout ends the request.
    Hang,
}

#[derive(Default)]
pub(super) struct ScriptedGeolocation {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<PositionRequest>>,
}

impl ScriptedGeolocation {
    pub(super) fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn requests(&self) -> Vec<PositionRequest> {
        self.requests.lock().expect("request mutex poisoned").clone()
    }
}

#[async_trait]
impl GeolocationProvider for ScriptedGeolocation {
    async fn current_position(&self, request: PositionRequest) -> Result<PositionFix, PositionError> {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .push(request);
        let step = self.steps.lock().expect("step mutex poisoned").pop_front();

        match step {
            Some(Step::Fix(coordinate)) => Ok(fix(coordinate)),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(PositionError::Unavailable("script exhausted".to_string())),
        }
    }
}

pub(super) struct FixedPermissions(pub(super) Result<PermissionStatus, PlatformError>);

#[async_trait]
impl PermissionPlatform for FixedPermissions {
    async fn request_location_permission(
        &self,
        _rationale: &PermissionRationale,
    ) -> Result<PermissionStatus, PlatformError> {
        self.0.clone()
    }
}

pub(super) struct RecordingPrompter {
    answer: PromptChoice,
    prompts: Mutex<Vec<Prompt>>,
}

impl RecordingPrompter {
    pub(super) fn answering(answer: PromptChoice) -> Arc<Self> {
        Arc::new(Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn titles(&self) -> Vec<String> {
        self.prompts
            .lock()
            .expect("prompt mutex poisoned")
            .iter()
            .map(|prompt| prompt.title.clone())
            .collect()
    }
}

#[async_trait]
impl UserPrompter for RecordingPrompter {
    async fn present(&self, prompt: Prompt) -> PromptChoice {
        self.prompts
            .lock()
            .expect("prompt mutex poisoned")
            .push(prompt);
        self.answer
    }
}

#[derive(Default)]
pub(super) struct RecordingSettings {
    opened: AtomicUsize,
}

impl RecordingSettings {
    pub(super) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsLauncher for RecordingSettings {
    async fn open_location_settings(&self) -> Result<(), PlatformError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(super) struct FakeDevice {
    pub(super) geolocation: Arc<ScriptedGeolocation>,
    pub(super) prompts: Arc<RecordingPrompter>,
    pub(super) settings: Arc<RecordingSettings>,
    pub(super) bridge: DeviceBridge,
}

pub(super) fn device(
    info: PlatformInfo,
    permission: Result<PermissionStatus, PlatformError>,
    steps: Vec<Step>,
    answer: PromptChoice,
) -> FakeDevice {
    let geolocation = ScriptedGeolocation::new(steps);
    let prompts = RecordingPrompter::answering(answer);
    let settings = Arc::new(RecordingSettings::default());
    let bridge = DeviceBridge {
        info,
        permissions: Arc::new(FixedPermissions(permission)),
        geolocation: geolocation.clone(),
        prompts: prompts.clone(),
        settings: settings.clone(),
    };

    FakeDevice {
        geolocation,
        prompts,
        settings,
        bridge,
    }
}

/// Location source returning scripted outcomes, then repeating the last one.
pub(super) struct ScriptedLocation {
    outcomes: Mutex<VecDeque<AcquisitionOutcome>>,
    fallback: AcquisitionOutcome,
    calls: AtomicUsize,
}

impl ScriptedLocation {
    pub(super) fn new(outcomes: Vec<AcquisitionOutcome>, fallback: AcquisitionOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    pub(super) fn always(outcome: AcquisitionOutcome) -> Arc<Self> {
        Self::new(Vec::new(), outcome)
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationSource for ScriptedLocation {
    async fn locate(&self) -> AcquisitionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .expect("outcome mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub(super) struct RecordingApi {
    result: Result<SubmissionReceipt, SubmissionError>,
    payloads: Mutex<Vec<AttendancePayload>>,
}

impl RecordingApi {
    pub(super) fn accepting() -> Arc<Self> {
        Self::with_result(Ok(SubmissionReceipt {
            message: "Attendance marked".to_string(),
        }))
    }

    pub(super) fn with_result(result: Result<SubmissionReceipt, SubmissionError>) -> Arc<Self> {
        Arc::new(Self {
            result,
            payloads: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn payloads(&self) -> Vec<AttendancePayload> {
        self.payloads.lock().expect("payload mutex poisoned").clone()
    }
}

#[async_trait]
impl AttendanceApi for RecordingApi {
    async fn submit(&self, payload: &AttendancePayload) -> Result<SubmissionReceipt, SubmissionError> {
        self.payloads
            .lock()
            .expect("payload mutex poisoned")
            .push(payload.clone());
        self.result.clone()
    }
}

#[derive(Default)]
pub(super) struct RecordingDelay {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub(super) fn waits(&self) -> Vec<Duration> {
        self.waits.lock().expect("delay mutex poisoned").clone()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn wait(&self, duration: Duration) {
        self.waits
            .lock()
            .expect("delay mutex poisoned")
            .push(duration);
    }
}

pub(super) struct FixedClock(pub(super) NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub(super) fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .and_then(|date| date.and_hms_opt(9, 15, 0))
        .expect("valid timestamp")
}

pub(super) struct Harness {
    pub(super) orchestrator: AttendanceOrchestrator,
    pub(super) api: Arc<RecordingApi>,
    pub(super) delay: Arc<RecordingDelay>,
}

pub(super) fn harness(
    location: Arc<dyn LocationSource>,
    api: Arc<RecordingApi>,
    policy: AttendancePolicy,
) -> Harness {
    let delay = Arc::new(RecordingDelay::default());
    let orchestrator = AttendanceOrchestrator::new(
        session(),
        location,
        api.clone(),
        delay.clone(),
        Arc::new(FixedClock(morning())),
        policy,
    )
    .expect("valid policy");

    Harness {
        orchestrator,
        api,
        delay,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
