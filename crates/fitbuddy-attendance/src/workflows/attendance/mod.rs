//! Geofenced attendance check-in.
//!
//! The pipeline runs permission negotiation, a location-services probe, and a three-step
//! acquisition cascade on the device, checks the fix against the employee's branches with the
//! haversine distance, and only then submits to the remote attendance API. Device capabilities
//! are reached through the traits in [`platform`] so the flow can run against fakes.

pub mod acquisition;
pub mod availability;
pub mod biometric;
pub mod branches;
pub mod domain;
pub mod geofence;
pub mod location;
pub mod orchestrator;
pub mod permission;
pub mod platform;
pub mod profile;
pub mod router;
pub mod submission;

#[cfg(test)]
mod tests;

pub use acquisition::{
    LocationStrategy, MultiStrategyAcquirer, MAXIMUM_TOLERANCE_REQUEST, NETWORK_ONLY_REQUEST,
};
pub use availability::{AvailabilityProber, PROBE_REQUEST};
pub use biometric::{
    BiometricAuthenticator, BiometricOutcome, BiometricPrompt, BiometricSensor, BiometricService,
};
pub use branches::{BranchImportError, BranchRoster};
pub use domain::{
    AcquisitionOutcome, BranchId, BranchLocation, Coordinate, EmployeeSession, GeofenceError,
    GeofenceResult, PunchType, RawBranch,
};
pub use geofence::{
    distance_meters, is_valid_radius, is_within_radius, GeofenceEvaluator, DEFAULT_RADIUS_METERS,
    EARTH_RADIUS_METERS,
};
pub use location::{LocationService, LocationSource};
pub use orchestrator::{
    AttendanceOrchestrator, AttendancePolicy, AttendanceReport, AttendanceState, BlockReason,
    Delay, TokioDelay,
};
pub use permission::PermissionNegotiator;
pub use platform::{
    DeviceBridge, GeolocationProvider, PermissionPlatform, PermissionStatus, PlatformError,
    PlatformInfo, PlatformKind, PositionError, PositionFix, PositionRequest, Prompt,
    PromptChoice, SettingsLauncher, UserPrompter,
};
pub use profile::{
    classify_platform, platform_version_name, DeviceLocationProfile, PlatformVersionClass,
};
pub use router::{geofence_router, geofence_router_with_defaults, GeofenceDefaults};
pub use submission::{
    AttendanceApi, AttendancePayload, AttendanceResponse, Clock, HttpAttendanceApi,
    SubmissionError, SubmissionReceipt, SystemClock,
};
