use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::Coordinate;
use super::platform::{GeolocationProvider, PlatformInfo, PositionError, PositionRequest};
use super::profile::DeviceLocationProfile;

/// Network positioning that works on every Android generation.
pub const NETWORK_ONLY_REQUEST: PositionRequest = PositionRequest::new(false, 30_000, 600_000);
/// Accepts almost any last-known fix.
pub const MAXIMUM_TOLERANCE_REQUEST: PositionRequest =
    PositionRequest::new(false, 60_000, 86_400_000);

/// Acquisition strategies in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationStrategy {
    VersionOptimized,
    NetworkOnly,
    MaximumTolerance,
}

impl LocationStrategy {
    pub const fn ordered() -> [Self; 3] {
        [
            Self::VersionOptimized,
            Self::NetworkOnly,
            Self::MaximumTolerance,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VersionOptimized => "version-optimized",
            Self::NetworkOnly => "network-only",
            Self::MaximumTolerance => "maximum-tolerance",
        }
    }

    pub const fn request(self, profile: &DeviceLocationProfile) -> PositionRequest {
        match self {
            Self::VersionOptimized => profile.request(),
            Self::NetworkOnly => NETWORK_ONLY_REQUEST,
            Self::MaximumTolerance => MAXIMUM_TOLERANCE_REQUEST,
        }
    }
}

/// Tries each [`LocationStrategy`] strictly in sequence and returns the first fix.
pub struct MultiStrategyAcquirer {
    info: PlatformInfo,
    geolocation: Arc<dyn GeolocationProvider>,
}

impl MultiStrategyAcquirer {
    pub fn new(info: PlatformInfo, geolocation: Arc<dyn GeolocationProvider>) -> Self {
        Self { info, geolocation }
    }

    /// `None` once all strategies are exhausted; individual failures are only logged.
    pub async fn acquire_location(&self) -> Option<Coordinate> {
        let profile = DeviceLocationProfile::for_platform(self.info);
        info!(
            device = %self.info.device_name(),
            tier = profile.platform_version_class.label(),
            "acquiring location"
        );

        for strategy in LocationStrategy::ordered() {
            match self.attempt(strategy, &profile).await {
                Ok(coordinate) => {
                    info!(strategy = strategy.label(), %coordinate, "location acquired");
                    return Some(coordinate);
                }
                Err(err) => {
                    warn!(strategy = strategy.label(), error = %err, "location strategy failed");
                }
            }
        }

        warn!("all location strategies failed");
        None
    }

    /// One bounded request. The provider receives the timeout too, but the bound here holds
    /// even when the native side never answers; the abandoned request is simply dropped.
    pub async fn attempt(
        &self,
        strategy: LocationStrategy,
        profile: &DeviceLocationProfile,
    ) -> Result<Coordinate, PositionError> {
        let request = strategy.request(profile);
        debug!(strategy = strategy.label(), ?request, "requesting position");

        let fix = tokio::time::timeout(request.timeout, self.geolocation.current_position(request))
            .await
            .map_err(|_| PositionError::Timeout(request.timeout))??;

        if !fix.coordinate.is_valid() {
            return Err(PositionError::Unavailable(format!(
                "provider returned an invalid coordinate ({})",
                fix.coordinate
            )));
        }

        if let Some(accuracy) = fix.accuracy_meters {
            debug!(strategy = strategy.label(), accuracy_meters = accuracy, "fix accuracy");
        }
        Ok(fix.coordinate)
    }
}
