use std::sync::Arc;

use tracing::{info, warn};

use super::platform::{
    PermissionPlatform, PermissionStatus, PlatformInfo, PlatformKind, LOCATION_RATIONALE,
};
use super::profile::RUNTIME_PERMISSION_API_LEVEL;

/// Requests location permission in the way the running OS generation expects.
pub struct PermissionNegotiator {
    info: PlatformInfo,
    permissions: Arc<dyn PermissionPlatform>,
}

impl PermissionNegotiator {
    pub fn new(info: PlatformInfo, permissions: Arc<dyn PermissionPlatform>) -> Self {
        Self { info, permissions }
    }

    /// Never fails: bridge errors are logged and read as "not granted".
    pub async fn request_location_permission(&self) -> bool {
        if self.skips_runtime_request() {
            info!(
                platform_version = self.info.version,
                "no runtime location permission request on this platform"
            );
            return true;
        }

        match self
            .permissions
            .request_location_permission(&LOCATION_RATIONALE)
            .await
        {
            Ok(status) => {
                let granted = status == PermissionStatus::Granted;
                info!(
                    ?status,
                    device = %self.info.device_name(),
                    "location permission {}",
                    if granted { "granted" } else { "denied" }
                );
                granted
            }
            Err(err) => {
                warn!(error = %err, "location permission request failed");
                false
            }
        }
    }

    // pre-6.0 Android grants at install time; iOS prompts from the geolocation call itself
    fn skips_runtime_request(&self) -> bool {
        match self.info.kind {
            PlatformKind::Android => self.info.version < RUNTIME_PERMISSION_API_LEVEL,
            PlatformKind::Ios => true,
        }
    }
}
