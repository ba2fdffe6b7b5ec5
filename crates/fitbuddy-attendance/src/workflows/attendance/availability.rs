use std::sync::Arc;

use tracing::{info, warn};

use super::platform::{
    GeolocationProvider, PlatformInfo, PlatformKind, PositionError, PositionRequest, Prompt,
    PromptChoice, SettingsLauncher, UserPrompter,
};
use super::profile::DeviceLocationProfile;

/// Throwaway request used only to detect whether location services are on.
pub const PROBE_REQUEST: PositionRequest = PositionRequest::new(false, 10_000, 600_000);

/// Detects disabled device location services and offers a path to the settings screen.
pub struct AvailabilityProber {
    info: PlatformInfo,
    geolocation: Arc<dyn GeolocationProvider>,
    prompts: Arc<dyn UserPrompter>,
    settings: Arc<dyn SettingsLauncher>,
}

impl AvailabilityProber {
    pub fn new(
        info: PlatformInfo,
        geolocation: Arc<dyn GeolocationProvider>,
        prompts: Arc<dyn UserPrompter>,
        settings: Arc<dyn SettingsLauncher>,
    ) -> Self {
        Self {
            info,
            geolocation,
            prompts,
            settings,
        }
    }

    /// `false` on every probe failure, including a provider that never answers within the
    /// probe timeout. The remediation prompt only appears when the provider reports itself
    /// disabled, and opening settings does not re-probe.
    pub async fn check_location_services_enabled(&self) -> bool {
        if self.info.kind != PlatformKind::Android {
            return true;
        }

        let probe = tokio::time::timeout(
            PROBE_REQUEST.timeout,
            self.geolocation.current_position(PROBE_REQUEST),
        )
        .await
        .map_err(|_| PositionError::Timeout(PROBE_REQUEST.timeout))
        .and_then(|result| result);

        let error = match probe {
            Ok(_) => {
                info!("location services are enabled");
                return true;
            }
            Err(error) => error,
        };

        warn!(error = %error, "location services probe failed");
        if error == PositionError::ProviderDisabled {
            self.offer_remediation().await;
        }
        false
    }

    async fn offer_remediation(&self) {
        let profile = DeviceLocationProfile::for_platform(self.info);
        let prompt = Prompt::new(
            "Location Services Required",
            profile.services_disabled_message(),
            &[PromptChoice::Cancel, PromptChoice::OpenSettings],
        );

        if self.prompts.present(prompt).await == PromptChoice::OpenSettings {
            if let Err(err) = self.settings.open_location_settings().await {
                warn!(error = %err, "unable to open location settings");
            }
        }
    }
}
