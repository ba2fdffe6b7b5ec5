use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::acquisition::MultiStrategyAcquirer;
use super::availability::AvailabilityProber;
use super::domain::AcquisitionOutcome;
use super::permission::PermissionNegotiator;
use super::platform::{DeviceBridge, Prompt, PromptChoice, UserPrompter};
use super::profile::DeviceLocationProfile;

/// Anything able to produce a fresh fix for one check-in attempt.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn locate(&self) -> AcquisitionOutcome;
}

/// Full device routine: permission, service probe, then the strategy cascade.
pub struct LocationService {
    bridge: DeviceBridge,
    negotiator: PermissionNegotiator,
    prober: AvailabilityProber,
    acquirer: MultiStrategyAcquirer,
}

impl LocationService {
    pub fn new(bridge: DeviceBridge) -> Self {
        let negotiator = PermissionNegotiator::new(bridge.info, bridge.permissions.clone());
        let prober = AvailabilityProber::new(
            bridge.info,
            bridge.geolocation.clone(),
            bridge.prompts.clone(),
            bridge.settings.clone(),
        );
        let acquirer = MultiStrategyAcquirer::new(bridge.info, bridge.geolocation.clone());

        Self {
            bridge,
            negotiator,
            prober,
            acquirer,
        }
    }

    pub fn bridge(&self) -> &DeviceBridge {
        &self.bridge
    }

    fn prompts(&self) -> &dyn UserPrompter {
        self.bridge.prompts.as_ref()
    }
}

#[async_trait]
impl LocationSource for LocationService {
    async fn locate(&self) -> AcquisitionOutcome {
        let device = self.bridge.info.device_name();
        info!(%device, "starting location fetch");

        if !self.negotiator.request_location_permission().await {
            self.prompts()
                .present(Prompt::new(
                    "Location Permission Required",
                    "Please allow location access to mark attendance.",
                    &[PromptChoice::Acknowledge],
                ))
                .await;
            return AcquisitionOutcome::PermissionDenied;
        }

        if !self.prober.check_location_services_enabled().await {
            return AcquisitionOutcome::ServiceDisabled;
        }

        if let Some(coordinate) = self.acquirer.acquire_location().await {
            return AcquisitionOutcome::Success(coordinate);
        }

        let reason = format!("could not get location on {device}");
        warn!(%reason, "location unavailable");
        let profile = DeviceLocationProfile::for_platform(self.bridge.info);
        let choice = self
            .prompts()
            .present(Prompt::new(
                "Location Unavailable",
                profile.unavailable_guidance(),
                &[PromptChoice::TryAgain, PromptChoice::Cancel],
            ))
            .await;

        if choice == PromptChoice::TryAgain {
            AcquisitionOutcome::Unavailable(reason)
        } else {
            info!(choice = choice.label(), "employee gave up on location");
            AcquisitionOutcome::Abandoned(reason)
        }
    }
}
