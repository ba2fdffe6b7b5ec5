use serde::Serialize;

use super::platform::{PlatformInfo, PlatformKind, PositionRequest};

/// Oldest API level with runtime permissions (Android 6.0).
pub const RUNTIME_PERMISSION_API_LEVEL: u32 = 23;
/// First API level treated as a modern device (Android 10).
pub const MODERN_API_LEVEL: u32 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformVersionClass {
    PreModern,
    Transitional,
    Modern,
}

impl PlatformVersionClass {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PreModern => "pre-modern",
            Self::Transitional => "transitional",
            Self::Modern => "modern",
        }
    }
}

/// Acquisition parameters for one device generation. Derived per call, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceLocationProfile {
    pub platform_version_class: PlatformVersionClass,
    pub accuracy_preference: bool,
    pub timeout_ms: u64,
    pub max_cache_age_ms: u64,
}

/// Pure mapping from Android API level to acquisition parameters.
pub fn classify_platform(version: u32) -> DeviceLocationProfile {
    let class = if version < RUNTIME_PERMISSION_API_LEVEL {
        PlatformVersionClass::PreModern
    } else if version < MODERN_API_LEVEL {
        PlatformVersionClass::Transitional
    } else {
        PlatformVersionClass::Modern
    };
    DeviceLocationProfile::for_class(class)
}

impl DeviceLocationProfile {
    pub const fn for_class(class: PlatformVersionClass) -> Self {
        match class {
            // legacy chipsets are slow to lock; lean on network positioning
            PlatformVersionClass::PreModern => Self {
                platform_version_class: class,
                accuracy_preference: false,
                timeout_ms: 60_000,
                max_cache_age_ms: 900_000,
            },
            PlatformVersionClass::Transitional => Self {
                platform_version_class: class,
                accuracy_preference: true,
                timeout_ms: 35_000,
                max_cache_age_ms: 300_000,
            },
            PlatformVersionClass::Modern => Self {
                platform_version_class: class,
                accuracy_preference: true,
                timeout_ms: 25_000,
                max_cache_age_ms: 180_000,
            },
        }
    }

    /// iOS has no API-level tiers; it is always handled as a modern device.
    pub fn for_platform(info: PlatformInfo) -> Self {
        match info.kind {
            PlatformKind::Android => classify_platform(info.version),
            PlatformKind::Ios => Self::for_class(PlatformVersionClass::Modern),
        }
    }

    pub const fn request(&self) -> PositionRequest {
        PositionRequest::new(
            self.accuracy_preference,
            self.timeout_ms,
            self.max_cache_age_ms,
        )
    }

    /// Remediation text for the "location services disabled" alert.
    pub const fn services_disabled_message(&self) -> &'static str {
        match self.platform_version_class {
            PlatformVersionClass::PreModern => {
                "Go to Settings > Location and enable location services."
            }
            PlatformVersionClass::Transitional => {
                "Please enable location services to mark attendance."
            }
            PlatformVersionClass::Modern => {
                "Swipe down and enable Location, or go to Settings > Location."
            }
        }
    }

    /// Guidance shown once every acquisition strategy has failed.
    pub const fn unavailable_guidance(&self) -> &'static str {
        match self.platform_version_class {
            PlatformVersionClass::PreModern => {
                "For older Android devices:\n• Enable GPS in Settings\n• Wait 1-2 minutes for GPS lock\n• Try in open area\n• Restart location services"
            }
            PlatformVersionClass::Transitional => {
                "For Android 6.0-9.0:\n• Allow location permission\n• Enable high accuracy mode\n• Check internet connection\n• Try outdoor for better GPS"
            }
            PlatformVersionClass::Modern => {
                "For modern Android:\n• Allow precise location\n• Disable battery optimization\n• Enable all location services"
            }
        }
    }
}

/// Marketing name for an Android API level.
pub fn platform_version_name(version: u32) -> String {
    let name = match version {
        34 => "Android 14",
        33 => "Android 13",
        32 => "Android 12L",
        31 => "Android 12",
        30 => "Android 11",
        29 => "Android 10",
        28 => "Android 9 Pie",
        27 => "Android 8.1",
        26 => "Android 8.0",
        25 => "Android 7.1",
        24 => "Android 7.0",
        23 => "Android 6.0",
        22 => "Android 5.1",
        21 => "Android 5.0",
        20 => "Android 4.4W",
        19 => "Android 4.4",
        18 => "Android 4.3",
        17 => "Android 4.2",
        16 => "Android 4.1",
        other => return format!("Android {other}"),
    };
    name.to_string()
}
