use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::attendance::geofence::is_valid_radius;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub attendance: AttendanceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            attendance: AttendanceConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

pub const DEFAULT_API_URL: &str = "https://performyx.fitbuddy.in/app_api";
const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Check-in behavior: remote endpoint, geofence radius and location retry policy.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceConfig {
    pub api_base_url: String,
    pub radius_meters: f64,
    pub location_retries: u32,
    pub retry_delay: Duration,
    pub require_biometric: bool,
    pub http_timeout: Duration,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            radius_meters: 100.0,
            location_retries: 2,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            require_biometric: false,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl AttendanceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base_url = env::var("ATTENDANCE_API_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.api_base_url);

        let radius_meters = match env::var("ATTENDANCE_RADIUS_METERS") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|radius| is_valid_radius(*radius))
                .ok_or(ConfigError::InvalidValue {
                    key: "ATTENDANCE_RADIUS_METERS",
                    value: raw,
                })?,
            Err(_) => defaults.radius_meters,
        };

        let location_retries = parse_or("ATTENDANCE_LOCATION_RETRIES", defaults.location_retries)?;
        let retry_delay = Duration::from_millis(parse_or(
            "ATTENDANCE_RETRY_DELAY_MS",
            DEFAULT_RETRY_DELAY_MS,
        )?);
        let http_timeout = match parse_or("ATTENDANCE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)? {
            0 => {
                return Err(ConfigError::InvalidValue {
                    key: "ATTENDANCE_HTTP_TIMEOUT_SECS",
                    value: "0".to_string(),
                })
            }
            secs => Duration::from_secs(secs),
        };

        let require_biometric = match env::var("ATTENDANCE_REQUIRE_BIOMETRIC") {
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "ATTENDANCE_REQUIRE_BIOMETRIC",
                        value: raw,
                    })
                }
            },
            Err(_) => defaults.require_biometric,
        };

        Ok(Self {
            api_base_url,
            radius_meters,
            location_retries,
            retry_delay,
            require_biometric,
            http_timeout,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
