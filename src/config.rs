use std::env;
use std::time::Duration;

use crate::error::ConfigError;
use crate::geo::OperatingRegion;

#[derive(Debug, Clone)]
pub struct Config {
    pub geocoder_base_url: String,
    /// Client-identifying header the provider's usage policy requires.
    pub geocoder_user_agent: String,
    /// Minimum spacing between outbound provider requests. The 1000 ms
    /// default is the provider's usage policy, not a tuning knob.
    pub geocoder_min_interval_ms: u64,
    /// Upper bound on every outbound call.
    pub request_timeout_secs: u64,
    pub tracking_interval_ms: u64,
    pub region: OperatingRegion,
    /// Fee/ETA/zone-name triple returned when no delivery zones exist.
    pub default_fee: i64,
    pub default_eta_minutes: u32,
    pub default_zone_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            geocoder_base_url: env::var("GEOCODER_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            geocoder_user_agent: env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| "delivery-geo-core/0.1".to_string()),
            geocoder_min_interval_ms: parse_or_default("GEOCODER_MIN_INTERVAL_MS", 1000)?,
            request_timeout_secs: parse_or_default("REQUEST_TIMEOUT_SECS", 8)?,
            tracking_interval_ms: parse_or_default("TRACKING_INTERVAL_MS", 15_000)?,
            region: OperatingRegion {
                min_lng: parse_or_default("REGION_MIN_LNG", -3.9)?,
                min_lat: parse_or_default("REGION_MIN_LAT", 5.0)?,
                max_lng: parse_or_default("REGION_MAX_LNG", -3.5)?,
                max_lat: parse_or_default("REGION_MAX_LAT", 5.4)?,
            },
            default_fee: parse_or_default("DEFAULT_DELIVERY_FEE", 1000)?,
            default_eta_minutes: parse_or_default("DEFAULT_ETA_MINUTES", 25)?,
            default_zone_name: env::var("DEFAULT_ZONE_NAME")
                .unwrap_or_else(|_| "Zone standard".to_string()),
        })
    }

    pub fn geocoder_min_interval(&self) -> Duration {
        Duration::from_millis(self.geocoder_min_interval_ms)
    }

    pub fn tracking_interval(&self) -> Duration {
        Duration::from_millis(self.tracking_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoder_base_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_user_agent: "delivery-geo-core/0.1".to_string(),
            geocoder_min_interval_ms: 1000,
            request_timeout_secs: 8,
            tracking_interval_ms: 15_000,
            region: OperatingRegion {
                min_lng: -3.9,
                min_lat: 5.0,
                max_lng: -3.5,
                max_lat: 5.4,
            },
            default_fee: 1000,
            default_eta_minutes: 25,
            default_zone_name: "Zone standard".to_string(),
        }
    }
}

fn parse_or_default<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|err| ConfigError::Invalid {
            key,
            message: err.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
