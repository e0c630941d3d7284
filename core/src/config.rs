//! Client configuration.
//!
//! Resolved once at startup and passed into services and stores, so nothing
//! below this module reads the process environment.

use std::time::Duration;

use crate::types::UserLocation;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SEARCH_RADIUS_KM: u32 = 30;
pub const MAX_SEARCH_RADIUS_KM: u32 = 100;

/// Coordinate reported when the device position cannot be acquired.
pub const FALLBACK_LOCATION: UserLocation = UserLocation {
    latitude: 10.630481337192835,
    longitude: -85.44473882979119,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub geolocation_timeout: Duration,
    pub fallback_location: UserLocation,
    pub default_search_radius_km: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            geolocation_timeout: DEFAULT_GEOLOCATION_TIMEOUT,
            fallback_location: FALLBACK_LOCATION,
            default_search_radius_km: DEFAULT_SEARCH_RADIUS_KM,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Read `API_BASE_URL`, `GEOLOCATION_TIMEOUT_MS` and
    /// `DEFAULT_SEARCH_RADIUS_KM`, keeping defaults for anything unset or
    /// unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("API_BASE_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = url;
        }
        if let Some(ms) = lookup("GEOLOCATION_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
            config.geolocation_timeout = Duration::from_millis(ms);
        }
        match lookup("DEFAULT_SEARCH_RADIUS_KM").map(|v| v.parse::<u32>()) {
            Some(Ok(km)) if (1..=MAX_SEARCH_RADIUS_KM).contains(&km) => {
                config.default_search_radius_km = km;
            }
            Some(_) => tracing::warn!("ignoring invalid DEFAULT_SEARCH_RADIUS_KM"),
            None => {}
        }
        config
    }
}
