//! Device position with a cached last fix and a fixed fallback coordinate.
//!
//! The host supplies a [`PositionSource`]; `Geolocator` adds the timeout,
//! the `user_location` cache and the fallback. A failed reading never
//! surfaces as an error, but the returned [`LocationFix`] says where the
//! coordinate came from so callers can tell a fallback from a real reading.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::session::Session;
use crate::storage::KEY_USER_LOCATION;
use crate::types::UserLocation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("Timed out waiting for the device position")]
    Timeout,

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

/// Device positioning API provided by the host platform.
#[async_trait]
pub trait PositionSource: Send + Sync + 'static {
    async fn current_position(&self, options: PositionOptions) -> Result<UserLocation, GeoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationOrigin {
    Device,
    Cache,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub location: UserLocation,
    pub origin: LocationOrigin,
}

impl LocationFix {
    pub fn is_fallback(&self) -> bool {
        self.origin == LocationOrigin::Fallback
    }
}

#[derive(Debug, Default)]
struct GeoState {
    current: Option<LocationFix>,
    loading: bool,
    error: Option<String>,
}

pub struct Geolocator {
    source: Arc<dyn PositionSource>,
    session: Arc<Session>,
    timeout: Duration,
    fallback: UserLocation,
    state: Mutex<GeoState>,
}

impl Geolocator {
    pub fn new(source: Arc<dyn PositionSource>, session: Arc<Session>, config: &ClientConfig) -> Self {
        Self {
            source,
            session,
            timeout: config.geolocation_timeout,
            fallback: config.fallback_location,
            state: Mutex::new(GeoState::default()),
        }
    }

    pub fn current(&self) -> Option<UserLocation> {
        self.state.lock().current.map(|fix| fix.location)
    }

    pub fn has_location(&self) -> bool {
        self.state.lock().current.is_some()
    }

    /// `"lat, long"`, or empty when there is no location yet.
    pub fn location_string(&self) -> String {
        self.state
            .lock()
            .current
            .map(|fix| format!("{}, {}", fix.location.latitude, fix.location.longitude))
            .unwrap_or_default()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Message of the last failed reading, cleared by the next attempt.
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Ask the device for a fresh position.
    ///
    /// Successful readings are cached. Any failure, including the timeout,
    /// yields the fallback coordinate.
    pub async fn current_position(&self) -> LocationFix {
        {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
        }

        let options = PositionOptions {
            high_accuracy: true,
            timeout: self.timeout,
        };
        let reading = match tokio::time::timeout(self.timeout, self.source.current_position(options)).await {
            Ok(result) => result,
            Err(_) => Err(GeoError::Timeout),
        };

        let fix = match reading {
            Ok(location) => {
                tracing::info!(
                    latitude = location.latitude,
                    longitude = location.longitude,
                    "device position acquired"
                );
                self.save_to_cache(location);
                LocationFix {
                    location,
                    origin: LocationOrigin::Device,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "device position failed, using fallback");
                self.state.lock().error = Some(err.to_string());
                LocationFix {
                    location: self.fallback,
                    origin: LocationOrigin::Fallback,
                }
            }
        };

        let mut state = self.state.lock();
        state.current = Some(fix);
        state.loading = false;
        fix
    }

    /// Persist `location` under `user_location`. Failures are logged.
    pub fn save_to_cache(&self, location: UserLocation) {
        let raw = match serde_json::to_string(&location) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode location");
                return;
            }
        };
        if let Err(e) = self.session.store().set(KEY_USER_LOCATION, &raw) {
            tracing::warn!(error = %e, "failed to cache location");
        }
    }

    /// Load the cached location into the current one.
    pub fn load_from_cache(&self) -> Option<UserLocation> {
        let raw = match self.session.store().get(KEY_USER_LOCATION) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read cached location");
                return None;
            }
        };
        let location: UserLocation = serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(error = %e, "cached location is not valid JSON"))
            .ok()?;
        self.state.lock().current = Some(LocationFix {
            location,
            origin: LocationOrigin::Cache,
        });
        Some(location)
    }

    /// Cache-first lookup; `force_refresh` always asks the device.
    ///
    /// A remembered fallback keeps its `Fallback` origin.
    pub async fn location(&self, force_refresh: bool) -> LocationFix {
        if !force_refresh {
            let remembered = self.state.lock().current;
            if let Some(fix) = remembered {
                return match fix.origin {
                    LocationOrigin::Fallback => fix,
                    _ => LocationFix {
                        origin: LocationOrigin::Cache,
                        ..fix
                    },
                };
            }
            if let Some(location) = self.load_from_cache() {
                return LocationFix {
                    location,
                    origin: LocationOrigin::Cache,
                };
            }
        }
        self.current_position().await
    }

    pub fn clear(&self) {
        if let Err(e) = self.session.store().remove(KEY_USER_LOCATION) {
            tracing::warn!(error = %e, "failed to clear cached location");
        }
        self.state.lock().current = None;
    }

    pub fn initialize(&self) {
        self.load_from_cache();
    }
}
