//! Place-name to coordinate resolution.

use crate::location::error::{GeocoderError, LocationError};
use crate::types::call_counter::{CallCounter, CallKind};
use crate::types::query::LatLon;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

/// Looks up coordinates for a free-text place name.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the service has no match for `name`.
    async fn geocode(&self, name: &str) -> Result<Option<LatLon>, GeocoderError>;
}

/// Wraps a [`Geocoder`] with validation and call counting.
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
    counter: CallCounter,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, counter: CallCounter) -> Self {
        Self { geocoder, counter }
    }

    /// Resolves `name` to range-checked coordinates.
    ///
    /// # Errors
    ///
    /// * [`LocationError::NotFound`] if the geocoder has no match.
    /// * [`LocationError::Service`] if the geocoder call itself fails.
    /// * [`LocationError::InvalidCoordinates`] if the match lies outside
    ///   [-90, 90] × [-180, 180].
    pub async fn resolve(&self, name: &str) -> Result<LatLon, LocationError> {
        let calls = self.counter.increment(CallKind::Geocoding);
        info!("Geocoding '{}' (call #{})", name, calls);

        let found = self
            .geocoder
            .geocode(name)
            .await
            .map_err(|source| {
                warn!("Geocoding '{}' failed: {}", name, source);
                LocationError::Service {
                    location: name.to_string(),
                    source,
                }
            })?
            .ok_or_else(|| LocationError::NotFound(name.to_string()))?;

        if !found.is_valid() {
            return Err(LocationError::InvalidCoordinates {
                location: name.to_string(),
                coordinates: found,
            });
        }
        info!("Resolved '{}' to ({}, {})", name, found.0, found.1);
        Ok(found)
    }
}
