use crate::types::query::LatLon;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocoderError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}: {body}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Response from {0} is not valid JSON")]
    MalformedBody(String, #[source] serde_json::Error),

    #[error("Geocoder returned a non-numeric coordinate '{0}'")]
    InvalidNumber(String),
}

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location '{0}' could not be found")]
    NotFound(String),

    #[error("Geocoding service failed for '{location}'")]
    Service {
        location: String,
        #[source]
        source: GeocoderError,
    },

    #[error("Geocoder returned out-of-range coordinates {coordinates:?} for '{location}'")]
    InvalidCoordinates {
        location: String,
        coordinates: LatLon,
    },
}
