use crate::types::query::LatLon;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvalidRangeError {
    #[error("Date '{value}' for {field} is not a valid YYYY-MM-DD date")]
    Unparseable {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Start date {from} is after end date {to}")]
    Inverted { from: NaiveDate, to: NaiveDate },
}

#[derive(Debug, Error)]
pub enum BackendError {
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

    #[error("Unexpected response shape from {url}: {message}")]
    UnexpectedShape { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),

    #[error("Coordinates {0:?} are out of range")]
    InvalidCoordinates(LatLon),
}
