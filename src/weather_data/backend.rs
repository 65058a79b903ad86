//! HTTP access to the weather provider.

use crate::utils::truncate_body;
use crate::weather_data::error::BackendError;
use crate::weather_data::params::ParamSet;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(45);

/// Issues a GET with query parameters and returns the decoded JSON body.
#[async_trait]
pub trait WeatherBackend: Send + Sync {
    async fn get_json(&self, url: &str, params: &ParamSet) -> Result<Value, BackendError>;
}

/// [`WeatherBackend`] over Open-Meteo's REST endpoints.
#[derive(Debug, Clone)]
pub struct OpenMeteoBackend {
    client: Client,
}

impl OpenMeteoBackend {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WeatherBackend for OpenMeteoBackend {
    async fn get_json(&self, url: &str, params: &ParamSet) -> Result<Value, BackendError> {
        debug!("GET {} with {} params", url, params.iter().count());

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| BackendError::NetworkRequest(url.to_string(), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::NetworkRequest(url.to_string(), e))?;

        if !status.is_success() {
            warn!("HTTP error for {}: {}", url, status);
            return Err(BackendError::HttpStatus {
                url: url.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| BackendError::MalformedBody(url.to_string(), e))
    }
}
