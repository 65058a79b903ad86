//! Forward geocoding through OpenStreetMap's Nominatim search API.

use crate::config::GeocoderSettings;
use crate::location::error::GeocoderError;
use crate::location::resolver::Geocoder;
use crate::types::query::LatLon;
use crate::utils::truncate_body;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "openmeteo_chatbot";

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    search_url: String,
}

impl NominatimGeocoder {
    pub fn new(settings: &GeocoderSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self::with_client(client, &settings.base_url))
    }

    /// Uses a preconfigured client; `base_url` is the service root without `/search`.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            search_url: format!("{}/search", base_url.trim_end_matches('/')),
        }
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, GeocoderError> {
    raw.trim()
        .parse()
        .map_err(|_| GeocoderError::InvalidNumber(raw.to_string()))
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, name: &str) -> Result<Option<LatLon>, GeocoderError> {
        let url = &self.search_url;
        let response = self
            .client
            .get(url)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocoderError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeocoderError::NetworkRequest(url.clone(), e))?;

        if !status.is_success() {
            warn!("HTTP error for {}: {}", url, status);
            return Err(GeocoderError::HttpStatus {
                url: url.clone(),
                status,
                body: truncate_body(&body),
            });
        }

        let hits: Vec<SearchHit> = serde_json::from_str(&body)
            .map_err(|e| GeocoderError::MalformedBody(url.clone(), e))?;

        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };
        debug!(
            "Geocoded '{}' to {} ({}, {})",
            name,
            hit.display_name.as_deref().unwrap_or("?"),
            hit.lat,
            hit.lon
        );
        Ok(Some(LatLon(
            parse_coordinate(&hit.lat)?,
            parse_coordinate(&hit.lon)?,
        )))
    }
}
