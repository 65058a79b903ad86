//! The combined archive + forecast result handed back to callers.

use crate::types::time_series::WeatherPayload;
use crate::weather_data::params::ParamSet;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fmt::Write as _;

/// Which backend endpoint a sub-fetch went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiSource {
    /// Historical endpoint, serves dates strictly before today.
    Archive,
    /// Forecast endpoint, serves today and later.
    Forecast,
}

impl ApiSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiSource::Archive => "archive",
            ApiSource::Forecast => "forecast",
        }
    }
}

impl fmt::Display for ApiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed sub-fetch, with enough context to retry it by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub source_api: ApiSource,
    pub message: String,
    pub params: ParamSet,
}

/// Describes what was asked for and what actually came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDetails {
    pub latitude: f64,
    pub longitude: f64,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub requested_granularity_minutes: u32,
    /// Comma-separated tiers present in the returned payloads, e.g. `"daily, hourly"`.
    pub fetched_resolution: String,
    pub request_time_utc: DateTime<Utc>,
    /// Non-fatal degradations (tier fallbacks, missing tiers) noticed along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

/// Combined, optionally partial, weather data for one query.
///
/// `past` and `forecast` are `None` when the corresponding sub-range was not needed
/// or its fetch failed; failures are listed in `errors`. A result with both halves
/// absent is still a valid result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub query_details: QueryDetails,
    pub past: Option<WeatherPayload>,
    pub forecast: Option<WeatherPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ApiError>>,
}

impl FetchResult {
    /// `true` when neither half carries data.
    pub fn is_empty(&self) -> bool {
        self.past.is_none() && self.forecast.is_none()
    }

    pub fn errors(&self) -> &[ApiError] {
        self.errors.as_deref().unwrap_or_default()
    }

    pub(crate) fn push_error(&mut self, error: ApiError) {
        self.errors.get_or_insert_with(Vec::new).push(error);
    }

    pub(crate) fn push_notice(&mut self, notice: impl Into<String>) {
        self.query_details.notices.push(notice.into());
    }

    /// Short human-readable digest: solar summary of the first forecast day, the
    /// first few forecast hours and a count of failed sub-fetches.
    pub fn summary(&self) -> String {
        let mut out = String::new();

        if let Some(daily) = self.forecast.as_ref().and_then(|f| f.daily.as_ref()) {
            if let Some(day) = daily.time.first() {
                let _ = writeln!(out, "Forecast for {day}:");
                let first = |name: &str| daily.values(name).and_then(|v| v.first()).cloned();
                if let Some(Value::String(sunrise)) = first("sunrise") {
                    let _ = writeln!(out, "  Sunrise: {sunrise}");
                }
                if let Some(Value::String(sunset)) = first("sunset") {
                    let _ = writeln!(out, "  Sunset: {sunset}");
                }
                if let Some(uv) = first("uv_index_max").filter(|v| !v.is_null()) {
                    let _ = writeln!(out, "  Max UV Index: {uv}");
                }
                if let Some(seconds) = first("daylight_duration").and_then(|v| v.as_f64()) {
                    let total = seconds as u64;
                    let _ = writeln!(
                        out,
                        "  Daylight Duration: {}h {}m",
                        total / 3600,
                        (total % 3600) / 60
                    );
                }
            }
        }

        if let Some(hourly) = self.forecast.as_ref().and_then(|f| f.hourly.as_ref()) {
            if !hourly.is_empty() {
                let _ = writeln!(out, "Forecast hourly data:");
                let temperatures = hourly.values("temperature_2m");
                for (i, time) in hourly.time.iter().take(3).enumerate() {
                    let temp = temperatures
                        .and_then(|t| t.get(i))
                        .filter(|v| !v.is_null())
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "n/a".to_string());
                    let _ = writeln!(out, "  - {time}: Temp: {temp}");
                }
            }
        }

        if self.past.is_some() {
            let _ = writeln!(out, "Past data available.");
        }

        if !self.errors().is_empty() {
            let _ = writeln!(out, "API errors encountered: {}", self.errors().len());
        }

        out
    }
}
