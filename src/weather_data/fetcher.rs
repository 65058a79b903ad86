//! Splits a date range at "today" into archive and forecast requests and merges the
//! two responses into one [`FetchResult`].

use crate::types::call_counter::{CallCounter, CallKind};
use crate::types::fetch_result::{ApiError, ApiSource, FetchResult, QueryDetails};
use crate::types::query::LatLon;
use crate::types::time_series::WeatherPayload;
use crate::utils::parse_date;
use crate::weather_data::backend::{WeatherBackend, DEFAULT_ARCHIVE_URL, DEFAULT_FORECAST_URL};
use crate::weather_data::error::{BackendError, FetchError, InvalidRangeError};
use crate::weather_data::params::{build_forecast_params, build_past_params, ParamSet};
use bon::bon;
use chrono::{Local, NaiveDate, Utc};
use log::{info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::sync::Arc;

pub struct WeatherFetcher {
    backend: Arc<dyn WeatherBackend>,
    archive_url: String,
    forecast_url: String,
    counter: CallCounter,
}

#[bon]
impl WeatherFetcher {
    #[builder]
    pub fn new(
        backend: Arc<dyn WeatherBackend>,
        #[builder(into, default = DEFAULT_ARCHIVE_URL.to_string())] archive_url: String,
        #[builder(into, default = DEFAULT_FORECAST_URL.to_string())] forecast_url: String,
        #[builder(default)] counter: CallCounter,
    ) -> Self {
        Self {
            backend,
            archive_url,
            forecast_url,
            counter,
        }
    }

    /// Parses `YYYY-MM-DD` bounds and fetches the range relative to the local date.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidRange`] if either date does not parse or
    /// `date_from` is after `date_to`, and [`FetchError::InvalidCoordinates`] if
    /// `lat_lon` is out of range. Backend failures are never returned here; they are recorded in
    /// [`FetchResult::errors`].
    pub async fn fetch(
        &self,
        lat_lon: LatLon,
        date_from: &str,
        date_to: &str,
        granularity_minutes: u32,
    ) -> Result<FetchResult, FetchError> {
        let from = parse_date("date_from", date_from)?;
        let to = parse_date("date_to", date_to)?;
        self.fetch_range(lat_lon, from, to, granularity_minutes)
            .await
    }

    pub async fn fetch_range(
        &self,
        lat_lon: LatLon,
        date_from: NaiveDate,
        date_to: NaiveDate,
        granularity_minutes: u32,
    ) -> Result<FetchResult, FetchError> {
        let today = Local::now().date_naive();
        self.fetch_range_on(lat_lon, date_from, date_to, granularity_minutes, today)
            .await
    }

    /// Like [`WeatherFetcher::fetch_range`], with an explicit "today".
    ///
    /// Dates before `today` go to the archive, `today` and later to the forecast.
    /// Both requests run concurrently and fail independently.
    pub async fn fetch_range_on(
        &self,
        lat_lon: LatLon,
        date_from: NaiveDate,
        date_to: NaiveDate,
        granularity_minutes: u32,
        today: NaiveDate,
    ) -> Result<FetchResult, FetchError> {
        if !lat_lon.is_valid() {
            return Err(FetchError::InvalidCoordinates(lat_lon));
        }
        if date_from > date_to {
            return Err(InvalidRangeError::Inverted {
                from: date_from,
                to: date_to,
            }
            .into());
        }

        let past_params = today
            .pred_opt()
            .filter(|_| date_from < today)
            .map(|yesterday| (date_from, date_to.min(yesterday)))
            .filter(|(start, end)| end >= start)
            .map(|(start, end)| build_past_params(lat_lon, start, end, granularity_minutes));

        let forecast_params = (date_to >= today).then(|| {
            build_forecast_params(lat_lon, date_from.max(today), date_to, granularity_minutes)
        });

        if past_params.is_none() && forecast_params.is_none() {
            warn!("No sub-range to fetch for {}..{}", date_from, date_to);
        }

        let (past, forecast) = tokio::join!(
            self.fetch_part(ApiSource::Archive, past_params.as_ref()),
            self.fetch_part(ApiSource::Forecast, forecast_params.as_ref()),
        );

        let mut result = FetchResult {
            query_details: QueryDetails {
                latitude: lat_lon.latitude(),
                longitude: lat_lon.longitude(),
                date_from,
                date_to,
                requested_granularity_minutes: granularity_minutes,
                fetched_resolution: String::new(),
                request_time_utc: Utc::now(),
                notices: Vec::new(),
            },
            past: None,
            forecast: None,
            errors: None,
        };

        for (source, params, outcome) in [
            (ApiSource::Archive, past_params, past),
            (ApiSource::Forecast, forecast_params, forecast),
        ] {
            let Some(params) = params else { continue };
            for notice in params.notices() {
                result.push_notice(notice.clone());
            }
            match outcome {
                Some(Ok(payload)) => match source {
                    ApiSource::Archive => result.past = Some(payload),
                    ApiSource::Forecast => result.forecast = Some(payload),
                },
                Some(Err(e)) => result.push_error(ApiError {
                    source_api: source,
                    message: describe(&e),
                    params,
                }),
                None => {}
            }
        }

        result.query_details.fetched_resolution = fetched_resolution(&result);

        if result.is_empty() && !result.errors().is_empty() {
            warn!("Both archive and forecast requests failed");
        }
        Ok(result)
    }

    async fn fetch_part(
        &self,
        source: ApiSource,
        params: Option<&ParamSet>,
    ) -> Option<Result<WeatherPayload, BackendError>> {
        let params = params?;
        let (url, kind) = match source {
            ApiSource::Archive => (&self.archive_url, CallKind::Archive),
            ApiSource::Forecast => (&self.forecast_url, CallKind::Forecast),
        };
        let total = self.counter.increment(kind);
        info!(
            "Fetching {} data {}..{} (call #{})",
            source,
            params.get("start_date").unwrap_or("?"),
            params.get("end_date").unwrap_or("?"),
            total
        );

        let outcome = match self.backend.get_json(url, params).await {
            Ok(value) => serde_json::from_value::<WeatherPayload>(value).map_err(|e| {
                BackendError::UnexpectedShape {
                    url: url.clone(),
                    message: e.to_string(),
                }
            }),
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(payload) => info!(
                "Fetched {} data with tiers {:?}",
                source,
                payload.tiers_present()
            ),
            Err(e) => warn!("Failed to fetch {} data: {}", source, describe(e)),
        }
        Some(outcome)
    }
}

/// Sorted, comma-joined names of the tiers present in either payload.
fn fetched_resolution(result: &FetchResult) -> String {
    let tiers: BTreeSet<&str> = [&result.past, &result.forecast]
        .into_iter()
        .flatten()
        .flat_map(|payload| payload.tiers_present())
        .map(|tier| tier.key())
        .collect();
    if tiers.is_empty() {
        "none".to_string()
    } else {
        tiers.into_iter().collect::<Vec<_>>().join(", ")
    }
}

/// Renders an error together with its source chain.
fn describe(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
