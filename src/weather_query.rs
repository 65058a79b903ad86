//! The main entry point: free-text question in, filtered weather data out.

use crate::config::{BackendSettings, LlmSettings, Settings};
use crate::error::WeatherQueryError;
use crate::location::nominatim::NominatimGeocoder;
use crate::location::resolver::{Geocoder, LocationResolver};
use crate::query::chat::{ChatCompletion, OpenRouterClient};
use crate::query::normalizer::QueryNormalizer;
use crate::types::call_counter::{CallCounter, CallCounts};
use crate::types::fetch_result::FetchResult;
use crate::types::query::ResolvedQuery;
use crate::weather_data::backend::{OpenMeteoBackend, WeatherBackend};
use crate::weather_data::fetcher::WeatherFetcher;
use crate::weather_data::granularity::filter_by_granularity;
use bon::bon;
use chrono::{Local, NaiveDate};
use log::info;
use std::sync::Arc;

/// Answers natural-language weather questions.
///
/// A question goes through four steps: the chat model turns it into a structured
/// query, the place name is geocoded, the date range is fetched from the archive
/// and forecast endpoints, and the result is reduced to the requested granularity.
///
/// Build one from [`Settings`] with [`WeatherQuery::from_settings`] to use the
/// OpenRouter, Nominatim and Open-Meteo HTTP clients, or supply your own
/// collaborators through [`WeatherQuery::builder`].
///
/// # Examples
///
/// ```no_run
/// # use weather_query::{Settings, WeatherQuery, WeatherQueryError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), WeatherQueryError> {
/// let client = WeatherQuery::from_settings(&Settings::from_env())?;
/// let result = client.ask("weather in Prague next 3 days, hourly").await?;
///
/// println!("{}", result.summary());
/// println!("{:?}", client.call_counts());
/// # Ok(())
/// # }
/// ```
pub struct WeatherQuery {
    normalizer: QueryNormalizer,
    resolver: LocationResolver,
    fetcher: WeatherFetcher,
    counter: CallCounter,
}

#[bon]
impl WeatherQuery {
    /// Assembles a pipeline from explicit collaborators.
    ///
    /// * `.chat(..)`, `.geocoder(..)`, `.backend(..)`: **Required.**
    /// * `.llm(LlmSettings)`: model, attempt count and retry delay. Defaults apply when omitted.
    /// * `.endpoints(BackendSettings)`: archive and forecast URLs.
    /// * `.counter(CallCounter)`: shared call counter, e.g. to aggregate across clients.
    #[builder]
    pub fn new(
        chat: Arc<dyn ChatCompletion>,
        geocoder: Arc<dyn Geocoder>,
        backend: Arc<dyn WeatherBackend>,
        #[builder(default)] llm: LlmSettings,
        #[builder(default)] endpoints: BackendSettings,
        #[builder(default)] counter: CallCounter,
    ) -> Self {
        let normalizer = QueryNormalizer::builder()
            .chat(chat)
            .model(llm.model.clone())
            .max_attempts(llm.max_attempts)
            .retry_delay(llm.retry_delay())
            .counter(counter.clone())
            .build();
        let fetcher = WeatherFetcher::builder()
            .backend(backend)
            .archive_url(endpoints.archive_url)
            .forecast_url(endpoints.forecast_url)
            .counter(counter.clone())
            .build();
        Self {
            normalizer,
            resolver: LocationResolver::new(geocoder, counter.clone()),
            fetcher,
            counter,
        }
    }

    /// Creates a client backed by the OpenRouter, Nominatim and Open-Meteo HTTP APIs.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherQueryError::HttpClient`] if an HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, WeatherQueryError> {
        let chat = OpenRouterClient::new(&settings.llm).map_err(WeatherQueryError::HttpClient)?;
        let geocoder =
            NominatimGeocoder::new(&settings.geocoder).map_err(WeatherQueryError::HttpClient)?;
        let backend = OpenMeteoBackend::new(settings.backend.timeout())
            .map_err(WeatherQueryError::HttpClient)?;

        Ok(Self::builder()
            .chat(Arc::new(chat))
            .geocoder(Arc::new(geocoder))
            .backend(Arc::new(backend))
            .llm(settings.llm.clone())
            .endpoints(settings.backend.clone())
            .build())
    }

    /// Normalizes and geocodes `query_text` without fetching any weather data.
    pub async fn resolve_query(&self, query_text: &str) -> Result<ResolvedQuery, WeatherQueryError> {
        self.resolve_query_on(query_text, Local::now().date_naive())
            .await
    }

    /// Like [`WeatherQuery::resolve_query`], with an explicit "today".
    pub async fn resolve_query_on(
        &self,
        query_text: &str,
        today: NaiveDate,
    ) -> Result<ResolvedQuery, WeatherQueryError> {
        let query = self.normalizer.normalize_on(query_text, today).await?;
        info!(
            "Structured query: {} {}..{} every {} min",
            query.location, query.date_from, query.date_to, query.granularity_minutes
        );
        let coordinates = self.resolver.resolve(&query.location).await?;
        Ok(query.resolve(coordinates))
    }

    /// Answers `query_text`, splitting the range at the local date.
    ///
    /// # Errors
    ///
    /// Fails if the question cannot be normalized, the location cannot be resolved,
    /// or the dates are invalid. Archive or forecast failures do not fail the call;
    /// they are listed in [`FetchResult::errors`].
    pub async fn ask(&self, query_text: &str) -> Result<FetchResult, WeatherQueryError> {
        self.ask_on(query_text, Local::now().date_naive()).await
    }

    /// Like [`WeatherQuery::ask`], with an explicit "today".
    pub async fn ask_on(
        &self,
        query_text: &str,
        today: NaiveDate,
    ) -> Result<FetchResult, WeatherQueryError> {
        let resolved = self.resolve_query_on(query_text, today).await?;
        let granularity = resolved.query.granularity_minutes;
        let result = self
            .fetcher
            .fetch_range_on(
                resolved.coordinates(),
                resolved.query.date_from,
                resolved.query.date_to,
                granularity,
                today,
            )
            .await?;
        Ok(filter_by_granularity(result, granularity))
    }

    /// Outbound calls made so far by this client.
    pub fn call_counts(&self) -> CallCounts {
        self.counter.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::error::{GeocoderError, LocationError};
    use crate::query::error::{LlmError, NormalizeError};
    use crate::types::fetch_result::ApiSource;
    use crate::types::query::LatLon;
    use crate::weather_data::error::BackendError;
    use crate::weather_data::params::ParamSet;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct CannedChat(&'static str);

    #[async_trait]
    impl ChatCompletion for CannedChat {
        async fn complete(&self, _: &str, _: &str, _: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    struct OneCity;

    #[async_trait]
    impl Geocoder for OneCity {
        async fn geocode(&self, name: &str) -> Result<Option<LatLon>, GeocoderError> {
            Ok((name == "Prague").then_some(LatLon(50.0755, 14.4378)))
        }
    }

    /// Serves six hourly points for whatever range is asked; the archive is down.
    struct ForecastOnly;

    #[async_trait]
    impl WeatherBackend for ForecastOnly {
        async fn get_json(&self, url: &str, params: &ParamSet) -> Result<Value, BackendError> {
            if url.contains("archive") {
                return Err(BackendError::UnexpectedShape {
                    url: url.to_string(),
                    message: "archive offline".to_string(),
                });
            }
            let day = params.get("start_date").unwrap_or("2025-04-20");
            let times: Vec<String> = (0..6).map(|h| format!("{day}T{h:02}:00")).collect();
            Ok(json!({
                "timezone": "Europe/Prague",
                "hourly": {"time": times, "temperature_2m": [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]},
                "daily": {"time": [day], "sunrise": [format!("{day}T05:58")], "daylight_duration": [50_580.0]}
            }))
        }
    }

    fn client(reply: &'static str) -> WeatherQuery {
        WeatherQuery::builder()
            .chat(Arc::new(CannedChat(reply)))
            .geocoder(Arc::new(OneCity))
            .backend(Arc::new(ForecastOnly))
            .llm(LlmSettings::builder().retry_delay_ms(0).build())
            .build()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 20).unwrap()
    }

    #[tokio::test]
    async fn test_ask_runs_whole_pipeline() -> Result<(), WeatherQueryError> {
        let client = client(
            r#"{"location": "Prague", "date_from": "2025-04-19", "date_to": "2025-04-20", "granularity": 120}"#,
        );

        let result = client.ask_on("Prague, yesterday and today, every 2 hours", today()).await?;

        assert_eq!(result.query_details.latitude, 50.0755);
        assert_eq!(result.query_details.requested_granularity_minutes, 120);
        assert!(result.past.is_none());
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].source_api, ApiSource::Archive);

        let hourly = result.forecast.as_ref().unwrap().hourly.as_ref().unwrap();
        assert_eq!(
            hourly.time,
            vec!["2025-04-20T00:00", "2025-04-20T02:00", "2025-04-20T04:00"]
        );
        assert_eq!(hourly.fields["temperature_2m"], json!([1.0, 3.0, 5.0]));

        let counts = client.call_counts();
        assert_eq!(
            (counts.llm, counts.geocoding, counts.archive, counts.forecast),
            (1, 1, 1, 1)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_query_does_not_fetch() -> Result<(), WeatherQueryError> {
        let client = client(
            r#"{"location": "Prague", "date_from": "2025-04-20", "date_to": "2025-04-20", "granularity": null}"#,
        );

        let resolved = client.resolve_query_on("Prague today", today()).await?;

        assert_eq!(resolved.coordinates(), LatLon(50.0755, 14.4378));
        assert_eq!(resolved.query.granularity_minutes, 60);
        assert_eq!(client.call_counts().forecast, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_location_stops_before_fetch() {
        let client = client(
            r#"{"location": "Atlantis", "date_from": "2025-04-20", "date_to": "2025-04-20", "granularity": 60}"#,
        );

        let err = client.ask_on("Atlantis today", today()).await.unwrap_err();

        assert!(matches!(
            err,
            WeatherQueryError::Location(LocationError::NotFound(_))
        ));
        let counts = client.call_counts();
        assert_eq!(counts.archive + counts.forecast, 0);
    }

    #[tokio::test]
    async fn test_inverted_range_stops_before_geocoding() {
        let client = client(
            r#"{"location": "Prague", "date_from": "2025-04-22", "date_to": "2025-04-20", "granularity": 60}"#,
        );

        let err = client.ask_on("Prague", today()).await.unwrap_err();

        assert!(matches!(
            err,
            WeatherQueryError::Normalize(NormalizeError::InvalidRange(_))
        ));
        assert_eq!(client.call_counts().geocoding, 0);
    }

    #[tokio::test]
    async fn test_daily_request_summary() -> Result<(), WeatherQueryError> {
        let client = client(
            r#"{"location": "Prague", "date_from": "2025-04-20", "date_to": "2025-04-20", "granularity": 1440}"#,
        );

        let result = client.ask_on("Prague today, daily", today()).await?;

        let forecast = result.forecast.as_ref().unwrap();
        assert!(forecast.hourly.is_none());
        assert!(forecast.daily.is_some());
        let summary = result.summary();
        assert!(summary.contains("Forecast for 2025-04-20:"));
        assert!(summary.contains("Daylight Duration: 14h 3m"));
        Ok(())
    }
}
