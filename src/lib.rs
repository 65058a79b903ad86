mod config;
mod error;
mod location;
mod query;
mod types;
mod utils;
mod weather_data;
mod weather_query;

pub use config::*;
pub use error::WeatherQueryError;
pub use weather_query::WeatherQuery;

pub use types::call_counter::{CallCounter, CallCounts, CallKind};
pub use types::fetch_result::{ApiError, ApiSource, FetchResult, QueryDetails};
pub use types::query::{LatLon, ResolvedQuery, StructuredQuery};
pub use types::tier::Tier;
pub use types::time_series::{TimeSeriesBlock, WeatherPayload};

pub use query::chat::{ChatCompletion, OpenRouterClient, DEFAULT_CHAT_URL};
pub use query::error::{ExtractionError, LlmError, NormalizeError};
pub use query::extractor::{extract, REQUIRED_KEYS};
pub use query::normalizer::{coerce_granularity, QueryNormalizer, DEFAULT_GRANULARITY_MINUTES};
pub use query::prompts::{system_prompt, user_prompt};

pub use location::error::{GeocoderError, LocationError};
pub use location::nominatim::{NominatimGeocoder, DEFAULT_GEOCODER_URL, DEFAULT_USER_AGENT};
pub use location::resolver::{Geocoder, LocationResolver};

pub use weather_data::backend::{
    OpenMeteoBackend, WeatherBackend, DEFAULT_ARCHIVE_URL, DEFAULT_BACKEND_TIMEOUT,
    DEFAULT_FORECAST_URL,
};
pub use weather_data::error::{BackendError, FetchError, InvalidRangeError};
pub use weather_data::fetcher::WeatherFetcher;
pub use weather_data::granularity::{downsample, filter_by_granularity};
pub use weather_data::params::{
    build_forecast_params, build_past_params, ParamSet, MINUTELY_15_MAX_DAYS,
};
