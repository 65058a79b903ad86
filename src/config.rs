//! Endpoint, credential and retry settings for the HTTP-backed pipeline.
//!
//! Every field has a default, so a partial JSON document (or none at all) is a valid
//! configuration. [`Settings::from_env`] overlays the conventional environment
//! variables on top of the defaults.

use crate::location::nominatim::{DEFAULT_GEOCODER_URL, DEFAULT_USER_AGENT};
use crate::query::chat::DEFAULT_CHAT_URL;
use crate::weather_data::backend::{DEFAULT_ARCHIVE_URL, DEFAULT_BACKEND_TIMEOUT, DEFAULT_FORECAST_URL};
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "deepseek/deepseek-v3-base:free";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct LlmSettings {
    #[builder(into, default = DEFAULT_CHAT_URL.to_string())]
    pub api_url: String,
    #[builder(into)]
    pub api_key: Option<String>,
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    pub model: String,
    /// Total attempts per query, including the first.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
    #[builder(default = DEFAULT_RETRY_DELAY.as_millis() as u64)]
    pub retry_delay_ms: u64,
    #[builder(default = 45)]
    pub timeout_secs: u64,
    #[builder(default = 300)]
    pub max_tokens: u32,
    /// Sent as `HTTP-Referer`.
    #[builder(into, default = "http://localhost".to_string())]
    pub referer: String,
    /// Sent as `X-Title`.
    #[builder(into, default = "Weather Chatbot".to_string())]
    pub app_title: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LlmSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct BackendSettings {
    #[builder(into, default = DEFAULT_ARCHIVE_URL.to_string())]
    pub archive_url: String,
    #[builder(into, default = DEFAULT_FORECAST_URL.to_string())]
    pub forecast_url: String,
    #[builder(default = DEFAULT_BACKEND_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct GeocoderSettings {
    #[builder(into, default = DEFAULT_GEOCODER_URL.to_string())]
    pub base_url: String,
    #[builder(into, default = DEFAULT_USER_AGENT.to_string())]
    pub user_agent: String,
    #[builder(default = 15)]
    pub timeout_secs: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GeocoderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for [`WeatherQuery::from_settings`](crate::WeatherQuery::from_settings).
///
/// # Examples
///
/// ```
/// use weather_query::{LlmSettings, Settings};
///
/// let settings = Settings::builder()
///     .llm(LlmSettings::builder().api_key("sk-test").max_attempts(5).build())
///     .build();
/// assert_eq!(settings.llm.max_attempts, 5);
/// assert_eq!(settings.geocoder.timeout_secs, 15);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct Settings {
    #[builder(default)]
    pub llm: LlmSettings,
    #[builder(default)]
    pub backend: BackendSettings,
    #[builder(default)]
    pub geocoder: GeocoderSettings,
}

impl Settings {
    /// Defaults overlaid with `OPENROUTER_API_KEY`, `OPENROUTER_API_URL`,
    /// `OPENROUTER_MODEL`, `YOUR_SITE_URL` and `YOUR_APP_NAME`.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env(|name| std::env::var(name).ok());
        settings
    }

    /// Overlays variables resolved through `lookup`. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = get("OPENROUTER_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("OPENROUTER_API_URL") {
            self.llm.api_url = url;
        }
        if let Some(model) = get("OPENROUTER_MODEL") {
            self.llm.model = model;
        }
        if let Some(referer) = get("YOUR_SITE_URL") {
            self.llm.referer = referer;
        }
        if let Some(title) = get("YOUR_APP_NAME") {
            self.llm.app_title = title;
        }
    }
}
