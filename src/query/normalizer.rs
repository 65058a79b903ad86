//! Turns a free-text weather question into a [`StructuredQuery`] via the chat model.

use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MODEL, DEFAULT_RETRY_DELAY};
use crate::query::chat::ChatCompletion;
use crate::query::error::{LlmError, NormalizeError};
use crate::query::extractor::extract;
use crate::query::prompts::{system_prompt, user_prompt};
use crate::types::call_counter::{CallCounter, CallKind};
use crate::types::query::StructuredQuery;
use crate::utils::parse_date;
use crate::weather_data::error::InvalidRangeError;
use bon::bon;
use chrono::{Local, NaiveDate};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Granularity used when the model gives none or an unusable one.
pub const DEFAULT_GRANULARITY_MINUTES: u32 = 60;

/// Query fields as extracted, before date validation.
struct RawQuery {
    location: String,
    date_from: String,
    date_to: String,
    granularity_minutes: u32,
}

pub struct QueryNormalizer {
    chat: Arc<dyn ChatCompletion>,
    model: String,
    max_attempts: u32,
    retry_delay: Duration,
    counter: CallCounter,
}

#[bon]
impl QueryNormalizer {
    #[builder]
    pub fn new(
        chat: Arc<dyn ChatCompletion>,
        #[builder(into, default = DEFAULT_MODEL.to_string())] model: String,
        #[builder(default = DEFAULT_MAX_ATTEMPTS)] max_attempts: u32,
        #[builder(default = DEFAULT_RETRY_DELAY)] retry_delay: Duration,
        #[builder(default)] counter: CallCounter,
    ) -> Self {
        Self {
            chat,
            model,
            max_attempts: max_attempts.max(1),
            retry_delay,
            counter,
        }
    }

    /// Normalizes `query_text`, resolving relative dates against the local date.
    pub async fn normalize(&self, query_text: &str) -> Result<StructuredQuery, NormalizeError> {
        self.normalize_on(query_text, Local::now().date_naive())
            .await
    }

    /// Normalizes `query_text` with `today` as the reference for relative dates.
    ///
    /// Model, transport and extraction failures are retried up to the configured
    /// number of attempts with a fixed delay in between; the last such error is
    /// returned once attempts run out. Dates that do not parse, or a range whose start
    /// is after its end, fail immediately with [`NormalizeError::InvalidRange`].
    pub async fn normalize_on(
        &self,
        query_text: &str,
        today: NaiveDate,
    ) -> Result<StructuredQuery, NormalizeError> {
        let system = system_prompt(today);
        let user = user_prompt(query_text);

        let mut attempt = 1;
        loop {
            let calls = self.counter.increment(CallKind::Llm);
            info!(
                "LLM call attempt {}/{} (call #{})",
                attempt, self.max_attempts, calls
            );

            match self.attempt(&system, &user).await {
                Ok(raw) => return Ok(validate_dates(raw)?),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    warn!("LLM attempt {} failed: {}", attempt, e);
                    debug!("Waiting {:?} before retrying", self.retry_delay);
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("LLM call failed after {} attempt(s): {}", attempt, e);
                    return Err(e.into());
                }
            }
        }
    }

    async fn attempt(&self, system: &str, user: &str) -> Result<RawQuery, LlmError> {
        let content = self.chat.complete(system, user, &self.model).await?;
        debug!("Model output: {}", content);
        let object = extract(&content)?;
        raw_query(object)
    }
}

/// Reads the four query fields. `extract` only hands over objects carrying every
/// key in [`REQUIRED_KEYS`](crate::REQUIRED_KEYS).
fn raw_query(object: Map<String, Value>) -> Result<RawQuery, LlmError> {
    static NULL: Value = Value::Null;
    let field = |key: &str| object.get(key).unwrap_or(&NULL);

    let location = match field("location") {
        Value::String(name) if !name.trim().is_empty() => name.trim().to_string(),
        other => return Err(LlmError::InvalidLocation(other.to_string())),
    };

    Ok(RawQuery {
        location,
        date_from: date_text(field("date_from")),
        date_to: date_text(field("date_to")),
        granularity_minutes: coerce_granularity(field("granularity")),
    })
}

fn date_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Coerces the model's granularity to positive minutes.
///
/// Integers pass through, floats are truncated and numeric strings are parsed.
/// Anything else, and any result that is not positive, becomes
/// [`DEFAULT_GRANULARITY_MINUTES`].
pub fn coerce_granularity(value: &Value) -> u32 {
    let minutes = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    match minutes.and_then(|m| u32::try_from(m).ok()).filter(|m| *m > 0) {
        Some(m) => m,
        None => {
            warn!(
                "Granularity {} is not a positive integer, defaulting to {}",
                value, DEFAULT_GRANULARITY_MINUTES
            );
            DEFAULT_GRANULARITY_MINUTES
        }
    }
}

fn validate_dates(raw: RawQuery) -> Result<StructuredQuery, InvalidRangeError> {
    let date_from = parse_date("date_from", &raw.date_from)?;
    let date_to = parse_date("date_to", &raw.date_to)?;
    if date_from > date_to {
        return Err(InvalidRangeError::Inverted {
            from: date_from,
            to: date_to,
        });
    }
    Ok(StructuredQuery {
        location: raw.location,
        date_from,
        date_to,
        granularity_minutes: raw.granularity_minutes,
    })
}
