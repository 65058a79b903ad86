use crate::weather_data::error::InvalidRangeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("No opening brace '{{' found in model response")]
    NoOpeningBrace,

    #[error("No valid JSON object with location, date_from, date_to and granularity found in model response")]
    NoValidObject,
}

#[derive(Debug, Error)]
pub enum LlmError {
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

    #[error("Response has no usable completion: {0}")]
    MissingCompletion(String),

    #[error("Model returned an empty completion")]
    EmptyCompletion,

    #[error("Failed to extract query JSON from completion")]
    Extraction(#[from] ExtractionError),

    #[error("Extracted location is not a non-empty string: {0}")]
    InvalidLocation(String),

    #[error("No API key configured for the chat completion endpoint")]
    MissingApiKey,
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Configuration problems are terminal; everything the model or the network
    /// might get right next time is not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LlmError::MissingApiKey)
    }
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),
}
