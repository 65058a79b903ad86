//! Chat-completion access for turning free text into query JSON.

use crate::config::LlmSettings;
use crate::query::error::LlmError;
use crate::utils::truncate_body;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// A single system + user exchange with a chat model.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Returns the model's text completion.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ProviderError>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ProviderError {
    message: Option<String>,
}

/// [`ChatCompletion`] over an OpenAI-compatible endpoint such as OpenRouter.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    referer: String,
    app_title: String,
    max_tokens: u32,
}

impl OpenRouterClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &LlmSettings) -> Self {
        Self {
            client,
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            referer: settings.referer.clone(),
            app_title: settings.app_title.clone(),
            max_tokens: settings.max_tokens,
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenRouterClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.app_title)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkRequest(self.api_url.clone(), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::NetworkRequest(self.api_url.clone(), e))?;
        debug!("Chat response {}: {}", status, truncate_body(&body));

        if !status.is_success() {
            warn!("HTTP error for {}: {}", self.api_url, status);
            return Err(LlmError::HttpStatus {
                url: self.api_url.clone(),
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::MalformedBody(self.api_url.clone(), e))?;

        let Some(message) = parsed.choices.into_iter().next().and_then(|c| c.message) else {
            let reason = parsed
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "response lacks choices/message".to_string());
            return Err(LlmError::MissingCompletion(reason));
        };

        match message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(LlmError::EmptyCompletion),
        }
    }
}
