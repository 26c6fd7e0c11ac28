// OpenAI API provider implementation
//
// Chat Completions accepts system messages in the message array, so this
// adapter passes the conversation through unchanged.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::sse::{spawn_fragment_pump, SseAction};
use super::translate::{translate, SystemPolicy, Translated};
use super::types::{LlmResponse, Message, ModelConfig};
use super::{FragmentStream, LlmProvider};
use crate::config::ProviderSettings;
use crate::errors::{GatewayError, Result};

pub const PROVIDER_NAME: &str = "openai";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI API provider
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIProvider {
    pub const SYSTEM_POLICY: SystemPolicy = SystemPolicy::Inline;

    /// Create a new OpenAI provider
    pub fn new(api_key: String, settings: &ProviderSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| {
                GatewayError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url_or(DEFAULT_BASE_URL),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Map the canonical config onto Chat Completions parameters
    ///
    /// Unlike Anthropic, `max_tokens` is only sent when the caller set it.
    pub fn build_params(config: &ModelConfig, translated: Translated) -> OpenAIParams {
        OpenAIParams {
            model: config.model.clone(),
            messages: translated.messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }

    fn prepare(messages: &[Message], config: &ModelConfig) -> Result<OpenAIParams> {
        let translated = translate(Self::SYSTEM_POLICY, messages)?;
        Ok(Self::build_params(config, translated))
    }

    async fn send<T: Serialize + ?Sized>(&self, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                GatewayError::provider(format!("Failed to send request to OpenAI API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GatewayError::provider(format!(
                "OpenAI API request failed\n\nStatus: {}\nBody: {}",
                status, error_body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, messages: &[Message], config: &ModelConfig) -> Result<LlmResponse> {
        let params = Self::prepare(messages, config)?;

        tracing::debug!(model = %params.model, messages = params.messages.len(), "Sending request to OpenAI API");

        let response: OpenAIResponse = self.send(&params).await?.json().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse OpenAI API response: {}", e))
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response.model,
            provider: PROVIDER_NAME.to_string(),
            input_tokens: response.usage.as_ref().and_then(|u| u.prompt_tokens),
            output_tokens: response.usage.as_ref().and_then(|u| u.completion_tokens),
        })
    }

    async fn stream(&self, messages: &[Message], config: &ModelConfig) -> Result<FragmentStream> {
        let params = Self::prepare(messages, config)?;

        let mut request_json = serde_json::to_value(&params)
            .map_err(|e| GatewayError::provider(format!("Failed to encode request: {}", e)))?;
        request_json["stream"] = serde_json::json!(true);

        tracing::debug!(model = %params.model, "Sending streaming request to OpenAI API");

        let response = self.send(&request_json).await?;
        Ok(spawn_fragment_pump(PROVIDER_NAME, response, parse_stream_chunk))
    }
}

/// Interpret one Chat Completions stream payload
pub fn parse_stream_chunk(data: &str) -> SseAction {
    if data.trim() == "[DONE]" {
        return SseAction::Done;
    }

    let chunk: OpenAIStreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            tracing::debug!("Skipping unparseable stream chunk: {}", e);
            return SseAction::Skip;
        }
    };

    if let Some(error) = chunk.error {
        return SseAction::Error(error.message);
    }

    chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|text| !text.is_empty())
        .map(SseAction::Text)
        .unwrap_or(SseAction::Skip)
}

// OpenAI API types

/// Request body for Chat Completions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAIParams {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

// Streaming types

#[derive(Debug, Clone, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    error: Option<OpenAIStreamError>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIStreamError {
    message: String,
}
