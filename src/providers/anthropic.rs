// Anthropic Messages API provider implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::sse::{spawn_fragment_pump, SseAction};
use super::translate::{translate, SystemPolicy, Translated};
use super::types::{LlmResponse, Message, ModelConfig, DEFAULT_MAX_TOKENS};
use super::{FragmentStream, LlmProvider};
use crate::config::ProviderSettings;
use crate::errors::{GatewayError, Result};

pub const PROVIDER_NAME: &str = "anthropic";
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic provider
///
/// System messages are hoisted into the top-level `system` parameter and
/// `max_tokens` is always sent, as the Messages API requires both.
#[derive(Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub const SYSTEM_POLICY: SystemPolicy = SystemPolicy::AsParameter;

    /// Create a new Anthropic provider
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

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    /// Map the canonical config onto Messages API parameters
    pub fn build_params(config: &ModelConfig, translated: Translated) -> AnthropicParams {
        AnthropicParams {
            model: config.model.clone(),
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages: translated.messages,
            system: translated.system,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }

    fn prepare(messages: &[Message], config: &ModelConfig) -> Result<AnthropicParams> {
        let translated = translate(Self::SYSTEM_POLICY, messages)?;
        Ok(Self::build_params(config, translated))
    }

    /// POST a request body and fail on non-success status
    async fn send<T: Serialize + ?Sized>(&self, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                GatewayError::provider(format!("Failed to send request to Anthropic API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GatewayError::provider(format!(
                "Anthropic API request failed\n\nStatus: {}\nBody: {}",
                status, error_body
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, messages: &[Message], config: &ModelConfig) -> Result<LlmResponse> {
        let params = Self::prepare(messages, config)?;

        tracing::debug!(model = %params.model, messages = params.messages.len(), "Sending request to Anthropic API");

        let response: AnthropicResponse = self.send(&params).await?.json().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Anthropic API response: {}", e))
        })?;

        let content = response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<String>();

        Ok(LlmResponse {
            content,
            model: response.model,
            provider: PROVIDER_NAME.to_string(),
            input_tokens: response.usage.as_ref().and_then(|u| u.input_tokens),
            output_tokens: response.usage.as_ref().and_then(|u| u.output_tokens),
        })
    }

    async fn stream(&self, messages: &[Message], config: &ModelConfig) -> Result<FragmentStream> {
        let params = Self::prepare(messages, config)?;

        // Streaming is a transport switch, not a model parameter
        let mut request_json = serde_json::to_value(&params)
            .map_err(|e| GatewayError::provider(format!("Failed to encode request: {}", e)))?;
        request_json["stream"] = serde_json::json!(true);

        tracing::debug!(model = %params.model, "Sending streaming request to Anthropic API");

        let response = self.send(&request_json).await?;
        Ok(spawn_fragment_pump(PROVIDER_NAME, response, parse_stream_event))
    }
}

/// Interpret one Messages API stream event
pub fn parse_stream_event(data: &str) -> SseAction {
    let event: StreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!("Skipping unparseable stream event: {}", e);
            return SseAction::Skip;
        }
    };

    match event.event_type.as_str() {
        "content_block_delta" => match event.delta {
            Some(StreamDelta {
                delta_type: Some(ref t),
                text: Some(text),
            }) if t == "text_delta" && !text.is_empty() => SseAction::Text(text),
            _ => SseAction::Skip,
        },
        "message_stop" => SseAction::Done,
        "error" => SseAction::Error(
            event
                .error
                .map(|e| match e.error_type {
                    Some(kind) => format!("{}: {}", kind, e.message),
                    None => e.message,
                })
                .unwrap_or_else(|| "Anthropic stream reported an error".to_string()),
        ),
        _ => SseAction::Skip,
    }
}

// Anthropic API types

/// Request body for the Messages API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicParams {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicContentBlock>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    delta: Option<StreamDelta>,
    error: Option<StreamError>,
}

#[derive(Debug, Clone, Deserialize)]
struct StreamDelta {
    #[serde(rename = "type")]
    delta_type: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StreamError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}
