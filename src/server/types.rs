// Request/response bodies for the chat endpoints

use serde::{Deserialize, Serialize};

use crate::providers::{LlmResponse, Message, ModelConfig};

/// Body of `POST /chat` and `POST /chat/stream`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// New messages for this turn (history is prepended from the session)
    pub messages: Vec<Message>,
    pub config: ModelConfig,
    /// Session to continue; a new one is started when absent
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Check the invariants the provider layer relies on
    pub fn validate(&self) -> Result<(), String> {
        if self.messages.is_empty() {
            return Err("messages must contain at least one message".to_string());
        }
        if self.config.model.trim().is_empty() {
            return Err("config.model must not be empty".to_string());
        }
        if let Some(temperature) = self.config.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "config.temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }
        if let Some(top_p) = self.config.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(format!("config.top_p must be between 0.0 and 1.0, got {}", top_p));
            }
        }
        if self.config.max_tokens == Some(0) {
            return Err("config.max_tokens must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Body of a successful `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: LlmResponse,
    pub session_id: Option<String>,
}

/// One SSE payload of `POST /chat/stream`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamPayload {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    Error {
        error: String,
    },
}

/// Body of `GET /sessions/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    pub session_id: String,
    pub messages: Vec<Message>,
}
