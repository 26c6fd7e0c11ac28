// Shared helpers for gateway integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tower::ServiceExt;

use llm_gateway::config::ServerConfig;
use llm_gateway::errors::{GatewayError, Result};
use llm_gateway::providers::{
    FragmentStream, LlmProvider, LlmResponse, Message, ModelConfig, ProviderRouter,
};
use llm_gateway::server::GatewayServer;
use llm_gateway::store::InMemoryConversationStore;

/// Provider with canned output that records every conversation it receives
pub struct ScriptedProvider {
    name: &'static str,
    reply: std::result::Result<String, GatewayError>,
    fragments: Vec<std::result::Result<String, GatewayError>>,
    stream_error: Option<GatewayError>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn replying(name: &'static str, reply: &str) -> Self {
        Self {
            name,
            reply: Ok(reply.to_string()),
            fragments: Vec::new(),
            stream_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &'static str, error: GatewayError) -> Self {
        Self {
            reply: Err(error),
            ..Self::replying(name, "")
        }
    }

    pub fn streaming(
        name: &'static str,
        fragments: Vec<std::result::Result<String, GatewayError>>,
    ) -> Self {
        Self {
            fragments,
            ..Self::replying(name, "")
        }
    }

    /// Provider whose streams fail before the first fragment
    pub fn refusing_stream(name: &'static str, error: GatewayError) -> Self {
        Self {
            stream_error: Some(error),
            ..Self::replying(name, "")
        }
    }

    /// Conversations passed to `complete`/`stream`, in call order
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(&self, messages: &[Message], config: &ModelConfig) -> Result<LlmResponse> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let content = self.reply.clone()?;
        Ok(LlmResponse {
            content,
            model: config.model.clone(),
            provider: self.name.to_string(),
            input_tokens: Some(5),
            output_tokens: Some(2),
        })
    }

    async fn stream(&self, messages: &[Message], _config: &ModelConfig) -> Result<FragmentStream> {
        self.calls.lock().unwrap().push(messages.to_vec());
        if let Some(error) = &self.stream_error {
            return Err(error.clone());
        }
        let (tx, rx) = mpsc::channel(self.fragments.len().max(1));
        for fragment in &self.fragments {
            tx.send(fragment.clone()).await.expect("receiver alive");
        }
        Ok(rx)
    }
}

/// Gateway app whose every model resolves to `provider`
pub fn gateway_with(
    provider: Arc<dyn LlmProvider>,
) -> (axum::Router, Arc<InMemoryConversationStore>) {
    let router = ProviderRouter::new(move |_| Ok(Arc::clone(&provider)));
    gateway_with_router(router)
}

pub fn gateway_with_router(
    router: ProviderRouter,
) -> (axum::Router, Arc<InMemoryConversationStore>) {
    let store = Arc::new(InMemoryConversationStore::new());
    let server = GatewayServer::new(ServerConfig::default(), router, store.clone());
    (server.into_app(), store)
}

pub async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn post_json(
    app: &axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// `data:` payloads of an SSE body, in order
pub fn sse_data(body: &str) -> Vec<String> {
    body.split("\n\n")
        .filter(|event| !event.trim().is_empty())
        .filter_map(|event| {
            event
                .lines()
                .find_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
                .map(str::to_string)
        })
        .collect()
}
