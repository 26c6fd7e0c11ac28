// HTTP request handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{
        sse::{Event, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use super::types::{ChatRequest, ChatResponse, SessionHistory, StreamPayload};
use super::GatewayServer;
use crate::errors::GatewayError;
use crate::providers::{FragmentStream, Message};
use crate::store::new_session_id;

/// Create the main application router
pub fn create_router(server: Arc<GatewayServer>) -> Router {
    let api = Router::new()
        .route("/chat", post(chat))
        .route("/chat/stream", post(chat_stream))
        .route("/sessions/:id", get(get_session).delete(delete_session));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health_check))
        .with_state(server)
}

/// Parse and validate a chat request body
fn accept(payload: Result<Json<ChatRequest>, JsonRejection>) -> Result<ChatRequest, AppError> {
    let Json(request) = payload?;
    request.validate().map_err(AppError::Invalid)?;
    Ok(request)
}

/// Handle POST /api/v1/chat - complete response in one shot
async fn chat(
    State(server): State<Arc<GatewayServer>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let request = accept(payload)?;
    let start_time = Instant::now();

    let session_id = request.session_id.clone().unwrap_or_else(new_session_id);
    let provider = server.providers().resolve(&request.config.model)?;

    let history = server.store().get(&session_id).await?;
    let history_len = history.len();
    let messages = [history, request.messages.clone()].concat();

    tracing::info!(
        session_id = %session_id,
        provider = provider.name(),
        model = %request.config.model,
        history = history_len,
        "Handling chat request"
    );

    let response = provider.complete(&messages, &request.config).await?;

    let mut turn = request.messages;
    turn.push(Message::assistant(response.content.clone()));
    server.store().append(&session_id, &turn).await?;

    tracing::info!(
        session_id = %session_id,
        provider = provider.name(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        input_tokens = response.input_tokens,
        output_tokens = response.output_tokens,
        "Chat request handled"
    );

    Ok(Json(ChatResponse {
        response,
        session_id: Some(session_id),
    }))
}

/// Handle POST /api/v1/chat/stream - stream fragments as Server-Sent Events
///
/// Only malformed or invalid bodies are rejected with a status code. Every
/// other outcome is an event stream ending with `data: [DONE]`; failures,
/// including provider resolution and history lookup, become a single
/// `{"error": ...}` event and leave the session untouched.
async fn chat_stream(
    State(server): State<Arc<GatewayServer>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let request = accept(payload)?;

    let session_id = request.session_id.clone().unwrap_or_else(new_session_id);

    tracing::info!(
        session_id = %session_id,
        model = %request.config.model,
        "Handling streaming chat request"
    );

    let body = async_stream::stream! {
        let mut collected = String::new();
        let mut failure: Option<GatewayError> = None;

        match open_stream(&server, &session_id, &request).await {
            Ok(mut fragments) => {
                while let Some(item) = fragments.recv().await {
                    match item {
                        Ok(text) => {
                            collected.push_str(&text);
                            yield sse_event(&StreamPayload::Text {
                                text,
                                session_id: Some(session_id.clone()),
                            });
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
            }
            Err(e) => failure = Some(e),
        }

        if failure.is_none() {
            let mut turn = request.messages;
            turn.push(Message::assistant(collected));
            if let Err(e) = server.store().append(&session_id, &turn).await {
                failure = Some(e);
            }
        }

        match failure {
            Some(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    kind = e.kind(),
                    error = %e,
                    "Streaming chat request failed"
                );
                yield sse_event(&StreamPayload::Error { error: e.to_string() });
            }
            None => tracing::info!(session_id = %session_id, "Streaming chat request handled"),
        }

        yield Ok(Event::default().data("[DONE]"));
    };

    Ok(Sse::new(body))
}

/// Resolve the provider, prepend session history and open the backend stream
async fn open_stream(
    server: &GatewayServer,
    session_id: &str,
    request: &ChatRequest,
) -> Result<FragmentStream, GatewayError> {
    let provider = server.providers().resolve(&request.config.model)?;
    let history = server.store().get(session_id).await?;
    let messages = [history, request.messages.clone()].concat();

    tracing::debug!(
        session_id = %session_id,
        provider = provider.name(),
        history = messages.len() - request.messages.len(),
        "Opening provider stream"
    );

    provider.stream(&messages, &request.config).await
}

fn sse_event(payload: &StreamPayload) -> Result<Event, Infallible> {
    Ok(Event::default().data(serde_json::to_string(payload).unwrap_or_default()))
}

/// Handle GET /api/v1/sessions/:id - conversation history
async fn get_session(
    State(server): State<Arc<GatewayServer>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionHistory>, AppError> {
    let messages = server.store().get(&session_id).await?;
    Ok(Json(SessionHistory {
        session_id,
        messages,
    }))
}

/// Handle DELETE /api/v1/sessions/:id - forget a session
async fn delete_session(
    State(server): State<Arc<GatewayServer>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    server.store().delete(&session_id).await?;
    tracing::info!(session_id = %session_id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub active_sessions: Option<usize>,
}

/// Handle GET /health - Health check endpoint
pub async fn health_check(State(server): State<Arc<GatewayServer>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: server.uptime().as_secs(),
        active_sessions: server.store().session_count().await,
    })
}

/// Application error wrapper for HTTP error responses
///
/// Bodies are `{"detail": message}`. Backend and translation failures map to
/// 502, adapter construction failures to 500, bad input to 4xx.
#[derive(Debug)]
pub enum AppError {
    Rejected(JsonRejection),
    Invalid(String),
    Gateway(GatewayError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Rejected(rejection) => rejection.status(),
            AppError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Gateway(GatewayError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Rejected(rejection) => rejection.body_text(),
            AppError::Invalid(message) => message.clone(),
            AppError::Gateway(e) => e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %detail, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %detail, "Request rejected");
        }

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected(rejection)
    }
}
