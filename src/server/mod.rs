// LLM Gateway - HTTP server module
// Chat endpoints over the provider router and conversation store

mod handlers;
mod types;

pub use handlers::{create_router, health_check, AppError, HealthStatus};
pub use types::{ChatRequest, ChatResponse, SessionHistory, StreamPayload};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, ServerConfig};
use crate::providers::ProviderRouter;
use crate::store::{ConversationStore, InMemoryConversationStore};

/// Shared state behind every request
pub struct GatewayServer {
    /// Model-name routing to memoized providers
    providers: ProviderRouter,
    /// Conversation history (shared with in-flight streams)
    store: Arc<dyn ConversationStore>,
    /// Server configuration
    config: ServerConfig,
    started_at: Instant,
}

impl GatewayServer {
    /// Create a server from explicitly constructed parts
    pub fn new(
        config: ServerConfig,
        providers: ProviderRouter,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            providers,
            store,
            config,
            started_at: Instant::now(),
        }
    }

    /// Production wiring: environment-backed providers and an in-memory store
    pub fn from_config(config: Config) -> Self {
        Self::new(
            config.server,
            ProviderRouter::from_config(config.providers),
            Arc::new(InMemoryConversationStore::new()),
        )
    }

    /// Build the axum application with tracing (and optional CORS) layers
    pub fn into_app(self) -> axum::Router {
        let cors_enabled = self.config.cors_enabled;
        let app = create_router(Arc::new(self)).layer(TraceLayer::new_for_http());

        if cors_enabled {
            app.layer(CorsLayer::permissive())
        } else {
            app
        }
    }

    /// Start the HTTP server
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.config.bind_address))?;

        let app = self.into_app();

        tracing::info!("Starting LLM gateway on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Get reference to the provider router
    pub fn providers(&self) -> &ProviderRouter {
        &self.providers
    }

    /// Get reference to the conversation store
    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
