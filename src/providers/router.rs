// Model-name based provider selection
//
// Adapters are built lazily, once per kind, and shared by every request.
// A failed construction is remembered too: fixing the environment requires a
// restart.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use super::factory::create_provider;
use super::LlmProvider;
use crate::config::ProvidersConfig;
use crate::errors::Result;

/// Model name prefixes served by OpenAI; everything else goes to Anthropic
const OPENAI_PREFIXES: &[&str] = &["gpt-", "o1", "o3"];

/// Backends the gateway can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
}

impl ProviderKind {
    /// Pick the backend for a model name (first matching prefix wins)
    pub fn for_model(model: &str) -> Self {
        if OPENAI_PREFIXES.iter().any(|prefix| model.starts_with(prefix)) {
            ProviderKind::OpenAi
        } else {
            ProviderKind::Anthropic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constructor used by the router for each provider kind
pub type ProviderFactory = dyn Fn(ProviderKind) -> Result<Arc<dyn LlmProvider>> + Send + Sync;

type ProviderSlot = OnceCell<Result<Arc<dyn LlmProvider>>>;

/// Routes model names to memoized provider instances
pub struct ProviderRouter {
    factory: Box<ProviderFactory>,
    anthropic: ProviderSlot,
    openai: ProviderSlot,
}

impl ProviderRouter {
    /// Create a router that builds providers with `factory`
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(ProviderKind) -> Result<Arc<dyn LlmProvider>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            anthropic: OnceCell::new(),
            openai: OnceCell::new(),
        }
    }

    /// Create a router whose providers read credentials from the environment
    pub fn from_config(config: ProvidersConfig) -> Self {
        Self::new(move |kind| create_provider(kind, &config))
    }

    /// Provider for `model`, constructing it on first use
    pub fn resolve(&self, model: &str) -> Result<Arc<dyn LlmProvider>> {
        self.get(ProviderKind::for_model(model))
    }

    /// Provider of the given kind, constructing it on first use
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn LlmProvider>> {
        self.slot(kind)
            .get_or_init(|| {
                let result = (self.factory)(kind);
                match &result {
                    Ok(provider) => {
                        tracing::info!(provider = provider.name(), "Provider initialized");
                    }
                    Err(e) => {
                        tracing::error!(
                            provider = %kind,
                            error = %e,
                            "Provider construction failed, cached until restart"
                        );
                    }
                }
                result
            })
            .clone()
    }

    fn slot(&self, kind: ProviderKind) -> &ProviderSlot {
        match kind {
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::OpenAi => &self.openai,
        }
    }
}
