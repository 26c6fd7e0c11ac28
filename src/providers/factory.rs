// Provider factory
//
// Creates LLM providers from configuration, reading each backend's API key
// from the environment at construction time.

use std::sync::Arc;

use super::anthropic::{self, AnthropicProvider};
use super::openai::{self, OpenAIProvider};
use super::router::ProviderKind;
use super::LlmProvider;
use crate::config::ProvidersConfig;
use crate::errors::{missing_credential_error, Result};

/// Create the provider for `kind`
///
/// Fails with a configuration error when the credential variable is unset
/// or blank.
pub fn create_provider(kind: ProviderKind, config: &ProvidersConfig) -> Result<Arc<dyn LlmProvider>> {
    match kind {
        ProviderKind::Anthropic => {
            let settings = &config.anthropic;
            let api_key =
                read_api_key("Anthropic", settings.api_key_env_or(anthropic::API_KEY_ENV))?;
            Ok(Arc::new(AnthropicProvider::new(api_key, settings)?))
        }

        ProviderKind::OpenAi => {
            let settings = &config.openai;
            let api_key = read_api_key("OpenAI", settings.api_key_env_or(openai::API_KEY_ENV))?;
            Ok(Arc::new(OpenAIProvider::new(api_key, settings)?))
        }
    }
}

fn read_api_key(provider: &str, env_var: &str) -> Result<String> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(missing_credential_error(provider, env_var)),
    }
}
