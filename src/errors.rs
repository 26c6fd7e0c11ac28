// Gateway error taxonomy
//
// Every failure that crosses the provider or store boundary is one of these
// variants. The HTTP layer maps them to status codes; the binary wraps them
// in anyhow at its edges.

use thiserror::Error;

/// Result alias used throughout the provider and store layers
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced by providers, the router and the conversation store
///
/// `Clone` so a failed adapter construction can be cached and handed back
/// to every later caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// Input that cannot be translated for a backend (e.g. only system messages)
    #[error("{0}")]
    Validation(String),

    /// Missing or unusable configuration when constructing an adapter
    #[error("{0}")]
    Configuration(String),

    /// Transport, auth, quota or model failure reported by a backend
    #[error("{0}")]
    Provider(String),

    /// Conversation store failure
    #[error("{0}")]
    Store(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Short machine-readable kind, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::Provider(_) => "provider",
            Self::Store(_) => "store",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Provider(err.to_string())
    }
}

/// Format a missing credential error with a hint on how to fix it
pub fn missing_credential_error(provider: &str, env_var: &str) -> GatewayError {
    GatewayError::Configuration(format!(
        "{} API key is missing: environment variable {} is not set\n\n\
        Suggestion: export {}=\"...\" (or add it to .env) and restart the gateway",
        provider, env_var, env_var
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_names_env_var() {
        let err = missing_credential_error("Anthropic", "ANTHROPIC_API_KEY");
        assert_eq!(err.kind(), "configuration");
        let msg = err.to_string();
        assert!(msg.contains("ANTHROPIC_API_KEY"));
        assert!(msg.contains("restart"));
    }

    #[test]
    fn test_display_is_bare_message() {
        let err = GatewayError::provider("Status: 429\nBody: rate limited");
        assert_eq!(err.to_string(), "Status: 429\nBody: rate limited");
    }
}
