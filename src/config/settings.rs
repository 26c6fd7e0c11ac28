// Configuration structs

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout for backend clients, matching the vendor SDK default
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000")
    pub bind_address: String,
    /// Attach a permissive CORS layer
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            cors_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub anthropic: ProviderSettings,
    pub openai: ProviderSettings,
}

/// Per-backend overrides
///
/// Unset fields fall back to the adapter's own defaults, so a config file
/// only needs the values it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// API base URL without a trailing path (e.g. "https://api.openai.com")
    pub base_url: Option<String>,
    /// Total request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl ProviderSettings {
    pub fn api_key_env_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.api_key_env.as_deref().unwrap_or(default)
    }

    pub fn base_url_or(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_settings_fallbacks() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.api_key_env_or("OPENAI_API_KEY"), "OPENAI_API_KEY");
        assert_eq!(settings.base_url_or("https://api.openai.com"), "https://api.openai.com");
        assert_eq!(settings.timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let settings = ProviderSettings {
            base_url: Some("http://localhost:9000/".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.base_url_or("unused"), "http://localhost:9000");
    }
}
