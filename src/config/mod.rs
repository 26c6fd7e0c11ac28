// Configuration module
// Public interface for configuration loading

mod loader;
mod settings;

pub use loader::{default_config_path, load_config, BIND_ENV};
pub use settings::{Config, ProviderSettings, ProvidersConfig, ServerConfig, DEFAULT_TIMEOUT_SECS};
