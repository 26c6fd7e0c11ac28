// Configuration loader
// Loads settings from a TOML file (explicit path or ~/.llm-gateway/config.toml)
// and applies environment overrides on top

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Config;

/// Environment variable overriding `server.bind_address`
pub const BIND_ENV: &str = "LLM_GATEWAY_BIND";

/// Load configuration
///
/// An explicit `path` must exist. Without one, the default location is used
/// if present, otherwise built-in defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_config_file(&path)?,
            _ => {
                tracing::debug!("No config file found, using defaults");
                Config::default()
            }
        },
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// `~/.llm-gateway/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".llm-gateway/config.toml"))
}

fn read_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.is_empty()) {
        config.server.bind_address = bind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_address = "0.0.0.0:9000"

[providers.openai]
base_url = "http://localhost:11434"
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert!(!config.server.cors_enabled);
        assert_eq!(
            config.providers.openai.base_url.as_deref(),
            Some("http://localhost:11434")
        );
        assert_eq!(config.providers.anthropic, Default::default());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind_address = 3").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_bind_override() {
        let mut config = Config::default();
        apply_overrides(&mut config, |key| {
            (key == BIND_ENV).then(|| "127.0.0.1:7777".to_string())
        });
        assert_eq!(config.server.bind_address, "127.0.0.1:7777");

        apply_overrides(&mut config, |_| Some(String::new()));
        assert_eq!(config.server.bind_address, "127.0.0.1:7777");
    }
}
