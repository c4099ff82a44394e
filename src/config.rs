//! User settings for the generation service
//!
//! Settings are read from `config.json` in the user's config directory and
//! then overridden by environment variables:
//! - Linux: ~/.config/focus-ai/config.json
//! - macOS: ~/Library/Application Support/focus-ai/config.json
//! - Windows: %APPDATA%\focus-ai\config.json

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gemini API key, required for generation
    pub api_key: Option<String>,
    /// Image editing model id
    pub model: String,
    /// Base URL of the generative language API
    pub endpoint: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the config file and the process environment
    pub fn load() -> Self {
        let file = config_path().and_then(|path| match fs::read_to_string(&path) {
            Ok(raw) => {
                tracing::info!("⚙️  Loaded settings from {}", path.display());
                Some(raw)
            }
            Err(_) => None,
        });

        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Merge an optional JSON config document with environment overrides
    pub fn from_sources(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = match file.map(serde_json::from_str::<Settings>) {
            Some(Ok(parsed)) => parsed,
            Some(Err(e)) => {
                tracing::warn!("⚠️  Ignoring invalid config file: {}", e);
                Settings::default()
            }
            None => Settings::default(),
        };

        if let Some(v) = env("API_KEY") {
            settings.api_key = Some(v);
        }
        if let Some(v) = env("GEMINI_API_KEY") {
            settings.api_key = Some(v);
        }
        if let Some(v) = env("FOCUS_AI_MODEL") {
            settings.model = v;
        }
        if let Some(v) = env("FOCUS_AI_ENDPOINT") {
            settings.endpoint = v;
        }

        settings.api_key = settings.api_key.filter(|key| !key.trim().is_empty());
        settings.endpoint = settings.endpoint.trim_end_matches('/').to_string();
        settings
    }
}

/// Location of the optional config file
fn config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
    path.push("focus-ai");
    path.push("config.json");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_sources(None, env_of(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.model, "gemini-2.5-flash-image");
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_file_values() {
        let file = r#"{ "api_key": "from-file", "model": "custom-model" }"#;
        let settings = Settings::from_sources(Some(file), env_of(&[]));
        assert_eq!(settings.api_key.as_deref(), Some("from-file"));
        assert_eq!(settings.model, "custom-model");
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = r#"{ "api_key": "from-file" }"#;
        let settings = Settings::from_sources(
            Some(file),
            env_of(&[
                ("API_KEY", "generic"),
                ("GEMINI_API_KEY", "gemini"),
                ("FOCUS_AI_ENDPOINT", "http://127.0.0.1:9000/v1/"),
            ]),
        );
        assert_eq!(settings.api_key.as_deref(), Some("gemini"));
        assert_eq!(settings.endpoint, "http://127.0.0.1:9000/v1");
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let settings = Settings::from_sources(Some("{ nope"), env_of(&[("API_KEY", "k")]));
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_blank_key_is_missing() {
        let settings = Settings::from_sources(None, env_of(&[("API_KEY", "   ")]));
        assert!(settings.api_key.is_none());
    }
}
