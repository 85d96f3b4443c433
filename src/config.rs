//! Runtime configuration
//!
//! Loaded from YAML (`<config_dir>/legai/config.yaml` by default). Every
//! field has a default, so a missing file yields a working offline setup.
//! `GEMINI_API_KEY` in the environment overrides `api_key`.

use crate::backend::{
    GeminiBackend, GeminiSettings, MockBackend, ReviewBackend, DEFAULT_GEMINI_API_BASE,
    DEFAULT_GEMINI_MODEL,
};
use crate::language::{is_supported, DEFAULT_LANGUAGE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("gemini backend requires an API key (set GEMINI_API_KEY or api_key)")]
    MissingApiKey,
    #[error("unsupported default language: {0}")]
    UnsupportedLanguage(String),
    #[error("request_timeout_secs must be at least 1")]
    ZeroTimeout,
    #[error("failed to initialize backend: {0}")]
    Backend(String),
}

/// Which `ReviewBackend` to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Mock,
    Gemini,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub backend: BackendKind,
    pub model: String,
    pub api_base: String,
    pub api_key: Option<String>,
    pub default_language: String,
    pub request_timeout_secs: u64,
    pub mock_analysis_delay_ms: u64,
    pub mock_chat_delay_ms: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Mock,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            api_key: None,
            default_language: DEFAULT_LANGUAGE.to_string(),
            request_timeout_secs: 60,
            mock_analysis_delay_ms: 2500,
            mock_chat_delay_ms: 1500,
        }
    }
}

/// Default config location (~/.config/legai/config.yaml on Linux)
pub fn default_config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
    config_dir.join("legai").join("config.yaml")
}

impl ReviewConfig {
    /// Parse YAML text; missing keys take their defaults.
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: ReviewConfig = serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An absent default file is not an error; an absent explicit path is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path(), false),
        };

        let mut config = match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_yaml(&text, &path)?,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !is_supported(&self.default_language) {
            return Err(ConfigError::UnsupportedLanguage(self.default_language.clone()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Construct the configured backend.
    pub fn build_backend(&self) -> Result<Arc<dyn ReviewBackend>, ConfigError> {
        match self.backend {
            BackendKind::Mock => Ok(Arc::new(MockBackend::new().with_delays(
                Duration::from_millis(self.mock_analysis_delay_ms),
                Duration::from_millis(self.mock_chat_delay_ms),
            ))),
            BackendKind::Gemini => {
                let api_key = self
                    .api_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .ok_or(ConfigError::MissingApiKey)?;
                let settings = GeminiSettings {
                    api_key: api_key.to_string(),
                    model: self.model.clone(),
                    api_base: self.api_base.clone(),
                    timeout: self.request_timeout(),
                    ..GeminiSettings::new(api_key)
                };
                let backend = GeminiBackend::new(settings)
                    .map_err(|e| ConfigError::Backend(e.to_string()))?;
                Ok(Arc::new(backend))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = ReviewConfig::from_yaml(
            "backend: gemini\nmodel: gemini-1.5-pro\n",
            Path::new("inline"),
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Gemini);
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.default_language, "en");
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn invalid_language_is_rejected() {
        let err = ReviewConfig::from_yaml("default_language: xx\n", Path::new("inline")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedLanguage(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ReviewConfig::from_yaml("request_timeout_secs: 0\n", Path::new("inline")).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let err = ReviewConfig::from_yaml("backend: [", Path::new("/etc/legai.yaml")).unwrap_err();
        assert!(err.to_string().contains("/etc/legai.yaml"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReviewConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "request_timeout_secs: 5\nmock_chat_delay_ms: 0\n").unwrap();

        let config = ReviewConfig::load(Some(&path)).unwrap();
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.mock_chat_delay_ms, 0);
        assert_eq!(config.backend, BackendKind::Mock);
    }

    #[test]
    fn gemini_without_key_fails() {
        let config = ReviewConfig {
            backend: BackendKind::Gemini,
            api_key: Some("   ".to_string()),
            ..ReviewConfig::default()
        };
        assert!(matches!(config.build_backend(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn mock_backend_builds() {
        let backend = ReviewConfig::default().build_backend().unwrap();
        assert_eq!(backend.name(), "mock");
    }
}
