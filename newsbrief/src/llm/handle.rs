//! Process-scoped LLM handle, built on first use.

use std::sync::Arc;

use common::RemoteLlmConfig;
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use super::remote::{RemoteLlmProvider, DEFAULT_API_URL, DEFAULT_MODEL};
use super::LlmProvider;

pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Value shipped in sample `.env` files; treated as "not configured".
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Lazily-initialised provider. The first call to [`LlmHandle::provider`]
/// resolves the credential; the outcome (including "not configured") is kept
/// for the lifetime of the handle.
pub struct LlmHandle {
    settings: Option<RemoteLlmConfig>,
    provider: OnceCell<Option<Arc<dyn LlmProvider>>>,
}

impl LlmHandle {
    /// `None` settings means the LLM is switched off in configuration.
    pub fn from_config(settings: Option<RemoteLlmConfig>) -> Self {
        Self {
            settings,
            provider: OnceCell::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            settings: None,
            provider: OnceCell::with_value(None),
        }
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            settings: None,
            provider: OnceCell::with_value(Some(provider)),
        }
    }

    pub fn provider(&self) -> Option<Arc<dyn LlmProvider>> {
        self.provider.get_or_init(|| self.init()).clone()
    }

    pub fn is_configured(&self) -> bool {
        self.provider().is_some()
    }

    fn init(&self) -> Option<Arc<dyn LlmProvider>> {
        let Some(settings) = &self.settings else {
            info!("LLM adapter disabled in configuration");
            return None;
        };

        let key_env = settings.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
        let Some(api_key) = usable_api_key(std::env::var(key_env).ok()) else {
            warn!("LLM API key env var '{}' not set or placeholder; summaries use fallback", key_env);
            return None;
        };

        let api_url = settings.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let model = settings.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let provider = RemoteLlmProvider::new(api_url, api_key, model).with_defaults(
            settings.timeout_seconds.unwrap_or(30),
            settings.max_tokens.unwrap_or(2048),
            settings.temperature.unwrap_or(0.5),
        );
        info!("LLM provider initialized: remote ({}) at {}", model, api_url);
        Some(Arc::new(provider))
    }
}

/// A credential is usable when present, non-blank and not the placeholder.
pub fn usable_api_key(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != PLACEHOLDER_API_KEY)
}
