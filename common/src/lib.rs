/*!
common/src/lib.rs

Shared configuration types for Newsbrief.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file
- Default + override loading with a recursive table merge
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// HTTP server configuration section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind (e.g. "127.0.0.1")
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// Directory served at `/` when present (front-end assets)
    pub static_dir: Option<String>,
    /// Add a permissive `Access-Control-Allow-Origin` header (default: true)
    pub cors: Option<bool>,
}

/// Feed fetching and aggregation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// Number of headlines returned per category (default: 10)
    pub target_count: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub user_agent: Option<String>,
    /// Base URL of the search feed used for backfill
    pub search_url: Option<String>,
    pub search_hl: Option<String>,
    pub search_gl: Option<String>,
    pub search_ceid: Option<String>,
}

/// Output presentation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsConfig {
    /// "ja" or "en"; selects the templated summary phrases
    pub locale: Option<String>,
}

/// Remote LLM config (used if `llm.adapter = "remote"`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// LLM top-level config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub adapter: Option<String>, // "remote", "none"
    pub remote: Option<RemoteLlmConfig>,
}

/// One entry of the category catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub label: String,
    pub feed_url: String,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: Option<ServerConfig>,
    pub feeds: Option<FeedsConfig>,
    pub news: Option<NewsConfig>,
    pub llm: Option<LlmConfig>,
    /// Replaces the built-in category catalog when non-empty
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Remote LLM settings. The remote adapter is the default; `None` only when
    /// another adapter (e.g. "none") is selected explicitly.
    pub fn remote_llm(&self) -> Option<RemoteLlmConfig> {
        match &self.llm {
            None => Some(RemoteLlmConfig::default()),
            Some(llm) if llm.adapter.as_deref().unwrap_or("remote") == "remote" => {
                Some(llm.remote.clone().unwrap_or_default())
            }
            Some(_) => None,
        }
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_string() {
        let toml = r#"
            [server]
            port = 5000

            [feeds]
            target_count = 8

            [llm]
            adapter = "remote"

            [llm.remote]
            api_key_env = "GEMINI_API_KEY"
            model = "gemini-flash-latest"

            [[categories]]
            label = "World"
            feed_url = "https://example.com/world.xml"
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert_eq!(cfg.server.as_ref().and_then(|s| s.port), Some(5000));
        assert_eq!(cfg.feeds.as_ref().and_then(|f| f.target_count), Some(8));
        assert_eq!(cfg.categories.len(), 1);
        assert_eq!(cfg.categories[0].label, "World");
        let remote = cfg.remote_llm().expect("remote section");
        assert_eq!(remote.model.as_deref(), Some("gemini-flash-latest"));
    }

    #[test]
    fn empty_config_is_valid() {
        let cfg: Config = toml::from_str("").expect("parse empty config");
        assert!(cfg.server.is_none());
        assert!(cfg.categories.is_empty());
        let remote = cfg.remote_llm().expect("remote adapter is the default");
        assert!(remote.api_key_env.is_none());
    }

    #[test]
    fn adapter_none_disables_remote() {
        let toml = r#"
            [llm]
            adapter = "none"

            [llm.remote]
            model = "gemini-flash-latest"
        "#;
        let cfg: Config = toml::from_str(toml).expect("parse config");
        assert!(cfg.remote_llm().is_none());
    }

    #[tokio::test]
    async fn override_file_takes_precedence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");

        tokio::fs::write(
            &default_path,
            "[server]\nport = 5000\nbind = \"127.0.0.1\"\n\n[news]\nlocale = \"ja\"\n",
        )
        .await
        .expect("write default");
        tokio::fs::write(&override_path, "[server]\nport = 8080\n")
            .await
            .expect("write override");

        let cfg = Config::load_with_defaults(Some(&default_path), Some(&override_path))
            .await
            .expect("load config");

        let server = cfg.server.expect("server section");
        assert_eq!(server.port, Some(8080));
        assert_eq!(server.bind.as_deref(), Some("127.0.0.1"));
        assert_eq!(cfg.news.and_then(|n| n.locale).as_deref(), Some("ja"));
    }

    #[tokio::test]
    async fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        let cfg = Config::load_with_defaults(Some(&missing), None)
            .await
            .expect("load config");
        assert!(cfg.feeds.is_none());
    }
}
