/*
newsbrief - single-binary main.rs
This binary loads configuration and starts the Rocket HTTP server that serves
category headlines with batched LLM summaries.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newsbrief::llm::handle::{usable_api_key, DEFAULT_API_KEY_ENV};
use newsbrief::pipeline::NewsPipeline;
use newsbrief::server::launch_rocket;

#[derive(Parser, Debug)]
#[command(name = "newsbrief", about = "Newsbrief category news server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // The LLM credential may live in a .env file next to the binary
    if dotenv::dotenv().is_ok() {
        info!("loaded environment from .env");
    }

    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = match Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("failed to load configuration: {:#}", e);
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    report_llm_credential(&config);

    let pipeline = Arc::new(NewsPipeline::from_config(&config)?);
    info!(categories = ?pipeline.catalog().labels(), "category catalog ready");

    launch_rocket(pipeline, &config).await
}

/// Startup notice only; the provider itself is built on the first news request.
fn report_llm_credential(config: &Config) {
    let Some(remote) = config.remote_llm() else {
        warn!("LLM adapter disabled: all summaries come from feed text");
        return;
    };
    let key_env = remote.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
    if usable_api_key(std::env::var(key_env).ok()).is_some() {
        info!(
            "LLM API key configured ({}); one LLM request per category change, mind the provider's daily quota",
            key_env
        );
    } else {
        warn!("{} not configured: summaries fall back to feed descriptions", key_env);
    }
}
