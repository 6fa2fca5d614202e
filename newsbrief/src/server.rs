use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{get, routes, Build, Request, Response, Rocket, State};
use serde::Serialize;

use common::Config;

use crate::enrichment::NewsItem;
use crate::pipeline::NewsPipeline;

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub pipeline: Arc<NewsPipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<NewsPipeline>) -> Self {
        Self {
            started_at: Utc::now(),
            pipeline,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (Status, Json<ErrorBody>);

fn api_error(status: Status, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

/// Response structure for `/api/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    llm_configured: bool,
    categories: usize,
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

#[get("/api/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        llm_configured: state.pipeline.llm().is_configured(),
        categories: state.pipeline.catalog().labels().len(),
    })
}

/// Supported category labels, in catalog order.
#[get("/api/categories")]
async fn categories(state: &State<AppState>) -> Json<Vec<String>> {
    Json(state.pipeline.catalog().labels())
}

/// Enriched headlines for one category. Unknown categories are rejected
/// before any feed is fetched.
#[get("/api/news?<category>")]
async fn news(
    state: &State<AppState>,
    category: Option<String>,
) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let Some(category) = category
        .as_deref()
        .and_then(|label| state.pipeline.catalog().resolve(label))
    else {
        return Err(api_error(Status::BadRequest, "Invalid category"));
    };

    match state.pipeline.build(category).await {
        Ok(items) => Ok(Json(items)),
        Err(e) => {
            tracing::error!(category = %category.label, "news request failed: {}", e);
            Err(api_error(Status::InternalServerError, e.to_string()))
        }
    }
}

/// Adds a permissive `Access-Control-Allow-Origin` header to every response.
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _req: &'r Request<'_>, res: &mut Response<'r>) {
        res.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        res.set_header(Header::new("Access-Control-Allow-Methods", "GET, OPTIONS"));
    }
}

/// Build the Rocket instance, applying `[server]` bind/port/static_dir/cors.
pub fn build_rocket(state: AppState, config: &Config) -> Rocket<Build> {
    let server = config.server.clone().unwrap_or_default();

    let mut fig = rocket::Config::figment();
    if let Some(bind) = &server.bind {
        fig = fig.merge(("address", bind.clone()));
    }
    if let Some(port) = server.port {
        fig = fig.merge(("port", port));
    }

    let mut rocket = rocket::custom(fig)
        .manage(state)
        .mount("/", routes![health, status, categories, news]);

    if server.cors.unwrap_or(true) {
        rocket = rocket.attach(Cors);
    }

    if let Some(dir) = server.static_dir.as_deref() {
        if Path::new(dir).is_dir() {
            tracing::info!(dir, "serving static files");
            rocket = rocket.mount("/", FileServer::from(dir));
        } else {
            tracing::warn!(dir, "static_dir not found, static files disabled");
        }
    }

    rocket
}

/// Run the HTTP server until shutdown (SIGINT/SIGTERM etc.).
pub async fn launch_rocket(pipeline: Arc<NewsPipeline>, config: &Config) -> Result<()> {
    let rocket = build_rocket(AppState::new(pipeline), config);

    tracing::info!("Starting Rocket HTTP server");
    rocket
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
