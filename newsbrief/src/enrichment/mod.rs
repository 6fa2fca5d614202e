//! Batched LLM enrichment of aggregated headlines.
//!
//! One request covers every item of a category; the response is parsed into
//! [`EnrichmentRecord`]s and merged back by index. Any failure along the way
//! degrades to [`fallback::fallback`], which produces the same output shape.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregator::AggregatedItem;
use crate::llm::LlmHandle;

pub mod fallback;
pub mod merge;
pub mod parser;
pub mod requester;

/// Most tags kept on a headline.
pub const MAX_TAGS: usize = 3;

/// Final output unit, one per aggregated item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub tags: Vec<String>,
    pub published: String,
}

/// Validated element of the LLM answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRecord {
    pub index: usize,
    /// Empty when the LLM gave none.
    pub summary: String,
    pub tags: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("LLM is not configured")]
    Unavailable,

    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    #[error("LLM response could not be parsed: {0}")]
    ParseFailed(String),
}

/// Language of the templated phrases and of the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl Locale {
    /// Unknown codes fall back to Japanese.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Locale::En,
            "ja" | "ja-jp" => Locale::Ja,
            other => {
                warn!("unknown locale '{}', using ja", other);
                Locale::Ja
            }
        }
    }

    /// Summary used when an enriched record has none.
    pub fn related_news(self, title: &str) -> String {
        match self {
            Locale::Ja => format!("{}に関するニュース", title),
            Locale::En => format!("{} — related news", title),
        }
    }

    /// Summary used by the fallback path when the feed gave too little text.
    pub fn latest_news(self, title: &str) -> String {
        match self {
            Locale::Ja => format!("{}に関する最新ニュース", title),
            Locale::En => format!("{} — latest news", title),
        }
    }
}

/// Request, parse and merge. Makes exactly one LLM call for a non-empty batch.
pub async fn enrich(
    llm: &LlmHandle,
    items: &[AggregatedItem],
    category: &str,
    locale: Locale,
) -> Result<Vec<NewsItem>, EnrichmentError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let raw = requester::request_enrichment(llm, items, category, locale).await?;
    let records = parser::parse_enrichment(&raw)?;
    Ok(merge::merge(items, &records, category, locale))
}

/// [`enrich`], degrading to [`fallback::fallback`] on any enrichment error.
pub async fn enrich_or_fallback(
    llm: &LlmHandle,
    items: &[AggregatedItem],
    category: &str,
    locale: Locale,
) -> Vec<NewsItem> {
    match enrich(llm, items, category, locale).await {
        Ok(news) => {
            info!(category, count = news.len(), "headlines enriched by LLM");
            news
        }
        Err(EnrichmentError::Unavailable) => {
            info!(category, "LLM not configured, using fallback summaries");
            fallback::fallback(items, category, locale)
        }
        Err(e) => {
            warn!(category, "enrichment failed, using fallback summaries: {}", e);
            fallback::fallback(items, category, locale)
        }
    }
}
