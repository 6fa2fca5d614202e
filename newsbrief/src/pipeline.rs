use std::sync::Arc;

use anyhow::Result;
use common::Config;
use tracing::info;

use crate::aggregator::{AggregateError, Aggregator, DEFAULT_TARGET_COUNT};
use crate::categories::{Category, CategoryCatalog, SearchFeed};
use crate::enrichment::{self, Locale, NewsItem};
use crate::ingestion::{FeedSource, HttpFeedSource};
use crate::llm::LlmHandle;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Category request -> enriched (or fallback) headlines.
pub struct NewsPipeline {
    catalog: CategoryCatalog,
    aggregator: Aggregator,
    llm: LlmHandle,
    locale: Locale,
}

impl NewsPipeline {
    pub fn new(catalog: CategoryCatalog, aggregator: Aggregator, llm: LlmHandle) -> Self {
        Self {
            catalog,
            aggregator,
            llm,
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Wire the HTTP feed source, catalog and lazily-built LLM from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let feeds = config.feeds.as_ref();
        let timeout = feeds.and_then(|f| f.timeout_seconds).unwrap_or(10);
        let user_agent = feeds
            .and_then(|f| f.user_agent.clone())
            .unwrap_or_else(|| format!("Newsbrief/{}", env!("CARGO_PKG_VERSION")));
        let source = HttpFeedSource::new(timeout, &user_agent)?
            .with_max_retries(feeds.and_then(|f| f.max_retries).unwrap_or(3));

        let aggregator = Aggregator::new(Arc::new(source) as Arc<dyn FeedSource>, SearchFeed::from_config(feeds))
            .with_target_count(feeds.and_then(|f| f.target_count).unwrap_or(DEFAULT_TARGET_COUNT));

        let locale = config
            .news
            .as_ref()
            .and_then(|n| n.locale.as_deref())
            .map(Locale::from_code)
            .unwrap_or_default();

        Ok(Self::new(
            CategoryCatalog::from_config(&config.categories),
            aggregator,
            LlmHandle::from_config(config.remote_llm()),
        )
        .with_locale(locale))
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn llm(&self) -> &LlmHandle {
        &self.llm
    }

    /// Aggregate `category` and enrich it with at most one LLM call.
    /// Enrichment failures are absorbed by the fallback path.
    pub async fn build(&self, category: &Category) -> Result<Vec<NewsItem>, PipelineError> {
        let items = self.aggregator.aggregate(category).await?;
        info!(category = %category.label, items = items.len(), "building news digest");
        Ok(enrichment::enrich_or_fallback(&self.llm, &items, &category.label, self.locale).await)
    }
}
