use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::categories::{Category, SearchFeed};
use crate::ingestion::{FeedSource, RawEntry};
use crate::markup;

/// Headlines returned per category unless configured otherwise.
pub const DEFAULT_TARGET_COUNT: usize = 10;

/// A normalized headline. `index` is its position in the aggregated list
/// and the only key used to join enrichment results back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedItem {
    pub index: usize,
    pub title: String,
    pub link: String,
    pub published: String,
    pub short_description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("no feed source reachable for category '{category}': {reason}")]
    SourcesUnavailable { category: String, reason: String },
}

/// Primary feed + search-feed backfill, deduplicated by link.
pub struct Aggregator {
    source: Arc<dyn FeedSource>,
    search: SearchFeed,
    target_count: usize,
}

impl Aggregator {
    pub fn new(source: Arc<dyn FeedSource>, search: SearchFeed) -> Self {
        Self {
            source,
            search,
            target_count: DEFAULT_TARGET_COUNT,
        }
    }

    pub fn with_target_count(mut self, target_count: usize) -> Self {
        self.target_count = target_count;
        self
    }

    pub async fn aggregate(&self, category: &Category) -> Result<Vec<AggregatedItem>, AggregateError> {
        let mut collected = Collected::new(self.target_count);
        let mut transport_errors = Vec::new();

        match self.source.fetch(&category.feed_url).await {
            Ok(fetch) => collected.extend(fetch.into_entries()),
            Err(e) => {
                warn!(category = %category.label, url = %category.feed_url, "primary feed unavailable: {:#}", e);
                transport_errors.push(format!("primary: {:#}", e));
            }
        }
        let primary_count = collected.len();
        let mut sources_queried = 1;

        if !collected.is_full() {
            sources_queried += 1;
            match self.search.url_for(category) {
                Ok(url) => match self.source.fetch(&url).await {
                    Ok(fetch) => collected.extend(fetch.into_entries()),
                    Err(e) => {
                        warn!(category = %category.label, url = %url, "search feed unavailable: {:#}", e);
                        transport_errors.push(format!("search: {:#}", e));
                    }
                },
                Err(e) => {
                    warn!(category = %category.label, "search feed URL rejected: {:#}", e);
                    transport_errors.push(format!("search: {:#}", e));
                }
            }
        }

        if transport_errors.len() == sources_queried {
            return Err(AggregateError::SourcesUnavailable {
                category: category.label.clone(),
                reason: transport_errors.join("; "),
            });
        }

        info!(
            category = %category.label,
            primary = primary_count,
            backfill = collected.len() - primary_count,
            "aggregated headlines"
        );

        Ok(collected.into_items())
    }
}

/// Arrival-ordered entries, capped at the target count.
struct Collected {
    entries: Vec<RawEntry>,
    seen_links: HashSet<String>,
    limit: usize,
}

impl Collected {
    fn new(limit: usize) -> Self {
        Self {
            entries: Vec::with_capacity(limit),
            seen_links: HashSet::new(),
            limit,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_full(&self) -> bool {
        self.entries.len() >= self.limit
    }

    /// Empty links never count as duplicates.
    fn extend(&mut self, entries: Vec<RawEntry>) {
        for entry in entries {
            if self.is_full() {
                break;
            }
            if !entry.link.is_empty() && !self.seen_links.insert(entry.link.clone()) {
                continue;
            }
            self.entries.push(entry);
        }
    }

    fn into_items(self) -> Vec<AggregatedItem> {
        self.entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| AggregatedItem {
                index,
                short_description: markup::short_description(&entry.description),
                title: entry.title,
                link: entry.link,
                published: entry.published,
            })
            .collect()
    }
}
