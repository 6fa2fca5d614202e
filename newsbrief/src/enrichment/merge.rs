use std::collections::HashMap;

use super::{EnrichmentRecord, Locale, NewsItem, MAX_TAGS};
use crate::aggregator::AggregatedItem;

/// Join records onto items by index. Output has the same length and order as
/// `items`; when several records share an index the last one wins, and
/// records pointing outside `items` are ignored.
pub fn merge(
    items: &[AggregatedItem],
    records: &[EnrichmentRecord],
    category: &str,
    locale: Locale,
) -> Vec<NewsItem> {
    let by_index: HashMap<usize, &EnrichmentRecord> =
        records.iter().map(|record| (record.index, record)).collect();

    items
        .iter()
        .map(|item| {
            let (summary, mut tags) = match by_index.get(&item.index) {
                Some(record) => {
                    let summary = if record.summary.trim().is_empty() {
                        locale.related_news(&item.title)
                    } else {
                        record.summary.clone()
                    };
                    let tags = if record.tags.is_empty() {
                        vec![category.to_string()]
                    } else {
                        record.tags.clone()
                    };
                    (summary, tags)
                }
                None => (locale.related_news(&item.title), vec![category.to_string()]),
            };
            tags.truncate(MAX_TAGS);

            NewsItem {
                title: item.title.clone(),
                summary,
                link: item.link.clone(),
                tags,
                published: item.published.clone(),
            }
        })
        .collect()
}
