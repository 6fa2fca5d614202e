use super::{Locale, NewsItem};
use crate::aggregator::AggregatedItem;

/// Feed descriptions at or below this many characters are not used as summaries.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

/// Non-LLM output with the same shape as [`super::merge::merge`]: the feed's
/// own description when it is substantial, a templated phrase otherwise, and
/// the category as the only tag.
pub fn fallback(items: &[AggregatedItem], category: &str, locale: Locale) -> Vec<NewsItem> {
    items
        .iter()
        .map(|item| {
            let summary = if item.short_description.chars().count() > MIN_DESCRIPTION_CHARS {
                item.short_description.clone()
            } else {
                locale.latest_news(&item.title)
            };

            NewsItem {
                title: item.title.clone(),
                summary,
                link: item.link.clone(),
                tags: vec![category.to_string()],
                published: item.published.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::test_support::item;

    #[test]
    fn test_uses_long_description() {
        let desc = "政府は来年度予算案を閣議決定し、総額は過去最大となった。";
        let items = vec![item(0, "予算案", desc)];

        let news = fallback(&items, "政治", Locale::Ja);

        assert_eq!(news[0].summary, desc);
        assert_eq!(news[0].tags, vec!["政治"]);
    }

    #[test]
    fn test_short_description_uses_template() {
        // Exactly 20 characters is not enough.
        let items = vec![item(0, "予算案", &"あ".repeat(20)), item(1, "Rates", "")];

        let news = fallback(&items, "政治", Locale::Ja);

        assert_eq!(news[0].summary, "予算案に関する最新ニュース");
        assert_eq!(news[1].summary, "Ratesに関する最新ニュース");
    }

    #[test]
    fn test_order_and_length_preserved() {
        let items: Vec<_> = (0..4).map(|i| item(i, &format!("t{}", i), "")).collect();

        let news = fallback(&items, "Tech", Locale::En);

        assert_eq!(news.len(), 4);
        for (i, n) in news.iter().enumerate() {
            assert_eq!(n.title, format!("t{}", i));
            assert_eq!(n.tags, vec!["Tech"]);
            assert!(!n.summary.is_empty());
        }
    }
}
