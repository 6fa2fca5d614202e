//! Fixed category catalog and the search feed used for backfill.

use anyhow::{Context, Result};
use common::{CategoryConfig, FeedsConfig};
use url::Url;

const DEFAULT_SEARCH_URL: &str = "https://news.google.com/rss/search";

/// Built-in catalog: Yahoo! News Japan topic feeds.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("政治", "https://news.yahoo.co.jp/rss/topics/domestic.xml"),
    ("経済", "https://news.yahoo.co.jp/rss/topics/business.xml"),
    ("スポーツ", "https://news.yahoo.co.jp/rss/topics/sports.xml"),
    ("テクノロジー", "https://news.yahoo.co.jp/rss/topics/it.xml"),
    ("エンターテイメント", "https://news.yahoo.co.jp/rss/topics/entertainment.xml"),
];

/// A topical label and its primary feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub label: String,
    pub feed_url: String,
}

/// Search feed parameters (Google News RSS search by default).
#[derive(Debug, Clone)]
pub struct SearchFeed {
    pub base_url: String,
    pub hl: String,
    pub gl: String,
    pub ceid: String,
}

impl Default for SearchFeed {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SEARCH_URL.to_string(),
            hl: "ja".to_string(),
            gl: "JP".to_string(),
            ceid: "JP:ja".to_string(),
        }
    }
}

impl SearchFeed {
    pub fn from_config(cfg: Option<&FeedsConfig>) -> Self {
        let defaults = Self::default();
        let Some(cfg) = cfg else {
            return defaults;
        };
        Self {
            base_url: cfg.search_url.clone().unwrap_or(defaults.base_url),
            hl: cfg.search_hl.clone().unwrap_or(defaults.hl),
            gl: cfg.search_gl.clone().unwrap_or(defaults.gl),
            ceid: cfg.search_ceid.clone().unwrap_or(defaults.ceid),
        }
    }

    /// Search feed URL keyed by the category label (label is percent-encoded).
    pub fn url_for(&self, category: &Category) -> Result<String> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("q", category.label.as_str()),
                ("hl", self.hl.as_str()),
                ("gl", self.gl.as_str()),
                ("ceid", self.ceid.as_str()),
            ],
        )
        .with_context(|| format!("invalid search feed URL: {}", self.base_url))?;
        Ok(url.into())
    }
}

/// Order-preserving set of supported categories.
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|(label, url)| Category {
                    label: label.to_string(),
                    feed_url: url.to_string(),
                })
                .collect(),
        }
    }
}

impl CategoryCatalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Configured catalog, or the built-in one when the config lists none.
    pub fn from_config(entries: &[CategoryConfig]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        Self::new(
            entries
                .iter()
                .map(|c| Category {
                    label: c.label.clone(),
                    feed_url: c.feed_url.clone(),
                })
                .collect(),
        )
    }

    pub fn labels(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.label.clone()).collect()
    }

    pub fn resolve(&self, label: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_order() {
        let catalog = CategoryCatalog::default();
        assert_eq!(
            catalog.labels(),
            vec!["政治", "経済", "スポーツ", "テクノロジー", "エンターテイメント"]
        );
    }

    #[test]
    fn test_resolve() {
        let catalog = CategoryCatalog::default();
        assert!(catalog.resolve("経済").is_some());
        assert!(catalog.resolve("Weather").is_none());
        assert!(catalog.resolve("").is_none());
    }

    #[test]
    fn test_config_replaces_catalog() {
        let catalog = CategoryCatalog::from_config(&[CategoryConfig {
            label: "World".to_string(),
            feed_url: "https://example.com/world.xml".to_string(),
        }]);
        assert_eq!(catalog.labels(), vec!["World"]);
        assert!(catalog.resolve("政治").is_none());
    }

    #[test]
    fn test_search_url_encodes_label() {
        let search = SearchFeed::default();
        let category = Category {
            label: "政治".to_string(),
            feed_url: String::new(),
        };
        let url = search.url_for(&category).expect("url");
        assert!(url.starts_with("https://news.google.com/rss/search?q=%E6%94%BF%E6%B2%BB"));
        assert!(url.contains("hl=ja"));
        assert!(url.contains("ceid=JP%3Aja"));
    }
}
