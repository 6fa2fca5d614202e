use anyhow::{Context, Result};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// One headline as delivered by a feed, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    /// Source-dependent timestamp text, may be empty.
    pub published: String,
    /// May contain markup.
    pub description: String,
}

/// Outcome of fetching one feed URL that answered.
#[derive(Debug, Clone)]
pub enum FeedFetch {
    Parsed(Vec<RawEntry>),
    /// The body could not be parsed as RSS/Atom.
    Malformed(String),
}

impl FeedFetch {
    /// Entries contributed by this fetch (none when malformed).
    pub fn into_entries(self) -> Vec<RawEntry> {
        match self {
            FeedFetch::Parsed(entries) => entries,
            FeedFetch::Malformed(_) => Vec::new(),
        }
    }
}

/// Capability: fetch and parse a single feed URL.
///
/// `Err` means the source could not be reached at all; a reachable source
/// with an unparseable body is `Ok(FeedFetch::Malformed)`.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeedFetch>;
}

/// HTTP feed source backed by reqwest + feed-rs.
pub struct HttpFeedSource {
    client: Client,
    max_retries: u32,
}

impl HttpFeedSource {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            client,
            max_retries: 3,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Fetches the raw feed body, retrying on 5xx, 429 and network errors.
    async fn fetch_body(&self, url: &str) -> Result<Vec<u8>> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let backoff = Duration::from_secs(2u64.pow(attempt - 2)); // 1s, 2s, 4s...
                info!("Retrying feed fetch for {} (attempt {}/{}) after {:?}...", url, attempt, self.max_retries, backoff);
                tokio::time::sleep(backoff).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes = response.bytes().await.context("failed to read response body")?;
                        return Ok(bytes.to_vec());
                    } else if status.is_server_error() {
                        last_error = Some(anyhow::anyhow!("server error: {}", status));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(anyhow::anyhow!("rate limited: {}", status));
                    } else {
                        // Other 4xx are permanent
                        return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
                    }
                }
                Err(e) => {
                    last_error = Some(anyhow::Error::new(e).context("network error during fetch"));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error after retries")))
    }
}

#[async_trait::async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<FeedFetch> {
        let body = self.fetch_body(url).await?;
        Ok(parse_feed(&body))
    }
}

/// Parse an RSS/Atom document into raw entries.
pub fn parse_feed(body: &[u8]) -> FeedFetch {
    match parser::parse(body) {
        Ok(feed) => {
            debug!("parsed feed with {} entries", feed.entries.len());
            FeedFetch::Parsed(feed.entries.into_iter().map(raw_entry_from).collect())
        }
        Err(e) => FeedFetch::Malformed(e.to_string()),
    }
}

fn raw_entry_from(entry: Entry) -> RawEntry {
    let title = entry
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "No Title".to_string());

    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let published = entry
        .published
        .or(entry.updated)
        .map(|d| d.to_rfc2822())
        .unwrap_or_default();

    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    RawEntry {
        title,
        link,
        published,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <link>https://example.com</link>
    <description>Test feed</description>
    <item>
      <title>First headline</title>
      <link>https://example.com/a</link>
      <pubDate>Mon, 06 Jan 2025 09:00:00 GMT</pubDate>
      <description>&lt;p&gt;Body of the first story&lt;/p&gt;</description>
    </item>
    <item>
      <link>https://example.com/b</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_maps_entries() {
        let entries = match parse_feed(RSS.as_bytes()) {
            FeedFetch::Parsed(entries) => entries,
            FeedFetch::Malformed(e) => panic!("unexpected malformed feed: {}", e),
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "First headline");
        assert_eq!(entries[0].link, "https://example.com/a");
        assert!(entries[0].published.contains("Jan 2025"));
        assert!(entries[0].description.contains("Body of the first story"));

        assert_eq!(entries[1].title, "No Title");
        assert_eq!(entries[1].published, "");
        assert_eq!(entries[1].description, "");
    }

    #[test]
    fn test_parse_feed_malformed() {
        let fetch = parse_feed(b"<html><body>not a feed</body></html>");
        assert!(matches!(fetch, FeedFetch::Malformed(_)));
        assert!(fetch.into_entries().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let unavailable = server
            .mock("GET", "/feed.xml")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/feed.xml")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(RSS)
            .expect(1)
            .create_async()
            .await;

        let source = HttpFeedSource::new(5, "Newsbrief-test/0.1").unwrap().with_max_retries(2);
        let fetch = source.fetch(&format!("{}/feed.xml", server.url())).await.unwrap();

        assert!(matches!(fetch, FeedFetch::Parsed(ref entries) if entries.len() == 2));
        unavailable.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let missing = server
            .mock("GET", "/feed.xml")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let source = HttpFeedSource::new(5, "Newsbrief-test/0.1").unwrap().with_max_retries(3);
        let err = source.fetch(&format!("{}/feed.xml", server.url())).await.unwrap_err();

        assert!(err.to_string().contains("404"));
        missing.assert_async().await;
    }
}
