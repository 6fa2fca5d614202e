//! Manual check: aggregate categories from the live feeds and print what the
//! LLM would be asked about. Pass category labels as arguments, or none for all.

use std::sync::Arc;

use newsbrief::aggregator::Aggregator;
use newsbrief::categories::{CategoryCatalog, SearchFeed};
use newsbrief::ingestion::HttpFeedSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let catalog = CategoryCatalog::default();
    let requested: Vec<String> = std::env::args().skip(1).collect();
    let labels = if requested.is_empty() { catalog.labels() } else { requested };

    let source = HttpFeedSource::new(10, "Newsbrief/0.1.0")?;
    let aggregator = Aggregator::new(Arc::new(source), SearchFeed::default());

    for label in labels {
        println!("\n{}", "=".repeat(60));
        println!("Category: {}", label);
        println!("{}", "=".repeat(60));

        let Some(category) = catalog.resolve(&label) else {
            println!("✗ Unknown category");
            continue;
        };

        match aggregator.aggregate(category).await {
            Ok(items) => {
                println!("✓ {} items", items.len());
                for item in &items {
                    println!("  {}. {}", item.index, item.title);
                    println!("     URL: {}", if item.link.is_empty() { "none" } else { item.link.as_str() });
                    println!("     Description: {} chars", item.short_description.chars().count());
                }
            }
            Err(e) => {
                println!("✗ Failed: {}", e);
            }
        }
    }

    Ok(())
}
