//! Feed-based ingestion.
//!
//! Walks the feed in document order. Entries without a publish field are
//! never extracted. Stops as soon as `limit` articles have been kept.

use crate::error::{ArticleError, SourceError};
use crate::extract::ArticleExtractor;
use crate::feed::FeedSource;
use crate::models::{Article, FeedEntry, SourceConfig, SourceResult};
use crate::utils::{normalize_timestamp, truncate_for_log};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument};

/// Harvest up to `limit` articles for `source` from `feed_url`.
///
/// # Errors
///
/// [`SourceError::Feed`] if the feed itself cannot be fetched or parsed.
/// Individual article failures are logged and skipped.
#[instrument(level = "info", skip(source, feeds, extractor), fields(source = %source.name))]
pub async fn ingest_feed<F: FeedSource, E: ArticleExtractor>(
    source: &SourceConfig,
    feed_url: &str,
    limit: usize,
    feeds: &F,
    extractor: &E,
) -> Result<SourceResult, SourceError> {
    let entries = feeds.fetch_feed(feed_url).await?;
    info!(entries = entries.len(), "Downloading articles from {}", source.name);

    let mut result = SourceResult::new(source, Some(feed_url.to_string()));
    let mut recorded: HashSet<String> = HashSet::new();
    let mut undated = 0usize;
    let mut duplicates = 0usize;
    let mut failed = 0usize;

    for entry in entries {
        if result.articles.len() >= limit {
            break;
        }
        if entry.published.is_none() {
            debug!(url = %entry.link, "Feed entry has no publish date; skipping");
            undated += 1;
            continue;
        }
        if recorded.contains(&entry.link) {
            debug!(url = %entry.link, "Feed entry already recorded; skipping");
            duplicates += 1;
            continue;
        }

        match fetch_entry(&entry, extractor).await {
            Ok(article) => {
                recorded.insert(article.link.clone());
                result.articles.push(article);
                info!(
                    count = result.articles.len(),
                    url = %entry.link,
                    "Article downloaded from {}", source.name
                );
            }
            Err(e) => {
                failed += 1;
                error!(
                    url = %entry.link,
                    error = %truncate_for_log(&e.to_string(), 300),
                    "Error downloading article from {}; continuing to next article", source.name
                );
            }
        }
    }

    info!(
        kept = result.articles.len(),
        undated,
        duplicates,
        failed,
        "Finished feed ingestion"
    );
    Ok(result)
}

/// One entry, one unit of work: normalize the date, then extract.
async fn fetch_entry<E: ArticleExtractor>(
    entry: &FeedEntry,
    extractor: &E,
) -> Result<Article, ArticleError> {
    let raw = entry.published.as_deref().unwrap_or_default();
    let published =
        normalize_timestamp(raw).ok_or_else(|| ArticleError::InvalidDate(raw.to_string()))?;

    let content = extractor.extract_article(&entry.link).await?;
    Ok(Article {
        link: entry.link.clone(),
        published,
        title: content.title,
        text: content.text,
    })
}
