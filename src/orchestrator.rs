//! Batch orchestration across all configured sources.
//!
//! Sources are processed one at a time in declaration order. Each source is
//! its own failure boundary: a strategy error drops that source from the
//! snapshot, records its name, and the batch moves on. The [`BatchResult`]
//! accumulator lives here and nowhere else; strategies only return values.

use crate::error::SourceError;
use crate::extract::ArticleExtractor;
use crate::feed::FeedSource;
use crate::models::{BatchResult, RunConfiguration, SourceConfig, SourceResult};
use crate::strategies::{Strategy, crawl, feed};
use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument};

/// Run every configured source and collect the results.
///
/// Always completes, even when every source fails; the failed names are in
/// [`BatchResult::failed_sources`].
#[instrument(level = "info", skip_all, fields(sources = config.sources.len(), article_limit = config.article_limit))]
pub async fn run_batch<F: FeedSource, E: ArticleExtractor>(
    config: &RunConfiguration,
    feeds: &F,
    extractor: &E,
) -> BatchResult {
    let limit = config.article_limit;
    let batch = stream::iter(config.sources.iter())
        .then(|source| async move { (source, process_source(source, limit, feeds, extractor).await) })
        .fold(BatchResult::default(), |mut batch, (source, outcome)| async move {
            match outcome {
                Ok(result) => {
                    batch.newspapers.insert(source.name.clone(), result);
                }
                Err(_) => batch.failed_sources.push(source.name.clone()),
            }
            batch
        })
        .await;

    info!(
        succeeded = batch.newspapers.len(),
        failed = batch.failed_sources.len(),
        articles = batch.article_count(),
        "Batch complete"
    );
    batch
}

/// Dispatch one source to its strategy.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn process_source<F: FeedSource, E: ArticleExtractor>(
    source: &SourceConfig,
    limit: usize,
    feeds: &F,
    extractor: &E,
) -> Result<SourceResult, SourceError> {
    let strategy = Strategy::for_source(source);
    info!(strategy = strategy.name(), link = %source.link, "Processing source");

    let outcome = match strategy {
        Strategy::Feed { feed_url } => {
            feed::ingest_feed(source, feed_url, limit, feeds, extractor).await
        }
        Strategy::SiteCrawl => crawl::crawl_site(source, limit, extractor).await,
    };
    if let Err(e) = &outcome {
        error!(error = %e, "Failed to process {}", source.name);
    }
    outcome
}
