//! # News Snapshot
//!
//! Harvests news articles from a configured list of sources and writes one
//! JSON snapshot per run.
//!
//! ## Features
//!
//! - Uses each source's RSS/Atom feed when it validates, otherwise crawls the
//!   homepage for article links
//! - Extracts title, body text and publish date from every article page
//! - Keeps at most `--limit` articles per source
//! - Skips undated feed entries; abandons crawls that keep producing
//!   undated articles
//! - One broken article or source never aborts the batch
//!
//! ## Usage
//!
//! ```sh
//! news_snapshot NewsPapers.json --limit 4 -o ./snapshots
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: load the sources file and probe declared feeds
//! 2. **Ingestion**: per source, run the feed or site-crawl strategy
//! 3. **Aggregation**: collect per-source results, record failed sources
//! 4. **Output**: write `scraped_articles_MM_DD_YYYY_HH_MM.json`

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extract;
mod feed;
mod http;
mod models;
mod orchestrator;
mod outputs;
mod strategies;
mod utils;

#[cfg(test)]
mod testing;

use cli::Cli;
use config::{load_sources, validate_sources};
use extract::HtmlArticleExtractor;
use feed::HttpFeedClient;
use http::build_client;
use orchestrator::run_batch;
use outputs::json;
use utils::ensure_writable_dir;

/// Console plus optional file logging.
///
/// Returns the error from opening the log file, if any, so it can be logged
/// once the subscriber is in place.
fn init_tracing(log_file: Option<&str>) -> Option<std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file, open_error) = match log_file.map(|path| OpenOptions::new().create(true).append(true).open(path)) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };
    let file_layer = file.map(|file| {
        tfmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_timer(UtcTime::rfc_3339())
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(file_layer)
        .init();

    open_error
}

#[tokio::main]
#[instrument(skip_all)]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    let log_file = (!args.no_log_file).then_some(args.log_file.as_str());
    if let Some(e) = init_tracing(log_file) {
        warn!(path = %args.log_file, error = %e, "Could not open log file; logging to console only");
    }

    let started_at = Local::now();
    let start_time = std::time::Instant::now();
    info!("news_snapshot starting up");
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let raw = load_sources(&args.config).await.map_err(|e| {
        error!(error = %e, "Error parsing config file");
        e
    })?;

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Snapshot directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let client = build_client(Duration::from_secs(args.timeout_secs), &args.user_agent)?;
    let feeds = HttpFeedClient::new(client.clone());
    let extractor = HtmlArticleExtractor::new(client);

    let config = validate_sources(raw, args.limit, &feeds).await.map_err(|e| {
        error!(error = %e, "Error validating config file");
        e
    })?;

    // ---- Ingestion ----
    let batch = run_batch(&config, &feeds, &extractor).await;

    // ---- Output ----
    let path = json::write_snapshot(&batch, &args.output_dir, &started_at)
        .await
        .map_err(|e| {
            error!(error = %e, "Error saving output file");
            e
        })?;

    if !batch.failed_sources.is_empty() {
        warn!(
            count = batch.failed_sources.len(),
            "Failed to process these sites: {}",
            batch.failed_sources.join(", ")
        );
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        path = %path.display(),
        sources = batch.newspapers.len(),
        articles = batch.article_count(),
        "Execution complete"
    );

    Ok(())
}
