//! Data models for configured sources, extracted articles and the batch
//! snapshot.
//!
//! - [`SourceConfig`] / [`RunConfiguration`]: validated, read-only run input
//! - [`FeedEntry`] / [`ExtractedArticle`]: what the collaborators hand back
//! - [`Article`] / [`SourceResult`] / [`BatchResult`]: the snapshot written
//!   at the end of the run
//!
//! The serialized field names (`newspapers`, `rss`, `link`, `articles`) match
//! the JSON layout consumers of the snapshot already read.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::BTreeMap;

/// Articles kept per source when no `--limit` is given.
pub const DEFAULT_ARTICLE_LIMIT: usize = 4;

/// A validated news source.
///
/// `feed_url` is only present when the declared feed answered with at least
/// one entry during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Unique key taken from the configuration mapping.
    pub name: String,
    /// Homepage URL, never empty.
    pub link: String,
    /// Validated RSS/Atom feed URL.
    pub feed_url: Option<String>,
}

/// Everything a run needs, built once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    /// Sources in the order they were declared.
    pub sources: Vec<SourceConfig>,
    /// Maximum number of articles retained per source.
    pub article_limit: usize,
}

/// One entry of a syndication feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub link: String,
    /// Raw publish field as it appeared in the feed, if any.
    pub published: Option<String>,
}

/// Title, body and optional publish date recovered from an article page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedArticle {
    /// Final URL of the page.
    pub url: String,
    pub title: String,
    pub text: String,
    pub published: Option<DateTime<FixedOffset>>,
}

/// A single harvested article as it appears in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub link: String,
    /// RFC 3339 timestamp.
    pub published: String,
    pub title: String,
    pub text: String,
}

/// Articles harvested from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceResult {
    /// Carried as the mapping key in the snapshot.
    #[serde(skip)]
    pub source_name: String,
    /// Echoes the validated feed when the feed strategy was used.
    #[serde(rename = "rss", skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    pub link: String,
    /// Discovery order, not necessarily chronological.
    pub articles: Vec<Article>,
}

impl SourceResult {
    pub fn new(source: &SourceConfig, feed_url: Option<String>) -> Self {
        Self {
            source_name: source.name.clone(),
            feed_url,
            link: source.link.clone(),
            articles: Vec::new(),
        }
    }
}

/// The outcome of a whole run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Successful sources keyed by name.
    pub newspapers: BTreeMap<String, SourceResult>,
    /// Sources that failed entirely, in processing order. Reported via logs
    /// only.
    #[serde(skip)]
    pub failed_sources: Vec<String>,
}

impl BatchResult {
    /// Total number of articles across all successful sources.
    pub fn article_count(&self) -> usize {
        self.newspapers.values().map(|s| s.articles.len()).sum()
    }
}
