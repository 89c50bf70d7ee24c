//! Error types for each layer of the ingestion pipeline.
//!
//! Configuration and snapshot errors are fatal and surface from `main`.
//! Feed, extraction and article errors are absorbed at the article or source
//! boundary and only ever show up in the logs.

use thiserror::Error;

/// Errors raised while loading or validating the sources file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("config file must contain a mapping of source name to source settings")]
    NotAMapping,

    #[error("configuration item {source_name} is not an object")]
    InvalidEntry { source_name: String },

    #[error("configuration item {source_name} missing obligatory 'link'")]
    MissingLink { source_name: String },

    #[error("article limit must be at least 1, got {0}")]
    InvalidLimit(usize),
}

/// Errors raised while fetching or parsing a syndication feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} when fetching {url}")]
    Status { status: u16, url: String },

    #[error("XML parse error: {0}")]
    Xml(String),
}

/// Errors raised while discovering or extracting a single article.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} when fetching {url}")]
    Status { status: u16, url: String },

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("no title or text could be extracted from {0}")]
    EmptyContent(String),
}

/// Per-article failure. Always skipped by the strategies, never fatal.
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("unparseable publish date '{0}'")]
    InvalidDate(String),
}

/// Failure of a whole source. Recorded by the orchestrator, never fatal.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("feed unavailable: {0}")]
    Feed(#[from] FeedError),

    #[error("site discovery failed: {0}")]
    Discovery(#[from] ExtractionError),
}

/// Errors raised while persisting the snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{operation} '{path}': {source}")]
    Io {
        operation: &'static str,
        path: String,
        source: std::io::Error,
    },
}
