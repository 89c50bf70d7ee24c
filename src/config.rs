//! Sources file loading and validation.
//!
//! The sources file maps a source name to its settings:
//!
//! ```json
//! {
//!   "Reuters": { "link": "https://www.reuters.com", "rss": "https://www.reuters.com/rss" },
//!   "Example": { "link": "https://example.com" }
//! }
//! ```
//!
//! JSON is the default; files ending in `.yaml`/`.yml` are read as YAML.
//! Declaration order is preserved and decides processing order.
//!
//! Validation runs in two passes. The first checks every entry for a
//! `link` and fails the whole load before any network activity. The second
//! probes each declared feed and demotes sources whose feed is unreachable
//! or empty to site-crawl mode.

use crate::error::ConfigError;
use crate::feed::FeedSource;
use crate::models::{RunConfiguration, SourceConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// A source entry exactly as written in the sources file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSourceConfig {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub rss: Option<String>,
}

impl From<&SourceConfig> for RawSourceConfig {
    fn from(source: &SourceConfig) -> Self {
        Self {
            link: Some(source.link.clone()),
            rss: source.feed_url.clone(),
        }
    }
}

/// Named raw entries in declaration order.
pub type RawSources = Vec<(String, RawSourceConfig)>;

/// On-disk format of the sources file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcesFormat {
    Json,
    Yaml,
}

impl SourcesFormat {
    /// YAML for `.yaml`/`.yml`, JSON for everything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Read and parse the sources file at `path`.
#[instrument(level = "info")]
pub async fn load_sources(path: &str) -> Result<RawSources, ConfigError> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let raw = parse_sources(&contents, SourcesFormat::from_path(Path::new(path))).map_err(
        |e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_string(),
                message,
            },
            other => other,
        },
    )?;
    info!(count = raw.len(), "Loaded source entries");
    Ok(raw)
}

/// Parse sources file contents into named raw entries.
pub fn parse_sources(contents: &str, format: SourcesFormat) -> Result<RawSources, ConfigError> {
    let value: Value = match format {
        SourcesFormat::Json => serde_json::from_str(contents).map_err(|e| parse_error(e.to_string()))?,
        SourcesFormat::Yaml => serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string()))?,
    };
    let Value::Object(map) = value else {
        return Err(ConfigError::NotAMapping);
    };
    raw_entries(map)
}

fn parse_error(message: String) -> ConfigError {
    ConfigError::Parse {
        path: String::new(),
        message,
    }
}

fn raw_entries(map: Map<String, Value>) -> Result<RawSources, ConfigError> {
    map.into_iter()
        .map(|(name, value)| {
            if !value.is_object() {
                return Err(ConfigError::InvalidEntry { source_name: name });
            }
            match serde_json::from_value::<RawSourceConfig>(value) {
                Ok(raw) => Ok((name, raw)),
                Err(_) => Err(ConfigError::InvalidEntry { source_name: name }),
            }
        })
        .collect()
}

/// Structural checks only; no network activity.
///
/// Every entry needs a non-empty `link`. A blank `rss` counts as absent.
pub fn check_sources(raw: RawSources) -> Result<Vec<SourceConfig>, ConfigError> {
    raw.into_iter()
        .map(|(name, entry)| {
            let link = entry
                .link
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .ok_or_else(|| ConfigError::MissingLink {
                    source_name: name.clone(),
                })?;
            let feed_url = entry
                .rss
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty());
            Ok(SourceConfig {
                name,
                link,
                feed_url,
            })
        })
        .collect()
}

/// Build the run configuration, probing every declared feed.
///
/// Feeds that fail to parse or list no entries are dropped with a warning;
/// that source will be crawled instead. Only structural problems and an
/// invalid limit fail the load.
#[instrument(level = "info", skip_all, fields(sources = raw.len(), article_limit = article_limit))]
pub async fn validate_sources<F: FeedSource>(
    raw: RawSources,
    article_limit: usize,
    feeds: &F,
) -> Result<RunConfiguration, ConfigError> {
    if article_limit == 0 {
        return Err(ConfigError::InvalidLimit(article_limit));
    }

    let mut sources = check_sources(raw)?;
    for source in sources.iter_mut() {
        let Some(feed_url) = source.feed_url.as_deref() else {
            continue;
        };
        if !feeds.validate_feed(feed_url).await {
            warn!(
                source = %source.name,
                feed = %feed_url,
                "Invalid RSS feed, falling back to direct scraping"
            );
            source.feed_url = None;
        }
    }

    let feed_count = sources.iter().filter(|s| s.feed_url.is_some()).count();
    info!(
        total = sources.len(),
        feed = feed_count,
        crawl = sources.len() - feed_count,
        "Configuration validated"
    );
    Ok(RunConfiguration {
        sources,
        article_limit,
    })
}
