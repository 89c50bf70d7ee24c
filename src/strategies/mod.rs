//! Per-source ingestion strategies.
//!
//! Each strategy turns one validated source into a [`SourceResult`]:
//!
//! | Strategy | Module | Used when | Discovery |
//! |----------|--------|-----------|-----------|
//! | Feed | [`feed`] | a validated feed URL is present | feed entries, in feed order |
//! | Site crawl | [`crawl`] | no usable feed | links found on the homepage |
//!
//! # Common rules
//!
//! - At most `limit` articles are kept per source.
//! - Every article is one isolated unit of work returning
//!   `Result<Article, ArticleError>`; a failed article is logged and skipped.
//! - Only failures that make the whole source unusable (feed or homepage
//!   unavailable) come back as [`SourceError`](crate::error::SourceError).
//!
//! [`SourceResult`]: crate::models::SourceResult

pub mod crawl;
pub mod feed;

use crate::models::SourceConfig;

/// Which strategy a source is processed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy<'a> {
    Feed { feed_url: &'a str },
    SiteCrawl,
}

impl<'a> Strategy<'a> {
    /// Feed ingestion iff validation kept the source's feed.
    pub fn for_source(source: &'a SourceConfig) -> Self {
        match source.feed_url.as_deref() {
            Some(feed_url) => Self::Feed { feed_url },
            None => Self::SiteCrawl,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Feed { .. } => "feed",
            Self::SiteCrawl => "site_crawl",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selection() {
        let mut source = SourceConfig {
            name: "A".into(),
            link: "http://a.test".into(),
            feed_url: Some("http://a.test/feed".into()),
        };
        assert_eq!(
            Strategy::for_source(&source),
            Strategy::Feed {
                feed_url: "http://a.test/feed"
            }
        );
        source.feed_url = None;
        assert_eq!(Strategy::for_source(&source), Strategy::SiteCrawl);
        assert_eq!(Strategy::for_source(&source).name(), "site_crawl");
    }
}
