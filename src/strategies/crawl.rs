//! Site-crawl ingestion for sources without a usable feed.
//!
//! Candidates come from the homepage in discovery order. An article that
//! extracts cleanly but carries no publish date is discarded yet still
//! spends a quota slot. More than [`UNDATED_TOLERANCE`] undated articles in
//! a row abort the source: its date extraction is assumed to be broken.

use crate::error::SourceError;
use crate::extract::ArticleExtractor;
use crate::models::{Article, ExtractedArticle, SourceConfig, SourceResult};
use crate::utils::{to_iso8601, truncate_for_log};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

/// Consecutive undated articles tolerated before a source is abandoned.
pub const UNDATED_TOLERANCE: usize = 10;

/// Loop state threaded through the crawl by value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CrawlCursor {
    /// Quota slots spent, dated or not.
    spent: usize,
    consecutive_undated: usize,
}

impl CrawlCursor {
    fn quota_reached(&self, limit: usize) -> bool {
        self.spent >= limit
    }

    fn dated(self) -> Self {
        Self {
            spent: self.spent + 1,
            consecutive_undated: 0,
        }
    }

    /// `None` once the tolerance is exceeded.
    fn undated(self) -> Option<Self> {
        let consecutive_undated = self.consecutive_undated + 1;
        if consecutive_undated > UNDATED_TOLERANCE {
            return None;
        }
        Some(Self {
            spent: self.spent + 1,
            consecutive_undated,
        })
    }
}

/// Harvest up to `limit` dated articles for `source` by crawling its
/// homepage.
///
/// # Errors
///
/// [`SourceError::Discovery`] if the homepage cannot be fetched.
#[instrument(level = "info", skip(source, extractor), fields(source = %source.name))]
pub async fn crawl_site<E: ArticleExtractor>(
    source: &SourceConfig,
    limit: usize,
    extractor: &E,
) -> Result<SourceResult, SourceError> {
    info!("Building site for {}", source.name);
    let candidates = extractor.discover_site_articles(&source.link).await?;

    let mut result = SourceResult::new(source, None);
    let mut cursor = CrawlCursor::default();
    let mut recorded: HashSet<String> = HashSet::new();
    let mut failed = 0usize;
    let mut aborted = false;

    for url in candidates {
        if cursor.quota_reached(limit) {
            break;
        }

        let content = match extractor.extract_article(&url).await {
            Ok(content) => content,
            Err(e) => {
                failed += 1;
                error!(
                    %url,
                    error = %truncate_for_log(&e.to_string(), 300),
                    "Error downloading article from {}; continuing to next article", source.name
                );
                continue;
            }
        };

        match dated_article(content) {
            Some(article) if recorded.contains(&article.link) => {
                debug!(%url, link = %article.link, "Article already recorded; skipping");
            }
            Some(article) => {
                recorded.insert(article.link.clone());
                cursor = cursor.dated();
                info!(
                    count = cursor.spent,
                    url = %article.link,
                    "Article downloaded from {} by crawling", source.name
                );
                result.articles.push(article);
            }
            None => match cursor.undated() {
                Some(next) => {
                    cursor = next;
                    warn!(
                        count = cursor.spent,
                        consecutive = cursor.consecutive_undated,
                        %url,
                        "Article has no publish date; discarding"
                    );
                }
                None => {
                    warn!(
                        tolerance = UNDATED_TOLERANCE,
                        "Too many undated articles for {}, aborting", source.name
                    );
                    aborted = true;
                    break;
                }
            },
        }
    }

    info!(
        kept = result.articles.len(),
        spent = cursor.spent,
        failed,
        aborted,
        "Finished site crawl"
    );
    Ok(result)
}

fn dated_article(content: ExtractedArticle) -> Option<Article> {
    let published = content.published?;
    Some(Article {
        link: content.url,
        published: to_iso8601(&published),
        title: content.title,
        text: content.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeExtractor, Page, candidate_urls};

    const HOME: &str = "http://b.test";

    fn source() -> SourceConfig {
        SourceConfig {
            name: "B".to_string(),
            link: HOME.to_string(),
            feed_url: None,
        }
    }

    fn with_undated(mut extractor: FakeExtractor, numbers: impl IntoIterator<Item = usize>) -> FakeExtractor {
        for i in numbers {
            extractor = extractor.with_page(&format!("{HOME}/story-{i}"), Page::Undated);
        }
        extractor
    }

    #[test]
    fn test_cursor_aborts_on_eleventh() {
        let mut cursor = CrawlCursor::default();
        for _ in 0..UNDATED_TOLERANCE {
            cursor = cursor.undated().unwrap();
        }
        assert_eq!(cursor.consecutive_undated, UNDATED_TOLERANCE);
        assert!(cursor.undated().is_none());
        assert_eq!(cursor.dated().consecutive_undated, 0);
    }

    #[tokio::test]
    async fn test_eleven_consecutive_undated_aborts_source() {
        let extractor = with_undated(
            FakeExtractor::default().with_site(HOME, candidate_urls(HOME, 15)),
            3..=13,
        );

        let result = crawl_site(&source(), 50, &extractor).await.unwrap();

        let links: Vec<_> = result.articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links, vec!["http://b.test/story-1", "http://b.test/story-2"]);
        // 14 and 15 are never attempted
        assert_eq!(extractor.extracted().len(), 13);
        assert!(result.feed_url.is_none());
    }

    #[tokio::test]
    async fn test_ten_consecutive_undated_is_tolerated() {
        let extractor = with_undated(
            FakeExtractor::default().with_site(HOME, candidate_urls(HOME, 15)),
            3..=12,
        );

        let result = crawl_site(&source(), 50, &extractor).await.unwrap();

        let links: Vec<_> = result.articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "http://b.test/story-1",
                "http://b.test/story-2",
                "http://b.test/story-13",
                "http://b.test/story-14",
                "http://b.test/story-15"
            ]
        );
    }

    #[tokio::test]
    async fn test_dated_article_resets_consecutive_count() {
        // 1-8 undated, 9 dated, 10-17 undated: never more than 8 in a row
        let extractor = with_undated(
            FakeExtractor::default().with_site(HOME, candidate_urls(HOME, 18)),
            (1..=8).chain(10..=17),
        );

        let result = crawl_site(&source(), 50, &extractor).await.unwrap();

        let links: Vec<_> = result.articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links, vec!["http://b.test/story-9", "http://b.test/story-18"]);
        assert_eq!(extractor.extracted().len(), 18);
    }

    #[tokio::test]
    async fn test_undated_articles_spend_quota() {
        let extractor = with_undated(
            FakeExtractor::default().with_site(HOME, candidate_urls(HOME, 10)),
            [1, 2],
        );

        let result = crawl_site(&source(), 4, &extractor).await.unwrap();

        assert_eq!(result.articles.len(), 2);
        assert_eq!(extractor.extracted().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_extraction_does_not_spend_quota() {
        let extractor = FakeExtractor::default()
            .with_site(HOME, candidate_urls(HOME, 6))
            .with_page(&format!("{HOME}/story-1"), Page::Broken)
            .with_page(&format!("{HOME}/story-2"), Page::Broken);

        let result = crawl_site(&source(), 3, &extractor).await.unwrap();

        let links: Vec<_> = result.articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["http://b.test/story-3", "http://b.test/story-4", "http://b.test/story-5"]
        );
    }

    #[tokio::test]
    async fn test_result_never_exceeds_limit() {
        let extractor = FakeExtractor::default().with_site(HOME, candidate_urls(HOME, 30));

        for limit in [1, 4, 7] {
            let result = crawl_site(&source(), limit, &extractor).await.unwrap();
            assert_eq!(result.articles.len(), limit);
        }
    }

    #[tokio::test]
    async fn test_published_is_normalized() {
        let extractor = FakeExtractor::default()
            .with_site(HOME, candidate_urls(HOME, 1))
            .with_page(&format!("{HOME}/story-1"), Page::Dated("Tue, 06 May 2025 14:30:00 +0200"));

        let result = crawl_site(&source(), 4, &extractor).await.unwrap();

        assert_eq!(result.articles[0].published, "2025-05-06T14:30:00+02:00");
    }

    #[tokio::test]
    async fn test_redirected_duplicate_recorded_once() {
        let extractor = FakeExtractor::default()
            .with_site(
                HOME,
                vec![
                    format!("{HOME}/a-b-c"),
                    format!("{HOME}/a-b-c?utm=1"),
                    format!("{HOME}/d-e-f"),
                ],
            )
            .with_redirect(&format!("{HOME}/a-b-c?utm=1"), &format!("{HOME}/a-b-c"));

        let result = crawl_site(&source(), 2, &extractor).await.unwrap();

        let links: Vec<_> = result.articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links, vec!["http://b.test/a-b-c", "http://b.test/d-e-f"]);
    }

    #[tokio::test]
    async fn test_duplicate_keeps_undated_streak() {
        // 1-10 undated, 11 redirects to an already kept page, 12 undated:
        // the duplicate neither resets nor extends the streak
        let mut candidates = vec![format!("{HOME}/kept-story-here")];
        candidates.extend(candidate_urls(HOME, 12));
        let extractor = with_undated(
            FakeExtractor::default()
                .with_site(HOME, candidates)
                .with_redirect(&format!("{HOME}/story-11"), &format!("{HOME}/kept-story-here")),
            (1..=10).chain([12]),
        );

        let result = crawl_site(&source(), 50, &extractor).await.unwrap();

        assert_eq!(result.articles.len(), 1);
        assert_eq!(extractor.extracted().len(), 13);
        assert_eq!(extractor.extracted().last().unwrap(), "http://b.test/story-12");
    }

    #[tokio::test]
    async fn test_discovery_failure_fails_source() {
        let extractor = FakeExtractor::default().with_site_failure(HOME);

        let err = crawl_site(&source(), 4, &extractor).await.unwrap_err();

        assert!(matches!(err, SourceError::Discovery(_)));
    }
}
