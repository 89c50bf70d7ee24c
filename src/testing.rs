//! In-memory collaborators for unit tests.

use crate::error::{ExtractionError, FeedError};
use crate::extract::ArticleExtractor;
use crate::feed::FeedSource;
use crate::models::{ExtractedArticle, FeedEntry};
use crate::utils::parse_timestamp;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Feeds keyed by URL. Unknown URLs answer with HTTP 404.
#[derive(Default)]
pub struct FakeFeeds {
    feeds: HashMap<String, Option<Vec<FeedEntry>>>,
    calls: Cell<usize>,
}

impl FakeFeeds {
    pub fn with_entries(mut self, url: &str, entries: Vec<FeedEntry>) -> Self {
        self.feeds.insert(url.to_string(), Some(entries));
        self
    }

    /// `count` entries at `{url}/{i}`, each with a distinct RFC 3339 date.
    pub fn with_dated(self, url: &str, count: usize) -> Self {
        let entries = (0..count).map(|i| dated_entry(&format!("{url}/{i}"), i)).collect();
        self.with_entries(url, entries)
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.feeds.insert(url.to_string(), None);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl FeedSource for FakeFeeds {
    async fn fetch_feed(&self, url: &str) -> Result<Vec<FeedEntry>, FeedError> {
        self.calls.set(self.calls.get() + 1);
        match self.feeds.get(url) {
            Some(Some(entries)) => Ok(entries.clone()),
            Some(None) => Err(FeedError::Xml("simulated parse failure".to_string())),
            None => Err(FeedError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

pub fn dated_entry(link: &str, day: usize) -> FeedEntry {
    FeedEntry {
        link: link.to_string(),
        published: Some(format!("2025-05-{:02}T10:00:00Z", day % 28 + 1)),
    }
}

pub fn undated_entry(link: &str) -> FeedEntry {
    FeedEntry {
        link: link.to_string(),
        published: None,
    }
}

/// How a fake article page behaves.
#[derive(Debug, Clone)]
pub enum Page {
    Dated(&'static str),
    Undated,
    Broken,
}

/// Sites and pages keyed by URL. Pages not registered extract as dated.
pub struct FakeExtractor {
    sites: HashMap<String, Option<Vec<String>>>,
    pages: HashMap<String, Page>,
    redirects: HashMap<String, String>,
    default_page: Page,
    extracted: RefCell<Vec<String>>,
}

impl Default for FakeExtractor {
    fn default() -> Self {
        Self {
            sites: HashMap::new(),
            pages: HashMap::new(),
            redirects: HashMap::new(),
            default_page: Page::Dated("2025-05-06T14:30:00+00:00"),
            extracted: RefCell::new(Vec::new()),
        }
    }
}

impl FakeExtractor {
    pub fn with_site(mut self, homepage: &str, urls: Vec<String>) -> Self {
        self.sites.insert(homepage.to_string(), Some(urls));
        self
    }

    pub fn with_site_failure(mut self, homepage: &str) -> Self {
        self.sites.insert(homepage.to_string(), None);
        self
    }

    pub fn with_page(mut self, url: &str, page: Page) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// `url` extracts as the page at `final_url`.
    pub fn with_redirect(mut self, url: &str, final_url: &str) -> Self {
        self.redirects.insert(url.to_string(), final_url.to_string());
        self
    }

    /// URLs passed to `extract_article`, in call order.
    pub fn extracted(&self) -> Vec<String> {
        self.extracted.borrow().clone()
    }
}

impl ArticleExtractor for FakeExtractor {
    async fn discover_site_articles(&self, homepage: &str) -> Result<Vec<String>, ExtractionError> {
        match self.sites.get(homepage) {
            Some(Some(urls)) => Ok(urls.clone()),
            _ => Err(ExtractionError::Status {
                status: 503,
                url: homepage.to_string(),
            }),
        }
    }

    async fn extract_article(&self, url: &str) -> Result<ExtractedArticle, ExtractionError> {
        self.extracted.borrow_mut().push(url.to_string());
        let url = self.redirects.get(url).map(String::as_str).unwrap_or(url);
        let page = self.pages.get(url).unwrap_or(&self.default_page);
        let published = match page {
            Page::Broken => return Err(ExtractionError::EmptyContent(url.to_string())),
            Page::Undated => None,
            Page::Dated(ts) => parse_timestamp(ts),
        };
        Ok(ExtractedArticle {
            url: url.to_string(),
            title: format!("Title of {url}"),
            text: format!("Body of {url}"),
            published,
        })
    }
}

/// `count` candidate URLs on `homepage`, numbered from 1.
pub fn candidate_urls(homepage: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{homepage}/story-{i}")).collect()
}
