//! Article discovery and extraction from HTML pages.
//!
//! [`ArticleExtractor`] is the seam both strategies call. The production
//! [`HtmlArticleExtractor`] fetches pages with the shared client and pulls
//! the title, body text and publish date out with `scraper`.
//!
//! # Publish date lookup order
//!
//! 1. `<meta>` tags (`article:published_time`, `datePublished`, `pubdate`, ...)
//! 2. JSON-LD `datePublished` (including `@graph` blocks)
//! 3. `<time datetime>` elements
//! 4. A `/YYYY/MM/DD/` segment in the URL

use crate::error::ExtractionError;
use crate::models::ExtractedArticle;
use crate::utils::parse_timestamp;
use chrono::{DateTime, FixedOffset, NaiveDate};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

/// Anything that can enumerate a site's articles and extract one of them.
pub trait ArticleExtractor {
    /// Candidate article URLs reachable from `homepage`, in page order.
    async fn discover_site_articles(&self, homepage: &str) -> Result<Vec<String>, ExtractionError>;

    /// Download and parse a single article.
    async fn extract_article(&self, url: &str) -> Result<ExtractedArticle, ExtractionError>;
}

/// Extracts articles over HTTP with a shared [`Client`].
#[derive(Debug, Clone)]
pub struct HtmlArticleExtractor {
    client: Client,
}

impl HtmlArticleExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_html(&self, url: &str) -> Result<(String, String), ExtractionError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let final_url = response.url().to_string();
        let body = response.text().await?;
        Ok((final_url, body))
    }
}

impl ArticleExtractor for HtmlArticleExtractor {
    #[instrument(level = "info", skip(self))]
    async fn discover_site_articles(&self, homepage: &str) -> Result<Vec<String>, ExtractionError> {
        let (final_url, html) = self.get_html(homepage).await?;
        let base = Url::parse(&final_url).map_err(|source| ExtractionError::InvalidUrl {
            url: final_url.clone(),
            source,
        })?;

        let urls = discover_links(&base, &html);
        info!(count = urls.len(), source = homepage, "Indexed candidate article URLs");
        debug!(urls = ?urls, "Candidate URLs");
        Ok(urls)
    }

    #[instrument(level = "info", skip(self))]
    async fn extract_article(&self, url: &str) -> Result<ExtractedArticle, ExtractionError> {
        let (final_url, html) = self.get_html(url).await?;
        let article = parse_article(&final_url, &html)?;
        info!(bytes = article.text.len(), dated = article.published.is_some(), "Parsed article");
        Ok(article)
    }
}

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector"));
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("valid selector"));
static JSON_LD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid selector")
});
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").expect("valid selector"));

static BODY_CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "[itemprop=articleBody]",
        "article",
        "[role=main]",
        "main",
        "#content",
        ".post-content",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("valid selector"))
    .collect()
});

static DATE_META: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"meta[property="article:published_time"]"#,
        r#"meta[name="article:published_time"]"#,
        r#"meta[itemprop="datePublished"]"#,
        r#"meta[property="og:published_time"]"#,
        r#"meta[name="pubdate"]"#,
        r#"meta[name="publishdate"]"#,
        r#"meta[name="publish-date"]"#,
        r#"meta[name="date"]"#,
        r#"meta[name="dc.date"]"#,
        r#"meta[name="DC.date.issued"]"#,
        r#"meta[name="sailthru.date"]"#,
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("valid selector"))
    .collect()
});

static URL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/((?:19|20)\d{2})/(\d{1,2})/(\d{1,2})(?:/|$)").expect("valid regex"));
static URL_DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:19|20)\d{2}[/-]\d{1,2}(?:[/-]|$)").expect("valid regex"));
static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{6,}").expect("valid regex"));

/// Minimum body length before a container is accepted over the paragraph
/// fallback.
const MIN_CONTAINER_TEXT: usize = 200;

const SKIPPED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".pdf", ".mp3", ".mp4", ".xml", ".rss",
    ".css", ".js", ".zip", ".json",
];

const SKIPPED_SEGMENTS: &[&str] = &[
    "tag", "tags", "category", "categories", "author", "authors", "search", "login", "signin",
    "subscribe", "newsletter", "newsletters", "account", "about", "contact", "privacy", "terms",
];

/// Collect likely article links from a homepage, resolved against `base`.
///
/// Keeps same-host http(s) links that look like article permalinks, drops
/// fragments and duplicates, and preserves first-seen order.
pub fn discover_links(base: &Url, html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .filter(|url| looks_like_article(base, url))
        .map(|url| url.to_string())
        .unique()
        .collect()
}

fn bare_host(url: &Url) -> Option<&str> {
    url.host_str().map(|h| h.strip_prefix("www.").unwrap_or(h))
}

fn looks_like_article(base: &Url, url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") || bare_host(url) != bare_host(base) {
        return false;
    }

    let path = url.path();
    if path.trim_end_matches('/') == base.path().trim_end_matches('/') {
        return false;
    }
    let lower = path.to_lowercase();
    if SKIPPED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return false;
    }

    let segments: Vec<&str> = lower.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| SKIPPED_SEGMENTS.contains(s)) {
        return false;
    }
    if URL_DATE_PREFIX.is_match(&lower) {
        return true;
    }

    let Some(&last) = segments.last() else {
        return false;
    };
    let stem = last.split('.').next().unwrap_or(last);
    let words = stem.split(['-', '_']).filter(|w| !w.is_empty()).count();
    words >= 3 || NUMERIC_ID.is_match(stem)
}

/// Extract title, body text and publish date from an article page.
///
/// # Errors
///
/// [`ExtractionError::EmptyContent`] when either the title or the body text
/// comes back empty; such pages are never recorded.
pub fn parse_article(url: &str, html: &str) -> Result<ExtractedArticle, ExtractionError> {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let text = extract_text(&document);
    if title.is_empty() || text.is_empty() {
        return Err(ExtractionError::EmptyContent(url.to_string()));
    }

    let published = extract_published(&document).or_else(|| date_from_url(url));
    Ok(ExtractedArticle {
        url: url.to_string(),
        title,
        text,
        published,
    })
}

fn extract_title(document: &Html) -> String {
    let og = document
        .select(&OG_TITLE)
        .filter_map(|m| m.value().attr("content"))
        .map(collapse_whitespace)
        .find(|t| !t.is_empty());
    if let Some(title) = og {
        return title;
    }

    [&*H1, &*TITLE]
        .into_iter()
        .filter_map(|sel| document.select(sel).next())
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn extract_text(document: &Html) -> String {
    for container_sel in BODY_CONTAINERS.iter() {
        if let Some(container) = document.select(container_sel).next() {
            let text = paragraphs(container.select(&PARAGRAPH));
            if text.len() >= MIN_CONTAINER_TEXT {
                return text;
            }
        }
    }
    paragraphs(document.select(&PARAGRAPH))
}

fn paragraphs<'a>(elements: impl Iterator<Item = scraper::ElementRef<'a>>) -> String {
    elements
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|s| !s.is_empty())
        .join("\n\n")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}

fn extract_published(document: &Html) -> Option<DateTime<FixedOffset>> {
    let from_meta = DATE_META
        .iter()
        .flat_map(|sel| document.select(sel))
        .filter_map(|m| m.value().attr("content"))
        .find_map(parse_timestamp);
    if from_meta.is_some() {
        return from_meta;
    }

    let from_json_ld = document
        .select(&JSON_LD)
        .filter_map(|script| serde_json::from_str::<Value>(&script.text().collect::<String>()).ok())
        .find_map(|value| json_ld_date(&value));
    if from_json_ld.is_some() {
        return from_json_ld;
    }

    document
        .select(&TIME)
        .filter_map(|t| t.value().attr("datetime"))
        .find_map(parse_timestamp)
}

fn json_ld_date(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::Object(map) => map
            .get("datePublished")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .or_else(|| map.get("@graph").and_then(json_ld_date)),
        Value::Array(items) => items.iter().find_map(json_ld_date),
        _ => None,
    }
}

fn date_from_url(url: &str) -> Option<DateTime<FixedOffset>> {
    let caps = URL_DATE.captures(url)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc().fixed_offset())
}
