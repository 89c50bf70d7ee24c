//! Syndication feed fetching and parsing.
//!
//! [`FeedSource`] is the seam the validator and the feed strategy call;
//! [`HttpFeedClient`] is the production implementation. Parsing is done with
//! a `quick-xml` event reader and understands RSS 2.0, RSS 1.0 (RDF) and
//! Atom documents.
//!
//! # Entry fields
//!
//! | Format | Link | Publish date |
//! |--------|------|--------------|
//! | RSS 2.0 / RDF | `<link>` text, else an http(s) `<guid>` | `<pubDate>`, `<dc:date>` |
//! | Atom | `<link href>` (`rel="alternate"` preferred), else an http(s) `<id>` | `<published>`, `<issued>` |
//!
//! `<updated>` is not treated as a publish date.

use crate::error::FeedError;
use crate::models::FeedEntry;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

/// Anything that can turn a feed URL into an ordered list of entries.
pub trait FeedSource {
    /// Fetch and parse the feed at `url`, preserving document order.
    async fn fetch_feed(&self, url: &str) -> Result<Vec<FeedEntry>, FeedError>;

    /// Cheap probe: does the feed exist and list at least one entry?
    async fn validate_feed(&self, url: &str) -> bool {
        match self.fetch_feed(url).await {
            Ok(entries) => {
                debug!(%url, count = entries.len(), "Feed probed");
                !entries.is_empty()
            }
            Err(e) => {
                warn!(%url, error = %e, "Invalid RSS feed");
                false
            }
        }
    }
}

/// Fetches feeds over HTTP with a shared [`Client`].
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    client: Client,
}

impl HttpFeedClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl FeedSource for HttpFeedClient {
    #[instrument(level = "info", skip(self))]
    async fn fetch_feed(&self, url: &str) -> Result<Vec<FeedEntry>, FeedError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let entries = parse_feed(&bytes)?;
        info!(count = entries.len(), "Parsed feed entries");
        Ok(entries)
    }
}

/// Parse an RSS or Atom document into entries.
///
/// Entries without a usable link are dropped since there is nothing to
/// fetch for them; entries without a date are kept with `published: None`.
pub fn parse_feed(xml: &[u8]) -> Result<Vec<FeedEntry>, FeedError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = qualified_name(&e);
                if is_entry_element(&name) {
                    current = Some(EntryBuilder::default());
                } else if let Some(entry) = current.as_mut() {
                    if name == "link" {
                        entry.offer_atom_link(&e);
                    }
                }
                path.push(name);
                text.clear();
            }
            Ok(Event::Empty(e)) => {
                if let Some(entry) = current.as_mut() {
                    if qualified_name(&e) == "link" {
                        entry.offer_atom_link(&e);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if current.is_some() {
                    text.push('&');
                    text.push_str(&String::from_utf8_lossy(&r));
                    text.push(';');
                }
            }
            Ok(Event::CData(e)) => {
                if current.is_some() {
                    let raw = String::from_utf8_lossy(&e);
                    text.push_str(&quick_xml::escape::escape(&*raw));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(name) = path.pop() {
                    if is_entry_element(&name) {
                        if let Some(entry) = current.take().and_then(EntryBuilder::build) {
                            entries.push(entry);
                        }
                    } else if let Some(entry) = current.as_mut() {
                        let value = unescape_lossy(&text);
                        entry.set_field(&name, value.trim());
                    }
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FeedError::Xml(format!(
                    "{} at position {}",
                    e,
                    reader.error_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn qualified_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn is_entry_element(name: &str) -> bool {
    name == "item" || name == "entry"
}

fn unescape_lossy(raw: &str) -> String {
    match quick_xml::escape::unescape(raw) {
        Ok(s) => s.into_owned(),
        Err(_) => raw.to_string(),
    }
}

#[derive(Default)]
struct EntryBuilder {
    rss_link: Option<String>,
    atom_link: Option<String>,
    atom_link_is_alternate: bool,
    guid: Option<String>,
    published: Option<String>,
    dc_date: Option<String>,
}

impl EntryBuilder {
    fn offer_atom_link(&mut self, e: &BytesStart<'_>) {
        let mut href = None;
        let mut rel = None;
        for attr in e.attributes().flatten() {
            let value = unescape_lossy(&String::from_utf8_lossy(&attr.value));
            match attr.key.as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }
        let Some(href) = href.filter(|h| !h.trim().is_empty()) else {
            return;
        };
        let alternate = rel.as_deref().is_none_or(|r| r == "alternate");
        if self.atom_link.is_none() || (alternate && !self.atom_link_is_alternate) {
            self.atom_link = Some(href.trim().to_string());
            self.atom_link_is_alternate = alternate;
        }
    }

    fn set_field(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        match name {
            "link" => {
                self.rss_link.get_or_insert_with(|| value.to_string());
            }
            "guid" | "id" => {
                self.guid.get_or_insert_with(|| value.to_string());
            }
            "pubDate" | "published" | "issued" => {
                self.published.get_or_insert_with(|| value.to_string());
            }
            "dc:date" => {
                self.dc_date.get_or_insert_with(|| value.to_string());
            }
            _ => {}
        }
    }

    fn build(self) -> Option<FeedEntry> {
        let permalink = self.guid.filter(|g| g.starts_with("http://") || g.starts_with("https://"));
        let link = self.rss_link.or(self.atom_link).or(permalink)?;
        Some(FeedEntry {
            link,
            published: self.published.or(self.dc_date),
        })
    }
}
