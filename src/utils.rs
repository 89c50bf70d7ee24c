//! Utility functions for timestamp normalization, string manipulation, and
//! file system checks.
//!
//! - Timestamp parsing for the many date formats feeds and pages use
//! - String truncation for logging
//! - File system validation for the snapshot directory

use crate::error::SnapshotError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Naive layouts tried after RFC 2822 and RFC 3339. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts that are neither strict RFC 2822 nor RFC 3339.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
];

/// Parse a publish timestamp as found in feeds, meta tags and JSON-LD.
///
/// Tries RFC 2822 (RSS `pubDate`), RFC 3339 (Atom, `article:published_time`),
/// a handful of looser offset layouts, then naive date-times and bare dates,
/// which are taken to be UTC.
///
/// # Returns
///
/// `None` when no layout matches.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    // RFC 2822 with a zone abbreviation chrono does not know
    if let Some((head, zone)) = s.rsplit_once(' ') {
        if let Ok(naive) = NaiveDateTime::parse_from_str(head, "%a, %d %b %Y %H:%M:%S") {
            let offset = zone_offset(zone)?;
            return naive.and_local_timezone(offset).single();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc().fixed_offset());
    }
    None
}

/// Fixed offsets for unambiguous zone abbreviations outside RFC 2822.
const ZONE_ABBREVIATIONS: &[(&str, i32)] = &[
    ("WET", 0),
    ("WEST", 1),
    ("BST", 1),
    ("CET", 1),
    ("CEST", 2),
    ("EET", 2),
    ("EEST", 3),
    ("MSK", 3),
    ("JST", 9),
    ("KST", 9),
    ("AEST", 10),
    ("AEDT", 11),
    ("NZST", 12),
    ("NZDT", 13),
];

fn zone_offset(zone: &str) -> Option<FixedOffset> {
    ZONE_ABBREVIATIONS
        .iter()
        .find(|(name, _)| zone.eq_ignore_ascii_case(name))
        .and_then(|(_, hours)| FixedOffset::east_opt(hours * 3600))
}

/// Render a timestamp the way the snapshot stores it.
///
/// # Examples
///
/// ```ignore
/// let dt = parse_timestamp("Tue, 06 May 2025 14:30:00 GMT").unwrap();
/// assert_eq!(to_iso8601(&dt), "2025-05-06T14:30:00+00:00");
/// ```
pub fn to_iso8601(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse and normalize in one step.
pub fn normalize_timestamp(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(|dt| to_iso8601(&dt))
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a char boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns [`SnapshotError::Io`] if the directory cannot be created or is not
/// writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), SnapshotError> {
    fs::create_dir_all(path)
        .await
        .map_err(|source| SnapshotError::Io {
            operation: "Failed to create output directory",
            path: path.to_string(),
            source,
        })?;

    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(source) => Err(SnapshotError::Io {
            operation: "Output directory is not writable",
            path: path.to_string(),
            source,
        }),
    }
}
