//! JSON snapshot output.
//!
//! One file per run, named after the run's local start time at minute
//! resolution:
//!
//! ```text
//! output_dir/
//! └── scraped_articles_05_06_2025_14_30.json
//! ```

use crate::error::SnapshotError;
use crate::models::BatchResult;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Snapshot file name for a run started at `started_at`.
pub fn snapshot_filename(started_at: &DateTime<Local>) -> String {
    format!("scraped_articles_{}.json", started_at.format("%m_%d_%Y_%H_%M"))
}

/// Serialize `batch` as pretty-printed JSON into `output_dir`.
///
/// Creates `output_dir` if needed.
///
/// # Returns
///
/// The path of the written file.
///
/// # Errors
///
/// Any serialization or I/O failure. There is no partial-write recovery; the
/// caller treats this as fatal.
#[instrument(level = "info", skip(batch, started_at))]
pub async fn write_snapshot(
    batch: &BatchResult,
    output_dir: &str,
    started_at: &DateTime<Local>,
) -> Result<PathBuf, SnapshotError> {
    let json = serde_json::to_string_pretty(batch)?;

    if let Err(source) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %source, "Failed to create snapshot dir");
        return Err(SnapshotError::Io {
            operation: "Failed to create snapshot directory",
            path: output_dir.to_string(),
            source,
        });
    }

    let path = Path::new(output_dir).join(snapshot_filename(started_at));
    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json)
        .await
        .map_err(|source| SnapshotError::Io {
            operation: "Failed to write snapshot",
            path: path.display().to_string(),
            source,
        })?;
    info!(
        path = %path.display(),
        sources = batch.newspapers.len(),
        articles = batch.article_count(),
        "Successfully saved snapshot"
    );

    Ok(path)
}
