//! JSON output of a scrape.
//!
//! Results are written one file per category under a directory named after the
//! scrape date, so repeated runs on the same day overwrite the previous file
//! for that category.

use crate::models::NewsResponse;
use chrono::SecondsFormat;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the file a response is written to:
/// `{json_output_dir}/{YYYY-MM-DD}/{category-or-all}.json`.
pub fn output_path(response: &NewsResponse, category: Option<&str>, json_output_dir: &str) -> PathBuf {
    let date = response.result.scraped_at.date_naive().to_string();
    PathBuf::from(json_output_dir)
        .join(date)
        .join(format!("{}.json", category.unwrap_or("all")))
}

/// Write a [`NewsResponse`] as pretty JSON, creating the dated directory.
///
/// # Returns
///
/// The path written, or an error if directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_response(
    response: &NewsResponse,
    category: Option<&str>,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(response)?;
    let path = output_path(response, category, json_output_dir);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(
        path = %path.display(),
        count = response.result.count,
        scraped_at = %response.result.scraped_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        "Wrote JSON output"
    );
    Ok(path)
}
