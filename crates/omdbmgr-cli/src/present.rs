//! Console output of a finished search.

use std::io::Write;

use anyhow::{Context, Result};
use omdbmgr_api::omdb::SearchReport;

/// Summary line printed after the movie list.
#[must_use]
pub fn summary_line(term: &str, count: usize) -> String {
    let noun = if count == 1 { "result" } else { "results" };
    format!("'{term}' movies with poster URL => {count} {noun} found")
}

/// Logs one `title [year] - poster` line per movie, then the summary.
pub fn print_report(term: &str, report: &SearchReport) {
    for movie in &report.movies {
        tracing::info!("{} [{}] - {}", movie.title(), movie.year(), movie.poster());
    }

    let failed: Vec<u32> = report.failed_pages().collect();
    if !failed.is_empty() {
        tracing::warn!(?failed, "some pages were skipped, results are incomplete");
    }

    tracing::info!("{}", summary_line(term, report.movies.len()));
}

/// Writes the report as pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json(mut out: impl Write, report: &SearchReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, report).context("failed to serialize report")?;
    writeln!(out).context("failed to write report")?;
    Ok(())
}
