use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::{config::Config, pipeline::Pipeline, pipeline::RunSummary};

/// Brings the local mirror up to date with the remote listing.
pub async fn sync(config: Config, cancel: CancellationToken, show_progress: bool) -> Result<RunSummary> {
    let pipeline = Pipeline::new(config, cancel)?.with_progress(show_progress);
    let summary = pipeline.run().await?;

    Ok(summary)
}

/// One line per outcome, printed after a run.
pub fn describe(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "{} planned, {} downloaded, {} merged, {} rows written",
        summary.planned, summary.downloaded, summary.merged, summary.rows_written
    )];

    for e in &summary.skipped {
        lines.push(format!("Skipped: {}", e));
    }
    for e in &summary.failed {
        lines.push(format!("Failed: {}", e));
    }
    if summary.cancelled {
        lines.push("Cancelled before all archives were processed".to_string());
    }

    lines
}

// -- Tests -------------------------------------------------------------------
