use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::{cli::create_spinner, config::Config, pipeline::Pipeline, reconcile::DownloadTask};

/// Archive versions the next sync would download.
pub async fn status(config: Config, show_progress: bool) -> Result<Vec<DownloadTask>> {
    let pipeline = Pipeline::new(config, CancellationToken::new())?;

    let bar = if show_progress {
        Some(create_spinner("Reading archive listing...".to_string()))
    } else {
        None
    };
    let tasks = pipeline.plan().await?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    Ok(tasks)
}
