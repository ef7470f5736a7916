use std::path::Path;

use anyhow::{anyhow, Result};
use tokio_util::sync::CancellationToken;

use crate::{config::Config, pipeline::Pipeline};

/// Merges and verifies an archive already on disk.
///
/// Returns the rows written, or `None` if the archive was already processed.
pub async fn merge(config: Config, archive: &Path, force: bool) -> Result<Option<usize>> {
    if !archive.is_file() {
        return Err(anyhow!("Archive '{}' does not exist", archive.display()));
    }

    let pipeline = Pipeline::new(config, CancellationToken::new())?;
    let rows = pipeline.merge_archive(archive, force).await?;

    Ok(rows)
}
