use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::PlaylistExport;

pub(crate) async fn write(output_dir: &Path, export: &PlaylistExport) -> Result<Vec<PathBuf>> {
    let path = output_dir.join(format!("{}.json", export.playlist.id));
    let json = serde_json::to_string_pretty(export)?;
    tokio::fs::write(&path, json).await?;
    Ok(vec![path])
}
