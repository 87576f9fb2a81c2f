use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::PlaylistExport;

pub(crate) async fn write(output_dir: &Path, export: &PlaylistExport) -> Result<Vec<PathBuf>> {
    let path = output_dir.join(format!("{}_tracks.txt", export.playlist.id));

    let mut lines = String::new();
    for (i, track) in export.tracks.iter().enumerate() {
        lines.push_str(&format!("{}. {} - {}\n", i + 1, track.artist, track.title));
    }
    tokio::fs::write(&path, lines).await?;

    Ok(vec![path])
}
