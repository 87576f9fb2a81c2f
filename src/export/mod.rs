mod csv;
mod json;
mod markdown;
mod text;

use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::Result;
use crate::models::PlaylistExport;
use crate::service::CoverArtFetcher;

/// On-disk layout for one exported playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// One pretty-printed `<id>.json` per playlist.
    Json,
    /// `<id>_tracks.csv` plus `<id>_metadata.json`.
    Csv,
    /// A `<id>/` directory with `README.md` and an optional `cover.jpg`.
    Markdown,
    /// Human-readable `<id>_tracks.txt`.
    Txt,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Txt => "txt",
        };
        write!(f, "{}", name)
    }
}

/// Render one playlist export under `output_dir` in the requested format,
/// returning every file created.
pub async fn write_playlist(
    output_dir: &Path,
    export: &PlaylistExport,
    format: ExportFormat,
    cover_art: Option<&dyn CoverArtFetcher>,
    http: &reqwest::Client,
) -> Result<Vec<PathBuf>> {
    match format {
        ExportFormat::Json => json::write(output_dir, export).await,
        ExportFormat::Csv => csv::write(output_dir, export).await,
        ExportFormat::Txt => text::write(output_dir, export).await,
        ExportFormat::Markdown => markdown::write(output_dir, export, cover_art, http).await,
    }
}

/// Format a track duration as `m:ss`.
pub(crate) fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(60), "1:00");
        assert_eq!(format_duration(354), "5:54");
        assert_eq!(format_duration(3 * 3600), "180:00");
    }

    #[test]
    fn test_format_names_are_stable() {
        assert_eq!(ExportFormat::Json.to_string(), "json");
        assert_eq!(ExportFormat::Csv.to_string(), "csv");
        assert_eq!(ExportFormat::Markdown.to_string(), "markdown");
        assert_eq!(ExportFormat::Txt.to_string(), "txt");
    }
}
