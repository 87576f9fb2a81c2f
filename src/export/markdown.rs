use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::export::format_duration;
use crate::models::PlaylistExport;
use crate::service::CoverArtFetcher;

/// A directory per playlist holding `README.md` and, when cover art could
/// be fetched, `cover.jpg`.
pub(crate) async fn write(
    output_dir: &Path,
    export: &PlaylistExport,
    cover_art: Option<&dyn CoverArtFetcher>,
    http: &reqwest::Client,
) -> Result<Vec<PathBuf>> {
    let dir = output_dir.join(&export.playlist.id);
    tokio::fs::create_dir_all(&dir).await?;

    let cover_path = match cover_art {
        Some(fetcher) => download_cover(fetcher, http, &export.playlist.id, &dir).await,
        None => None,
    };

    let mut readme = format!("# {}\n\n", export.playlist.name);
    if cover_path.is_some() {
        readme.push_str("![cover](cover.jpg)\n\n");
    }
    if !export.playlist.description.is_empty() {
        readme.push_str(&format!("{}\n\n", export.playlist.description));
    }
    readme.push_str(&format!("**Tracks:** {}\n\n", export.tracks.len()));
    readme.push_str(&format!(
        "**Visibility:** {}\n\n",
        if export.playlist.is_public {
            "Public"
        } else {
            "Private"
        }
    ));
    readme.push_str("## Tracks\n\n");
    for (i, track) in export.tracks.iter().enumerate() {
        readme.push_str(&format!(
            "{}. {} - {} ({})\n",
            i + 1,
            track.artist,
            track.title,
            format_duration(track.duration_seconds)
        ));
    }

    let readme_path = dir.join("README.md");
    tokio::fs::write(&readme_path, readme).await?;

    let mut files = vec![readme_path];
    files.extend(cover_path);
    Ok(files)
}

/// Fetch and store the playlist cover. Every failure here degrades to
/// "no cover" — cover art is never fatal to an export.
async fn download_cover(
    fetcher: &dyn CoverArtFetcher,
    http: &reqwest::Client,
    playlist_id: &str,
    dir: &Path,
) -> Option<PathBuf> {
    let url = match fetcher.cover_image_url(playlist_id).await {
        Ok(url) if !url.is_empty() => url,
        Ok(_) => return None,
        Err(e) => {
            debug!("No cover art for {}: {}", playlist_id, e);
            return None;
        }
    };

    let response = match http.get(&url).send().await.and_then(|r| r.error_for_status()) {
        Ok(response) => response,
        Err(e) => {
            warn!("Cover download failed for {}: {}", playlist_id, e);
            return None;
        }
    };

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Cover download aborted for {}: {}", playlist_id, e);
            return None;
        }
    };

    let path = dir.join("cover.jpg");
    match tokio::fs::write(&path, &bytes).await {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("Failed to store cover for {}: {}", playlist_id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::SyncError;
    use crate::models::{Playlist, Track};

    struct NoCover;

    #[async_trait]
    impl CoverArtFetcher for NoCover {
        async fn cover_image_url(&self, _playlist_id: &str) -> Result<String> {
            Err(SyncError::ApiRequest("no cover endpoint".to_string()))
        }
    }

    #[tokio::test]
    async fn test_markdown_directory_layout() {
        let dir = tempfile::tempdir().unwrap();
        let export = PlaylistExport {
            playlist: Playlist {
                description: "Best of 1977".to_string(),
                is_public: true,
                ..Playlist::mock("p1", "Rumours")
            },
            tracks: vec![Track {
                duration_seconds: 354,
                ..Track::mock("Dreams", "Fleetwood Mac")
            }],
        };

        let http = reqwest::Client::new();
        let files = write(dir.path(), &export, None, &http).await.unwrap();
        assert_eq!(files, vec![dir.path().join("p1").join("README.md")]);

        let readme = std::fs::read_to_string(&files[0]).unwrap();
        assert!(readme.starts_with("# Rumours\n"));
        assert!(readme.contains("Best of 1977"));
        assert!(readme.contains("**Tracks:** 1"));
        assert!(readme.contains("**Visibility:** Public"));
        assert!(readme.contains("1. Fleetwood Mac - Dreams (5:54)"));
        assert!(!readme.contains("cover.jpg"));
    }

    #[tokio::test]
    async fn test_cover_failure_degrades_to_readme_only() {
        let dir = tempfile::tempdir().unwrap();
        let export = PlaylistExport::mock("p1", "Rumours", vec![]);

        let http = reqwest::Client::new();
        let files = write(dir.path(), &export, Some(&NoCover), &http)
            .await
            .unwrap();

        assert_eq!(files.len(), 1);
        assert!(!dir.path().join("p1").join("cover.jpg").exists());
    }
}
