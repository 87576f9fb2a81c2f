use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::PlaylistExport;

const TRACK_HEADER: [&str; 6] = ["ID", "Title", "Artist", "Album", "Duration", "ISRC"];

/// Two files per playlist: the track listing as CSV and the playlist
/// metadata (without tracks) as JSON.
pub(crate) async fn write(output_dir: &Path, export: &PlaylistExport) -> Result<Vec<PathBuf>> {
    let tracks_path = output_dir.join(format!("{}_tracks.csv", export.playlist.id));
    let metadata_path = output_dir.join(format!("{}_metadata.json", export.playlist.id));

    let mut writer = csv::Writer::from_path(&tracks_path)?;
    writer.write_record(TRACK_HEADER)?;
    for track in &export.tracks {
        let duration = track.duration_seconds.to_string();
        writer.write_record([
            track.id.as_str(),
            track.title.as_str(),
            track.artist.as_str(),
            track.album.as_str(),
            duration.as_str(),
            track.isrc.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;

    let metadata = serde_json::to_string_pretty(&export.playlist)?;
    tokio::fs::write(&metadata_path, metadata).await?;

    Ok(vec![tracks_path, metadata_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Playlist, Track};

    #[tokio::test]
    async fn test_csv_round_trips_awkward_titles() {
        let dir = tempfile::tempdir().unwrap();
        let tracks = vec![
            Track::mock_with_isrc("Hello, Goodbye", "The Beatles", "GBAYE0601498"),
            Track::mock("\"Heroes\"", "David Bowie"),
            Track::mock("Song\nwith newline", "Artist"),
        ];
        let export = PlaylistExport::mock("p1", "Tricky", tracks.clone());

        let files = write(dir.path(), &export).await.unwrap();
        assert_eq!(files.len(), 2);

        let mut reader = csv::Reader::from_path(&files[0]).unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(TRACK_HEADER.to_vec())
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), tracks.len());
        for (row, track) in rows.iter().zip(&tracks) {
            assert_eq!(&row[1], track.title.as_str());
            assert_eq!(&row[2], track.artist.as_str());
            assert_eq!(row[4].parse::<u64>().unwrap(), track.duration_seconds);
            assert_eq!(&row[5], track.isrc.as_deref().unwrap_or(""));
        }
    }

    #[tokio::test]
    async fn test_metadata_json_has_no_tracks() {
        let dir = tempfile::tempdir().unwrap();
        let export = PlaylistExport::mock("p1", "Meta", vec![Track::mock("Dreams", "Fleetwood Mac")]);

        let files = write(dir.path(), &export).await.unwrap();
        let raw = std::fs::read_to_string(&files[1]).unwrap();
        let decoded: Playlist = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded.name, "Meta");
        assert!(!raw.contains("Fleetwood Mac"));
    }
}
