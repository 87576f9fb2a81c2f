use serde::{Deserialize, Serialize};

/// A single track as reported by a streaming service.
///
/// `isrc` is the International Standard Recording Code; services omit it
/// for regional uploads and user-generated content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_seconds: u64,
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Advisory count reported by the service; the authoritative count is
    /// the track listing of a `PlaylistExport`.
    pub track_count: usize,
    pub is_public: bool,
}

/// A playlist plus its ordered track listing at a moment in time.
///
/// Track order is preserved verbatim from the source; duplicates allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistExport {
    pub playlist: Playlist,
    pub tracks: Vec<Track>,
}

#[cfg(test)]
impl Track {
    pub fn mock(title: &str, artist: &str) -> Self {
        Self {
            id: format!("trk_{}", title.to_lowercase().replace(' ', "_")),
            title: title.to_string(),
            artist: artist.to_string(),
            album: "Mock Album".to_string(),
            duration_seconds: 180,
            isrc: None,
        }
    }

    pub fn mock_with_isrc(title: &str, artist: &str, isrc: &str) -> Self {
        Self {
            isrc: Some(isrc.to_string()),
            ..Self::mock(title, artist)
        }
    }
}

#[cfg(test)]
impl Playlist {
    pub fn mock(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            track_count: 0,
            is_public: false,
        }
    }
}

#[cfg(test)]
impl PlaylistExport {
    pub fn mock(id: &str, name: &str, tracks: Vec<Track>) -> Self {
        let mut playlist = Playlist::mock(id, name);
        playlist.track_count = tracks.len();
        Self { playlist, tracks }
    }
}
