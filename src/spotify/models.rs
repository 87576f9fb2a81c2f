use serde::{Deserialize, Serialize};

use crate::models::{Playlist, Track};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    pub tracks: TracksRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TracksRef {
    pub total: usize,
}

impl ApiPlaylist {
    pub fn into_playlist(self) -> Playlist {
        Playlist {
            id: self.id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            track_count: self.tracks.total,
            is_public: self.public.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistTrackItem {
    // Local files and removed tracks come back as null.
    pub track: Option<ApiTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiTrack {
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<ApiArtist>,
    #[serde(default)]
    pub album: Option<ApiAlbum>,
    pub duration_ms: u64,
    #[serde(default)]
    pub external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiArtist {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAlbum {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExternalIds {
    pub isrc: Option<String>,
}

impl ApiTrack {
    pub fn into_track(self) -> Track {
        Track {
            id: self.id.unwrap_or_default(),
            title: self.name,
            artist: self
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_default(),
            album: self.album.map(|a| a.name).unwrap_or_default(),
            duration_seconds: self.duration_ms / 1000,
            isrc: self
                .external_ids
                .and_then(|e| e.isrc)
                .filter(|isrc| !isrc.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: Option<Paging<ApiTrack>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatePlaylistRequest {
    pub name: String,
    pub description: Option<String>,
    pub public: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_track_mapping() {
        let raw = serde_json::json!({
            "id": "4gMgiXfqyzZLMhsksGmbQV",
            "name": "Another Brick in the Wall, Pt. 2",
            "artists": [{"name": "Pink Floyd"}, {"name": "Roger Waters"}],
            "album": {"name": "The Wall"},
            "duration_ms": 238_746,
            "external_ids": {"isrc": "GBN9Y1100088"}
        });
        let track: ApiTrack = serde_json::from_value(raw).unwrap();
        let track = track.into_track();

        assert_eq!(track.artist, "Pink Floyd");
        assert_eq!(track.duration_seconds, 238);
        assert_eq!(track.isrc.as_deref(), Some("GBN9Y1100088"));
    }

    #[test]
    fn test_api_playlist_defaults() {
        let raw = serde_json::json!({
            "id": "p1",
            "name": "Focus",
            "tracks": {"total": 12}
        });
        let playlist: ApiPlaylist = serde_json::from_value(raw).unwrap();
        let playlist = playlist.into_playlist();

        assert_eq!(playlist.track_count, 12);
        assert_eq!(playlist.description, "");
        assert!(!playlist.is_public);
    }
}
