use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, SyncError};
use crate::matcher;
use crate::models::{Playlist, PlaylistExport, Track};
use crate::service::{ApiClient, ApiResponse, Service};
use crate::spotify::models::{
    AddTracksRequest, ApiPlaylist, ApiTrack, CreatePlaylistRequest, Paging, PlaylistTrackItem,
    SearchResponse, TokenResponse,
};

const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const PAGE_LIMIT: usize = 50;
/// Spotify caps track additions at 100 URIs per request.
const ADD_BATCH_SIZE: usize = 100;

pub struct SpotifyClient {
    http: Client,
    access_token: RwLock<Option<String>>,
}

impl SpotifyClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            access_token: RwLock::new(None),
        }
    }

    /// Extract a playlist id from a pasted link or `spotify:` URI.
    pub fn parse_playlist_url(url_str: &str) -> Result<String> {
        if let Some(id) = url_str.strip_prefix("spotify:playlist:") {
            return Ok(id.to_string());
        }

        let url =
            Url::parse(url_str).map_err(|e| SyncError::Config(format!("Invalid URL: {e}")))?;
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["playlist", id, ..] if !id.is_empty() => Ok((*id).to_string()),
            _ => Err(SyncError::Config(
                "URL does not appear to be a Spotify playlist URL".to_string(),
            )),
        }
    }

    async fn token(&self) -> Result<String> {
        self.access_token.read().await.clone().ok_or_else(|| {
            SyncError::ServiceUnavailable("Spotify client is not authenticated".to_string())
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SyncError::PlaylistNotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::ApiRequest(format!(
                "Spotify returned {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn playlist_tracks(&self, id: &str) -> Result<Vec<Track>> {
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let url = format!(
                "{SPOTIFY_API_BASE}/playlists/{id}/tracks?limit={PAGE_LIMIT}&offset={offset}"
            );
            let page: Paging<PlaylistTrackItem> = self.get_json(&url).await?;
            let fetched = page.items.len();

            tracks.extend(
                page.items
                    .into_iter()
                    .filter_map(|item| item.track.map(ApiTrack::into_track)),
            );

            if page.next.is_none() || fetched == 0 {
                break;
            }
            offset += PAGE_LIMIT;
        }

        Ok(tracks)
    }
}

impl Default for SpotifyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Service for SpotifyClient {
    fn name(&self) -> &str {
        "Spotify"
    }

    async fn authenticate(&self, credentials: &HashMap<String, String>) -> Result<()> {
        let client_id = credentials
            .get("client_id")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SyncError::Config("client_id is required".to_string()))?;
        let client_secret = credentials
            .get("client_secret")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SyncError::Config("client_secret is required".to_string()))?;

        let response = self
            .http
            .post(SPOTIFY_TOKEN_URL)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::ServiceUnavailable(format!(
                "Spotify token request failed: {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        *self.access_token.write().await = Some(token.access_token);

        info!("Authenticated with Spotify");
        Ok(())
    }

    async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        let mut playlists = Vec::new();
        let mut offset = 0;

        loop {
            let url =
                format!("{SPOTIFY_API_BASE}/me/playlists?limit={PAGE_LIMIT}&offset={offset}");
            let page: Paging<ApiPlaylist> = self.get_json(&url).await?;
            let fetched = page.items.len();

            playlists.extend(page.items.into_iter().map(ApiPlaylist::into_playlist));

            if page.next.is_none() || fetched == 0 {
                break;
            }
            offset += PAGE_LIMIT;
        }

        info!("Found {} Spotify playlists", playlists.len());
        Ok(playlists)
    }

    async fn get_playlist(&self, id: &str) -> Result<Playlist> {
        let playlist: ApiPlaylist = self
            .get_json(&format!("{SPOTIFY_API_BASE}/playlists/{id}"))
            .await
            .map_err(|e| match e {
                SyncError::PlaylistNotFound(_) => SyncError::PlaylistNotFound(id.to_string()),
                other => other,
            })?;
        Ok(playlist.into_playlist())
    }

    async fn export_playlist(&self, id: &str) -> Result<PlaylistExport> {
        let playlist = self.get_playlist(id).await?;
        let tracks = self.playlist_tracks(id).await?;
        debug!("Exported \"{}\" with {} tracks", playlist.name, tracks.len());
        Ok(PlaylistExport { playlist, tracks })
    }

    async fn import_playlist(&self, export: &PlaylistExport) -> Result<Playlist> {
        let token = self.token().await?;

        let request = CreatePlaylistRequest {
            name: export.playlist.name.clone(),
            description: Some(export.playlist.description.clone()),
            public: export.playlist.is_public,
        };

        let response = self
            .http
            .post(format!("{SPOTIFY_API_BASE}/users/me/playlists"))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::ApiRequest(format!(
                "Failed to create playlist: {body}"
            )));
        }

        let created: ApiPlaylist = response.json().await?;

        let uris: Vec<String> = export
            .tracks
            .iter()
            .filter(|track| !track.id.is_empty())
            .map(|track| format!("spotify:track:{}", track.id))
            .collect();

        for chunk in uris.chunks(ADD_BATCH_SIZE) {
            let response = self
                .http
                .post(format!(
                    "{SPOTIFY_API_BASE}/playlists/{}/tracks",
                    created.id
                ))
                .bearer_auth(&token)
                .json(&AddTracksRequest {
                    uris: chunk.to_vec(),
                })
                .send()
                .await?;

            if !response.status().is_success() {
                warn!(
                    "Failed to add a batch of {} tracks to {}",
                    chunk.len(),
                    created.name
                );
            }
        }

        info!("Created Spotify playlist: {}", created.name);
        Ok(created.into_playlist())
    }

    async fn search_track(&self, title: &str, artist: &str) -> Result<Track> {
        let query = format!("{artist} {title}");
        let url = format!(
            "{SPOTIFY_API_BASE}/search?q={}&type=track&limit=20",
            urlencoding::encode(&query)
        );
        let response: SearchResponse = self.get_json(&url).await?;

        let probe = probe_track(title, artist);
        response
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .map(ApiTrack::into_track)
            .find(|candidate| matcher::tracks_match(&probe, candidate))
            .ok_or_else(|| {
                SyncError::ApiRequest(format!("no match for '{title}' by '{artist}'"))
            })
    }
}

#[async_trait]
impl ApiClient for SpotifyClient {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        let token = self.token().await?;
        let url = format!("{SPOTIFY_API_BASE}/{}", path.trim_start_matches('/'));

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        let json = serde_json::from_str(&body).ok();

        Ok(ApiResponse { status, body, json })
    }
}

/// A query-shaped track used to drive the matcher over search candidates.
pub(crate) fn probe_track(title: &str, artist: &str) -> Track {
    Track {
        id: String::new(),
        title: title.to_string(),
        artist: artist.to_string(),
        album: String::new(),
        duration_seconds: 0,
        isrc: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playlist_url_formats() {
        let id = "37i9dQZF1DXcBWIGoYBM5M";

        assert_eq!(
            SpotifyClient::parse_playlist_url(&format!("spotify:playlist:{id}")).unwrap(),
            id
        );
        assert_eq!(
            SpotifyClient::parse_playlist_url(&format!(
                "https://open.spotify.com/playlist/{id}"
            ))
            .unwrap(),
            id
        );
        assert_eq!(
            SpotifyClient::parse_playlist_url(&format!(
                "https://open.spotify.com/playlist/{id}?si=abc123"
            ))
            .unwrap(),
            id
        );
    }

    #[test]
    fn test_parse_playlist_url_rejects_non_playlists() {
        assert!(SpotifyClient::parse_playlist_url("not a url").is_err());
        assert!(
            SpotifyClient::parse_playlist_url("https://open.spotify.com/album/xyz").is_err()
        );
    }
}
