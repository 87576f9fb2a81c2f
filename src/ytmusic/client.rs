use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::matcher;
use crate::models::{Playlist, PlaylistExport, Track};
use crate::service::Service;
use crate::spotify::client::probe_track;
use crate::ytmusic::models::{
    ApiPlaylist, ApiPlaylistItem, ApiVideo, InsertItemRequest, InsertItemSnippet,
    InsertPlaylistRequest, InsertPlaylistSnippet, InsertPlaylistStatus, InsertResourceId,
    ListResponse, SearchItem, artist_from_channel,
};

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const PAGE_LIMIT: usize = 50;
/// videos.list accepts at most 50 ids per call.
const VIDEO_BATCH_SIZE: usize = 50;

pub struct YtMusicClient {
    http: Client,
    access_token: RwLock<Option<String>>,
}

impl YtMusicClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            access_token: RwLock::new(None),
        }
    }

    async fn token(&self) -> Result<String> {
        self.access_token.read().await.clone().ok_or_else(|| {
            SyncError::ServiceUnavailable(
                "YouTube Music client is not authenticated".to_string(),
            )
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let token = self.token().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SyncError::PlaylistNotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::ApiRequest(format!(
                "YouTube returned {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T> {
        let token = self.token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::ApiRequest(format!(
                "YouTube returned {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn playlist_items(&self, id: &str) -> Result<Vec<ApiPlaylistItem>> {
        let mut items = Vec::new();
        let mut page_token = String::new();

        loop {
            let url = format!(
                "{YOUTUBE_API_BASE}/playlistItems?part=snippet&maxResults={PAGE_LIMIT}\
                 &playlistId={id}&pageToken={page_token}"
            );
            let page: ListResponse<ApiPlaylistItem> = self.get_json(&url).await?;
            items.extend(page.items);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = next,
                _ => break,
            }
        }

        Ok(items)
    }

    /// Resolve per-video durations, batched at the API's id limit.
    async fn video_durations(&self, video_ids: &[String]) -> Result<HashMap<String, u64>> {
        let mut durations = HashMap::with_capacity(video_ids.len());

        for chunk in video_ids.chunks(VIDEO_BATCH_SIZE) {
            let url = format!(
                "{YOUTUBE_API_BASE}/videos?part=contentDetails&id={}",
                chunk.join(",")
            );
            let page: ListResponse<ApiVideo> = self.get_json(&url).await?;
            for video in page.items {
                let seconds =
                    parse_iso8601_duration(&video.content_details.duration).unwrap_or(0);
                durations.insert(video.id, seconds);
            }
        }

        Ok(durations)
    }
}

impl Default for YtMusicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Service for YtMusicClient {
    fn name(&self) -> &str {
        "YouTube Music"
    }

    /// Stores the caller-supplied OAuth bearer token; the authorization
    /// flow that produced it happens outside this client.
    async fn authenticate(&self, credentials: &HashMap<String, String>) -> Result<()> {
        let access_token = credentials
            .get("access_token")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SyncError::Config("access_token is required".to_string()))?;

        *self.access_token.write().await = Some(access_token.clone());
        info!("Authenticated with YouTube Music");
        Ok(())
    }

    async fn get_playlists(&self) -> Result<Vec<Playlist>> {
        let mut playlists = Vec::new();
        let mut page_token = String::new();

        loop {
            let url = format!(
                "{YOUTUBE_API_BASE}/playlists?part=snippet,status,contentDetails\
                 &mine=true&maxResults={PAGE_LIMIT}&pageToken={page_token}"
            );
            let page: ListResponse<ApiPlaylist> = self.get_json(&url).await?;
            playlists.extend(page.items.into_iter().map(ApiPlaylist::into_playlist));

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = next,
                _ => break,
            }
        }

        info!("Found {} YouTube Music playlists", playlists.len());
        Ok(playlists)
    }

    async fn get_playlist(&self, id: &str) -> Result<Playlist> {
        let url = format!(
            "{YOUTUBE_API_BASE}/playlists?part=snippet,status,contentDetails&id={id}"
        );
        let page: ListResponse<ApiPlaylist> = self.get_json(&url).await?;

        page.items
            .into_iter()
            .next()
            .map(ApiPlaylist::into_playlist)
            .ok_or_else(|| SyncError::PlaylistNotFound(id.to_string()))
    }

    async fn export_playlist(&self, id: &str) -> Result<PlaylistExport> {
        let playlist = self.get_playlist(id).await?;
        let items = self.playlist_items(id).await?;

        let video_ids: Vec<String> = items
            .iter()
            .map(|item| item.snippet.resource_id.video_id.clone())
            .collect();
        let durations = self.video_durations(&video_ids).await?;

        let tracks = items
            .into_iter()
            .map(|item| {
                let video_id = item.snippet.resource_id.video_id;
                let duration_seconds = durations.get(&video_id).copied().unwrap_or(0);
                Track {
                    id: video_id,
                    title: item.snippet.title,
                    artist: item
                        .snippet
                        .video_owner_channel_title
                        .as_deref()
                        .map(artist_from_channel)
                        .unwrap_or_default(),
                    album: String::new(),
                    duration_seconds,
                    // The Data API does not expose recording codes.
                    isrc: None,
                }
            })
            .collect();

        debug!("Exported \"{}\"", playlist.name);
        Ok(PlaylistExport { playlist, tracks })
    }

    async fn import_playlist(&self, export: &PlaylistExport) -> Result<Playlist> {
        let request = InsertPlaylistRequest {
            snippet: InsertPlaylistSnippet {
                title: export.playlist.name.clone(),
                description: export.playlist.description.clone(),
            },
            status: InsertPlaylistStatus {
                privacy_status: if export.playlist.is_public {
                    "public".to_string()
                } else {
                    "private".to_string()
                },
            },
        };

        let created: ApiPlaylist = self
            .post_json(
                &format!("{YOUTUBE_API_BASE}/playlists?part=snippet,status"),
                &request,
            )
            .await?;

        // playlistItems has no batch insert; one call per track.
        for track in &export.tracks {
            if track.id.is_empty() {
                continue;
            }
            let item = InsertItemRequest {
                snippet: InsertItemSnippet {
                    playlist_id: created.id.clone(),
                    resource_id: InsertResourceId {
                        kind: "youtube#video".to_string(),
                        video_id: track.id.clone(),
                    },
                },
            };
            let added: Result<serde_json::Value> = self
                .post_json(
                    &format!("{YOUTUBE_API_BASE}/playlistItems?part=snippet"),
                    &item,
                )
                .await;
            if let Err(e) = added {
                warn!(
                    "Failed to add \"{}\" to {}: {}",
                    track.title, export.playlist.name, e
                );
            }
        }

        info!("Created YouTube Music playlist: {}", export.playlist.name);
        Ok(created.into_playlist())
    }

    async fn search_track(&self, title: &str, artist: &str) -> Result<Track> {
        let query = format!("{artist} {title}");
        let url = format!(
            "{YOUTUBE_API_BASE}/search?part=snippet&type=video&videoCategoryId=10\
             &maxResults=10&q={}",
            urlencoding::encode(&query)
        );
        let page: ListResponse<SearchItem> = self.get_json(&url).await?;

        let probe = probe_track(title, artist);
        page.items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(Track {
                    id: video_id,
                    title: item.snippet.title,
                    artist: artist_from_channel(&item.snippet.channel_title),
                    album: String::new(),
                    duration_seconds: 0,
                    isrc: None,
                })
            })
            .find(|candidate| matcher::tracks_match(&probe, candidate))
            .ok_or_else(|| {
                SyncError::ApiRequest(format!("no match for '{title}' by '{artist}'"))
            })
    }
}

/// Parse the ISO-8601 durations the Data API reports (`PT1H2M3S`, `PT47S`).
pub(crate) fn parse_iso8601_duration(raw: &str) -> Option<u64> {
    let rest = raw.strip_prefix("PT")?;

    let mut seconds = 0u64;
    let mut value = 0u64;
    for c in rest.chars() {
        match c {
            '0'..='9' => value = value * 10 + (c as u64 - '0' as u64),
            'H' => {
                seconds += value * 3600;
                value = 0;
            }
            'M' => {
                seconds += value * 60;
                value = 0;
            }
            'S' => {
                seconds += value;
                value = 0;
            }
            _ => return None,
        }
    }

    Some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT3M25S"), Some(205));
        assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
        assert_eq!(parse_iso8601_duration("PT47S"), Some(47));
        assert_eq!(parse_iso8601_duration("PT2M"), Some(120));
        assert_eq!(parse_iso8601_duration("PT0S"), Some(0));
    }

    #[test]
    fn test_parse_iso8601_duration_rejects_garbage() {
        assert_eq!(parse_iso8601_duration(""), None);
        assert_eq!(parse_iso8601_duration("3:25"), None);
        assert_eq!(parse_iso8601_duration("P1DT2H"), None);
        assert_eq!(parse_iso8601_duration("PT3X"), None);
    }
}
