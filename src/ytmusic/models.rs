use serde::{Deserialize, Serialize};

use crate::models::Playlist;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ListResponse<T> {
    #[serde(default)]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPlaylist {
    pub id: String,
    pub snippet: PlaylistSnippet,
    #[serde(default)]
    pub status: Option<PlaylistStatus>,
    #[serde(default)]
    pub content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistStatus {
    pub privacy_status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistContentDetails {
    pub item_count: usize,
}

impl ApiPlaylist {
    pub fn into_playlist(self) -> Playlist {
        Playlist {
            id: self.id,
            name: self.snippet.title,
            description: self.snippet.description,
            track_count: self
                .content_details
                .map(|details| details.item_count)
                .unwrap_or(0),
            is_public: self
                .status
                .map(|status| status.privacy_status == "public")
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPlaylistItem {
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItemSnippet {
    pub title: String,
    #[serde(default)]
    pub video_owner_channel_title: Option<String>,
    pub resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResourceId {
    pub video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiVideo {
    pub id: String,
    pub content_details: VideoContentDetails,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoContentDetails {
    pub duration: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    pub id: SearchId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchSnippet {
    pub title: String,
    pub channel_title: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct InsertPlaylistRequest {
    pub snippet: InsertPlaylistSnippet,
    pub status: InsertPlaylistStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct InsertPlaylistSnippet {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertPlaylistStatus {
    pub privacy_status: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct InsertItemRequest {
    pub snippet: InsertItemSnippet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertItemSnippet {
    pub playlist_id: String,
    pub resource_id: InsertResourceId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertResourceId {
    pub kind: String,
    pub video_id: String,
}

/// Strip the " - Topic" suffix YouTube Music puts on autogenerated artist
/// channels.
pub(crate) fn artist_from_channel(channel: &str) -> String {
    channel.strip_suffix(" - Topic").unwrap_or(channel).to_string()
}
