use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Playlist, PlaylistExport, Track};

/// A music-streaming backend.
///
/// The engine treats every backend error as opaque; implementations wrap
/// upstream failures into the categorical `SyncError` variants.
#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    async fn authenticate(&self, credentials: &HashMap<String, String>) -> Result<()>;

    /// List the playlists owned by the authenticated user.
    async fn get_playlists(&self) -> Result<Vec<Playlist>>;

    async fn get_playlist(&self, id: &str) -> Result<Playlist>;

    /// Fetch a playlist together with its full, ordered track listing.
    async fn export_playlist(&self, id: &str) -> Result<PlaylistExport>;

    /// Create a playlist on this service from an export and return it.
    async fn import_playlist(&self, export: &PlaylistExport) -> Result<Playlist>;

    async fn search_track(&self, title: &str, artist: &str) -> Result<Track>;
}

/// Optional side channel offered every track the engine sees.
///
/// Duplicate offers must be idempotent; implementations backed by a store
/// with a unique constraint treat constraint violations as success.
#[async_trait]
pub trait TrackCacher: Send + Sync {
    async fn cache_track(
        &self,
        service_name: &str,
        service_id: &str,
        track: &Track,
    ) -> Result<()>;
}

/// Optional cover-art lookup used by the Markdown renderer. Returning an
/// error or an empty URL suppresses cover inclusion.
#[async_trait]
pub trait CoverArtFetcher: Send + Sync {
    async fn cover_image_url(&self, playlist_id: &str) -> Result<String>;
}

/// Raw response from a read-only API call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub json: Option<serde_json::Value>,
}

/// Thin read-only API surface used by the library dump.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<ApiResponse>;
}
