use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::models::Track;
use crate::service::TrackCacher;

/// In-process track cache keyed by (service name, service-side track id).
///
/// Re-offering a known track overwrites in place, so duplicate offers are
/// idempotent.
#[derive(Default)]
pub struct MemoryTrackCache {
    tracks: Mutex<HashMap<(String, String), Track>>,
}

impl MemoryTrackCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tracks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tracks.lock().await.is_empty()
    }
}

#[async_trait]
impl TrackCacher for MemoryTrackCache {
    async fn cache_track(
        &self,
        service_name: &str,
        service_id: &str,
        track: &Track,
    ) -> Result<()> {
        let mut tracks = self.tracks.lock().await;
        tracks.insert(
            (service_name.to_string(), service_id.to_string()),
            track.clone(),
        );
        debug!("Cached track {} from {}", service_id, service_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_offers_are_idempotent() {
        let cache = MemoryTrackCache::new();
        let track = Track::mock("Heroes", "David Bowie");

        cache.cache_track("spotify", "t1", &track).await.unwrap();
        cache.cache_track("spotify", "t1", &track).await.unwrap();
        cache.cache_track("ytmusic", "t1", &track).await.unwrap();

        assert_eq!(cache.len().await, 2);
    }
}
