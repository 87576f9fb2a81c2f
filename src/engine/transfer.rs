use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::SyncEngine;
use crate::engine::report::{TrackMatchResult, TransferRunResult};
use crate::error::{Result, SyncError};
use crate::models::{Playlist, PlaylistExport};
use crate::progress::{Phase, ProgressReporter, ProgressUpdate};

#[derive(Debug, Clone, Default)]
pub struct TransferOptions {
    /// Compute matches but skip the destination create.
    pub dry_run: bool,
}

impl SyncEngine {
    /// Migrate one playlist from the source service to the destination.
    ///
    /// `playlist` is a source playlist id; when no playlist with that id
    /// exists, the caller's playlists are searched for an exact name match
    /// (case-sensitive) before giving up.
    ///
    /// Per-track search failures are recorded in the result, not fatal.
    /// When nothing matched, no destination playlist is created and the
    /// result carries an `EmptyMatch` error.
    pub async fn transfer(
        &self,
        cancel: &CancellationToken,
        playlist: &str,
        options: &TransferOptions,
        progress: &ProgressReporter,
    ) -> Result<TransferRunResult> {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        progress.report(ProgressUpdate::new(
            Phase::FetchSource,
            0,
            1,
            format!("Fetching playlist {} from {}", playlist, self.source.name()),
        ));

        let source_export = self.resolve_source_export(cancel, playlist).await?;
        let source_name = source_export.playlist.name.clone();
        let total = source_export.tracks.len();

        info!(
            "Transferring playlist: {} ({} tracks)",
            source_name, total
        );
        progress.report(ProgressUpdate::new(
            Phase::FetchSource,
            1,
            1,
            format!("Fetched \"{}\" ({} tracks)", source_name, total),
        ));

        let mut matches = Vec::with_capacity(total);
        let mut success_count = 0;
        let mut failed_count = 0;

        for (i, track) in source_export.tracks.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            progress.report(ProgressUpdate::new(
                Phase::SearchTracks,
                i,
                total,
                format!("Searching \"{}\" by {}", track.title, track.artist),
            ));

            self.offer_to_cache(self.source.name(), track);

            match self
                .destination
                .search_track(&track.title, &track.artist)
                .await
            {
                Ok(found) => {
                    success_count += 1;
                    self.offer_to_cache(self.destination.name(), &found);
                    matches.push(TrackMatchResult::matched(track.clone(), found));
                }
                Err(e) => {
                    debug!("No match for {} - {}: {}", track.artist, track.title, e);
                    failed_count += 1;
                    matches.push(TrackMatchResult::failed(track.clone(), e));
                }
            }
        }

        progress.report(ProgressUpdate::new(
            Phase::SearchTracks,
            total,
            total,
            format!("Matched {}/{} tracks", success_count, total),
        ));

        let mut result =
            TransferRunResult::from_matches(source_export, matches, success_count, failed_count);

        if success_count == 0 {
            warn!(
                "No tracks matched for {}; skipping playlist creation",
                source_name
            );
            result.error = Some(SyncError::EmptyMatch(source_name));
            return Ok(result);
        }

        if options.dry_run {
            info!("Dry run: skipping playlist creation for {}", source_name);
            return Ok(result);
        }

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        progress.report(ProgressUpdate::new(
            Phase::CreatePlaylist,
            0,
            1,
            format!("Creating \"{}\" on {}", source_name, self.destination.name()),
        ));

        let to_create = self.destination_export(&result);
        match self.destination.import_playlist(&to_create).await {
            Ok(created) => {
                info!(
                    "Created playlist {} on {} with {}/{} tracks",
                    created.name,
                    self.destination.name(),
                    success_count,
                    total
                );
                progress.report(ProgressUpdate::new(
                    Phase::CreatePlaylist,
                    1,
                    1,
                    format!("Created \"{}\"", created.name),
                ));
                result.destination = Some(created);
            }
            Err(e) => {
                warn!("Failed to create playlist {}: {}", source_name, e);
                result.error = Some(e);
            }
        }

        Ok(result)
    }

    /// Resolve a playlist reference to its export: direct id first, then a
    /// case-sensitive name lookup over the caller's playlists.
    async fn resolve_source_export(
        &self,
        cancel: &CancellationToken,
        playlist: &str,
    ) -> Result<PlaylistExport> {
        match self.source.export_playlist(playlist).await {
            Ok(export) => return Ok(export),
            Err(e) => {
                debug!("Direct export of {} failed ({}); trying name lookup", playlist, e);
            }
        }

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let playlists = self
            .source
            .get_playlists()
            .await
            .map_err(|e| SyncError::PlaylistNotFound(format!("{playlist}: {e}")))?;

        let Some(found) = playlists.iter().find(|p| p.name == playlist) else {
            return Err(SyncError::PlaylistNotFound(playlist.to_string()));
        };

        self.source
            .export_playlist(&found.id)
            .await
            .map_err(|e| SyncError::PlaylistNotFound(format!("{playlist}: {e}")))
    }

    /// Build the destination-side export: matched tracks only, in source
    /// order, created private.
    fn destination_export(&self, result: &TransferRunResult) -> PlaylistExport {
        let tracks: Vec<_> = result
            .matches
            .iter()
            .filter_map(|m| m.matched.clone())
            .collect();

        PlaylistExport {
            playlist: Playlist {
                id: String::new(),
                name: result.source.playlist.name.clone(),
                description: format!(
                    "Migrated from {}: {}",
                    self.source.name(),
                    result.source.playlist.name
                ),
                track_count: tracks.len(),
                is_public: false,
            },
            tracks,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::*;
    use crate::cache::MemoryTrackCache;
    use crate::engine::testing::MockService;
    use crate::models::Track;

    fn engine(source: MockService, destination: MockService) -> SyncEngine {
        SyncEngine::new(Arc::new(source), Arc::new(destination))
    }

    fn source_with_playlist(tracks: Vec<Track>) -> MockService {
        MockService::new("Spotify").with_export(PlaylistExport::mock("p1", "Road Trip", tracks))
    }

    #[tokio::test]
    async fn test_transfer_full_success() {
        let t1 = Track::mock("Go Your Own Way", "Fleetwood Mac");
        let t2 = Track::mock("Dreams", "Fleetwood Mac");
        let source = source_with_playlist(vec![t1.clone(), t2.clone()]);
        let destination =
            MockService::new("YouTube Music").with_searchable(&[t1.clone(), t2.clone()]);

        let result = engine(source, destination)
            .transfer(
                &CancellationToken::new(),
                "p1",
                &TransferOptions::default(),
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap();

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failed_count, 0);
        assert_eq!(result.total, 2);
        assert_eq!(result.match_percentage, 100.0);
        assert!(result.error.is_none());

        let destination = result.destination.unwrap();
        assert_eq!(destination.name, "Road Trip");
        assert!(!destination.is_public);
    }

    #[tokio::test]
    async fn test_transfer_partial_match() {
        let t1 = Track::mock("Go Your Own Way", "Fleetwood Mac");
        let t2 = Track::mock("Dreams", "Fleetwood Mac");
        let t3 = Track::mock("The Chain", "Fleetwood Mac");
        let source = source_with_playlist(vec![t1.clone(), t2.clone(), t3.clone()]);
        // Only the first and third tracks are findable downstream.
        let destination =
            MockService::new("YouTube Music").with_searchable(&[t1.clone(), t3.clone()]);

        let result = engine(source, destination)
            .transfer(
                &CancellationToken::new(),
                "p1",
                &TransferOptions::default(),
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap();

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.matches.len(), 3);
        assert!(result.matches[1].error.is_some());
        assert!(result.matches[1].matched.is_none());
        assert!(result.destination.is_some());

        // Match order aligns with source order.
        assert_eq!(result.matches[0].original.title, "Go Your Own Way");
        assert_eq!(result.matches[2].original.title, "The Chain");
    }

    #[tokio::test]
    async fn test_transfer_total_miss_creates_nothing() {
        let tracks = vec![
            Track::mock("Obscure Song", "Unknown Artist"),
            Track::mock("Rarer Still", "Unknown Artist"),
        ];
        let source = source_with_playlist(tracks);
        let destination = MockService::new("YouTube Music");

        let result = engine(source, destination)
            .transfer(
                &CancellationToken::new(),
                "p1",
                &TransferOptions::default(),
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap();

        assert_eq!(result.success_count, 0);
        assert_eq!(result.failed_count, 2);
        assert!(result.destination.is_none());
        assert!(matches!(result.error, Some(SyncError::EmptyMatch(_))));
    }

    #[tokio::test]
    async fn test_transfer_resolves_by_name_when_id_misses() {
        let t1 = Track::mock("Dreams", "Fleetwood Mac");
        let source = source_with_playlist(vec![t1.clone()]);
        let destination = MockService::new("YouTube Music").with_searchable(&[t1]);

        let result = engine(source, destination)
            .transfer(
                &CancellationToken::new(),
                "Road Trip",
                &TransferOptions::default(),
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap();

        assert_eq!(result.success_count, 1);
    }

    #[tokio::test]
    async fn test_transfer_name_lookup_is_case_sensitive() {
        let source = source_with_playlist(vec![Track::mock("Dreams", "Fleetwood Mac")]);
        let destination = MockService::new("YouTube Music");

        let err = engine(source, destination)
            .transfer(
                &CancellationToken::new(),
                "road trip",
                &TransferOptions::default(),
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::PlaylistNotFound(_)));
    }

    #[tokio::test]
    async fn test_transfer_dry_run_skips_create() {
        let t1 = Track::mock("Dreams", "Fleetwood Mac");
        let source = source_with_playlist(vec![t1.clone()]);
        let destination = Arc::new(MockService::new("YouTube Music").with_searchable(&[t1]));

        let engine = SyncEngine::new(
            Arc::new(source),
            Arc::clone(&destination) as Arc<dyn crate::service::Service>,
        );
        let result = engine
            .transfer(
                &CancellationToken::new(),
                "p1",
                &TransferOptions { dry_run: true },
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap();

        assert_eq!(result.success_count, 1);
        assert!(result.destination.is_none());
        assert!(result.error.is_none());
        assert!(destination.imported.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_transfer_create_failure_keeps_counts() {
        let t1 = Track::mock("Dreams", "Fleetwood Mac");
        let source = source_with_playlist(vec![t1.clone()]);
        let destination = MockService::new("YouTube Music")
            .with_searchable(&[t1])
            .with_fail_import();

        let result = engine(source, destination)
            .transfer(
                &CancellationToken::new(),
                "p1",
                &TransferOptions::default(),
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap();

        assert_eq!(result.success_count, 1);
        assert!(result.destination.is_none());
        assert!(matches!(result.error, Some(SyncError::ApiRequest(_))));
    }

    #[tokio::test]
    async fn test_transfer_cancelled_before_start() {
        let source = source_with_playlist(vec![Track::mock("Dreams", "Fleetwood Mac")]);
        let destination = MockService::new("YouTube Music");

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = engine(source, destination)
            .transfer(
                &cancel,
                "p1",
                &TransferOptions::default(),
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
    }

    #[tokio::test]
    async fn test_transfer_offers_tracks_to_cacher() {
        let t1 = Track::mock("Dreams", "Fleetwood Mac");
        let source = source_with_playlist(vec![t1.clone()]);
        let destination = MockService::new("YouTube Music").with_searchable(&[t1]);
        let cache = Arc::new(MemoryTrackCache::new());

        let engine = SyncEngine::new(Arc::new(source), Arc::new(destination))
            .with_cacher(Arc::clone(&cache) as Arc<dyn crate::service::TrackCacher>);

        engine
            .transfer(
                &CancellationToken::new(),
                "p1",
                &TransferOptions::default(),
                &ProgressReporter::disabled(),
            )
            .await
            .unwrap();

        // Cache offers are fire-and-forget tasks; give them a beat.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_transfer_emits_ordered_progress() {
        let t1 = Track::mock("Dreams", "Fleetwood Mac");
        let source = source_with_playlist(vec![t1.clone()]);
        let destination = MockService::new("YouTube Music").with_searchable(&[t1]);

        let (tx, mut rx) = mpsc::channel(64);
        engine(source, destination)
            .transfer(
                &CancellationToken::new(),
                "p1",
                &TransferOptions::default(),
                &ProgressReporter::new(tx),
            )
            .await
            .unwrap();

        let mut phases = Vec::new();
        while let Ok(update) = rx.try_recv() {
            phases.push(update.phase);
        }
        assert_eq!(phases.first(), Some(&Phase::FetchSource));
        assert!(phases.contains(&Phase::SearchTracks));
        assert_eq!(phases.last(), Some(&Phase::CreatePlaylist));
    }
}
