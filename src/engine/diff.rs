use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::engine::SyncEngine;
use crate::engine::report::ComparisonResult;
use crate::error::{Result, SyncError};
use crate::matcher::TrackIndex;
use crate::progress::{Phase, ProgressReporter, ProgressUpdate};

impl SyncEngine {
    /// Compare one playlist across the two services.
    ///
    /// Source tracks absent from the destination land in
    /// `missing_in_dest`; destination tracks with no source counterpart
    /// land in `extra_in_dest`. Either export failing fails the whole
    /// operation; the matching loops never fail.
    pub async fn diff(
        &self,
        cancel: &CancellationToken,
        source_id: &str,
        destination_id: &str,
        progress: &ProgressReporter,
    ) -> Result<ComparisonResult> {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        progress.report(ProgressUpdate::new(
            Phase::FetchSource,
            0,
            2,
            format!("Fetching {} from {}", source_id, self.source.name()),
        ));
        let source_export = self.source.export_playlist(source_id).await.map_err(|e| {
            SyncError::PlaylistNotFound(format!(
                "{} on {}: {}",
                source_id,
                self.source.name(),
                e
            ))
        })?;

        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        progress.report(ProgressUpdate::new(
            Phase::FetchDestination,
            1,
            2,
            format!("Fetching {} from {}", destination_id, self.destination.name()),
        ));
        let dest_export = self
            .destination
            .export_playlist(destination_id)
            .await
            .map_err(|e| {
                SyncError::PlaylistNotFound(format!(
                    "{} on {}: {}",
                    destination_id,
                    self.destination.name(),
                    e
                ))
            })?;

        progress.report(ProgressUpdate::new(
            Phase::Compare,
            0,
            1,
            format!(
                "Comparing {} source tracks against {} destination tracks",
                source_export.tracks.len(),
                dest_export.tracks.len()
            ),
        ));

        let dest_index = TrackIndex::build(&dest_export.tracks);
        let mut matched_count = 0;
        let mut missing_in_dest = Vec::new();
        for track in &source_export.tracks {
            if dest_index.lookup(track).is_some() {
                matched_count += 1;
            } else {
                missing_in_dest.push(track.clone());
            }
        }

        let source_index = TrackIndex::build(&source_export.tracks);
        let extra_in_dest: Vec<_> = dest_export
            .tracks
            .iter()
            .filter(|track| source_index.lookup(track).is_none())
            .cloned()
            .collect();

        info!(
            "Compared {}: {} matched, {} missing, {} extra",
            source_export.playlist.name,
            matched_count,
            missing_in_dest.len(),
            extra_in_dest.len()
        );
        progress.report(ProgressUpdate::new(
            Phase::Compare,
            1,
            1,
            format!(
                "{} matched, {} missing, {} extra",
                matched_count,
                missing_in_dest.len(),
                extra_in_dest.len()
            ),
        ));

        Ok(ComparisonResult {
            source: source_export.playlist,
            destination: dest_export.playlist,
            matched_count,
            missing_in_dest,
            extra_in_dest,
        })
    }
}
