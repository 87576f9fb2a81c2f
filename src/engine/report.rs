use std::path::PathBuf;

use crate::error::SyncError;
use crate::models::{Playlist, PlaylistExport, Track};

/// Outcome of matching one source track against the destination catalog.
#[derive(Debug)]
pub struct TrackMatchResult {
    pub original: Track,
    pub matched: Option<Track>,
    pub error: Option<SyncError>,
}

impl TrackMatchResult {
    pub fn matched(original: Track, found: Track) -> Self {
        Self {
            original,
            matched: Some(found),
            error: None,
        }
    }

    pub fn failed(original: Track, error: SyncError) -> Self {
        Self {
            original,
            matched: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.matched.is_some()
    }
}

/// Aggregate outcome of one playlist transfer.
///
/// `error` carries a terminal failure (empty match, destination create
/// failure) alongside the partial result; hard setup failures surface as
/// `Err` from the operation instead.
#[derive(Debug)]
pub struct TransferRunResult {
    pub source: PlaylistExport,
    pub destination: Option<Playlist>,
    pub matches: Vec<TrackMatchResult>,
    pub success_count: usize,
    pub failed_count: usize,
    pub total: usize,
    pub match_percentage: f64,
    pub error: Option<SyncError>,
}

impl TransferRunResult {
    pub(crate) fn from_matches(
        source: PlaylistExport,
        matches: Vec<TrackMatchResult>,
        success_count: usize,
        failed_count: usize,
    ) -> Self {
        let total = matches.len();
        let match_percentage = if total > 0 {
            (success_count as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Self {
            source,
            destination: None,
            matches,
            success_count,
            failed_count,
            total,
            match_percentage,
            error: None,
        }
    }
}

/// Pairwise playlist comparison across two services.
#[derive(Debug)]
pub struct ComparisonResult {
    pub source: Playlist,
    pub destination: Playlist,
    pub matched_count: usize,
    pub missing_in_dest: Vec<Track>,
    pub extra_in_dest: Vec<Track>,
}

/// Unit of work handed from the bulk fetch stage to a render worker.
#[derive(Debug)]
pub struct PlaylistExportJob {
    pub playlist_id: String,
    pub export: PlaylistExport,
}

#[derive(Debug)]
pub struct PlaylistExportResult {
    pub playlist_id: String,
    pub playlist_name: String,
    pub success: bool,
    pub files: Vec<PathBuf>,
    pub error: Option<SyncError>,
}

impl PlaylistExportResult {
    pub fn succeeded(playlist_id: String, playlist_name: String, files: Vec<PathBuf>) -> Self {
        Self {
            playlist_id,
            playlist_name,
            success: true,
            files,
            error: None,
        }
    }

    pub fn failed(playlist_id: String, playlist_name: String, error: SyncError) -> Self {
        Self {
            playlist_id,
            playlist_name,
            success: false,
            files: Vec::new(),
            error: Some(error),
        }
    }
}

/// Aggregate outcome of one bulk export run.
///
/// `results` arrive in worker completion order, not input order; callers
/// needing stable ordering sort by `playlist_id`. `manifest_path` is unset
/// and `error` set when the manifest write failed.
#[derive(Debug)]
pub struct BulkExportResult {
    pub total_playlists: usize,
    pub successful_exports: usize,
    pub failed_exports: usize,
    pub results: Vec<PlaylistExportResult>,
    pub output_directory: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub error: Option<SyncError>,
}
