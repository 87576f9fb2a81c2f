use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Engine phase a progress update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    FetchSource,
    FetchDestination,
    Compare,
    CreatePlaylist,
    SearchTracks,
    ExportPlaylist,
    // Read-only phases used by the library dump.
    FetchPlaylists,
    FetchAlbums,
    FetchArtists,
    FetchTracks,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::FetchSource => "fetch_source",
            Phase::FetchDestination => "fetch_destination",
            Phase::Compare => "compare",
            Phase::CreatePlaylist => "create_playlist",
            Phase::SearchTracks => "search_tracks",
            Phase::ExportPlaylist => "export_playlist",
            Phase::FetchPlaylists => "fetch_playlists",
            Phase::FetchAlbums => "fetch_albums",
            Phase::FetchArtists => "fetch_artists",
            Phase::FetchTracks => "fetch_tracks",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub phase: Phase,
    pub step: usize,
    pub total: usize,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ProgressUpdate {
    pub fn new(phase: Phase, step: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            phase,
            step,
            total,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Best-effort sink for progress updates.
///
/// The engine never blocks on progress: when the channel is full or no
/// sink was supplied, the update is dropped. Callers must assume they may
/// miss intermediate updates and read terminal state from the returned
/// result instead.
#[derive(Clone)]
pub struct ProgressReporter {
    tx: Option<mpsc::Sender<ProgressUpdate>>,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::Sender<ProgressUpdate>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A reporter with no sink; every report is dropped.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn report(&self, update: ProgressUpdate) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reporter_delivers_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let reporter = ProgressReporter::new(tx);

        for step in 0..3 {
            reporter.report(ProgressUpdate::new(Phase::SearchTracks, step, 3, "searching"));
        }

        for step in 0..3 {
            let update = rx.recv().await.unwrap();
            assert_eq!(update.step, step);
            assert_eq!(update.phase, Phase::SearchTracks);
        }
    }

    #[tokio::test]
    async fn test_reporter_drops_on_overflow_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let reporter = ProgressReporter::new(tx);

        for step in 0..5 {
            reporter.report(ProgressUpdate::new(Phase::ExportPlaylist, step, 5, "exporting"));
        }

        // Only the first update fit; the rest were dropped silently.
        let update = rx.recv().await.unwrap();
        assert_eq!(update.step, 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disabled_reporter_is_a_no_op() {
        let reporter = ProgressReporter::disabled();
        reporter.report(ProgressUpdate::new(Phase::Compare, 0, 0, "comparing"));
    }
}
