use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{Result, SyncError};
use crate::progress::{Phase, ProgressReporter, ProgressUpdate};
use crate::service::ApiClient;

/// The read-only sections a dump fetches, in output order.
const SECTIONS: [(Phase, &str, &str); 4] = [
    (Phase::FetchPlaylists, "playlists", "me/playlists"),
    (Phase::FetchAlbums, "albums", "me/albums"),
    (Phase::FetchArtists, "artists", "me/following?type=artist"),
    (Phase::FetchTracks, "tracks", "me/tracks"),
];

#[derive(Debug, Serialize)]
pub struct DumpSection {
    pub name: String,
    pub data: serde_json::Value,
}

/// Snapshot of a user's library as raw API documents.
#[derive(Debug, Serialize)]
pub struct LibraryDump {
    pub service: String,
    pub created_at: DateTime<Utc>,
    pub sections: Vec<DumpSection>,
}

/// Read-only library snapshot driven through the generic API surface.
///
/// Per-section failures are recorded in place as `{"error": ...}` values;
/// a dump with failed sections still writes its document.
pub struct LibraryDumper<'a> {
    client: &'a dyn ApiClient,
    service: String,
}

impl<'a> LibraryDumper<'a> {
    pub fn new(client: &'a dyn ApiClient, service: impl Into<String>) -> Self {
        Self {
            client,
            service: service.into(),
        }
    }

    pub async fn run(
        &self,
        cancel: &CancellationToken,
        output_dir: &Path,
        progress: &ProgressReporter,
    ) -> Result<PathBuf> {
        let total = SECTIONS.len();
        let mut sections = Vec::with_capacity(total);

        for (i, (phase, name, path)) in SECTIONS.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            progress.report(ProgressUpdate::new(
                *phase,
                i,
                total,
                format!("Fetching {name}"),
            ));

            let data = match self.client.get(path).await {
                Ok(response) if (200..300).contains(&response.status) => response
                    .json
                    .unwrap_or(serde_json::Value::String(response.body)),
                Ok(response) => {
                    warn!("Dump section {} returned HTTP {}", name, response.status);
                    serde_json::json!({ "error": format!("HTTP {}", response.status) })
                }
                Err(e) => {
                    warn!("Dump section {} failed: {}", name, e);
                    serde_json::json!({ "error": e.to_string() })
                }
            };

            sections.push(DumpSection {
                name: (*name).to_string(),
                data,
            });
        }

        let dump = LibraryDump {
            service: self.service.clone(),
            created_at: Utc::now(),
            sections,
        };

        tokio::fs::create_dir_all(output_dir).await?;
        let path = output_dir.join(format!(
            "{}_library_{}.json",
            self.service.to_lowercase().replace(' ', "_"),
            dump.created_at.timestamp()
        ));
        tokio::fs::write(&path, serde_json::to_string_pretty(&dump)?).await?;

        info!("Library dump written to {}", path.display());
        Ok(path)
    }
}
