pub mod bulk;
pub mod diff;
pub mod dump;
pub mod manifest;
pub mod report;
pub mod transfer;

use std::sync::Arc;

use tracing::debug;

use crate::models::Track;
use crate::service::{Service, TrackCacher};

pub use bulk::{BulkExportOptions, BulkExporter};
pub use dump::{LibraryDump, LibraryDumper};
pub use manifest::{ExportManifest, ManifestEntry};
pub use report::{
    BulkExportResult, ComparisonResult, PlaylistExportJob, PlaylistExportResult,
    TrackMatchResult, TransferRunResult,
};
pub use transfer::TransferOptions;

/// Orchestrator for the source→destination operations (transfer, diff).
///
/// One engine may run operations serially; operations are not reentrant.
pub struct SyncEngine {
    source: Arc<dyn Service>,
    destination: Arc<dyn Service>,
    cacher: Option<Arc<dyn TrackCacher>>,
}

impl SyncEngine {
    pub fn new(source: Arc<dyn Service>, destination: Arc<dyn Service>) -> Self {
        Self {
            source,
            destination,
            cacher: None,
        }
    }

    /// Attach an optional track cache that is offered every track the
    /// engine sees.
    pub fn with_cacher(mut self, cacher: Arc<dyn TrackCacher>) -> Self {
        self.cacher = Some(cacher);
        self
    }

    /// Fire-and-forget cache offer. Cache errors are swallowed; the offer
    /// never blocks or fails the running operation.
    pub(crate) fn offer_to_cache(&self, service_name: &str, track: &Track) {
        let Some(cacher) = &self.cacher else { return };

        let cacher = Arc::clone(cacher);
        let service_name = service_name.to_string();
        let track = track.clone();
        tokio::spawn(async move {
            if let Err(e) = cacher.cache_track(&service_name, &track.id, &track).await {
                debug!("Track cache rejected {}: {}", track.id, e);
            }
        });
    }
}
