use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::manifest;
use crate::engine::report::{BulkExportResult, PlaylistExportJob, PlaylistExportResult};
use crate::error::{Result, SyncError};
use crate::export::{self, ExportFormat};
use crate::progress::{Phase, ProgressReporter, ProgressUpdate};
use crate::ratelimit::{self, RateLimiter};
use crate::service::{CoverArtFetcher, Service};

const DEFAULT_WORKERS: usize = 5;
const MAX_WORKERS: usize = 10;
/// Cover downloads are outside the upstream API timeout and get their own.
const COVER_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct BulkExportOptions {
    pub format: ExportFormat,
    /// Defaults to `<service>_export_<unix_seconds>` when unset.
    pub output_dir: Option<PathBuf>,
    /// 0 selects the default of 5; clamped to at most 10.
    pub num_workers: usize,
    /// Fetch-stage requests per second; non-positive selects 5.0.
    pub rate_limit: f64,
    pub cover_art: Option<Arc<dyn CoverArtFetcher>>,
}

impl Default for BulkExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Json,
            output_dir: None,
            num_workers: DEFAULT_WORKERS,
            rate_limit: ratelimit::DEFAULT_RATE,
            cover_art: None,
        }
    }
}

/// Worker-pool fanout of per-playlist export jobs.
///
/// Two-stage pipeline: a rate-limited producer fetches playlist exports
/// and queues render jobs; N workers render to disk and push results; the
/// collector drains results on the caller's task and writes the manifest.
pub struct BulkExporter {
    service: Arc<dyn Service>,
}

impl BulkExporter {
    pub fn new(service: Arc<dyn Service>) -> Self {
        Self { service }
    }

    /// Export every listed playlist under one output directory.
    ///
    /// Per-playlist failures are recorded, never fatal to peers.
    /// Cancellation is graceful: fetching stops, outstanding work drains,
    /// and the partial result comes back without an error. A manifest is
    /// always attempted; a manifest-write failure is reported in the
    /// result's `error` alongside the completed work.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        playlist_ids: &[String],
        options: &BulkExportOptions,
        progress: &ProgressReporter,
    ) -> Result<BulkExportResult> {
        let output_dir = options.output_dir.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}_export_{}",
                self.service.name().to_lowercase().replace(' ', "_"),
                Utc::now().timestamp()
            ))
        });

        tokio::fs::create_dir_all(&output_dir).await?;

        let num_workers = match options.num_workers {
            0 => DEFAULT_WORKERS,
            n => n.min(MAX_WORKERS),
        };
        let total_playlists = playlist_ids.len();

        info!(
            "Bulk export: {} playlists from {} to {} ({} format, {} workers)",
            total_playlists,
            self.service.name(),
            output_dir.display(),
            options.format,
            num_workers
        );

        let capacity = total_playlists.max(1);
        let (jobs_tx, jobs_rx) = flume::bounded::<PlaylistExportJob>(capacity);
        let (results_tx, mut results_rx) = mpsc::channel::<PlaylistExportResult>(capacity);

        let producer = tokio::spawn(produce_jobs(
            Arc::clone(&self.service),
            playlist_ids.to_vec(),
            options.rate_limit,
            jobs_tx,
            results_tx.clone(),
            progress.clone(),
            cancel.clone(),
        ));

        let http = reqwest::Client::builder()
            .timeout(COVER_FETCH_TIMEOUT)
            .build()?;

        let mut workers = JoinSet::new();
        for worker_id in 0..num_workers {
            workers.spawn(run_worker(
                worker_id,
                jobs_rx.clone(),
                results_tx.clone(),
                output_dir.clone(),
                options.format,
                options.cover_art.clone(),
                http.clone(),
                cancel.clone(),
            ));
        }
        drop(jobs_rx);

        // The collector's recv ends once the producer and every worker
        // have dropped their sender clones.
        drop(results_tx);

        let mut result = BulkExportResult {
            total_playlists,
            successful_exports: 0,
            failed_exports: 0,
            results: Vec::with_capacity(total_playlists),
            output_directory: output_dir.clone(),
            manifest_path: None,
            error: None,
        };

        while let Some(item) = results_rx.recv().await {
            let step = result.results.len() + 1;
            let update = if item.success {
                result.successful_exports += 1;
                ProgressUpdate::new(
                    Phase::ExportPlaylist,
                    step,
                    total_playlists,
                    format!("Exported \"{}\"", item.playlist_name),
                )
            } else {
                result.failed_exports += 1;
                ProgressUpdate::new(
                    Phase::ExportPlaylist,
                    step,
                    total_playlists,
                    format!("Export of {} failed", item.playlist_id),
                )
            };
            progress.report(update);
            result.results.push(item);
        }

        let _ = producer.await;
        while workers.join_next().await.is_some() {}

        match manifest::write_manifest(&output_dir, options.format, &result).await {
            Ok(path) => result.manifest_path = Some(path),
            Err(e) => {
                warn!("Export completed but failed to write manifest: {}", e);
                result.error = Some(SyncError::Io(std::io::Error::other(format!(
                    "export completed but failed to write manifest: {e}"
                ))));
            }
        }

        Ok(result)
    }
}

/// Fetch stage. Rate-limits every `export_playlist` call; fetch failures
/// become synthetic failed results that bypass the workers. Dropping the
/// jobs sender on return closes the channel for the pool.
async fn produce_jobs(
    service: Arc<dyn Service>,
    playlist_ids: Vec<String>,
    rate_limit: f64,
    jobs: flume::Sender<PlaylistExportJob>,
    results: mpsc::Sender<PlaylistExportResult>,
    progress: ProgressReporter,
    cancel: CancellationToken,
) {
    let total = playlist_ids.len();
    progress.report(ProgressUpdate::new(
        Phase::FetchSource,
        0,
        total,
        format!("Fetching {} playlists from {}", total, service.name()),
    ));

    let mut limiter = RateLimiter::new(rate_limit);

    for (i, id) in playlist_ids.iter().enumerate() {
        if limiter.acquire(&cancel).await.is_err() {
            debug!("Bulk fetch cancelled after {} of {} playlists", i, total);
            return;
        }

        match service.export_playlist(id).await {
            Ok(playlist_export) => {
                progress.report(ProgressUpdate::new(
                    Phase::ExportPlaylist,
                    i + 1,
                    total,
                    format!("Queued \"{}\"", playlist_export.playlist.name),
                ));
                let job = PlaylistExportJob {
                    playlist_id: id.clone(),
                    export: playlist_export,
                };
                if jobs.send_async(job).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to fetch playlist {}: {}", id, e);
                let failed = PlaylistExportResult::failed(
                    id.clone(),
                    String::new(),
                    SyncError::ApiRequest(format!("fetch {id}: {e}")),
                );
                if results.send(failed).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Render stage. Each worker pulls jobs until the channel closes or the
/// token fires, writes one playlist to disk, and reports the outcome.
async fn run_worker(
    worker_id: usize,
    jobs: flume::Receiver<PlaylistExportJob>,
    results: mpsc::Sender<PlaylistExportResult>,
    output_dir: PathBuf,
    format: ExportFormat,
    cover_art: Option<Arc<dyn CoverArtFetcher>>,
    http: reqwest::Client,
    cancel: CancellationToken,
) {
    while let Ok(job) = jobs.recv_async().await {
        if cancel.is_cancelled() {
            debug!("Export worker {} stopping on cancellation", worker_id);
            return;
        }

        let name = job.export.playlist.name.clone();
        let outcome = export::write_playlist(
            &output_dir,
            &job.export,
            format,
            cover_art.as_deref(),
            &http,
        )
        .await;

        let item = match outcome {
            Ok(files) => {
                debug!(
                    "Worker {} exported {} ({} files)",
                    worker_id,
                    job.playlist_id,
                    files.len()
                );
                PlaylistExportResult::succeeded(job.playlist_id, name, files)
            }
            Err(e) => {
                warn!("Worker {} failed to export {}: {}", worker_id, job.playlist_id, e);
                PlaylistExportResult::failed(job.playlist_id, name, e)
            }
        };

        if results.send(item).await.is_err() {
            return;
        }
    }
}
