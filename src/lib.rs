pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod matcher;
pub mod models;
pub mod progress;
pub mod ratelimit;
pub mod service;
pub mod spotify;
pub mod ytmusic;

pub use cache::MemoryTrackCache;
pub use config::Config;
pub use engine::{
    BulkExportOptions, BulkExportResult, BulkExporter, ComparisonResult, ExportManifest,
    LibraryDumper, PlaylistExportResult, SyncEngine, TrackMatchResult, TransferOptions,
    TransferRunResult,
};
pub use error::{Result, SyncError};
pub use export::ExportFormat;
pub use models::{Playlist, PlaylistExport, Track};
pub use progress::{Phase, ProgressReporter, ProgressUpdate};
pub use ratelimit::RateLimiter;
pub use service::{ApiClient, ApiResponse, CoverArtFetcher, Service, TrackCacher};
pub use spotify::SpotifyClient;
pub use ytmusic::YtMusicClient;
