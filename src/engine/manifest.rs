use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::report::BulkExportResult;
use crate::error::Result;
use crate::export::ExportFormat;

pub const MANIFEST_FILE_NAME: &str = "export_manifest.json";

/// On-disk manifest for one bulk export run.
///
/// Field names and status values are a stable contract; downstream backup
/// verifiers parse this file.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportManifest {
    pub timestamp: DateTime<Utc>,
    pub format: String,
    pub total_playlists: usize,
    pub successful_exports: usize,
    pub failed_exports: usize,
    pub exports: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub playlist_id: String,
    pub playlist_name: String,
    /// "success" or "failed".
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<PathBuf>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportManifest {
    pub fn from_result(format: ExportFormat, result: &BulkExportResult) -> Self {
        let exports = result
            .results
            .iter()
            .map(|item| ManifestEntry {
                playlist_id: item.playlist_id.clone(),
                playlist_name: item.playlist_name.clone(),
                status: if item.success { "success" } else { "failed" }.to_string(),
                files: if item.files.is_empty() {
                    None
                } else {
                    Some(item.files.clone())
                },
                error: item.error.as_ref().map(|e| e.to_string()),
            })
            .collect();

        Self {
            timestamp: Utc::now(),
            format: format.to_string(),
            total_playlists: result.total_playlists,
            successful_exports: result.successful_exports,
            failed_exports: result.failed_exports,
            exports,
        }
    }
}

/// Serialize the aggregate result to `<output_dir>/export_manifest.json`.
pub async fn write_manifest(
    output_dir: &Path,
    format: ExportFormat,
    result: &BulkExportResult,
) -> Result<PathBuf> {
    let manifest = ExportManifest::from_result(format, result);
    let path = output_dir.join(MANIFEST_FILE_NAME);
    let json = serde_json::to_string_pretty(&manifest)?;
    tokio::fs::write(&path, json).await?;
    info!("Wrote export manifest to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::report::PlaylistExportResult;
    use crate::error::SyncError;

    fn sample_result(dir: PathBuf) -> BulkExportResult {
        BulkExportResult {
            total_playlists: 2,
            successful_exports: 1,
            failed_exports: 1,
            results: vec![
                PlaylistExportResult::succeeded(
                    "p1".to_string(),
                    "Rumours".to_string(),
                    vec![dir.join("p1.json")],
                ),
                PlaylistExportResult::failed(
                    "p2".to_string(),
                    String::new(),
                    SyncError::ApiRequest("fetch p2: boom".to_string()),
                ),
            ],
            output_directory: dir,
            manifest_path: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_manifest_round_trip_reconciles_counters() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result(dir.path().to_path_buf());

        let path = write_manifest(dir.path(), ExportFormat::Json, &result)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join(MANIFEST_FILE_NAME));

        let raw = std::fs::read_to_string(&path).unwrap();
        let decoded: ExportManifest = serde_json::from_str(&raw).unwrap();

        assert_eq!(decoded.format, "json");
        assert_eq!(decoded.total_playlists, 2);
        let successes = decoded
            .exports
            .iter()
            .filter(|e| e.status == "success")
            .count();
        let failures = decoded
            .exports
            .iter()
            .filter(|e| e.status == "failed")
            .count();
        assert_eq!(successes, decoded.successful_exports);
        assert_eq!(failures, decoded.failed_exports);
    }

    #[tokio::test]
    async fn test_manifest_entry_fields_are_stable() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result(dir.path().to_path_buf());

        let path = write_manifest(dir.path(), ExportFormat::Csv, &result)
            .await
            .unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        let first = &value["exports"][0];
        assert!(first["playlist_id"].is_string());
        assert!(first["playlist_name"].is_string());
        assert_eq!(first["status"], "success");
        assert!(first["files"].is_array());
        assert!(first.get("error").is_none());

        let second = &value["exports"][1];
        assert_eq!(second["status"], "failed");
        assert!(second.get("files").is_none());
        assert!(second["error"].as_str().unwrap().contains("fetch p2"));
    }
}
