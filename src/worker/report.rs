//! Parsing of the worker's structured JSON report
//!
//! On success the worker emits a single JSON document on stdout reporting
//! the resolved container extension and, when audio was requested, a
//! non-empty list of requested-download descriptors each carrying a
//! resolved audio extension.

use serde::Deserialize;

use super::{DownloadKind, WorkerOutput};
use crate::error::{Result, WorkerError};
use crate::types::ItemId;

#[derive(Debug, Deserialize)]
struct RawReport {
    /// Resolved container extension of the primary artifact
    ext: Option<String>,
    /// Descriptors of the files the worker actually produced
    #[serde(default)]
    requested_downloads: Vec<RawRequestedDownload>,
}

#[derive(Debug, Deserialize)]
struct RawRequestedDownload {
    ext: Option<String>,
}

/// Parse a worker's stdout into the resolved extensions for `kind`
pub(super) fn parse_report(id: &ItemId, stdout: &[u8], kind: DownloadKind) -> Result<WorkerOutput> {
    let raw: RawReport = serde_json::from_slice(stdout).map_err(|e| WorkerError::BadOutput {
        id: id.to_string(),
        reason: format!("invalid JSON report: {e}"),
    })?;

    let video_ext = if kind.wants_video() {
        let ext = raw.ext.clone().ok_or_else(|| WorkerError::BadOutput {
            id: id.to_string(),
            reason: "report missing resolved container extension".into(),
        })?;
        Some(ext)
    } else {
        None
    };

    let audio_ext = if kind.wants_audio() {
        let ext = raw
            .requested_downloads
            .first()
            .and_then(|d| d.ext.clone())
            .ok_or_else(|| WorkerError::BadOutput {
                id: id.to_string(),
                reason: "report missing requested-download audio extension".into(),
            })?;
        Some(ext)
    } else {
        None
    };

    Ok(WorkerOutput {
        audio_ext,
        video_ext,
    })
}
