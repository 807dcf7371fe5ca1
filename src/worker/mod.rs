//! External download worker abstraction
//!
//! The worker is the external process that performs the actual media
//! retrieval and transcoding. The [`DownloadWorker`] trait covers one
//! invocation per item; the crate ships [`CliDownloadWorker`], which drives
//! a yt-dlp-compatible binary. Tests substitute in-memory implementations.

mod cli;
mod report;

pub use cli::CliDownloadWorker;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;
use crate::types::{ItemId, WorkAction};

/// Which artifacts one worker invocation should produce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadKind {
    /// Audio artifact only
    Audio,
    /// Video artifact only
    Video,
    /// Video artifact plus extracted audio, from a single fetch
    Both,
}

impl DownloadKind {
    /// Map a planned action to an invocation kind; `None` for record-only
    pub fn from_action(action: WorkAction) -> Option<Self> {
        match action {
            WorkAction::DownloadAudio => Some(DownloadKind::Audio),
            WorkAction::DownloadVideo => Some(DownloadKind::Video),
            WorkAction::DownloadBoth => Some(DownloadKind::Both),
            WorkAction::RecordOnly => None,
        }
    }

    /// The planned action this invocation kind corresponds to
    pub fn action(&self) -> WorkAction {
        match self {
            DownloadKind::Audio => WorkAction::DownloadAudio,
            DownloadKind::Video => WorkAction::DownloadVideo,
            DownloadKind::Both => WorkAction::DownloadBoth,
        }
    }

    /// Whether this invocation requests an audio artifact
    pub fn wants_audio(&self) -> bool {
        matches!(self, DownloadKind::Audio | DownloadKind::Both)
    }

    /// Whether this invocation requests a video artifact
    pub fn wants_video(&self) -> bool {
        matches!(self, DownloadKind::Video | DownloadKind::Both)
    }
}

/// Everything the worker needs for one invocation
#[derive(Clone, Debug)]
pub struct WorkerRequest {
    /// The item being downloaded
    pub id: ItemId,
    /// Source URL handed to the worker
    pub url: String,
    /// Sanitized title, embedded literally in the output filename
    pub title: String,
    /// Which artifacts to produce
    pub kind: DownloadKind,
    /// Directory the worker writes into (the audio directory for audio-only
    /// invocations, the video directory otherwise)
    pub output_dir: PathBuf,
    /// Format selector for audio-only invocations
    pub audio_format: String,
    /// Format selector for video invocations
    pub video_format: String,
}

/// Structured result of a successful worker invocation
///
/// The resolved extensions may differ from the requested container/codec due
/// to source-format negotiation; these values become the item record's
/// extension fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerOutput {
    /// Resolved audio extension, when audio was requested
    pub audio_ext: Option<String>,
    /// Resolved video container extension, when video was requested
    pub video_ext: Option<String>,
}

/// An external process that retrieves media artifacts
#[async_trait]
pub trait DownloadWorker: Send + Sync {
    /// Run one download invocation to completion
    ///
    /// Implementations must be cancel-safe: the executor may drop an
    /// in-flight call on timeout or run cancellation, and the underlying
    /// process must die with it.
    async fn download(&self, request: &WorkerRequest) -> Result<WorkerOutput>;

    /// Short name identifying the implementation, for logs
    fn name(&self) -> &'static str;
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_kind_maps_from_planned_actions() {
        assert_eq!(
            DownloadKind::from_action(WorkAction::DownloadAudio),
            Some(DownloadKind::Audio)
        );
        assert_eq!(
            DownloadKind::from_action(WorkAction::DownloadVideo),
            Some(DownloadKind::Video)
        );
        assert_eq!(
            DownloadKind::from_action(WorkAction::DownloadBoth),
            Some(DownloadKind::Both)
        );
        assert_eq!(DownloadKind::from_action(WorkAction::RecordOnly), None);
    }

    #[test]
    fn download_kind_artifact_flags() {
        assert!(DownloadKind::Audio.wants_audio());
        assert!(!DownloadKind::Audio.wants_video());
        assert!(!DownloadKind::Video.wants_audio());
        assert!(DownloadKind::Video.wants_video());
        assert!(DownloadKind::Both.wants_audio());
        assert!(DownloadKind::Both.wants_video());
    }
}
