//! CLI-based download worker driving a yt-dlp-compatible binary

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use super::report::parse_report;
use super::{DownloadKind, DownloadWorker, WorkerOutput, WorkerRequest};
use crate::config::WorkerConfig;
use crate::error::{Error, Result, WorkerError};

/// Binary name searched for in PATH when no explicit path is configured
const DEFAULT_BINARY: &str = "yt-dlp";

/// Download worker that executes an external yt-dlp-compatible binary
///
/// Each invocation runs the binary once with `--no-simulate` and
/// `--dump-single-json`, so the media is actually fetched and a single JSON
/// report lands on stdout. The child process is killed if the invocation
/// future is dropped (timeout or run cancellation).
///
/// # Examples
///
/// ```no_run
/// use playlist_mirror::worker::CliDownloadWorker;
/// use std::path::PathBuf;
///
/// // Create with an explicit path
/// let worker = CliDownloadWorker::new(PathBuf::from("/usr/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let worker = CliDownloadWorker::from_path().expect("yt-dlp not found in PATH");
/// ```
#[derive(Debug)]
pub struct CliDownloadWorker {
    binary_path: PathBuf,
}

impl CliDownloadWorker {
    /// Create a new CLI worker with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find the worker binary in PATH
    ///
    /// # Returns
    ///
    /// `Some(CliDownloadWorker)` if the binary is found, `None` otherwise.
    pub fn from_path() -> Option<Self> {
        which::which(DEFAULT_BINARY).ok().map(Self::new)
    }

    /// Resolve a worker from configuration, as a run precondition
    ///
    /// Prefers the explicit `worker_path`; otherwise searches PATH when
    /// `search_path` is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalTool`] when no usable binary can be found,
    /// so the run exits before any work.
    pub fn resolve(config: &WorkerConfig) -> Result<Self> {
        if let Some(path) = &config.worker_path {
            return which::which(path)
                .map(Self::new)
                .map_err(|e| Error::ExternalTool(format!("worker binary {path:?}: {e}")));
        }
        if config.search_path {
            return Self::from_path().ok_or_else(|| {
                Error::ExternalTool(format!("{DEFAULT_BINARY} not found in PATH"))
            });
        }
        Err(Error::ExternalTool(
            "no worker path configured and PATH search is disabled".into(),
        ))
    }
}

#[async_trait]
impl DownloadWorker for CliDownloadWorker {
    async fn download(&self, request: &WorkerRequest) -> Result<WorkerOutput> {
        // Title is embedded literally; identifier and extension stay as
        // placeholders the worker resolves itself.
        let template = request
            .output_dir
            .join(format!("{} [%(id)s].%(ext)s", request.title));

        let format = match request.kind {
            DownloadKind::Audio => &request.audio_format,
            DownloadKind::Video | DownloadKind::Both => &request.video_format,
        };

        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("--no-simulate")
            .arg("--dump-single-json")
            .arg("--no-progress")
            .arg("-f")
            .arg(format)
            .arg("-o")
            .arg(&template);
        match request.kind {
            DownloadKind::Audio => {
                cmd.arg("--extract-audio");
            }
            DownloadKind::Both => {
                cmd.arg("--extract-audio").arg("--keep-video");
            }
            DownloadKind::Video => {}
        }
        cmd.arg(&request.url)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);

        debug!(id = %request.id, kind = ?request.kind, "invoking download worker");
        let output = cmd.output().await.map_err(|e| WorkerError::Spawn {
            binary: self.binary_path.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(WorkerError::Failed {
                id: request.id.to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        parse_report(&request.id, &output.stdout, request.kind)
    }

    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }
}
