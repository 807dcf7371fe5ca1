//! Configuration types for playlist-mirror

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Which artifacts a mirror run should download for each item
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadMode {
    /// Download video and keep the extracted audio (default)
    #[default]
    Both,
    /// Download audio artifacts only
    Audio,
    /// Download video artifacts only
    Video,
    /// Download nothing; only record metadata
    None,
}

impl DownloadMode {
    /// Whether this mode requires an audio artifact
    pub fn requires_audio(&self) -> bool {
        matches!(self, DownloadMode::Both | DownloadMode::Audio)
    }

    /// Whether this mode requires a video artifact
    pub fn requires_video(&self) -> bool {
        matches!(self, DownloadMode::Both | DownloadMode::Video)
    }
}

/// Download selection settings (mode, duration filter)
///
/// Groups settings that decide which items get downloaded.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Which artifacts to download per item (default: both)
    #[serde(default)]
    pub mode: DownloadMode,

    /// Skip items longer than this (None = no duration filter)
    #[serde(default, with = "optional_duration_serde")]
    pub max_duration: Option<Duration>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            mode: DownloadMode::default(),
            max_duration: None,
        }
    }
}

/// Metadata fetch settings (pagination, enrichment batching)
///
/// The provider's page-size and per-call detail limits live here rather than
/// as free-standing module constants, so alternative providers can carry
/// different limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum entries per listing page the provider accepts (default: 50)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum identifiers per detail-enrichment call (default: 50)
    #[serde(default = "default_detail_batch_size")]
    pub detail_batch_size: usize,

    /// Maximum concurrent outbound enrichment requests (default: 4)
    #[serde(default = "default_request_concurrency")]
    pub request_concurrency: usize,

    /// Only mirror the most recently added N items (None = whole collection)
    #[serde(default)]
    pub max_items: Option<usize>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            detail_batch_size: default_detail_batch_size(),
            request_concurrency: default_request_concurrency(),
            max_items: None,
        }
    }
}

/// Executor settings (concurrency, timeouts)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum concurrent worker invocations, which is also the batch size
    /// of the barrier-synchronized scheduler (default: 3)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Per-invocation time limit for the download worker; the child process
    /// is killed on expiry (None = wait indefinitely; default: 15 minutes)
    #[serde(default = "default_worker_timeout", with = "optional_duration_serde")]
    pub worker_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent(),
            worker_timeout: default_worker_timeout(),
        }
    }
}

/// External download worker settings (binary path, format selection)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Path to the download worker binary (auto-detected if None)
    #[serde(default)]
    pub worker_path: Option<PathBuf>,

    /// Whether to search PATH for the worker binary if no explicit path is
    /// set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Format selector passed to the worker for audio-only downloads
    /// (default: "bestaudio")
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Format selector passed to the worker for video downloads
    /// (default: "bestvideo*+bestaudio/best")
    #[serde(default = "default_video_format")]
    pub video_format: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_path: None,
            search_path: true,
            audio_format: default_audio_format(),
            video_format: default_video_format(),
        }
    }
}

/// Main configuration for [`crate::mirror::PlaylistMirror`]
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) — mode and duration filtering
/// - [`fetch`](FetchConfig) — pagination and enrichment limits
/// - [`executor`](ExecutorConfig) — concurrency and timeouts
/// - [`worker`](WorkerConfig) — worker binary and format selection
///
/// All sub-config fields are flattened for serialization, so the JSON/TOML
/// format stays flat (no nesting).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base directory of the mirrored library (default: "./library")
    ///
    /// Must exist before a run starts; the artifact subdirectories beneath
    /// it are created on demand.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Download selection settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Metadata fetch settings
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// Executor settings
    #[serde(flatten)]
    pub executor: ExecutorConfig,

    /// Download worker settings
    #[serde(flatten)]
    pub worker: WorkerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            download: DownloadConfig::default(),
            fetch: FetchConfig::default(),
            executor: ExecutorConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl Config {
    /// Directory holding audio artifacts
    pub fn audio_dir(&self) -> PathBuf {
        self.base_dir.join("audio")
    }

    /// Directory holding video artifacts
    pub fn video_dir(&self) -> PathBuf {
        self.base_dir.join("video")
    }

    /// Directory holding thumbnails
    pub fn thumbnail_dir(&self) -> PathBuf {
        self.base_dir.join("thumbnails")
    }

    /// Path of the persisted metadata store
    pub fn store_path(&self) -> PathBuf {
        self.base_dir.join("metadata.json")
    }

    /// Check the configuration for values that would make a run misbehave
    pub fn validate(&self) -> crate::Result<()> {
        if self.fetch.page_size == 0 {
            return Err(crate::Error::Config {
                message: "page_size must be at least 1".into(),
                key: Some("fetch.page_size".into()),
            });
        }
        if self.fetch.detail_batch_size == 0 {
            return Err(crate::Error::Config {
                message: "detail_batch_size must be at least 1".into(),
                key: Some("fetch.detail_batch_size".into()),
            });
        }
        if self.fetch.request_concurrency == 0 {
            return Err(crate::Error::Config {
                message: "request_concurrency must be at least 1".into(),
                key: Some("fetch.request_concurrency".into()),
            });
        }
        if self.executor.max_concurrent_downloads == 0 {
            return Err(crate::Error::Config {
                message: "max_concurrent_downloads must be at least 1".into(),
                key: Some("executor.max_concurrent_downloads".into()),
            });
        }
        Ok(())
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./library")
}

fn default_page_size() -> usize {
    50
}

fn default_detail_batch_size() -> usize {
    50
}

fn default_request_concurrency() -> usize {
    4
}

fn default_max_concurrent() -> usize {
    3
}

fn default_worker_timeout() -> Option<Duration> {
    Some(Duration::from_secs(15 * 60))
}

fn default_true() -> bool {
    true
}

fn default_audio_format() -> String {
    "bestaudio".to_string()
}

fn default_video_format() -> String {
    "bestvideo*+bestaudio/best".to_string()
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
