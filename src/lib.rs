//! # playlist-mirror
//!
//! Library for incrementally mirroring a remote media collection (a
//! playlist) to local storage.
//!
//! Each run fetches collection metadata from a paginated provider API,
//! reconciles it against what already exists on disk and in a persisted
//! metadata store, and drives a bounded set of concurrent external download
//! invocations to fill the gap. Re-running is idempotent: with no upstream
//! changes, a run performs zero downloads and zero store writes.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Idempotent by construction** - Resumability comes from re-deriving
//!   disk and store state every run, not from transactional queues
//! - **Event-driven** - Consumers subscribe to progress events, no polling
//! - **Pluggable boundaries** - The metadata provider and the download
//!   worker are traits; production implementations speak HTTP and drive a
//!   yt-dlp-compatible binary
//!
//! ## Quick Start
//!
//! ```no_run
//! use playlist_mirror::{Config, DownloadMode, PlaylistMirror};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config {
//!         base_dir: "/data/music".into(),
//!         ..Default::default()
//!     };
//!     config.download.mode = DownloadMode::Audio;
//!
//!     let mirror = PlaylistMirror::with_defaults(config)?;
//!     let report = mirror.run("PLAYLIST_ID").await?;
//!     println!(
//!         "downloaded {}, failed {}",
//!         report.downloaded,
//!         report.failures.len()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Concurrency-bounded batch executor
pub mod executor;
/// Two-phase metadata fetch engine
pub mod fetcher;
/// Pipeline orchestrator
pub mod mirror;
/// Work planner (diff engine)
pub mod planner;
/// Metadata provider abstraction
pub mod provider;
/// Disk state scanner
pub mod scanner;
/// Metadata store persistence and merging
pub mod store;
/// Core types and events
pub mod types;
/// External download worker abstraction
pub mod worker;

#[cfg(test)]
mod test_util;

// Re-export commonly used types
pub use config::{Config, DownloadConfig, DownloadMode, ExecutorConfig, FetchConfig, WorkerConfig};
pub use error::{Error, ProviderError, Result, WorkerError};
pub use mirror::{PlaylistMirror, RunReport};
pub use provider::{HttpMetadataProvider, ItemDetail, ListPage, MetadataProvider};
pub use store::Store;
pub use types::{
    DiskState, ItemId, MirrorEvent, PartialItem, PlaylistItem, WorkAction, WorkItem,
};
pub use worker::{CliDownloadWorker, DownloadKind, DownloadWorker, WorkerOutput, WorkerRequest};
