//! Error types for playlist-mirror
//!
//! This module provides the error taxonomy for the library:
//! - Fatal precondition errors (missing download worker, missing base directory)
//! - Provider schema errors (the response contract is assumed, not negotiated)
//! - Worker execution errors, captured per invocation by the executor
//! - I/O, network, and serialization errors via `#[from]` conversions

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for playlist-mirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for playlist-mirror
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.page_size")
        key: Option<String>,
    },

    /// Metadata provider error (schema mismatch, malformed response)
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Download worker error
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Required external tool absent (download worker binary)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Required path absent (base directory)
    #[error("not found: {0}")]
    NotFound(String),
}

/// Metadata provider errors
///
/// Schema errors are fatal: the provider's response shape is a contract, and
/// inconsistency is not a condition this library repairs. Expected variability
/// (missing owner fields on removed entries) is handled by the typed parse
/// functions and never surfaces as an error.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Response did not match the expected shape
    #[error("malformed provider response: {context}")]
    Schema {
        /// What was being parsed when the shape mismatch was detected
        context: String,
    },

    /// Provider returned a non-success HTTP status
    #[error("provider returned HTTP {status} for {url}")]
    Status {
        /// The HTTP status code
        status: u16,
        /// The request URL
        url: String,
    },

    /// A duration expression could not be parsed
    #[error("invalid duration expression {expression:?} for item {id}")]
    InvalidDuration {
        /// The item whose duration was malformed
        id: String,
        /// The raw duration expression
        expression: String,
    },
}

/// Download worker errors
///
/// These are captured per invocation by the executor so one failing item does
/// not discard the results of its batch siblings.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker process could not be spawned
    #[error("failed to spawn download worker {binary}: {reason}")]
    Spawn {
        /// Path of the binary that failed to start
        binary: PathBuf,
        /// The underlying OS error
        reason: String,
    },

    /// The worker exited with a non-zero status
    #[error("download worker failed for item {id} (exit status {status:?}): {stderr}")]
    Failed {
        /// The item being downloaded
        id: String,
        /// Exit status code, if the process exited normally
        status: Option<i32>,
        /// Diagnostic text from the worker's stderr
        stderr: String,
    },

    /// The worker succeeded but its structured output was unusable
    #[error("unusable worker output for item {id}: {reason}")]
    BadOutput {
        /// The item being downloaded
        id: String,
        /// Why the output could not be used
        reason: String,
    },

    /// The invocation exceeded the configured time limit
    #[error("download worker timed out for item {id} after {elapsed_secs}s")]
    Timeout {
        /// The item being downloaded
        id: String,
        /// Seconds elapsed before the invocation was abandoned
        elapsed_secs: u64,
    },

    /// The run was cancelled while this invocation was in flight
    #[error("download cancelled for item {id}")]
    Cancelled {
        /// The item being downloaded
        id: String,
    },
}
