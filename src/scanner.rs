//! Disk state scanner
//!
//! Inspects the artifact directories under the base directory and extracts
//! which item identifiers already have artifacts of each kind. Runs on the
//! blocking filesystem API before the async pipeline stages start.

use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::types::{DiskState, ItemId};

/// Bracketed identifier immediately preceding the extension:
/// `"<name> [<id>].<ext>"`. Anchored at the end of the file stem so titles
/// containing their own bracketed tokens still resolve to the trailing one.
#[allow(clippy::expect_used)]
static ID_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]$").expect("hardcoded pattern compiles"));

/// Scan the artifact directories into a [`DiskState`]
///
/// A directory that does not exist yields an empty set silently; it will be
/// created on demand by the executor, not by the scanner.
pub fn scan_disk(config: &Config) -> Result<DiskState> {
    let state = DiskState {
        audio: scan_artifacts(&config.audio_dir())?,
        video: scan_artifacts(&config.video_dir())?,
        thumbnails: scan_thumbnails(&config.thumbnail_dir())?,
    };
    debug!(
        audio = state.audio.len(),
        video = state.video.len(),
        thumbnails = state.thumbnails.len(),
        "scanned disk state"
    );
    Ok(state)
}

/// Collect identifiers from `<name> [<id>].<ext>` artifact filenames
fn scan_artifacts(dir: &Path) -> Result<HashSet<ItemId>> {
    let mut ids = HashSet::new();
    for name in list_file_names(dir)? {
        if let Some(id) = extract_id(&name) {
            ids.insert(id);
        }
    }
    Ok(ids)
}

/// Collect identifiers from `<id>.<ext>` thumbnail filenames
fn scan_thumbnails(dir: &Path) -> Result<HashSet<ItemId>> {
    let mut ids = HashSet::new();
    for name in list_file_names(dir)? {
        let path = Path::new(&name);
        if path.extension().is_none() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ids.insert(ItemId::new(stem));
        }
    }
    Ok(ids)
}

/// File names (not directories) directly inside `dir`; empty when the
/// directory is absent
fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if let Some(name) = name.to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Extract the trailing bracketed identifier from an artifact filename
fn extract_id(file_name: &str) -> Option<ItemId> {
    let path = Path::new(file_name);
    // The convention requires an extension after the bracketed token
    path.extension()?;
    let stem = path.file_stem()?.to_str()?;
    ID_SUFFIX
        .captures(stem)
        .and_then(|captures| captures.get(1))
        .map(|id| ItemId::new(id.as_str()))
}
