//! Metadata store persistence and merging
//!
//! The store is the persisted mapping of identifier to enriched item record,
//! written as a JSON array sorted by collection-add timestamp descending.
//! Merging follows explicit state-transition rules and counts mutations;
//! the file is only rewritten when at least one record actually changed, so
//! an unchanged run leaves the store untouched.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::types::{ItemId, PlaylistItem};

/// The persisted metadata store
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    records: HashMap<ItemId, PlaylistItem>,
    mutations: usize,
}

impl Store {
    /// Load the store from disk
    ///
    /// A missing or unparsable store file is treated as an empty store, not
    /// an error. Resumability comes from re-deriving state, never from
    /// trusting a broken file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Vec<PlaylistItem>>(&contents) {
                Ok(list) => list
                    .into_iter()
                    .map(|item| (item.id.clone(), item))
                    .collect(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unparsable metadata store, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no metadata store yet");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable metadata store, starting empty");
                HashMap::new()
            }
        };

        Self {
            path,
            records,
            mutations: 0,
        }
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by identifier
    pub fn get(&self, id: &ItemId) -> Option<&PlaylistItem> {
        self.records.get(id)
    }

    /// Mutations accumulated since load (or since the last persist)
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    /// Merge fresh records into the store, returning how many records this
    /// call mutated
    pub fn merge(&mut self, fresh: impl IntoIterator<Item = PlaylistItem>) -> usize {
        let mut mutated = 0;
        for item in fresh {
            mutated += self.merge_one(item);
        }
        self.mutations += mutated;
        debug!(mutated, total = self.records.len(), "merged fresh records");
        mutated
    }

    /// Apply the transition rules for one fresh record
    fn merge_one(&mut self, fresh: PlaylistItem) -> usize {
        let prior = match self.records.entry(fresh.id.clone()) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(fresh);
                return 1;
            }
            std::collections::hash_map::Entry::Occupied(slot) => slot.into_mut(),
        };

        match (prior.unavailable, fresh.unavailable) {
            // Came back: the fresh record is authoritative again
            (true, false) => {
                *prior = fresh;
                1
            }
            // Went away: downgrade by flipping the flag, never drop the record
            (false, true) => {
                prior.unavailable = true;
                1
            }
            (true, true) => 0,
            // Both available: extensions update independently, and only a
            // non-null fresh value may overwrite: a failed or skipped action
            // must not erase previously known extensions
            (false, false) => {
                let mut changed = false;
                if fresh.audio_ext.is_some() && fresh.audio_ext != prior.audio_ext {
                    prior.audio_ext = fresh.audio_ext;
                    changed = true;
                }
                if fresh.video_ext.is_some() && fresh.video_ext != prior.video_ext {
                    prior.video_ext = fresh.video_ext;
                    changed = true;
                }
                usize::from(changed)
            }
        }
    }

    /// Write the store back to disk if anything changed since load
    ///
    /// Records are sorted descending by collection-add timestamp. The file is
    /// written to a temporary sibling and renamed into place, so a crash
    /// never leaves a partial store. Returns whether a write happened.
    pub fn persist(&mut self) -> Result<bool> {
        if self.mutations == 0 {
            debug!("metadata store unchanged, skipping write");
            return Ok(false);
        }

        let mut list: Vec<&PlaylistItem> = self.records.values().collect();
        list.sort_by(|a, b| b.added_at.cmp(&a.added_at).then_with(|| a.id.cmp(&b.id)));
        let json = serde_json::to_string_pretty(&list)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        info!(records = list.len(), mutations = self.mutations, "metadata store written");
        self.mutations = 0;
        Ok(true)
    }
}
