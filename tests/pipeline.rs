//! End-to-end pipeline tests over in-memory provider and worker fakes
//!
//! These cover the reconciliation properties that span multiple stages:
//! idempotence across runs, resuming from partial prior state, and
//! availability transitions reaching the persisted store.

mod common;

use common::{RecordingWorker, SnapshotProvider, entry};
use playlist_mirror::{Config, DownloadMode, ItemId, PlaylistItem, PlaylistMirror};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn config_at(base: &Path) -> Config {
    Config {
        base_dir: base.to_path_buf(),
        ..Default::default()
    }
}

fn read_store(base: &Path) -> Vec<PlaylistItem> {
    let contents = std::fs::read_to_string(base.join("metadata.json")).unwrap();
    serde_json::from_str(&contents).unwrap()
}

#[tokio::test]
async fn second_run_with_no_upstream_changes_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(SnapshotProvider::new(vec![entry("a", 10), entry("b", 20)]));
    let worker = Arc::new(RecordingWorker::default());
    let mirror =
        PlaylistMirror::new(config_at(tmp.path()), provider.clone(), worker.clone()).unwrap();

    let first = mirror.run("PL").await.unwrap();
    assert_eq!(first.downloaded, 2);
    assert!(first.store_written);
    assert_eq!(worker.invocations(), 2);

    let second = mirror.run("PL").await.unwrap();
    assert_eq!(second.planned, 0, "everything is already on disk");
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.store_mutations, 0);
    assert!(!second.store_written, "unchanged store must not be rewritten");
    assert_eq!(worker.invocations(), 2, "no further worker invocations");
}

#[tokio::test]
async fn partial_prior_state_plans_only_the_missing_artifacts() {
    let tmp = TempDir::new().unwrap();
    let config = config_at(tmp.path());

    // A previous run already fetched audio for "a"
    std::fs::create_dir_all(config.audio_dir()).unwrap();
    std::fs::write(config.audio_dir().join("Title a [a].m4a"), b"audio").unwrap();

    let provider = Arc::new(SnapshotProvider::new(vec![entry("a", 10), entry("b", 20)]));
    let worker = Arc::new(RecordingWorker::default());
    let mirror = PlaylistMirror::new(config.clone(), provider, worker.clone()).unwrap();

    let report = mirror.run("PL").await.unwrap();

    // "a" only needs video; "b" needs both, so two invocations total
    assert_eq!(report.planned, 2);
    assert_eq!(worker.invocations(), 2);
    assert!(config.video_dir().join("Title a [a].mp4").exists());
    assert!(config.video_dir().join("Title b [b].mp4").exists());
    assert!(
        config.audio_dir().join("Title b [b].m4a").exists(),
        "keep-both run relocates b's audio into the audio directory"
    );
    assert!(
        !config.video_dir().join("Title a [a].m4a").exists(),
        "a video-only invocation must not produce an audio artifact"
    );
}

#[tokio::test]
async fn audio_mode_only_fetches_audio_artifacts() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_at(tmp.path());
    config.download.mode = DownloadMode::Audio;

    let provider = Arc::new(SnapshotProvider::new(vec![entry("a", 10)]));
    let worker = Arc::new(RecordingWorker::default());
    let mirror = PlaylistMirror::new(config.clone(), provider, worker.clone()).unwrap();

    let report = mirror.run("PL").await.unwrap();

    assert_eq!(report.downloaded, 1);
    assert!(config.audio_dir().join("Title a [a].m4a").exists());
    assert!(!config.video_dir().exists());

    let store = read_store(tmp.path());
    assert_eq!(store[0].audio_ext.as_deref(), Some("m4a"));
    assert_eq!(store[0].video_ext, None);
}

#[tokio::test]
async fn unavailable_transition_reaches_the_store_without_downloads() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(SnapshotProvider::new(vec![entry("a", 10), entry("b", 20)]));
    let worker = Arc::new(RecordingWorker::default());
    let mirror =
        PlaylistMirror::new(config_at(tmp.path()), provider.clone(), worker.clone()).unwrap();

    mirror.run("PL").await.unwrap();
    assert_eq!(worker.invocations(), 2);

    // "a" goes private upstream
    let mut gone = entry("a", 10);
    gone.unavailable = true;
    gone.title = "Private video".into();
    provider.set_entries(vec![gone, entry("b", 20)]);

    let report = mirror.run("PL").await.unwrap();

    assert_eq!(worker.invocations(), 2, "unavailable items are never downloaded");
    assert_eq!(report.store_mutations, 1);
    assert!(report.store_written);

    let store = read_store(tmp.path());
    let a = store.iter().find(|i| i.id == ItemId::new("a")).unwrap();
    assert!(a.unavailable);
    // the downgrade flips the flag; the prior record's fields survive
    assert_eq!(a.title, "Title a");
    assert_eq!(a.audio_ext.as_deref(), Some("m4a"));
}

#[tokio::test]
async fn store_is_sorted_newest_first_across_runs() {
    let tmp = TempDir::new().unwrap();
    let provider = Arc::new(SnapshotProvider::new(vec![entry("old", 10)]));
    let worker = Arc::new(RecordingWorker::default());
    let mirror =
        PlaylistMirror::new(config_at(tmp.path()), provider.clone(), worker.clone()).unwrap();

    mirror.run("PL").await.unwrap();

    // A newer item lands in the collection
    provider.set_entries(vec![entry("new", 99), entry("old", 10)]);
    mirror.run("PL").await.unwrap();

    let order: Vec<String> = read_store(tmp.path())
        .iter()
        .map(|i| i.id.to_string())
        .collect();
    assert_eq!(order, vec!["new".to_string(), "old".to_string()]);
}

#[tokio::test]
async fn record_only_mode_persists_metadata_without_touching_disk() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_at(tmp.path());
    config.download.mode = DownloadMode::None;

    let provider = Arc::new(SnapshotProvider::new(vec![entry("a", 10)]));
    let worker = Arc::new(RecordingWorker::default());
    let mirror = PlaylistMirror::new(config.clone(), provider, worker.clone()).unwrap();

    let report = mirror.run("PL").await.unwrap();

    assert_eq!(worker.invocations(), 0);
    assert_eq!(report.planned, 0);
    assert!(report.store_written);
    assert!(!config.audio_dir().exists());
    assert!(!config.video_dir().exists());

    let store = read_store(tmp.path());
    assert_eq!(store.len(), 1);
    assert_eq!(store[0].duration_secs, 60);
    assert_eq!(store[0].audio_ext, None);
}
