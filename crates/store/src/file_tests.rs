// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");

    let id = {
        let store = FileSessionStore::open(&path).unwrap();
        let record = store.create("line-1", "handle-1").await.unwrap();
        store
            .finish(record.id, SessionStatus::Stopped, None)
            .await
            .unwrap();
        record.id
    };

    let store = FileSessionStore::open(&path).unwrap();
    let record = store.get(id).await.unwrap();
    assert_eq!(record.task_code, "line-1");
    assert_eq!(record.status, SessionStatus::Stopped);
    assert!(record.stopped_at.is_some());

    // The id counter also survives.
    let next = store.create("line-1", "handle-2").await.unwrap();
    assert!(next.id > id);
}

#[tokio::test]
async fn missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSessionStore::open(dir.path().join("fresh.json")).unwrap();
    assert!(store.running().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_file_is_reported_not_wiped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    std::fs::write(&path, b"{ not json").unwrap();

    match FileSessionStore::open(&path) {
        Err(StoreError::Corrupt(_)) => {}
        other => panic!("expected corrupt error, got {other:?}"),
    }
    // The original bytes are untouched.
    assert_eq!(std::fs::read(&path).unwrap(), b"{ not json");
}

#[tokio::test]
async fn running_conflict_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");

    {
        let store = FileSessionStore::open(&path).unwrap();
        store.create("line-1", "h1").await.unwrap();
    }

    let store = FileSessionStore::open(&path).unwrap();
    assert!(matches!(
        store.create("line-1", "h2").await,
        Err(StoreError::AlreadyRunning(_))
    ));
}
