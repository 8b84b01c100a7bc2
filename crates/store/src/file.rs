// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-file session store.
//!
//! A single JSON document holding every record; mutations rewrite the
//! file through a temp-file rename so a crash never leaves a torn
//! document behind.

use crate::state::{SessionRecord, StoreState};
use crate::{SessionStore, StoreError};
use acqd_core::{SessionId, SessionStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl FileSessionStore {
    /// Open or create the store file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Corrupt(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(StoreError::Io(format!("{}: {}", path.display(), e))),
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| StoreError::Io(format!("serialize: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        write_atomically(&tmp, &self.path, &json)
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e)))
    }

    /// Run a mutation and persist the result before releasing the lock,
    /// so metadata merges and status writes stay serialized.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock();
        let result = f(&mut state)?;
        self.persist(&state)?;
        Ok(result)
    }
}

fn write_atomically(tmp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(tmp, bytes)?;
    std::fs::rename(tmp, target)
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn create(&self, task_code: &str, handle: &str) -> Result<SessionRecord, StoreError> {
        let record = self.mutate(|state| state.create(task_code, handle))?;
        tracing::info!(session = %record.id, task = task_code, "session created");
        Ok(record)
    }

    async fn get(&self, id: SessionId) -> Result<SessionRecord, StoreError> {
        self.state.lock().get(id).cloned()
    }

    async fn running(&self) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self.state.lock().running())
    }

    async fn merge_metadata(
        &self,
        id: SessionId,
        entries: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), StoreError> {
        self.mutate(|state| state.merge_metadata(id, entries))
    }

    async fn finish(
        &self,
        id: SessionId,
        status: SessionStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError> {
        let result = self.mutate(|state| state.finish(id, status, error_message));
        tracing::info!(session = %id, %status, "session finished");
        result
    }

    async fn delete(&self, id: SessionId) -> Result<(), StoreError> {
        self.mutate(|state| state.delete(id))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
