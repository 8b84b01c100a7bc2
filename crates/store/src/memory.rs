// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory session store for tests.

use crate::state::{SessionRecord, StoreState};
use crate::{SessionStore, StoreError};
use acqd_core::{SessionId, SessionStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Map-backed store; clones share state so tests keep a handle.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record, for assertions.
    pub fn all(&self) -> Vec<SessionRecord> {
        self.state.lock().sessions.values().cloned().collect()
    }

    /// Seed a pre-existing record (restart-recovery tests).
    pub fn insert(&self, record: SessionRecord) {
        let mut state = self.state.lock();
        state.next_id = state.next_id.max(record.id.as_u64());
        state.sessions.insert(record.id.as_u64(), record);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, task_code: &str, handle: &str) -> Result<SessionRecord, StoreError> {
        self.state.lock().create(task_code, handle)
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
        self.state.lock().merge_metadata(id, entries)
    }

    async fn finish(
        &self,
        id: SessionId,
        status: SessionStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError> {
        self.state.lock().finish(id, status, error_message)
    }

    async fn delete(&self, id: SessionId) -> Result<(), StoreError> {
        self.state.lock().delete(id)
    }
}
