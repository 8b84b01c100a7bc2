// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session records and the shared in-memory state both stores build on.

use crate::StoreError;
use acqd_core::{SessionId, SessionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One live or historical execution of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub task_code: String,
    pub status: SessionStatus,
    /// Run handle issued at start; identifies the engine task.
    pub handle: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Record map plus the monotonic id counter.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreState {
    pub next_id: u64,
    pub sessions: BTreeMap<u64, SessionRecord>,
}

impl StoreState {
    pub fn create(&mut self, task_code: &str, handle: &str) -> Result<SessionRecord, StoreError> {
        let conflict = self
            .sessions
            .values()
            .any(|s| s.task_code == task_code && s.status == SessionStatus::Running);
        if conflict {
            return Err(StoreError::AlreadyRunning(task_code.to_string()));
        }

        self.next_id += 1;
        let record = SessionRecord {
            id: SessionId::new(self.next_id),
            task_code: task_code.to_string(),
            status: SessionStatus::Running,
            handle: handle.to_string(),
            started_at: Utc::now(),
            stopped_at: None,
            error_message: None,
            metadata: serde_json::Map::new(),
        };
        self.sessions.insert(self.next_id, record.clone());
        Ok(record)
    }

    pub fn get(&self, id: SessionId) -> Result<&SessionRecord, StoreError> {
        self.sessions.get(&id.as_u64()).ok_or(StoreError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: SessionId) -> Result<&mut SessionRecord, StoreError> {
        self.sessions
            .get_mut(&id.as_u64())
            .ok_or(StoreError::NotFound(id))
    }

    pub fn running(&self) -> Vec<SessionRecord> {
        self.sessions
            .values()
            .filter(|s| s.status == SessionStatus::Running)
            .cloned()
            .collect()
    }

    pub fn merge_metadata(
        &mut self,
        id: SessionId,
        entries: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), StoreError> {
        let record = self.get_mut(id)?;
        for (key, value) in entries {
            record.metadata.insert(key, value);
        }
        Ok(())
    }

    pub fn finish(
        &mut self,
        id: SessionId,
        status: SessionStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError> {
        let record = self.get_mut(id)?;
        record.status = status;
        record.stopped_at = Some(Utc::now());
        if error_message.is_some() {
            record.error_message = error_message;
        }
        Ok(())
    }

    pub fn delete(&mut self, id: SessionId) -> Result<(), StoreError> {
        self.sessions
            .remove(&id.as_u64())
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
