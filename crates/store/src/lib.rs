// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Session-record store.
//!
//! The engine's only persisted state: session rows with status,
//! timestamps, error message and a metadata bag. Reading data itself
//! goes to the sink, never here.

mod file;
mod state;

pub use file::FileSessionStore;
pub use state::{SessionRecord, StoreState};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod memory;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemorySessionStore;

use acqd_core::{SessionId, SessionStatus};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from session-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session {0} not found")]
    NotFound(SessionId),
    #[error("task '{0}' already has a running session")]
    AlreadyRunning(String),
    #[error("store io error: {0}")]
    Io(String),
    #[error("store corrupt: {0}")]
    Corrupt(String),
}

/// Persistence seam for session records.
///
/// `create` enforces the at-most-one-running-session-per-task
/// invariant. Metadata merges are serialized with status writes by the
/// implementations.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Create a running session for a task.
    async fn create(&self, task_code: &str, handle: &str) -> Result<SessionRecord, StoreError>;

    async fn get(&self, id: SessionId) -> Result<SessionRecord, StoreError>;

    /// All records still marked running.
    async fn running(&self) -> Result<Vec<SessionRecord>, StoreError>;

    /// Merge entries into the session's metadata bag.
    async fn merge_metadata(
        &self,
        id: SessionId,
        entries: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), StoreError>;

    /// Terminal transition: set status, stopped_at and error message.
    async fn finish(
        &self,
        id: SessionId,
        status: SessionStatus,
        error_message: Option<String>,
    ) -> Result<(), StoreError>;

    /// Remove a record entirely (restart recovery).
    async fn delete(&self, id: SessionId) -> Result<(), StoreError>;
}
