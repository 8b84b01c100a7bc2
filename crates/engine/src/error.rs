// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the lifecycle surface.

use acqd_core::SessionId;
use thiserror::Error;

/// Errors on the supervisor-facing lifecycle surface.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("task '{0}' not found")]
    TaskNotFound(String),
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
    #[error("no device connected for task '{0}'")]
    NoDeviceConnected(String),
    #[error("startup validation for task '{0}' exceeded its deadline")]
    ValidationTimeout(String),
    #[error("configuration error: {0}")]
    Config(#[from] acqd_core::ConfigError),
    #[error("adapter error: {0}")]
    Adapter(#[from] acqd_adapters::AdapterError),
    #[error("store error: {0}")]
    Store(#[from] acqd_store::StoreError),
}
