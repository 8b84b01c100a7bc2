// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file.
//!
//! One TOML document carries the engine tunables, the sink endpoint,
//! the store/log locations and the task catalog.

use acqd_core::{EngineConfig, SinkConfig, Task};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Invalid(#[from] acqd_core::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub engine: EngineConfig,
    pub sink: SinkConfig,
    /// Session-record file.
    pub store_path: PathBuf,
    /// Log file; stderr only when unset.
    pub log_path: Option<PathBuf>,
    /// Single-instance lock file.
    pub lock_path: PathBuf,
    #[serde(rename = "task")]
    pub tasks: Vec<Task>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            sink: SinkConfig::default(),
            store_path: PathBuf::from("acqd-sessions.json"),
            log_path: None,
            lock_path: PathBuf::from("acqd.lock"),
            tasks: Vec::new(),
        }
    }
}

impl DaemonConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DaemonConfig =
            toml::from_str(&text).map_err(|source| ConfigFileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.engine.validate()?;
        config.sink.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
