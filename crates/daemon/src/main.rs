// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acquisition daemon (acqd)
//!
//! Long-running process that owns the acquisition sessions for every
//! configured task: recover stale sessions, start the catalog, run
//! until SIGTERM/SIGINT, then stop every session gracefully.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use acqd_core::SystemClock;
use acqd_daemon::DaemonConfig;
use acqd_engine::Supervisor;
use acqd_store::FileSessionStore;
use fs2::FileExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(30);
const LOG_ROTATE_BYTES: u64 = 10 * 1024 * 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config_path = PathBuf::from("acqd.toml");
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("acqd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("acqd {}", env!("CARGO_PKG_VERSION"));
                println!("Acquisition daemon - polls field devices and writes to the sink");
                println!();
                println!("USAGE:");
                println!("    acqd [--config acqd.toml]");
                println!();
                println!("OPTIONS:");
                println!("    -c, --config     Path to the configuration file");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            "--config" | "-c" => {
                config_path = match args.next() {
                    Some(path) => PathBuf::from(path),
                    None => {
                        eprintln!("error: --config requires a path");
                        std::process::exit(1);
                    }
                };
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: acqd [--config acqd.toml]");
                std::process::exit(1);
            }
        }
    }

    let config = DaemonConfig::load(&config_path)?;

    // Rotate the log file if it has grown too large
    if let Some(log_path) = &config.log_path {
        rotate_log_if_needed(log_path);
    }

    let _log_guard = setup_logging(&config)?;

    // Single-instance lock
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    if lock_file.try_lock_exclusive().is_err() {
        eprintln!(
            "error: another acqd instance holds {}",
            config.lock_path.display()
        );
        std::process::exit(1);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(config));
    drop(lock_file);
    result
}

async fn run(config: DaemonConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(version = env!("CARGO_PKG_VERSION"), "starting acqd");

    let store = Arc::new(FileSessionStore::open(&config.store_path)?);
    let mut builder = Supervisor::builder(store, config.engine.clone(), SystemClock)
        .sink_config(config.sink.clone());
    for task in &config.tasks {
        builder = builder.task(task.clone());
    }
    let supervisor = builder.build()?;

    // A previous process may have left running records behind.
    match supervisor.recover().await {
        Ok(restarted) if !restarted.is_empty() => {
            info!(count = restarted.len(), "recovered stale sessions");
        }
        Ok(_) => {}
        Err(e) => error!(error = %e, "session recovery failed"),
    }

    for code in supervisor.task_codes() {
        // Recovery may already have restarted some of the catalog.
        match supervisor.start(&code).await {
            Ok(report) => info!(
                task = %code,
                session = %report.session_id,
                healthy = report.validation.healthy,
                "task started"
            ),
            Err(acqd_engine::LifecycleError::Store(acqd_store::StoreError::AlreadyRunning(
                _,
            ))) => {}
            Err(e) => error!(task = %code, error = %e, "task failed to start"),
        }
    }

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }

    info!("stopping all sessions");
    supervisor.shutdown(SHUTDOWN_DEADLINE).await;
    info!("acqd stopped");
    Ok(())
}

/// Keep startup logs bounded: move an oversized log aside once.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(_) => return,
    };
    if size < LOG_ROTATE_BYTES {
        return;
    }
    let rotated = log_path.with_extension("log.1");
    if let Err(e) = std::fs::rename(log_path, &rotated) {
        eprintln!("warning: failed to rotate log {}: {}", log_path.display(), e);
    }
}

fn setup_logging(
    config: &DaemonConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, Box<dyn std::error::Error>> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("ACQD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_path {
        Some(log_path) => {
            let directory = log_path.parent().unwrap_or(Path::new("."));
            let file_name = log_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "acqd.log".to_string());
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}
